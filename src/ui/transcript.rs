//! Terminal projection of a conversation.
//!
//! [`TranscriptView`] is a [`DisplayAdapter`]: it mirrors each session's
//! blocks and keeps the rendered lines of every block, so an update only
//! re-renders the blocks that actually changed. An optional [`Highlighter`]
//! marks matches in prose text and inline code as blocks render.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use tracing::debug;

use crate::core::message::MessageKind;
use crate::stream::block::{Block, BlockKind, CodeBlock, EditBlock};
use crate::stream::display::{BlockUpdate, DisplayAdapter, SessionId};
use crate::ui::highlight::{Highlighter, Marker, MarkerId};
use crate::ui::theme::Theme;

#[derive(Debug)]
struct RenderedBlock {
    block: Block,
    lines: Vec<Line<'static>>,
    markers: Vec<Marker>,
}

/// Where a marked match is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkerLocation {
    pub session: SessionId,
    pub block: usize,
    pub line: usize,
}

#[derive(Debug)]
struct MessageView {
    id: SessionId,
    kind: MessageKind,
    blocks: Vec<RenderedBlock>,
}

#[derive(Debug, Default)]
pub struct TranscriptView {
    theme: Theme,
    messages: Vec<MessageView>,
    renders: usize,
    highlighter: Option<Box<dyn Highlighter>>,
    next_marker: u32,
    current_marker: Option<MarkerId>,
}

impl TranscriptView {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Switches the theme and re-renders every block.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.current_marker = None;
        let highlighter = self.highlighter.as_deref();
        for message in &mut self.messages {
            for rendered in &mut message.blocks {
                *rendered = render_marked(
                    &rendered.block,
                    message.kind,
                    &self.theme,
                    highlighter,
                    &mut self.next_marker,
                );
                self.renders += 1;
            }
        }
    }

    /// Replaces the highlighter (`None` removes all marks) and re-runs it over
    /// the blocks already shown. Returns how many blocks were re-rendered.
    pub fn set_highlighter(&mut self, highlighter: Option<Box<dyn Highlighter>>) -> usize {
        self.highlighter = highlighter;
        self.current_marker = None;
        self.reprocess_highlights()
    }

    /// Re-renders prose blocks that carry marks or that the highlighter might
    /// match. Blocks it can rule out keep their lines.
    pub fn reprocess_highlights(&mut self) -> usize {
        let highlighter = self.highlighter.as_deref();
        let mut rerendered = 0;
        for message in &mut self.messages {
            for rendered in &mut message.blocks {
                if !matches!(rendered.block.kind, BlockKind::Prose) {
                    continue;
                }
                let affected = !rendered.markers.is_empty()
                    || highlighter.is_some_and(|h| h.might_match(&rendered.block.raw));
                if !affected {
                    continue;
                }
                *rendered = render_marked(
                    &rendered.block,
                    message.kind,
                    &self.theme,
                    highlighter,
                    &mut self.next_marker,
                );
                rerendered += 1;
            }
        }
        self.renders += rerendered;
        debug!(rerendered, "re-ran highlighter");
        rerendered
    }

    /// Every marker currently shown, in transcript order.
    pub fn marker_ids(&self) -> Vec<MarkerId> {
        self.messages
            .iter()
            .flat_map(|m| m.blocks.iter())
            .flat_map(|r| r.markers.iter().map(|marker| marker.id))
            .collect()
    }

    pub fn find_marker(&self, id: MarkerId) -> Option<MarkerLocation> {
        for message in &self.messages {
            for (block, rendered) in message.blocks.iter().enumerate() {
                if let Some(marker) = rendered.markers.iter().find(|m| m.id == id) {
                    return Some(MarkerLocation {
                        session: message.id,
                        block,
                        line: marker.line,
                    });
                }
            }
        }
        None
    }

    pub fn current_marker(&self) -> Option<MarkerId> {
        self.current_marker
    }

    /// Moves the current-match style to `id`. The previous current marker goes
    /// back to the plain match style. Returns false if `id` is not shown.
    pub fn set_current_marker(&mut self, id: Option<MarkerId>) -> bool {
        if let Some(previous) = self.current_marker.take() {
            self.restyle_marker(previous, self.theme.match_style);
        }
        let Some(id) = id else {
            return true;
        };
        let found = self.restyle_marker(id, self.theme.current_match_style);
        if found {
            self.current_marker = Some(id);
        }
        found
    }

    fn restyle_marker(&mut self, id: MarkerId, style: Style) -> bool {
        for message in &mut self.messages {
            for rendered in &mut message.blocks {
                let Some(marker) = rendered.markers.iter().find(|m| m.id == id) else {
                    continue;
                };
                if let Some(span) = rendered
                    .lines
                    .get_mut(marker.line)
                    .and_then(|line| line.spans.get_mut(marker.span))
                {
                    span.style = marker.base.patch(style);
                    return true;
                }
            }
        }
        false
    }

    /// Number of block renders so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn blocks(&self, session: SessionId) -> Vec<Block> {
        self.message(session)
            .map(|m| m.blocks.iter().map(|r| r.block.clone()).collect())
            .unwrap_or_default()
    }

    fn message(&self, session: SessionId) -> Option<&MessageView> {
        self.messages.iter().find(|m| m.id == session)
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                out.push(Line::default());
            }
            let style = self.theme.message_style(message.kind);
            out.push(Line::from(vec![
                Span::styled(format!("{} ", style.icon), style.title_style),
                Span::styled(style.title, style.title_style),
            ]));
            for rendered in &message.blocks {
                out.extend(rendered.lines.iter().cloned());
            }
        }
        out
    }

    pub fn plain_text(&self) -> String {
        self.lines()
            .iter()
            .map(|line| line.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One line per block: session, kind, state and size.
    pub fn block_summary(&self) -> Vec<String> {
        let mut out = Vec::new();
        for message in &self.messages {
            for (i, rendered) in message.blocks.iter().enumerate() {
                let block = &rendered.block;
                let detail = match &block.kind {
                    BlockKind::Prose => String::new(),
                    BlockKind::Code(code) => format!(
                        " lang={} closed={}",
                        code.lang.as_deref().unwrap_or("-"),
                        code.closed
                    ),
                    BlockKind::Edit(edit) => {
                        let (adds, dels) = edit.line_stats();
                        format!(
                            " file={} +{adds} -{dels} closed={}",
                            edit.filename.as_deref().unwrap_or("?"),
                            edit.closed
                        )
                    }
                };
                out.push(format!(
                    "{} {} #{i} {} {:?} {}B{detail}",
                    message.id,
                    message.kind,
                    block.kind.label(),
                    block.state,
                    block.raw.len(),
                ));
            }
        }
        out
    }
}

impl DisplayAdapter for TranscriptView {
    fn session_started(&mut self, session: SessionId, kind: MessageKind) {
        self.messages.push(MessageView {
            id: session,
            kind,
            blocks: Vec::new(),
        });
    }

    fn apply(&mut self, session: SessionId, update: &BlockUpdate) {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == session) else {
            return;
        };
        message.blocks.truncate(update.total);
        for (offset, block) in update.tail.iter().enumerate() {
            let index = update.first_changed + offset;
            if message
                .blocks
                .get(index)
                .is_some_and(|existing| existing.block == *block)
            {
                continue;
            }
            let rendered = render_marked(
                block,
                message.kind,
                &self.theme,
                self.highlighter.as_deref(),
                &mut self.next_marker,
            );
            self.renders += 1;
            if index < message.blocks.len() {
                message.blocks[index] = rendered;
            } else {
                message.blocks.push(rendered);
            }
        }
    }

    fn session_closed(&mut self, session: SessionId) {
        self.messages.retain(|m| m.id != session);
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Collects marks while one block renders.
struct Marking<'a> {
    highlighter: Option<&'a dyn Highlighter>,
    style: Style,
    next_id: &'a mut u32,
    markers: Vec<Marker>,
}

impl Marking<'_> {
    /// Pushes `text` onto the line being built, splitting out each match
    /// into its own marked span. `line` is the index that line will get.
    fn push(&mut self, line: usize, spans: &mut Vec<Span<'static>>, text: String, style: Style) {
        let ranges = self
            .highlighter
            .map(|h| h.find(&text))
            .unwrap_or_default();
        if ranges.is_empty() {
            spans.push(Span::styled(text, style));
            return;
        }
        let mut last = 0;
        for range in ranges {
            if range.start > last {
                spans.push(Span::styled(text[last..range.start].to_string(), style));
            }
            let id = MarkerId(*self.next_id);
            *self.next_id += 1;
            self.markers.push(Marker {
                id,
                line,
                span: spans.len(),
                base: style,
            });
            spans.push(Span::styled(
                text[range.clone()].to_string(),
                style.patch(self.style),
            ));
            last = range.end;
        }
        if last < text.len() {
            spans.push(Span::styled(text[last..].to_string(), style));
        }
    }
}

fn render_marked(
    block: &Block,
    kind: MessageKind,
    theme: &Theme,
    highlighter: Option<&dyn Highlighter>,
    next_marker: &mut u32,
) -> RenderedBlock {
    let mut marking = Marking {
        highlighter,
        style: theme.match_style,
        next_id: next_marker,
        markers: Vec::new(),
    };
    let lines = match &block.kind {
        BlockKind::Prose => render_prose(
            &block.raw,
            theme.message_style(kind).text_style,
            theme,
            &mut marking,
        ),
        BlockKind::Code(code) => render_code(code, theme),
        BlockKind::Edit(edit) => render_edit(edit, theme),
    };
    RenderedBlock {
        block: block.clone(),
        lines,
        markers: marking.markers,
    }
}

fn render_code(code: &CodeBlock, theme: &Theme) -> Vec<Line<'static>> {
    let label = code.lang.as_deref().unwrap_or("code");
    let mut lines = vec![Line::from(Span::styled(
        format!("┌ {label}"),
        theme.code_label_style,
    ))];
    for line in code.body.lines() {
        lines.push(Line::from(vec![
            Span::styled("│ ", theme.code_label_style),
            Span::styled(line.to_string(), theme.code_style),
        ]));
    }
    lines.push(Line::from(Span::styled("└", theme.code_label_style)));
    lines
}

fn render_edit(edit: &EditBlock, theme: &Theme) -> Vec<Line<'static>> {
    let (adds, dels) = edit.line_stats();
    let filename = edit.filename.as_deref().unwrap_or("(unknown file)");
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("✎ {filename} "), theme.edit_header_style),
        Span::styled(format!("+{adds}"), theme.edit_adds_style),
        Span::raw(" "),
        Span::styled(format!("-{dels}"), theme.edit_dels_style),
    ])];
    for line in edit.search.lines() {
        lines.push(Line::from(Span::styled(format!("- {line}"), theme.search_style)));
    }
    for line in edit.replace.lines() {
        lines.push(Line::from(Span::styled(format!("+ {line}"), theme.replace_style)));
    }
    lines
}

fn heading_style(level: HeadingLevel, theme: &Theme) -> Style {
    match level {
        HeadingLevel::H1 => theme.heading_style.add_modifier(Modifier::UNDERLINED),
        _ => theme.heading_style,
    }
}

enum ListKind {
    Unordered,
    Ordered(u64),
}

fn flush_line(lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}

/// Renders one prose block. Whitespace-only blocks render as nothing.
fn render_prose(
    raw: &str,
    base: Style,
    theme: &Theme,
    marking: &mut Marking<'_>,
) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![base];
    let mut list_stack: Vec<ListKind> = Vec::new();
    let mut in_code_block = false;

    for event in Parser::new_ext(raw, options) {
        let current = *style_stack.last().unwrap_or(&base);
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    flush_line(&mut lines, &mut spans);
                    style_stack.push(heading_style(level, theme));
                }
                Tag::BlockQuote(_) => {
                    style_stack.push(current.add_modifier(Modifier::ITALIC));
                    spans.push(Span::styled("▎ ", theme.rule_style));
                }
                Tag::List(start) => {
                    flush_line(&mut lines, &mut spans);
                    list_stack.push(match start {
                        Some(n) => ListKind::Ordered(n),
                        None => ListKind::Unordered,
                    });
                }
                Tag::Item => {
                    flush_line(&mut lines, &mut spans);
                    let indent = "  ".repeat(list_stack.len().saturating_sub(1));
                    let marker = match list_stack.last_mut() {
                        Some(ListKind::Ordered(n)) => {
                            let marker = format!("{indent}{n}. ");
                            *n += 1;
                            marker
                        }
                        _ => format!("{indent}• "),
                    };
                    spans.push(Span::styled(marker, current));
                }
                Tag::CodeBlock(_) => {
                    flush_line(&mut lines, &mut spans);
                    in_code_block = true;
                }
                Tag::Emphasis => style_stack.push(current.add_modifier(Modifier::ITALIC)),
                Tag::Strong => style_stack.push(current.add_modifier(Modifier::BOLD)),
                Tag::Strikethrough => {
                    style_stack.push(current.add_modifier(Modifier::CROSSED_OUT))
                }
                Tag::Link { .. } => style_stack.push(theme.link_style),
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Paragraph | TagEnd::TableRow | TagEnd::TableHead => {
                    flush_line(&mut lines, &mut spans)
                }
                TagEnd::Heading(_) | TagEnd::BlockQuote(_) => {
                    flush_line(&mut lines, &mut spans);
                    style_stack.pop();
                }
                TagEnd::List(_) => {
                    flush_line(&mut lines, &mut spans);
                    list_stack.pop();
                }
                TagEnd::Item => flush_line(&mut lines, &mut spans),
                TagEnd::CodeBlock => in_code_block = false,
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                    style_stack.pop();
                }
                _ => {}
            },
            Event::Text(text) if in_code_block => {
                for line in text.lines() {
                    lines.push(Line::from(Span::styled(
                        format!("    {line}"),
                        theme.code_style,
                    )));
                }
            }
            Event::Text(text) => {
                marking.push(lines.len(), &mut spans, text.into_string(), current)
            }
            Event::Code(code) => marking.push(
                lines.len(),
                &mut spans,
                code.into_string(),
                theme.inline_code_style,
            ),
            Event::SoftBreak => spans.push(Span::styled(" ", current)),
            Event::HardBreak => flush_line(&mut lines, &mut spans),
            Event::Rule => {
                flush_line(&mut lines, &mut spans);
                lines.push(Line::from(Span::styled("─".repeat(24), theme.rule_style)));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                spans.push(Span::styled(marker, current));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                spans.push(Span::styled(html.trim_end().to_string(), current))
            }
            _ => {}
        }
    }
    flush_line(&mut lines, &mut spans);
    lines
}
