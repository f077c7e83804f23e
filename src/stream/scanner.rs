//! Line-oriented block scanner.
//!
//! Splits a region of a message into prose, code-fence and edit blocks. A
//! line that has no terminating newline yet is inert until the stream ends:
//! it never opens or closes a construct and never decides a prose split, so
//! the blocks before it cannot change when more text arrives.

use memchr::memchr;
use pulldown_cmark::{Event, Options, Parser};

use crate::stream::block::{Block, BlockKind, BlockState, CodeBlock};
use crate::stream::edit_block;
use crate::stream::renderer::RenderOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Line {
    pub start: usize,
    /// One past the newline, or the end of the text for a partial line.
    pub end: usize,
    pub terminated: bool,
}

impl Line {
    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        let s = &text[self.start..self.end];
        let s = s.strip_suffix('\n').unwrap_or(s);
        s.strip_suffix('\r').unwrap_or(s)
    }

    pub fn is_complete(&self, at_eof: bool) -> bool {
        self.terminated || at_eof
    }
}

pub(crate) fn line_at(text: &str, start: usize) -> Line {
    match memchr(b'\n', &text.as_bytes()[start..]) {
        Some(i) => Line {
            start,
            end: start + i + 1,
            terminated: true,
        },
        None => Line {
            start,
            end: text.len(),
            terminated: false,
        },
    }
}

pub(crate) struct LineIter<'a> {
    text: &'a str,
    pos: usize,
}

impl Iterator for LineIter<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if self.pos >= self.text.len() {
            return None;
        }
        let line = line_at(self.text, self.pos);
        self.pos = line.end;
        Some(line)
    }
}

pub(crate) fn lines_from(text: &str, pos: usize) -> LineIter<'_> {
    LineIter { text, pos }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Fence {
    pub ticks: usize,
    pub lang: Option<String>,
}

fn strip_indent(content: &str) -> Option<&str> {
    let rest = content.trim_start_matches(' ');
    (content.len() - rest.len() <= 3).then_some(rest)
}

/// An opening backtick fence: up to three spaces, three or more backticks and
/// an info string without backticks.
pub(crate) fn parse_fence_open(content: &str) -> Option<Fence> {
    let rest = strip_indent(content)?;
    let ticks = rest.bytes().take_while(|b| *b == b'`').count();
    if ticks < 3 {
        return None;
    }
    let info = rest[ticks..].trim();
    if info.contains('`') {
        return None;
    }
    Some(Fence {
        ticks,
        lang: info.split_whitespace().next().map(str::to_string),
    })
}

pub(crate) fn is_fence_close(content: &str, ticks: usize) -> bool {
    let Some(rest) = strip_indent(content) else {
        return false;
    };
    let run = rest.bytes().take_while(|b| *b == b'`').count();
    run >= ticks && rest[run..].trim().is_empty()
}

fn parse_code(text: &str, open: Line, fence: Fence, at_eof: bool) -> (CodeBlock, usize) {
    for line in lines_from(text, open.end) {
        if line.is_complete(at_eof) && is_fence_close(line.content(text), fence.ticks) {
            let code = CodeBlock {
                lang: fence.lang,
                body: text[open.end..line.start].to_string(),
                closed: true,
            };
            return (code, line.end);
        }
    }
    let code = CodeBlock {
        lang: fence.lang,
        body: text[open.end..].to_string(),
        closed: false,
    };
    (code, text.len())
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Splits the prose run `text[start..end]` at top-level CommonMark block
/// starts. Blank lines stay with the block they follow.
fn split_prose(text: &str, start: usize, end: usize, at_eof: bool, out: &mut Vec<Block>) {
    let run = &text[start..end];
    let settled = if at_eof {
        run.len()
    } else {
        run.rfind('\n').map_or(0, |i| i + 1)
    };

    // Leading blank lines belong to the first block.
    let mut cuts: Vec<usize> = Vec::new();
    let mut push_cut = |offset: usize| match cuts.last() {
        None => cuts.push(0),
        Some(&last) => {
            let at = line_start(run, offset);
            if at > last {
                cuts.push(at);
            }
        }
    };

    let mut depth = 0usize;
    for (event, range) in Parser::new_ext(&run[..settled], markdown_options()).into_offset_iter() {
        match event {
            Event::Start(_) => {
                if depth == 0 {
                    push_cut(range.start);
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            _ if depth == 0 => push_cut(range.start),
            _ => {}
        }
    }

    if cuts.is_empty() {
        cuts.push(0);
    }
    cuts.push(run.len());
    for pair in cuts.windows(2) {
        out.push(Block::new(
            BlockKind::Prose,
            &run[pair[0]..pair[1]],
            BlockState::Provisional,
        ));
    }
}

/// Scans `text[from..]` into blocks and applies the finalization policy:
/// every block followed by another is final, and the last one is final when
/// the stream has ended or it is a closed fence or edit block.
pub(crate) fn scan(text: &str, from: usize, options: &RenderOptions, at_eof: bool) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut prose_start: Option<usize> = None;
    let mut cursor = from;

    while cursor < text.len() {
        let line = line_at(text, cursor);
        if line.is_complete(at_eof) {
            let content = line.content(text);
            let construct = if let Some(fence) = parse_fence_open(content) {
                let wraps_edit = options.edit_blocks
                    && edit_block::fence_wraps_edit_block(
                        text,
                        line,
                        options.edit_block_lookahead,
                        at_eof,
                    );
                Some(if wraps_edit {
                    let (edit, end) = edit_block::parse_fenced(text, line, &fence, at_eof);
                    (BlockKind::Edit(edit), end)
                } else {
                    let (code, end) = parse_code(text, line, fence, at_eof);
                    (BlockKind::Code(code), end)
                })
            } else if options.edit_blocks {
                edit_block::parse_head(content).map(|filename| {
                    let (edit, end) = edit_block::parse_unfenced(text, line, filename, at_eof);
                    (BlockKind::Edit(edit), end)
                })
            } else {
                None
            };

            if let Some((kind, end)) = construct {
                if let Some(start) = prose_start.take() {
                    split_prose(text, start, line.start, at_eof, &mut blocks);
                }
                blocks.push(Block::new(
                    kind,
                    &text[line.start..end],
                    BlockState::Provisional,
                ));
                cursor = end;
                continue;
            }
        }
        prose_start.get_or_insert(line.start);
        cursor = line.end;
    }
    if let Some(start) = prose_start {
        split_prose(text, start, text.len(), at_eof, &mut blocks);
    }

    let count = blocks.len();
    for (i, block) in blocks.iter_mut().enumerate() {
        if i + 1 < count || at_eof || block.is_closed_construct() {
            block.finalize();
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> RenderOptions {
        RenderOptions::default()
    }

    fn kinds(blocks: &[Block]) -> Vec<&'static str> {
        blocks.iter().map(|b| b.kind.label()).collect()
    }

    #[test]
    fn fence_open_reads_language() {
        assert_eq!(
            parse_fence_open("```rust"),
            Some(Fence {
                ticks: 3,
                lang: Some("rust".into())
            })
        );
        assert_eq!(parse_fence_open("   ````"), Some(Fence { ticks: 4, lang: None }));
        assert_eq!(parse_fence_open("    ```"), None);
        assert_eq!(parse_fence_open("``"), None);
        assert_eq!(parse_fence_open("```a`b"), None);
    }

    #[test]
    fn fence_close_needs_enough_backticks() {
        assert!(is_fence_close("```", 3));
        assert!(is_fence_close("`````  ", 3));
        assert!(!is_fence_close("```", 4));
        assert!(!is_fence_close("```rust", 3));
    }

    #[test]
    fn line_iteration_marks_partial_tail() {
        let lines: Vec<Line> = lines_from("a\nbc", 0).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].terminated);
        assert!(!lines[1].terminated);
        assert_eq!(lines[1].content("a\nbc"), "bc");
    }

    #[test]
    fn paragraphs_split_at_block_starts() {
        let blocks = scan("one\n\ntwo\n\n# three\n", 0, &opts(), true);
        let raws: Vec<&str> = blocks.iter().map(|b| b.raw.as_str()).collect();
        assert_eq!(raws, vec!["one\n\n", "two\n\n", "# three\n"]);
    }

    #[test]
    fn partial_heading_line_does_not_split() {
        let blocks = scan("para\n#", 0, &opts(), false);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].state, BlockState::Provisional);
    }

    #[test]
    fn prose_code_prose() {
        let text = "intro\n```js\nlet a;\n```\noutro\n";
        let blocks = scan(text, 0, &opts(), false);
        assert_eq!(kinds(&blocks), vec!["prose", "code", "prose"]);
        let code = blocks[1].as_code().unwrap();
        assert_eq!(code.lang.as_deref(), Some("js"));
        assert_eq!(code.body, "let a;\n");
        assert!(code.closed);
        assert!(blocks[0].is_finalized() && blocks[1].is_finalized());
        assert!(!blocks[2].is_finalized());
    }

    #[test]
    fn closed_trailing_fence_is_final() {
        let blocks = scan("```\nx\n```\n", 0, &opts(), false);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_finalized());
    }

    #[test]
    fn unterminated_closing_line_keeps_fence_open() {
        let blocks = scan("```\nx\n```", 0, &opts(), false);
        assert!(!blocks[0].as_code().unwrap().closed);
        assert!(!blocks[0].is_finalized());
    }

    #[test]
    fn edit_markers_ignored_when_disabled() {
        let options = RenderOptions {
            edit_blocks: false,
            ..RenderOptions::default()
        };
        let text = "<<<<<<< SEARCH\na\n=======\nb\n>>>>>>> REPLACE\n";
        let blocks = scan(text, 0, &options, true);
        assert!(blocks.iter().all(Block::is_prose));
    }

    #[test]
    fn scan_from_offset_covers_only_tail() {
        let text = "first\n\nsecond\n";
        let from = text.find("second").unwrap();
        let blocks = scan(text, from, &opts(), true);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].raw, "second\n");
    }
}
