//! Recognition of SEARCH/REPLACE edit blocks.
//!
//! Two forms are accepted:
//!
//! ````text
//! ```                          <<<<<<< SEARCH path/to/file
//! path/to/file                 old
//! <<<<<<< SEARCH               =======
//! old                          new
//! =======                      >>>>>>> REPLACE
//! new
//! >>>>>>> REPLACE
//! ```
//! ````
//!
//! Marker runs are 5 to 9 characters long. The search and replace fields hold
//! the literal text between their markers, newlines included.

use crate::core::constants::{MARKER_MAX, MARKER_MIN};
use crate::stream::block::EditBlock;
use crate::stream::scanner::{is_fence_close, lines_from, parse_fence_open, Fence, Line};

fn marker_run(content: &str, marker: u8) -> Option<&str> {
    let run = content.bytes().take_while(|b| *b == marker).count();
    (MARKER_MIN..=MARKER_MAX)
        .contains(&run)
        .then(|| &content[run..])
}

/// `<<<<<<< SEARCH [filename]`. Returns the optional trailing filename.
pub fn parse_head(content: &str) -> Option<Option<String>> {
    let rest = marker_run(content.trim_end(), b'<')?.strip_prefix(" SEARCH")?;
    if rest.is_empty() {
        return Some(None);
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    Some((!name.is_empty()).then(|| name.to_string()))
}

pub fn is_divider(content: &str) -> bool {
    marker_run(content.trim_end(), b'=').is_some_and(str::is_empty)
}

pub fn is_updated(content: &str) -> bool {
    marker_run(content.trim_end(), b'>')
        .and_then(|rest| rest.strip_prefix(" REPLACE"))
        .is_some_and(str::is_empty)
}

/// Ignores fence lines and ellipses, and strips the usual
/// decorations models put around a path (`` `a.rs` ``, `**a.rs**`, `# a.rs:`).
fn strip_filename(line: &str) -> Option<String> {
    let s = line.trim();
    if s == "..." || s.starts_with("```") {
        return None;
    }
    let s = s.strip_suffix(':').unwrap_or(s);
    let s = s.strip_prefix('#').unwrap_or(s).trim();
    let s = s.trim_matches('`').trim_matches('*');
    (!s.trim().is_empty()).then(|| s.trim().to_string())
}

/// Looks at up to three lines above an unfenced SEARCH marker for a filename.
/// Stops at the first line that is not a fence.
pub(crate) fn find_filename_nearby(text: &str, head_start: usize) -> Option<String> {
    let mut candidates = Vec::new();
    let mut end = head_start;
    for _ in 0..3 {
        if end == 0 {
            break;
        }
        let above = &text[..end - 1];
        let start = above.rfind('\n').map_or(0, |i| i + 1);
        let line = above[start..].trim_end_matches('\r');
        if let Some(candidate) = strip_filename(line) {
            candidates.push(candidate);
        }
        if !line.trim().starts_with("```") {
            break;
        }
        end = start;
    }
    candidates
        .iter()
        .find(|c| c.contains('.'))
        .or_else(|| candidates.first())
        .cloned()
}

/// Decides whether the fence opening at `open` wraps an edit block: a SEARCH
/// marker must appear within `lookahead` lines and before any other fence.
pub(crate) fn fence_wraps_edit_block(
    text: &str,
    open: Line,
    lookahead: usize,
    at_eof: bool,
) -> bool {
    for line in lines_from(text, open.end).take(lookahead) {
        if !line.is_complete(at_eof) {
            return false;
        }
        let content = line.content(text);
        if parse_fence_open(content).is_some() {
            return false;
        }
        if parse_head(content).is_some() {
            return true;
        }
    }
    false
}

#[derive(Clone, Copy)]
enum Phase {
    Filename,
    AwaitHead,
    Search(usize),
    Replace(usize),
    Done,
}

fn fill_open_section(edit: &mut EditBlock, phase: Phase, text: &str, end: usize) {
    match phase {
        Phase::Search(start) => edit.search = text[start..end].to_string(),
        Phase::Replace(start) => edit.replace = text[start..end].to_string(),
        _ => {}
    }
}

/// Parses a fenced edit block whose opening fence is `open`. Returns the block
/// and the byte offset where it ends.
pub(crate) fn parse_fenced(
    text: &str,
    open: Line,
    fence: &Fence,
    at_eof: bool,
) -> (EditBlock, usize) {
    let mut edit = EditBlock {
        fenced: true,
        ..EditBlock::default()
    };
    let mut phase = Phase::Filename;

    for line in lines_from(text, open.end) {
        let complete = line.is_complete(at_eof);
        let content = line.content(text);
        phase = match phase {
            Phase::Filename => match parse_head(content).filter(|_| complete) {
                Some(name) => {
                    edit.filename = name;
                    Phase::Search(line.end)
                }
                None => {
                    let name = content.trim();
                    edit.filename = (!name.is_empty()).then(|| name.to_string());
                    Phase::AwaitHead
                }
            },
            Phase::AwaitHead if complete => {
                if let Some(name) = parse_head(content) {
                    if edit.filename.is_none() {
                        edit.filename = name;
                    }
                    Phase::Search(line.end)
                } else if is_divider(content) {
                    Phase::Replace(line.end)
                } else {
                    Phase::AwaitHead
                }
            }
            Phase::Search(start) if complete && is_divider(content) => {
                edit.search = text[start..line.start].to_string();
                Phase::Replace(line.end)
            }
            Phase::Replace(start) if complete && is_updated(content) => {
                edit.replace = text[start..line.start].to_string();
                Phase::Done
            }
            Phase::Done if complete && is_fence_close(content, fence.ticks) => {
                edit.closed = true;
                return (edit, line.end);
            }
            other => other,
        };
    }

    fill_open_section(&mut edit, phase, text, text.len());
    (edit, text.len())
}

/// Parses an unfenced edit block starting at the SEARCH line `head`.
pub(crate) fn parse_unfenced(
    text: &str,
    head: Line,
    filename: Option<String>,
    at_eof: bool,
) -> (EditBlock, usize) {
    let mut edit = EditBlock {
        filename: filename.or_else(|| find_filename_nearby(text, head.start)),
        ..EditBlock::default()
    };
    let mut phase = Phase::Search(head.end);

    for line in lines_from(text, head.end) {
        if !line.is_complete(at_eof) {
            continue;
        }
        let content = line.content(text);
        phase = match phase {
            Phase::Search(start) if is_divider(content) => {
                edit.search = text[start..line.start].to_string();
                Phase::Replace(line.end)
            }
            Phase::Replace(start) if is_updated(content) => {
                edit.replace = text[start..line.start].to_string();
                edit.closed = true;
                return (edit, line.end);
            }
            other => other,
        };
    }

    fill_open_section(&mut edit, phase, text, text.len());
    (edit, text.len())
}
