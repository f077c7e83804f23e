//! Find-in-transcript marks.
//!
//! A [`Highlighter`] picks byte ranges out of rendered prose text. The
//! transcript view wraps each range in its own span and gives it a
//! [`MarkerId`], so a search front end can step through matches and restyle
//! the current one without re-rendering anything.

use std::fmt;
use std::ops::Range;

use ratatui::style::Style;

/// Identifies one marked match in a transcript view. Ids are never reused
/// within a view, and a block keeps its ids until it is re-rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a marked span lives inside a block's rendered lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    pub id: MarkerId,
    pub line: usize,
    pub span: usize,
    /// Style of the text before it was marked.
    pub base: Style,
}

pub trait Highlighter: Send + fmt::Debug {
    /// Cheap pre-check on a block's source text. Returning false promises
    /// that [`Highlighter::find`] yields nothing for any text rendered from it.
    fn might_match(&self, _text: &str) -> bool {
        true
    }

    /// Non-overlapping byte ranges to mark, in order.
    fn find(&self, text: &str) -> Vec<Range<usize>>;
}

/// Marks occurrences of a literal search term.
#[derive(Debug, Clone)]
pub struct SearchHighlighter {
    term: String,
    folded: String,
    case_sensitive: bool,
    whole_word: bool,
}

impl SearchHighlighter {
    /// Returns `None` for an empty or whitespace-only term.
    pub fn new(term: impl Into<String>, case_sensitive: bool, whole_word: bool) -> Option<Self> {
        let term = term.into();
        if term.trim().is_empty() {
            return None;
        }
        Some(Self {
            folded: fold(&term),
            term,
            case_sensitive,
            whole_word,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    fn match_end(&self, text: &str, at: usize) -> Option<usize> {
        let mut rest = text[at..].chars();
        let mut end = at;
        for want in self.term.chars() {
            let got = rest.next()?;
            let equal =
                want == got || (!self.case_sensitive && want.to_lowercase().eq(got.to_lowercase()));
            if !equal {
                return None;
            }
            end += got.len_utf8();
        }
        Some(end)
    }

    fn on_word_edges(&self, text: &str, range: &Range<usize>) -> bool {
        let starts_word = self.term.chars().next().is_some_and(is_word_char);
        let ends_word = self.term.chars().next_back().is_some_and(is_word_char);
        let before = text[..range.start].chars().next_back();
        let after = text[range.end..].chars().next();
        (!starts_word || !matches!(before, Some(c) if is_word_char(c)))
            && (!ends_word || !matches!(after, Some(c) if is_word_char(c)))
    }
}

impl Highlighter for SearchHighlighter {
    fn might_match(&self, text: &str) -> bool {
        if self.case_sensitive {
            memchr::memmem::find(text.as_bytes(), self.term.as_bytes()).is_some()
        } else {
            fold(text).contains(&self.folded)
        }
    }

    fn find(&self, text: &str) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut at = 0;
        while at < text.len() {
            if let Some(end) = self.match_end(text, at) {
                let range = at..end;
                if !self.whole_word || self.on_word_edges(text, &range) {
                    found.push(range);
                    at = end;
                    continue;
                }
            }
            at += text[at..].chars().next().map_or(1, char::len_utf8);
        }
        found
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// Per-char lowercase, so folding agrees with the char-wise comparison in
// `match_end` (str::to_lowercase treats a final sigma differently).
fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}
