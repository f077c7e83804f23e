//! Parsed units of a message.

/// Whether more text can still change a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockState {
    Provisional,
    Finalized,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the fence info string, if any.
    pub lang: Option<String>,
    /// Lines between the fences, newlines included.
    pub body: String,
    /// False while (or if) the closing fence never arrived.
    pub closed: bool,
}

/// A search/replace construct targeting one file.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EditBlock {
    pub filename: Option<String>,
    /// Literal text between the SEARCH and divider markers.
    pub search: String,
    /// Literal text between the divider and REPLACE markers.
    pub replace: String,
    pub fenced: bool,
    pub closed: bool,
}

impl EditBlock {
    /// `(adds, dels)` as shown in the block header.
    pub fn line_stats(&self) -> (usize, usize) {
        (count_lines(&self.replace), count_lines(&self.search))
    }
}

fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let newlines = memchr::memchr_iter(b'\n', text.as_bytes()).count();
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Prose,
    Code(CodeBlock),
    Edit(EditBlock),
}

impl BlockKind {
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Prose => "prose",
            BlockKind::Code(_) => "code",
            BlockKind::Edit(_) => "edit",
        }
    }
}

/// One block of a rendered message. `raw` is the exact source span, so the
/// concatenation of a message's blocks is the message text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub raw: String,
    pub state: BlockState,
}

impl Block {
    pub fn new(kind: BlockKind, raw: impl Into<String>, state: BlockState) -> Self {
        Self {
            kind,
            raw: raw.into(),
            state,
        }
    }

    pub fn prose(raw: impl Into<String>) -> Self {
        Self::new(BlockKind::Prose, raw, BlockState::Finalized)
    }

    pub fn is_finalized(&self) -> bool {
        self.state == BlockState::Finalized
    }

    pub fn is_prose(&self) -> bool {
        matches!(self.kind, BlockKind::Prose)
    }

    pub fn as_code(&self) -> Option<&CodeBlock> {
        match &self.kind {
            BlockKind::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn as_edit(&self) -> Option<&EditBlock> {
        match &self.kind {
            BlockKind::Edit(edit) => Some(edit),
            _ => None,
        }
    }

    /// Fences and edit blocks whose closing line has been seen.
    pub fn is_closed_construct(&self) -> bool {
        match &self.kind {
            BlockKind::Prose => false,
            BlockKind::Code(code) => code.closed,
            BlockKind::Edit(edit) => edit.closed,
        }
    }

    pub(crate) fn finalize(&mut self) {
        self.state = BlockState::Finalized;
    }
}

/// Concatenate the raw spans of `blocks`.
pub fn joined_raw(blocks: &[Block]) -> String {
    let mut out = String::with_capacity(blocks.iter().map(|b| b.raw.len()).sum());
    for block in blocks {
        out.push_str(&block.raw);
    }
    out
}
