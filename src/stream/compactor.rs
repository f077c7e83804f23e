//! Post-stream merging of adjacent blocks.

use std::fmt;

use tracing::warn;

use crate::stream::block::{joined_raw, Block, BlockKind};

/// Identifies one compaction pass in logs. Callers create it and pass it
/// down; there is no shared counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoundId(u64);

impl RoundId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionError {
    /// The message still has provisional blocks.
    Incomplete { round: RoundId },
    /// Merged blocks no longer reproduce the message text.
    RoundTrip {
        round: RoundId,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for CompactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompactionError::Incomplete { round } => {
                write!(f, "{round}: message still has provisional blocks")
            }
            CompactionError::RoundTrip {
                round,
                expected,
                actual,
            } => write!(
                f,
                "{round}: merged blocks cover {actual} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for CompactionError {}

fn mergeable(acc: &Block, next: &Block) -> bool {
    match (&acc.kind, &next.kind) {
        (BlockKind::Prose, BlockKind::Prose) => true,
        (BlockKind::Code(a), BlockKind::Code(b)) => a.closed && b.closed && a.lang == b.lang,
        _ => false,
    }
}

fn merge_into(acc: &mut Block, next: &Block) {
    acc.raw.push_str(&next.raw);
    if let (BlockKind::Code(a), BlockKind::Code(b)) = (&mut acc.kind, &next.kind) {
        a.body.push_str(&b.body);
    }
}

/// Merges runs of prose blocks, and runs of closed code blocks sharing a
/// language, into single blocks. Edit blocks are left alone.
///
/// Running it on its own output changes nothing.
pub fn compact(blocks: &[Block], round: RoundId) -> Result<Vec<Block>, CompactionError> {
    if blocks.iter().any(|b| !b.is_finalized()) {
        return Err(CompactionError::Incomplete { round });
    }

    let mut out: Vec<Block> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match out.last_mut() {
            Some(acc) if mergeable(acc, block) => merge_into(acc, block),
            _ => out.push(block.clone()),
        }
    }

    let expected = joined_raw(blocks);
    let actual = joined_raw(&out);
    if expected != actual {
        warn!(
            %round,
            expected = expected.len(),
            actual = actual.len(),
            "compaction broke the round-trip invariant"
        );
        return Err(CompactionError::RoundTrip {
            round,
            expected: expected.len(),
            actual: actual.len(),
        });
    }
    Ok(out)
}
