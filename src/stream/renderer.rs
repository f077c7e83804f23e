use tracing::debug;

use crate::core::constants::DEFAULT_EDIT_BLOCK_LOOKAHEAD;
use crate::stream::block::Block;
use crate::stream::compactor::{self, CompactionError, RoundId};
use crate::stream::display::BlockUpdate;
use crate::stream::scanner;

/// A compaction that failed. `completion` still has to reach the display:
/// the renderer already counts as completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactFailure {
    pub error: CompactionError,
    pub completion: Option<BlockUpdate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Recognize SEARCH/REPLACE edit blocks. Off for user-authored messages.
    pub edit_blocks: bool,
    /// Lines after an opening fence searched for a SEARCH marker.
    pub edit_block_lookahead: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            edit_blocks: true,
            edit_block_lookahead: DEFAULT_EDIT_BLOCK_LOOKAHEAD,
        }
    }
}

/// Turns a growing message into blocks, re-parsing only the tail that is not
/// yet final.
///
/// Blocks before the stable boundary are never touched again. Each call
/// scans from the end of the last finalized block to the end of the buffer
/// and reports which suffix of the sequence changed.
#[derive(Debug, Default)]
pub struct IncrementalRenderer {
    options: RenderOptions,
    buffer: String,
    blocks: Vec<Block>,
    stable_len: usize,
    stable_count: usize,
    completed: bool,
    compacted: bool,
}

impl IncrementalRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_compacted(&self) -> bool {
        self.compacted
    }

    /// Bytes covered by finalized blocks; everything after is re-parsed.
    pub fn stable_len(&self) -> usize {
        self.stable_len
    }

    pub fn process_chunk(&mut self, chunk: &str) -> Option<BlockUpdate> {
        if chunk.is_empty() {
            return None;
        }
        if self.completed {
            self.reopen();
        }
        self.buffer.push_str(chunk);
        self.reparse(false)
    }

    /// Marks the stream as ended. A trailing partial line counts as a full
    /// line, unterminated constructs become open-ended final blocks, and every
    /// block is finalized.
    pub fn complete(&mut self) -> Option<BlockUpdate> {
        if self.completed {
            return None;
        }
        self.completed = true;
        self.reparse(true)
    }

    /// Merges adjacent blocks for cleaner selection. Completes the stream first
    /// if needed. Repeated calls are no-ops.
    ///
    /// On failure the blocks stay as they were, and the completion update (if
    /// any) is handed back with the error.
    pub fn compact(&mut self, round: RoundId) -> Result<Option<BlockUpdate>, CompactFailure> {
        self.compact_with(round, compactor::compact)
    }

    fn compact_with(
        &mut self,
        round: RoundId,
        merge: impl FnOnce(&[Block], RoundId) -> Result<Vec<Block>, CompactionError>,
    ) -> Result<Option<BlockUpdate>, CompactFailure> {
        let completion = self.complete();
        if self.compacted {
            return Ok(None);
        }
        let merged = match merge(&self.blocks, round) {
            Ok(merged) => merged,
            Err(error) => return Err(CompactFailure { error, completion }),
        };
        self.compacted = true;
        if merged == self.blocks {
            debug!(%round, blocks = merged.len(), "compaction left message unchanged");
            return Ok(completion);
        }
        debug!(
            %round,
            before = self.blocks.len(),
            after = merged.len(),
            "compacted message"
        );
        self.blocks = merged;
        self.stable_count = self.blocks.len();
        self.stable_len = self.buffer.len();
        Ok(Some(BlockUpdate {
            first_changed: 0,
            tail: self.blocks.clone(),
            total: self.blocks.len(),
            compacted: true,
        }))
    }

    /// More text arrived after completion. Blocks finalized only because the
    /// stream had ended are no longer trustworthy, so everything is re-parsed.
    fn reopen(&mut self) {
        debug!(
            compacted = self.compacted,
            blocks = self.blocks.len(),
            "chunk after completion; reopening message"
        );
        self.completed = false;
        self.compacted = false;
        self.stable_len = 0;
        self.stable_count = 0;
    }

    fn reparse(&mut self, at_eof: bool) -> Option<BlockUpdate> {
        let tail = scanner::scan(&self.buffer, self.stable_len, &self.options, at_eof);

        let previous = &self.blocks[self.stable_count..];
        let same_prefix = previous
            .iter()
            .zip(tail.iter())
            .take_while(|(old, new)| old == new)
            .count();
        if same_prefix == previous.len() && same_prefix == tail.len() {
            return None;
        }
        let first_changed = self.stable_count + same_prefix;

        self.blocks.truncate(self.stable_count);
        self.blocks.extend(tail);
        while let Some(block) = self.blocks.get(self.stable_count) {
            if !block.is_finalized() {
                break;
            }
            self.stable_len += block.raw.len();
            self.stable_count += 1;
        }

        debug!(
            first_changed,
            total = self.blocks.len(),
            stable_len = self.stable_len,
            at_eof,
            "reparsed message tail"
        );
        Some(BlockUpdate {
            first_changed,
            tail: self.blocks[first_changed..].to_vec(),
            total: self.blocks.len(),
            compacted: false,
        })
    }
}
