//! Seam between the renderer and whatever draws blocks on screen.

use std::fmt;

use crate::core::message::MessageKind;
use crate::stream::block::Block;

/// Identifies a render session (one message) across the worker and UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// A partial update: `blocks[first_changed..]` is replaced by `tail`, leaving
/// `total` blocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockUpdate {
    pub first_changed: usize,
    pub tail: Vec<Block>,
    pub total: usize,
    /// Set when the update replaces blocks with their compacted form.
    pub compacted: bool,
}

impl BlockUpdate {
    pub fn apply_to(&self, blocks: &mut Vec<Block>) {
        blocks.truncate(self.first_changed);
        blocks.extend(self.tail.iter().cloned());
        debug_assert_eq!(blocks.len(), self.total);
    }
}

/// Receives block sequences on the UI thread. Implementations own their view
/// state; every call happens on the same thread in the order updates were
/// produced.
pub trait DisplayAdapter: Send + 'static {
    fn session_started(&mut self, _session: SessionId, _kind: MessageKind) {}

    fn apply(&mut self, session: SessionId, update: &BlockUpdate);

    fn session_closed(&mut self, _session: SessionId) {}

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_replaces_tail_only() {
        let mut blocks = vec![Block::prose("a"), Block::prose("b")];
        let update = BlockUpdate {
            first_changed: 1,
            tail: vec![Block::prose("b2"), Block::prose("c")],
            total: 3,
            compacted: false,
        };
        update.apply_to(&mut blocks);
        let raws: Vec<&str> = blocks.iter().map(|b| b.raw.as_str()).collect();
        assert_eq!(raws, vec!["a", "b2", "c"]);
    }

    #[test]
    fn session_ids_display() {
        assert_eq!(SessionId(9).to_string(), "msg-9");
    }
}
