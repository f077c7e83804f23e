use std::collections::BTreeMap;

use crate::core::message::MessageKind;
use crate::stream::block::Block;
use crate::stream::display::{BlockUpdate, DisplayAdapter, SessionId};
use crate::stream::renderer::{IncrementalRenderer, RenderOptions};

/// Display adapter that mirrors the block lists it is sent.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    pub sessions: BTreeMap<SessionId, (MessageKind, Vec<Block>)>,
    pub started: Vec<SessionId>,
    pub closed: Vec<SessionId>,
    pub updates: usize,
    pub compactions: usize,
    pub clears: usize,
}

impl RecordingAdapter {
    pub fn blocks(&self, session: SessionId) -> Vec<Block> {
        self.sessions
            .get(&session)
            .map(|(_, blocks)| blocks.clone())
            .unwrap_or_default()
    }
}

impl DisplayAdapter for RecordingAdapter {
    fn session_started(&mut self, session: SessionId, kind: MessageKind) {
        self.started.push(session);
        self.sessions.insert(session, (kind, Vec::new()));
    }

    fn apply(&mut self, session: SessionId, update: &BlockUpdate) {
        let Some((_, blocks)) = self.sessions.get_mut(&session) else {
            return;
        };
        update.apply_to(blocks);
        self.updates += 1;
        if update.compacted {
            self.compactions += 1;
        }
    }

    fn session_closed(&mut self, session: SessionId) {
        self.closed.push(session);
        self.sessions.remove(&session);
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.sessions.clear();
    }
}

/// Feeds `chunks` through a fresh renderer, applying every update to a
/// mirrored list, and checks the mirror against the renderer after each step.
pub fn render_chunks(chunks: &[&str], complete: bool) -> Vec<Block> {
    render_chunks_with(RenderOptions::default(), chunks, complete)
}

pub fn render_chunks_with(options: RenderOptions, chunks: &[&str], complete: bool) -> Vec<Block> {
    let mut renderer = IncrementalRenderer::new(options);
    let mut mirror = Vec::new();
    for chunk in chunks {
        if let Some(update) = renderer.process_chunk(chunk) {
            update.apply_to(&mut mirror);
        }
        assert_eq!(mirror, renderer.blocks());
    }
    if complete {
        if let Some(update) = renderer.complete() {
            update.apply_to(&mut mirror);
        }
        assert_eq!(mirror, renderer.blocks());
    }
    mirror
}

/// Splits `text` into pieces of at most `size` bytes on char boundaries.
pub fn chunked(text: &str, size: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        pieces.push(&text[start..end]);
        start = end;
    }
    pieces
}

pub fn raws(blocks: &[Block]) -> Vec<&str> {
    blocks.iter().map(|b| b.raw.as_str()).collect()
}

pub fn labels(blocks: &[Block]) -> Vec<&'static str> {
    blocks.iter().map(|b| b.kind.label()).collect()
}

pub const SAMPLE_REPLY: &str = "Here is the fix.\n\n\
## Changes\n\n\
- rename the helper\n\
- tighten the check\n\n\
```rust\n\
fn main() {\n    println!(\"héllo\");\n}\n\
```\n\n\
```rust\n\
src/lib.rs\n\
<<<<<<< SEARCH\n\
let a = 1;\n\
=======\n\
let a = 2;\n\
>>>>>>> REPLACE\n\
```\n\n\
Done. ✓\n";
