//! Incremental parsing of streamed message text into blocks.
//!
//! - [`accumulator`] buffers appended chunks per message.
//! - [`renderer`] re-parses only the unstable tail into [`block::Block`]s,
//!   using [`scanner`] and the [`edit_block`] sub-grammar.
//! - [`compactor`] merges adjacent blocks once a message is complete.
//! - [`session`] runs one worker per message and marshals updates to the
//!   [`display::DisplayAdapter`] on the UI thread.

pub mod accumulator;
pub mod block;
pub mod compactor;
pub mod display;
pub mod edit_block;
pub mod renderer;
pub(crate) mod scanner;
pub mod session;

#[cfg(test)]
mod tests;

pub use block::{Block, BlockKind, BlockState, CodeBlock, EditBlock};
pub use compactor::{CompactionError, RoundId};
pub use display::{BlockUpdate, DisplayAdapter, SessionId};
pub use renderer::{CompactFailure, IncrementalRenderer, RenderOptions};
pub use session::RenderSession;
