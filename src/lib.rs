//! markstream renders streamed Markdown incrementally for AI coding assistant
//! transcripts.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`stream`] turns appended text into blocks (prose, fenced code and
//!   SEARCH/REPLACE edit blocks), re-parsing only the unstable tail, and runs
//!   one worker per message.
//! - [`core`] owns messages, the conversation surface that routes text to
//!   sessions, configuration and errors.
//! - [`ui`] holds the UI-affinity thread and the terminal transcript view.
//! - [`utils`] provides tracing setup and the transcript log.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod cli;
pub mod core;
pub mod stream;
pub mod ui;
pub mod utils;
