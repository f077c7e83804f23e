//! Error types for rendering sessions.

use std::fmt;

use crate::stream::compactor::CompactionError;

/// Errors surfaced by conversation and session operations.
///
/// Malformed Markdown never appears here: unterminated fences and edit blocks
/// are rendered best-effort instead.
#[derive(Debug)]
pub enum RenderError {
    /// The session worker has shut down; queued work was abandoned.
    SessionClosed,
    /// The UI thread has exited, so the display can no longer be updated.
    UiClosed,
    /// Compacting a message failed; its previous blocks stay on screen.
    Compaction(CompactionError),
    /// The configuration file could not be read or written.
    Config(String),
    /// I/O failure while reading input or writing a transcript log.
    Io(std::io::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SessionClosed => write!(f, "render session is closed"),
            RenderError::UiClosed => write!(f, "UI thread has exited"),
            RenderError::Compaction(err) => write!(f, "compaction failed: {err}"),
            RenderError::Config(msg) => write!(f, "config error: {msg}"),
            RenderError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Compaction(err) => Some(err),
            RenderError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompactionError> for RenderError {
    fn from(value: CompactionError) -> Self {
        RenderError::Compaction(value)
    }
}

impl From<std::io::Error> for RenderError {
    fn from(value: std::io::Error) -> Self {
        RenderError::Io(value)
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for RenderError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        RenderError::SessionClosed
    }
}
