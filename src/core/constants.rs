//! Shared constants used across the renderer

/// Lines scanned after an opening fence when deciding whether it wraps an
/// edit block. Markers past this window leave the fence as plain code.
pub const DEFAULT_EDIT_BLOCK_LOOKAHEAD: usize = 25;

/// Minimum and maximum run length of edit-block marker characters.
pub const MARKER_MIN: usize = 5;
pub const MARKER_MAX: usize = 9;

/// Bytes the CLI replays per chunk when none is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 16;

/// Name of the environment variable holding the tracing filter.
pub const LOG_ENV: &str = "MARKSTREAM_LOG";
