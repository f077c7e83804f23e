//! Display layer.
//!
//! - [`dispatch`]: the UI-affinity thread that owns a display adapter and runs
//!   posted jobs in order.
//! - [`transcript`]: the terminal projection of a conversation.
//! - [`theme`]: color policy and the per-kind message style table.
//! - [`highlight`]: find-in-transcript marks applied while prose renders.
//!
//! Ownership boundary: this layer only presents blocks. Parsing and session
//! lifecycles belong to [`crate::stream`] and [`crate::core`].

pub mod dispatch;
pub mod highlight;
pub mod theme;
pub mod transcript;
