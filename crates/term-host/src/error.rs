//! Error types for `term-host`'s genuinely fallible entry points: paste
//! safety rejection and the tmux layout/checksum parser.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasteError {
    /// The paste text contains a bare `\n` or an embedded bracketed-paste
    /// end sequence and the caller did not ask for lossy sanitization.
    #[error("paste text is not safe to send verbatim")]
    Unsafe,
    /// The non-bracketed path needs to fold `\n` to `\r` but was given an
    /// immutable buffer to do it in; call `encode_mut` with a mutable copy.
    #[error("paste text contains a newline and needs a mutable buffer to encode non-bracketed")]
    MutableRequired,
}

pub use term_core::error::LayoutError;
