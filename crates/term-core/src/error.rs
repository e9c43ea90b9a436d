//! Error types for the few genuinely fallible entry points.
//!
//! Per the data-plane error policy: malformed input never produces a
//! `Result` here — it resyncs or is dropped in place, optionally logged.
//! These errors cover capacity exhaustion and structural parse failures
//! where "ignore and continue" is not a sound option for the caller.

use thiserror::Error;

/// Errors surfaced by [`crate::page::Page`] writes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PageError {
    /// The style intern table is full; the caller must split to a new page.
    #[error("style table at capacity")]
    StyleTableFull,
    /// The hyperlink intern table is full; the caller must split to a new page.
    #[error("hyperlink table at capacity")]
    HyperlinkTableFull,
    /// The grapheme table is full; the caller must split to a new page.
    #[error("grapheme table at capacity")]
    GraphemeTableFull,
    /// The requested row/col is outside the page's fixed capacity.
    #[error("row/col out of page bounds")]
    OutOfBounds,
}

/// Errors surfaced by the tmux layout/checksum parser (component J).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("checksum mismatch: expected {expected:04x}, computed {computed:04x}")]
    ChecksumMismatch { expected: u16, computed: u16 },
    #[error("malformed layout string at byte {offset}")]
    Malformed { offset: usize },
    #[error("trailing input after a complete layout: {0:?}")]
    TrailingInput(String),
}
