//! Tmux control-mode integration: the layout/checksum grammar (component J)
//! and the higher-level viewer state machine built on top of
//! `term_core::tmux_notify` (component I).

pub mod layout;
pub mod viewer;

pub use layout::{checksum, checksum_hex, parse, parse_with_checksum, Dims, Layout};
pub use viewer::{PaneId, PaneModes, PaneState, TmuxViewer, ViewerAction, ViewerState, WindowId};
