//! Host integration for `term-core`: input encoders, text search, render
//! snapshots, and the tmux control-mode viewer. Everything here may touch
//! threads and time; `term-core` itself never does.

pub mod error;
pub mod key_encoder;
pub mod paste;
pub mod render_state;
pub mod search;
pub mod tmux;

pub use error::PasteError;
pub use key_encoder::{KeyCode, KeyEncoder, KeyEvent, KeyEventKind, KittyFlags, Modifiers};
pub use render_state::{DirtyVerdict, RenderState};
pub use search::{ActiveSearch, PageListSearch, PageMatch, SearchMatch, SearchState, SearchThread, SlidingWindow, ViewportSearch};
pub use tmux::{Layout, PaneId, PaneState, TmuxViewer, ViewerAction, ViewerState};
