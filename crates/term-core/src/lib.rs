//! Host-agnostic terminal data plane.
//!
//! This crate owns the paged cell store, the VT/ANSI byte parser, and the
//! DCS/APC/OSC sub-protocol handlers (including tmux's control-mode
//! notification grammar). It has no threads and performs no I/O: a
//! [`terminal::Terminal`] is driven entirely by feeding it parser
//! [`parser::Action`]s and reading back its [`screen::Screen`]s.

#![forbid(unsafe_code)]

pub mod apc;
pub mod cell;
pub mod dcs;
pub mod error;
pub mod osc;
pub mod page;
pub mod page_list;
pub mod parser;
pub mod screen;
pub mod selection;
pub mod sgr;
pub mod terminal;
pub mod tmux_notify;

pub use cell::{Cell, CellContent, Color, HyperlinkId, Style, StyleFlags, StyleId, WideMarker};
pub use error::{LayoutError, PageError};
pub use page::{Page, PageId};
pub use page_list::{PageList, Pin, PinLookup, TrackedPinId};
pub use parser::{Action, Parser};
pub use screen::{Charset, CursorState, Screen, ScrollRegion};
pub use selection::{BufferPos, Highlight, Selection};
pub use terminal::{Modes, ScreenKind, Terminal, TerminalEvent};
