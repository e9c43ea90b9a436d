//! The top-level terminal: primary, alternate, and scrollback-detached
//! [`Screen`]s plus the DEC private mode flags that decide how input bytes
//! are interpreted and how the screen responds to them.
//!
//! [`Terminal::execute`] is the other half of this module: the dispatcher
//! that turns a [`Parser`]'s [`Action`]s into the `Screen`/mode mutations
//! above. The parser itself stays outside `Terminal` — it has no terminal
//! state of its own, so a host can freely reuse one `Parser` across a
//! reset (`RIS`) without losing mid-sequence position.

use std::mem;

use crate::apc::{self, KittyGraphicsCommand};
use crate::cell::CellContent;
use crate::dcs::{self, DcsAssembler, DcsRequest};
use crate::osc::{self, OscCommand};
use crate::parser::{Action, Parser};
use crate::screen::{Charset, Screen};
use crate::sgr;

/// The one-byte-at-a-time cap on a DCS/APC payload this terminal will
/// assemble before giving up on it — mirrors the parser's own OSC/DCS
/// byte caps (see [`crate::parser::Parser::default`]).
const MAX_SUBPROTOCOL_BYTES: usize = 1024 * 1024;

/// Something the host needs to react to beyond reading back the screen:
/// a title/clipboard/hyperlink OSC, a Kitty graphics command, a bell, a
/// tmux control-mode handoff, or raw bytes that must be written back to
/// the pty (DSR/DECRQSS/XTGETTCAP replies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    Osc(OscCommand),
    KittyGraphics(KittyGraphicsCommand),
    /// `DCS 1000 p` was hooked: tmux control mode has begun and every
    /// subsequent line is a notification, not VT — tmux never sends a
    /// matching unhook, so the host must switch parsing modes right here.
    TmuxControlModeRequested,
    Bell,
    /// Bytes the host must write back to the pty (cursor position report,
    /// DECRQSS reply, XTGETTCAP reply).
    HostReply(Vec<u8>),
}

bitflags::bitflags! {
    /// DEC private and ANSI modes that affect parsing/encoding rather than
    /// screen contents directly (cursor visibility, app-cursor-keys,
    /// bracketed paste, mouse tracking variants, etc).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modes: u32 {
        const CURSOR_VISIBLE        = 1 << 0;
        const APPLICATION_CURSOR    = 1 << 1;
        const APPLICATION_KEYPAD    = 1 << 2;
        const BRACKETED_PASTE       = 1 << 3;
        const MOUSE_X10             = 1 << 4;
        const MOUSE_NORMAL          = 1 << 5;
        const MOUSE_BUTTON_EVENT    = 1 << 6;
        const MOUSE_ANY_EVENT       = 1 << 7;
        const MOUSE_SGR             = 1 << 8;
        const FOCUS_EVENTS          = 1 << 9;
        const ORIGIN_MODE           = 1 << 10;
        const AUTOWRAP              = 1 << 11;
        const REVERSE_VIDEO         = 1 << 12;
        const ALT_SCREEN_SAVES_CURSOR = 1 << 13;
    }
}

/// Which of the terminal's screens is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Primary,
    Alternate,
    /// A detached view used to browse scrollback independently of
    /// whatever the PTY is currently writing to `primary`/`alternate`.
    ScrollbackDetached,
}

pub struct Terminal {
    primary: Screen,
    alternate: Screen,
    scrollback_detached: Screen,
    active: ScreenKind,
    /// Which screen to restore on `exit_scrollback_detached`, set by
    /// `enter_scrollback_detached`.
    return_to: Option<ScreenKind>,
    modes: Modes,
    kitty_keyboard_flags: u8,
    dcs: DcsAssembler,
    apc_buf: Vec<u8>,
    events: Vec<TerminalEvent>,
    title: String,
    icon_name: String,
}

impl Terminal {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            primary: Screen::new(cols, rows),
            alternate: Screen::new(cols, rows),
            scrollback_detached: Screen::new(cols, rows),
            active: ScreenKind::Primary,
            return_to: None,
            modes: Modes::CURSOR_VISIBLE | Modes::AUTOWRAP,
            kitty_keyboard_flags: 0,
            dcs: DcsAssembler::new(MAX_SUBPROTOCOL_BYTES),
            apc_buf: Vec::new(),
            events: Vec::new(),
            title: String::new(),
            icon_name: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon_name(&self) -> &str {
        &self.icon_name
    }

    /// Drain the events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<TerminalEvent> {
        mem::take(&mut self.events)
    }

    /// Feed raw bytes through `parser` and dispatch every resulting
    /// action. `parser` is passed in rather than owned so a host can keep
    /// one `Parser` alive across terminal resets.
    pub fn execute_bytes(&mut self, parser: &mut Parser, bytes: &[u8]) {
        for action in parser.feed(bytes) {
            self.execute(action);
        }
    }

    /// Dispatch one parsed action, mutating the active screen, the mode
    /// flags, or pushing a [`TerminalEvent`] as appropriate.
    pub fn execute(&mut self, action: Action) {
        match action {
            Action::Print(c) => self.print_char(c),
            Action::Execute(byte) => self.execute_c0(byte),
            Action::CsiDispatch {
                params,
                private_marker,
                intermediates,
                final_byte,
            } => self.execute_csi(&params, private_marker, &intermediates, final_byte),
            Action::EscDispatch { intermediates, final_byte } => self.execute_esc(&intermediates, final_byte),
            Action::DcsHook {
                params,
                private_marker,
                intermediates,
                final_byte,
            } => {
                let _ = private_marker;
                self.dcs.hook(&params, &intermediates, final_byte);
                if matches!(self.dcs.peek(), Some(DcsRequest::TmuxControlMode)) {
                    self.events.push(TerminalEvent::TmuxControlModeRequested);
                }
            }
            Action::DcsPut(byte) => self.dcs.put(byte),
            Action::DcsUnhook => {
                if let Some(request) = self.dcs.unhook() {
                    self.handle_dcs_request(request);
                }
            }
            Action::OscDispatch(params) => {
                if let Some(cmd) = osc::parse_osc(&params) {
                    self.handle_osc(cmd);
                }
            }
            Action::ApcStart => self.apc_buf.clear(),
            Action::ApcPut(byte) => {
                if self.apc_buf.len() < MAX_SUBPROTOCOL_BYTES {
                    self.apc_buf.push(byte);
                }
            }
            Action::ApcEnd => {
                let payload = mem::take(&mut self.apc_buf);
                if let Some(cmd) = apc::parse_kitty_graphics(&payload) {
                    self.events.push(TerminalEvent::KittyGraphics(cmd));
                }
            }
        }
    }

    fn print_char(&mut self, c: char) {
        use unicode_width::UnicodeWidthChar;
        match UnicodeWidthChar::width(c) {
            Some(0) => self.screen_mut().combine_with_previous(c),
            Some(w) => self.screen_mut().print(CellContent::Codepoint(c), w.clamp(1, 2) as u8),
            None => {}
        }
    }

    fn execute_c0(&mut self, byte: u8) {
        match byte {
            0x07 => self.events.push(TerminalEvent::Bell),
            0x08 => self.screen_mut().move_cursor_relative(0, -1),
            0x09 => self.tab_forward(),
            0x0a | 0x0b | 0x0c => self.screen_mut().line_feed(),
            0x0d => self.screen_mut().carriage_return(),
            0x0e => self.screen_mut().shift_active_charset(1),
            0x0f => self.screen_mut().shift_active_charset(0),
            _ => {}
        }
    }

    fn tab_forward(&mut self) {
        const TAB_WIDTH: usize = 8;
        let screen = self.screen_mut();
        let cursor = screen.cursor();
        let next = ((cursor.col / TAB_WIDTH) + 1) * TAB_WIDTH;
        let next = next.min(screen.cols().saturating_sub(1));
        screen.move_cursor_to(cursor.row, next);
    }

    /// `params.get(idx)`, treating both "absent" and the explicit `0`
    /// xterm uses as "default" interchangeably — the ECMA-48 convention
    /// for movement/count parameters (CUP/CUU/ICH/IL/SU/...).
    fn count_param(params: &[i64], idx: usize) -> i64 {
        params.get(idx).copied().filter(|&v| v > 0).unwrap_or(1)
    }

    /// `params.get(idx)` with `0` as a meaningful default, for parameters
    /// like ED/EL mode where `0` and "absent" are both valid and distinct
    /// from higher values.
    fn mode_param(params: &[i64], idx: usize) -> i64 {
        params.get(idx).copied().unwrap_or(0)
    }

    fn execute_csi(&mut self, params: &[i64], private_marker: Option<u8>, intermediates: &[u8], final_byte: u8) {
        if !intermediates.is_empty() {
            // DECSCUSR and friends (intermediate-qualified CSI forms)
            // aren't recognized; ignored rather than misinterpreted.
            return;
        }
        let n = |idx: usize| Self::count_param(params, idx);
        let raw = |idx: usize| Self::mode_param(params, idx);
        match (private_marker, final_byte) {
            (None, b'H') | (None, b'f') => {
                let row = (n(0) - 1).max(0) as usize;
                let col = (n(1) - 1).max(0) as usize;
                self.screen_mut().move_cursor_to(row, col);
            }
            (None, b'A') => self.screen_mut().move_cursor_relative(-(n(0) as i32), 0),
            (None, b'B') => self.screen_mut().move_cursor_relative(n(0) as i32, 0),
            (None, b'C') => self.screen_mut().move_cursor_relative(0, n(0) as i32),
            (None, b'D') => self.screen_mut().move_cursor_relative(0, -(n(0) as i32)),
            (None, b'G') => {
                let row = self.screen().cursor().row;
                let col = (n(0) - 1).max(0) as usize;
                self.screen_mut().move_cursor_to(row, col);
            }
            (None, b'd') => {
                let col = self.screen().cursor().col;
                let row = (n(0) - 1).max(0) as usize;
                self.screen_mut().move_cursor_to(row, col);
            }
            (None, b'J') => self.screen_mut().erase_in_display(raw(0) as u16),
            (None, b'K') => self.screen_mut().erase_in_line(raw(0) as u16),
            (None, b'L') => self.screen_mut().insert_lines(n(0) as usize),
            (None, b'M') => self.screen_mut().delete_lines(n(0) as usize),
            (None, b'@') => self.screen_mut().insert_chars(n(0) as usize),
            (None, b'P') => self.screen_mut().delete_chars(n(0) as usize),
            (None, b'S') => self.screen_mut().scroll_up(n(0) as usize),
            (None, b'T') => self.screen_mut().scroll_down(n(0) as usize),
            (None, b'r') => {
                if params.len() >= 2 {
                    let top = (n(0) - 1).max(0) as usize;
                    let bottom = (n(1) - 1).max(0) as usize;
                    self.screen_mut().set_scroll_region(top, bottom);
                } else {
                    let rows = self.screen().rows();
                    self.screen_mut().set_scroll_region(0, rows.saturating_sub(1));
                }
            }
            (None, b'm') => {
                let mut style = self.screen().cursor().style;
                sgr::apply_sgr(&mut style, params);
                self.screen_mut().set_style(style);
            }
            (None, b's') => self.screen_mut().save_cursor(),
            (None, b'u') => self.screen_mut().restore_cursor(),
            (None, b'n') => self.handle_dsr(raw(0)),
            (Some(b'?'), b'h') => self.set_private_modes(params, true),
            (Some(b'?'), b'l') => self.set_private_modes(params, false),
            (Some(b'>'), b'u') => {
                let flags = self.kitty_keyboard_flags | raw(0) as u8;
                self.set_kitty_keyboard_flags(flags);
            }
            (Some(b'='), b'u') => self.set_kitty_keyboard_flags(raw(0) as u8),
            (Some(b'<'), b'u') => self.set_kitty_keyboard_flags(0),
            _ => {}
        }
    }

    fn handle_dsr(&mut self, code: i64) {
        match code {
            5 => self.events.push(TerminalEvent::HostReply(b"\x1b[0n".to_vec())),
            6 => {
                let cursor = self.screen().cursor();
                let reply = format!("\x1b[{};{}R", cursor.row + 1, cursor.col + 1);
                self.events.push(TerminalEvent::HostReply(reply.into_bytes()));
            }
            _ => {}
        }
    }

    fn set_private_modes(&mut self, params: &[i64], enabled: bool) {
        for &code in params {
            match code {
                1 => self.set_mode(Modes::APPLICATION_CURSOR, enabled),
                6 => self.set_mode(Modes::ORIGIN_MODE, enabled),
                7 => self.set_mode(Modes::AUTOWRAP, enabled),
                9 => self.set_mode(Modes::MOUSE_X10, enabled),
                25 => self.set_mode(Modes::CURSOR_VISIBLE, enabled),
                1000 => self.set_mode(Modes::MOUSE_NORMAL, enabled),
                1002 => self.set_mode(Modes::MOUSE_BUTTON_EVENT, enabled),
                1003 => self.set_mode(Modes::MOUSE_ANY_EVENT, enabled),
                1004 => self.set_mode(Modes::FOCUS_EVENTS, enabled),
                1006 => self.set_mode(Modes::MOUSE_SGR, enabled),
                47 | 1047 => {
                    if enabled {
                        self.enter_alternate_screen();
                    } else {
                        self.exit_alternate_screen();
                    }
                }
                1049 => {
                    self.set_mode(Modes::ALT_SCREEN_SAVES_CURSOR, true);
                    if enabled {
                        self.enter_alternate_screen();
                    } else {
                        self.exit_alternate_screen();
                    }
                }
                2004 => self.set_mode(Modes::BRACKETED_PASTE, enabled),
                // Synchronized-output framing (2026) is a rendering-cadence
                // concern with no corresponding Screen state to flip.
                2026 => {}
                _ => {}
            }
        }
    }

    fn execute_esc(&mut self, intermediates: &[u8], final_byte: u8) {
        match intermediates {
            [] => match final_byte {
                b'D' => self.screen_mut().line_feed(),
                b'E' => {
                    self.screen_mut().carriage_return();
                    self.screen_mut().line_feed();
                }
                b'M' => self.reverse_index(),
                b'7' => self.screen_mut().save_cursor(),
                b'8' => self.screen_mut().restore_cursor(),
                b'c' => self.reset(),
                _ => {}
            },
            [marker @ (b'(' | b')' | b'*' | b'+')] => {
                let slot = match marker {
                    b'(' => 0,
                    b')' => 1,
                    b'*' => 2,
                    _ => 3,
                };
                let charset = if final_byte == b'0' { Charset::DecSpecialGraphics } else { Charset::Ascii };
                self.screen_mut().designate_charset(slot, charset);
            }
            _ => {}
        }
    }

    fn reverse_index(&mut self) {
        let screen = self.screen_mut();
        let region = screen.region();
        let cursor = screen.cursor();
        if cursor.row == region.top {
            screen.scroll_down(1);
        } else {
            screen.move_cursor_relative(-1, 0);
        }
    }

    /// `ESC c` (RIS): a hard reset, equivalent to reconnecting to a brand
    /// new terminal of the same size.
    fn reset(&mut self) {
        let cols = self.screen().cols();
        let rows = self.screen().rows();
        *self = Terminal::new(cols, rows);
    }

    fn handle_osc(&mut self, cmd: OscCommand) {
        match &cmd {
            OscCommand::SetTitleAndIcon(text) => {
                self.title = text.clone();
                self.icon_name = text.clone();
            }
            OscCommand::SetTitle(text) => self.title = text.clone(),
            OscCommand::SetIconName(text) => self.icon_name = text.clone(),
            OscCommand::Hyperlink { uri, .. } => self.screen_mut().set_hyperlink(uri.clone()),
            _ => {}
        }
        self.events.push(TerminalEvent::Osc(cmd));
    }

    fn handle_dcs_request(&mut self, request: DcsRequest) {
        match request {
            DcsRequest::RequestStatusString { query } => {
                let style = self.screen().cursor().style;
                let sgr_params = sgr::format_sgr_params(&style);
                let region = self.screen().region();
                let body = dcs::decrqss_reply(&query, &sgr_params, (region.top as u32 + 1, region.bottom as u32 + 1))
                    .unwrap_or_else(|| "0$r".to_string());
                self.events.push(TerminalEvent::HostReply(format!("\x1bP{body}\x1b\\").into_bytes()));
            }
            DcsRequest::RequestTermcap { names } => {
                let entries: Vec<String> = names.iter().map(|name| dcs::xtgettcap_entry(name)).collect();
                let body = format!("1+r{}", entries.join(";"));
                self.events.push(TerminalEvent::HostReply(format!("\x1bP{body}\x1b\\").into_bytes()));
            }
            DcsRequest::TmuxControlMode => self.events.push(TerminalEvent::TmuxControlModeRequested),
            DcsRequest::Unsupported => {}
        }
    }

    pub fn screen(&self) -> &Screen {
        match self.active {
            ScreenKind::Primary => &self.primary,
            ScreenKind::Alternate => &self.alternate,
            ScreenKind::ScrollbackDetached => &self.scrollback_detached,
        }
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        match self.active {
            ScreenKind::Primary => &mut self.primary,
            ScreenKind::Alternate => &mut self.alternate,
            ScreenKind::ScrollbackDetached => &mut self.scrollback_detached,
        }
    }

    pub fn primary(&self) -> &Screen {
        &self.primary
    }

    pub fn alternate(&self) -> &Screen {
        &self.alternate
    }

    pub fn scrollback_detached(&self) -> &Screen {
        &self.scrollback_detached
    }

    pub fn active_kind(&self) -> ScreenKind {
        self.active
    }

    pub fn modes(&self) -> Modes {
        self.modes
    }

    pub fn set_mode(&mut self, mode: Modes, enabled: bool) {
        self.modes.set(mode, enabled);
    }

    pub fn kitty_keyboard_flags(&self) -> u8 {
        self.kitty_keyboard_flags
    }

    pub fn set_kitty_keyboard_flags(&mut self, flags: u8) {
        self.kitty_keyboard_flags = flags;
    }

    /// Enter the alternate screen (`?1049h` and friends). Per xterm, the
    /// alternate screen starts blank and, depending on
    /// `ALT_SCREEN_SAVES_CURSOR`, the primary screen's cursor is preserved
    /// so it is restored unchanged on exit.
    pub fn enter_alternate_screen(&mut self) {
        if self.active == ScreenKind::Alternate {
            return;
        }
        if self.modes.contains(Modes::ALT_SCREEN_SAVES_CURSOR) {
            self.primary.save_cursor();
        }
        self.alternate = Screen::new(self.primary.cols(), self.primary.rows());
        self.active = ScreenKind::Alternate;
    }

    pub fn exit_alternate_screen(&mut self) {
        if self.active == ScreenKind::Primary {
            return;
        }
        self.active = ScreenKind::Primary;
        if self.modes.contains(Modes::ALT_SCREEN_SAVES_CURSOR) {
            self.primary.restore_cursor();
        }
    }

    /// Switch the write target to the scrollback-browsing screen, same
    /// swap shape as [`Self::enter_alternate_screen`]. A host that wants
    /// to keep forwarding PTY output to `primary`/`alternate` while the
    /// user browses history does so by reading/searching `primary()` or
    /// `alternate()` directly instead of `screen()` during this period —
    /// `Terminal` itself only ever dispatches `execute`/`execute_bytes`
    /// output to whichever screen is active. Remembers which screen to
    /// return to so a matching `exit` is a no-op if called twice.
    pub fn enter_scrollback_detached(&mut self) {
        if self.active == ScreenKind::ScrollbackDetached {
            return;
        }
        self.return_to = Some(self.active);
        self.active = ScreenKind::ScrollbackDetached;
    }

    pub fn exit_scrollback_detached(&mut self) {
        if self.active != ScreenKind::ScrollbackDetached {
            return;
        }
        self.active = self.return_to.take().unwrap_or(ScreenKind::Primary);
    }

    pub fn resize(&mut self, cols: usize, rows: usize) {
        // A hard reset-to-size; mid-stream reflow of existing content is
        // intentionally not attempted here (out of scope per the data
        // model's Non-goals around reflow-on-resize).
        let primary_cursor = self.primary.cursor();
        self.primary = Screen::new(cols, rows);
        self.primary.move_cursor_to(primary_cursor.row, primary_cursor.col);
        self.alternate = Screen::new(cols, rows);
        self.scrollback_detached = Screen::new(cols, rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_primary_screen() {
        let term = Terminal::new(80, 24);
        assert_eq!(term.active_kind(), ScreenKind::Primary);
    }

    #[test]
    fn alternate_screen_round_trips_cursor() {
        let mut term = Terminal::new(80, 24);
        term.set_mode(Modes::ALT_SCREEN_SAVES_CURSOR, true);
        term.screen_mut().move_cursor_to(5, 5);
        term.enter_alternate_screen();
        assert_eq!(term.active_kind(), ScreenKind::Alternate);
        term.screen_mut().move_cursor_to(0, 0);
        term.exit_alternate_screen();
        assert_eq!(term.active_kind(), ScreenKind::Primary);
        assert_eq!(term.screen().cursor().row, 5);
        assert_eq!(term.screen().cursor().col, 5);
    }

    #[test]
    fn scrollback_detached_returns_to_previous_screen() {
        let mut term = Terminal::new(80, 24);
        term.enter_alternate_screen();
        term.enter_scrollback_detached();
        assert_eq!(term.active_kind(), ScreenKind::ScrollbackDetached);
        term.exit_scrollback_detached();
        assert_eq!(term.active_kind(), ScreenKind::Alternate);
    }

    #[test]
    fn scrollback_detached_is_a_noop_when_already_detached() {
        let mut term = Terminal::new(80, 24);
        term.enter_scrollback_detached();
        term.enter_scrollback_detached();
        assert_eq!(term.active_kind(), ScreenKind::ScrollbackDetached);
        term.exit_scrollback_detached();
        assert_eq!(term.active_kind(), ScreenKind::Primary);
        term.exit_scrollback_detached();
        assert_eq!(term.active_kind(), ScreenKind::Primary);
    }

    #[test]
    fn modes_default_cursor_visible_and_autowrap() {
        let term = Terminal::new(80, 24);
        assert!(term.modes().contains(Modes::CURSOR_VISIBLE));
        assert!(term.modes().contains(Modes::AUTOWRAP));
        assert!(!term.modes().contains(Modes::BRACKETED_PASTE));
    }

    #[test]
    fn cursor_wraps_across_rows_on_overflow() {
        let mut term = Terminal::new(10, 3);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"0123456789X");
        assert_eq!(term.screen().cursor().row, 1);
        assert_eq!(term.screen().cursor().col, 1);
        assert_eq!(term.screen().cell(0, 9).primary_char(), '9');
        assert_eq!(term.screen().cell(1, 0).primary_char(), 'X');
    }

    #[test]
    fn wide_char_at_last_column_wraps_with_spacer_via_bytes() {
        let mut term = Terminal::new(10, 3);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"ABABABABA"); // 9 narrow chars, cursor lands on col 9
        term.execute_bytes(&mut parser, "\u{4e2d}".as_bytes());
        assert_eq!(term.screen().cursor().col, 2);
        assert!(term.screen().cell(0, 9).is_spacer_tail());
        assert!(term.screen().cell(1, 0).is_wide());
        assert!(term.screen().cell(1, 1).is_spacer_tail());
    }

    #[test]
    fn sgr_bold_then_reset() {
        let mut term = Terminal::new(10, 3);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b[1mA\x1b[0mB");
        assert!(term.screen().cell(0, 0).style != crate::cell::StyleId::DEFAULT);
        assert_eq!(term.screen().cell(0, 1).style, crate::cell::StyleId::DEFAULT);
    }

    #[test]
    fn cup_moves_cursor_one_based() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b[3;4H");
        assert_eq!(term.screen().cursor().row, 2);
        assert_eq!(term.screen().cursor().col, 3);
    }

    #[test]
    fn decset_1049_enters_and_exits_alternate_screen() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b[1049h");
        assert_eq!(term.active_kind(), ScreenKind::Alternate);
        term.execute_bytes(&mut parser, b"\x1b[1049l");
        assert_eq!(term.active_kind(), ScreenKind::Primary);
    }

    #[test]
    fn osc_set_title_updates_state_and_emits_event() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b]2;my title\x07");
        assert_eq!(term.title(), "my title");
        let events = term.take_events();
        assert_eq!(events, vec![TerminalEvent::Osc(OscCommand::SetTitle("my title".into()))]);
    }

    #[test]
    fn osc8_hyperlink_tags_subsequent_cells() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b]8;;https://example.com\x07L\x1b]8;;\x07");
        assert!(term.screen().cell(0, 0).has_hyperlink());
    }

    #[test]
    fn dsr_cursor_position_report_replies_one_based() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b[2;3H\x1b[6n");
        let events = term.take_events();
        assert_eq!(events, vec![TerminalEvent::HostReply(b"\x1b[2;3R".to_vec())]);
    }

    #[test]
    fn tmux_control_mode_hook_is_detected_immediately() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1bP1000p");
        let events = term.take_events();
        assert_eq!(events, vec![TerminalEvent::TmuxControlModeRequested]);
    }

    #[test]
    fn ris_resets_title_and_cursor() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, b"\x1b]2;my title\x07\x1b[3;3H\x1bc");
        assert_eq!(term.title(), "");
        assert_eq!(term.screen().cursor().row, 0);
        assert_eq!(term.screen().cursor().col, 0);
    }

    #[test]
    fn combining_mark_through_byte_stream_does_not_consume_a_column() {
        let mut term = Terminal::new(10, 5);
        let mut parser = Parser::default();
        term.execute_bytes(&mut parser, "e\u{0301}".as_bytes());
        assert_eq!(term.screen().cursor().col, 1);
    }
}
