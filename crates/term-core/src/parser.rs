//! Byte-level VT/ANSi parser: a 12-state machine (ground, escape and its
//! intermediate state, CSI entry/param/intermediate/ignore, DCS
//! entry/param/intermediate/passthrough/ignore, OSC string, and
//! SOS/PM/APC string) that turns a raw byte stream into tagged [`Action`]s.
//!
//! Grounded on `frankenterm-core::parser`'s `Parser`/`Action`/`feed`/
//! `advance` shape, which that module's own doc comment calls a skeleton
//! covering only Ground/Escape/CSI/OSC; this expands it to the full state
//! table plus DCS and APC/PM/SOS handling, UTF-8 decode-with-resync, and
//! parameter/intermediate overflow into the dedicated Ignore states so a
//! pathological stream can never grow a `Vec` without bound.

use std::mem;

const MAX_PARAMS: usize = 32;
const MAX_INTERMEDIATES: usize = 4;

/// One parsed unit of terminal input. `Execute` carries any C0 control byte
/// that does not have a dedicated variant of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Print(char),
    Execute(u8),
    CsiDispatch {
        params: Vec<i64>,
        private_marker: Option<u8>,
        intermediates: Vec<u8>,
        final_byte: u8,
    },
    EscDispatch {
        intermediates: Vec<u8>,
        final_byte: u8,
    },
    DcsHook {
        params: Vec<i64>,
        private_marker: Option<u8>,
        intermediates: Vec<u8>,
        final_byte: u8,
    },
    DcsPut(u8),
    DcsUnhook,
    OscDispatch(Vec<Vec<u8>>),
    ApcStart,
    ApcPut(u8),
    ApcEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    OscString,
    ApcString,
    SosPmIgnore,
    /// Just emitted a string-terminator-triggering action on seeing `ESC`;
    /// waiting for the following byte to decide whether it was really `ST`
    /// (`ESC \\`) or an unrelated new escape sequence starting right after
    /// an unterminated string.
    StEsc,
}

/// Decodes a byte stream as UTF-8, resynchronizing with `U+FFFD` on any
/// malformed sequence rather than stalling — matches xterm/Ghostty's
/// "never block on bad input" posture for the data plane.
#[derive(Default)]
struct Utf8Decoder {
    need: usize,
    seen: usize,
    value: u32,
}

enum Utf8Step {
    Pending,
    Char(char),
    /// The byte itself was invalid (bad lead byte, overlong, surrogate,
    /// out-of-range) and has been consumed/dropped.
    Invalid,
    /// A mid-sequence continuation byte was expected but this byte is not
    /// one; it was *not* consumed and must be re-fed as the start of a new
    /// sequence.
    InvalidRetry,
}

impl Utf8Decoder {
    fn feed(&mut self, byte: u8) -> Utf8Step {
        if self.need == 0 {
            match byte {
                0x00..=0x7f => return Utf8Step::Char(byte as char),
                0xc2..=0xdf => {
                    self.need = 1;
                    self.value = (byte & 0x1f) as u32;
                }
                0xe0..=0xef => {
                    self.need = 2;
                    self.value = (byte & 0x0f) as u32;
                }
                0xf0..=0xf4 => {
                    self.need = 3;
                    self.value = (byte & 0x07) as u32;
                }
                _ => return Utf8Step::Invalid,
            }
            self.seen = 0;
            return Utf8Step::Pending;
        }
        if byte & 0xc0 != 0x80 {
            self.reset();
            return Utf8Step::InvalidRetry;
        }
        self.value = (self.value << 6) | (byte & 0x3f) as u32;
        self.seen += 1;
        if self.seen < self.need {
            return Utf8Step::Pending;
        }
        let value = mem::take(&mut self.value);
        let need = self.need;
        self.reset();
        if value < self.min_for(need) || value > 0x10ffff || (0xd800..=0xdfff).contains(&value) {
            return Utf8Step::Invalid;
        }
        match char::from_u32(value) {
            Some(c) => Utf8Step::Char(c),
            None => Utf8Step::Invalid,
        }
    }

    fn min_for(&self, need: usize) -> u32 {
        match need {
            1 => 0x80,
            2 => 0x800,
            3 => 0x10000,
            _ => 0,
        }
    }

    fn reset(&mut self) {
        self.need = 0;
        self.seen = 0;
        self.value = 0;
    }
}

pub struct Parser {
    state: State,
    intermediates: Vec<u8>,
    params: Vec<i64>,
    current_param: Option<i64>,
    private_marker: Option<u8>,
    string_buf: Vec<u8>,
    osc_max_bytes: usize,
    dcs_max_bytes: usize,
    utf8: Utf8Decoder,
    actions: Vec<Action>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(1024 * 1024, 1024 * 1024)
    }
}

impl Parser {
    pub fn new(osc_max_bytes: usize, dcs_max_bytes: usize) -> Self {
        Self {
            state: State::Ground,
            intermediates: Vec::new(),
            params: Vec::new(),
            current_param: None,
            private_marker: None,
            string_buf: Vec::new(),
            osc_max_bytes,
            dcs_max_bytes,
            utf8: Utf8Decoder::default(),
            actions: Vec::new(),
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        for &b in bytes {
            self.advance(b);
        }
        self.take_buf()
    }

    pub fn take_buf(&mut self) -> Vec<Action> {
        mem::take(&mut self.actions)
    }

    fn emit(&mut self, action: Action) {
        self.actions.push(action);
    }

    fn clear_params(&mut self) {
        self.params.clear();
        self.current_param = None;
        self.private_marker = None;
        self.intermediates.clear();
    }

    fn finish_param(&mut self) {
        if self.params.len() < MAX_PARAMS {
            self.params.push(self.current_param.unwrap_or(0));
        }
        self.current_param = None;
    }

    /// Feed a single byte. UTF-8 continuation bytes and printable 7-bit
    /// bytes only reach [`Action::Print`] while in `Ground`; everywhere
    /// else raw bytes drive the control-sequence state machine directly
    /// (control sequences are always 7-bit-clean per ECMA-48).
    pub fn advance(&mut self, byte: u8) {
        // CAN/SUB abort any sequence in progress and return to ground.
        if byte == 0x18 || byte == 0x1a {
            self.utf8.reset();
            self.state = State::Ground;
            self.emit(Action::Execute(byte));
            return;
        }
        match self.state {
            State::Ground => self.advance_ground(byte),
            State::Escape => self.advance_escape(byte),
            State::EscapeIntermediate => self.advance_escape_intermediate(byte),
            State::CsiEntry => self.advance_csi_entry(byte),
            State::CsiParam => self.advance_csi_param(byte),
            State::CsiIntermediate => self.advance_csi_intermediate(byte),
            State::CsiIgnore => self.advance_csi_ignore(byte),
            State::DcsEntry => self.advance_dcs_entry(byte),
            State::DcsParam => self.advance_dcs_param(byte),
            State::DcsIntermediate => self.advance_dcs_intermediate(byte),
            State::DcsPassthrough => self.advance_dcs_passthrough(byte),
            State::DcsIgnore => self.advance_dcs_ignore(byte),
            State::OscString => self.advance_osc_string(byte),
            State::ApcString => self.advance_apc_string(byte),
            State::SosPmIgnore => self.advance_sos_pm_ignore(byte),
            State::StEsc => self.advance_st_esc(byte),
        }
    }

    /// Resolve whether a just-seen `ESC` after a dispatched string action
    /// really was `ST` (`ESC \\`) or the start of an unrelated sequence.
    fn advance_st_esc(&mut self, byte: u8) {
        if byte == b'\\' {
            self.state = State::Ground;
        } else {
            self.state = State::Escape;
            self.advance_escape(byte);
        }
    }

    fn advance_ground(&mut self, byte: u8) {
        match byte {
            0x1b => {
                self.clear_params();
                self.state = State::Escape;
            }
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => {
                self.utf8.reset();
                self.emit(Action::Execute(byte));
            }
            _ => match self.utf8.feed(byte) {
                Utf8Step::Char(c) => self.emit(Action::Print(c)),
                Utf8Step::Pending => {}
                Utf8Step::Invalid => {
                    self.emit(Action::Print('\u{fffd}'));
                }
                Utf8Step::InvalidRetry => {
                    self.emit(Action::Print('\u{fffd}'));
                    self.advance_ground(byte);
                }
            },
        }
    }

    fn advance_escape(&mut self, byte: u8) {
        match byte {
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.emit(Action::Execute(byte)),
            0x20..=0x2f => {
                self.intermediates.push(byte);
                self.state = State::EscapeIntermediate;
            }
            b'[' => {
                self.clear_params();
                self.state = State::CsiEntry;
            }
            b']' => {
                self.string_buf.clear();
                self.state = State::OscString;
            }
            b'P' => {
                self.clear_params();
                self.state = State::DcsEntry;
            }
            b'_' => {
                self.string_buf.clear();
                self.emit(Action::ApcStart);
                self.state = State::ApcString;
            }
            b'^' | b'X' => {
                self.state = State::SosPmIgnore;
            }
            0x30..=0x7e => {
                let final_byte = byte;
                let intermediates = mem::take(&mut self.intermediates);
                self.emit(Action::EscDispatch {
                    intermediates,
                    final_byte,
                });
                self.state = State::Ground;
            }
            _ => self.state = State::Ground,
        }
    }

    fn advance_escape_intermediate(&mut self, byte: u8) {
        match byte {
            0x20..=0x2f => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                }
            }
            0x30..=0x7e => {
                let final_byte = byte;
                let intermediates = mem::take(&mut self.intermediates);
                self.emit(Action::EscDispatch {
                    intermediates,
                    final_byte,
                });
                self.state = State::Ground;
            }
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.emit(Action::Execute(byte)),
            _ => self.state = State::Ground,
        }
    }

    fn advance_csi_entry(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => {
                self.current_param = Some((byte - b'0') as i64);
                self.state = State::CsiParam;
            }
            b';' => {
                self.finish_param();
                self.state = State::CsiParam;
            }
            b'<' | b'=' | b'>' | b'?' => {
                self.private_marker = Some(byte);
                self.state = State::CsiParam;
            }
            0x20..=0x2f => {
                self.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7e => self.dispatch_csi(byte),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.emit(Action::Execute(byte)),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_param(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => {
                let d = (byte - b'0') as i64;
                self.current_param = Some(self.current_param.unwrap_or(0) * 10 + d);
            }
            b';' => self.finish_param(),
            0x20..=0x2f => {
                self.finish_param();
                self.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7e => {
                self.finish_param();
                self.dispatch_csi(byte);
            }
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.emit(Action::Execute(byte)),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_intermediate(&mut self, byte: u8) {
        match byte {
            0x20..=0x2f => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                }
            }
            0x40..=0x7e => self.dispatch_csi(byte),
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.emit(Action::Execute(byte)),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_ignore(&mut self, byte: u8) {
        match byte {
            0x40..=0x7e => {
                self.clear_params();
                self.state = State::Ground;
            }
            0x00..=0x17 | 0x19 | 0x1c..=0x1f => self.emit(Action::Execute(byte)),
            _ => {}
        }
    }

    fn dispatch_csi(&mut self, final_byte: u8) {
        let params = mem::take(&mut self.params);
        let private_marker = self.private_marker.take();
        let intermediates = mem::take(&mut self.intermediates);
        self.emit(Action::CsiDispatch {
            params,
            private_marker,
            intermediates,
            final_byte,
        });
        self.state = State::Ground;
    }

    fn advance_dcs_entry(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => {
                self.current_param = Some((byte - b'0') as i64);
                self.state = State::DcsParam;
            }
            b';' => {
                self.finish_param();
                self.state = State::DcsParam;
            }
            b'<' | b'=' | b'>' | b'?' => {
                self.private_marker = Some(byte);
                self.state = State::DcsParam;
            }
            0x20..=0x2f => {
                self.intermediates.push(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7e => self.hook_dcs(byte),
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_param(&mut self, byte: u8) {
        match byte {
            b'0'..=b'9' => {
                let d = (byte - b'0') as i64;
                self.current_param = Some(self.current_param.unwrap_or(0) * 10 + d);
            }
            b';' => self.finish_param(),
            0x20..=0x2f => {
                self.finish_param();
                self.intermediates.push(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7e => {
                self.finish_param();
                self.hook_dcs(byte);
            }
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_intermediate(&mut self, byte: u8) {
        match byte {
            0x20..=0x2f => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                }
            }
            0x40..=0x7e => self.hook_dcs(byte),
            _ => self.state = State::DcsIgnore,
        }
    }

    fn hook_dcs(&mut self, final_byte: u8) {
        let params = mem::take(&mut self.params);
        let private_marker = self.private_marker.take();
        let intermediates = mem::take(&mut self.intermediates);
        self.emit(Action::DcsHook {
            params,
            private_marker,
            intermediates,
            final_byte,
        });
        self.string_buf.clear();
        self.state = State::DcsPassthrough;
    }

    fn advance_dcs_passthrough(&mut self, byte: u8) {
        if byte == 0x1b {
            self.emit(Action::DcsUnhook);
            self.state = State::StEsc;
            return;
        }
        if self.string_buf.len() >= self.dcs_max_bytes {
            tracing::warn!(cap = self.dcs_max_bytes, "DCS payload exceeded cap, dropping rest");
            self.state = State::DcsIgnore;
            return;
        }
        self.string_buf.push(byte);
        self.emit(Action::DcsPut(byte));
    }

    fn advance_dcs_ignore(&mut self, byte: u8) {
        if byte == 0x1b {
            self.emit(Action::DcsUnhook);
            self.state = State::StEsc;
        }
    }

    fn advance_osc_string(&mut self, byte: u8) {
        match byte {
            0x07 => {
                self.dispatch_osc();
            }
            0x1b => {
                // xterm also terminates OSC with ST (`ESC \`); dispatch now
                // and let `StEsc` decide if the next byte really is `\`.
                self.dispatch_osc();
                self.state = State::StEsc;
                return;
            }
            _ => {
                if self.string_buf.len() < self.osc_max_bytes {
                    self.string_buf.push(byte);
                } else {
                    tracing::warn!(cap = self.osc_max_bytes, "OSC payload exceeded cap, dropping rest");
                }
            }
        }
    }

    fn dispatch_osc(&mut self) {
        let buf = mem::take(&mut self.string_buf);
        let params = buf
            .split(|&b| b == b';')
            .map(|s| s.to_vec())
            .collect::<Vec<_>>();
        self.emit(Action::OscDispatch(params));
        self.state = State::Ground;
    }

    fn advance_apc_string(&mut self, byte: u8) {
        if byte == 0x1b {
            self.emit(Action::ApcEnd);
            self.state = State::StEsc;
            return;
        }
        if self.string_buf.len() >= self.osc_max_bytes {
            return;
        }
        self.string_buf.push(byte);
        self.emit(Action::ApcPut(byte));
    }

    fn advance_sos_pm_ignore(&mut self, byte: u8) {
        if byte == 0x1b {
            self.state = State::Escape;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_prints() {
        let mut p = Parser::default();
        let actions = p.feed(b"hi");
        assert_eq!(actions, vec![Action::Print('h'), Action::Print('i')]);
    }

    #[test]
    fn c0_controls_execute() {
        let mut p = Parser::default();
        let actions = p.feed(b"\n\r\t\x08\x07");
        assert_eq!(
            actions,
            vec![
                Action::Execute(b'\n'),
                Action::Execute(b'\r'),
                Action::Execute(b'\t'),
                Action::Execute(0x08),
                Action::Execute(0x07),
            ]
        );
    }

    #[test]
    fn csi_sgr_dispatches_with_params() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1b[1;31m");
        assert_eq!(
            actions,
            vec![Action::CsiDispatch {
                params: vec![1, 31],
                private_marker: None,
                intermediates: vec![],
                final_byte: b'm',
            }]
        );
    }

    #[test]
    fn csi_private_marker_preserved() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1b[?25h");
        assert_eq!(
            actions,
            vec![Action::CsiDispatch {
                params: vec![25],
                private_marker: Some(b'?'),
                intermediates: vec![],
                final_byte: b'h',
            }]
        );
    }

    #[test]
    fn osc_splits_on_semicolon() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1b]0;title text\x07");
        assert_eq!(
            actions,
            vec![Action::OscDispatch(vec![b"0".to_vec(), b"title text".to_vec()])]
        );
    }

    #[test]
    fn osc_terminated_by_st() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1b]4;1;#ff0000\x1b\\");
        assert_eq!(
            actions,
            vec![Action::OscDispatch(vec![
                b"4".to_vec(),
                b"1".to_vec(),
                b"#ff0000".to_vec()
            ])]
        );
    }

    #[test]
    fn dcs_hook_put_unhook_sequence() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1bP1$r\x1b\\");
        assert_eq!(
            actions,
            vec![
                Action::DcsHook {
                    params: vec![1],
                    private_marker: None,
                    intermediates: vec![b'$'],
                    final_byte: b'r',
                },
                Action::DcsUnhook,
            ]
        );
    }

    #[test]
    fn utf8_multibyte_decodes_to_one_print() {
        let mut p = Parser::default();
        let actions = p.feed("中".as_bytes());
        assert_eq!(actions, vec![Action::Print('中')]);
    }

    #[test]
    fn invalid_utf8_continuation_resyncs_with_replacement() {
        let mut p = Parser::default();
        // 0xe0 starts a 3-byte sequence; 0x41 ('A') is not a continuation
        // byte, so it must resync and be reprocessed as plain ASCII.
        let actions = p.feed(&[0xe0, b'A']);
        assert_eq!(actions, vec![Action::Print('\u{fffd}'), Action::Print('A')]);
    }

    #[test]
    fn can_aborts_escape_sequence() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1b[1\x18m");
        assert_eq!(actions, vec![Action::Execute(0x18), Action::Print('m')]);
    }

    #[test]
    fn csi_param_overflow_caps_without_panic() {
        let mut p = Parser::default();
        let mut bytes = vec![0x1b, b'['];
        for _ in 0..100 {
            bytes.extend_from_slice(b"9;");
        }
        bytes.push(b'm');
        let actions = p.feed(&bytes);
        match &actions[..] {
            [Action::CsiDispatch { params, final_byte, .. }] => {
                assert!(params.len() <= MAX_PARAMS);
                assert_eq!(*final_byte, b'm');
            }
            other => panic!("expected a single capped CsiDispatch, got {other:?}"),
        }
    }

    #[test]
    fn apc_start_put_end_sequence() {
        let mut p = Parser::default();
        let actions = p.feed(b"\x1b_Gfoo\x1b\\");
        assert_eq!(actions[0], Action::ApcStart);
        assert_eq!(actions.last(), Some(&Action::ApcEnd));
        // The `\` of `ST` must be consumed as the terminator, not reparsed
        // as a stray escape-dispatch.
        assert!(!actions.iter().any(|a| matches!(a, Action::EscDispatch { .. })));
    }
}
