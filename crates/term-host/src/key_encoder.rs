//! Encodes host key events into the bytes a VT stream expects, following
//! whichever of three protocols is currently active: the Kitty keyboard
//! protocol (CSI u), legacy xterm `modifyOtherKeys` level 2, or plain
//! legacy PC-style sequences.
//!
//! `KeyEvent`/`KeyCode`/`Modifiers` are grounded on
//! `ftui-core::event::{KeyEvent, KeyCode, Modifiers}`'s shape, extended
//! with the `KeyEventKind::Repeat` variant the Kitty protocol's
//! report-events flag needs to distinguish from a fresh press.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const SHIFT     = 1 << 0;
        const ALT       = 1 << 1;
        const CTRL      = 1 << 2;
        const SUPER     = 1 << 3;
        const HYPER     = 1 << 4;
        const META      = 1 << 5;
        const CAPS_LOCK = 1 << 6;
        const NUM_LOCK  = 1 << 7;
    }
}

impl Modifiers {
    /// The Kitty/CSI-u modifier parameter: a 1-based bitmask encoding of
    /// shift/alt/ctrl/super/hyper/meta/caps/num, sent as `1 + bits`.
    fn kitty_param(self) -> u32 {
        let mut bits = 0u32;
        if self.contains(Modifiers::SHIFT) {
            bits |= 1;
        }
        if self.contains(Modifiers::ALT) {
            bits |= 2;
        }
        if self.contains(Modifiers::CTRL) {
            bits |= 4;
        }
        if self.contains(Modifiers::SUPER) {
            bits |= 8;
        }
        if self.contains(Modifiers::HYPER) {
            bits |= 16;
        }
        if self.contains(Modifiers::META) {
            bits |= 32;
        }
        if self.contains(Modifiers::CAPS_LOCK) {
            bits |= 64;
        }
        if self.contains(Modifiers::NUM_LOCK) {
            bits |= 128;
        }
        1 + bits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    Press,
    Repeat,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Insert,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    F(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    pub fn press(code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            code,
            modifiers,
            kind: KeyEventKind::Press,
        }
    }
}

bitflags! {
    /// Kitty keyboard protocol progressive-enhancement flags (`CSI > Pu u`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KittyFlags: u8 {
        const DISAMBIGUATE        = 1 << 0;
        const REPORT_EVENTS       = 1 << 1;
        const REPORT_ALTERNATES   = 1 << 2;
        const REPORT_ALL_AS_ESC   = 1 << 3;
        const REPORT_ASSOCIATED   = 1 << 4;
    }
}

/// Kitty's "unicode key code" for keys without a printable representation.
/// Enter/Tab/Backspace/Escape deliberately reuse their legacy C0 codepoints
/// for backward compatibility; everything else uses a private-use-area
/// value, consistent within this crate even where it doesn't chase every
/// digit of the published kitty table.
fn kitty_key_code(code: KeyCode) -> u32 {
    match code {
        KeyCode::Char(c) => c as u32,
        KeyCode::Enter => 13,
        KeyCode::Tab => 9,
        KeyCode::Backspace => 127,
        KeyCode::Escape => 27,
        KeyCode::Insert => 57348,
        KeyCode::Delete => 57349,
        KeyCode::Left => 57350,
        KeyCode::Right => 57351,
        KeyCode::Up => 57352,
        KeyCode::Down => 57353,
        KeyCode::PageUp => 57354,
        KeyCode::PageDown => 57355,
        KeyCode::Home => 57356,
        KeyCode::End => 57357,
        KeyCode::F(n) => 57363 + n as u32,
    }
}

/// Legacy PC-style final byte for cursor/editing keys in `CSI [1;mod]X`
/// form (`X` being the final byte below); `None` for keys whose legacy form
/// is a `~`-terminated numeric sequence instead (`CSI n [;mod] ~`).
fn legacy_letter_final(code: KeyCode) -> Option<u8> {
    match code {
        KeyCode::Up => Some(b'A'),
        KeyCode::Down => Some(b'B'),
        KeyCode::Right => Some(b'C'),
        KeyCode::Left => Some(b'D'),
        KeyCode::Home => Some(b'H'),
        KeyCode::End => Some(b'F'),
        _ => None,
    }
}

fn legacy_tilde_code(code: KeyCode) -> Option<u32> {
    match code {
        KeyCode::Insert => Some(2),
        KeyCode::Delete => Some(3),
        KeyCode::PageUp => Some(5),
        KeyCode::PageDown => Some(6),
        KeyCode::F(n) if n <= 5 => Some(10 + n as u32),
        KeyCode::F(n) if (6..=10).contains(&n) => Some(11 + n as u32),
        KeyCode::F(n) if (11..=14).contains(&n) => Some(12 + n as u32),
        _ => None,
    }
}

pub struct KeyEncoder {
    pub kitty_flags: KittyFlags,
    /// xterm `modifyOtherKeys` resource value: 0 (off), 1, or 2.
    pub modify_other_keys: u8,
    pub application_cursor_keys: bool,
}

impl Default for KeyEncoder {
    fn default() -> Self {
        Self {
            kitty_flags: KittyFlags::empty(),
            modify_other_keys: 0,
            application_cursor_keys: false,
        }
    }
}

impl KeyEncoder {
    pub fn encode(&self, event: &KeyEvent) -> Vec<u8> {
        if !self.kitty_flags.is_empty() {
            return self.encode_kitty(event);
        }
        if self.modify_other_keys >= 2 {
            if let Some(bytes) = self.encode_modify_other_keys(event) {
                return bytes;
            }
        }
        self.encode_legacy(event)
    }

    fn encode_kitty(&self, event: &KeyEvent) -> Vec<u8> {
        if event.kind == KeyEventKind::Release && !self.kitty_flags.contains(KittyFlags::REPORT_EVENTS) {
            return Vec::new();
        }
        let code = kitty_key_code(event.code);
        let mod_param = event.modifiers.kitty_param();
        let event_suffix = if self.kitty_flags.contains(KittyFlags::REPORT_EVENTS) {
            match event.kind {
                KeyEventKind::Press => String::new(),
                KeyEventKind::Repeat => ":2".to_string(),
                KeyEventKind::Release => ":3".to_string(),
            }
        } else {
            String::new()
        };
        if mod_param == 1 && event_suffix.is_empty() && !self.kitty_flags.contains(KittyFlags::REPORT_ALL_AS_ESC) {
            if let KeyCode::Char(c) = event.code {
                if !event.modifiers.contains(Modifiers::CTRL) {
                    let mut buf = [0u8; 4];
                    return c.encode_utf8(&mut buf).as_bytes().to_vec();
                }
            }
        }
        format!("\x1b[{code}{event_suffix};{mod_param}u").into_bytes()
    }

    /// xterm `modifyOtherKeys` level 2: `CSI 27 ; mod ; codepoint ~` for
    /// printable characters combined with a modifier other than bare shift.
    fn encode_modify_other_keys(&self, event: &KeyEvent) -> Option<Vec<u8>> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let KeyCode::Char(c) = event.code else {
            return None;
        };
        let relevant = event.modifiers
            - Modifiers::CAPS_LOCK
            - Modifiers::NUM_LOCK;
        if relevant.is_empty() || relevant == Modifiers::SHIFT {
            return None;
        }
        let mod_param = event.modifiers.kitty_param();
        Some(format!("\x1b[27;{mod_param};{}~", c as u32).into_bytes())
    }

    fn encode_legacy(&self, event: &KeyEvent) -> Vec<u8> {
        if event.kind == KeyEventKind::Release {
            return Vec::new();
        }
        let has_mod = !(event.modifiers - Modifiers::CAPS_LOCK - Modifiers::NUM_LOCK).is_empty();
        if let Some(final_byte) = legacy_letter_final(event.code) {
            return if has_mod {
                format!("\x1b[1;{}{}", event.modifiers.kitty_param(), final_byte as char).into_bytes()
            } else if self.application_cursor_keys {
                vec![0x1b, b'O', final_byte]
            } else {
                vec![0x1b, b'[', final_byte]
            };
        }
        if let Some(code) = legacy_tilde_code(event.code) {
            return if has_mod {
                format!("\x1b[{code};{}~", event.modifiers.kitty_param()).into_bytes()
            } else {
                format!("\x1b[{code}~").into_bytes()
            };
        }
        match event.code {
            KeyCode::Enter => vec![b'\r'],
            KeyCode::Tab => vec![b'\t'],
            KeyCode::Backspace => vec![0x7f],
            KeyCode::Escape => vec![0x1b],
            KeyCode::Char(c) => self.encode_legacy_char(c, event.modifiers),
            _ => Vec::new(),
        }
    }

    fn encode_legacy_char(&self, c: char, modifiers: Modifiers) -> Vec<u8> {
        let mut bytes = Vec::new();
        let ctrl = modifiers.contains(Modifiers::CTRL);
        let alt = modifiers.contains(Modifiers::ALT) || modifiers.contains(Modifiers::META);
        let base: Vec<u8> = if ctrl {
            ctrl_encode(c).map(|b| vec![b]).unwrap_or_else(|| {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf).as_bytes().to_vec()
            })
        } else {
            let mut buf = [0u8; 4];
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        };
        if alt {
            bytes.push(0x1b);
        }
        bytes.extend(base);
        bytes
    }
}

/// Map an ASCII letter/punctuation to its control-character encoding
/// (`Ctrl+A` → `0x01`, etc), matching the standard xterm 0x40-masking rule.
fn ctrl_encode(c: char) -> Option<u8> {
    let upper = c.to_ascii_uppercase();
    if upper.is_ascii() && (0x3f..=0x5f).contains(&(upper as u8)) {
        Some((upper as u8) & 0x1f)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kitty_shift_backspace_encodes_csi_u() {
        let enc = KeyEncoder {
            kitty_flags: KittyFlags::DISAMBIGUATE,
            ..Default::default()
        };
        let event = KeyEvent::press(KeyCode::Backspace, Modifiers::SHIFT);
        assert_eq!(enc.encode(&event), b"\x1b[127;2u");
    }

    #[test]
    fn kitty_plain_char_without_modifiers_falls_back_to_utf8() {
        let enc = KeyEncoder {
            kitty_flags: KittyFlags::DISAMBIGUATE,
            ..Default::default()
        };
        let event = KeyEvent::press(KeyCode::Char('a'), Modifiers::empty());
        assert_eq!(enc.encode(&event), b"a");
    }

    #[test]
    fn kitty_report_events_adds_release_suffix() {
        let enc = KeyEncoder {
            kitty_flags: KittyFlags::DISAMBIGUATE | KittyFlags::REPORT_EVENTS,
            ..Default::default()
        };
        let event = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Release,
        };
        assert_eq!(enc.encode(&event), b"\x1b[97:3;1u");
    }

    #[test]
    fn legacy_ctrl_letter_maps_to_control_byte() {
        let enc = KeyEncoder::default();
        let event = KeyEvent::press(KeyCode::Char('c'), Modifiers::CTRL);
        assert_eq!(enc.encode(&event), vec![0x03]);
    }

    #[test]
    fn legacy_alt_prefixes_escape() {
        let enc = KeyEncoder::default();
        let event = KeyEvent::press(KeyCode::Char('x'), Modifiers::ALT);
        assert_eq!(enc.encode(&event), vec![0x1b, b'x']);
    }

    #[test]
    fn legacy_arrow_without_modifier_uses_csi() {
        let enc = KeyEncoder::default();
        let event = KeyEvent::press(KeyCode::Up, Modifiers::empty());
        assert_eq!(enc.encode(&event), b"\x1b[A");
    }

    #[test]
    fn legacy_arrow_application_mode_uses_ss3() {
        let enc = KeyEncoder {
            application_cursor_keys: true,
            ..Default::default()
        };
        let event = KeyEvent::press(KeyCode::Up, Modifiers::empty());
        assert_eq!(enc.encode(&event), b"\x1bOA");
    }

    #[test]
    fn legacy_arrow_with_modifier_uses_csi_1_mod() {
        let enc = KeyEncoder::default();
        let event = KeyEvent::press(KeyCode::Right, Modifiers::SHIFT);
        assert_eq!(enc.encode(&event), b"\x1b[1;2C");
    }

    #[test]
    fn modify_other_keys_level_2_encodes_ctrl_alt_char() {
        let enc = KeyEncoder {
            modify_other_keys: 2,
            ..Default::default()
        };
        let event = KeyEvent::press(KeyCode::Char('i'), Modifiers::CTRL | Modifiers::ALT);
        assert_eq!(enc.encode(&event), b"\x1b[27;7;105~");
    }
}
