//! OSC (Operating System Command) dispatch: window title, palette and
//! special-color queries/sets, OSC 52 clipboard, OSC 8 hyperlinks, OSC 7
//! working directory, OSC 9/99 notifications, OSC 133 shell-integration
//! marks, and the OSC 777 rxvt extension namespace.
//!
//! Unknown OSC commands are dropped and logged, never propagated as an
//! error — OSC is the textbook "ignore what you don't understand" VT
//! sub-protocol.

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec {
    Query,
    Rgb(u8, u8, u8),
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardData {
    Query,
    Clear,
    Base64(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMark {
    PromptStart,
    CommandStart,
    CommandExecuted,
    CommandFinished { exit_code: Option<i32> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscCommand {
    SetTitleAndIcon(String),
    SetIconName(String),
    SetTitle(String),
    SetPalette { index: u8, color: (u8, u8, u8) },
    ResetPalette { index: u8 },
    SetForegroundColor(ColorSpec),
    SetBackgroundColor(ColorSpec),
    SetCursorColor(ColorSpec),
    Clipboard { selection: char, data: ClipboardData },
    /// `id` is the link id parameter (`id=...`); an empty `uri` closes the
    /// currently open hyperlink.
    Hyperlink { id: Option<String>, uri: String },
    SetWorkingDirectory(String),
    Notification(String),
    ShellIntegration(ShellMark),
    RxvtExtension(Vec<String>),
    DesktopNotification(String),
}

pub fn parse_osc(params: &[Vec<u8>]) -> Option<OscCommand> {
    let cmd = std::str::from_utf8(params.first()?).ok()?;
    let rest = &params[1..];
    match cmd {
        "0" => Some(OscCommand::SetTitleAndIcon(join_text(rest))),
        "1" => Some(OscCommand::SetIconName(join_text(rest))),
        "2" => Some(OscCommand::SetTitle(join_text(rest))),
        "4" => parse_palette_set(rest),
        "104" => parse_palette_reset(rest),
        "10" => Some(OscCommand::SetForegroundColor(parse_color_spec(rest.first())?)),
        "11" => Some(OscCommand::SetBackgroundColor(parse_color_spec(rest.first())?)),
        "12" => Some(OscCommand::SetCursorColor(parse_color_spec(rest.first())?)),
        "52" => parse_clipboard(rest),
        "8" => parse_hyperlink(rest),
        "7" => Some(OscCommand::SetWorkingDirectory(join_text(rest))),
        "9" => Some(OscCommand::Notification(join_text(rest))),
        "99" => Some(OscCommand::DesktopNotification(join_text(rest))),
        "133" => parse_shell_integration(rest),
        "777" => Some(OscCommand::RxvtExtension(
            rest.iter().filter_map(|b| String::from_utf8(b.clone()).ok()).collect(),
        )),
        _ => {
            debug!(cmd, "dropping unrecognized OSC command");
            None
        }
    }
}

fn join_text(parts: &[Vec<u8>]) -> String {
    parts
        .iter()
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_palette_set(rest: &[Vec<u8>]) -> Option<OscCommand> {
    // OSC 4 ; index ; spec  (possibly repeated, but we only take the first
    // pair here — a host driving multiple indices sends multiple OSC 4s).
    let index: u8 = std::str::from_utf8(rest.first()?).ok()?.parse().ok()?;
    let color = parse_rgb_spec(rest.get(1)?)?;
    Some(OscCommand::SetPalette { index, color })
}

fn parse_palette_reset(rest: &[Vec<u8>]) -> Option<OscCommand> {
    let index: u8 = std::str::from_utf8(rest.first()?).ok()?.parse().ok()?;
    Some(OscCommand::ResetPalette { index })
}

fn parse_color_spec(spec: Option<&Vec<u8>>) -> Option<ColorSpec> {
    let spec = spec?;
    if spec == b"?" {
        return Some(ColorSpec::Query);
    }
    parse_rgb_spec(spec).map(|(r, g, b)| ColorSpec::Rgb(r, g, b))
}

/// Parse `#rrggbb` or `rgb:rr/gg/bb` (each component 2 or 4 hex digits,
/// only the high byte used) color specs.
fn parse_rgb_spec(spec: &[u8]) -> Option<(u8, u8, u8)> {
    let s = std::str::from_utf8(spec).ok()?;
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        return Some((r, g, b));
    }
    if let Some(rest) = s.strip_prefix("rgb:") {
        let mut parts = rest.split('/');
        let r = parse_component(parts.next()?)?;
        let g = parse_component(parts.next()?)?;
        let b = parse_component(parts.next()?)?;
        return Some((r, g, b));
    }
    None
}

fn parse_component(s: &str) -> Option<u8> {
    let value = u32::from_str_radix(s, 16).ok()?;
    let bits = s.len() * 4;
    // Scale an arbitrary-width component down to 8 bits by taking the high
    // byte, matching xterm's "most significant bits" color spec rule.
    let shifted = if bits > 8 { value >> (bits - 8) } else { value << (8 - bits) };
    Some(shifted as u8)
}

fn parse_clipboard(rest: &[Vec<u8>]) -> Option<OscCommand> {
    let selection = std::str::from_utf8(rest.first()?).ok()?.chars().next().unwrap_or('c');
    let payload = rest.get(1)?;
    let data = if payload == b"?" {
        ClipboardData::Query
    } else if payload.is_empty() {
        ClipboardData::Clear
    } else {
        ClipboardData::Base64(String::from_utf8_lossy(payload).into_owned())
    };
    Some(OscCommand::Clipboard { selection, data })
}

fn parse_hyperlink(rest: &[Vec<u8>]) -> Option<OscCommand> {
    let params_field = rest.first().map(|v| v.as_slice()).unwrap_or(b"");
    let uri = rest.get(1).map(|v| String::from_utf8_lossy(v).into_owned()).unwrap_or_default();
    let id = std::str::from_utf8(params_field)
        .ok()
        .and_then(|s| s.split(':').find_map(|kv| kv.strip_prefix("id=")))
        .map(|s| s.to_string());
    Some(OscCommand::Hyperlink { id, uri })
}

fn parse_shell_integration(rest: &[Vec<u8>]) -> Option<OscCommand> {
    let marker = std::str::from_utf8(rest.first()?).ok()?;
    let mark = match marker {
        "A" => ShellMark::PromptStart,
        "B" => ShellMark::CommandStart,
        "C" => ShellMark::CommandExecuted,
        "D" => {
            let exit_code = rest.get(1).and_then(|b| std::str::from_utf8(b).ok()).and_then(|s| s.parse().ok());
            ShellMark::CommandFinished { exit_code }
        }
        _ => {
            warn!(marker, "unrecognized OSC 133 shell-integration marker");
            return None;
        }
    };
    Some(OscCommand::ShellIntegration(mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Vec<Vec<u8>> {
        s.split(';').map(|p| p.as_bytes().to_vec()).collect()
    }

    #[test]
    fn parses_set_title() {
        assert_eq!(parse_osc(&p("2;my title")), Some(OscCommand::SetTitle("my title".into())));
    }

    #[test]
    fn parses_palette_set_hash_form() {
        assert_eq!(
            parse_osc(&p("4;1;#ff8000")),
            Some(OscCommand::SetPalette {
                index: 1,
                color: (0xff, 0x80, 0x00)
            })
        );
    }

    #[test]
    fn parses_palette_set_rgb_colon_form() {
        assert_eq!(
            parse_osc(&p("4;2;rgb:ffff/8080/0000")),
            Some(OscCommand::SetPalette {
                index: 2,
                color: (0xff, 0x80, 0x00)
            })
        );
    }

    #[test]
    fn parses_fg_color_query() {
        assert_eq!(parse_osc(&p("10;?")), Some(OscCommand::SetForegroundColor(ColorSpec::Query)));
    }

    #[test]
    fn parses_clipboard_base64() {
        assert_eq!(
            parse_osc(&p("52;c;aGVsbG8=")),
            Some(OscCommand::Clipboard {
                selection: 'c',
                data: ClipboardData::Base64("aGVsbG8=".into())
            })
        );
    }

    #[test]
    fn parses_hyperlink_open_and_close() {
        assert_eq!(
            parse_osc(&p("8;id=abc;https://example.com")),
            Some(OscCommand::Hyperlink {
                id: Some("abc".into()),
                uri: "https://example.com".into()
            })
        );
        assert_eq!(
            parse_osc(&p("8;;")),
            Some(OscCommand::Hyperlink { id: None, uri: String::new() })
        );
    }

    #[test]
    fn parses_shell_integration_command_finished_with_exit_code() {
        assert_eq!(
            parse_osc(&p("133;D;0")),
            Some(OscCommand::ShellIntegration(ShellMark::CommandFinished { exit_code: Some(0) }))
        );
    }

    #[test]
    fn unknown_command_returns_none() {
        assert_eq!(parse_osc(&p("8675309;whatever")), None);
    }
}
