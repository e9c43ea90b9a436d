//! Parser for tmux control-mode's `%`-prefixed notification lines.
//!
//! Grounded on the octal-escape and notification-shape handling worked out
//! for a tmux control-mode bridge in another terminal front-end in the same
//! retrieval set, generalized here to a pure function over one already
//! newline-split line (the host owns buffering/line-splitting, since tmux
//! control mode is itself carried inside a DCS passthrough string that this
//! crate's parser already delivers byte-by-byte).

use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmuxNotification {
    Begin { timestamp: u64, cmd_number: u64 },
    End { timestamp: u64, cmd_number: u64 },
    Error { timestamp: u64, cmd_number: u64 },
    /// Payload bytes already have tmux's `\ooo` octal escaping decoded.
    Output { pane_id: u32, data: Vec<u8> },
    SessionChanged { session_id: u32, name: String },
    SessionRenamed { name: String },
    SessionWindowChanged { session_id: u32, window_id: u32 },
    WindowAdd { window_id: u32 },
    WindowClose { window_id: u32 },
    WindowRenamed { window_id: u32, name: String },
    /// `layout` is the raw `WxH,X,Y{...}`/`[...]` string, still carrying
    /// its checksum prefix — see [`crate::tmux_layout`] in `term-host` for
    /// parsing it further.
    LayoutChange { window_id: u32, layout: String },
    PaneModeChanged { pane_id: u32 },
    Unlinked { session_id: u32 },
    Exit { reason: Option<String> },
    Unknown { name: String, args: Vec<String> },
}

/// Parse one notification line (without its trailing newline). Lines that
/// don't start with `%` or whose arguments don't match the expected shape
/// for a recognized notification name fall back to `Unknown` rather than
/// being dropped outright, so a caller can still log/forward them.
pub fn parse_notification(line: &str) -> Option<TmuxNotification> {
    let line = line.strip_prefix('%')?;
    let mut parts = line.splitn(2, ' ');
    let name = parts.next()?;
    let rest = parts.next().unwrap_or("");
    let args: Vec<&str> = if rest.is_empty() { Vec::new() } else { rest.split(' ').collect() };

    let parsed = match name {
        "begin" => Some(TmuxNotification::Begin {
            timestamp: parse_u64(args.first())?,
            cmd_number: parse_u64(args.get(1))?,
        }),
        "end" => Some(TmuxNotification::End {
            timestamp: parse_u64(args.first())?,
            cmd_number: parse_u64(args.get(1))?,
        }),
        "error" => Some(TmuxNotification::Error {
            timestamp: parse_u64(args.first())?,
            cmd_number: parse_u64(args.get(1))?,
        }),
        "output" => {
            let id_token = *args.first()?;
            let pane_id = parse_pane_id(id_token)?;
            // `rest` is `%<id> <data...>`; the data field itself may
            // contain spaces, so only the pane-id token is stripped off.
            let data_str = rest.get(id_token.len() + 1..).unwrap_or("");
            Some(TmuxNotification::Output {
                pane_id,
                data: decode_octal_escapes(data_str.as_bytes()),
            })
        }
        "session-changed" => Some(TmuxNotification::SessionChanged {
            session_id: parse_session_id(args.first()?)?,
            name: args.get(1).map(|s| s.to_string()).unwrap_or_default(),
        }),
        "session-renamed" => Some(TmuxNotification::SessionRenamed {
            name: rest.to_string(),
        }),
        "session-window-changed" => Some(TmuxNotification::SessionWindowChanged {
            session_id: parse_session_id(args.first()?)?,
            window_id: parse_window_id(args.get(1)?)?,
        }),
        "window-add" => Some(TmuxNotification::WindowAdd {
            window_id: parse_window_id(args.first()?)?,
        }),
        "window-close" => Some(TmuxNotification::WindowClose {
            window_id: parse_window_id(args.first()?)?,
        }),
        "window-renamed" => Some(TmuxNotification::WindowRenamed {
            window_id: parse_window_id(args.first()?)?,
            name: args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default(),
        }),
        "layout-change" => Some(TmuxNotification::LayoutChange {
            window_id: parse_window_id(args.first()?)?,
            layout: args.get(1).map(|s| s.to_string()).unwrap_or_default(),
        }),
        "pane-mode-changed" => Some(TmuxNotification::PaneModeChanged {
            pane_id: parse_pane_id(args.first()?)?,
        }),
        "unlinked-window-close" | "unlinked-window-add" => Some(TmuxNotification::Unlinked {
            session_id: parse_session_id(args.first()?)?,
        }),
        "exit" => Some(TmuxNotification::Exit {
            reason: if rest.is_empty() { None } else { Some(rest.to_string()) },
        }),
        _ => None,
    };

    parsed.or_else(|| {
        warn!(name, "tmux notification did not match expected shape, reporting as Unknown");
        Some(TmuxNotification::Unknown {
            name: name.to_string(),
            args: args.into_iter().map(|s| s.to_string()).collect(),
        })
    })
}

fn parse_u64(s: Option<&&str>) -> Option<u64> {
    s?.parse().ok()
}

fn parse_session_id(s: &str) -> Option<u32> {
    s.strip_prefix('$')?.parse().ok()
}

fn parse_window_id(s: &str) -> Option<u32> {
    s.strip_prefix('@')?.parse().ok()
}

fn parse_pane_id(s: &str) -> Option<u32> {
    s.strip_prefix('%')?.parse().ok()
}

/// Decode tmux's `\ooo` (3-digit octal) escaping of non-printable bytes in
/// `%output` payloads. `\\` decodes to a literal backslash; any other
/// escape shape is passed through byte-for-byte rather than treated as an
/// error, since a malformed escape must never stall output rendering.
pub fn decode_octal_escapes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\\' {
            if data.get(i + 1) == Some(&b'\\') {
                out.push(b'\\');
                i += 2;
                continue;
            }
            if let Some(slice) = data.get(i + 1..i + 4) {
                if slice.iter().all(|b| (b'0'..=b'7').contains(b)) {
                    let value = slice.iter().fold(0u32, |acc, &b| acc * 8 + (b - b'0') as u32);
                    out.push(value as u8);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(data[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_begin_end() {
        assert_eq!(
            parse_notification("%begin 1234567890 1"),
            Some(TmuxNotification::Begin {
                timestamp: 1234567890,
                cmd_number: 1
            })
        );
        assert_eq!(
            parse_notification("%end 1234567890 1"),
            Some(TmuxNotification::End {
                timestamp: 1234567890,
                cmd_number: 1
            })
        );
    }

    #[test]
    fn parses_output_with_embedded_space() {
        match parse_notification("%output %3 hello world") {
            Some(TmuxNotification::Output { pane_id, data }) => {
                assert_eq!(pane_id, 3);
                assert_eq!(data, b"hello world");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_session_changed() {
        assert_eq!(
            parse_notification("%session-changed $1 main"),
            Some(TmuxNotification::SessionChanged {
                session_id: 1,
                name: "main".to_string()
            })
        );
    }

    #[test]
    fn parses_layout_change() {
        assert_eq!(
            parse_notification("%layout-change @1 d04b,159x48,0,0{79x48,0,0,79x48,80,0}"),
            Some(TmuxNotification::LayoutChange {
                window_id: 1,
                layout: "d04b,159x48,0,0{79x48,0,0,79x48,80,0}".to_string()
            })
        );
    }

    #[test]
    fn unrecognized_notification_name_falls_back_to_unknown() {
        match parse_notification("%something-new foo bar") {
            Some(TmuxNotification::Unknown { name, args }) => {
                assert_eq!(name, "something-new");
                assert_eq!(args, vec!["foo", "bar"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn decode_octal_escapes_round_trips_control_bytes() {
        assert_eq!(decode_octal_escapes(b"a\\033b"), vec![b'a', 0o33, b'b']);
    }

    #[test]
    fn decode_octal_escapes_handles_escaped_backslash() {
        assert_eq!(decode_octal_escapes(b"a\\\\b"), b"a\\b");
    }

    #[test]
    fn decode_octal_escapes_leaves_malformed_escape_alone() {
        assert_eq!(decode_octal_escapes(b"a\\9zb"), b"a\\9zb");
    }
}
