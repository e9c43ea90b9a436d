//! DCS (Device Control String) sub-protocols: DECRQSS status-string
//! queries, XTGETTCAP termcap/terminfo queries, and the tmux
//! control-mode entry sentinel (`DCS 1000 p`).
//!
//! The parser (see [`crate::parser`]) only tokenizes DCS as
//! hook/put*/unhook; this module assembles the put bytes between hook and
//! unhook into one of the recognized request shapes and, where the request
//! demands a synchronous reply (DECRQSS, XTGETTCAP), formats the response
//! string the host is expected to write back.

use tracing::warn;

/// A fully assembled DCS request, recognized from its hook parameters and
/// intermediates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DcsRequest {
    /// `DCS $ q <Pt> ST` — report the current value of a named setting.
    RequestStatusString { query: Vec<u8> },
    /// `DCS + q <hex-names, ;-separated> ST` — report termcap/terminfo
    /// capability values.
    RequestTermcap { names: Vec<Vec<u8>> },
    /// `DCS 1000 p` — enter tmux control mode; the host takes over parsing
    /// of subsequent lines as `%`-prefixed notifications instead of VT.
    TmuxControlMode,
    /// Recognized hook shape, but the sub-protocol is not implemented; the
    /// payload is discarded once unhooked.
    Unsupported,
}

/// Incremental assembler fed the parser's `DcsHook`/`DcsPut`/`DcsUnhook`
/// actions in sequence.
pub struct DcsAssembler {
    active: Option<DcsRequest>,
    buf: Vec<u8>,
    max_bytes: usize,
}

impl DcsAssembler {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            active: None,
            buf: Vec::new(),
            max_bytes,
        }
    }

    pub fn hook(&mut self, params: &[i64], intermediates: &[u8], final_byte: u8) {
        self.buf.clear();
        self.active = Some(match (intermediates, final_byte) {
            (b"$", b'q') => DcsRequest::RequestStatusString { query: Vec::new() },
            (b"+", b'q') => DcsRequest::RequestTermcap { names: Vec::new() },
            ([], b'p') if params.first() == Some(&1000) => DcsRequest::TmuxControlMode,
            _ => {
                warn!(?params, ?intermediates, final_byte, "unrecognized DCS hook");
                DcsRequest::Unsupported
            }
        });
    }

    /// The request recognized at `hook` time, before its payload has
    /// arrived. Lets a caller react immediately to [`DcsRequest::TmuxControlMode`]
    /// — tmux never sends a matching unhook, so waiting for one would mean
    /// never reacting at all.
    pub fn peek(&self) -> Option<&DcsRequest> {
        self.active.as_ref()
    }

    pub fn put(&mut self, byte: u8) {
        if self.buf.len() >= self.max_bytes {
            warn!(cap = self.max_bytes, "DCS payload exceeded cap, dropping byte");
            return;
        }
        self.buf.push(byte);
    }

    /// Finalize the assembled request, consuming the buffered payload.
    pub fn unhook(&mut self) -> Option<DcsRequest> {
        let request = self.active.take()?;
        let payload = std::mem::take(&mut self.buf);
        Some(match request {
            DcsRequest::RequestStatusString { .. } => DcsRequest::RequestStatusString { query: payload },
            DcsRequest::RequestTermcap { .. } => {
                let names = payload.split(|&b| b == b';').map(|s| s.to_vec()).collect();
                DcsRequest::RequestTermcap { names }
            }
            other => other,
        })
    }
}

/// Format a DECRQSS reply body (without the `DCS`/`ST` wrapper) for a `$q`
/// query. `sgr_params` is the already-formatted parameter list for the "m"
/// (SGR) query; `scroll_region` is `(top, bottom)` 1-based for the "r"
/// (DECSTBM) query. Returns `None` for unrecognized `Pt`, which the caller
/// should report as `DCS 0 $ r ST`.
pub fn decrqss_reply(query: &[u8], sgr_params: &str, scroll_region: (u32, u32)) -> Option<String> {
    match query {
        b"m" => Some(format!("1$r{sgr_params}m")),
        b"r" => Some(format!("1$r{};{}r", scroll_region.0, scroll_region.1)),
        _ => None,
    }
}

/// Decode the semicolon-separated hex-encoded capability names XTGETTCAP
/// sends, dropping any name that is not valid hex (malformed input is
/// logged and ignored, never crashes the query).
pub fn decode_tcap_names(names: &[Vec<u8>]) -> Vec<String> {
    names
        .iter()
        .filter_map(|hex| decode_hex(hex))
        .filter_map(|bytes| String::from_utf8(bytes).ok())
        .collect()
}

fn decode_hex(hex: &[u8]) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(hex.len() / 2);
    for pair in hex.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// A small fixed table of termcap/terminfo capabilities XTGETTCAP may be
/// asked to report. Real terminals answer from their full terminfo
/// database; this covers the handful of entries test suites query.
pub fn lookup_tcap(name: &str) -> Option<&'static str> {
    match name {
        "TN" | "name" => Some("xterm-256color"),
        "Co" | "colors" => Some("256"),
        "RGB" => Some(""),
        _ => None,
    }
}

/// Format the `1+r`/`0+r` XTGETTCAP reply body for one queried name. Per
/// the capability-name encoding: a recognized name is echoed back in its
/// original (lowercase) hex form with its `=value` suffix; an unrecognized
/// name is echoed back uppercased, matching xterm's observed XTGETTCAP
/// behavior for capability names it does not have a termcap entry for.
pub fn xtgettcap_entry(hex_name: &[u8]) -> String {
    let Some(decoded) = decode_hex(hex_name) else {
        return String::new();
    };
    let Ok(name) = String::from_utf8(decoded) else {
        return String::new();
    };
    match lookup_tcap(&name) {
        Some(value) if value.is_empty() => encode_hex(name.as_bytes()),
        Some(value) => format!("{}={}", encode_hex(name.as_bytes()), encode_hex(value.as_bytes())),
        None => encode_hex(name.to_uppercase().as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_decrqss_hook() {
        let mut asm = DcsAssembler::new(1024);
        asm.hook(&[], b"$", b'q');
        for &b in b"m" {
            asm.put(b);
        }
        let req = asm.unhook().unwrap();
        assert_eq!(req, DcsRequest::RequestStatusString { query: b"m".to_vec() });
    }

    #[test]
    fn recognizes_tmux_control_mode_hook() {
        let mut asm = DcsAssembler::new(1024);
        asm.hook(&[1000], &[], b'p');
        assert_eq!(asm.unhook(), Some(DcsRequest::TmuxControlMode));
    }

    #[test]
    fn decrqss_formats_sgr_reply() {
        assert_eq!(decrqss_reply(b"m", "0;1;31", (1, 24)), Some("1$r0;1;31m".to_string()));
    }

    #[test]
    fn decrqss_unknown_query_is_none() {
        assert_eq!(decrqss_reply(b"z", "", (1, 24)), None);
    }

    #[test]
    fn xtgettcap_known_name_round_trips() {
        let hex = encode_hex(b"Co");
        let entry = xtgettcap_entry(hex.as_bytes());
        assert_eq!(entry, format!("{}={}", encode_hex(b"Co"), encode_hex(b"256")));
    }

    #[test]
    fn xtgettcap_unknown_name_uppercased() {
        let hex = encode_hex(b"bogus");
        let entry = xtgettcap_entry(hex.as_bytes());
        assert_eq!(entry, encode_hex(b"BOGUS"));
    }

    #[test]
    fn malformed_hex_name_ignored_without_panic() {
        let names = vec![b"zz".to_vec(), encode_hex(b"Co").into_bytes()];
        let decoded = decode_tcap_names(&names);
        assert_eq!(decoded, vec!["Co".to_string()]);
    }
}
