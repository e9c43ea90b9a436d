//! APC (Application Program Command) handling.
//!
//! The only APC sub-protocol in active use is the Kitty graphics protocol
//! (`APC G <key>=<value>,... ; <base64 payload> ST`). Image decoding is out
//! of scope (see the crate's Non-goals), so this only parses the command's
//! key/value header and hands back the still-base64-encoded payload; a host
//! that wants to render the image decodes it itself.

/// One parsed Kitty graphics APC command. Unknown keys are kept verbatim
/// rather than rejected — the protocol adds keys over time and an
/// unrecognized one should not invalidate the whole command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KittyGraphicsCommand {
    pub keys: Vec<(String, String)>,
    pub payload: Option<String>,
}

impl KittyGraphicsCommand {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.keys.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// Parse one APC payload (the concatenated `ApcPut` bytes between
/// `ApcStart` and `ApcEnd`) as a Kitty graphics command. Returns `None` when
/// the payload does not start with the `G` sub-protocol tag — any other
/// APC tag is silently ignored per the "never crash on unrecognized
/// sub-protocol" policy.
pub fn parse_kitty_graphics(payload: &[u8]) -> Option<KittyGraphicsCommand> {
    let mut bytes = payload;
    if bytes.first() != Some(&b'G') {
        return None;
    }
    bytes = &bytes[1..];
    let (header, payload_b64) = match bytes.iter().position(|&b| b == b';') {
        Some(idx) => (&bytes[..idx], Some(&bytes[idx + 1..])),
        None => (bytes, None),
    };
    let header = std::str::from_utf8(header).ok()?;
    let keys = header
        .split(',')
        .filter_map(|kv| {
            let mut parts = kv.splitn(2, '=');
            let k = parts.next()?.trim();
            let v = parts.next()?.trim();
            if k.is_empty() {
                None
            } else {
                Some((k.to_string(), v.to_string()))
            }
        })
        .collect();
    let payload = payload_b64.map(|b| String::from_utf8_lossy(b).into_owned());
    Some(KittyGraphicsCommand { keys, payload })
}
