//! Bracketed-paste framing (`CSI 200~ ... CSI 201~`) and the safety check
//! that decides whether paste text may be sent verbatim.
//!
//! A pasted string is unsafe to frame as-is when it contains the
//! bracketed-paste end sequence itself (a malicious or buggy clipboard
//! payload could otherwise smuggle arbitrary input past the framing) or a
//! bare newline — the non-bracketed fallback path turns `\n` into `\r`,
//! so a caller must go through that path rather than framing verbatim
//! when a payload contains one.

use crate::error::PasteError;

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";

/// True when `text` can be sent between the bracketed-paste markers
/// without being split or otherwise misinterpreted.
pub fn is_safe(text: &[u8]) -> bool {
    !contains(text, PASTE_END) && !text.contains(&b'\n')
}

/// Frame `text` for a bracketed paste. Returns [`PasteError::Unsafe`] when
/// `is_safe` rejects the text and the caller did not request
/// [`frame_lossy`] instead.
pub fn frame(text: &[u8]) -> Result<Vec<u8>, PasteError> {
    if !is_safe(text) {
        return Err(PasteError::Unsafe);
    }
    Ok(frame_unchecked(text))
}

/// Frame `text`, folding `\n` to `\r` and dropping any embedded paste-end
/// sequence first so the result is always safe to send. Used by callers
/// that would rather silently sanitize than reject a paste outright (e.g.
/// pasting from an untrusted source into an interactive prompt).
pub fn frame_lossy(text: &[u8]) -> Vec<u8> {
    let mut sanitized = Vec::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        if text[i..].starts_with(PASTE_END) {
            i += PASTE_END.len();
            continue;
        }
        sanitized.push(if text[i] == b'\n' { b'\r' } else { text[i] });
        i += 1;
    }
    frame_unchecked(&sanitized)
}

/// Non-bracketed-paste fallback: fold every `\n` to `\r` in place. Always
/// succeeds since the caller supplied a mutable buffer; see [`encode`] for
/// the immutable-input path, which cannot perform this transform and fails
/// instead when it would be needed.
pub fn fold_newlines_in_place(text: &mut [u8]) {
    for b in text.iter_mut() {
        if *b == b'\n' {
            *b = b'\r';
        }
    }
}

/// Encode paste text for sending, choosing the bracketed or non-bracketed
/// path. The non-bracketed path needs to fold `\n` to `\r`; since `text` is
/// borrowed immutably here, a payload that actually contains `\n` cannot be
/// transformed and is rejected with [`PasteError::MutableRequired`] — call
/// [`encode_mut`] with a mutable copy instead.
pub fn encode(bracketed: bool, text: &[u8]) -> Result<Vec<u8>, PasteError> {
    if bracketed {
        frame(text)
    } else if text.contains(&b'\n') {
        Err(PasteError::MutableRequired)
    } else {
        Ok(text.to_vec())
    }
}

/// Like [`encode`], but given a mutable buffer the non-bracketed path can
/// fold `\n` to `\r` in place rather than failing.
pub fn encode_mut(bracketed: bool, text: &mut [u8]) -> Result<Vec<u8>, PasteError> {
    if bracketed {
        frame(text)
    } else {
        fold_newlines_in_place(text);
        Ok(text.to_vec())
    }
}

fn frame_unchecked(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + PASTE_START.len() + PASTE_END.len());
    out.extend_from_slice(PASTE_START);
    out.extend_from_slice(text);
    out.extend_from_slice(PASTE_END);
    out
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_safe_and_frames_cleanly() {
        let text = b"hello world";
        assert!(is_safe(text));
        assert_eq!(frame(text).unwrap(), b"\x1b[200~hello world\x1b[201~".to_vec());
    }

    #[test]
    fn embedded_end_marker_is_unsafe() {
        let text = b"evil\x1b[201~payload";
        assert!(!is_safe(text));
        assert_eq!(frame(text), Err(PasteError::Unsafe));
    }

    #[test]
    fn embedded_newline_is_unsafe() {
        let text = b"hello\nworld";
        assert!(!is_safe(text));
        assert_eq!(frame(text), Err(PasteError::Unsafe));
    }

    #[test]
    fn bare_escape_is_safe() {
        let text = b"foo\x1bbar";
        assert!(is_safe(text));
    }

    #[test]
    fn lossy_frame_strips_end_marker_and_folds_newlines() {
        let text = b"evil\x1b[201~pay\nload";
        let framed = frame_lossy(text);
        assert_eq!(framed, b"\x1b[200~evilpay\rload\x1b[201~".to_vec());
    }

    #[test]
    fn encode_non_bracketed_requires_mutable_copy_when_text_has_newline() {
        let text = b"line1\nline2";
        assert_eq!(encode(false, text), Err(PasteError::MutableRequired));
    }

    #[test]
    fn encode_mut_non_bracketed_folds_newlines() {
        let mut text = b"line1\nline2".to_vec();
        let result = encode_mut(false, &mut text).unwrap();
        assert!(!result.contains(&b'\n'));
        assert_eq!(result, b"line1\rline2".to_vec());
    }
}
