//! Property-based invariants spanning the host integration layer: paste
//! safety's logical guarantee, the tmux layout grammar's round trip, the
//! legacy ctrl+letter key mapping, and render-state diff idempotence.

use proptest::prelude::*;
use term_core::{CellContent, Screen};
use term_host::paste;
use term_host::tmux::layout::{self, Dims, Layout};
use term_host::{KeyCode, KeyEncoder, KeyEvent, Modifiers, RenderState};

/// Bounded recursive strategy for layout trees: depth capped at 3, leaves
/// carrying a size in a small range so `format` output stays short.
fn layout_strategy() -> impl Strategy<Value = Layout> {
    let leaf = (1u32..200, 1u32..200, 0u32..200, 0u32..200, proptest::option::of(0u32..64)).prop_map(
        |(width, height, x, y, pane_id)| Layout::Leaf {
            dims: Dims { width, height, x, y },
            pane_id,
        },
    );
    leaf.prop_recursive(3, 16, 3, |inner| {
        let dims = (1u32..200, 1u32..200, 0u32..200, 0u32..200)
            .prop_map(|(width, height, x, y)| Dims { width, height, x, y });
        prop_oneof![
            (dims.clone(), proptest::collection::vec(inner.clone(), 1..3))
                .prop_map(|(dims, children)| Layout::Horizontal { dims, children }),
            (dims, proptest::collection::vec(inner, 1..3))
                .prop_map(|(dims, children)| Layout::Vertical { dims, children }),
        ]
    })
}

proptest! {
    /// `format(parse(S)) == S` for any layout tree `format` itself produced
    /// — the literal round-trip invariant the module's own doc comment
    /// promises callers.
    #[test]
    fn layout_format_parse_round_trips(layout in layout_strategy()) {
        let rendered = layout.format();
        let reparsed = layout::parse(&rendered).unwrap();
        prop_assert_eq!(reparsed.format(), rendered);
    }

    /// A checksum-framed layout string always verifies against the exact
    /// layout text it was computed from, for any tree.
    #[test]
    fn layout_checksum_round_trips(layout in layout_strategy()) {
        let rendered = layout.format();
        let framed = format!("{},{}", layout::checksum_hex(&rendered), rendered);
        let parsed = layout::parse_with_checksum(&framed).unwrap();
        prop_assert_eq!(parsed.format(), rendered);
    }

    /// A single-bit corruption of the checksum hex (when it actually
    /// changes the value) is always caught rather than silently accepted.
    #[test]
    fn layout_checksum_detects_mismatch(layout in layout_strategy(), bad in 0u16..0xffffu16) {
        let rendered = layout.format();
        let real = layout::checksum(&rendered);
        prop_assume!(bad != real);
        let framed = format!("{:04x},{}", bad, rendered);
        prop_assert!(layout::parse_with_checksum(&framed).is_err());
    }

    /// `is_safe` and `frame` agree: whenever text is judged safe, framing it
    /// succeeds and the result still begins/ends with the bracket markers
    /// with the payload appearing exactly once, verbatim, between them.
    #[test]
    fn paste_is_safe_implies_clean_frame(text in proptest::collection::vec(any::<u8>(), 0..256)) {
        if paste::is_safe(&text) {
            let framed = paste::frame(&text).unwrap();
            prop_assert!(framed.starts_with(b"\x1b[200~"));
            prop_assert!(framed.ends_with(b"\x1b[201~"));
            prop_assert_eq!(&framed[6..framed.len() - 6], text.as_slice());
        } else {
            prop_assert!(paste::frame(&text).is_err());
        }
    }

    /// Text judged unsafe always contains either a raw newline or the
    /// bracketed-paste end marker — the only two reasons `is_safe` rejects.
    #[test]
    fn paste_unsafe_always_has_a_reason(text in proptest::collection::vec(any::<u8>(), 0..256)) {
        if !paste::is_safe(&text) {
            let has_newline = text.contains(&b'\n');
            let has_end_marker = text.windows(6).any(|w| w == b"\x1b[201~");
            prop_assert!(has_newline || has_end_marker);
        }
    }

    /// `frame_lossy` always produces a safe, well-bracketed result no
    /// matter how adversarial the input — it must never emit an embedded
    /// end marker or a bare newline between its own brackets.
    #[test]
    fn paste_frame_lossy_always_safe(text in proptest::collection::vec(any::<u8>(), 0..256)) {
        let framed = paste::frame_lossy(&text);
        let inner = &framed[6..framed.len() - 6];
        prop_assert!(paste::is_safe(inner));
    }

    /// Legacy ctrl+letter encoding always produces the standard 0x00-0x1f
    /// control byte (xterm's 0x40-masking rule), for every ASCII letter.
    #[test]
    fn legacy_ctrl_letter_is_always_a_control_byte(c in "[a-zA-Z]") {
        let enc = KeyEncoder::default();
        let c = c.chars().next().unwrap();
        let event = KeyEvent::press(KeyCode::Char(c), Modifiers::CTRL);
        let bytes = enc.encode(&event);
        prop_assert_eq!(bytes.len(), 1);
        prop_assert!(bytes[0] <= 0x1f);
    }

    /// Re-capturing a `RenderState` from an unmodified screen always diffs
    /// to `None` against the previous capture — idempotent when nothing
    /// changed, regardless of screen size.
    #[test]
    fn render_state_idempotent_when_screen_unchanged(cols in 1usize..30, rows in 1usize..15) {
        let screen = Screen::new(cols, rows);
        let a = RenderState::capture(&screen, 0);
        let b = RenderState::capture(&screen, 1);
        prop_assert_eq!(a.diff(&b), term_host::DirtyVerdict::None);
    }

    /// Printing a single character anywhere on the screen is always
    /// reported as a dirty row containing exactly that row index, never
    /// more, never fewer. Row count is kept above 1 so a single dirty row
    /// can never also satisfy the "every row changed" `Full` verdict.
    #[test]
    fn render_state_single_edit_dirties_exactly_its_row(
        cols in 2usize..30,
        row_count in 2usize..15,
        row in 0usize..14,
        col in 0usize..29,
    ) {
        let row = row % row_count;
        let col = col % cols;
        let mut screen = Screen::new(cols, row_count);
        let before = RenderState::capture(&screen, 0);
        screen.move_cursor_to(row, col);
        screen.print(CellContent::Codepoint('x'), 1);
        let after = RenderState::capture(&screen, 1);
        prop_assert_eq!(after.diff(&before), term_host::DirtyVerdict::Partial(vec![row]));
    }
}
