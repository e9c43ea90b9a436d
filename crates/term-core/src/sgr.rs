//! SGR (`CSI ... m`) parameter application.
//!
//! Maps the numeric parameter stream onto a [`Style`] record in place.
//! Indexed color forms (basic `30-37`/`90-97`/`40-47`/`100-107` and
//! 256-color `38;5;n`/`48;5;n`) resolve to [`Color::Palette`] rather than
//! a pre-baked RGB triple — the palette itself is a rendering concern the
//! data plane doesn't own. Only the 24-bit truecolor form (`38;2;r;g;b`)
//! resolves directly to [`Color::Rgb`].

use crate::cell::{Color, Style, StyleFlags};

/// Apply one `CSI ... m` parameter list to `style` in place. An empty
/// parameter list (bare `CSI m`) means reset, same as an explicit `0`.
/// Unknown codes are ignored — SGR grows new codes over time and a
/// terminal that aborted on an unrecognized one would be useless.
pub fn apply_sgr(style: &mut Style, params: &[i64]) {
    if params.is_empty() {
        *style = Style::default();
        return;
    }
    let mut i = 0;
    while i < params.len() {
        match params[i] {
            0 => *style = Style::default(),
            1 => style.flags.insert(StyleFlags::BOLD),
            2 => style.flags.insert(StyleFlags::FAINT),
            3 => style.flags.insert(StyleFlags::ITALIC),
            4 => style.flags.insert(StyleFlags::UNDERLINE),
            5 | 6 => style.flags.insert(StyleFlags::BLINK),
            7 => style.flags.insert(StyleFlags::INVERSE),
            8 => style.flags.insert(StyleFlags::INVISIBLE),
            9 => style.flags.insert(StyleFlags::STRIKETHROUGH),
            21 => style.flags.insert(StyleFlags::UNDERLINE_DOUBLE),
            22 => style.flags.remove(StyleFlags::BOLD | StyleFlags::FAINT),
            23 => style.flags.remove(StyleFlags::ITALIC),
            24 => style.flags.remove(
                StyleFlags::UNDERLINE
                    | StyleFlags::UNDERLINE_DOUBLE
                    | StyleFlags::UNDERLINE_CURLY
                    | StyleFlags::UNDERLINE_DOTTED
                    | StyleFlags::UNDERLINE_DASHED,
            ),
            25 => style.flags.remove(StyleFlags::BLINK),
            27 => style.flags.remove(StyleFlags::INVERSE),
            28 => style.flags.remove(StyleFlags::INVISIBLE),
            29 => style.flags.remove(StyleFlags::STRIKETHROUGH),
            30..=37 => style.fg = Color::Palette((params[i] - 30) as u8),
            38 => {
                if let Some(color) = parse_extended_color(params, &mut i) {
                    style.fg = color;
                }
            }
            39 => style.fg = Color::Default,
            40..=47 => style.bg = Color::Palette((params[i] - 40) as u8),
            48 => {
                if let Some(color) = parse_extended_color(params, &mut i) {
                    style.bg = color;
                }
            }
            49 => style.bg = Color::Default,
            58 => {
                if let Some(color) = parse_extended_color(params, &mut i) {
                    style.underline_color = color;
                }
            }
            59 => style.underline_color = Color::Default,
            90..=97 => style.fg = Color::Palette((params[i] - 90) as u8 + 8),
            100..=107 => style.bg = Color::Palette((params[i] - 100) as u8 + 8),
            _ => {}
        }
        i += 1;
    }
}

/// Parse the `38`/`48`/`58` extended color forms starting at `params[*i]`
/// (the code itself), advancing `*i` past whatever it consumes. Supports
/// `5;n` (256-color palette) and `2;r;g;b` (24-bit truecolor); the
/// colon-separated form (`38:2::r:g:b`) arrives as a single semicolon
/// field under this parser's tokenizer and is not split out, so it is not
/// recognized here.
fn parse_extended_color(params: &[i64], i: &mut usize) -> Option<Color> {
    match *params.get(*i + 1)? {
        5 => {
            let idx = *params.get(*i + 2)?;
            *i += 2;
            Some(Color::Palette(idx.clamp(0, 255) as u8))
        }
        2 => {
            let r = *params.get(*i + 2)?;
            let g = *params.get(*i + 3)?;
            let b = *params.get(*i + 4)?;
            *i += 4;
            Some(Color::Rgb(r.clamp(0, 255) as u8, g.clamp(0, 255) as u8, b.clamp(0, 255) as u8))
        }
        _ => None,
    }
}

/// Format a style's active attributes as a DECRQSS `$q m` reply body
/// (the semicolon-separated parameter list an application would need to
/// send to reproduce it). Bold/faint/italic/underline/blink/inverse and
/// the basic/256-color/truecolor forms round-trip; the default style
/// formats as the bare reset `"0"`.
pub fn format_sgr_params(style: &Style) -> String {
    let mut parts = vec!["0".to_string()];
    if style.flags.contains(StyleFlags::BOLD) {
        parts.push("1".into());
    }
    if style.flags.contains(StyleFlags::FAINT) {
        parts.push("2".into());
    }
    if style.flags.contains(StyleFlags::ITALIC) {
        parts.push("3".into());
    }
    if style.flags.contains(StyleFlags::UNDERLINE) {
        parts.push("4".into());
    }
    if style.flags.contains(StyleFlags::BLINK) {
        parts.push("5".into());
    }
    if style.flags.contains(StyleFlags::INVERSE) {
        parts.push("7".into());
    }
    if style.flags.contains(StyleFlags::INVISIBLE) {
        parts.push("8".into());
    }
    if style.flags.contains(StyleFlags::STRIKETHROUGH) {
        parts.push("9".into());
    }
    push_color(&mut parts, style.fg, 38, 39);
    push_color(&mut parts, style.bg, 48, 49);
    parts.join(";")
}

fn push_color(parts: &mut Vec<String>, color: Color, set_base: u16, _default_code: u16) {
    match color {
        Color::Default => {}
        Color::Palette(idx) => parts.push(format!("{set_base};5;{idx}")),
        Color::Rgb(r, g, b) => parts.push(format!("{set_base};2;{r};{g};{b}")),
    }
}
