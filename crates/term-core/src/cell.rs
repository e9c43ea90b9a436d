//! The terminal cell and the per-page interned tables it references.
//!
//! A [`Cell`] is deliberately small: content, a wide-character marker, an
//! interned [`StyleId`], and a [`HyperlinkId`]. Anything that would make the
//! cell grow unboundedly (combining-mark codepoints, full SGR records, full
//! hyperlink URIs) lives in a page-local, ref-counted, bounded-capacity
//! table instead — see [`StyleTable`], [`GraphemeTable`], [`HyperlinkRegistry`].

use crate::error::PageError;
use std::collections::HashMap;

bitflags::bitflags! {
    /// SGR text attribute flags, ECMA-48 / VT100 SGR parameter values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u16 {
        const BOLD          = 1 << 0;
        const ITALIC        = 1 << 1;
        const FAINT         = 1 << 2;
        const BLINK         = 1 << 3;
        const INVERSE       = 1 << 4;
        const INVISIBLE     = 1 << 5;
        const STRIKETHROUGH = 1 << 6;
        const UNDERLINE     = 1 << 7;
        const UNDERLINE_DOUBLE = 1 << 8;
        const UNDERLINE_CURLY  = 1 << 9;
        const UNDERLINE_DOTTED = 1 << 10;
        const UNDERLINE_DASHED = 1 << 11;
    }
}

/// Color representation: default, palette entry, or 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Default,
    Palette(u8),
    Rgb(u8, u8, u8),
}

/// A fully-specified SGR style record. Interned per page behind a [`StyleId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub flags: StyleFlags,
    pub fg: Color,
    pub bg: Color,
    pub underline_color: Color,
}

/// Interned style handle. `StyleId::DEFAULT` (0) always resolves to
/// [`Style::default()`] and is never evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StyleId(pub(crate) u32);

impl StyleId {
    pub const DEFAULT: StyleId = StyleId(0);
}

struct StyleSlot {
    style: Style,
    ref_count: u32,
}

/// A bounded, ref-counted, per-page set of interned [`Style`] records.
///
/// Mirrors the structure of the hyperlink registry: a `Vec` of slots, a
/// reverse lookup for deduplication, and a free list for id reuse. When the
/// table is at `capacity`, further interning fails with
/// [`PageError::StyleTableFull`] and the caller must split to a new page.
pub struct StyleTable {
    capacity: usize,
    slots: Vec<Option<StyleSlot>>,
    lookup: HashMap<Style, StyleId>,
    free_list: Vec<StyleId>,
}

impl StyleTable {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Some(StyleSlot {
            style: Style::default(),
            ref_count: 1,
        }));
        Self {
            capacity: capacity.max(1),
            slots,
            lookup: HashMap::new(),
            free_list: Vec::new(),
        }
    }

    /// Intern `style`, incrementing its refcount by one (one more cell now
    /// points at it). Returns `StyleId::DEFAULT` for the default style
    /// without consuming capacity.
    pub fn acquire(&mut self, style: Style) -> Result<StyleId, PageError> {
        if style == Style::default() {
            return Ok(StyleId::DEFAULT);
        }
        if let Some(&id) = self.lookup.get(&style) {
            self.bump(id, 1);
            return Ok(id);
        }
        let id = if let Some(id) = self.free_list.pop() {
            id
        } else {
            if self.slots.len() >= self.capacity {
                return Err(PageError::StyleTableFull);
            }
            let id = StyleId(self.slots.len() as u32);
            self.slots.push(None);
            id
        };
        self.slots[id.0 as usize] = Some(StyleSlot {
            style,
            ref_count: 1,
        });
        self.lookup.insert(style, id);
        Ok(id)
    }

    fn bump(&mut self, id: StyleId, delta: i32) {
        if id == StyleId::DEFAULT {
            return;
        }
        let Some(slot) = self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut()) else {
            return;
        };
        if delta > 0 {
            slot.ref_count = slot.ref_count.saturating_add(delta as u32);
        } else {
            slot.ref_count = slot.ref_count.saturating_sub((-delta) as u32);
            if slot.ref_count == 0 {
                let style = slot.style;
                self.slots[id.0 as usize] = None;
                self.lookup.remove(&style);
                self.free_list.push(id);
            }
        }
    }

    /// Increment the refcount for a style already interned elsewhere (used
    /// when copying a cell verbatim, e.g. scroll/insert-line shifts).
    pub fn retain(&mut self, id: StyleId) {
        self.bump(id, 1);
    }

    /// Release one reference; frees the slot when it reaches zero.
    pub fn release(&mut self, id: StyleId) {
        self.bump(id, -1);
    }

    pub fn get(&self, id: StyleId) -> Style {
        if id == StyleId::DEFAULT {
            return Style::default();
        }
        self.slots
            .get(id.0 as usize)
            .and_then(|s| s.as_ref())
            .map(|s| s.style)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hyperlink identifier for OSC 8 links. Zero means "no link".
pub type HyperlinkId = u32;

/// Per-page intern table for OSC 8 hyperlink URIs, bounded and ref-counted.
///
/// Grounded on `frankenterm-core::cell::HyperlinkRegistry`, generalized with
/// an explicit capacity so a full table fails the write instead of growing
/// unboundedly, matching the page-split policy for all interned tables.
#[derive(Debug, Clone)]
pub struct HyperlinkRegistry {
    capacity: usize,
    slots: Vec<Option<HyperlinkSlot>>,
    lookup: HashMap<String, HyperlinkId>,
    free_list: Vec<HyperlinkId>,
}

#[derive(Debug, Clone)]
struct HyperlinkSlot {
    uri: String,
    ref_count: u32,
}

impl HyperlinkRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: vec![None],
            lookup: HashMap::new(),
            free_list: Vec::new(),
        }
    }

    /// Intern a URI and return its id, incrementing its refcount.
    /// Empty URIs return 0 ("no link") without consuming capacity.
    pub fn acquire(&mut self, uri: &str) -> Result<HyperlinkId, PageError> {
        if uri.is_empty() {
            return Ok(0);
        }
        if let Some(&id) = self.lookup.get(uri) {
            self.bump(id, 1);
            return Ok(id);
        }
        let id = if let Some(id) = self.free_list.pop() {
            id
        } else {
            if self.slots.len() >= self.capacity {
                return Err(PageError::HyperlinkTableFull);
            }
            let id = self.slots.len() as HyperlinkId;
            self.slots.push(None);
            id
        };
        self.slots[id as usize] = Some(HyperlinkSlot {
            uri: uri.to_string(),
            ref_count: 1,
        });
        self.lookup.insert(uri.to_string(), id);
        Ok(id)
    }

    fn bump(&mut self, id: HyperlinkId, delta: i32) {
        if id == 0 {
            return;
        }
        let Some(slot) = self.slots.get_mut(id as usize) else {
            return;
        };
        let should_remove = match (slot.as_mut(), delta) {
            (Some(s), d) if d > 0 => {
                s.ref_count = s.ref_count.saturating_add(d as u32);
                false
            }
            (Some(s), d) => {
                s.ref_count = s.ref_count.saturating_sub((-d) as u32);
                s.ref_count == 0
            }
            (None, _) => false,
        };
        if should_remove {
            if let Some(removed) = slot.take() {
                self.lookup.remove(&removed.uri);
                self.free_list.push(id);
            }
        }
    }

    pub fn retain(&mut self, id: HyperlinkId) {
        self.bump(id, 1);
    }

    pub fn release(&mut self, id: HyperlinkId) {
        self.bump(id, -1);
    }

    pub fn get(&self, id: HyperlinkId) -> Option<&str> {
        self.slots
            .get(id as usize)
            .and_then(|s| s.as_ref())
            .map(|s| s.uri.as_str())
    }

    /// URI equality check used by OSC 8 "same link" hit-testing — two ids
    /// (possibly from different pages) refer to the same link iff their
    /// URIs are byte-equal.
    pub fn same_link(&self, a: HyperlinkId, other: &HyperlinkRegistry, b: HyperlinkId) -> bool {
        match (self.get(a), other.get(b)) {
            (Some(u1), Some(u2)) => u1 == u2,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grapheme-cluster continuation id: indexes extra codepoints for a cell
/// whose primary codepoint alone does not represent the full cluster
/// (combining marks, ZWJ sequences rendered as a single cell).
pub type GraphemeId = u32;

/// Bounded, ref-counted per-page table of grapheme continuation codepoints.
#[derive(Debug, Clone, Default)]
pub struct GraphemeTable {
    capacity: usize,
    slots: Vec<Option<(Vec<char>, u32)>>,
    free_list: Vec<GraphemeId>,
}

impl GraphemeTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: vec![None],
            free_list: Vec::new(),
        }
    }

    pub fn acquire(&mut self, codepoints: &[char]) -> Result<GraphemeId, PageError> {
        let id = if let Some(id) = self.free_list.pop() {
            id
        } else {
            if self.slots.len() >= self.capacity {
                return Err(PageError::GraphemeTableFull);
            }
            let id = self.slots.len() as GraphemeId;
            self.slots.push(None);
            id
        };
        self.slots[id as usize] = Some((codepoints.to_vec(), 1));
        Ok(id)
    }

    pub fn release(&mut self, id: GraphemeId) {
        if id == 0 {
            return;
        }
        let Some(slot) = self.slots.get_mut(id as usize) else {
            return;
        };
        let should_remove = match slot.as_mut() {
            Some((_, count)) => {
                *count = count.saturating_sub(1);
                *count == 0
            }
            None => false,
        };
        if should_remove {
            *slot = None;
            self.free_list.push(id);
        }
    }

    pub fn get(&self, id: GraphemeId) -> &[char] {
        self.slots
            .get(id as usize)
            .and_then(|s| s.as_ref())
            .map(|(cps, _)| cps.as_slice())
            .unwrap_or(&[])
    }
}

/// A cell's wide-character classification. A `Wide` cell is always
/// immediately followed, within the same row, by a `SpacerTail` cell; this
/// pair must never straddle a row boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WideMarker {
    #[default]
    Narrow,
    Wide,
    SpacerTail,
}

/// Content tag for a cell. `RgbBg`/`PaletteBg` cells carry no glyph — they
/// exist purely to paint a background rectangle (used for DECSTBM-adjacent
/// fills and blank-cell background painting without allocating a style).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellContent {
    Codepoint(char),
    CodepointWithGrapheme(char, GraphemeId),
    RgbBg(u8, u8, u8),
    PaletteBg(u8),
}

impl Default for CellContent {
    fn default() -> Self {
        CellContent::Codepoint(' ')
    }
}

/// A single cell in a [`crate::page::Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub content: CellContent,
    pub wide: WideMarker,
    pub style: StyleId,
    pub hyperlink: HyperlinkId,
}

impl Cell {
    pub fn blank() -> Self {
        Self::default()
    }

    /// The cell's primary codepoint, ignoring any grapheme continuation or
    /// background-only content (those report `' '`/`'\0'` as appropriate).
    pub fn primary_char(&self) -> char {
        match self.content {
            CellContent::Codepoint(c) | CellContent::CodepointWithGrapheme(c, _) => c,
            CellContent::RgbBg(..) | CellContent::PaletteBg(..) => ' ',
        }
    }

    pub fn is_wide(&self) -> bool {
        matches!(self.wide, WideMarker::Wide)
    }

    pub fn is_spacer_tail(&self) -> bool {
        matches!(self.wide, WideMarker::SpacerTail)
    }

    pub fn has_hyperlink(&self) -> bool {
        self.hyperlink != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_blank_space() {
        let cell = Cell::blank();
        assert_eq!(cell.primary_char(), ' ');
        assert_eq!(cell.style, StyleId::DEFAULT);
        assert_eq!(cell.hyperlink, 0);
        assert!(!cell.is_wide());
    }

    #[test]
    fn style_table_interns_and_dedups() {
        let mut table = StyleTable::new(4);
        let bold = Style {
            flags: StyleFlags::BOLD,
            ..Style::default()
        };
        let id1 = table.acquire(bold).unwrap();
        let id2 = table.acquire(bold).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(table.get(id1), bold);
    }

    #[test]
    fn style_table_default_never_consumes_capacity() {
        let mut table = StyleTable::new(1);
        for _ in 0..10 {
            assert_eq!(table.acquire(Style::default()).unwrap(), StyleId::DEFAULT);
        }
    }

    #[test]
    fn style_table_full_returns_error() {
        let mut table = StyleTable::new(1);
        let a = Style {
            flags: StyleFlags::BOLD,
            ..Style::default()
        };
        let b = Style {
            flags: StyleFlags::ITALIC,
            ..Style::default()
        };
        table.acquire(a).unwrap();
        assert_eq!(table.acquire(b), Err(PageError::StyleTableFull));
    }

    #[test]
    fn style_table_frees_slot_on_last_release() {
        let mut table = StyleTable::new(1);
        let a = Style {
            flags: StyleFlags::BOLD,
            ..Style::default()
        };
        let id = table.acquire(a).unwrap();
        table.release(id);
        assert_eq!(table.len(), 1); // default style slot still counted

        let b = Style {
            flags: StyleFlags::ITALIC,
            ..Style::default()
        };
        let reused = table.acquire(b).unwrap();
        assert_eq!(reused, id);
    }

    #[test]
    fn hyperlink_registry_dedups_and_reuses_ids() {
        let mut reg = HyperlinkRegistry::new(4);
        let id1 = reg.acquire("https://example.com").unwrap();
        let id2 = reg.acquire("https://example.com").unwrap();
        assert_eq!(id1, id2);
        reg.release(id1);
        reg.release(id2);
        assert_eq!(reg.get(id1), None);

        let reused = reg.acquire("https://other.example").unwrap();
        assert_eq!(reused, id1);
    }

    #[test]
    fn hyperlink_registry_same_link_across_registries() {
        let mut a = HyperlinkRegistry::new(4);
        let mut b = HyperlinkRegistry::new(4);
        let ida = a.acquire("https://x.test").unwrap();
        let idb = b.acquire("https://x.test").unwrap();
        assert!(a.same_link(ida, &b, idb));
    }

    #[test]
    fn grapheme_table_round_trips() {
        let mut table = GraphemeTable::new(4);
        let id = table.acquire(&['\u{0301}']).unwrap();
        assert_eq!(table.get(id), &['\u{0301}']);
        table.release(id);
        assert_eq!(table.get(id), &[] as &[char]);
    }
}
