//! A bounded-capacity arena of rows, the unit the active area and
//! scrollback of a [`crate::page_list::PageList`] are built from.
//!
//! A page owns its own style, grapheme and hyperlink intern tables — they
//! never span a page boundary — so splitting the terminal's history into
//! pages keeps any single table from growing without bound over a very long
//! scrollback. `#![forbid(unsafe_code)]` rules out the pointer-chasing arena
//! the term "arena-backed" usually implies; a page is instead a plain `Vec`
//! of rows addressed by index, with a stable monotonic id so a
//! [`crate::page_list::Pin`] can survive rows being pushed or pruned around it.

use crate::cell::{Cell, CellContent, GraphemeTable, HyperlinkRegistry, Style, StyleTable};
use crate::error::PageError;

/// Stable identity for a page, monotonically increasing for the lifetime of
/// the owning [`crate::page_list::PageList`]. Never reused, so a pin that
/// records a `PageId` can always tell a pruned page from a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub u64);

/// One row of cells plus the per-row flags VT needs (soft-wrap continuation,
/// whether the line was ever written past its logical end).
#[derive(Debug, Clone)]
pub struct Row {
    cells: Vec<Cell>,
    /// Set when the line wrapped from a write at the last column rather
    /// than from an explicit newline — needed to reflow/re-join text when
    /// extracting a logical line that spans rows.
    pub wrapped: bool,
}

impl Row {
    fn blank(cols: usize) -> Self {
        Self {
            cells: vec![Cell::blank(); cols],
            wrapped: false,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Default per-page row capacity and intern-table sizes. A page this size
/// holds roughly one screenful plus slack before a `PageList` starts a new
/// one; matches the "bounded, not unbounded" framing of the scrollback the
/// teacher's `Scrollback` type uses, generalized to a chain of pages.
pub const DEFAULT_PAGE_ROW_CAPACITY: usize = 512;
pub const DEFAULT_STYLE_CAPACITY: usize = 256;
pub const DEFAULT_HYPERLINK_CAPACITY: usize = 128;
pub const DEFAULT_GRAPHEME_CAPACITY: usize = 256;

/// A fixed-width, bounded-row arena with its own interned style, grapheme,
/// and hyperlink tables.
pub struct Page {
    id: PageId,
    cols: usize,
    row_capacity: usize,
    rows: Vec<Row>,
    styles: StyleTable,
    graphemes: GraphemeTable,
    hyperlinks: HyperlinkRegistry,
}

impl Page {
    pub fn new(id: PageId, cols: usize, row_capacity: usize) -> Self {
        Self {
            id,
            cols,
            row_capacity: row_capacity.max(1),
            rows: Vec::new(),
            styles: StyleTable::new(DEFAULT_STYLE_CAPACITY),
            graphemes: GraphemeTable::new(DEFAULT_GRAPHEME_CAPACITY),
            hyperlinks: HyperlinkRegistry::new(DEFAULT_HYPERLINK_CAPACITY),
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_capacity(&self) -> usize {
        self.row_capacity
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.row_capacity
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.cell(col))
    }

    pub fn grapheme(&self, id: u32) -> &[char] {
        self.graphemes.get(id)
    }

    pub fn hyperlink_uri(&self, id: u32) -> Option<&str> {
        self.hyperlinks.get(id)
    }

    pub fn style(&self, id: crate::cell::StyleId) -> Style {
        self.styles.get(id)
    }

    /// Append a blank row, failing when the page is already at capacity —
    /// the caller (the owning `PageList`) must start a new page instead.
    pub fn push_row(&mut self) -> Result<usize, PageError> {
        if self.is_full() {
            return Err(PageError::OutOfBounds);
        }
        self.rows.push(Row::blank(self.cols));
        Ok(self.rows.len() - 1)
    }

    pub fn mark_wrapped(&mut self, row: usize) {
        if let Some(r) = self.rows.get_mut(row) {
            r.wrapped = true;
        }
    }

    /// Write a single cell's style-bearing content. The grapheme id (when
    /// `content` is `CodepointWithGrapheme`) must already have been
    /// allocated by the caller via [`Page::intern_grapheme`].
    pub fn write_cell(
        &mut self,
        row: usize,
        col: usize,
        content: CellContent,
        style: Style,
        hyperlink_uri: &str,
        wide: crate::cell::WideMarker,
    ) -> Result<(), PageError> {
        if col >= self.cols {
            return Err(PageError::OutOfBounds);
        }
        let style_id = self.styles.acquire(style)?;
        let hyperlink_id = self.hyperlinks.acquire(hyperlink_uri)?;
        let row_ref = self.rows.get_mut(row).ok_or(PageError::OutOfBounds)?;
        let old = row_ref.cells[col];
        row_ref.cells[col] = Cell {
            content,
            wide,
            style: style_id,
            hyperlink: hyperlink_id,
        };
        self.styles.release(old.style);
        self.hyperlinks.release(old.hyperlink);
        if let CellContent::CodepointWithGrapheme(_, gid) = old.content {
            self.graphemes.release(gid);
        }
        Ok(())
    }

    /// Overwrite a cell with an already-resolved `Cell` (used when copying
    /// cells verbatim across rows — scroll, insert-line, erase-with-fill —
    /// where the style/hyperlink ids are already valid in this page).
    pub fn set_cell_raw(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), PageError> {
        if col >= self.cols {
            return Err(PageError::OutOfBounds);
        }
        let row_ref = self.rows.get_mut(row).ok_or(PageError::OutOfBounds)?;
        let old = row_ref.cells[col];
        self.styles.retain(cell.style);
        self.hyperlinks.retain(cell.hyperlink);
        row_ref.cells[col] = cell;
        self.styles.release(old.style);
        self.hyperlinks.release(old.hyperlink);
        Ok(())
    }

    pub fn intern_grapheme(&mut self, codepoints: &[char]) -> Result<u32, PageError> {
        self.graphemes.acquire(codepoints)
    }

    /// Clear a row back to blank cells, releasing every interned reference
    /// it held.
    pub fn clear_row(&mut self, row: usize) -> Result<(), PageError> {
        let cols = self.cols;
        let row_ref = self.rows.get_mut(row).ok_or(PageError::OutOfBounds)?;
        for cell in row_ref.cells.drain(..).collect::<Vec<_>>() {
            self.styles.release(cell.style);
            self.hyperlinks.release(cell.hyperlink);
            if let CellContent::CodepointWithGrapheme(_, gid) = cell.content {
                self.graphemes.release(gid);
            }
        }
        let row_ref = &mut self.rows[row];
        row_ref.cells = vec![Cell::blank(); cols];
        row_ref.wrapped = false;
        Ok(())
    }

    pub fn style_table_len(&self) -> usize {
        self.styles.len()
    }

    pub fn hyperlink_table_len(&self) -> usize {
        self.hyperlinks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{StyleFlags, WideMarker};

    fn page() -> Page {
        Page::new(PageId(0), 10, 4)
    }

    #[test]
    fn push_row_respects_capacity() {
        let mut p = page();
        for _ in 0..4 {
            p.push_row().unwrap();
        }
        assert!(p.is_full());
        assert_eq!(p.push_row(), Err(PageError::OutOfBounds));
    }

    #[test]
    fn write_cell_interns_style_and_releases_old() {
        let mut p = page();
        p.push_row().unwrap();
        let bold = Style {
            flags: StyleFlags::BOLD,
            ..Style::default()
        };
        p.write_cell(0, 0, CellContent::Codepoint('x'), bold, "", WideMarker::Narrow)
            .unwrap();
        assert_eq!(p.style_table_len(), 2); // default + bold
        p.write_cell(0, 0, CellContent::Codepoint('y'), Style::default(), "", WideMarker::Narrow)
            .unwrap();
        assert_eq!(p.style_table_len(), 1); // bold released back down
    }

    #[test]
    fn write_cell_out_of_bounds() {
        let mut p = page();
        p.push_row().unwrap();
        assert_eq!(
            p.write_cell(0, 99, CellContent::Codepoint('x'), Style::default(), "", WideMarker::Narrow),
            Err(PageError::OutOfBounds)
        );
    }

    #[test]
    fn clear_row_releases_hyperlink() {
        let mut p = page();
        p.push_row().unwrap();
        p.write_cell(
            0,
            0,
            CellContent::Codepoint('x'),
            Style::default(),
            "https://example.com",
            WideMarker::Narrow,
        )
        .unwrap();
        assert_eq!(p.hyperlink_table_len(), 1);
        p.clear_row(0).unwrap();
        assert_eq!(p.hyperlink_table_len(), 0);
    }
}
