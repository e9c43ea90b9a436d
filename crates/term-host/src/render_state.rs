//! A minimal-lock-time snapshot of a terminal's active area, plus the
//! none/partial/full dirty-verdict comparison a renderer uses to decide how
//! much of the screen actually needs repainting.
//!
//! Loosely grounded on the *concept* of `ftui-render::diff`'s dirty-tile
//! tracking (`TileDiffPlan`/`TileDiffStats`), simplified from tile-grained
//! GPU diffing down to a cell-grained, allocation-light snapshot comparison
//! appropriate for a host with no rendering backend of its own.

use term_core::{Cell, Screen};

/// How much of the screen changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyVerdict {
    None,
    /// The 0-based row indices that differ.
    Partial(Vec<usize>),
    Full,
}

/// An immutable pull of a screen's current cell contents. Capturing is
/// `O(rows * cols)` but touches the terminal's lock only for that single
/// read, matching the "brief lock then lock-free use" rule the render
/// thread follows.
#[derive(Clone)]
pub struct RenderState {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
    /// Per-row soft-wrap flag, captured alongside the cells so `string`
    /// can tell a hard row break from a continuation without going back
    /// to the `Screen`.
    row_wrapped: Vec<bool>,
    generation: u64,
}

impl RenderState {
    pub fn capture(screen: &Screen, generation: u64) -> Self {
        let cols = screen.cols();
        let rows = screen.rows();
        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(screen.cell(row, col));
            }
        }
        let row_wrapped = screen
            .page_list()
            .tail_rows(rows)
            .into_iter()
            .map(|(page_id, page_row)| {
                screen
                    .page_list()
                    .page(page_id)
                    .and_then(|p| p.row(page_row))
                    .map(|r| r.wrapped)
                    .unwrap_or(false)
            })
            .collect();
        Self {
            cols,
            rows,
            cells,
            row_wrapped,
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[row * self.cols + col]
    }

    /// Compare against a prior snapshot. A dimension change is always
    /// `Full` since row/col indices no longer line up; otherwise the rows
    /// whose cells differ are reported, or `None` if nothing changed.
    pub fn diff(&self, previous: &RenderState) -> DirtyVerdict {
        if self.cols != previous.cols || self.rows != previous.rows {
            return DirtyVerdict::Full;
        }
        let mut dirty_rows = Vec::new();
        for row in 0..self.rows {
            let start = row * self.cols;
            let end = start + self.cols;
            if self.cells[start..end] != previous.cells[start..end] {
                dirty_rows.push(row);
            }
        }
        if dirty_rows.is_empty() {
            DirtyVerdict::None
        } else if dirty_rows.len() == self.rows {
            DirtyVerdict::Full
        } else {
            DirtyVerdict::Partial(dirty_rows)
        }
    }

    /// The whole snapshot's text, ancillary to the cell grid — used by
    /// callers that want plain text rather than cell-by-cell styling
    /// (status lines, accessibility readers, link/search targeting).
    /// Empty cells (still at `Cell::default()`) emit U+0000 rather than a
    /// space; spacer-tail cells are skipped since they carry no glyph of
    /// their own. Rows emit a trailing `\n` unless the row is soft-wrapped,
    /// so a wrapped logical line reads back as one unbroken line.
    pub fn string(&self) -> String {
        self.string_with_map().0
    }

    /// Same as [`Self::string`], but also returns a byte-to-cell map: for
    /// every byte of the returned string, the `(row, col)` of the cell it
    /// came from (a row's trailing `\n`, where present, maps to `(row,
    /// cols)` as a sentinel past the last real column). Used to translate
    /// a byte offset in a search/selection match back to a screen
    /// coordinate.
    pub fn string_with_map(&self) -> (String, Vec<(usize, usize)>) {
        let mut text = String::new();
        let mut map = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = self.cell(row, col);
                if cell.is_spacer_tail() {
                    continue;
                }
                let ch = if cell == Cell::default() { '\0' } else { cell.primary_char() };
                text.push(ch);
                for _ in 0..ch.len_utf8() {
                    map.push((row, col));
                }
            }
            if !self.row_wrapped[row] {
                text.push('\n');
                map.push((row, self.cols));
            }
        }
        (text, map)
    }

    /// All cell coordinates sharing the hyperlink of the cell at `point`,
    /// used to paint or hit-test a link's full extent without re-walking
    /// the whole grid per query. Returns an empty list if `point` is out
    /// of bounds or not part of a hyperlink.
    pub fn link_cells(&self, point: (usize, usize)) -> Vec<(usize, usize)> {
        let (row, col) = point;
        if row >= self.rows || col >= self.cols {
            return Vec::new();
        }
        let hyperlink_id = self.cell(row, col).hyperlink;
        if hyperlink_id == 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.cell(row, col).hyperlink == hyperlink_id {
                    out.push((row, col));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use term_core::CellContent;

    #[test]
    fn identical_snapshots_diff_to_none() {
        let screen = Screen::new(5, 2);
        let a = RenderState::capture(&screen, 0);
        let b = RenderState::capture(&screen, 1);
        assert_eq!(a.diff(&b), DirtyVerdict::None);
    }

    #[test]
    fn single_row_edit_is_partial() {
        let mut screen = Screen::new(5, 3);
        let before = RenderState::capture(&screen, 0);
        screen.move_cursor_to(1, 0);
        screen.print(CellContent::Codepoint('x'), 1);
        let after = RenderState::capture(&screen, 1);
        assert_eq!(after.diff(&before), DirtyVerdict::Partial(vec![1]));
    }

    #[test]
    fn string_skips_spacer_tail_and_nuls_empty_cells() {
        let mut screen = Screen::new(5, 1);
        screen.print(CellContent::Codepoint('\u{4e2d}'), 2);
        let snap = RenderState::capture(&screen, 0);
        assert_eq!(snap.string(), "中\u{0}\u{0}\u{0}\n");
    }

    #[test]
    fn string_omits_newline_for_a_wrapped_row() {
        let mut screen = Screen::new(3, 2);
        screen.print(CellContent::Codepoint('a'), 1);
        screen.print(CellContent::Codepoint('b'), 1);
        screen.print(CellContent::Codepoint('c'), 1);
        screen.print(CellContent::Codepoint('d'), 1);
        let snap = RenderState::capture(&screen, 0);
        assert_eq!(snap.string(), "abcd\u{0}\u{0}\n");
    }

    #[test]
    fn string_with_map_tracks_one_entry_per_byte() {
        let mut screen = Screen::new(5, 1);
        screen.print(CellContent::Codepoint('\u{4e2d}'), 2);
        let snap = RenderState::capture(&screen, 0);
        let (text, map) = snap.string_with_map();
        assert_eq!(text.len(), map.len());
        assert_eq!(map[0], (0, 0));
        assert_eq!(map[3], (0, 2));
    }

    #[test]
    fn link_cells_out_of_bounds_is_empty() {
        let screen = Screen::new(5, 1);
        let snap = RenderState::capture(&screen, 0);
        assert!(snap.link_cells((0, 99)).is_empty());
        assert!(snap.link_cells((0, 0)).is_empty());
    }
}
