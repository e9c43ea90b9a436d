//! Cursor state and screen-level operations over a [`PageList`]'s active
//! area: the last `rows` rows of the list, the only part a VT screen
//! actually addresses directly.
//!
//! Scrolling the full screen (the common case — no restricted scroll
//! region) is implemented by appending a blank row to the underlying
//! `PageList`: the oldest visible row simply falls out of the active
//! window into scrollback, exactly matching a real terminal's behavior
//! without copying any cells. A restricted DECSTBM region, which must not
//! touch rows outside it, is instead handled by shifting cells directly
//! within the region.

use crate::cell::{Cell, CellContent, GraphemeId, HyperlinkId, Style, StyleId, WideMarker};
use crate::page::PageId;
use crate::page_list::PageList;

/// A single active-area charset slot (`designate` targets G0-G3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Ascii,
    DecSpecialGraphics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub row: usize,
    pub col: usize,
    /// Set after writing a printable character into the last column; the
    /// *next* printable write wraps first, per xterm's deferred-wrap rule.
    pub pending_wrap: bool,
    pub style: Style,
    pub hyperlink: String,
    pub charsets: [Charset; 4],
    pub active_charset: usize,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            style: Style::default(),
            hyperlink: String::new(),
            charsets: [Charset::Ascii; 4],
            active_charset: 0,
        }
    }
}

/// Inclusive scrolling region, 0-based within the active area (DECSTBM).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRegion {
    pub top: usize,
    pub bottom: usize,
}

pub struct Screen {
    pages: PageList,
    rows: usize,
    cols: usize,
    cursor: CursorState,
    saved_cursor: Option<CursorState>,
    region: ScrollRegion,
}

impl Screen {
    pub fn new(cols: usize, rows: usize) -> Self {
        let mut pages = PageList::new(cols);
        for _ in 0..rows {
            pages.append_row();
        }
        Self {
            pages,
            rows,
            cols,
            cursor: CursorState::default(),
            saved_cursor: None,
            region: ScrollRegion {
                top: 0,
                bottom: rows.saturating_sub(1),
            },
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    pub fn region(&self) -> ScrollRegion {
        self.region
    }

    pub fn page_list(&self) -> &PageList {
        &self.pages
    }

    pub fn page_list_mut(&mut self) -> &mut PageList {
        &mut self.pages
    }

    /// Active-area row ids, top to bottom, recomputed from the page list's
    /// tail. Cheap relative to terminal output volume: `rows` is a screen
    /// height (tens, not thousands).
    fn active_rows(&self) -> Vec<(PageId, usize)> {
        self.pages.tail_rows(self.rows)
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        let active = self.active_rows();
        let Some(&(page_id, page_row)) = active.get(row) else {
            return Cell::default();
        };
        self.pages
            .page(page_id)
            .and_then(|p| p.cell(page_row, col).copied())
            .unwrap_or_default()
    }

    fn write_active_cell(
        &mut self,
        row: usize,
        col: usize,
        content: CellContent,
        style: Style,
        hyperlink_uri: &str,
        wide: WideMarker,
    ) {
        let active = self.active_rows();
        let Some(&(page_id, page_row)) = active.get(row) else {
            return;
        };
        if let Some(page) = self.pages.page_mut(page_id) {
            let _ = page.write_cell(page_row, col, content, style, hyperlink_uri, wide);
        }
    }

    fn set_active_cell_raw(&mut self, row: usize, col: usize, cell: Cell) {
        let active = self.active_rows();
        let Some(&(page_id, page_row)) = active.get(row) else {
            return;
        };
        if let Some(page) = self.pages.page_mut(page_id) {
            let _ = page.set_cell_raw(page_row, col, cell);
        }
    }

    fn clear_active_row(&mut self, row: usize) {
        let active = self.active_rows();
        let Some(&(page_id, page_row)) = active.get(row) else {
            return;
        };
        if let Some(page) = self.pages.page_mut(page_id) {
            let _ = page.clear_row(page_row);
        }
    }

    /// Print a single grapheme's worth of content at the cursor, applying
    /// the deferred-wrap rule and wide-character spacer-tail placement.
    /// `width` is 1 or 2 (combining marks/zero-width joins should already
    /// have been folded into a `CodepointWithGrapheme` before calling this).
    pub fn print(&mut self, content: CellContent, width: u8) {
        if self.cursor.pending_wrap {
            self.wrap_to_next_line();
        }
        if width == 2 && self.cursor.col + 1 >= self.cols {
            // Wide char would straddle the row boundary: pad with a blank
            // spacer and wrap first instead of splitting the pair.
            self.write_active_cell(
                self.cursor.row,
                self.cursor.col,
                CellContent::Codepoint(' '),
                self.cursor.style,
                &self.cursor.hyperlink.clone(),
                WideMarker::SpacerTail,
            );
            self.wrap_to_next_line();
        }
        let style = self.cursor.style;
        let hyperlink = self.cursor.hyperlink.clone();
        let marker = if width == 2 {
            WideMarker::Wide
        } else {
            WideMarker::Narrow
        };
        self.write_active_cell(self.cursor.row, self.cursor.col, content, style, &hyperlink, marker);
        if width == 2 {
            self.write_active_cell(
                self.cursor.row,
                self.cursor.col + 1,
                CellContent::Codepoint(' '),
                style,
                &hyperlink,
                WideMarker::SpacerTail,
            );
        }
        let advance = width as usize;
        if self.cursor.col + advance >= self.cols {
            self.cursor.col = self.cols - 1;
            self.cursor.pending_wrap = true;
        } else {
            self.cursor.col += advance;
        }
    }

    fn wrap_to_next_line(&mut self) {
        let active = self.active_rows();
        if let Some(&(page_id, page_row)) = active.get(self.cursor.row) {
            if let Some(page) = self.pages.page_mut(page_id) {
                page.mark_wrapped(page_row);
            }
        }
        self.cursor.pending_wrap = false;
        self.cursor.col = 0;
        self.line_feed();
    }

    /// Move down one line, scrolling the scroll region if already at its
    /// bottom edge.
    pub fn line_feed(&mut self) {
        if self.cursor.row == self.region.bottom {
            self.scroll_up(1);
        } else if self.cursor.row + 1 < self.rows {
            self.cursor.row += 1;
        }
    }

    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// Scroll the scroll region up by `n` lines (content moves up, blank
    /// lines appear at the bottom of the region).
    pub fn scroll_up(&mut self, n: usize) {
        let full_screen = self.region.top == 0 && self.region.bottom == self.rows - 1;
        for _ in 0..n {
            if full_screen {
                self.pages.append_row();
            } else {
                self.shift_region_up();
            }
        }
    }

    fn shift_region_up(&mut self) {
        let top = self.region.top;
        let bottom = self.region.bottom;
        for row in top..bottom {
            for col in 0..self.cols {
                let src = self.cell(row + 1, col);
                self.set_active_cell_raw(row, col, src);
            }
        }
        self.clear_active_row(bottom);
    }

    /// Scroll the scroll region down by `n` lines (content moves down,
    /// blank lines appear at the top of the region).
    pub fn scroll_down(&mut self, n: usize) {
        for _ in 0..n {
            let top = self.region.top;
            let bottom = self.region.bottom;
            let mut row = bottom;
            while row > top {
                for col in 0..self.cols {
                    let src = self.cell(row - 1, col);
                    self.set_active_cell_raw(row, col, src);
                }
                row -= 1;
            }
            self.clear_active_row(top);
        }
    }

    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        if top < bottom && bottom < self.rows {
            self.region = ScrollRegion { top, bottom };
        } else {
            self.region = ScrollRegion {
                top: 0,
                bottom: self.rows - 1,
            };
        }
    }

    pub fn move_cursor_to(&mut self, row: usize, col: usize) {
        self.cursor.row = row.min(self.rows.saturating_sub(1));
        self.cursor.col = col.min(self.cols.saturating_sub(1));
        self.cursor.pending_wrap = false;
    }

    pub fn move_cursor_relative(&mut self, d_row: i32, d_col: i32) {
        let row = (self.cursor.row as i32 + d_row).clamp(0, self.rows as i32 - 1) as usize;
        let col = (self.cursor.col as i32 + d_col).clamp(0, self.cols as i32 - 1) as usize;
        self.cursor.row = row;
        self.cursor.col = col;
        self.cursor.pending_wrap = false;
    }

    pub fn set_style(&mut self, style: Style) {
        self.cursor.style = style;
    }

    pub fn set_hyperlink(&mut self, uri: String) {
        self.cursor.hyperlink = uri;
    }

    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(self.cursor);
    }

    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.saved_cursor {
            self.cursor = saved;
            self.cursor.row = self.cursor.row.min(self.rows.saturating_sub(1));
            self.cursor.col = self.cursor.col.min(self.cols.saturating_sub(1));
        }
    }

    /// Erase from the cursor to the end of display (`n==0`), start of
    /// display through the cursor (`n==1`), or the whole display (`n==2`),
    /// matching ED parameter semantics.
    pub fn erase_in_display(&mut self, mode: u16) {
        match mode {
            0 => {
                self.erase_in_line_from(self.cursor.row, self.cursor.col);
                for row in (self.cursor.row + 1)..self.rows {
                    self.clear_active_row(row);
                }
            }
            1 => {
                for row in 0..self.cursor.row {
                    self.clear_active_row(row);
                }
                self.erase_in_line_to(self.cursor.row, self.cursor.col);
            }
            _ => {
                for row in 0..self.rows {
                    self.clear_active_row(row);
                }
            }
        }
    }

    /// Erase within the cursor's line: to end (`0`), from start (`1`), or
    /// the whole line (`2`), matching EL parameter semantics.
    pub fn erase_in_line(&mut self, mode: u16) {
        match mode {
            0 => self.erase_in_line_from(self.cursor.row, self.cursor.col),
            1 => self.erase_in_line_to(self.cursor.row, self.cursor.col),
            _ => self.clear_active_row(self.cursor.row),
        }
    }

    fn erase_in_line_from(&mut self, row: usize, col: usize) {
        for c in col..self.cols {
            self.set_active_cell_raw(row, c, Cell::blank());
        }
    }

    fn erase_in_line_to(&mut self, row: usize, col: usize) {
        for c in 0..=col.min(self.cols.saturating_sub(1)) {
            self.set_active_cell_raw(row, c, Cell::blank());
        }
    }

    pub fn insert_lines(&mut self, n: usize) {
        if self.cursor.row < self.region.top || self.cursor.row > self.region.bottom {
            return;
        }
        let saved = self.region;
        self.region = ScrollRegion {
            top: self.cursor.row,
            bottom: saved.bottom,
        };
        self.scroll_down(n);
        self.region = saved;
    }

    pub fn delete_lines(&mut self, n: usize) {
        if self.cursor.row < self.region.top || self.cursor.row > self.region.bottom {
            return;
        }
        let saved = self.region;
        self.region = ScrollRegion {
            top: self.cursor.row,
            bottom: saved.bottom,
        };
        self.scroll_up(n);
        self.region = saved;
    }

    pub fn insert_chars(&mut self, n: usize) {
        let row = self.cursor.row;
        let start = self.cursor.col;
        if n == 0 || start >= self.cols {
            return;
        }
        let mut col = self.cols;
        while col > start + n {
            col -= 1;
            let src = self.cell(row, col - n);
            self.set_active_cell_raw(row, col, src);
        }
        for c in start..(start + n).min(self.cols) {
            self.set_active_cell_raw(row, c, Cell::blank());
        }
    }

    pub fn delete_chars(&mut self, n: usize) {
        let row = self.cursor.row;
        for c in self.cursor.col..self.cols {
            let src_col = c + n;
            let cell = if src_col < self.cols {
                self.cell(row, src_col)
            } else {
                Cell::blank()
            };
            self.set_active_cell_raw(row, c, cell);
        }
    }

    /// Fold a zero-width combining codepoint into whatever cell was printed
    /// last, turning it into (or extending) a `CodepointWithGrapheme`
    /// cluster rather than occupying a cell of its own. A no-op at the very
    /// start of a screen (cursor at 0,0, nothing printed yet) or when the
    /// target cell carries no glyph (a background-fill cell) — the mark is
    /// simply dropped, matching a real terminal's handling of a stray
    /// combining mark with nothing to attach to.
    pub fn combine_with_previous(&mut self, c: char) {
        let (row, col) = if self.cursor.pending_wrap {
            (self.cursor.row, self.cursor.col)
        } else if self.cursor.col > 0 {
            (self.cursor.row, self.cursor.col - 1)
        } else {
            return;
        };
        let active = self.active_rows();
        let Some(&(page_id, page_row)) = active.get(row) else {
            return;
        };
        let Some(page) = self.pages.page_mut(page_id) else {
            return;
        };
        let Some(&existing) = page.cell(page_row, col) else {
            return;
        };
        let mut codepoints = match existing.content {
            CellContent::Codepoint(ch) => vec![ch],
            CellContent::CodepointWithGrapheme(ch, gid) => {
                let cluster = page.grapheme(gid);
                if cluster.is_empty() {
                    vec![ch]
                } else {
                    cluster.to_vec()
                }
            }
            CellContent::RgbBg(..) | CellContent::PaletteBg(..) => return,
        };
        codepoints.push(c);
        let Ok(gid) = page.intern_grapheme(&codepoints) else {
            return;
        };
        let style = page.style(existing.style);
        let hyperlink = page.hyperlink_uri(existing.hyperlink).unwrap_or("").to_string();
        let content = CellContent::CodepointWithGrapheme(codepoints[0], gid);
        let _ = page.write_cell(page_row, col, content, style, &hyperlink, existing.wide);
    }

    pub fn designate_charset(&mut self, slot: usize, charset: Charset) {
        if let Some(s) = self.cursor.charsets.get_mut(slot) {
            *s = charset;
        }
    }

    pub fn shift_active_charset(&mut self, slot: usize) {
        self.cursor.active_charset = slot.min(3);
    }
}

// Re-export so callers constructing cells directly (DCS/OSC handlers) don't
// need a second `use` of the cell module.
pub use crate::cell::Cell as ScreenCell;
pub type ScreenStyleId = StyleId;
pub type ScreenHyperlinkId = HyperlinkId;
pub type ScreenGraphemeId = GraphemeId;
