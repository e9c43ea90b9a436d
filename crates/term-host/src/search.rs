//! Text search over a terminal's paged scrollback and over one rendered
//! viewport, plus a background thread that re-runs the search cooperatively
//! as new output arrives.
//!
//! No teacher file implements a VT-aware search; the sliding-window
//! substring matcher and the page-list traversal below are written
//! directly from this crate's own algorithmic requirements, while the
//! background-thread shape (a periodic, lock-bounded loop run from its own
//! `std::thread::JoinHandle`) follows the same idiom
//! `realAndi-Rain`'s `TmuxController` uses for its event-reader thread:
//! `parking_lot::Mutex`-guarded shared state, an `AtomicBool` stop flag
//! for control signaling, cooperative re-checks instead of blocking
//! forever.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use term_core::page::PageId;
use term_core::{PageList, Screen};

/// Refresh interval for the background search thread's cooperative loop:
/// roughly 40Hz, matching the render thread's cadence closely enough that
/// a search update never lags a full frame behind visibly.
pub const SEARCH_REFRESH_INTERVAL: Duration = Duration::from_millis(24);

/// One located occurrence of the search pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

/// A match located in page-list (scrollback) coordinates rather than
/// viewport-relative ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMatch {
    pub page: PageId,
    pub row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

/// Incremental, allocation-free (after construction) substring matcher fed
/// one character at a time. Holds exactly `pattern.len()` characters of
/// lookback, so a very long row never grows its buffer past the pattern's
/// own length.
pub struct SlidingWindow {
    pattern: Vec<char>,
    case_sensitive: bool,
    buffer: VecDeque<char>,
}

impl SlidingWindow {
    pub fn new(pattern: &str, case_sensitive: bool) -> Self {
        let pattern: Vec<char> = if case_sensitive {
            pattern.chars().collect()
        } else {
            pattern.chars().flat_map(|c| c.to_lowercase()).collect()
        };
        Self {
            buffer: VecDeque::with_capacity(pattern.len().max(1)),
            pattern,
            case_sensitive,
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Feed the next character of the row; returns `true` exactly when the
    /// character just pushed completes a match ending here.
    pub fn push(&mut self, c: char) -> bool {
        if self.pattern.is_empty() {
            return false;
        }
        let normalized = if self.case_sensitive {
            c
        } else {
            // Fold to the first lowercase char; good enough for the
            // single-codepoint case-insensitive matching this is used for.
            c.to_lowercase().next().unwrap_or(c)
        };
        self.buffer.push_back(normalized);
        if self.buffer.len() > self.pattern.len() {
            self.buffer.pop_front();
        }
        self.buffer.len() == self.pattern.len() && self.buffer.iter().eq(self.pattern.iter())
    }

    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }
}

/// Scan one row of text for every (possibly overlapping) occurrence of
/// `pattern`.
fn find_matches_in_row(row_text: &[char], pattern: &str, case_sensitive: bool) -> Vec<(usize, usize)> {
    let mut window = SlidingWindow::new(pattern, case_sensitive);
    let mut out = Vec::new();
    for (idx, &c) in row_text.iter().enumerate() {
        if window.push(c) {
            let len = window.pattern_len();
            out.push((idx + 1 - len, idx));
        }
    }
    out
}

/// Search restricted to the currently visible rows of a [`Screen`].
/// Cheap to run every time the viewport changes since it never touches
/// scrollback.
pub struct ViewportSearch {
    pattern: String,
    case_sensitive: bool,
    /// Identity fingerprint of the page/row pairs composing the viewport
    /// at the time `matches` was computed, so a caller can skip recompute
    /// when the fingerprint is unchanged — callers should note that page
    /// ids can in principle be reused after a very long run, so this is a
    /// "probably unchanged" signal, not an absolute guarantee.
    fingerprint: Vec<(PageId, usize)>,
    matches: Vec<SearchMatch>,
}

impl ViewportSearch {
    pub fn new(pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive,
            fingerprint: Vec::new(),
            matches: Vec::new(),
        }
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    /// Recompute matches against the screen's current viewport. Returns
    /// `false` without recomputing when the viewport's row identity
    /// fingerprint has not changed since the last call.
    pub fn refresh(&mut self, screen: &Screen) -> bool {
        let fingerprint = screen.page_list().tail_rows(screen.rows());
        if fingerprint == self.fingerprint {
            return false;
        }
        self.fingerprint = fingerprint;
        self.matches.clear();
        for row in 0..screen.rows() {
            let text: Vec<char> = (0..screen.cols())
                .map(|col| screen.cell(row, col))
                .filter(|c| !c.is_spacer_tail())
                .map(|c| c.primary_char())
                .collect();
            for (start, end) in find_matches_in_row(&text, &self.pattern, self.case_sensitive) {
                self.matches.push(SearchMatch {
                    row,
                    start_col: start,
                    end_col: end,
                });
            }
        }
        true
    }
}

/// Search across the entire page list, including scrollback outside the
/// active viewport. More expensive than [`ViewportSearch`]; intended to be
/// driven incrementally by [`SearchThread`] rather than recomputed on every
/// keystroke.
pub struct PageListSearch {
    pattern: String,
    case_sensitive: bool,
}

impl PageListSearch {
    pub fn new(pattern: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive,
        }
    }

    pub fn search(&self, pages: &PageList) -> Vec<PageMatch> {
        let mut out = Vec::new();
        for page in pages.pages() {
            for row_idx in 0..page.row_count() {
                let Some(row) = page.row(row_idx) else { continue };
                let text: Vec<char> = row
                    .cells()
                    .iter()
                    .filter(|c| !c.is_spacer_tail())
                    .map(|c| c.primary_char())
                    .collect();
                for (start, end) in find_matches_in_row(&text, &self.pattern, self.case_sensitive) {
                    out.push(PageMatch {
                        page: page.id(),
                        row: row_idx,
                        start_col: start,
                        end_col: end,
                    });
                }
            }
        }
        out
    }
}

/// The currently selected match within a [`PageListSearch`] result set, with
/// `next`/`previous` wraparound navigation.
pub struct ActiveSearch {
    matches: Vec<PageMatch>,
    current: Option<usize>,
}

impl ActiveSearch {
    pub fn new(matches: Vec<PageMatch>) -> Self {
        let current = if matches.is_empty() { None } else { Some(0) };
        Self { matches, current }
    }

    pub fn current(&self) -> Option<PageMatch> {
        self.current.map(|i| self.matches[i])
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn next(&mut self) -> Option<PageMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let next = self.current.map(|i| (i + 1) % self.matches.len()).unwrap_or(0);
        self.current = Some(next);
        self.current()
    }

    pub fn previous(&mut self) -> Option<PageMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let prev = self
            .current
            .map(|i| if i == 0 { self.matches.len() - 1 } else { i - 1 })
            .unwrap_or(0);
        self.current = Some(prev);
        self.current()
    }
}

/// Shared state a [`SearchThread`] publishes, read by the UI thread without
/// needing to join or poll the thread itself.
pub struct SearchState {
    pub matches: Mutex<Vec<PageMatch>>,
    pub generation: std::sync::atomic::AtomicU64,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            matches: Mutex::new(Vec::new()),
            generation: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

/// Runs [`PageListSearch`] on a fixed cadence ([`SEARCH_REFRESH_INTERVAL`])
/// in its own thread, publishing deduplicated results to a shared
/// [`SearchState`] rather than blocking the caller. `stop()` requests
/// cooperative shutdown; the loop checks its flag once per tick rather than
/// holding any lock across the sleep.
pub struct SearchThread {
    handle: Option<std::thread::JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
}

impl SearchThread {
    /// Spawn the cooperative loop. `run_search` is supplied by the caller
    /// and is expected to briefly lock the owning terminal, run a
    /// [`PageListSearch`] over its current page list, and return — mirroring
    /// the brief-lock-then-lock-free-use pattern `RenderState::capture`
    /// follows on the render side. Results are deduplicated against the
    /// previous tick so an unchanged scrollback never bumps `generation`.
    pub fn spawn(state: Arc<SearchState>, run_search: impl Fn() -> Vec<PageMatch> + Send + 'static) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = stop_flag.clone();
        let handle = std::thread::spawn(move || {
            while !thread_stop.load(Ordering::Relaxed) {
                let fresh = run_search();
                let changed = {
                    let current = state.matches.lock();
                    *current != fresh
                };
                if changed {
                    *state.matches.lock() = fresh;
                    state.generation.fetch_add(1, Ordering::Relaxed);
                }
                std::thread::sleep(SEARCH_REFRESH_INTERVAL);
            }
        });
        Self {
            handle: Some(handle),
            stop_flag,
        }
    }

    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use term_core::CellContent;

    #[test]
    fn sliding_window_finds_exact_match() {
        let mut w = SlidingWindow::new("ab", true);
        assert!(!w.push('x'));
        assert!(!w.push('a'));
        assert!(w.push('b'));
    }

    #[test]
    fn sliding_window_case_insensitive() {
        let mut w = SlidingWindow::new("AB", false);
        assert!(!w.push('a'));
        assert!(w.push('b'));
    }

    #[test]
    fn find_matches_in_row_detects_overlap() {
        let text: Vec<char> = "aaa".chars().collect();
        let matches = find_matches_in_row(&text, "aa", true);
        assert_eq!(matches, vec![(0, 1), (1, 2)]);
    }

    fn filled_screen(text: &str, cols: usize, rows: usize) -> Screen {
        let mut s = Screen::new(cols, rows);
        for (i, c) in text.chars().enumerate() {
            let row = i / cols;
            let col = i % cols;
            if row >= rows {
                break;
            }
            s.move_cursor_to(row, col);
            s.print(CellContent::Codepoint(c), 1);
        }
        s
    }

    #[test]
    fn viewport_search_finds_match_and_skips_recompute_when_unchanged() {
        let s = filled_screen("hello world", 20, 1);
        let mut search = ViewportSearch::new("world", true);
        assert!(search.refresh(&s));
        assert_eq!(search.matches().len(), 1);
        assert!(!search.refresh(&s));
    }

    #[test]
    fn active_search_wraps_forward_and_backward() {
        let matches = vec![
            PageMatch {
                page: PageId(0),
                row: 0,
                start_col: 0,
                end_col: 1,
            },
            PageMatch {
                page: PageId(0),
                row: 1,
                start_col: 0,
                end_col: 1,
            },
        ];
        let mut active = ActiveSearch::new(matches);
        assert_eq!(active.current().unwrap().row, 0);
        assert_eq!(active.next().unwrap().row, 1);
        assert_eq!(active.next().unwrap().row, 0);
        assert_eq!(active.previous().unwrap().row, 1);
    }

    #[test]
    fn page_list_search_finds_match_via_page_list() {
        // Each row is scanned independently, so place the whole pattern
        // within one row — matching text split across a row boundary is a
        // known limitation shared with `ViewportSearch`.
        let s = filled_screen("needle", 10, 3);
        let search = PageListSearch::new("needle", true);
        let matches = search.search(s.page_list());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].row, 0);
    }
}
