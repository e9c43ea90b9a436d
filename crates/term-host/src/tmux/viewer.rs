//! A higher-level client of the tmux control-mode DCS: consumes the
//! notifications `term_core::tmux_notify` parses, issues tmux commands as
//! opaque byte strings, and mirrors remote pane/window/layout state
//! locally.
//!
//! Grounded on the notification set already modeled in
//! `term_core::tmux_notify` and on the command-queue idiom
//! `realAndi-Rain`'s `TmuxController` uses to serialize one in-flight
//! command at a time against a single control-mode connection.

use std::collections::{HashMap, VecDeque};

use term_core::tmux_notify::TmuxNotification;

use super::layout::{self, Layout};

/// tmux sentinel for "no saved cursor position" in `list-panes` output —
/// tolerated and clamped to `None` rather than treated as a real
/// coordinate.
const MAX_INT_SENTINEL: i64 = i32::MAX as i64;

/// Default cap on buffered notification/command-reply bytes, inherited
/// from the DCS layer's own max-bytes protection.
pub const MAX_BUFFER_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    StartupBlock,
    StartupSession,
    CommandQueue,
    Defunct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PaneId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

/// Restored terminal-mode bits a pane's `list-panes` record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneModes {
    pub insert: bool,
    pub wraparound: bool,
    pub keypad: bool,
    pub cursor_keys_application: bool,
    pub origin: bool,
    pub mouse_standard: bool,
    pub mouse_button: bool,
    pub mouse_any: bool,
    pub focus_events: bool,
    pub bracketed_paste: bool,
}

/// Saved alternate-screen cursor position; `None` once a `MAX_INT` sentinel
/// has been clamped away.
pub type SavedCursor = Option<(u32, u32)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneState {
    pub id: PaneId,
    pub window: WindowId,
    pub width: u32,
    pub height: u32,
    pub cursor_x: u32,
    pub cursor_y: u32,
    pub cursor_visible: bool,
    pub alternate_screen: bool,
    pub saved_alt_cursor: SavedCursor,
    pub scroll_top: u32,
    pub scroll_bottom: u32,
    pub modes: PaneModes,
}

/// One outstanding command, tracked from issue to its terminating
/// `%begin`/`%end`/`%error` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub body: Vec<u8>,
}

/// An action the viewer wants its host to perform — issuing bytes on the
/// wire, feeding a remote pane's terminal, or updating UI-facing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerAction {
    /// Send this exact byte string as the next tmux command.
    SendCommand(Vec<u8>),
    /// Feed these raw VT bytes into the named pane's terminal stream (used
    /// both for live `%output` and for capture-pane restoration).
    FeedPane(PaneId, Vec<u8>),
    /// Clear the named pane's active area before re-feeding visible
    /// content during capture restoration.
    ClearPaneActiveArea(PaneId),
    /// Apply a restored pane-state record (cursor, modes, scroll region).
    ApplyPaneState(PaneState),
    /// The window list changed (possibly to empty, on a session reset).
    WindowsChanged(Vec<WindowId>),
    /// The viewer has transitioned to `defunct`; no further commands will
    /// be issued.
    Exited,
}

/// What a pane capture-restoration pass still needs to fetch, in the order
/// the spec requires: primary history, then primary visible, then
/// alternate history, then alternate visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureStage {
    PrimaryHistory,
    PrimaryVisible,
    AlternateHistory,
    AlternateVisible,
    Done,
}

struct PaneSync {
    stage: CaptureStage,
}

pub struct TmuxViewer {
    state: ViewerState,
    queue: VecDeque<PendingCommand>,
    in_flight: Option<PendingCommand>,
    block_buffer: Vec<u8>,
    panes: HashMap<PaneId, PaneState>,
    pane_sync: HashMap<PaneId, PaneSync>,
    windows: Vec<WindowId>,
    server_version: Option<String>,
}

impl Default for TmuxViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl TmuxViewer {
    pub fn new() -> Self {
        Self {
            state: ViewerState::StartupBlock,
            queue: VecDeque::new(),
            in_flight: None,
            block_buffer: Vec::new(),
            panes: HashMap::new(),
            pane_sync: HashMap::new(),
            windows: Vec::new(),
            server_version: None,
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn panes(&self) -> impl Iterator<Item = &PaneState> {
        self.panes.values()
    }

    pub fn windows(&self) -> &[WindowId] {
        &self.windows
    }

    /// Enter the session once control-mode's startup banner has been
    /// consumed, issuing the initial `list-windows` bootstrap.
    pub fn begin_session(&mut self) -> Vec<ViewerAction> {
        self.state = ViewerState::StartupSession;
        self.enqueue(b"list-windows -F \"#{window_id}\"".to_vec());
        self.advance_queue()
    }

    fn enqueue(&mut self, body: Vec<u8>) {
        self.queue.push_back(PendingCommand { body });
    }

    fn advance_queue(&mut self) -> Vec<ViewerAction> {
        if self.in_flight.is_some() || self.state == ViewerState::Defunct {
            return Vec::new();
        }
        let Some(cmd) = self.queue.pop_front() else {
            self.state = ViewerState::CommandQueue;
            return Vec::new();
        };
        self.state = ViewerState::CommandQueue;
        let action = ViewerAction::SendCommand(cmd.body.clone());
        self.in_flight = Some(cmd);
        vec![action]
    }

    /// Feed one parsed tmux control-mode notification and collect the
    /// resulting host-facing actions.
    pub fn on_notification(&mut self, notification: TmuxNotification) -> Vec<ViewerAction> {
        match notification {
            TmuxNotification::Begin { .. } => Vec::new(),
            TmuxNotification::End { .. } => self.complete_in_flight(),
            TmuxNotification::Error { .. } => self.complete_in_flight(),
            TmuxNotification::Output { pane_id, data } => {
                vec![ViewerAction::FeedPane(PaneId(pane_id), data)]
            }
            TmuxNotification::SessionChanged { .. } => self.reset_for_session_change(),
            TmuxNotification::SessionWindowChanged { .. } => {
                self.enqueue(b"list-windows -F \"#{window_id}\"".to_vec());
                self.advance_queue()
            }
            TmuxNotification::WindowAdd { .. } => {
                self.enqueue(b"list-windows -F \"#{window_id}\"".to_vec());
                self.advance_queue()
            }
            TmuxNotification::LayoutChange { window_id, layout, .. } => {
                self.sync_layout(window_id, &layout)
            }
            TmuxNotification::Exit { .. } => {
                self.state = ViewerState::Defunct;
                vec![ViewerAction::Exited]
            }
            _ => Vec::new(),
        }
    }

    fn complete_in_flight(&mut self) -> Vec<ViewerAction> {
        self.in_flight = None;
        self.advance_queue()
    }

    fn reset_for_session_change(&mut self) -> Vec<ViewerAction> {
        let preserved_version = self.server_version.take();
        self.panes.clear();
        self.pane_sync.clear();
        self.windows.clear();
        self.queue.clear();
        self.in_flight = None;
        self.server_version = preserved_version;
        self.enqueue(b"list-windows -F \"#{window_id}\"".to_vec());
        let mut actions = vec![ViewerAction::WindowsChanged(Vec::new())];
        actions.extend(self.advance_queue());
        actions
    }

    /// Re-parse a `%layout-change` payload and drive the diff/capture/
    /// list-panes pass the spec calls `syncLayouts`.
    fn sync_layout(&mut self, window_id: u32, layout_str: &str) -> Vec<ViewerAction> {
        let Ok(parsed) = layout::parse_with_checksum(layout_str).or_else(|_| layout::parse(layout_str)) else {
            return Vec::new();
        };
        let discovered = collect_leaf_pane_ids(&parsed);
        let mut actions = Vec::new();

        for &pane_id in &discovered {
            if !self.panes.contains_key(&pane_id) {
                self.pane_sync.insert(
                    pane_id,
                    PaneSync {
                        stage: CaptureStage::PrimaryHistory,
                    },
                );
                actions.extend(self.begin_pane_capture(pane_id));
            }
        }

        let vanished: Vec<PaneId> = self
            .panes
            .iter()
            .filter(|(id, state)| state.window == WindowId(window_id) && !discovered.contains(id))
            .map(|(id, _)| *id)
            .collect();
        for id in vanished {
            self.panes.remove(&id);
            self.pane_sync.remove(&id);
        }

        self.enqueue(b"list-panes -a -F \"#{pane_id} #{pane_width} #{pane_height}\"".to_vec());
        actions.extend(self.advance_queue());
        actions
    }

    fn begin_pane_capture(&mut self, pane_id: PaneId) -> Vec<ViewerAction> {
        self.enqueue(capture_command(pane_id, CaptureStage::PrimaryHistory));
        self.advance_queue()
    }

    /// Advance a pane's capture sequence after a capture command's reply
    /// has been delivered as `%output`/block text by the caller. Returns
    /// the next stage's command, if any remain.
    pub fn advance_pane_capture(&mut self, pane_id: PaneId) -> Vec<ViewerAction> {
        let Some(sync) = self.pane_sync.get_mut(&pane_id) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        sync.stage = match sync.stage {
            CaptureStage::PrimaryHistory => CaptureStage::PrimaryVisible,
            CaptureStage::PrimaryVisible => {
                actions.push(ViewerAction::ClearPaneActiveArea(pane_id));
                CaptureStage::AlternateHistory
            }
            CaptureStage::AlternateHistory => CaptureStage::AlternateVisible,
            CaptureStage::AlternateVisible | CaptureStage::Done => CaptureStage::Done,
        };
        if sync.stage != CaptureStage::Done {
            self.enqueue(capture_command(pane_id, sync.stage));
            actions.extend(self.advance_queue());
        }
        actions
    }

    /// Parse one `list-panes` record (the fixed delimited template the
    /// spec describes) and restore cursor, alternate-screen, scroll
    /// region, tab stops, and mode state from it.
    pub fn apply_pane_record(&mut self, record: &str) -> Vec<ViewerAction> {
        let Some(state) = parse_pane_record(record) else {
            return Vec::new();
        };
        self.panes.insert(state.id, state.clone());
        vec![ViewerAction::ApplyPaneState(state)]
    }
}

fn collect_leaf_pane_ids(layout: &Layout) -> Vec<PaneId> {
    let mut out = Vec::new();
    collect_leaf_pane_ids_into(layout, &mut out);
    out
}

fn collect_leaf_pane_ids_into(layout: &Layout, out: &mut Vec<PaneId>) {
    match layout {
        Layout::Leaf { pane_id: Some(id), .. } => out.push(PaneId(*id)),
        Layout::Leaf { pane_id: None, .. } => {}
        Layout::Horizontal { children, .. } | Layout::Vertical { children, .. } => {
            for child in children {
                collect_leaf_pane_ids_into(child, out);
            }
        }
    }
}

fn capture_command(pane_id: PaneId, stage: CaptureStage) -> Vec<u8> {
    let (history, alternate) = match stage {
        CaptureStage::PrimaryHistory => (true, false),
        CaptureStage::PrimaryVisible => (false, false),
        CaptureStage::AlternateHistory => (true, true),
        CaptureStage::AlternateVisible | CaptureStage::Done => (false, true),
    };
    let mut cmd = format!("capture-pane -p -t %{}", pane_id.0);
    if history {
        cmd.push_str(" -S -");
    }
    if alternate {
        cmd.push_str(" -a");
    }
    cmd.push_str(" -e");
    cmd.into_bytes()
}

/// Parse one `list-panes` delimited record. The real template is
/// configurable; this assumes the fixed field order the capture-restore
/// pass issues: `id width height cursor_x cursor_y cursor_visible
/// alt_screen saved_alt_x saved_alt_y scroll_top scroll_bottom insert
/// wrap keypad cursor_keys origin mouse_std mouse_btn mouse_any focus
/// paste window_id`.
fn parse_pane_record(record: &str) -> Option<PaneState> {
    let fields: Vec<&str> = record.split_whitespace().collect();
    if fields.len() < 21 {
        return None;
    }
    let pane_id = fields[0].trim_start_matches('%').parse().ok()?;
    let width = fields[1].parse().ok()?;
    let height = fields[2].parse().ok()?;
    let cursor_x = fields[3].parse().ok()?;
    let cursor_y = fields[4].parse().ok()?;
    let cursor_visible = fields[5] == "1";
    let alternate_screen = fields[6] == "1";
    let saved_alt_cursor = clamp_saved_cursor(fields[7].parse().ok()?, fields[8].parse().ok()?);
    let scroll_top = fields[9].parse().ok()?;
    let scroll_bottom = fields[10].parse().ok()?;
    let modes = PaneModes {
        insert: fields[11] == "1",
        wraparound: fields[12] == "1",
        keypad: fields[13] == "1",
        cursor_keys_application: fields[14] == "1",
        origin: fields[15] == "1",
        mouse_standard: fields[16] == "1",
        mouse_button: fields[17] == "1",
        mouse_any: fields[18] == "1",
        focus_events: fields[19] == "1",
        bracketed_paste: fields[20] == "1",
    };
    let window_id = fields.get(21).and_then(|f| f.parse().ok()).unwrap_or(0);

    Some(PaneState {
        id: PaneId(pane_id),
        window: WindowId(window_id),
        width,
        height,
        cursor_x,
        cursor_y,
        cursor_visible,
        alternate_screen,
        saved_alt_cursor,
        scroll_top,
        scroll_bottom,
        modes,
    })
}

fn clamp_saved_cursor(x: i64, y: i64) -> SavedCursor {
    if x >= MAX_INT_SENTINEL || y >= MAX_INT_SENTINEL || x < 0 || y < 0 {
        None
    } else {
        Some((x as u32, y as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_session_issues_list_windows() {
        let mut viewer = TmuxViewer::new();
        let actions = viewer.begin_session();
        assert_eq!(
            actions,
            vec![ViewerAction::SendCommand(b"list-windows -F \"#{window_id}\"".to_vec())]
        );
        assert_eq!(viewer.state(), ViewerState::CommandQueue);
    }

    #[test]
    fn only_one_command_in_flight_at_a_time() {
        let mut viewer = TmuxViewer::new();
        viewer.begin_session();
        viewer.enqueue(b"second".to_vec());
        // Second enqueue should not itself dispatch while the first is
        // still outstanding.
        assert!(viewer.in_flight.is_some());
        assert_eq!(viewer.queue.len(), 1);

        let actions = viewer.on_notification(TmuxNotification::End { timestamp: 0, cmd_number: 0 });
        assert_eq!(actions, vec![ViewerAction::SendCommand(b"second".to_vec())]);
    }

    #[test]
    fn session_changed_resets_panes_and_rebootstraps() {
        let mut viewer = TmuxViewer::new();
        viewer.begin_session();
        viewer.panes.insert(
            PaneId(1),
            PaneState {
                id: PaneId(1),
                window: WindowId(0),
                width: 80,
                height: 24,
                cursor_x: 0,
                cursor_y: 0,
                cursor_visible: true,
                alternate_screen: false,
                saved_alt_cursor: None,
                scroll_top: 0,
                scroll_bottom: 23,
                modes: PaneModes::default(),
            },
        );
        let actions = viewer.on_notification(TmuxNotification::SessionChanged {
            session_id: 1,
            name: "main".into(),
        });
        assert!(viewer.panes.is_empty());
        assert!(matches!(actions[0], ViewerAction::WindowsChanged(ref w) if w.is_empty()));
    }

    #[test]
    fn exit_notification_enters_defunct_and_stops_dispatch() {
        let mut viewer = TmuxViewer::new();
        viewer.begin_session();
        let actions = viewer.on_notification(TmuxNotification::Exit { reason: None });
        assert_eq!(actions, vec![ViewerAction::Exited]);
        assert_eq!(viewer.state(), ViewerState::Defunct);
    }

    #[test]
    fn pane_record_clamps_max_int_sentinel_cursor() {
        let record = format!(
            "%3 80 24 0 0 1 1 {} {} 0 23 0 1 0 0 0 0 0 0 0 0 2",
            i32::MAX,
            i32::MAX
        );
        let state = parse_pane_record(&record).unwrap();
        assert_eq!(state.saved_alt_cursor, None);
        assert_eq!(state.window, WindowId(2));
    }

    #[test]
    fn pane_record_keeps_real_saved_cursor() {
        let record = "%3 80 24 0 0 1 1 5 7 0 23 0 1 0 0 0 0 0 0 0 0 2";
        let state = parse_pane_record(record).unwrap();
        assert_eq!(state.saved_alt_cursor, Some((5, 7)));
    }

    #[test]
    fn layout_change_queues_captures_for_new_panes_then_list_panes() {
        let mut viewer = TmuxViewer::new();
        viewer.begin_session();
        viewer.complete_in_flight();
        let actions = viewer.on_notification(TmuxNotification::LayoutChange {
            window_id: 1,
            layout: "80x24,0,0,3".to_string(),
        });
        assert!(actions
            .iter()
            .any(|a| matches!(a, ViewerAction::SendCommand(cmd) if cmd.starts_with(b"capture-pane"))));
    }
}
