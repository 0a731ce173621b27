// Application state and the view/focus state machine
//
// All view-state mutation funnels through the methods here; key handlers
// in `event.rs` never poke fields directly. The packet store is shared
// with the ingestion thread behind a mutex, and the dirty flag tells the
// render loop that the table changed since the last draw.

pub mod config;
pub mod event;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ratatui::widgets::TableState;

use crate::capture::SourceError;
use crate::store::PacketStore;

/// Viewing mode.
///
/// Tail follows the newest ingested packet and the table is not
/// selectable; Select hands scrolling and row selection to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Tail,
    Select,
}

/// Focusable panels, in rotation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    List,
    Detail,
    Dump,
}

impl Panel {
    pub const ORDER: [Panel; 3] = [Panel::List, Panel::Detail, Panel::Dump];

    /// Next panel in rotation, wrapping after the last.
    pub fn next(self) -> Panel {
        let idx = Panel::ORDER
            .iter()
            .position(|p| *p == self)
            .expect("focused panel missing from rotation order");
        Panel::ORDER[(idx + 1) % Panel::ORDER.len()]
    }
}

/// Main application state.
pub struct App {
    /// Render loop keeps going while this is true.
    pub running: bool,
    pub mode: Mode,
    pub focus: Panel,

    /// Packet store, shared with the ingestion thread.
    pub store: Arc<Mutex<PacketStore>>,
    /// Set on every ingest and key action, cleared by the redraw.
    pub dirty: Arc<AtomicBool>,
    /// Raised on stop or capture failure; gates ingestion writes.
    pub shutdown: Arc<AtomicBool>,
    /// Capture failure deposited by the ingestion thread, surfaced as a
    /// nonzero exit after terminal teardown.
    pub failure: Arc<Mutex<Option<SourceError>>>,

    /// Table scroll/selection state. In Tail mode nothing is selected and
    /// the offset is pinned to the newest row during rendering.
    pub table_state: TableState,

    pub detail_text: String,
    pub dump_text: String,
    pub detail_scroll: u16,
    pub dump_scroll: u16,

    /// Capture origin shown in the status bar.
    pub source_desc: String,
}

impl App {
    pub fn new(source_desc: String) -> Self {
        Self {
            running: true,
            mode: Mode::Tail,
            focus: Panel::List,
            store: Arc::new(Mutex::new(PacketStore::new())),
            dirty: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            failure: Arc::new(Mutex::new(None)),
            table_state: TableState::default(),
            detail_text: String::new(),
            dump_text: String::new(),
            detail_scroll: 0,
            dump_scroll: 0,
            source_desc,
        }
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Consume the pending-redraw condition. At most one draw per tick no
    /// matter how many ingests happened in between.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Terminal transition: exit the render loop and stop ingestion
    /// writes.
    pub fn stop(&mut self) {
        self.running = false;
        self.shutdown.store(true, Ordering::Release);
    }

    /// Currently selected row, 1-based.
    pub fn selected_row(&self) -> Option<usize> {
        self.table_state.selected().map(|idx| idx + 1)
    }

    /// Tail -> Select. Selection is recomputed fresh on every entry: the
    /// row right after the current scroll offset. With an empty store the
    /// selection part is a no-op but the mode still switches.
    pub fn enter_select(&mut self) {
        self.mode = Mode::Select;

        let count = self.store.lock().unwrap().count();
        if count == 0 {
            self.table_state.select(None);
            return;
        }

        let row = (self.table_state.offset() + 1).min(count);
        self.table_state.select(Some(row - 1));
        self.display_detail(row);
    }

    /// Select -> Tail. Auto-scroll to the newest row resumes on the next
    /// draw.
    pub fn leave_select(&mut self) {
        if self.mode != Mode::Select {
            return;
        }
        self.mode = Mode::Tail;
        self.table_state.select(None);
    }

    /// Tab: cycle panel focus. Never changes the mode.
    pub fn rotate_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Enter while the list is focused: switch to Select, or re-populate
    /// the panes for the highlighted row.
    pub fn activate(&mut self) {
        if self.focus != Panel::List {
            return;
        }
        match self.mode {
            Mode::Tail => self.enter_select(),
            Mode::Select => {
                if let Some(row) = self.selected_row() {
                    self.display_detail(row);
                }
            }
        }
    }

    fn move_selection(&mut self, row: usize) {
        let count = self.store.lock().unwrap().count();
        if row < 1 || row > count {
            return;
        }
        self.table_state.select(Some(row - 1));
        self.display_detail(row);
    }

    /// Populate detail and dump panes for `row`. Out-of-range rows are a
    /// no-op: the panes keep their previous content.
    pub fn display_detail(&mut self, row: usize) {
        let store = self.store.lock().unwrap();
        let Ok(packet) = store.get(row) else {
            return;
        };
        tracing::debug!(row, summary = %packet.summary, "packet selected");
        let detail = packet.detail.clone();
        let dump = packet.dump.clone();
        drop(store);

        self.detail_text = detail;
        self.dump_text = dump;
        self.detail_scroll = 0;
        self.dump_scroll = 0;
    }

    /// Up, dispatched by the focused panel.
    pub fn scroll_up(&mut self) {
        match self.focus {
            Panel::List => {
                if self.mode == Mode::Select {
                    if let Some(row) = self.selected_row() {
                        self.move_selection(row.saturating_sub(1));
                    }
                }
            }
            Panel::Detail => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            Panel::Dump => self.dump_scroll = self.dump_scroll.saturating_sub(1),
        }
    }

    /// Down, dispatched by the focused panel.
    pub fn scroll_down(&mut self) {
        match self.focus {
            Panel::List => {
                if self.mode == Mode::Select {
                    if let Some(row) = self.selected_row() {
                        self.move_selection(row + 1);
                    }
                }
            }
            Panel::Detail => {
                self.detail_scroll = self
                    .detail_scroll
                    .saturating_add(1)
                    .min(last_line(&self.detail_text));
            }
            Panel::Dump => {
                self.dump_scroll = self
                    .dump_scroll
                    .saturating_add(1)
                    .min(last_line(&self.dump_text));
            }
        }
    }

    /// `g`: jump to the top of the focused panel.
    pub fn jump_top(&mut self) {
        match self.focus {
            Panel::List => {
                if self.mode == Mode::Select {
                    self.move_selection(1);
                }
            }
            Panel::Detail => self.detail_scroll = 0,
            Panel::Dump => self.dump_scroll = 0,
        }
    }

    /// `G`: jump to the end of the focused panel.
    pub fn jump_bottom(&mut self) {
        match self.focus {
            Panel::List => {
                if self.mode == Mode::Select {
                    let count = self.store.lock().unwrap().count();
                    self.move_selection(count);
                }
            }
            Panel::Detail => self.detail_scroll = last_line(&self.detail_text),
            Panel::Dump => self.dump_scroll = last_line(&self.dump_text),
        }
    }
}

fn last_line(text: &str) -> u16 {
    (text.lines().count().saturating_sub(1)).min(u16::MAX as usize) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::tests::ipv4_tcp_packet;
    use proptest::prelude::*;

    fn app_with_packets(count: usize) -> App {
        let app = App::new("test".into());
        {
            let mut store = app.store.lock().unwrap();
            for _ in 0..count {
                store.append(ipv4_tcp_packet());
            }
        }
        app
    }

    #[test]
    fn test_initial_state() {
        let app = App::new("test".into());
        assert!(app.running);
        assert_eq!(app.mode, Mode::Tail);
        assert_eq!(app.focus, Panel::List);
        assert_eq!(app.selected_row(), None);
    }

    #[test]
    fn test_enter_select_with_packets() {
        let mut app = app_with_packets(5);
        app.enter_select();
        assert_eq!(app.mode, Mode::Select);
        // offset 0 before any draw, so the first row is selected
        assert_eq!(app.selected_row(), Some(1));
        assert!(!app.detail_text.is_empty());
        assert!(!app.dump_text.is_empty());
    }

    #[test]
    fn test_enter_select_empty_store_still_transitions() {
        let mut app = app_with_packets(0);
        app.enter_select();
        assert_eq!(app.mode, Mode::Select);
        assert_eq!(app.selected_row(), None);
        assert!(app.detail_text.is_empty());
    }

    #[test]
    fn test_selection_recomputed_on_reentry() {
        let mut app = app_with_packets(10);
        app.enter_select();
        app.move_selection(7);
        assert_eq!(app.selected_row(), Some(7));

        app.leave_select();
        assert_eq!(app.mode, Mode::Tail);
        assert_eq!(app.selected_row(), None);

        // re-entry selects from the scroll offset, not the old selection
        app.enter_select();
        assert_eq!(app.selected_row(), Some(app.table_state.offset() + 1));
    }

    #[test]
    fn test_out_of_range_selection_is_noop() {
        let mut app = app_with_packets(3);
        app.enter_select();
        let before = app.detail_text.clone();

        app.move_selection(0);
        assert_eq!(app.selected_row(), Some(1));
        app.move_selection(4);
        assert_eq!(app.selected_row(), Some(1));
        assert_eq!(app.detail_text, before);
    }

    #[test]
    fn test_display_detail_idempotent() {
        let mut app = app_with_packets(3);
        app.enter_select();
        app.display_detail(2);
        let detail = app.detail_text.clone();
        let dump = app.dump_text.clone();
        app.display_detail(2);
        assert_eq!(app.detail_text, detail);
        assert_eq!(app.dump_text, dump);
    }

    #[test]
    fn test_display_detail_resets_scroll() {
        let mut app = app_with_packets(2);
        app.enter_select();
        app.focus = Panel::Dump;
        app.scroll_down();
        assert!(app.dump_scroll > 0);

        app.display_detail(2);
        assert_eq!(app.detail_scroll, 0);
        assert_eq!(app.dump_scroll, 0);
    }

    #[test]
    fn test_focus_rotation_order() {
        let mut app = App::new("test".into());
        app.rotate_focus();
        assert_eq!(app.focus, Panel::Detail);
        app.rotate_focus();
        assert_eq!(app.focus, Panel::Dump);
        app.rotate_focus();
        assert_eq!(app.focus, Panel::List);
    }

    #[test]
    fn test_focus_rotation_keeps_mode() {
        let mut app = app_with_packets(1);
        app.enter_select();
        app.rotate_focus();
        assert_eq!(app.mode, Mode::Select);
        app.leave_select();
        app.rotate_focus();
        assert_eq!(app.mode, Mode::Tail);
    }

    #[test]
    fn test_tail_ignores_selection_movement() {
        let mut app = app_with_packets(3);
        app.scroll_down();
        app.scroll_up();
        assert_eq!(app.selected_row(), None);
    }

    #[test]
    fn test_ingested_packets_keep_flow_and_order() {
        let app = app_with_packets(3);
        let store = app.store.lock().unwrap();
        assert_eq!(store.count(), 3);
        let third = store.get(3).unwrap();
        assert_ne!(third.flow_descriptor(), "-");
    }

    #[test]
    fn test_stop_raises_shutdown() {
        let mut app = App::new("test".into());
        app.stop();
        assert!(!app.running);
        assert!(app.shutdown.load(Ordering::Acquire));
    }

    #[test]
    fn test_take_dirty_coalesces() {
        let app = App::new("test".into());
        app.mark_dirty();
        app.mark_dirty();
        app.mark_dirty();
        assert!(app.take_dirty());
        assert!(!app.take_dirty());
    }

    proptest! {
        /// Focus rotation is cyclic with period 3 from any starting panel.
        #[test]
        fn prop_focus_rotation_period_three(start in 0usize..3, steps in 0usize..30) {
            let panel = Panel::ORDER[start];
            let mut rotated = panel;
            for _ in 0..steps {
                rotated = rotated.next();
            }
            let expected = Panel::ORDER[(start + steps) % 3];
            prop_assert_eq!(rotated, expected);
            prop_assert_eq!(panel.next().next().next(), panel);
        }

        /// Entering Select always lands on a valid row when the store is
        /// non-empty, and selection movement never escapes `[1, count]`.
        #[test]
        fn prop_selection_stays_in_range(
            count in 1usize..40,
            moves in proptest::collection::vec(0usize..45, 0..20),
        ) {
            let mut app = app_with_packets(count);
            app.enter_select();
            let row = app.selected_row().unwrap();
            prop_assert!(row >= 1 && row <= count);

            for target in moves {
                app.move_selection(target);
                let row = app.selected_row().unwrap();
                prop_assert!(row >= 1 && row <= count);
            }
        }
    }
}
