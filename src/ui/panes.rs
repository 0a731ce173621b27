// Detail and dump panes
//
// Both show the packet picked in Select mode: the multi-line decoded
// representation and the hex/ASCII dump. Content is repopulated by the
// state machine; here we only render the stored text at its scroll
// position.

use ratatui::{layout::Rect, widgets::Paragraph, Frame};

use crate::app::{App, Panel};

pub fn render_detail(f: &mut Frame, area: Rect, app: &App) {
    let pane = Paragraph::new(app.detail_text.as_str())
        .block(super::panel_block("Detail", app.focus == Panel::Detail))
        .scroll((app.detail_scroll, 0));
    f.render_widget(pane, area);
}

pub fn render_dump(f: &mut Frame, area: Rect, app: &App) {
    let pane = Paragraph::new(app.dump_text.as_str())
        .block(super::panel_block("Dump", app.focus == Panel::Dump))
        .scroll((app.dump_scroll, 0));
    f.render_widget(pane, area);
}
