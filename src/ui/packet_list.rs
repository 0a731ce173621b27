// Packet list rendering
//
// One row per ingested packet, in arrival order; table row number equals
// store index (row 0 is the header). Columns for absent layers stay
// blank. In Tail mode the selection is cleared and the scroll offset is
// pinned so the newest row is visible; in Select mode ratatui's table
// state follows the user's selection.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Row, Table},
    Frame,
};

use crate::app::{App, Mode, Panel};
use crate::decode::LayerType;

const COLUMNS: [&str; 7] = ["No.", "Time", "Flow", "Length", "Link", "Network", "Transport"];

pub fn render(f: &mut Frame, area: Rect, app: &mut App) {
    let store = app.store.lock().unwrap();
    let count = store.count();

    let rows: Vec<Row> = store
        .packets()
        .iter()
        .enumerate()
        .map(|(i, packet)| {
            Row::new(vec![
                (i + 1).to_string(),
                packet.timestamp_display(),
                packet.flow_descriptor().to_string(),
                packet.length.to_string(),
                layer_cell(packet.link_type()),
                layer_cell(packet.network_type()),
                layer_cell(packet.transport_type()),
            ])
        })
        .collect();
    drop(store);

    if app.mode == Mode::Tail {
        // not selectable while tailing; keep the newest row in view
        app.table_state.select(None);
        let visible = area.height.saturating_sub(3) as usize; // borders + header
        *app.table_state.offset_mut() = count.saturating_sub(visible);
    }

    let header = Row::new(COLUMNS.to_vec()).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let widths = [
        Constraint::Length(6),
        Constraint::Length(26),
        Constraint::Min(24),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(super::panel_block("Packets", app.focus == Panel::List))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn layer_cell(layer: Option<LayerType>) -> String {
    layer.map(|l| l.to_string()).unwrap_or_default()
}
