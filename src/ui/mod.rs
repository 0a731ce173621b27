// UI rendering module
//
// draw() lays out the three packet panels plus the status area and hands
// each to its renderer. Rendering is the only place that touches the
// terminal, and it always runs on the main thread.

mod packet_list;
mod panes;
mod status_bar;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(34), // Packet list
            Constraint::Percentage(33), // Detail
            Constraint::Percentage(33), // Dump
            Constraint::Length(2),      // Status
        ])
        .split(f.area());

    packet_list::render(f, chunks[0], app);
    panes::render_detail(f, chunks[1], app);
    panes::render_dump(f, chunks[2], app);
    status_bar::render(f, chunks[3], app);
}

/// Bordered block for a panel; the focused panel gets a highlighted
/// border so Tab rotation is visible.
fn panel_block(title: &str, focused: bool) -> Block<'_> {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
}
