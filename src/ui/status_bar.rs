// Status area rendering
//
// Two lines: mode banner with capture origin and packet count, then the
// keybinding legend for the current mode.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Mode};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let count = app.store.lock().unwrap().count();

    let (banner, banner_color, legend) = match app.mode {
        Mode::Tail => (
            " Tail ",
            Color::Green,
            "g: page top, G: page end, TAB: rotate panel, Enter: Select mode, Ctrl-C: quit",
        ),
        Mode::Select => (
            " Select ",
            Color::Blue,
            "g: page top, G: page end, TAB: rotate panel, ESC: Tail mode, Ctrl-C: quit",
        ),
    };

    let status = Line::from(vec![
        Span::styled(
            banner,
            Style::default()
                .bg(banner_color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} | {} packets", app.source_desc, count)),
    ]);
    let hints = Line::from(Span::styled(legend, Style::default().fg(Color::DarkGray)));

    f.render_widget(Paragraph::new(vec![status, hints]), area);
}
