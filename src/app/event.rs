// Keyboard event handling
//
// Translates key events into state-machine transitions. Handlers only
// call `App` methods; the state machine stays the single mutator of view
// state.
//
// # Key Bindings
// - `Ctrl-C`, `q` - stop the viewer
// - `Enter` - Tail -> Select, or re-select the highlighted row
// - `Esc` - Select -> Tail
// - `Tab` - rotate panel focus (list -> detail -> dump)
// - `Up`/`Down`, `k`/`j` - move selection or scroll the focused pane
// - `g`/`G` - jump to top/end of the focused panel

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::App;

pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.stop();
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.stop(),
        KeyCode::Tab => app.rotate_focus(),
        KeyCode::Enter => app.activate(),
        KeyCode::Esc => app.leave_select(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
        KeyCode::Char('g') => app.jump_top(),
        KeyCode::Char('G') => app.jump_bottom(),
        _ => return,
    }

    app.mark_dirty();
}
