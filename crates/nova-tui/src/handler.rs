use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane, SettingsField};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Generated(result) => app.on_generated(result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // An alert blocks everything until dismissed
    if app.alert.is_some() {
        app.alert = None;
        return;
    }

    let settings_toggle = key.code == KeyCode::F(2)
        || (key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL));
    if settings_toggle {
        if app.show_settings {
            app.close_settings();
        } else {
            app.open_settings();
        }
        return;
    }

    if app.show_settings {
        handle_settings(app, key);
        return;
    }

    match app.focus {
        FocusPane::Input => handle_input(app, key),
        FocusPane::Sidebar => handle_sidebar(app, key),
    }
}

fn handle_settings(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_settings(),
        KeyCode::Enter => app.save_settings(),
        KeyCode::Down | KeyCode::Tab => app.settings.field = app.settings.field.next(),
        KeyCode::Up | KeyCode::BackTab => app.settings.field = app.settings.field.prev(),
        KeyCode::Left => app.settings_adjust(false),
        KeyCode::Right => app.settings_adjust(true),
        _ if app.settings.field == SettingsField::ApiKey => match key.code {
            KeyCode::Backspace => app.settings_backspace(),
            KeyCode::Home => app.settings.api_key_cursor = 0,
            KeyCode::End => app.settings.api_key_cursor = app.settings.api_key.chars().count(),
            KeyCode::Char(c) => app.settings_insert_char(c),
            _ => {}
        },
        _ => {}
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            if !key.modifiers.contains(KeyModifiers::SHIFT) {
                app.submit();
            }
        }
        KeyCode::Tab => app.focus = FocusPane::Sidebar,
        KeyCode::Backspace => app.delete_before_cursor(),
        KeyCode::Delete => app.delete_at_cursor(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.input_cursor = 0,
        KeyCode::End => app.input_cursor = app.input.chars().count(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Char(c) => app.insert_char(c),
        _ => {}
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Esc => app.focus = FocusPane::Input,
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_down(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_up(),
        KeyCode::Enter => {
            if app.sidebar_on_settings() {
                app.open_settings();
            }
        }
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_chat = app.chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_sidebar = app.sidebar_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_down(3);
            } else if in_sidebar {
                app.sidebar_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_up(3);
            } else if in_sidebar {
                app.sidebar_up();
            }
        }
        _ => {}
    }
}
