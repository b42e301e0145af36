//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Anything that talks
//! to the backend is spawned by `App`, so handling a key never blocks the
//! render loop.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use bookshelf_core::form::FormField;

use crate::app::{App, AppState, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.state = AppState::Quitting;
        return true;
    }

    match app.state {
        AppState::InDialog => handle_dialog_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return true;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        },
        AppState::Normal => handle_table_input(app, key),
        AppState::Quitting => return true,
    }
    false
}

fn handle_table_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('a') => app.open_add_dialog(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit_dialog(),
        KeyCode::Char('x') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char('u') => app.revalidate_books(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(1),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(1),
        KeyCode::PageUp => app.select_prev(PAGE_SCROLL_SIZE),
        KeyCode::PageDown => app.select_next(PAGE_SCROLL_SIZE),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),
        KeyCode::Esc => app.status_message = None,
        _ => {}
    }
}

fn handle_dialog_input(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.cancel_dialog();
        return;
    }
    if key.code == KeyCode::Enter {
        app.submit_dialog();
        return;
    }

    let Some(dialog) = app.dialog.as_mut() else {
        app.state = AppState::Normal;
        return;
    };

    match key.code {
        KeyCode::Tab | KeyCode::Down => dialog.focus_next(),
        KeyCode::BackTab | KeyCode::Up => dialog.focus_prev(),
        KeyCode::Left | KeyCode::Right if dialog.focus == FormField::Kind => {
            dialog.toggle_kind();
        }
        KeyCode::Backspace => dialog.backspace(),
        KeyCode::Char(c) => {
            dialog.input_char(c);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bookshelf_core::api::MockBackend;
    use bookshelf_core::{Book, BookDetails, BookFormat, BookKind, Config};

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app() -> App {
        let book = Book::new(
            1,
            BookDetails {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                genre: "Sci-Fi".to_string(),
                brief_description: String::new(),
                format: BookFormat::Paper { pages: 412 },
            },
        );
        App::with_backend(Config::default(), Arc::new(MockBackend::with_books(vec![book])))
    }

    #[tokio::test]
    async fn test_quit_needs_confirmation() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(!press(&mut app, KeyCode::Char('n')));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Char('y')));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_dialog() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        let quit = handle_input(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(quit);
    }

    #[tokio::test]
    async fn test_typing_in_dialog_does_not_trigger_shortcuts() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::InDialog);

        type_text(&mut app, "quax");
        assert_eq!(app.state, AppState::InDialog);
        assert_eq!(app.dialog.as_ref().unwrap().form.title, "quax");
    }

    #[tokio::test]
    async fn test_kind_toggles_with_arrows_on_kind_field() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Right);
        assert_eq!(app.dialog.as_ref().unwrap().form.kind(), BookKind::Paper);

        for _ in 0..3 {
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Right);
        assert_eq!(app.dialog.as_ref().unwrap().form.kind(), BookKind::Audio);

        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.dialog.as_ref().unwrap().focus, FormField::Genre);
    }

    #[tokio::test]
    async fn test_escape_cancels_dialog() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Draft");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.state, AppState::Normal);
        assert!(app.dialog.is_none());
    }

    #[tokio::test]
    async fn test_edit_and_delete_keys_act_on_selection() {
        let mut app = app();
        app.load_books();
        assert!(app.wait_for_task().await);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.dialog.as_ref().unwrap().title(), "Edit Book");
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('x'));
        assert!(app.deleting.contains(&1));
        assert!(app.wait_for_task().await);
        assert_eq!(app.book_count(), 0);
    }

    #[tokio::test]
    async fn test_help_overlay_toggles() {
        let mut app = app();
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::ShowingHelp);
        press(&mut app, KeyCode::Char('?'));
        assert_eq!(app.state, AppState::Normal);
    }
}
