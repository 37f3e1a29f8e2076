use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, Focus, InputMode};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::ChatReply(result) => app.on_chat_reply(result),
        AppEvent::UploadFinished(result) => app.on_upload_finished(result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('u') => {
                app.submit_upload();
                return;
            }
            _ => {}
        }
    }

    match key.code {
        KeyCode::Tab => {
            app.focus_next();
            return;
        }
        KeyCode::BackTab => {
            app.focus_prev();
            return;
        }
        KeyCode::PageDown => {
            app.scroll_half_page_down();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_half_page_up();
            return;
        }
        _ => {}
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => app.chat_scroll = 0,
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),

        // Upload panel
        KeyCode::Char('+') | KeyCode::Char('l') | KeyCode::Right => app.step_focused(1),
        KeyCode::Char('-') | KeyCode::Char('h') | KeyCode::Left => app.step_focused(-1),
        KeyCode::Char('u') => {
            app.submit_upload();
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        // Alt+Enter (or Shift+Enter where the terminal reports it) starts a new line
        KeyCode::Enter
            if app.focus == Focus::ChatInput
                && key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SHIFT) =>
        {
            app.chat_input.insert('\n');
        }
        KeyCode::Enter => {
            if app.focus == Focus::ChatInput {
                app.submit_chat_input();
            } else {
                app.submit_upload();
            }
        }
        KeyCode::Up if app.focus.is_upload_field() => app.step_focused(1),
        KeyCode::Down if app.focus.is_upload_field() => app.step_focused(-1),
        KeyCode::Backspace => app.focused_field_mut().backspace(),
        KeyCode::Delete => app.focused_field_mut().delete(),
        KeyCode::Left => app.focused_field_mut().move_left(),
        KeyCode::Right => app.focused_field_mut().move_right(),
        KeyCode::Home => app.focused_field_mut().move_home(),
        KeyCode::End => app.focused_field_mut().move_end(),
        KeyCode::Char(c) => app.focused_field_mut().insert(c),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            for _ in 0..3 {
                app.scroll_down();
            }
        }
        MouseEventKind::ScrollUp => {
            for _ in 0..3 {
                app.scroll_up();
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use crate::config::Config;
    use crate::conversation::Message;
    use crate::testing::FakeBackend;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn alt(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::ALT))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, key(KeyCode::Char(c))).unwrap();
        }
    }

    fn test_app() -> (App, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new().with_chat_reply(Ok("Hi there".to_string())));
        let (tx, _rx) = mpsc::unbounded_channel();
        let app = App::new(backend.clone(), tx, &Config::default(), "http://localhost:8000");
        (app, backend)
    }

    #[tokio::test]
    async fn test_typing_and_enter_sends_message() {
        let (mut app, _backend) = test_app();

        type_text(&mut app, "Hello");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(app.conversation.messages(), &[Message::user("Hello")]);
        assert_eq!(app.chat_input.value(), "");
    }

    #[tokio::test]
    async fn test_whitespace_enter_does_nothing() {
        let (mut app, _backend) = test_app();

        type_text(&mut app, "   ");
        handle_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert!(app.conversation.is_empty());
        assert_eq!(app.chat_input.value(), "   ");
    }

    #[tokio::test]
    async fn test_tab_moves_typing_to_file_path() {
        let (mut app, _backend) = test_app();

        handle_event(&mut app, key(KeyCode::Tab)).unwrap();
        type_text(&mut app, "doc.pdf");

        assert_eq!(app.uploader.form.file_path.value(), "doc.pdf");
        assert_eq!(app.chat_input.value(), "");
    }

    #[tokio::test]
    async fn test_normal_mode_keys() {
        let (mut app, _backend) = test_app();

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.input_mode, InputMode::Normal);

        handle_event(&mut app, key(KeyCode::Char('i'))).unwrap();
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_event(&mut app, key(KeyCode::Esc)).unwrap();
        handle_event(&mut app, key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_u_without_file_reports_validation() {
        let (mut app, backend) = test_app();

        handle_event(&mut app, ctrl('u')).unwrap();

        assert!(app.uploader.notice().is_some());
        assert!(!app.uploader.is_uploading());
        assert!(backend.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_editing() {
        let (mut app, _backend) = test_app();
        handle_event(&mut app, ctrl('c')).unwrap();
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_alt_enter_adds_line_break() {
        let (mut app, backend) = test_app();

        type_text(&mut app, "first");
        handle_event(&mut app, alt(KeyCode::Enter)).unwrap();
        type_text(&mut app, "second");
        assert!(app.conversation.is_empty());

        handle_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.conversation.messages(), &[Message::user("first\nsecond")]);

        for _ in 0..10 {
            if !backend.chat_queries().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(backend.chat_queries(), vec!["first\nsecond".to_string()]);
    }
}
