use anyhow::Result;
use chatbot_core::{ConnectionState, HttpService, QaService};
use crate::app::{App, FocusPane};
use crate::tui::AppEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tokio::sync::mpsc::UnboundedSender;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent, tx: &UnboundedSender<AppEvent>) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key, tx),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Connection(state) => app.on_connection(state),
        AppEvent::Preflight { question, state } => app.on_preflight(&question, state),
        AppEvent::Reply { question, result } => app.on_reply(&question, result),
    }
    Ok(())
}

/// Check the service once and report the result as [`AppEvent::Connection`].
pub fn spawn_health_check(service: HttpService, tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let state = ConnectionState::from_healthy(service.health().await);
        let _ = tx.send(AppEvent::Connection(state));
    });
}

/// Run one send in the background: health check, then `/ask` if healthy.
fn spawn_send(service: HttpService, question: String, tx: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let state = ConnectionState::from_healthy(service.health().await);
        let _ = tx.send(AppEvent::Preflight {
            question: question.clone(),
            state,
        });
        if !state.is_connected() {
            return;
        }

        tracing::info!(question = %question, "sending question");
        let result = service.ask(&question).await;
        let _ = tx.send(AppEvent::Reply { question, result });
    });
}

fn handle_key(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any pane
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('l') if ctrl => {
            app.clear_chat();
            return;
        }
        KeyCode::Char('y') if ctrl => {
            app.copy_response();
            return;
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                FocusPane::Input => FocusPane::History,
                FocusPane::History => FocusPane::Input,
            };
            return;
        }
        KeyCode::PageDown => {
            app.scroll_page_down();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_page_up();
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Input => handle_input(app, key, tx),
        FocusPane::History => handle_history(app, key),
    }
}

fn handle_history(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.history_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.history_nav_up(),
        KeyCode::Enter => app.load_selected_history(),
        KeyCode::Char('c') => app.copy_response(),
        KeyCode::Esc => app.focus = FocusPane::Input,
        _ => {}
    }
}

fn handle_input(app: &mut App, key: KeyEvent, tx: &UnboundedSender<AppEvent>) {
    // Input is disabled while a request is in flight
    if app.is_busy() {
        return;
    }

    match key.code {
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            insert_char(app, '\n');
        }
        KeyCode::Enter => {
            if let Some(question) = app.begin_send() {
                spawn_send(app.service.clone(), question, tx.clone());
            }
        }
        KeyCode::Up => app.recall_older(),
        KeyCode::Down => app.recall_newer(),
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            insert_char(app, c);
        }
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let byte_pos = char_to_byte_index(&app.input, app.cursor);
    app.input.insert(byte_pos, c);
    app.cursor += 1;
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(),
        MouseEventKind::ScrollUp => app.scroll_up(),
        _ => {}
    }
}
