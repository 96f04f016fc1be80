//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Network-touching
//! actions are awaited in place; the session is only ever mutated through
//! the client.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_host_char, can_add_password_char, can_add_user_char, App, AppState, LoginFocus, Screen,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if matches!(app.state, AppState::ConfirmingLogout) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.logout(),
            _ => app.state = AppState::Normal,
        }
        return Ok(false);
    }

    match app.screen {
        Screen::Login => handle_login_input(app, key).await,
        Screen::Monitors => handle_monitors_input(app, key).await,
        Screen::Stream => Ok(handle_stream_input(app, key)),
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Host | LoginFocus::User | LoginFocus::Password => {
                app.login_focus = app.login_focus.next();
            }
            LoginFocus::Button => {
                app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Host => {
                app.login_host.pop();
            }
            LoginFocus::User => {
                app.login_user.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Host => {
                if can_add_host_char(app.login_host.len(), c) {
                    app.login_host.push(c);
                }
            }
            LoginFocus::User => {
                if can_add_user_char(app.login_user.len(), c) {
                    app.login_user.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_monitors_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Enter => app.open_selected(),
        KeyCode::Char('r') => app.refresh_monitors().await,
        KeyCode::Char('L') => app.state = AppState::ConfirmingLogout,
        _ => {}
    }
    Ok(false)
}

fn handle_stream_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::Quitting;
            return true;
        }
        KeyCode::Esc | KeyCode::Backspace => app.close_stream(),
        _ => {}
    }
    false
}
