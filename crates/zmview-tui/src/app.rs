//! Application state for the zmview TUI.
//!
//! The `App` struct owns the API client, the login form, and whatever the
//! current screen is displaying. Operations await sequentially on the main
//! task; the UI never mutates session state directly, it goes through the
//! client.

use anyhow::Result;
use tracing::{error, info};

use zmview_core::api::{ApiError, ZmClient};
use zmview_core::auth::Credentials;
use zmview_core::models::Monitor;
use zmview_core::storage::FileStorage;

use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for the host field. Covers a hostname plus optional port.
pub const MAX_HOST_LENGTH: usize = 80;

/// Maximum length for the user field.
pub const MAX_USER_LENGTH: usize = 50;

/// Maximum length for the password field.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Which screen fills the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Monitors,
    Stream,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ConfirmingLogout,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Host,
    User,
    Password,
    Button,
}

impl LoginFocus {
    pub fn next(&self) -> Self {
        match self {
            LoginFocus::Host => LoginFocus::User,
            LoginFocus::User => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Host,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            LoginFocus::Host => LoginFocus::Button,
            LoginFocus::User => LoginFocus::Host,
            LoginFocus::Password => LoginFocus::User,
            LoginFocus::Button => LoginFocus::Password,
        }
    }
}

pub fn can_add_host_char(len: usize, c: char) -> bool {
    len < MAX_HOST_LENGTH && !c.is_whitespace() && !c.is_control()
}

pub fn can_add_user_char(len: usize, c: char) -> bool {
    len < MAX_USER_LENGTH && !c.is_control()
}

pub fn can_add_password_char(len: usize, c: char) -> bool {
    len < MAX_PASSWORD_LENGTH && !c.is_control()
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub client: ZmClient<FileStorage>,
    pub config: Config,
    pub screen: Screen,
    pub state: AppState,

    // Login form
    pub login_host: String,
    pub login_user: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Monitor list
    pub monitors: Vec<Monitor>,
    pub selected: usize,
    pub status: Option<String>,

    // Stream view
    pub stream_monitor: Option<Monitor>,
    pub stream_url: Option<String>,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        let storage = FileStorage::new(Config::session_dir()?)?;
        let client = ZmClient::new(storage)?;

        let login_host = config.last_host.clone().unwrap_or_default();
        let login_user = config.last_user.clone().unwrap_or_default();

        Ok(Self {
            client,
            config,
            screen: Screen::Login,
            state: AppState::Normal,
            login_host,
            login_user,
            login_password: String::new(),
            login_focus: LoginFocus::Host,
            login_error: None,
            monitors: Vec::new(),
            selected: 0,
            status: None,
            stream_monitor: None,
            stream_url: None,
        })
    }

    /// Pick the startup screen: reuse the stored session when it still
    /// verifies, otherwise fall to the login form.
    pub async fn startup(&mut self) {
        match self.client.ensure_connected().await {
            Ok(true) => {
                self.screen = Screen::Monitors;
                self.refresh_monitors().await;
            }
            Ok(false) => {
                self.screen = Screen::Login;
            }
            Err(e) => {
                self.screen = Screen::Login;
                self.login_error = Some(e.to_string());
            }
        }
    }

    pub async fn attempt_login(&mut self) {
        self.login_error = None;
        if self.login_host.trim().is_empty() || self.login_user.is_empty() {
            self.login_error = Some("Host and user are required".to_string());
            return;
        }

        let credentials =
            Credentials::new(&self.login_host, &self.login_user, &self.login_password);
        match self.client.login(credentials).await {
            Ok(()) => {
                self.config.last_host = Some(self.login_host.trim().to_string());
                self.config.last_user = Some(self.login_user.clone());
                if let Err(e) = self.config.save() {
                    error!(error = %e, "failed to save config");
                }
                self.login_password.clear();
                self.screen = Screen::Monitors;
                self.refresh_monitors().await;
            }
            Err(e) => {
                self.login_error = Some(e.to_string());
            }
        }
    }

    /// Re-fetch the monitor list. When refresh and re-login are both
    /// exhausted the session is gone, so drop back to the login form.
    pub async fn refresh_monitors(&mut self) {
        match self.client.list_monitors().await {
            Ok(monitors) => {
                if self.selected >= monitors.len() {
                    self.selected = monitors.len().saturating_sub(1);
                }
                self.monitors = monitors;
                self.status = None;
            }
            Err(
                e @ (ApiError::ExpiredToken(_)
                | ApiError::Authentication(_)
                | ApiError::NotConnected),
            ) => {
                info!(error = %e, "session expired, returning to login");
                self.login_error = Some(e.to_string());
                self.screen = Screen::Login;
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn select_next(&mut self) {
        if !self.monitors.is_empty() && self.selected + 1 < self.monitors.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Open the stream view for the selected monitor.
    pub fn open_selected(&mut self) {
        let Some(monitor) = self.monitors.get(self.selected).cloned() else {
            return;
        };
        match self.client.stream_url(&monitor.id) {
            Ok(url) => {
                self.stream_monitor = Some(monitor);
                self.stream_url = Some(url);
                self.screen = Screen::Stream;
            }
            Err(e) => {
                self.status = Some(e.to_string());
            }
        }
    }

    pub fn close_stream(&mut self) {
        self.stream_monitor = None;
        self.stream_url = None;
        self.screen = Screen::Monitors;
    }

    /// Log out, wiping persisted session data, and return to the login
    /// form with the host/user prefilled for convenience.
    pub fn logout(&mut self) {
        if let Err(e) = self.client.logout() {
            error!(error = %e, "failed to clear session");
        }
        self.monitors.clear();
        self.selected = 0;
        self.login_password.clear();
        self.login_error = None;
        self.status = None;
        self.stream_monitor = None;
        self.stream_url = None;
        self.login_focus = LoginFocus::Host;
        self.screen = Screen::Login;
        self.state = AppState::Normal;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_focus_cycles() {
        let mut focus = LoginFocus::Host;
        for _ in 0..4 {
            focus = focus.next();
        }
        assert_eq!(focus, LoginFocus::Host);

        assert_eq!(LoginFocus::Host.prev(), LoginFocus::Button);
        assert_eq!(LoginFocus::Button.next(), LoginFocus::Host);
    }

    #[test]
    fn test_input_length_caps() {
        assert!(can_add_host_char(0, 'a'));
        assert!(!can_add_host_char(MAX_HOST_LENGTH, 'a'));
        assert!(!can_add_host_char(0, ' '));
        assert!(can_add_user_char(0, ' '));
        assert!(!can_add_user_char(MAX_USER_LENGTH, 'a'));
        assert!(can_add_password_char(0, '#'));
        assert!(!can_add_password_char(MAX_PASSWORD_LENGTH, 'x'));
        assert!(!can_add_password_char(0, '\t'));
    }
}
