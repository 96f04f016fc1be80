//! API client for a ZoneMinder server.
//!
//! `ZmClient` wraps the ZoneMinder REST API: password login, token refresh,
//! the version probe, and the monitor list. It owns the session store it is
//! constructed with and persists whichever token survives a login or
//! refresh, so callers hold one client and no other session state.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::{Credentials, SessionStore, Token};
use crate::models::{HostVersion, Monitor, MonitorsResponse};
use crate::storage::Storage;

use super::ApiError;

/// HTTP request timeout. 30s lets a busy recorder answer while still
/// failing fast enough for an interactive client.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// All API endpoints live under this path on the server.
const API_PATH: &str = "/zm/api";

/// CGI endpoint serving the MJPEG stream.
const STREAM_PATH: &str = "/zm/cgi-bin/nph-zms";

// Fixed view-only stream parameters.
const STREAM_SCALE: u32 = 50;
const STREAM_WIDTH: &str = "640px";
const STREAM_HEIGHT: &str = "480px";
const STREAM_MODE: &str = "jpeg";
const STREAM_MAX_FPS: u32 = 5;
const STREAM_BUFFER: u32 = 1000;

/// Body of `host/login.json`. `pass` travels only on full logins;
/// refresh grants send the refresh token instead.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh_token: Option<&'a str>,
}

/// Client for one ZoneMinder server.
///
/// All operations await sequentially; a call is never issued concurrently
/// with its own retry.
pub struct ZmClient<S: Storage> {
    http: Client,
    store: SessionStore<S>,
}

impl<S: Storage> ZmClient<S> {
    pub fn new(storage: S) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            store: SessionStore::new(storage),
        })
    }

    /// Hydrate the session from persistent storage. Returns whether a
    /// stored Credentials/Token pair is present.
    pub fn load_session(&mut self) -> Result<bool, ApiError> {
        self.store.load().map_err(ApiError::storage)
    }

    /// Whether an in-memory Credentials/Token pair exists. Says nothing
    /// about whether the server still accepts it.
    pub fn is_logged_in(&self) -> bool {
        self.store.is_active()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.store.credentials()
    }

    pub fn token(&self) -> Option<&Token> {
        self.store.token()
    }

    /// Log in with fresh credentials, replacing any existing session.
    ///
    /// The token returned by `login.json` is probed against the version
    /// endpoint before anything is persisted: a server running with
    /// authentication disabled hands out tokens for any password, and the
    /// probe is what proves the pair is actually usable.
    pub async fn login(&mut self, credentials: Credentials) -> Result<(), ApiError> {
        let token = self.request_token(&credentials, None).await?;
        debug!(version = %token.version, apiversion = %token.apiversion, "received token");

        match self.get_version(&credentials.host, &token.access_token).await {
            Ok(version) => {
                info!(host = %credentials.host, user = %credentials.user, version = %version.version, "logged in");
            }
            Err(e @ (ApiError::Connectivity(_) | ApiError::Malformed(_))) => return Err(e),
            Err(e) => {
                debug!(error = %e, "token rejected by version probe");
                return Err(ApiError::Authentication(
                    "Invalid Username or Password".to_string(),
                ));
            }
        }

        self.store
            .save_credentials(credentials)
            .map_err(ApiError::storage)?;
        self.store.save_token(token).map_err(ApiError::storage)?;
        Ok(())
    }

    /// Probe `host/getVersion.json`. Does not touch session state.
    pub async fn get_version(
        &self,
        host: &str,
        access_token: &str,
    ) -> Result<HostVersion, ApiError> {
        let url = api_url(host, &format!("host/getVersion.json?token={}", access_token));
        self.get_json(&url, "host/getVersion.json").await
    }

    /// Whether `access_token` is currently usable against `host`.
    pub async fn verify_connection(&self, host: &str, access_token: &str) -> bool {
        match self.get_version(host, access_token).await {
            Ok(version) => {
                debug!(version = %version.version, "version probe ok");
                true
            }
            Err(e) => {
                debug!(error = %e, "version probe failed");
                false
            }
        }
    }

    /// Composite pre-fetch check: hydrate, probe, refresh, re-login.
    ///
    /// `Ok(false)` means no usable session could be established and the
    /// caller must prompt for credentials. Connectivity failures propagate
    /// as errors instead: an unreachable host says nothing about whether
    /// the stored session is still good.
    pub async fn ensure_connected(&mut self) -> Result<bool, ApiError> {
        if !self.store.is_active() && !self.load_session()? {
            return Ok(false);
        }

        // An access token past its recorded lifetime will only bounce;
        // skip the probe and go straight to the refresh path.
        if self.store.token().is_some_and(Token::is_expired) {
            debug!("stored access token past its lifetime, refreshing before probe");
            return self.try_recover().await;
        }

        let (host, access_token) = self.session_pair()?;
        match self.get_version(&host, &access_token).await {
            Ok(_) => Ok(true),
            Err(e @ (ApiError::Connectivity(_) | ApiError::Malformed(_))) => Err(e),
            Err(e) => {
                debug!(error = %e, "stored token rejected, attempting recovery");
                self.try_recover().await
            }
        }
    }

    /// Fetch the monitor collection.
    ///
    /// An expired-token rejection is recovered at most once: refresh, then
    /// a single retry of the original request. Any other failure is
    /// surfaced verbatim.
    pub async fn list_monitors(&mut self) -> Result<Vec<Monitor>, ApiError> {
        let mut refreshed = false;
        loop {
            let (host, access_token) = self.session_pair()?;
            let url = api_url(&host, &format!("monitors.json?token={}", access_token));
            match self.get_json::<MonitorsResponse>(&url, "monitors.json").await {
                Ok(response) => {
                    let monitors = response.into_monitors();
                    debug!(count = monitors.len(), "fetched monitors");
                    return Ok(monitors);
                }
                Err(ApiError::ExpiredToken(message)) => {
                    if refreshed {
                        return Err(ApiError::ExpiredToken(message));
                    }
                    refreshed = true;
                    info!("access token expired, refreshing");
                    self.refresh_session().await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// View-only MJPEG stream URL for one monitor.
    ///
    /// Pure function of the current session and `monitor_id`: no network
    /// I/O, and unchanged session state yields an identical URL.
    pub fn stream_url(&self, monitor_id: &str) -> Result<String, ApiError> {
        let (host, access_token) = self.session_pair()?;
        Ok(format!(
            "https://{}{}?scale={}&width={}&height={}&mode={}&maxfps={}&buffer={}&monitor={}&token={}",
            host,
            STREAM_PATH,
            STREAM_SCALE,
            STREAM_WIDTH,
            STREAM_HEIGHT,
            STREAM_MODE,
            STREAM_MAX_FPS,
            STREAM_BUFFER,
            monitor_id,
            access_token
        ))
    }

    /// Log out: erase persisted session data and in-memory state.
    pub fn logout(&mut self) -> Result<(), ApiError> {
        info!("logging out, clearing stored session");
        self.store.clear().map_err(ApiError::storage)
    }

    /// Refresh-or-relogin, collapsing the outcome to "session usable or
    /// not" the way `ensure_connected` reports it.
    async fn try_recover(&mut self) -> Result<bool, ApiError> {
        match self.refresh_session().await {
            Ok(()) => Ok(true),
            Err(e @ (ApiError::Connectivity(_) | ApiError::Malformed(_))) => Err(e),
            Err(e) => {
                warn!(error = %e, "session could not be recovered");
                Ok(false)
            }
        }
    }

    /// Replace the current access token: refresh-token grant first, full
    /// password login as fallback. The winning token is persisted before
    /// the caller proceeds.
    async fn refresh_session(&mut self) -> Result<(), ApiError> {
        let credentials = self
            .store
            .credentials()
            .cloned()
            .ok_or(ApiError::NotConnected)?;
        // A refresh token past its own lifetime would only bounce too;
        // go straight to the password login then.
        let refresh_token = self
            .store
            .token()
            .filter(|t| !t.refresh_expired())
            .map(|t| t.refresh_token.clone())
            .filter(|t| !t.is_empty());

        let token = match refresh_token {
            Some(refresh) => match self.request_token(&credentials, Some(&refresh)).await {
                Ok(token) => token,
                Err(e @ (ApiError::Connectivity(_) | ApiError::Malformed(_))) => return Err(e),
                Err(e) => {
                    debug!(error = %e, "refresh token rejected, retrying with password");
                    self.request_token(&credentials, None).await?
                }
            },
            None => self.request_token(&credentials, None).await?,
        };

        self.store.save_token(token).map_err(ApiError::storage)?;
        Ok(())
    }

    /// POST `host/login.json`, either a full password login or a
    /// refresh-token grant.
    async fn request_token(
        &self,
        credentials: &Credentials,
        refresh_token: Option<&str>,
    ) -> Result<Token, ApiError> {
        let url = api_url(&credentials.host, "host/login.json");
        let request = LoginRequest {
            user: &credentials.user,
            pass: if refresh_token.is_some() {
                None
            } else {
                Some(&credentials.password)
            },
            refresh_token,
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| {
            warn!(endpoint = "host/login.json", error = %e, "unexpected response shape");
            ApiError::Malformed(e.to_string())
        })
    }

    // URLs carry the access token as a query parameter, so logging sticks
    // to endpoint names.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_response(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| {
            warn!(endpoint, error = %e, "unexpected response shape");
            ApiError::Malformed(e.to_string())
        })
    }

    fn session_pair(&self) -> Result<(String, String), ApiError> {
        let credentials = self.store.credentials().ok_or(ApiError::NotConnected)?;
        let token = self.store.token().ok_or(ApiError::NotConnected)?;
        Ok((credentials.host.clone(), token.access_token.clone()))
    }
}

fn api_url(host: &str, endpoint: &str) -> String {
    format!("https://{}{}/{}", host, API_PATH, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::Utc;

    fn seeded_client() -> ZmClient<MemoryStorage> {
        let mut client = ZmClient::new(MemoryStorage::new()).unwrap();
        client
            .store
            .save_credentials(Credentials::new("cam.example.com", "admin", "secret"))
            .unwrap();
        client
            .store
            .save_token(Token {
                access_token: "ACCESS".to_string(),
                access_token_expires: 3600,
                refresh_token: "REFRESH".to_string(),
                refresh_token_expires: 86400,
                credentials: String::new(),
                append_password: 0,
                version: "1.36.12".to_string(),
                apiversion: "2.0".to_string(),
                obtained_at: Utc::now(),
            })
            .unwrap();
        client
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            api_url("cam.example.com", "host/login.json"),
            "https://cam.example.com/zm/api/host/login.json"
        );
        assert_eq!(
            api_url("cam.example.com:8443", "monitors.json?token=abc"),
            "https://cam.example.com:8443/zm/api/monitors.json?token=abc"
        );
    }

    #[test]
    fn test_stream_url_is_pure() {
        let client = seeded_client();
        let first = client.stream_url("1").unwrap();
        let second = client.stream_url("1").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stream_url_shape() {
        let client = seeded_client();
        let url = client.stream_url("7").unwrap();
        assert_eq!(
            url,
            "https://cam.example.com/zm/cgi-bin/nph-zms?scale=50&width=640px&height=480px\
             &mode=jpeg&maxfps=5&buffer=1000&monitor=7&token=ACCESS"
        );
    }

    #[test]
    fn test_stream_url_requires_session() {
        let client = ZmClient::new(MemoryStorage::new()).unwrap();
        assert!(matches!(
            client.stream_url("1"),
            Err(ApiError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_list_monitors_requires_session() {
        let mut client = ZmClient::new(MemoryStorage::new()).unwrap();
        assert!(matches!(
            client.list_monitors().await,
            Err(ApiError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_ensure_connected_without_stored_session() {
        let mut client = ZmClient::new(MemoryStorage::new()).unwrap();
        assert!(!client.ensure_connected().await.unwrap());
    }

    #[test]
    fn test_login_request_omits_password_on_refresh() {
        let full = LoginRequest {
            user: "admin",
            pass: Some("secret"),
            refresh_token: None,
        };
        assert_eq!(
            serde_json::to_string(&full).unwrap(),
            r#"{"user":"admin","pass":"secret"}"#
        );

        let refresh = LoginRequest {
            user: "admin",
            pass: None,
            refresh_token: Some("REFRESH"),
        };
        assert_eq!(
            serde_json::to_string(&refresh).unwrap(),
            r#"{"user":"admin","refresh_token":"REFRESH"}"#
        );
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let mut client = seeded_client();
        assert!(client.is_logged_in());
        client.logout().unwrap();
        assert!(!client.is_logged_in());
        assert!(matches!(
            client.stream_url("1"),
            Err(ApiError::NotConnected)
        ));
        // Nothing left in storage either, so reconnecting reports false
        // without touching the network.
        assert!(!client.ensure_connected().await.unwrap());
    }
}
