use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::Storage;

use super::Credentials;

/// Storage key holding the persisted credentials.
pub const LOGIN_KEY: &str = "LOGIN";

/// Storage key holding the persisted token.
pub const TOKEN_KEY: &str = "TOKEN";

/// Slack subtracted from the wire expiry when deciding a token is stale,
/// so a token is not presented moments before the server rejects it.
const EXPIRY_SLACK_SECS: i64 = 60;

/// Token payload returned by `host/login.json`.
///
/// Replaced wholesale on every login or refresh, never merged. The expiry
/// fields are lifetimes in seconds relative to when the token was issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub access_token_expires: i64,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub refresh_token_expires: i64,
    #[serde(default)]
    pub credentials: String,
    #[serde(default)]
    pub append_password: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub apiversion: String,
    /// Stamped when the token arrives; not part of the wire payload, so
    /// deserializing a fresh server response defaults it to now while a
    /// stored token keeps its original timestamp.
    #[serde(default = "Utc::now")]
    pub obtained_at: DateTime<Utc>,
}

impl Token {
    fn expires_at(&self) -> DateTime<Utc> {
        self.obtained_at + Duration::seconds(self.access_token_expires)
    }

    /// Whether the access token is past (or within slack of) its lifetime.
    /// Servers that omit the lifetime are deferred to: only the version
    /// probe can tell then.
    pub fn is_expired(&self) -> bool {
        self.access_token_expires > 0
            && Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS) > self.expires_at()
    }

    /// Same check for the refresh token.
    pub fn refresh_expired(&self) -> bool {
        self.refresh_token_expires > 0
            && Utc::now() + Duration::seconds(EXPIRY_SLACK_SECS)
                > self.obtained_at + Duration::seconds(self.refresh_token_expires)
    }

    /// Minutes remaining on the access token (for display).
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at() - Utc::now()).num_minutes().max(0)
    }
}

/// In-memory session state backed by persistent storage.
///
/// Holds at most one Credentials/Token pair. Saves persist first and update
/// memory second, so a storage failure leaves the in-memory state untouched
/// and the caller never observes a half-written session.
pub struct SessionStore<S: Storage> {
    storage: S,
    credentials: Option<Credentials>,
    token: Option<Token>,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            credentials: None,
            token: None,
        }
    }

    /// Hydrate from storage. Returns whether both credentials and token are
    /// present (i.e. the session is usable pending verification).
    pub fn load(&mut self) -> Result<bool> {
        let credentials = match self.storage.get(LOGIN_KEY)? {
            Some(raw) => {
                Some(serde_json::from_str(&raw).context("Failed to parse stored credentials")?)
            }
            None => None,
        };
        let token = match self.storage.get(TOKEN_KEY)? {
            Some(raw) => Some(serde_json::from_str(&raw).context("Failed to parse stored token")?),
            None => None,
        };
        self.credentials = credentials;
        self.token = token;
        debug!(active = self.is_active(), "loaded session from storage");
        Ok(self.is_active())
    }

    pub fn save_credentials(&mut self, credentials: Credentials) -> Result<()> {
        let raw = serde_json::to_string(&credentials)?;
        self.storage.set(LOGIN_KEY, &raw)?;
        self.credentials = Some(credentials);
        Ok(())
    }

    pub fn save_token(&mut self, token: Token) -> Result<()> {
        let raw = serde_json::to_string(&token)?;
        self.storage.set(TOKEN_KEY, &raw)?;
        self.token = Some(token);
        Ok(())
    }

    /// Erase all persisted session data and reset memory.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.clear()?;
        self.credentials = None;
        self.token = None;
        Ok(())
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Whether both halves of the session are present.
    pub fn is_active(&self) -> bool {
        self.credentials.is_some() && self.token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn token(access: &str) -> Token {
        Token {
            access_token: access.to_string(),
            access_token_expires: 3600,
            refresh_token: "refresh".to_string(),
            refresh_token_expires: 86400,
            credentials: String::new(),
            append_password: 0,
            version: "1.36.12".to_string(),
            apiversion: "2.0".to_string(),
            obtained_at: Utc::now(),
        }
    }

    #[test]
    fn test_load_requires_both_keys() {
        let mut store = SessionStore::new(MemoryStorage::new());
        assert!(!store.load().unwrap());

        store
            .save_credentials(Credentials::new("cam.example.com", "admin", "secret"))
            .unwrap();
        assert!(!store.load().unwrap());

        store.save_token(token("abc")).unwrap();
        assert!(store.load().unwrap());
    }

    #[test]
    fn test_round_trip_through_fresh_store() {
        let storage = MemoryStorage::new();
        {
            let mut store = SessionStore::new(storage.clone());
            store
                .save_credentials(Credentials::new("cam.example.com", "admin", "secret"))
                .unwrap();
            store.save_token(token("abc")).unwrap();
        }

        let mut store = SessionStore::new(storage.clone());
        assert!(store.load().unwrap());
        assert_eq!(store.credentials().unwrap().user, "admin");
        assert_eq!(store.token().unwrap().access_token, "abc");
    }

    #[test]
    fn test_clear_erases_persisted_state() {
        let storage = MemoryStorage::new();
        let mut store = SessionStore::new(storage.clone());
        store
            .save_credentials(Credentials::new("cam.example.com", "admin", "secret"))
            .unwrap();
        store.save_token(token("abc")).unwrap();

        store.clear().unwrap();
        assert!(!store.is_active());
        assert_eq!(storage.get(LOGIN_KEY).unwrap(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);

        let mut reloaded = SessionStore::new(storage.clone());
        assert!(!reloaded.load().unwrap());
    }

    #[test]
    fn test_save_failure_leaves_memory_unchanged() {
        struct FailingStorage;
        impl Storage for FailingStorage {
            fn set(&self, _key: &str, _value: &str) -> Result<()> {
                anyhow::bail!("disk full")
            }
            fn get(&self, _key: &str) -> Result<Option<String>> {
                Ok(None)
            }
            fn remove(&self, _key: &str) -> Result<()> {
                Ok(())
            }
            fn clear(&self) -> Result<()> {
                Ok(())
            }
        }

        let mut store = SessionStore::new(FailingStorage);
        assert!(store
            .save_credentials(Credentials::new("cam.example.com", "admin", "secret"))
            .is_err());
        assert!(store.credentials().is_none());
        assert!(!store.is_active());
    }

    #[test]
    fn test_token_expiry() {
        let mut t = token("abc");
        assert!(!t.is_expired());
        assert!(!t.refresh_expired());

        t.obtained_at = Utc::now() - Duration::seconds(7200);
        assert!(t.is_expired());
        assert!(!t.refresh_expired());

        // No lifetime on the wire: defer to the server probe
        t.access_token_expires = 0;
        assert!(!t.is_expired());
    }

    #[test]
    fn test_token_deserialization_stamps_obtained_at() {
        let raw = r#"{
            "access_token": "eyJ0eXAi",
            "access_token_expires": 3600,
            "refresh_token": "eyJyZWZy",
            "refresh_token_expires": 86400,
            "credentials": "auth=",
            "append_password": 0,
            "version": "1.36.12",
            "apiversion": "2.0"
        }"#;
        let t: Token = serde_json::from_str(raw).unwrap();
        assert_eq!(t.access_token, "eyJ0eXAi");
        assert!((Utc::now() - t.obtained_at).num_seconds() < 5);
        assert!(!t.is_expired());
    }
}
