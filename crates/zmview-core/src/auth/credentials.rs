use serde::{Deserialize, Serialize};

/// Login details for a ZoneMinder server.
///
/// Persisted verbatim and replaced only by an explicit re-login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub host: String,
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(host: &str, user: &str, password: &str) -> Self {
        Self {
            host: normalize_host(host),
            user: user.to_string(),
            password: password.to_string(),
        }
    }
}

/// Strip a scheme prefix and trailing slashes from a user-entered host.
/// The client always speaks https and builds its own paths.
pub fn normalize_host(host: &str) -> String {
    let trimmed = host.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}
