use serde::Deserialize;
use thiserror::Error;

/// Shown whenever the server is unreachable or answers with something that
/// is not a ZoneMinder payload.
pub const COULD_NOT_CONNECT: &str = "Could not connect to ZM Server";

/// `data.name` value that marks an expired access token. This is the sole
/// trigger for the refresh-then-retry path.
const EXPIRED_TOKEN_NAME: &str = "Expired token";

/// Maximum length of a response body carried inside an error
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error taxonomy of the API core.
///
/// Every variant's `Display` output is suitable for showing to the user
/// directly; the caller branches on the variant, never on message text.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Host unreachable or transport-level failure. Never retried.
    #[error("Could not connect to ZM Server")]
    Connectivity(#[from] reqwest::Error),

    /// The server rejected the credentials.
    #[error("{0}")]
    Authentication(String),

    /// The access token has expired. Recoverable exactly once per call via
    /// refresh; escalated if it comes back after that.
    #[error("{0}")]
    ExpiredToken(String),

    /// The server answered but the payload was not in the expected shape.
    /// Displays as a connection problem; the detail goes to the log.
    #[error("Could not connect to ZM Server")]
    Malformed(String),

    /// Structured server-side error other than the above.
    #[error("{0}")]
    Server(String),

    /// An operation that needs an active session was called without one.
    #[error("Not connected to a ZoneMinder server")]
    NotConnected,

    /// The session could not be persisted or loaded.
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Classify a non-success response body.
    ///
    /// A body that does not parse as the ZoneMinder error envelope means the
    /// host is not (or no longer) a ZoneMinder API endpoint, which the user
    /// sees as a connection problem.
    pub fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let payload: ErrorPayload = match serde_json::from_str(body) {
            Ok(payload) => payload,
            Err(_) => return ApiError::Malformed(truncate_body(body)),
        };

        let message = payload.data.display_message();
        if payload.data.name == EXPIRED_TOKEN_NAME {
            ApiError::ExpiredToken(message)
        } else if status == reqwest::StatusCode::UNAUTHORIZED {
            ApiError::Authentication(message)
        } else {
            ApiError::Server(message)
        }
    }

    pub(crate) fn storage(source: anyhow::Error) -> Self {
        ApiError::Storage(format!("{:#}", source))
    }
}

/// Wire shape of a ZoneMinder error response.
#[derive(Debug, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub success: bool,
    pub data: ErrorData,
}

#[derive(Debug, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub exception: Option<ErrorException>,
}

impl ErrorData {
    /// The server's message, falling back to the error name when the
    /// message field is empty.
    fn display_message(&self) -> String {
        if self.message.is_empty() {
            self.name.clone()
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorException {
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Truncate a response body so error values stay loggable.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let truncated: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated, {} total bytes)", truncated, body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    const EXPIRED_BODY: &str = r#"{
        "success": false,
        "data": {
            "name": "Expired token",
            "message": "Expired token",
            "url": "/zm/api/monitors.json",
            "exception": {
                "class": "UnauthorizedException",
                "code": 401,
                "message": "Expired token"
            }
        }
    }"#;

    #[test]
    fn test_expired_token_sentinel() {
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, EXPIRED_BODY);
        assert!(matches!(err, ApiError::ExpiredToken(_)));
        assert_eq!(err.to_string(), "Expired token");
    }

    #[test]
    fn test_unauthorized_classifies_as_authentication() {
        let body = r#"{"success":false,"data":{"name":"Unauthorized","message":"User not found or incorrect password","url":"/zm/api/host/login.json"}}"#;
        let err = ApiError::from_response(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ApiError::Authentication(_)));
        assert_eq!(err.to_string(), "User not found or incorrect password");
    }

    #[test]
    fn test_other_statuses_classify_as_server() {
        let body = r#"{"success":false,"data":{"name":"Internal error","message":"Database has gone away"}}"#;
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, body);
        assert!(matches!(err, ApiError::Server(_)));
        assert_eq!(err.to_string(), "Database has gone away");
    }

    #[test]
    fn test_message_falls_back_to_name() {
        let body = r#"{"success":false,"data":{"name":"Forbidden","message":""}}"#;
        let err = ApiError::from_response(StatusCode::FORBIDDEN, body);
        assert_eq!(err.to_string(), "Forbidden");
    }

    #[test]
    fn test_unparseable_body_displays_as_connectivity() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "<html>502 Bad Gateway</html>");
        assert!(matches!(err, ApiError::Malformed(_)));
        assert_eq!(err.to_string(), COULD_NOT_CONNECT);
    }

    #[test]
    fn test_truncate_body_caps_length() {
        let long = "x".repeat(2000);
        let truncated = truncate_body(&long);
        assert!(truncated.len() < 600);
        assert!(truncated.contains("2000 total bytes"));
    }
}
