//! REST API client module for ZoneMinder servers.
//!
//! This module provides the `ZmClient` for authenticating against a
//! ZoneMinder host and fetching monitor data, plus the `ApiError` taxonomy
//! its operations surface.
//!
//! Authentication is token-based: `host/login.json` issues an access/refresh
//! token pair, data endpoints take the access token as a query parameter,
//! and an expired access token is recovered through the refresh token
//! without re-sending the password.

pub mod client;
pub mod error;

pub use client::ZmClient;
pub use error::ApiError;
