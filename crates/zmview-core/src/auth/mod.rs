//! Session and credential management.
//!
//! This module provides:
//! - `Credentials`: the host/user/password triple supplied at login
//! - `Token`: the ZoneMinder access/refresh token payload with expiry helpers
//! - `SessionStore`: in-memory session state hydrated from persistent storage
//!
//! A token is only meaningful alongside the credentials that produced it;
//! the store holds at most one such pair.

pub mod credentials;
pub mod session;

pub use credentials::Credentials;
pub use session::{SessionStore, Token, LOGIN_KEY, TOKEN_KEY};
