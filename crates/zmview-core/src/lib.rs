//! Core library for zmview.
//!
//! Everything a frontend needs to talk to a ZoneMinder server:
//!
//! - `api`: the `ZmClient` auth/API core and its error taxonomy
//! - `auth`: credentials, tokens, and the session store
//! - `models`: domain projections of server data
//! - `storage`: the opaque key-value persistence the session rides on
//!
//! The session lives in a `SessionStore` handed to the client at
//! construction; there is no global state.

pub mod api;
pub mod auth;
pub mod models;
pub mod storage;

pub use api::{ApiError, ZmClient};
pub use auth::{Credentials, SessionStore, Token};
pub use models::{HostVersion, Monitor};
pub use storage::{FileStorage, MemoryStorage, Storage};
