//! Domain models for ZoneMinder entities.
//!
//! Domain types are decoupled from the raw API response structures, which
//! carry the server's PascalCase field names and stringly-typed values.

pub mod host;
pub mod monitor;

pub use host::HostVersion;
pub use monitor::{Monitor, MonitorsResponse};
