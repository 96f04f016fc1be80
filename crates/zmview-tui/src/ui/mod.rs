//! Terminal UI module using ratatui.
//!
//! - `render`: frame rendering for the login, monitors, and stream screens
//! - `input`: keyboard event handling
//! - `styles`: color palette and text styling

pub mod input;
pub mod render;
pub mod styles;
