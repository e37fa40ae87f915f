//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout and the four dashboard views
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling

pub mod input;
pub mod render;
pub mod styles;
