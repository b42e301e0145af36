//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays (dialog, help, quit)
//! - `table`: the book table, skeleton and empty states
//! - `input`: keyboard event handling
//! - `styles`: colors and text styling

pub mod input;
pub mod render;
pub mod styles;
pub mod table;
