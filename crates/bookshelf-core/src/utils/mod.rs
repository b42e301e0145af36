//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{single_line, truncate_string};
