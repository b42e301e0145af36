//! In-memory collection cache.
//!
//! This module provides the `BookStore`, the single cached copy of the book
//! collection for a session. It is populated by the first successful fetch
//! and afterwards only changed by explicit patch operations.

pub mod store;

pub use store::{BookStore, CachedData};
