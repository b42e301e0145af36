//! Core library for bookshelf.
//!
//! Talks to a REST book catalogue (`/books`), keeps the collection in a
//! session-scoped cache and patches that cache locally after each successful
//! create, update or delete instead of refetching it.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod form;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, BooksBackend, MockBackend};
pub use cache::BookStore;
pub use catalog::{BooksQuery, Catalog, Mutations, QueryState};
pub use config::Config;
pub use form::{BookForm, FormErrors, FormField, FormMode};
pub use models::{Book, BookDetails, BookFormat, BookId, BookKind, BookPatch};
