//! REST API module for the book catalogue backend.
//!
//! The backend exposes a single collection resource:
//!
//! - `GET /books` - list all books
//! - `POST /books` - create a book, returns it with its new id
//! - `PUT /books/{id}` - update some fields, returns the updated book
//! - `DELETE /books/{id}` - remove a book
//!
//! `BooksBackend` is the seam the cache layer talks to. `ApiClient` is the
//! reqwest implementation; `MockBackend` is an in-memory one for tests.

pub mod client;
pub mod error;
pub mod mock;

use async_trait::async_trait;

use crate::models::{Book, BookDetails, BookId, BookPatch};

pub use client::ApiClient;
pub use error::ApiError;
pub use mock::MockBackend;

/// The four calls the catalogue needs from a backend.
#[async_trait]
pub trait BooksBackend: Send + Sync {
    /// Fetch the whole collection
    async fn list_books(&self) -> Result<Vec<Book>, ApiError>;

    /// Create a book, returning it with its server-assigned id
    async fn create_book(&self, details: &BookDetails) -> Result<Book, ApiError>;

    /// Update the fields present in `patch`, returning the updated book
    async fn update_book(&self, id: BookId, patch: &BookPatch) -> Result<Book, ApiError>;

    /// Delete a book, returning the deleted id
    async fn delete_book(&self, id: BookId) -> Result<BookId, ApiError>;
}
