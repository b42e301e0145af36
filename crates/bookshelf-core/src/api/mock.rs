//! In-memory backend for tests and offline demos.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::models::{Book, BookDetails, BookId, BookPatch};

use super::{ApiError, BooksBackend};

/// Failure to inject into the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Server,
}

impl MockFailure {
    fn into_error(self) -> ApiError {
        match self {
            MockFailure::NotFound => ApiError::NotFound("injected".to_string()),
            MockFailure::Server => ApiError::ServerError("injected".to_string()),
        }
    }
}

struct MockState {
    books: Vec<Book>,
    next_id: BookId,
    fail_next: Option<MockFailure>,
}

/// Backend that keeps the collection in memory and assigns ids itself.
///
/// Behaves like the REST service: unknown ids on update/delete yield
/// `ApiError::NotFound`. Every call is counted so tests can assert that no
/// request was issued.
pub struct MockBackend {
    state: Mutex<MockState>,
    latency: Option<Duration>,
    requests: AtomicUsize,
    list_requests: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_books(Vec::new())
    }

    /// Create a backend pre-populated with books. New ids continue after the largest one.
    pub fn with_books(books: Vec<Book>) -> Self {
        let next_id = books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(MockState {
                books,
                next_id,
                fail_next: None,
            }),
            latency: None,
            requests: AtomicUsize::new(0),
            list_requests: AtomicUsize::new(0),
        }
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Override the id the next created book receives
    pub async fn set_next_id(&self, id: BookId) {
        self.state.lock().await.next_id = id;
    }

    /// Make the next request fail
    pub async fn fail_next(&self, failure: MockFailure) {
        self.state.lock().await.fail_next = Some(failure);
    }

    /// Server-side view of the collection
    pub async fn books(&self) -> Vec<Book> {
        self.state.lock().await.books.clone()
    }

    /// Total number of requests received
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of `GET /books` requests received
    pub fn list_count(&self) -> usize {
        self.list_requests.load(Ordering::SeqCst)
    }

    async fn begin(&self) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.state.lock().await.fail_next.take() {
            Some(failure) => Err(failure.into_error()),
            None => Ok(()),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BooksBackend for MockBackend {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        self.list_requests.fetch_add(1, Ordering::SeqCst);
        self.begin().await?;
        Ok(self.books().await)
    }

    async fn create_book(&self, details: &BookDetails) -> Result<Book, ApiError> {
        self.begin().await?;
        let mut state = self.state.lock().await;
        let book = Book::new(state.next_id, details.clone());
        state.next_id += 1;
        state.books.push(book.clone());
        Ok(book)
    }

    async fn update_book(&self, id: BookId, patch: &BookPatch) -> Result<Book, ApiError> {
        self.begin().await?;
        let mut state = self.state.lock().await;
        let book = state
            .books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("book {}", id)))?;
        book.details.apply(patch);
        Ok(book.clone())
    }

    async fn delete_book(&self, id: BookId) -> Result<BookId, ApiError> {
        self.begin().await?;
        let mut state = self.state.lock().await;
        let before = state.books.len();
        state.books.retain(|b| b.id != id);
        if state.books.len() == before {
            return Err(ApiError::NotFound(format!("book {}", id)));
        }
        Ok(id)
    }
}
