use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use crate::api::{ApiError, BooksBackend};
use crate::cache::BookStore;
use crate::models::Book;

use super::InFlight;

/// What the table needs to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    /// `None` until the first successful fetch
    pub books: Option<Vec<Book>>,
    pub is_loading: bool,
    /// Message of the last failed fetch, cleared by the next success
    pub error: Option<String>,
}

/// Fetches the book collection into the store.
///
/// Only one fetch runs at a time; callers arriving while it runs wait for it
/// and then read the result from the store rather than issuing a second request.
pub struct BooksQuery {
    backend: Arc<dyn BooksBackend>,
    store: Arc<BookStore>,
    fetch_lock: tokio::sync::Mutex<()>,
    loading: InFlight,
    last_error: Mutex<Option<String>>,
}

impl BooksQuery {
    pub fn new(backend: Arc<dyn BooksBackend>, store: Arc<BookStore>) -> Self {
        Self {
            backend,
            store,
            fetch_lock: tokio::sync::Mutex::new(()),
            loading: InFlight::default(),
            last_error: Mutex::new(None),
        }
    }

    /// Cached books, fetching them first if this session has none yet
    pub async fn load(&self) -> Result<Vec<Book>, ApiError> {
        if let Some(books) = self.store.snapshot() {
            return Ok(books);
        }

        let _fetching = self.fetch_lock.lock().await;
        // A fetch that finished while we waited already filled the store
        if let Some(books) = self.store.snapshot() {
            return Ok(books);
        }
        self.fetch().await
    }

    /// Refetch even when cached. Only called on explicit user request.
    pub async fn revalidate(&self) -> Result<Vec<Book>, ApiError> {
        let _fetching = self.fetch_lock.lock().await;
        self.fetch().await
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_active()
    }

    pub fn error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> QueryState {
        QueryState {
            books: self.store.snapshot(),
            is_loading: self.is_loading(),
            error: self.error(),
        }
    }

    fn set_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    async fn fetch(&self) -> Result<Vec<Book>, ApiError> {
        let _loading = self.loading.start();

        match self.backend.list_books().await {
            Ok(books) => {
                info!(count = books.len(), "Book collection loaded");
                self.store.populate(books.clone());
                self.set_error(None);
                Ok(books)
            }
            Err(e) => {
                // The store keeps whatever it had before
                warn!(error = %e, "Failed to load book collection");
                self.set_error(Some(e.user_message()));
                Err(e)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockBackend, MockFailure};
    use crate::models::{BookDetails, BookFormat};

    fn paper(id: i64, pages: u32) -> Book {
        Book::new(
            id,
            BookDetails {
                title: format!("Title {}", id),
                author: "Author".to_string(),
                genre: "Genre".to_string(),
                brief_description: String::new(),
                format: BookFormat::Paper { pages },
            },
        )
    }

    fn query_over(backend: Arc<MockBackend>) -> (BooksQuery, Arc<BookStore>) {
        let store = Arc::new(BookStore::new());
        (BooksQuery::new(backend, Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_load_fetches_once() {
        let backend = Arc::new(MockBackend::with_books(vec![paper(1, 100)]));
        let (query, store) = query_over(Arc::clone(&backend));

        assert_eq!(query.load().await.unwrap().len(), 1);
        assert_eq!(query.load().await.unwrap().len(), 1);

        assert_eq!(backend.list_count(), 1);
        assert!(store.is_loaded());
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let backend = Arc::new(
            MockBackend::with_books(vec![paper(1, 100)])
                .with_latency(std::time::Duration::from_millis(20)),
        );
        let (query, _store) = query_over(Arc::clone(&backend));

        let (a, b, c) = tokio::join!(query.load(), query.load(), query.load());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(backend.list_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_load_leaves_store_and_reports_error() {
        let backend = Arc::new(MockBackend::with_books(vec![paper(1, 100)]));
        backend.fail_next(MockFailure::Server).await;
        let (query, store) = query_over(Arc::clone(&backend));

        assert!(query.load().await.is_err());
        assert!(!store.is_loaded());

        let state = query.state();
        assert_eq!(state.books, None);
        assert!(!state.is_loading);
        assert!(state.error.is_some());

        // Nothing cached, so the next load tries again and clears the error
        assert_eq!(query.load().await.unwrap().len(), 1);
        assert_eq!(query.error(), None);
        assert_eq!(backend.list_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_revalidate_keeps_previous_books() {
        let backend = Arc::new(MockBackend::with_books(vec![paper(1, 100)]));
        let (query, store) = query_over(Arc::clone(&backend));
        query.load().await.unwrap();

        backend.fail_next(MockFailure::Server).await;
        assert!(query.revalidate().await.is_err());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_revalidate_refetches() {
        let backend = Arc::new(MockBackend::new());
        let (query, store) = query_over(Arc::clone(&backend));
        assert!(query.load().await.unwrap().is_empty());

        // Change on the server behind the cache's back
        backend
            .create_book(&paper(0, 10).details)
            .await
            .unwrap();
        assert!(store.is_empty());

        assert_eq!(query.revalidate().await.unwrap().len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(backend.list_count(), 2);
    }
}
