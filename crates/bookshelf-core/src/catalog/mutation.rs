use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{ApiError, BooksBackend};
use crate::cache::BookStore;
use crate::models::{Book, BookDetails, BookId, BookPatch};

use super::InFlight;

/// Create, update and delete, each followed by a local patch of the store.
///
/// Nothing touches the store before the server answers, and a failed call
/// leaves it exactly as it was. The three actions are tracked independently;
/// concurrent calls are not ordered, each patch is applied when its own
/// response arrives.
pub struct Mutations {
    backend: Arc<dyn BooksBackend>,
    store: Arc<BookStore>,
    creating: InFlight,
    updating: InFlight,
    deleting: InFlight,
}

impl Mutations {
    pub fn new(backend: Arc<dyn BooksBackend>, store: Arc<BookStore>) -> Self {
        Self {
            backend,
            store,
            creating: InFlight::default(),
            updating: InFlight::default(),
            deleting: InFlight::default(),
        }
    }

    /// POST the book and append the server's copy to the end of the cache
    pub async fn create_book(&self, details: BookDetails) -> Result<Book, ApiError> {
        let _creating = self.creating.start();

        let book = self.backend.create_book(&details).await?;
        info!(id = book.id, title = %book.details.title, "Book created");
        self.store.append(book.clone());
        Ok(book)
    }

    /// PUT the patch and swap the returned book into its cached slot.
    ///
    /// If the returned id is not cached, the cache is left alone: the book is
    /// neither inserted nor is the update reported as failed.
    pub async fn update_book(&self, id: BookId, patch: BookPatch) -> Result<Book, ApiError> {
        let _updating = self.updating.start();

        let book = self.backend.update_book(id, &patch).await?;
        info!(id = book.id, "Book updated");
        if !self.store.replace(book.clone()) {
            warn!(id = book.id, "Updated book is not in the cache; cache left unchanged");
        }
        Ok(book)
    }

    /// DELETE the book and drop it from the cache
    pub async fn delete_book(&self, id: BookId) -> Result<BookId, ApiError> {
        let _deleting = self.deleting.start();

        let deleted = self.backend.delete_book(id).await?;
        info!(id = deleted, "Book deleted");
        if !self.store.remove(deleted) {
            debug!(id = deleted, "Deleted book was not cached");
        }
        Ok(deleted)
    }

    pub fn is_creating(&self) -> bool {
        self.creating.is_active()
    }

    pub fn is_updating(&self) -> bool {
        self.updating.is_active()
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_active()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{MockBackend, MockFailure};
    use crate::models::BookFormat;

    fn details(title: &str, format: BookFormat) -> BookDetails {
        BookDetails {
            title: title.to_string(),
            author: "Author".to_string(),
            genre: "Genre".to_string(),
            brief_description: String::new(),
            format,
        }
    }

    fn setup(books: Vec<Book>) -> (Arc<MockBackend>, Arc<BookStore>, Mutations) {
        let backend = Arc::new(MockBackend::with_books(books.clone()));
        let store = Arc::new(BookStore::with_books(books));
        let mutations = Mutations::new(Arc::clone(&backend) as Arc<dyn BooksBackend>, Arc::clone(&store));
        (backend, store, mutations)
    }

    #[tokio::test]
    async fn test_delete_only_book_empties_cache() {
        let (_backend, store, mutations) =
            setup(vec![Book::new(1, details("A", BookFormat::Paper { pages: 100 }))]);

        assert_eq!(mutations.delete_book(1).await.unwrap(), 1);
        assert_eq!(store.snapshot(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_create_on_empty_cache_appends_server_book() {
        let (backend, store, mutations) = setup(Vec::new());
        backend.set_next_id(7).await;

        let created = mutations
            .create_book(details("B", BookFormat::Audio { minutes: 30 }))
            .await
            .unwrap();

        assert_eq!(created.id, 7);
        assert_eq!(store.snapshot(), Some(vec![created]));
    }

    #[tokio::test]
    async fn test_update_preserves_order() {
        let (_backend, store, mutations) = setup(vec![
            Book::new(1, details("A", BookFormat::Paper { pages: 50 })),
            Book::new(2, details("B", BookFormat::Audio { minutes: 10 })),
        ]);

        let patch = BookPatch {
            format: Some(BookFormat::Paper { pages: 60 }),
            ..Default::default()
        };
        let updated = mutations.update_book(1, patch).await.unwrap();
        assert_eq!(updated.details.format, BookFormat::Paper { pages: 60 });

        let books = store.snapshot().unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0], updated);
        assert_eq!(books[1].id, 2);
        assert_eq!(books[1].details.format, BookFormat::Audio { minutes: 10 });
    }

    #[tokio::test]
    async fn test_update_of_uncached_book_leaves_cache_alone() {
        let backend = Arc::new(MockBackend::with_books(vec![Book::new(
            5,
            details("Server only", BookFormat::Paper { pages: 1 }),
        )]));
        let store = Arc::new(BookStore::with_books(Vec::new()));
        let mutations = Mutations::new(Arc::clone(&backend) as Arc<dyn BooksBackend>, Arc::clone(&store));

        let patch = BookPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(mutations.update_book(5, patch).await.is_ok());
        assert_eq!(store.snapshot(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_failures_leave_cache_untouched() {
        let original = vec![Book::new(1, details("A", BookFormat::Paper { pages: 10 }))];
        let (backend, store, mutations) = setup(original.clone());

        backend.fail_next(MockFailure::Server).await;
        assert!(mutations
            .create_book(details("B", BookFormat::Paper { pages: 1 }))
            .await
            .is_err());

        backend.fail_next(MockFailure::Server).await;
        assert!(mutations.update_book(1, BookPatch::default()).await.is_err());

        backend.fail_next(MockFailure::Server).await;
        assert!(mutations.delete_book(1).await.is_err());

        assert_eq!(store.snapshot(), Some(original));
        assert!(!mutations.is_creating());
        assert!(!mutations.is_updating());
        assert!(!mutations.is_deleting());
    }

    #[tokio::test]
    async fn test_delete_missing_book_reports_not_found() {
        let (_backend, store, mutations) =
            setup(vec![Book::new(1, details("A", BookFormat::Paper { pages: 10 }))]);

        let err = mutations.delete_book(42).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_in_flight_flags_track_each_action() {
        let backend = Arc::new(MockBackend::new().with_latency(std::time::Duration::from_millis(30)));
        let store = Arc::new(BookStore::with_books(Vec::new()));
        let mutations = Arc::new(Mutations::new(
            Arc::clone(&backend) as Arc<dyn BooksBackend>,
            Arc::clone(&store),
        ));

        let task = {
            let mutations = Arc::clone(&mutations);
            tokio::spawn(async move {
                mutations
                    .create_book(details("Slow", BookFormat::Paper { pages: 3 }))
                    .await
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(mutations.is_creating());
        assert!(!mutations.is_updating());
        assert!(!mutations.is_deleting());

        task.await.unwrap().unwrap();
        assert!(!mutations.is_creating());
        assert_eq!(store.len(), 1);
    }
}
