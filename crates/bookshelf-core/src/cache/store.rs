use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Book, BookId};

#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Session-scoped cache of the book collection.
///
/// Holds either nothing (not yet loaded) or the ordered list of books as last
/// seen from the server. The query populates it; the mutations patch it in
/// place after the server confirms a change. Nothing is written to disk.
#[derive(Debug, Default)]
pub struct BookStore {
    inner: RwLock<Option<CachedData<Vec<Book>>>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `books`
    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            inner: RwLock::new(Some(CachedData::new(books))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<CachedData<Vec<Book>>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<CachedData<Vec<Book>>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Reads =====

    pub fn is_loaded(&self) -> bool {
        self.read().is_some()
    }

    /// Copy of the cached books, `None` if not yet loaded
    pub fn snapshot(&self) -> Option<Vec<Book>> {
        self.read().as_ref().map(|cached| cached.data.clone())
    }

    /// Run `f` against the cached books without cloning them
    pub fn view<R>(&self, f: impl FnOnce(Option<&[Book]>) -> R) -> R {
        let guard = self.read();
        f(guard.as_ref().map(|cached| cached.data.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.view(|books| books.map_or(0, |b| b.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: BookId) -> Option<Book> {
        self.view(|books| books?.iter().find(|b| b.id == id).cloned())
    }

    /// How long ago the cache last changed, `None` if not yet loaded
    pub fn age_display(&self) -> Option<String> {
        self.read().as_ref().map(|cached| cached.age_display())
    }

    // ===== Patches =====

    /// Replace the whole collection
    pub fn populate(&self, books: Vec<Book>) {
        debug!(count = books.len(), "Populating book cache");
        *self.write() = Some(CachedData::new(books));
    }

    /// Append a book at the end. An unloaded store becomes `[book]`.
    pub fn append(&self, book: Book) {
        let mut guard = self.write();
        match guard.as_mut() {
            Some(cached) => {
                cached.data.push(book);
                cached.cached_at = Utc::now();
            }
            None => *guard = Some(CachedData::new(vec![book])),
        }
    }

    /// Replace the book with the same id, keeping its position.
    /// Returns false (and changes nothing) if the id is not cached.
    pub fn replace(&self, book: Book) -> bool {
        let mut guard = self.write();
        let Some(cached) = guard.as_mut() else {
            return false;
        };
        match cached.data.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => {
                *slot = book;
                cached.cached_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Remove the book with `id`, keeping the order of the others.
    /// Returns false (and changes nothing) if the id is not cached.
    pub fn remove(&self, id: BookId) -> bool {
        let mut guard = self.write();
        let Some(cached) = guard.as_mut() else {
            return false;
        };
        let before = cached.data.len();
        cached.data.retain(|b| b.id != id);
        if cached.data.len() == before {
            return false;
        }
        cached.cached_at = Utc::now();
        true
    }

    /// Forget everything, back to not loaded
    pub fn clear(&self) {
        *self.write() = None;
    }
}

// ============================================================================
// Tests
// ============================================================================
