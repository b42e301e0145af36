//! Query and mutation layer between the UI and the backend.
//!
//! `BooksQuery` fetches the collection once per session and serves it from the
//! `BookStore` afterwards. `Mutations` performs create/update/delete and, once
//! the server confirms, patches the store in place instead of refetching.
//! `Catalog` bundles the three behind one cheaply clonable handle.

pub mod mutation;
pub mod query;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::api::BooksBackend;
use crate::cache::BookStore;

pub use mutation::Mutations;
pub use query::{BooksQuery, QueryState};

/// Counts operations in progress. The count drops when the guard does, so an
/// abandoned future never leaves the flag set.
#[derive(Debug, Default)]
pub(crate) struct InFlight(AtomicUsize);

impl InFlight {
    pub(crate) fn start(&self) -> InFlightGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(&self.0)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

pub(crate) struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store, query and mutations sharing one backend.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<BookStore>,
    query: Arc<BooksQuery>,
    mutations: Arc<Mutations>,
}

impl Catalog {
    pub fn new(backend: Arc<dyn BooksBackend>) -> Self {
        Self::with_store(backend, Arc::new(BookStore::new()))
    }

    pub fn with_store(backend: Arc<dyn BooksBackend>, store: Arc<BookStore>) -> Self {
        Self {
            query: Arc::new(BooksQuery::new(Arc::clone(&backend), Arc::clone(&store))),
            mutations: Arc::new(Mutations::new(backend, Arc::clone(&store))),
            store,
        }
    }

    pub fn store(&self) -> &BookStore {
        &self.store
    }

    pub fn query(&self) -> &BooksQuery {
        &self.query
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }
}
