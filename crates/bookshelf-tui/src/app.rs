//! Application state management for the bookshelf TUI.
//!
//! This module contains the `App` struct that owns the UI state and the
//! catalogue handle, and coordinates the background tasks that talk to the
//! backend.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use bookshelf_core::{ApiClient, ApiError, Book, BookId, Catalog, Config};

use crate::dialog::{BookDialog, DialogTarget, Submission};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    InDialog,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// One-line message for the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Outcomes sent back from spawned tasks through the MPSC channel.
///
/// The cache itself has already been patched by the catalogue when these
/// arrive; they only drive dialogs and status messages.
#[derive(Debug)]
enum TaskResult {
    /// Collection fetched (book count) or failed
    Loaded(Result<usize, String>),
    Created(Result<Book, String>),
    Updated(Result<Book, String>),
    Deleted(BookId, Result<BookId, String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    pub config: Config,
    pub catalog: Catalog,

    pub state: AppState,
    pub selection: usize,
    pub dialog: Option<BookDialog>,
    /// Books whose delete request is in flight
    pub deleting: HashSet<BookId>,
    pub status_message: Option<StatusMessage>,
    /// Render ticks, drives spinners
    pub tick: usize,

    task_tx: mpsc::Sender<TaskResult>,
    task_rx: mpsc::Receiver<TaskResult>,
}

impl App {
    /// Create the app against the configured REST backend
    pub fn new(config: Config) -> Result<Self> {
        let api = ApiClient::from_config(&config).context("Failed to create API client")?;
        info!(base_url = api.base_url(), "Using catalogue backend");
        let catalog = Catalog::new(Arc::new(api));
        Ok(Self::with_catalog(config, catalog))
    }

    /// Create the app over an existing catalogue (any backend)
    pub fn with_catalog(config: Config, catalog: Catalog) -> Self {
        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            config,
            catalog,
            state: AppState::Normal,
            selection: 0,
            dialog: None,
            deleting: HashSet::new(),
            status_message: None,
            tick: 0,
            task_tx,
            task_rx,
        }
    }

    #[cfg(test)]
    pub fn with_backend(config: Config, backend: Arc<dyn bookshelf_core::BooksBackend>) -> Self {
        Self::with_catalog(config, Catalog::new(backend))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cached books, `None` until the first fetch succeeds
    #[cfg(test)]
    pub fn books(&self) -> Option<Vec<Book>> {
        self.catalog.store().snapshot()
    }

    pub fn book_count(&self) -> usize {
        self.catalog.store().len()
    }

    pub fn selected_book(&self) -> Option<Book> {
        self.catalog
            .store()
            .view(|books| books?.get(self.selection).cloned())
    }

    pub fn is_loading(&self) -> bool {
        self.catalog.query().is_loading()
    }

    /// Whether the open dialog's save action is currently unavailable
    pub fn save_disabled(&self) -> bool {
        let mutations = self.catalog.mutations();
        match self.dialog.as_ref() {
            Some(dialog) if dialog.submitting => true,
            Some(dialog) => match dialog.target {
                DialogTarget::New => mutations.is_creating(),
                DialogTarget::Existing(_) => mutations.is_updating(),
            },
            None => true,
        }
    }

    /// Advance animations by one frame
    pub fn on_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn select_next(&mut self, step: usize) {
        let len = self.book_count();
        if len > 0 {
            self.selection = (self.selection + step).min(len - 1);
        }
    }

    pub fn select_prev(&mut self, step: usize) {
        self.selection = self.selection.saturating_sub(step);
    }

    pub fn select_first(&mut self) {
        self.selection = 0;
    }

    pub fn select_last(&mut self) {
        self.selection = self.book_count().saturating_sub(1);
    }

    /// Keep the selection on a row after the collection shrinks
    fn clamp_selection(&mut self) {
        let len = self.book_count();
        if self.selection >= len {
            self.selection = len.saturating_sub(1);
        }
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send task result - channel closed");
        }
    }

    /// Log a failed request and turn it into a message for the user
    fn describe_failure(action: &str, e: &ApiError) -> String {
        error!(error = %e, action, "Request failed");
        e.user_message()
    }

    /// Fetch the collection in the background unless it is already cached
    pub fn load_books(&mut self) {
        let catalog = self.catalog.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = catalog
                .query()
                .load()
                .await
                .map(|books| books.len())
                .map_err(|e| Self::describe_failure("load", &e));
            Self::send_result(&tx, TaskResult::Loaded(result)).await;
        });
    }

    /// Refetch the collection on user request
    pub fn revalidate_books(&mut self) {
        if self.is_loading() {
            return;
        }
        info!("Reloading book collection");
        let catalog = self.catalog.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = catalog
                .query()
                .revalidate()
                .await
                .map(|books| books.len())
                .map_err(|e| Self::describe_failure("reload", &e));
            Self::send_result(&tx, TaskResult::Loaded(result)).await;
        });
        self.status_message = Some(StatusMessage::info("Reloading books..."));
    }

    /// Open the add dialog
    pub fn open_add_dialog(&mut self) {
        self.dialog = Some(BookDialog::add());
        self.state = AppState::InDialog;
    }

    /// Open the edit dialog for the selected book
    pub fn open_edit_dialog(&mut self) {
        if let Some(book) = self.selected_book() {
            self.dialog = Some(BookDialog::edit(&book));
            self.state = AppState::InDialog;
        }
    }

    /// Close the dialog without sending anything
    pub fn cancel_dialog(&mut self) {
        if self.dialog.take().is_some() {
            debug!("Dialog cancelled");
        }
        self.state = AppState::Normal;
    }

    /// Validate the open dialog and, if valid, send its request in the background
    pub fn submit_dialog(&mut self) {
        if self.save_disabled() {
            return;
        }
        let Some(submission) = self.dialog.as_mut().and_then(BookDialog::begin_submit) else {
            return;
        };

        let catalog = self.catalog.clone();
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let result = match submission {
                Submission::Create(details) => TaskResult::Created(
                    catalog
                        .mutations()
                        .create_book(details)
                        .await
                        .map_err(|e| Self::describe_failure("create", &e)),
                ),
                Submission::Update(id, patch) => TaskResult::Updated(
                    catalog
                        .mutations()
                        .update_book(id, patch)
                        .await
                        .map_err(|e| Self::describe_failure("update", &e)),
                ),
            };
            Self::send_result(&tx, result).await;
        });
    }

    /// Delete the selected book right away
    pub fn delete_selected(&mut self) {
        let Some(book) = self.selected_book() else {
            return;
        };
        if !self.deleting.insert(book.id) {
            return;
        }

        let catalog = self.catalog.clone();
        let tx = self.task_tx.clone();
        let id = book.id;
        tokio::spawn(async move {
            let result = catalog
                .mutations()
                .delete_book(id)
                .await
                .map_err(|e| Self::describe_failure("delete", &e));
            Self::send_result(&tx, TaskResult::Deleted(id, result)).await;
        });
    }

    /// Drain finished background tasks
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            self.process_task_result(result);
        }
    }

    /// Wait for the next background result instead of polling
    #[cfg(test)]
    pub async fn wait_for_task(&mut self) -> bool {
        match self.task_rx.recv().await {
            Some(result) => {
                self.process_task_result(result);
                true
            }
            None => false,
        }
    }

    /// Close the dialog after its request succeeded, if it is the one waiting
    fn finish_dialog(&mut self, target: DialogTarget) {
        let waiting = self
            .dialog
            .as_ref()
            .is_some_and(|d| d.submitting && d.target == target);
        if waiting {
            self.dialog = None;
            self.state = AppState::Normal;
        }
    }

    /// Report a failed dialog request inside the dialog, or on the status bar if it was cancelled
    fn fail_dialog(&mut self, message: String) {
        match self.dialog.as_mut() {
            Some(dialog) if dialog.submitting => dialog.submit_failed(message),
            _ => self.status_message = Some(StatusMessage::error(message)),
        }
    }

    fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::Loaded(Ok(count)) => {
                debug!(count, "Collection ready");
                if matches!(self.status_message, Some(ref m) if !m.is_error) {
                    self.status_message = None;
                }
            }
            TaskResult::Loaded(Err(message)) => {
                self.status_message = Some(StatusMessage::error(format!("Could not load books: {}", message)));
            }
            TaskResult::Created(Ok(book)) => {
                self.finish_dialog(DialogTarget::New);
                self.selection = self.book_count().saturating_sub(1);
                self.status_message = Some(StatusMessage::info(format!("Added \"{}\"", book.details.title)));
            }
            TaskResult::Updated(Ok(book)) => {
                self.finish_dialog(DialogTarget::Existing(book.id));
                self.status_message = Some(StatusMessage::info(format!("Saved \"{}\"", book.details.title)));
            }
            TaskResult::Created(Err(message)) | TaskResult::Updated(Err(message)) => {
                self.fail_dialog(message);
            }
            TaskResult::Deleted(id, result) => {
                self.deleting.remove(&id);
                match result {
                    Ok(_) => self.status_message = Some(StatusMessage::info("Book deleted")),
                    Err(message) => {
                        warn!(id, "Delete failed");
                        self.status_message = Some(StatusMessage::error(format!("Delete failed: {}", message)));
                    }
                }
            }
        }
        self.clamp_selection();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::api::mock::{MockBackend, MockFailure};
    use bookshelf_core::form::FormField;
    use bookshelf_core::{BookDetails, BookFormat, BooksBackend};

    fn book(id: BookId, title: &str) -> Book {
        Book::new(
            id,
            BookDetails {
                title: title.to_string(),
                author: "Author".to_string(),
                genre: "Genre".to_string(),
                brief_description: String::new(),
                format: BookFormat::Paper { pages: 100 },
            },
        )
    }

    async fn loaded_app(books: Vec<Book>) -> (Arc<MockBackend>, App) {
        let backend = Arc::new(MockBackend::with_books(books));
        let mut app = App::with_backend(Config::default(), Arc::clone(&backend) as Arc<dyn BooksBackend>);
        app.load_books();
        assert!(app.wait_for_task().await);
        (backend, app)
    }

    fn fill_add_dialog(app: &mut App, title: &str) {
        let dialog = app.dialog.as_mut().unwrap();
        dialog.form.title = title.to_string();
        dialog.form.author = "A".to_string();
        dialog.form.genre = "G".to_string();
        dialog.form.length = "12".to_string();
    }

    #[tokio::test]
    async fn test_load_populates_cache() {
        let (_backend, app) = loaded_app(vec![book(1, "One"), book(2, "Two")]).await;
        assert_eq!(app.book_count(), 2);
        assert!(!app.is_loading());
        assert_eq!(app.selected_book().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_add_dialog_closes_on_success() {
        let (backend, mut app) = loaded_app(Vec::new()).await;

        app.open_add_dialog();
        assert_eq!(app.state, AppState::InDialog);
        fill_add_dialog(&mut app, "New");
        app.submit_dialog();
        assert!(app.dialog.as_ref().unwrap().submitting);
        assert!(app.save_disabled());

        assert!(app.wait_for_task().await);
        assert!(app.dialog.is_none());
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.book_count(), 1);
        assert_eq!(backend.list_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_dialog_sends_nothing() {
        let (backend, mut app) = loaded_app(Vec::new()).await;
        let before = backend.request_count();

        app.open_add_dialog();
        app.submit_dialog();

        let dialog = app.dialog.as_ref().unwrap();
        assert!(!dialog.submitting);
        assert_eq!(dialog.errors.get(FormField::Title), Some("Required"));
        assert_eq!(backend.request_count(), before);
    }

    #[tokio::test]
    async fn test_failed_create_shows_banner_and_stays_open() {
        let (backend, mut app) = loaded_app(Vec::new()).await;
        backend.fail_next(MockFailure::Server).await;

        app.open_add_dialog();
        fill_add_dialog(&mut app, "New");
        app.submit_dialog();
        assert!(app.wait_for_task().await);

        let dialog = app.dialog.as_ref().unwrap();
        assert!(!dialog.submitting);
        assert!(dialog.failure.is_some());
        assert_eq!(app.state, AppState::InDialog);
        assert_eq!(app.book_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_dialog_still_patches_cache() {
        let (_backend, mut app) = loaded_app(Vec::new()).await;

        app.open_add_dialog();
        fill_add_dialog(&mut app, "Late");
        app.submit_dialog();
        app.cancel_dialog();
        assert_eq!(app.state, AppState::Normal);

        assert!(app.wait_for_task().await);
        assert!(app.dialog.is_none());
        assert_eq!(app.book_count(), 1);
    }

    #[tokio::test]
    async fn test_edit_updates_selected_row() {
        let (_backend, mut app) = loaded_app(vec![book(1, "One"), book(2, "Two")]).await;
        app.select_next(1);

        app.open_edit_dialog();
        app.dialog.as_mut().unwrap().form.title = "Second".to_string();
        app.submit_dialog();
        assert!(app.wait_for_task().await);

        let titles: Vec<String> = app.books().unwrap().into_iter().map(|b| b.details.title).collect();
        assert_eq!(titles, vec!["One", "Second"]);
        assert!(app.dialog.is_none());
    }

    #[tokio::test]
    async fn test_delete_selected_clamps_selection() {
        let (_backend, mut app) = loaded_app(vec![book(1, "One"), book(2, "Two")]).await;
        app.select_last();

        app.delete_selected();
        assert!(app.deleting.contains(&2));
        assert!(app.wait_for_task().await);

        assert!(app.deleting.is_empty());
        assert_eq!(app.book_count(), 1);
        assert_eq!(app.selection, 0);
    }

    #[tokio::test]
    async fn test_failed_delete_reports_error() {
        let (backend, mut app) = loaded_app(vec![book(1, "One")]).await;
        backend.fail_next(MockFailure::NotFound).await;

        app.delete_selected();
        assert!(app.wait_for_task().await);

        assert_eq!(app.book_count(), 1);
        assert!(app.status_message.as_ref().unwrap().is_error);
    }

    #[tokio::test]
    async fn test_failed_load_reports_error() {
        let backend = Arc::new(MockBackend::new());
        backend.fail_next(MockFailure::Server).await;
        let mut app = App::with_backend(Config::default(), backend);

        app.load_books();
        assert!(app.wait_for_task().await);

        assert!(app.books().is_none());
        assert!(app.status_message.as_ref().unwrap().is_error);
    }

    #[tokio::test]
    async fn test_navigation_bounds() {
        let (_backend, mut app) = loaded_app(vec![book(1, "One"), book(2, "Two"), book(3, "Three")]).await;
        app.select_next(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 2);
        app.select_prev(PAGE_SCROLL_SIZE);
        assert_eq!(app.selection, 0);
        app.select_last();
        assert_eq!(app.selection, 2);
        app.select_first();
        assert_eq!(app.selection, 0);
    }
}
