//! API client for the book catalogue REST backend.
//!
//! This module provides the `ApiClient` struct, which issues the four
//! collection requests and decodes typed payloads.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::models::{Book, BookDetails, BookId, BookPatch};

use super::{ApiError, BooksBackend};

// ============================================================================
// Constants
// ============================================================================

/// Collection endpoint, relative to the base URL
const BOOKS_PATH: &str = "/books";

/// HTTP client for the catalogue backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for `base_url` with the given request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_base_url(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.base_url, BOOKS_PATH)
    }

    fn item_url(&self, id: BookId) -> String {
        format!("{}{}/{}", self.base_url, BOOKS_PATH, id)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Read the body and decode it, keeping decode failures apart from transport ones
    async fn decode<T: DeserializeOwned>(response: reqwest::Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[async_trait]
impl BooksBackend for ApiClient {
    async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        let url = self.collection_url();
        debug!(url = %url, "GET books");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let books: Vec<Book> = Self::decode(response, &url).await?;
        debug!(count = books.len(), "Books fetched");
        Ok(books)
    }

    async fn create_book(&self, details: &BookDetails) -> Result<Book, ApiError> {
        let url = self.collection_url();
        debug!(url = %url, title = %details.title, "POST book");

        let response = self.client.post(&url).json(details).send().await?;

        let response = Self::check_response(response).await?;
        Self::decode(response, &url).await
    }

    async fn update_book(&self, id: BookId, patch: &BookPatch) -> Result<Book, ApiError> {
        let url = self.item_url(id);
        debug!(url = %url, "PUT book");

        let response = self.client.put(&url).json(patch).send().await?;

        let response = Self::check_response(response).await?;
        Self::decode(response, &url).await
    }

    async fn delete_book(&self, id: BookId) -> Result<BookId, ApiError> {
        let url = self.item_url(id);
        debug!(url = %url, "DELETE book");

        let response = self.client.delete(&url).send().await?;

        // Any body is ignored; success is the confirmation
        Self::check_response(response).await?;
        Ok(id)
    }
}
