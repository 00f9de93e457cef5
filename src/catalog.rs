//! Book catalog search.
//!
//! Queries Open Library's `search.json` directly, or the summarization
//! backend's `/search_book` route, and projects the hits into [`BookSummaryRef`]s.

use crate::config::{BackendConfig, CatalogConfig, CatalogSource};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// User-Agent string identifying this client
pub(crate) const USER_AGENT: &str = concat!(
    "lumireads/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/cladam/lumireads)"
);

/// Maximum number of catalog hits kept per search
pub const MAX_RESULTS: usize = 10;

/// Author shown when the catalog has none
pub const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("catalog returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to parse catalog response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A candidate book from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookSummaryRef {
    pub title: Option<String>,
    pub author: String,
    /// Open Library cover image id
    pub cover_id: Option<u64>,
    /// Catalog key, e.g. `/works/OL45804W`
    pub key: String,
}

impl BookSummaryRef {
    /// Title for display
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Medium-size cover image URL, if the book has a cover
    pub fn cover_url(&self, covers_base: &str) -> Option<String> {
        self.cover_id.map(|id| {
            format!("{}/b/id/{}-M.jpg", covers_base.trim_end_matches('/'), id)
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    title: Option<String>,
    author_name: Option<Vec<String>>,
    cover_i: Option<u64>,
    #[serde(default)]
    key: String,
}

impl From<SearchDoc> for BookSummaryRef {
    fn from(doc: SearchDoc) -> Self {
        let author = doc
            .author_name
            .and_then(|names| names.into_iter().next())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Self {
            title: doc.title,
            author,
            cover_id: doc.cover_i,
            key: doc.key,
        }
    }
}

/// Shape of the backend's `/search_book` entries
#[derive(Debug, Deserialize)]
struct BackendBook {
    title: Option<String>,
    author: Option<String>,
    cover_i: Option<u64>,
    #[serde(default)]
    key: String,
}

impl From<BackendBook> for BookSummaryRef {
    fn from(book: BackendBook) -> Self {
        Self {
            title: book.title,
            author: book
                .author
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            cover_id: book.cover_i,
            key: book.key,
        }
    }
}

/// Create a configured HTTP client
pub(crate) fn create_client(timeout: Option<Duration>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Client for the book catalog
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    source: CatalogSource,
    catalog_url: String,
    backend_url: String,
}

impl CatalogClient {
    pub fn new(catalog: &CatalogConfig, backend: &BackendConfig) -> Result<Self, CatalogError> {
        Ok(Self {
            http: create_client(catalog.timeout())?,
            source: catalog.source,
            catalog_url: catalog.base_url.trim_end_matches('/').to_string(),
            backend_url: backend.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search the catalog and return at most [`MAX_RESULTS`] hits in catalog order
    pub async fn search(&self, query: &str) -> Result<Vec<BookSummaryRef>, CatalogError> {
        match self.source {
            CatalogSource::OpenLibrary => self.search_open_library(query).await,
            CatalogSource::Backend => self.search_backend(query).await,
        }
    }

    async fn search_open_library(&self, query: &str) -> Result<Vec<BookSummaryRef>, CatalogError> {
        let url = format!("{}/search.json", self.catalog_url);
        tracing::debug!(%url, query, "searching catalog");

        let body = self.fetch(&url, ("q", query)).await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;

        Ok(parsed
            .docs
            .into_iter()
            .take(MAX_RESULTS)
            .map(BookSummaryRef::from)
            .collect())
    }

    async fn search_backend(&self, query: &str) -> Result<Vec<BookSummaryRef>, CatalogError> {
        let url = format!("{}/search_book", self.backend_url);
        tracing::debug!(%url, query, "searching catalog through backend");

        let body = self.fetch(&url, ("title", query)).await?;
        let parsed: Vec<BackendBook> = serde_json::from_str(&body)?;

        Ok(parsed
            .into_iter()
            .take(MAX_RESULTS)
            .map(BookSummaryRef::from)
            .collect())
    }

    async fn fetch(&self, url: &str, param: (&str, &str)) -> Result<String, CatalogError> {
        let response = self.http.get(url).query(&[param]).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        Ok(response.text().await?)
    }
}
