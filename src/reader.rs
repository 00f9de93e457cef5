//! The reader client: one state, three flows, two exports.

use crate::audio::AudioError;
use crate::backend::{BackendClient, BackendError, DocumentUpload};
use crate::catalog::{BookSummaryRef, CatalogClient, CatalogError};
use crate::config::Config;
use crate::export::{self, ExportError};
use crate::language::Language;
use crate::state::ReaderState;
use crate::summary::SummarizeResult;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shown when summarizing a catalog book fails
pub const BOOK_FAILURE_TEXT: &str = "Error summarizing book. Is backend running?";
/// Shown when summarizing an uploaded document fails
pub const UPLOAD_FAILURE_TEXT: &str = "Failed to summarize file. Check backend.";

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("failed to decode narration: {0}")]
    Audio(#[from] AudioError),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to set up catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("failed to set up backend client: {0}")]
    Backend(#[from] BackendError),
}

/// What to summarize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarySource {
    /// A catalog entry, by key
    Book { key: String },
    /// A local `.pdf` or `.txt` file
    Upload(PathBuf),
}

impl SummarySource {
    /// Text shown in place of the summary when this kind of request fails
    pub fn failure_text(&self) -> &'static str {
        match self {
            SummarySource::Book { .. } => BOOK_FAILURE_TEXT,
            SummarySource::Upload(_) => UPLOAD_FAILURE_TEXT,
        }
    }
}

/// A one-shot summarization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeRequest {
    pub source: SummarySource,
    pub language: Language,
}

/// Perform a summarization request against the backend and resolve the response
pub async fn run_summary(
    backend: &BackendClient,
    request: SummarizeRequest,
) -> Result<SummarizeResult, SummarizeError> {
    let response = match &request.source {
        SummarySource::Book { key } => backend.summarize_book(key, request.language).await?,
        SummarySource::Upload(path) => {
            let upload = DocumentUpload::from_path(path).await?;
            backend.summarize_document(upload, request.language).await?
        }
    };
    Ok(response.resolve()?)
}

/// Owns the client state and drives each flow to completion
#[derive(Debug)]
pub struct ReaderClient {
    catalog: CatalogClient,
    backend: BackendClient,
    state: ReaderState,
}

impl ReaderClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Ok(Self::with_clients(
            CatalogClient::new(&config.catalog, &config.backend)?,
            BackendClient::new(&config.backend)?,
            config.language,
        ))
    }

    pub fn with_clients(catalog: CatalogClient, backend: BackendClient, language: Language) -> Self {
        Self {
            catalog,
            backend,
            state: ReaderState::new(language),
        }
    }

    pub fn state(&self) -> &ReaderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ReaderState {
        &mut self.state
    }

    pub fn set_language(&mut self, language: Language) {
        self.state.language = language;
    }

    /// Search the catalog for `query`.
    ///
    /// A blank query issues no request and leaves the results as they were.
    pub async fn search(&mut self, query: &str) -> &[BookSummaryRef] {
        self.state.query = query.to_string();
        if let Some((token, query)) = self.state.begin_search() {
            let outcome = self.catalog.search(&query).await;
            self.state.finish_search(token, outcome);
        }
        self.state.results()
    }

    /// Summarize a catalog entry in the selected language
    pub async fn summarize_book(&mut self, key: &str) {
        self.summarize(SummarySource::Book {
            key: key.to_string(),
        })
        .await;
    }

    /// Choose the document used by [`ReaderClient::summarize_upload`]
    pub fn select_upload(&mut self, path: impl Into<PathBuf>) {
        self.state.upload = Some(path.into());
    }

    /// Summarize the selected document. Does nothing when no file is selected.
    pub async fn summarize_upload(&mut self) {
        let Some(path) = self.state.upload.clone() else {
            return;
        };
        self.summarize(SummarySource::Upload(path)).await;
    }

    async fn summarize(&mut self, source: SummarySource) {
        let failure_text = source.failure_text();
        let request = SummarizeRequest {
            source,
            language: self.state.language,
        };

        let token = self.state.begin_summary();
        let outcome = run_summary(&self.backend, request).await;
        self.state.finish_summary(token, outcome, failure_text);
    }

    /// Save the current summary as `summary.txt` in `dir`
    pub fn download_summary(&self, dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        export::save_summary(dir, self.state.summary())
    }

    /// Save the current narration as `summary.mp3` in `dir`
    pub fn download_audio(&self, dir: &Path) -> Result<Option<PathBuf>, ExportError> {
        export::save_audio(dir, self.state.audio())
    }
}
