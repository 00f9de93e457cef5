//! Summarization backend client.
//!
//! The backend turns a catalog key or an uploaded document into summary text
//! and base64 narration.

use crate::catalog::create_client;
use crate::config::BackendConfig;
use crate::language::Language;
use crate::summary::SummarizeResponse;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("backend returned status {status}{}", detail(.message))]
    Status {
        status: reqwest::StatusCode,
        message: Option<String>,
    },
    #[error("failed to read {path}: {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported document {0}: only .pdf and .txt files can be summarized")]
    UnsupportedDocument(PathBuf),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Kind of document the backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
}

impl DocumentKind {
    /// Detect the kind from a file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Text => "text/plain",
        }
    }
}

/// A local document ready to be posted
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            bytes,
        }
    }

    /// Read a `.pdf` or `.txt` file from disk
    pub async fn from_path(path: &Path) -> Result<Self, BackendError> {
        let kind = DocumentKind::from_path(path)
            .ok_or_else(|| BackendError::UnsupportedDocument(path.to_path_buf()))?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| BackendError::ReadDocument {
                path: path.to_path_buf(),
                source,
            })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        Ok(Self::new(file_name, kind, bytes))
    }
}

/// Error body the backend sends with 4xx/5xx answers
#[derive(Debug, Deserialize)]
struct ErrorBody {
    summary: Option<String>,
}

/// Client for the summarization backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            http: create_client(config.timeout())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Summarize a catalog entry by its key
    pub async fn summarize_book(
        &self,
        book_key: &str,
        language: Language,
    ) -> Result<SummarizeResponse, BackendError> {
        let url = format!("{}/summarize_book", self.base_url);
        tracing::debug!(%url, book_key, language = language.code(), "requesting book summary");

        let response = self
            .http
            .post(&url)
            .form(&[("book_key", book_key), ("language", language.code())])
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Summarize an uploaded document
    pub async fn summarize_document(
        &self,
        upload: DocumentUpload,
        language: Language,
    ) -> Result<SummarizeResponse, BackendError> {
        let url = format!("{}/summarize", self.base_url);
        tracing::debug!(
            %url,
            file = %upload.file_name,
            size = upload.bytes.len(),
            language = language.code(),
            "requesting document summary"
        );

        let file_part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(upload.kind.mime())?;

        let form = Form::new()
            .part("file", file_part)
            .text("language", language.code());

        let response = self.http.post(&url).multipart(form).send().await?;

        Self::parse(response).await
    }

    async fn parse(response: Response) -> Result<SummarizeResponse, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.summary);
            return Err(BackendError::Status { status, message });
        }

        Ok(response.json().await?)
    }
}
