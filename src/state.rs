//! Client state and its transitions.
//!
//! [`ReaderState`] is owned by exactly one driver (the CLI or the TUI event
//! loop). Network work happens elsewhere; its outcomes are fed back through the
//! `finish_*` methods together with the [`RequestToken`] handed out by the
//! matching `begin_*` call. Only the latest token of each kind is applied.

use crate::audio::AudioHandle;
use crate::catalog::{BookSummaryRef, CatalogError};
use crate::language::Language;
use crate::reader::SummarizeError;
use crate::summary::SummarizeResult;
use std::path::PathBuf;

/// Identifies one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct ReaderState {
    /// Free-text catalog query
    pub query: String,
    /// Target language for summaries
    pub language: Language,
    /// Document selected for upload
    pub upload: Option<PathBuf>,
    results: Vec<BookSummaryRef>,
    result: SummarizeResult,
    loading: bool,
    issued: u64,
    latest_search: Option<RequestToken>,
    latest_summary: Option<RequestToken>,
}

impl ReaderState {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    pub fn results(&self) -> &[BookSummaryRef] {
        &self.results
    }

    pub fn summary(&self) -> Option<&str> {
        self.result.summary.as_deref()
    }

    pub fn audio(&self) -> Option<&AudioHandle> {
        self.result.audio.as_ref()
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioHandle> {
        self.result.audio.as_mut()
    }

    /// True while the latest summarization request is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn next_token(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Start a search for the current query.
    ///
    /// Returns `None` when the query is blank; nothing changes in that case.
    pub fn begin_search(&mut self) -> Option<(RequestToken, String)> {
        let query = self.query.trim();
        if query.is_empty() {
            return None;
        }
        let query = query.to_string();
        let token = self.next_token();
        self.latest_search = Some(token);
        Some((token, query))
    }

    /// Apply a search outcome. Returns false if the outcome was stale.
    pub fn finish_search(
        &mut self,
        token: RequestToken,
        outcome: Result<Vec<BookSummaryRef>, CatalogError>,
    ) -> bool {
        if self.latest_search != Some(token) {
            tracing::debug!(?token, "discarding stale search response");
            return false;
        }

        self.results = match outcome {
            Ok(books) => books,
            Err(e) => {
                tracing::warn!(error = %e, "catalog search failed");
                Vec::new()
            }
        };
        true
    }

    /// Start a summarization: raise the loading flag and drop the previous result.
    pub fn begin_summary(&mut self) -> RequestToken {
        let token = self.next_token();
        self.latest_summary = Some(token);
        self.loading = true;
        self.result = SummarizeResult::default();
        token
    }

    /// Apply a summarization outcome. Returns false if the outcome was stale.
    ///
    /// Failures replace the summary with `failure_text`. The loading flag is
    /// cleared whenever the outcome is applied.
    pub fn finish_summary(
        &mut self,
        token: RequestToken,
        outcome: Result<SummarizeResult, SummarizeError>,
        failure_text: &str,
    ) -> bool {
        if self.latest_summary != Some(token) {
            tracing::debug!(?token, "discarding stale summary response");
            return false;
        }

        self.result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "summarization failed");
                SummarizeResult::failed(failure_text)
            }
        };
        self.loading = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AUDIO_MPEG;
    use crate::backend::BackendError;
    use crate::catalog::UNKNOWN_AUTHOR;
    use crate::reader::UPLOAD_FAILURE_TEXT;

    fn book(key: &str) -> BookSummaryRef {
        BookSummaryRef {
            title: Some(key.to_string()),
            author: UNKNOWN_AUTHOR.to_string(),
            cover_id: None,
            key: key.to_string(),
        }
    }

    fn backend_failure() -> SummarizeError {
        SummarizeError::Backend(BackendError::UnsupportedDocument("x.doc".into()))
    }

    #[test]
    fn blank_query_issues_nothing() {
        let mut state = ReaderState::default();
        state.query = "dune".into();
        let (token, _) = state.begin_search().unwrap();
        state.finish_search(token, Ok(vec![book("/works/OL1W")]));

        state.query = "   \t".into();
        assert!(state.begin_search().is_none());
        assert_eq!(state.results().len(), 1);
    }

    #[test]
    fn search_query_is_trimmed() {
        let mut state = ReaderState::default();
        state.query = "  dune ".into();
        let (_, query) = state.begin_search().unwrap();
        assert_eq!(query, "dune");
    }

    #[test]
    fn failed_search_clears_results() {
        let mut state = ReaderState::default();
        state.query = "dune".into();
        let (token, _) = state.begin_search().unwrap();
        state.finish_search(token, Ok(vec![book("/works/OL1W")]));

        let (token, _) = state.begin_search().unwrap();
        let err = serde_json::from_str::<u8>("x").unwrap_err();
        assert!(state.finish_search(token, Err(CatalogError::ParseError(err))));
        assert!(state.results().is_empty());
    }

    #[test]
    fn stale_search_is_discarded() {
        let mut state = ReaderState::default();
        state.query = "dune".into();
        let (first, _) = state.begin_search().unwrap();
        let (second, _) = state.begin_search().unwrap();

        assert!(state.finish_search(second, Ok(vec![book("/works/NEW")])));
        assert!(!state.finish_search(first, Ok(vec![book("/works/OLD")])));
        assert_eq!(state.results()[0].key, "/works/NEW");
    }

    #[test]
    fn loading_flag_follows_request_lifecycle() {
        let mut state = ReaderState::default();
        assert!(!state.is_loading());

        let token = state.begin_summary();
        assert!(state.is_loading());
        assert!(state.summary().is_none());

        let result = SummarizeResult {
            summary: Some("A tale.".into()),
            audio: None,
        };
        assert!(state.finish_summary(token, Ok(result), "failed"));
        assert!(!state.is_loading());
        assert_eq!(state.summary(), Some("A tale."));
    }

    #[test]
    fn failure_sets_text_and_clears_audio() {
        let mut state = ReaderState::default();
        let token = state.begin_summary();
        let result = SummarizeResult {
            summary: Some("first".into()),
            audio: Some(AudioHandle::new(vec![1, 2, 3], AUDIO_MPEG)),
        };
        state.finish_summary(token, Ok(result), "failed");
        assert!(state.audio().is_some());

        let token = state.begin_summary();
        assert!(state.audio().is_none());
        state.finish_summary(token, Err(backend_failure()), UPLOAD_FAILURE_TEXT);

        assert!(!state.is_loading());
        assert_eq!(state.summary(), Some(UPLOAD_FAILURE_TEXT));
        assert!(state.audio().is_none());
    }

    #[test]
    fn stale_summary_keeps_loading_for_latest() {
        let mut state = ReaderState::default();
        let first = state.begin_summary();
        let second = state.begin_summary();

        let old = SummarizeResult {
            summary: Some("old".into()),
            audio: None,
        };
        assert!(!state.finish_summary(first, Ok(old), "failed"));
        assert!(state.is_loading());
        assert!(state.summary().is_none());

        let new = SummarizeResult {
            summary: Some("new".into()),
            audio: None,
        };
        assert!(state.finish_summary(second, Ok(new), "failed"));
        assert!(!state.is_loading());
        assert_eq!(state.summary(), Some("new"));
    }

    #[test]
    fn search_and_summary_tokens_are_independent() {
        let mut state = ReaderState::default();
        let summary = state.begin_summary();
        state.query = "dune".into();
        let (search, _) = state.begin_search().unwrap();

        assert!(state.finish_summary(summary, Ok(SummarizeResult::failed("x")), "failed"));
        assert!(state.finish_search(search, Ok(vec![])));
    }

    #[test]
    fn search_does_not_raise_loading() {
        let mut state = ReaderState::default();
        state.query = "dune".into();
        let (token, _) = state.begin_search().unwrap();
        assert!(!state.is_loading());

        state.finish_search(token, Ok(vec![book("/works/OL1W")]));
        assert!(!state.is_loading());
    }
}
