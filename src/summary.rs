//! Summary types - what the backend sends and what the client keeps.

use crate::audio::{AudioError, AudioHandle, AUDIO_MPEG};
use serde::Deserialize;

/// Stored in place of the summary when the backend answers without one
pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary received.";

/// Body returned by both summarization routes.
///
/// The backend may send `null` for either field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummarizeResponse {
    #[serde(default)]
    pub summary: Option<String>,
    /// Base64-encoded MPEG audio
    #[serde(default)]
    pub audio: Option<String>,
}

/// Summary text and narration held by the client until the next request
#[derive(Debug, Default)]
pub struct SummarizeResult {
    pub summary: Option<String>,
    pub audio: Option<AudioHandle>,
}

impl SummarizeResult {
    /// Result of a failed request: fixed text, no audio
    pub fn failed(text: &str) -> Self {
        Self {
            summary: Some(text.to_string()),
            audio: None,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

impl SummarizeResponse {
    /// Resolve the wire response into a result.
    ///
    /// An empty or missing summary becomes [`NO_SUMMARY_PLACEHOLDER`]; an empty
    /// or missing audio payload means no audio. Malformed audio fails the whole response.
    pub fn resolve(self) -> Result<SummarizeResult, AudioError> {
        let summary = self
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_SUMMARY_PLACEHOLDER.to_string());

        let audio = match self.audio.filter(|a| !a.is_empty()) {
            Some(b64) => Some(AudioHandle::from_base64(&b64, AUDIO_MPEG)?),
            None => None,
        };

        Ok(SummarizeResult {
            summary: Some(summary),
            audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_summary_uses_placeholder() {
        let response: SummarizeResponse = serde_json::from_str("{}").unwrap();
        let result = response.resolve().unwrap();
        assert_eq!(result.summary.as_deref(), Some(NO_SUMMARY_PLACEHOLDER));
        assert!(!result.has_audio());
    }

    #[test]
    fn null_and_empty_fields_are_absent() {
        let response: SummarizeResponse =
            serde_json::from_str(r#"{"summary": "", "audio": null}"#).unwrap();
        let result = response.resolve().unwrap();
        assert_eq!(result.summary.as_deref(), Some(NO_SUMMARY_PLACEHOLDER));
        assert!(result.audio.is_none());

        let response: SummarizeResponse =
            serde_json::from_str(r#"{"summary": "Hi", "audio": ""}"#).unwrap();
        assert!(response.resolve().unwrap().audio.is_none());
    }

    #[test]
    fn audio_is_decoded() {
        let response = SummarizeResponse {
            summary: Some("A tale.".into()),
            audio: Some("SUQzAwAA".into()),
        };
        let result = response.resolve().unwrap();
        let audio = result.audio.expect("audio");
        assert_eq!(audio.bytes(), b"ID3\x03\x00\x00");
        assert_eq!(audio.mime(), AUDIO_MPEG);
    }

    #[test]
    fn malformed_audio_fails() {
        let response = SummarizeResponse {
            summary: Some("A tale.".into()),
            audio: Some("%%%".into()),
        };
        assert!(response.resolve().is_err());
    }
}
