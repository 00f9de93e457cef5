//! Narrated audio handling.
//!
//! The backend ships audio as a base64 string. It is decoded in fixed-size
//! chunks into an [`AudioHandle`] that owns the bytes for export and, once
//! played, a temp file for external players. Dropping the handle releases both.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use tempfile::NamedTempFile;
use thiserror::Error;

/// MIME type of the narration produced by the backend
pub const AUDIO_MPEG: &str = "audio/mpeg";

/// Number of base64 characters decoded per chunk. Must be a multiple of 4.
const DECODE_CHUNK_CHARS: usize = 512;

/// Standard alphabet, padding optional and trailing bits tolerated, like `atob`.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("invalid base64 audio near character {offset}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: base64::DecodeSliceError,
    },
    #[error("audio i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode a base64 payload chunk by chunk.
///
/// ASCII whitespace is skipped. Malformed input fails with [`AudioError::Decode`].
pub fn decode_base64(input: &str) -> Result<Vec<u8>, AudioError> {
    let compact: Cow<'_, [u8]> = if input.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(
            input
                .bytes()
                .filter(|b| !b.is_ascii_whitespace())
                .collect(),
        )
    } else {
        Cow::Borrowed(input.as_bytes())
    };

    let mut decoded = Vec::with_capacity(base64::decoded_len_estimate(compact.len()));
    let mut scratch = [0u8; DECODE_CHUNK_CHARS];

    for (index, chunk) in compact.chunks(DECODE_CHUNK_CHARS).enumerate() {
        let written = LENIENT
            .decode_slice(chunk, &mut scratch)
            .map_err(|source| AudioError::Decode {
                offset: index * DECODE_CHUNK_CHARS,
                source,
            })?;
        decoded.extend_from_slice(&scratch[..written]);
    }

    Ok(decoded)
}

/// In-memory narrated audio, usable for playback and export.
pub struct AudioHandle {
    bytes: Vec<u8>,
    mime: String,
    playback: Option<NamedTempFile>,
}

impl AudioHandle {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
            playback: None,
        }
    }

    /// Decode a base64 payload into a handle
    pub fn from_base64(b64: &str, mime: &str) -> Result<Self, AudioError> {
        Ok(Self::new(decode_base64(b64)?, mime))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// File extension matching the MIME type, including the dot
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "audio/mpeg" | "audio/mp3" => ".mp3",
            "audio/wav" | "audio/x-wav" => ".wav",
            "audio/ogg" => ".ogg",
            _ => ".bin",
        }
    }

    /// Path of a temp file holding the audio, written on first use.
    ///
    /// The file lives as long as the handle.
    pub fn playback_path(&mut self) -> Result<&Path, AudioError> {
        let file = match self.playback.take() {
            Some(file) => file,
            None => {
                let mut file = tempfile::Builder::new()
                    .prefix("lumireads-")
                    .suffix(self.extension())
                    .tempfile()?;
                file.write_all(&self.bytes)?;
                file.flush()?;
                file
            }
        };
        Ok(self.playback.insert(file).path())
    }

    /// True once [`playback_path`](Self::playback_path) has written the temp file
    pub fn has_playback_file(&self) -> bool {
        self.playback.is_some()
    }

    /// Spawn `player` on the audio. The child is not waited on.
    pub fn play(&mut self, player: &str) -> Result<Child, AudioError> {
        let path = self.playback_path()?.to_path_buf();
        let mut parts = player.split_whitespace();
        let program = parts.next().unwrap_or(player);

        let child = Command::new(program)
            .args(parts)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::debug!(player = program, path = %path.display(), "started audio player");
        Ok(child)
    }
}

impl fmt::Debug for AudioHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioHandle")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("playback", &self.playback.as_ref().map(|p| p.path()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn round_trip_below_chunk_size() {
        let original = payload(100);
        let encoded = STANDARD.encode(&original);
        assert!(encoded.len() < DECODE_CHUNK_CHARS);
        assert_eq!(decode_base64(&encoded).unwrap(), original);
    }

    #[test]
    fn round_trip_across_many_chunks() {
        let original = payload(10_001);
        let encoded = STANDARD.encode(&original);
        assert!(encoded.len() > DECODE_CHUNK_CHARS * 10);
        assert_eq!(decode_base64(&encoded).unwrap(), original);
    }

    #[test]
    fn round_trip_exact_chunk_boundary() {
        // 384 bytes encode to exactly one chunk of 512 characters
        let original = payload(384);
        let encoded = STANDARD.encode(&original);
        assert_eq!(encoded.len(), DECODE_CHUNK_CHARS);
        assert_eq!(decode_base64(&encoded).unwrap(), original);
    }

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(decode_base64("").unwrap().is_empty());
    }

    #[test]
    fn tolerates_whitespace_and_missing_padding() {
        assert_eq!(decode_base64("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_base64("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn malformed_input_is_a_decode_error() {
        let err = decode_base64("not*base64!").unwrap_err();
        assert!(matches!(err, AudioError::Decode { offset: 0, .. }));
    }

    #[test]
    fn malformed_later_chunk_reports_its_offset() {
        let mut encoded = STANDARD.encode(payload(1000));
        encoded.replace_range(600..601, "*");
        let err = decode_base64(&encoded).unwrap_err();
        assert!(matches!(err, AudioError::Decode { offset: 512, .. }));
    }

    #[test]
    fn playback_file_is_removed_with_handle() {
        let mut handle = AudioHandle::new(b"ID3fake".to_vec(), AUDIO_MPEG);
        assert!(!handle.has_playback_file());
        let path = handle.playback_path().unwrap().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3fake");

        drop(handle);
        assert!(!path.exists());
    }
}
