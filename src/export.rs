//! Saving summaries and narration to disk.

use crate::audio::AudioHandle;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// File name used for the summary text
pub const SUMMARY_FILE_NAME: &str = "summary.txt";
/// File name used for the narrated audio
pub const AUDIO_FILE_NAME: &str = "summary.mp3";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to move export into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Save the summary text as `summary.txt` in `dir`.
///
/// Returns `Ok(None)` without touching the disk when there is no summary.
pub fn save_summary(dir: &Path, summary: Option<&str>) -> Result<Option<PathBuf>, ExportError> {
    match summary.filter(|s| !s.is_empty()) {
        Some(text) => save_as(dir, SUMMARY_FILE_NAME, text.as_bytes()).map(Some),
        None => Ok(None),
    }
}

/// Save the narrated audio as `summary.mp3` in `dir`.
///
/// Returns `Ok(None)` when there is no audio.
pub fn save_audio(dir: &Path, audio: Option<&AudioHandle>) -> Result<Option<PathBuf>, ExportError> {
    match audio {
        Some(handle) => save_as(dir, AUDIO_FILE_NAME, handle.bytes()).map(Some),
        None => Ok(None),
    }
}

/// Write `bytes` to `dir/file_name`, replacing any previous file atomically
fn save_as(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(file_name);

    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.flush()?;
    staged.persist(&target)?;

    tracing::debug!(path = %target.display(), size = bytes.len(), "saved export");
    Ok(target)
}
