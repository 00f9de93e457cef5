//! # LumiReads
//!
//! A TUI client for searching books and listening to AI-generated summaries.
//!
//! ## Features
//!
//! - **Catalog search**: Open Library search, directly or through the backend
//! - **Summaries**: by catalog key or from an uploaded `.pdf`/`.txt` document, in five languages
//! - **Narration**: base64 audio decoded into handles that can be played or saved
//! - **Last request wins**: every request carries a token and stale answers are dropped

pub mod audio;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod export;
pub mod language;
pub mod reader;
pub mod state;
pub mod summary;
pub mod ui;

pub use audio::AudioHandle;
pub use catalog::BookSummaryRef;
pub use config::Config;
pub use language::Language;
pub use reader::ReaderClient;
pub use state::ReaderState;
pub use summary::SummarizeResult;
