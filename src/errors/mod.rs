//! Error handling for the ingestion pipeline

pub mod types;

pub use types::{AppError, SourceError, SubtitleError};

/// Result alias used at module seams that return [`AppError`].
pub type AppResult<T> = Result<T, AppError>;
