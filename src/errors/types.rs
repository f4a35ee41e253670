//! Error type definitions for the Omnicast ingestion pipeline
//!
//! This module defines all error types used throughout the pipeline,
//! providing a hierarchical error system that makes debugging and error
//! handling more straightforward. Per-item failures never cross an item
//! boundary; these types exist so the boundary code has something precise
//! to log and count.

use thiserror::Error;

/// Top-level application error type
///
/// This enum represents all possible errors that can occur in the pipeline.
/// It uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Source adapter errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Subtitle pipeline errors
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Source adapter specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Missing credentials for an authenticated provider
    #[error("Missing credentials: {adapter} requires {credential}")]
    MissingCredentials { adapter: String, credential: String },

    /// Non-success HTTP status from the provider
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Provider answered but returned nothing usable
    #[error("Empty payload from {adapter}")]
    EmptyPayload { adapter: String },

    /// Parsing errors for provider payloads
    #[error("Parse error: {adapter} - {message}")]
    Parse { adapter: String, message: String },

    /// Network connection timeouts
    #[error("Connection timeout: {url}")]
    Timeout { url: String },
}

/// Subtitle pipeline specific errors
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// Subtitle content could not be fetched
    #[error("Fetch failed: {url} - {message}")]
    Fetch { url: String, message: String },

    /// A provider declined or failed an operation
    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    /// External tool invocation failed
    #[error("Tool failed: {tool} - {message}")]
    Tool { tool: String, message: String },

    /// External tool exceeded its time budget
    #[error("Tool timed out: {tool} after {seconds}s")]
    ToolTimeout { tool: String, seconds: u64 },

    /// Subtitle artifact storage failures
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create a missing credentials error
    pub fn missing_credentials<A: Into<String>, C: Into<String>>(adapter: A, credential: C) -> Self {
        Self::MissingCredentials {
            adapter: adapter.into(),
            credential: credential.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http<M: Into<String>>(status: u16, message: M) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse<A: Into<String>, M: Into<String>>(adapter: A, message: M) -> Self {
        Self::Parse {
            adapter: adapter.into(),
            message: message.into(),
        }
    }

    /// Create an empty payload error
    pub fn empty_payload<A: Into<String>>(adapter: A) -> Self {
        Self::EmptyPayload {
            adapter: adapter.into(),
        }
    }
}

impl SubtitleError {
    /// Create a fetch error
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool failure error
    pub fn tool<T: Into<String>, M: Into<String>>(tool: T, message: M) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
