//! Error types for Novelry operations.
//!
//! This module defines the main error type [`NovelryError`]. Every failure the
//! acquisition pipeline can produce converges on one of its variants, and each
//! variant maps onto the status code reported to callers through
//! [`NovelryError::status`].
//!
//! # Example
//!
//! ```rust
//! use novelry_core::{NovelryError, Result};
//!
//! fn require_body(body: &str) -> Result<&str> {
//!     if body.trim().is_empty() {
//!         return Err(NovelryError::EmptyContent("Empty chapter".to_string()));
//!     }
//!     Ok(body)
//! }
//!
//! assert_eq!(require_body("  ").unwrap_err().status(), 204);
//! ```

use thiserror::Error;

use crate::sources::Source;

/// Main error type for acquisition and normalization operations.
#[derive(Error, Debug)]
pub enum NovelryError {
    /// Missing or invalid arguments. Never retried.
    #[error("{0}")]
    BadInput(String),

    /// A source confirmed that the identifier does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A well-formed response carried no usable body.
    #[error("{0}")]
    EmptyContent(String),

    /// Retries against a source were exhausted.
    #[error("{0}")]
    Retrieval(String),

    /// Network failure, anti-bot rejection, malformed response or timeout.
    #[error("{0}")]
    Transport(String),

    /// The extractor could not locate the expected structure in a fetched page.
    ///
    /// Usually means the site layout drifted. Reported like a transport failure.
    #[error("{site}: unexpected page structure: {detail}")]
    Extraction { site: Source, detail: String },

    /// The overall operation deadline elapsed.
    #[error("Operation timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// HTTP client construction or request errors from reqwest.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Headless browser launch, navigation or teardown errors.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Invalid URL produced from a template or supplied by the caller.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// Records that could not be rendered as JSON.
    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl NovelryError {
    /// Status code reported to callers for this error.
    ///
    /// 400 bad input, 404 not found, 204 empty content, 500 retrieval failure,
    /// 503 for every transport-class failure.
    pub fn status(&self) -> u16 {
        match self {
            NovelryError::BadInput(_) => 400,
            NovelryError::NotFound(_) => 404,
            NovelryError::EmptyContent(_) => 204,
            NovelryError::Retrieval(_) => 500,
            NovelryError::Transport(_)
            | NovelryError::Extraction { .. }
            | NovelryError::Timeout { .. }
            | NovelryError::HttpError(_)
            | NovelryError::Browser(_)
            | NovelryError::InvalidUrl(_)
            | NovelryError::HtmlParseError(_)
            | NovelryError::Serialization(_) => 503,
        }
    }

    /// Whether the orchestrator may fall through to the next source after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, NovelryError::BadInput(_) | NovelryError::NotFound(_))
    }
}

/// Result type alias for NovelryError.
pub type Result<T> = std::result::Result<T, NovelryError>;
