//! Collector error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failures while obtaining raw text. None of these escape the cache gate.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Resource not available: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cache store error: {0}")]
    Store(String),
}
