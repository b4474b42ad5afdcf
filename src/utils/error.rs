// src/utils/error.rs
use std::time::Duration;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error

    #[error("Site rate limit likely exceeded")]
    RateLimited,

    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Timed out after {timeout:?} waiting for '{marker}' on {url}")]
    Timeout {
        url: String,
        marker: String,
        timeout: Duration,
    },
}

impl FetchError {
    /// Whether another attempt at the same URL could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::RateLimited | FetchError::Timeout { .. } => true,
            FetchError::Http(status) => status.is_server_error(),
            FetchError::NotFound(_) => false,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Invalid marker '{0}'")]
    InvalidMarker(String),

    #[error("Structural error: expected an element for '{marker}', found {found}")]
    Structural { marker: String, found: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Page acquisition failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
