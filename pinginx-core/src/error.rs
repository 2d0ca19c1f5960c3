//! Error types for Pinginx

use thiserror::Error;

/// Result type for Pinginx operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Pinginx
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid header name written by a processor
    #[error("Invalid header name: {0}")]
    HeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value written by a processor
    #[error("Invalid header value: {0}")]
    HeaderValue(#[from] http::header::InvalidHeaderValue),
}
