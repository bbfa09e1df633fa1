//! Unload trigger error types.

use std::time::Duration;

/// Errors raised while submitting or polling an unload statement.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// HTTP transport failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The bearer token is not a valid header value.
    #[error("invalid data API token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),

    /// The data API answered with a non-success status code.
    #[error("data API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// I/O operation failed.
    #[error(transparent)]
    IO(#[from] std::io::Error),

    /// TOML deserialization failed.
    #[error(transparent)]
    Config(#[from] toml::de::Error),

    /// A poll setting is out of range.
    #[error("invalid poll config: {0}")]
    InvalidConfig(String),

    /// The statement did not reach a terminal state within the configured timeout.
    #[error("statement {id} still {status} after {elapsed:?}")]
    Timeout {
        id: String,
        status: String,
        elapsed: Duration,
    },

    /// Polling was cancelled by the caller.
    #[error("polling of statement {id} was cancelled")]
    Cancelled { id: String },
}

/// Unload trigger result type.
pub type Result<T> = core::result::Result<T, Error>;
