//! Custom error types for rustdblp.
//!
//! All library functions return `Result<T, DblpError>` instead of using `unwrap()`.

use thiserror::Error;

/// Main error type for rustdblp operations.
#[derive(Debug, Error)]
pub enum DblpError {
    /// Network/HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// XML parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Still rate limited after the configured number of retries
    #[error("Rate limited after {attempts} attempts: {url}")]
    RateLimited {
        /// Request URL that kept being rejected
        url: String,
        /// Total requests issued, including the first one
        attempts: u32,
    },

    /// API answered with a status that is neither success, 404 nor 429
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet writer error
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `DblpError`
pub type Result<T> = std::result::Result<T, DblpError>;
