//! Error types for the skywatch core.
//!
//! Every error here is recovered locally by its component; none of them is
//! allowed to take the process down.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A step of the reference acquisition pipeline failed.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} when downloading {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("No src parameter in viewer URL {0}")]
    MissingSource(String),

    #[error("Invalid source pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to decode src parameter: {0}")]
    Decode(String),

    #[error("Extracted URL does not look like a spreadsheet: {0}")]
    NotSpreadsheet(String),

    #[error("Spreadsheet parse error: {0}")]
    Spreadsheet(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The live satellite feed could not be queried.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Request to satellite feed failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Satellite feed returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed satellite feed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Satellite feed rejected the request: {0}")]
    Api(String),
}

/// The usage ledger could not be read or written.
#[derive(Error, Debug)]
pub enum UsageStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
