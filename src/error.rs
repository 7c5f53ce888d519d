//! Error types for podfeed.

use thiserror::Error;

/// Common error type for a feed rebuild.
///
/// Per-record problems (`MalformedRecord`) are reported by the source layer and
/// skipped; every other variant aborts the whole run.
#[derive(Error, Debug)]
pub enum FeedError {
    /// No publishable episode records were found.
    #[error("no eligible episode records found")]
    EmptyInput,

    /// A record lacks a usable id or publish date.
    #[error("malformed episode record {}: {}", display_id(.id), .reason)]
    MalformedRecord { id: Option<String>, reason: String },

    /// A timestamp could not be parsed.
    #[error("invalid date: {value}")]
    InvalidDate { value: String },

    /// The ad-free audio URL could not be derived.
    #[error("cannot resolve ad-free audio for {url}: {reason}")]
    AudioResolution { url: String, reason: String },

    /// XML serialization error.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error while fetching episode records.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for FeedError {
    fn from(e: toml::de::Error) -> Self {
        FeedError::Config(e.to_string())
    }
}

impl From<url::ParseError> for FeedError {
    fn from(e: url::ParseError) -> Self {
        FeedError::Config(format!("invalid URL: {}", e))
    }
}

fn display_id(id: &Option<String>) -> &str {
    id.as_deref().unwrap_or("<no id>")
}

/// Result type alias for podfeed operations.
pub type Result<T> = std::result::Result<T, FeedError>;
