//! Error types for icon fetching and decoding.
//!
//! None of these errors cross the request callback boundary: the loader
//! absorbs them, emits a `tracing` diagnostic, and delivers `None` to the
//! caller. They exist so the fetcher and decoder seams can report *what*
//! failed for operability.

use std::path::PathBuf;

/// Result type alias for icon operations.
pub type Result<T> = std::result::Result<T, IconError>;

/// Errors that can occur while fetching or decoding icon content.
#[derive(Debug, thiserror::Error)]
pub enum IconError {
    /// The byte stream could not be decoded as an image.
    #[error("failed to decode icon stream: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    /// Fetching the bytes behind a URI failed.
    #[error("fetch failed for '{uri}': {message}")]
    Fetch { uri: String, message: String },

    /// The URI could not be parsed, or its scheme is not one the fetcher
    /// understands.
    #[error("unsupported URI '{uri}'")]
    UnsupportedUri { uri: String },

    /// Reading a local file failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A pixel buffer did not match its declared dimensions.
    #[error("pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    InvalidDimensions { expected: usize, actual: usize },
}

impl IconError {
    /// Create a fetch error.
    pub fn fetch(uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            uri: uri.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-URI error.
    pub fn unsupported_uri(uri: impl Into<String>) -> Self {
        Self::UnsupportedUri { uri: uri.into() }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a dimensions mismatch error.
    pub fn invalid_dimensions(expected: usize, actual: usize) -> Self {
        Self::InvalidDimensions { expected, actual }
    }
}
