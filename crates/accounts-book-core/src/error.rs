//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Validation failures are not errors; they are reported through
/// [`crate::Validity`] and the return value of
/// [`crate::AccountStore::validate_and_save`].
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
