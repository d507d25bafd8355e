//! Error types for the kindred core library.

use thiserror::Error;

/// Top-level error type for kindred operations.
///
/// Numeric inputs never error; they saturate at their domain bounds. Only
/// malformed snapshots and configuration surface here.
#[derive(Error, Debug)]
pub enum KindredError {
    /// A snapshot could not be encoded or decoded (unknown enum value,
    /// missing field, truncated payload).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, KindredError>;
