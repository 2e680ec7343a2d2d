//! Common error types for tagtidy

use thiserror::Error;

/// Common result type for tagtidy operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the tagtidy crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (e.g. indexing an unfused record)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
