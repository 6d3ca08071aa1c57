//! Error types for the KDAC engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KdacError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Numerical failure: {0}")]
    Numerical(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Spectral decomposition failed: {0}")]
    Solver(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, KdacError>;
