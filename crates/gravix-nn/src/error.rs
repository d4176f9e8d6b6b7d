//! Error types for gravix-nn.

use thiserror::Error;

/// Encoder error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Weight tensor shape inconsistent with the adjacency structure.
    #[error("shape mismatch for {tensor}: expected {expected}, got {got}")]
    ShapeMismatch {
        tensor: &'static str,
        expected: String,
        got: String,
    },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
