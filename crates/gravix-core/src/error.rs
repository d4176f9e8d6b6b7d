use thiserror::Error;

/// Errors that can occur in gravix-core.
#[derive(Debug, Error)]
pub enum Error {
    /// The triplet set references entities or relations outside the declared
    /// counts, or the counts themselves are unusable.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}

/// Result type alias for gravix-core.
pub type Result<T> = std::result::Result<T, Error>;
