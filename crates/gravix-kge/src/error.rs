use thiserror::Error;

/// Errors that can occur in gravix-kge.
///
/// All variants are fatal to the current call; nothing is retried
/// internally. The surrounding trainer or CLI decides whether to abort the
/// run.
#[derive(Debug, Error)]
pub enum Error {
    /// Graph or adjacency construction error.
    #[error("graph error: {0}")]
    Graph(#[from] gravix_core::Error),

    /// Encoder error.
    #[error("encoder error: {0}")]
    Encoder(#[from] gravix_nn::Error),

    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// The positive batch handed to the negative sampler was empty.
    #[error("empty positive batch")]
    EmptyBatch,

    /// The sampler was constructed with an unusable entity count.
    #[error("invalid entity count: {0}")]
    InvalidEntityCount(usize),

    /// Entity and relation embeddings disagree on width.
    #[error("dimension mismatch: entity width {entity}, relation width {relation}")]
    DimensionMismatch { entity: usize, relation: usize },

    /// Corrupt or incompatible model file.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for gravix-kge.
pub type Result<T> = std::result::Result<T, Error>;
