use gravix_core::EdgeOrientation;

/// Model construction hyperparameters.
///
/// Immutable once the model is built; adjacency and parameter shapes are
/// derived from these together with the graph's entity/relation counts.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Embedding width (default: 200).
    pub embedding_width: usize,
    /// Number of convolution layers (default: 3).
    pub n_convolutions: usize,
    /// Negative samples per positive (default: 10).
    pub negative_samples: usize,
    /// Weight of the mean-magnitude penalty in the loss (default: 0.01).
    pub regularization: f64,
    /// Minibatch size advertised to the optimizer (default: 4831).
    pub batch_size: usize,
    /// Edge placement in the adjacency structure (default: Collapsed).
    pub edge_orientation: EdgeOrientation,
    /// Seed for parameter initialization (default: 42).
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_width: 200,
            n_convolutions: 3,
            negative_samples: 10,
            regularization: 0.01,
            batch_size: 4831,
            edge_orientation: EdgeOrientation::Collapsed,
            seed: 42,
        }
    }
}

impl ModelConfig {
    pub fn with_embedding_width(mut self, width: usize) -> Self {
        self.embedding_width = width;
        self
    }

    pub fn with_convolutions(mut self, n: usize) -> Self {
        self.n_convolutions = n;
        self
    }

    pub fn with_negative_samples(mut self, k: usize) -> Self {
        self.negative_samples = k;
        self
    }

    pub fn with_regularization(mut self, weight: f64) -> Self {
        self.regularization = weight;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_edge_orientation(mut self, orientation: EdgeOrientation) -> Self {
        self.edge_orientation = orientation;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
