//! Stacked message-passing encoder.
//!
//! The encoder follows the message-passing paradigm over the slot-structured
//! adjacency:
//!
//! 1. **Seed**: `h0 = A @ W_embedding`, the normalized neighborhood average
//!    of the per-slot initial vectors.
//! 2. **Message**: `tanh(h) @ W_conv`, reshaped so each entity emits one
//!    message per slot.
//! 3. **Aggregate**: multiply by the same row-stochastic adjacency.
//!
//! No nonlinearity is applied after the final aggregation. Alongside the
//! embedding, the encoder accumulates a mean-magnitude penalty over every
//! weight tensor it touches (a simple sum of per-tensor means).

use candle_core::{Device, Tensor};
use gravix_core::{NormalizedAdjacency, SLOTS};

use crate::error::{Error, Result};

/// Output of a full encoder pass.
#[derive(Debug)]
pub struct Encoded {
    /// Final entity embeddings, shape `(n_entities, width)`.
    pub entities: Tensor,
    /// Scalar penalty: `mean(W_embedding) + Σ mean(W_conv[k])`. The caller
    /// adds the relation table's mean before scaling, keeping the aggregate
    /// a plain sum of per-tensor means.
    pub penalty: Tensor,
}

/// Graph-convolutional encoder over a fixed adjacency structure.
///
/// The adjacency is densified once at construction and treated as a constant
/// thereafter; only the weight tensors carry gradients. Forward passes are
/// deterministic given fixed weights.
pub struct GraphConvEncoder {
    adjacency: Tensor,
    n_entities: usize,
}

impl GraphConvEncoder {
    /// Materialize the sparse adjacency on the given device.
    pub fn from_adjacency(adj: &NormalizedAdjacency, device: &Device) -> Result<Self> {
        let (n, m) = adj.shape();
        let adjacency = Tensor::from_vec(adj.to_dense(), (n, m), device)?;
        Ok(Self {
            adjacency,
            n_entities: n,
        })
    }

    /// Number of entities (output row count).
    pub fn n_entities(&self) -> usize {
        self.n_entities
    }

    /// Run the convolution stack.
    ///
    /// `w_embedding` must be `(3 * n_entities, width)`; every entry of
    /// `w_convolutions` must be `(width, 3 * width)`. Fails with
    /// [`Error::ShapeMismatch`] otherwise.
    pub fn encode(&self, w_embedding: &Tensor, w_convolutions: &[Tensor]) -> Result<Encoded> {
        let (rows, width) = w_embedding.dims2()?;
        if rows != SLOTS * self.n_entities {
            return Err(Error::ShapeMismatch {
                tensor: "w_embedding",
                expected: format!("({}, width)", SLOTS * self.n_entities),
                got: format!("({rows}, {width})"),
            });
        }

        let mut embedding = self.adjacency.matmul(w_embedding)?;
        let mut penalty = w_embedding.mean_all()?;

        for w_conv in w_convolutions {
            let dims = w_conv.dims2()?;
            if dims != (width, SLOTS * width) {
                return Err(Error::ShapeMismatch {
                    tensor: "w_conv",
                    expected: format!("({width}, {})", SLOTS * width),
                    got: format!("({}, {})", dims.0, dims.1),
                });
            }

            // Activation of the previous layer, one message per slot, then
            // aggregation through the shared adjacency.
            let hidden = embedding.tanh()?;
            let messages = hidden
                .matmul(w_conv)?
                .reshape((SLOTS * self.n_entities, width))?;
            embedding = self.adjacency.matmul(&messages)?;

            penalty = (penalty + w_conv.mean_all()?)?;
        }

        Ok(Encoded {
            entities: embedding,
            penalty,
        })
    }
}
