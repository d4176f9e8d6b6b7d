//! Graph-convolutional encoding over candle tensors.
//!
//! This crate turns the static propagation structure from `gravix-core` into
//! entity embeddings: the adjacency is materialized once as a constant
//! tensor, and [`encoder::GraphConvEncoder`] runs stacked message-passing
//! layers over it. All weight tensors stay owned by the caller (as
//! `candle_core::Var`s), so the forward pass is a pure differentiable
//! expression and gradients flow to every weight.
//!
//! # Example
//!
//! ```rust,ignore
//! use gravix_nn::encoder::GraphConvEncoder;
//! use candle_core::Device;
//!
//! let encoder = GraphConvEncoder::from_adjacency(&adj, &Device::Cpu)?;
//! let out = encoder.encode(&w_embedding, &w_convolutions)?;
//! // out.entities: (n_entities, width)
//! ```

pub mod encoder;
pub mod error;

pub use encoder::{Encoded, GraphConvEncoder};
pub use error::{Error, Result};
