//! Graph-convolutional knowledge-graph embedding training.
//!
//! Gravix learns fixed-width vectors for the entities and relations of a
//! knowledge graph so that a trilinear (DistMult-style) scoring function
//! separates observed triplets from corrupted ones. The encoder is a stack
//! of graph convolutions over a row-stochastic multi-slot adjacency; the
//! training signal comes from entity-corruption negative sampling with
//! binary cross-entropy.
//!
//! # Pipeline
//!
//! The adjacency structure is built once per graph (`gravix-core`). Each
//! training step then:
//!
//! 1. expands a minibatch of positives into labeled examples
//!    ([`sampling::NegativeSampler`]),
//! 2. encodes entities from the static adjacency and current parameters
//!    (`gravix-nn`),
//! 3. scores every example and assembles the loss ([`scoring`]).
//!
//! The [`training::Trainer`] drives that loop through the
//! [`training::TrainableModel`] contract with clipped Adam updates.
//!
//! # Example
//!
//! ```rust,ignore
//! use candle_core::Device;
//! use gravix_core::{KnowledgeGraph, Triple};
//! use gravix_kge::{GcnDistMult, ModelConfig, OptimizerOptions, TrainableModel, Trainer};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let graph = KnowledgeGraph::new(triples, n_entities, n_relations)?;
//! let model = GcnDistMult::new(&graph, ModelConfig::default(), &Device::Cpu)?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let trainer = Trainer::new(model.optimizer_options());
//! let report = trainer.fit(&model, graph.triples(), &mut rng)?;
//!
//! model.save("model.safetensors".as_ref())?;
//! ```

mod config;
mod error;

pub mod evaluation;
pub mod model;
pub mod persistence;
pub mod sampling;
pub mod scoring;
pub mod training;

pub use config::ModelConfig;
pub use error::{Error, Result};
pub use evaluation::RankMetrics;
pub use model::GcnDistMult;
pub use persistence::Checkpoint;
pub use sampling::{NegativeSampler, PositiveDictionaries};
pub use training::{OptimizerOptions, TrainableModel, Trainer, TrainingReport};
