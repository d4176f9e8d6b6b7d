//! Core types for knowledge-graph embedding training.
//!
//! This crate provides the data model the rest of gravix builds on:
//!
//! - [`Triple`] - An index-based (subject, relation, object) fact
//! - [`KnowledgeGraph`] - A validated triplet set with entity/relation counts
//! - [`Vocabulary`] - Label ↔ index interning for raw input files
//! - [`NormalizedAdjacency`] - The row-stochastic multi-slot propagation
//!   structure consumed by the convolutional encoder
//!
//! Everything here is plain data: no tensor types, no randomness. The
//! adjacency structure is built once per graph and is immutable afterwards.
//!
//! # Example
//!
//! ```rust
//! use gravix_core::{EdgeOrientation, KnowledgeGraph, NormalizedAdjacency, Triple};
//!
//! let kg = KnowledgeGraph::new(
//!     vec![Triple::new(0, 0, 1), Triple::new(1, 0, 2)],
//!     4,
//!     1,
//! )?;
//!
//! let adj = NormalizedAdjacency::build(kg.triples(), kg.n_entities(), EdgeOrientation::Collapsed)?;
//! assert_eq!(adj.shape(), (4, 12));
//! # Ok::<(), gravix_core::Error>(())
//! ```

mod adjacency;
mod error;
mod graph;
mod triple;
mod vocab;

pub use adjacency::{EdgeOrientation, NormalizedAdjacency, SLOTS};
pub use error::{Error, Result};
pub use graph::KnowledgeGraph;
pub use triple::Triple;
pub use vocab::Vocabulary;
