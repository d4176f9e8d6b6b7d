//! The assembled graph-convolutional DistMult model.
//!
//! [`GcnDistMult`] owns the trainable parameter tensors and wires the three
//! core pieces together: the adjacency structure is built once at
//! construction, every loss evaluation re-runs the convolutional encoder
//! over it, and the negative sampler provides the minibatch transform the
//! optimizer drives through [`TrainableModel`].
//!
//! Parameter tensors are `candle_core::Var`s: the model only builds pure
//! expressions over their current values; the optimizer applies updates
//! between calls.

use candle_core::{Device, Tensor, Var};
use gravix_core::{KnowledgeGraph, NormalizedAdjacency, Triple, SLOTS};
use gravix_nn::{Encoded, GraphConvEncoder};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::StandardNormal;
use std::path::Path;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::persistence::{self, Checkpoint};
use crate::sampling::{NegativeSampler, PositiveDictionaries};
use crate::scoring;
use crate::training::{OptimizerOptions, TrainableModel};

/// Seeded standard-normal parameter tensor.
fn normal_var(rng: &mut StdRng, shape: (usize, usize), device: &Device) -> Result<Var> {
    let data: Vec<f32> = (0..shape.0 * shape.1)
        .map(|_| rng.sample::<f32, _>(StandardNormal))
        .collect();
    Ok(Var::from_tensor(&Tensor::from_vec(data, shape, device)?)?)
}

/// Graph-convolutional encoder + DistMult decoder over a fixed graph.
pub struct GcnDistMult {
    config: ModelConfig,
    device: Device,
    n_entities: usize,
    n_relations: usize,
    encoder: GraphConvEncoder,
    w_embedding: Var,
    w_relation: Var,
    w_convolutions: Vec<Var>,
    sampler: NegativeSampler,
}

impl GcnDistMult {
    /// Build the model for a graph: adjacency, encoder, and freshly
    /// initialized parameters sized from the graph's counts.
    ///
    /// The graph's counts are baked in; reusing parameters against a graph
    /// with different counts requires building a new model.
    pub fn new(graph: &KnowledgeGraph, config: ModelConfig, device: &Device) -> Result<Self> {
        let adjacency = NormalizedAdjacency::build(
            graph.triples(),
            graph.n_entities(),
            config.edge_orientation,
        )?;
        let encoder = GraphConvEncoder::from_adjacency(&adjacency, device)?;

        let n = graph.n_entities();
        let width = config.embedding_width;
        let mut rng = StdRng::seed_from_u64(config.seed);

        let w_embedding = normal_var(&mut rng, (SLOTS * n, width), device)?;
        let w_convolutions = (0..config.n_convolutions)
            .map(|_| normal_var(&mut rng, (width, SLOTS * width), device))
            .collect::<Result<Vec<_>>>()?;
        let w_relation = normal_var(&mut rng, (graph.n_relations(), width), device)?;

        let sampler = NegativeSampler::new(n, config.negative_samples)?;

        Ok(Self {
            config,
            device: device.clone(),
            n_entities: n,
            n_relations: graph.n_relations(),
            encoder,
            w_embedding,
            w_relation,
            w_convolutions,
            sampler,
        })
    }

    /// Switch the sampler into true-positive filtered mode.
    pub fn with_positive_filter(mut self, positives: PositiveDictionaries) -> Self {
        let sampler = NegativeSampler::new(self.n_entities, self.config.negative_samples)
            .expect("entity count already validated")
            .with_positive_filter(positives);
        self.sampler = sampler;
        self
    }

    /// Model configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Number of entities.
    pub fn n_entities(&self) -> usize {
        self.n_entities
    }

    /// Number of relations.
    pub fn n_relations(&self) -> usize {
        self.n_relations
    }

    /// Run the convolution stack over the current parameters.
    pub fn encode(&self) -> Result<Encoded> {
        let convolutions: Vec<Tensor> = self
            .w_convolutions
            .iter()
            .map(|v| v.as_tensor().clone())
            .collect();
        Ok(self
            .encoder
            .encode(self.w_embedding.as_tensor(), &convolutions)?)
    }

    /// Full training loss for a labeled example batch: mean BCE with logits
    /// plus the scaled sum of per-tensor means over every weight tensor.
    pub fn loss(&self, examples: &[Triple], labels: &[f32]) -> Result<Tensor> {
        let encoded = self.encode()?;
        let energies = scoring::energies(&encoded.entities, self.w_relation.as_tensor(), examples)?;

        let labels = Tensor::from_vec(labels.to_vec(), (labels.len(),), &self.device)?;
        let bce = scoring::loss(&energies, &labels)?;

        let penalty = encoded.penalty.add(&self.w_relation.mean_all()?)?;
        Ok(bce.add(&(penalty * self.config.regularization)?)?)
    }

    /// Standalone prediction from the raw parameter tables (no convolution
    /// stack): sigmoid-squashed trilinear scores.
    pub fn predict(&self, examples: &[Triple]) -> Result<Vec<f32>> {
        let scores = scoring::predict(
            self.w_embedding.as_tensor(),
            self.w_relation.as_tensor(),
            examples,
        )?;
        Ok(scores.to_vec1::<f32>()?)
    }

    /// Current relation embeddings as plain vectors.
    pub fn relation_table(&self) -> Result<Vec<Vec<f32>>> {
        Ok(self.w_relation.to_vec2::<f32>()?)
    }

    /// Snapshot the persisted parameter tuple.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            w_embedding: self.w_embedding.as_tensor().clone(),
            w_relation: self.w_relation.as_tensor().clone(),
            n_entities: self.n_entities,
            n_relations: self.n_relations,
        }
    }
}

impl TrainableModel for GcnDistMult {
    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.w_embedding.clone(), self.w_relation.clone()];
        params.extend(self.w_convolutions.iter().cloned());
        params
    }

    fn transform(&self, batch: &[Triple], rng: &mut dyn RngCore) -> Result<(Vec<Triple>, Vec<f32>)> {
        self.sampler.expand(batch, rng)
    }

    fn minibatch_loss(&self, examples: &[Triple], labels: &[f32]) -> Result<Tensor> {
        self.loss(examples, labels)
    }

    fn optimizer_options(&self) -> OptimizerOptions {
        OptimizerOptions::default().with_batch_size(self.config.batch_size)
    }

    fn save(&self, path: &Path) -> Result<()> {
        persistence::save(path, &self.checkpoint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravix_core::EdgeOrientation;

    fn toy_graph() -> KnowledgeGraph {
        KnowledgeGraph::new(vec![Triple::new(0, 0, 1), Triple::new(1, 0, 2)], 4, 1).unwrap()
    }

    fn toy_config() -> ModelConfig {
        ModelConfig::default()
            .with_embedding_width(2)
            .with_convolutions(1)
            .with_negative_samples(2)
            .with_batch_size(2)
    }

    #[test]
    fn test_parameter_shapes() {
        let model = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();

        assert_eq!(model.w_embedding.dims(), &[12, 2]);
        assert_eq!(model.w_relation.dims(), &[1, 2]);
        assert_eq!(model.w_convolutions.len(), 1);
        assert_eq!(model.w_convolutions[0].dims(), &[2, 6]);
        assert_eq!(model.parameters().len(), 3);
    }

    #[test]
    fn test_seeded_init_is_reproducible() {
        let a = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let b = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let c = GcnDistMult::new(&toy_graph(), toy_config().with_seed(7), &Device::Cpu).unwrap();

        let va = a.w_embedding.to_vec2::<f32>().unwrap();
        let vb = b.w_embedding.to_vec2::<f32>().unwrap();
        let vc = c.w_embedding.to_vec2::<f32>().unwrap();
        assert_eq!(va, vb);
        assert_ne!(va, vc);
    }

    #[test]
    fn test_encode_output_shape() {
        let model = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let encoded = model.encode().unwrap();
        assert_eq!(encoded.entities.dims(), &[4, 2]);
    }

    #[test]
    fn test_loss_is_finite_scalar() {
        let model = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let examples = vec![Triple::new(0, 0, 1), Triple::new(3, 0, 2)];
        let labels = vec![1.0, 0.0];

        let loss = model.loss(&examples, &labels).unwrap();
        let value = loss.to_scalar::<f32>().unwrap();
        assert!(value.is_finite());
    }

    #[test]
    fn test_transform_matches_sampler_contract() {
        let model = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let batch = vec![Triple::new(0, 0, 1), Triple::new(1, 0, 2)];
        let (examples, labels) = model.transform(&batch, &mut rng).unwrap();
        assert_eq!(examples.len(), 6);
        assert_eq!(labels, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_gradients_reach_all_parameters() {
        let model = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let examples = vec![Triple::new(0, 0, 1), Triple::new(2, 0, 3)];
        let labels = vec![1.0, 0.0];

        let loss = model.loss(&examples, &labels).unwrap();
        let grads = loss.backward().unwrap();
        for param in model.parameters() {
            assert!(grads.get(&param).is_some(), "missing gradient");
        }
    }

    #[test]
    fn test_directed_orientation_builds() {
        let config = toy_config().with_edge_orientation(EdgeOrientation::Directed);
        let model = GcnDistMult::new(&toy_graph(), config, &Device::Cpu).unwrap();
        assert!(model
            .loss(&[Triple::new(0, 0, 1)], &[1.0])
            .unwrap()
            .to_scalar::<f32>()
            .unwrap()
            .is_finite());
    }

    #[test]
    fn test_predict_in_unit_interval() {
        let model = GcnDistMult::new(&toy_graph(), toy_config(), &Device::Cpu).unwrap();
        let scores = model
            .predict(&[Triple::new(0, 0, 1), Triple::new(2, 0, 0)])
            .unwrap();
        assert_eq!(scores.len(), 2);
        for s in scores {
            assert!(s > 0.0 && s < 1.0);
        }
    }
}
