//! Integration tests for the full embedding pipeline.
//!
//! Covers the preprocessing → sampling → encoding → scoring chain on small
//! synthetic graphs, plus training and checkpoint round-trips.

use candle_core::Device;
use gravix_core::{EdgeOrientation, KnowledgeGraph, NormalizedAdjacency, Triple};
use gravix_kge::{
    persistence, GcnDistMult, ModelConfig, OptimizerOptions, TrainableModel, Trainer,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The 4-entity scenario: two chained triples over one relation.
fn toy_graph() -> KnowledgeGraph {
    KnowledgeGraph::new(vec![Triple::new(0, 0, 1), Triple::new(1, 0, 2)], 4, 1).unwrap()
}

/// A slightly larger graph: two relations over a small taxonomy-ish shape.
fn taxonomy_graph() -> KnowledgeGraph {
    let triples = vec![
        Triple::new(0, 0, 1),
        Triple::new(1, 0, 2),
        Triple::new(3, 0, 2),
        Triple::new(4, 0, 3),
        Triple::new(5, 1, 0),
        Triple::new(5, 1, 4),
        Triple::new(2, 1, 5),
        Triple::new(1, 1, 5),
    ];
    KnowledgeGraph::new(triples, 6, 2).unwrap()
}

#[test]
fn test_toy_scenario_end_to_end() {
    let graph = toy_graph();

    // Adjacency: shape (4, 12), self-loop rows normalized, row 0 carries two
    // non-self entries.
    let adj = NormalizedAdjacency::build(
        graph.triples(),
        graph.n_entities(),
        EdgeOrientation::Collapsed,
    )
    .unwrap();
    assert_eq!(adj.shape(), (4, 12));
    for sum in adj.row_sums() {
        assert!((sum - 1.0).abs() < 1e-6);
    }
    let row0_non_self = adj
        .entries()
        .filter(|&(r, c, _)| r == 0 && c != 0)
        .count();
    assert_eq!(row0_non_self, 2);

    // Sampler: k = 2 on the two positives gives six labeled examples.
    let config = ModelConfig::default()
        .with_embedding_width(2)
        .with_convolutions(1)
        .with_negative_samples(2)
        .with_batch_size(2);
    let model = GcnDistMult::new(&graph, config, &Device::Cpu).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let (examples, labels) = model.transform(graph.triples(), &mut rng).unwrap();
    assert_eq!(examples.len(), 6);
    assert_eq!(labels, vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

    // Loss over the expanded batch is a finite scalar.
    let loss = model.loss(&examples, &labels).unwrap();
    assert!(loss.to_scalar::<f32>().unwrap().is_finite());
}

#[test]
fn test_training_reduces_loss() {
    let graph = taxonomy_graph();
    let config = ModelConfig::default()
        .with_embedding_width(8)
        .with_convolutions(1)
        .with_negative_samples(2)
        .with_batch_size(8)
        .with_seed(3);
    let model = GcnDistMult::new(&graph, config, &Device::Cpu).unwrap();

    let options = OptimizerOptions::default()
        .with_batch_size(8)
        .with_max_iterations(300)
        .with_evaluate_every(50)
        .with_learning_rate(0.02);
    let mut rng = StdRng::seed_from_u64(5);

    let report = Trainer::new(options)
        .fit(&model, graph.triples(), &mut rng)
        .unwrap();

    assert!(report.iterations <= 300);
    assert!(!report.loss_history.is_empty());
    assert!(report.best_loss.is_finite());
    assert!(report.best_loss < report.loss_history[0]);
}

#[test]
fn test_checkpoint_round_trip_through_model() {
    let graph = toy_graph();
    let config = ModelConfig::default()
        .with_embedding_width(2)
        .with_convolutions(1)
        .with_negative_samples(2);
    let model = GcnDistMult::new(&graph, config, &Device::Cpu).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.safetensors");
    model.save(&path).unwrap();

    let restored = persistence::load(&path, &Device::Cpu).unwrap();
    assert_eq!(restored.n_entities, 4);
    assert_eq!(restored.n_relations, 1);

    let original = model.checkpoint();
    assert_eq!(
        restored.w_embedding.to_vec2::<f32>().unwrap(),
        original.w_embedding.to_vec2::<f32>().unwrap()
    );
    assert_eq!(
        restored.w_relation.to_vec2::<f32>().unwrap(),
        original.w_relation.to_vec2::<f32>().unwrap()
    );

    // The restored tables drive the raw prediction path directly.
    let scores = gravix_kge::scoring::predict(
        &restored.w_embedding,
        &restored.w_relation,
        &[Triple::new(0, 0, 1)],
    )
    .unwrap()
    .to_vec1::<f32>()
    .unwrap();
    assert!(scores[0] > 0.0 && scores[0] < 1.0);
}

#[test]
fn test_encode_stable_across_training_free_calls() {
    let graph = taxonomy_graph();
    let config = ModelConfig::default()
        .with_embedding_width(4)
        .with_convolutions(2)
        .with_negative_samples(2);
    let model = GcnDistMult::new(&graph, config, &Device::Cpu).unwrap();

    let a = model.encode().unwrap().entities.to_vec2::<f32>().unwrap();
    let b = model.encode().unwrap().entities.to_vec2::<f32>().unwrap();
    assert_eq!(a, b);
}
