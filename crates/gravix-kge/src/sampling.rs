//! Negative sampling by entity corruption.
//!
//! A minibatch of true triplets is expanded into `(k + 1)` stacked copies:
//! the originals labeled 1.0 followed by `k` blocks of corrupted copies
//! labeled 0.0. Each corruption flips a fair coin to pick a side (heads:
//! object, tails: subject) and replaces it with a uniform draw over all
//! entities.
//!
//! By default the draw is *not* filtered against known facts, so a corrupted
//! triplet that happens to be true elsewhere in the graph is still labeled
//! 0.0 and trains as a false negative. Supply [`PositiveDictionaries`] to
//! restrict draws to unknown completions instead.

use crate::error::{Error, Result};
use gravix_core::Triple;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Resampling cap in filtered mode. When a row's completion set covers
/// almost every entity the filter can fail repeatedly; after this many
/// attempts the last draw is accepted as-is.
const FILTER_RETRY_CAP: usize = 64;

/// Forward/backward lookup of known completions.
///
/// `forward` maps `(subject, relation)` to the set of known objects,
/// `backward` maps `(object, relation)` to the set of known subjects.
#[derive(Debug, Clone, Default)]
pub struct PositiveDictionaries {
    forward: HashMap<(usize, usize), HashSet<usize>>,
    backward: HashMap<(usize, usize), HashSet<usize>>,
}

impl PositiveDictionaries {
    /// Build both maps from the full triplet set of the knowledge base.
    pub fn from_triples(triples: &[Triple]) -> Self {
        let mut forward: HashMap<(usize, usize), HashSet<usize>> = HashMap::new();
        let mut backward: HashMap<(usize, usize), HashSet<usize>> = HashMap::new();
        for t in triples {
            forward
                .entry((t.subject, t.relation))
                .or_default()
                .insert(t.object);
            backward
                .entry((t.object, t.relation))
                .or_default()
                .insert(t.subject);
        }
        Self { forward, backward }
    }

    /// Known objects for a (subject, relation) pair.
    pub fn objects_of(&self, subject: usize, relation: usize) -> Option<&HashSet<usize>> {
        self.forward.get(&(subject, relation))
    }

    /// Known subjects for an (object, relation) pair.
    pub fn subjects_of(&self, object: usize, relation: usize) -> Option<&HashSet<usize>> {
        self.backward.get(&(object, relation))
    }

    /// Whether the triplet is a known fact.
    pub fn contains(&self, t: &Triple) -> bool {
        self.objects_of(t.subject, t.relation)
            .is_some_and(|objects| objects.contains(&t.object))
    }
}

/// Expands positive batches into labeled positive + negative examples.
pub struct NegativeSampler {
    n_entities: usize,
    negative_samples: usize,
    positives: Option<PositiveDictionaries>,
}

impl NegativeSampler {
    /// Create a sampler drawing replacement entities from `[0, n_entities)`.
    ///
    /// Fails with [`Error::InvalidEntityCount`] when `n_entities` is zero.
    pub fn new(n_entities: usize, negative_samples: usize) -> Result<Self> {
        if n_entities == 0 {
            return Err(Error::InvalidEntityCount(n_entities));
        }
        Ok(Self {
            n_entities,
            negative_samples,
            positives: None,
        })
    }

    /// Enable true-positive filtering with the supplied lookup maps.
    pub fn with_positive_filter(mut self, positives: PositiveDictionaries) -> Self {
        self.positives = Some(positives);
        self
    }

    /// Negative samples generated per positive.
    pub fn negative_samples(&self) -> usize {
        self.negative_samples
    }

    /// Expand a positive batch into `len * (k + 1)` labeled examples.
    ///
    /// The first `len` entries are the untouched positives with label 1.0;
    /// the rest are independently corrupted copies with label 0.0. Fresh
    /// randomness is drawn from `rng` on every call; nothing is cached.
    pub fn expand<R: Rng + ?Sized>(
        &self,
        positives: &[Triple],
        rng: &mut R,
    ) -> Result<(Vec<Triple>, Vec<f32>)> {
        if positives.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let n = positives.len();
        let total = n * (self.negative_samples + 1);

        let mut examples = Vec::with_capacity(total);
        for _ in 0..=self.negative_samples {
            examples.extend_from_slice(positives);
        }
        let mut labels = vec![0.0f32; total];
        labels[..n].fill(1.0);

        for block in 0..self.negative_samples {
            for (j, original) in positives.iter().enumerate() {
                let slot = (block + 1) * n + j;
                if rng.random_bool(0.5) {
                    let known = self
                        .positives
                        .as_ref()
                        .and_then(|p| p.objects_of(original.subject, original.relation));
                    examples[slot] = original.with_object(self.draw(known, rng));
                } else {
                    let known = self
                        .positives
                        .as_ref()
                        .and_then(|p| p.subjects_of(original.object, original.relation));
                    examples[slot] = original.with_subject(self.draw(known, rng));
                }
            }
        }

        Ok((examples, labels))
    }

    /// One replacement entity, resampled past known completions when a
    /// filter set is present (bounded by [`FILTER_RETRY_CAP`]).
    fn draw<R: Rng + ?Sized>(&self, known: Option<&HashSet<usize>>, rng: &mut R) -> usize {
        let mut sample = rng.random_range(0..self.n_entities);
        if let Some(known) = known {
            for _ in 0..FILTER_RETRY_CAP {
                if !known.contains(&sample) {
                    break;
                }
                sample = rng.random_range(0..self.n_entities);
            }
        }
        sample
    }
}
