//! Rank-based link-prediction evaluation.
//!
//! Standard KGE protocol: for each test triple (s, r, o), score every entity
//! as a candidate object for (s, r, ?) and rank the true object, then do the
//! same for (?, r, o) over subjects. Ranking is raw (unfiltered): other
//! known true triples are not removed from the candidate list.

use gravix_core::Triple;

use crate::error::Result;
use crate::model::GcnDistMult;

/// Rank-based evaluation results.
#[derive(Debug, Clone, Default)]
pub struct RankMetrics {
    /// Mean Reciprocal Rank: E\[1/rank\]
    pub mrr: f64,
    /// Mean Rank: E\[rank\]
    pub mr: f64,
    /// Fraction with rank = 1.
    pub hits_at_1: f64,
    /// Fraction with rank <= 3.
    pub hits_at_3: f64,
    /// Fraction with rank <= 10.
    pub hits_at_10: f64,
    /// Number of ranks aggregated (two per test triple).
    pub num_ranks: usize,
}

impl RankMetrics {
    /// Compute metrics from a list of ranks.
    pub fn from_ranks(ranks: &[usize]) -> Self {
        if ranks.is_empty() {
            return Self::default();
        }

        let n = ranks.len() as f64;
        Self {
            mrr: ranks.iter().map(|&r| 1.0 / r as f64).sum::<f64>() / n,
            mr: ranks.iter().map(|&r| r as f64).sum::<f64>() / n,
            hits_at_1: ranks.iter().filter(|&&r| r == 1).count() as f64 / n,
            hits_at_3: ranks.iter().filter(|&&r| r <= 3).count() as f64 / n,
            hits_at_10: ranks.iter().filter(|&&r| r <= 10).count() as f64 / n,
            num_ranks: ranks.len(),
        }
    }
}

/// Rank of `true_index` among `scores`, counting strictly better candidates.
fn rank_of(scores: &[f32], true_index: usize) -> usize {
    let reference = scores[true_index];
    1 + scores.iter().filter(|&&s| s > reference).count()
}

/// Evaluate link prediction over encoded embeddings.
///
/// Both directions are ranked per test triple. Scores come from the
/// convolutional encoder output and the relation table, not the raw
/// parameter path.
pub fn evaluate(model: &GcnDistMult, test: &[Triple]) -> Result<RankMetrics> {
    let entities = model.encode()?.entities.to_vec2::<f32>()?;
    let relations = model.relation_table()?;

    let mut ranks = Vec::with_capacity(2 * test.len());
    for t in test {
        let r = &relations[t.relation];
        let e_s = &entities[t.subject];
        let e_o = &entities[t.object];

        // (s, r, ?): score = Σ_w e_s ⊙ r ⊙ candidate
        let tail_scores: Vec<f32> = entities
            .iter()
            .map(|cand| trilinear(e_s, r, cand))
            .collect();
        ranks.push(rank_of(&tail_scores, t.object));

        // (?, r, o)
        let head_scores: Vec<f32> = entities
            .iter()
            .map(|cand| trilinear(cand, r, e_o))
            .collect();
        ranks.push(rank_of(&head_scores, t.subject));
    }

    Ok(RankMetrics::from_ranks(&ranks))
}

fn trilinear(a: &[f32], r: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(r)
        .zip(b)
        .map(|((x, y), z)| x * y * z)
        .sum()
}
