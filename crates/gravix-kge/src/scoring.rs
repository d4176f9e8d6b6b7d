//! Trilinear (DistMult-style) scoring and the training loss.
//!
//! The energy of an example (s, r, o) is the elementwise product of the
//! subject embedding, the relation embedding, and the object embedding,
//! summed over the width dimension. Training uses mean binary cross-entropy
//! with logits against the sampler's 0/1 labels; the model adds the scaled
//! mean-magnitude penalty on top.
//!
//! A separate [`predict`] path scores triples straight from the raw slot
//! embedding table (self-loop rows), bypassing the convolution stack, and
//! squashes through a sigmoid. It is for standalone prediction only, never
//! training.

use crate::error::{Error, Result};
use candle_core::{Device, Tensor};
use gravix_core::{Triple, SLOTS};

fn index_tensor<I>(ids: I, len: usize, device: &Device) -> Result<Tensor>
where
    I: Iterator<Item = usize>,
{
    let data: Vec<u32> = ids.map(|i| i as u32).collect();
    Ok(Tensor::from_vec(data, (len,), device)?)
}

fn check_widths(entities: &Tensor, relations: &Tensor) -> Result<usize> {
    let (_, entity_width) = entities.dims2()?;
    let (_, relation_width) = relations.dims2()?;
    if entity_width != relation_width {
        return Err(Error::DimensionMismatch {
            entity: entity_width,
            relation: relation_width,
        });
    }
    Ok(entity_width)
}

/// One energy per example: `Σ_w e_s ⊙ r ⊙ e_o`.
///
/// `entities` is the encoder output `(n_entities, width)`; `w_relation` is
/// `(n_relations, width)`. Fails with [`Error::DimensionMismatch`] when the
/// widths differ.
pub fn energies(entities: &Tensor, w_relation: &Tensor, examples: &[Triple]) -> Result<Tensor> {
    check_widths(entities, w_relation)?;
    let device = entities.device();
    let n = examples.len();

    let subjects = index_tensor(examples.iter().map(|t| t.subject), n, device)?;
    let relations = index_tensor(examples.iter().map(|t| t.relation), n, device)?;
    let objects = index_tensor(examples.iter().map(|t| t.object), n, device)?;

    let e1 = entities.index_select(&subjects, 0)?;
    let r = w_relation.index_select(&relations, 0)?;
    let e2 = entities.index_select(&objects, 0)?;

    Ok(e1.mul(&r)?.mul(&e2)?.sum(1)?)
}

/// Mean binary cross-entropy with logits between energies and 0/1 labels.
pub fn loss(energies: &Tensor, labels: &Tensor) -> Result<Tensor> {
    Ok(candle_nn::loss::binary_cross_entropy_with_logit(
        energies, labels,
    )?)
}

/// Inference-time scoring from the raw parameter tables.
///
/// Looks up each entity's self-loop row (`3 * id`) in the slot-major
/// embedding table, computes the trilinear energy, and squashes through a
/// sigmoid. Returns one probability-like score per example.
pub fn predict(w_embedding: &Tensor, w_relation: &Tensor, examples: &[Triple]) -> Result<Tensor> {
    check_widths(w_embedding, w_relation)?;
    let device = w_embedding.device();
    let n = examples.len();

    let subjects = index_tensor(examples.iter().map(|t| SLOTS * t.subject), n, device)?;
    let relations = index_tensor(examples.iter().map(|t| t.relation), n, device)?;
    let objects = index_tensor(examples.iter().map(|t| SLOTS * t.object), n, device)?;

    let e1 = w_embedding.index_select(&subjects, 0)?;
    let r = w_relation.index_select(&relations, 0)?;
    let e2 = w_embedding.index_select(&objects, 0)?;

    let logits = e1.mul(&r)?.mul(&e2)?.sum(1)?;
    Ok(candle_nn::ops::sigmoid(&logits)?)
}
