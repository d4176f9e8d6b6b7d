//! Checkpoint persistence.
//!
//! A checkpoint is a single safetensors record holding exactly four entries:
//! `w_embedding`, `w_relation`, and the two counts as 1-element i64 tensors.
//! There is no version field; the key set *is* the format, so it must stay
//! stable for old files to keep loading.

use candle_core::{DType, Device, Tensor};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

const KEY_EMBEDDING: &str = "w_embedding";
const KEY_RELATION: &str = "w_relation";
const KEY_N_ENTITIES: &str = "n_entities";
const KEY_N_RELATIONS: &str = "n_relations";

/// The persisted parameter tuple.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    /// Slot-major initial embedding table, `(3 * n_entities, width)`.
    pub w_embedding: Tensor,
    /// Relation embedding table, `(n_relations, width)`.
    pub w_relation: Tensor,
    /// Entity count the tables were sized from.
    pub n_entities: usize,
    /// Relation count the tables were sized from.
    pub n_relations: usize,
}

fn count_tensor(value: usize, device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_vec(vec![value as i64], (1,), device)?)
}

fn read_count(tensors: &mut HashMap<String, Tensor>, key: &str) -> Result<usize> {
    let tensor = tensors
        .remove(key)
        .ok_or_else(|| Error::Persistence(format!("missing entry: {key}")))?;
    let values = tensor
        .to_dtype(DType::I64)
        .and_then(|t| t.to_vec1::<i64>())
        .map_err(|e| Error::Persistence(format!("unreadable entry {key}: {e}")))?;
    match values[..] {
        [v] if v > 0 => Ok(v as usize),
        _ => Err(Error::Persistence(format!("malformed entry: {key}"))),
    }
}

/// Write a checkpoint to `path`.
pub fn save(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    let device = checkpoint.w_embedding.device();
    let mut tensors = HashMap::new();
    tensors.insert(KEY_EMBEDDING.to_string(), checkpoint.w_embedding.clone());
    tensors.insert(KEY_RELATION.to_string(), checkpoint.w_relation.clone());
    tensors.insert(
        KEY_N_ENTITIES.to_string(),
        count_tensor(checkpoint.n_entities, device)?,
    );
    tensors.insert(
        KEY_N_RELATIONS.to_string(),
        count_tensor(checkpoint.n_relations, device)?,
    );

    candle_core::safetensors::save(&tensors, path)
        .map_err(|e| Error::Persistence(format!("cannot write {}: {e}", path.display())))
}

/// Read a checkpoint back, verifying the tables match the stored counts.
pub fn load(path: &Path, device: &Device) -> Result<Checkpoint> {
    let mut tensors = candle_core::safetensors::load(path, device)
        .map_err(|e| Error::Persistence(format!("cannot read {}: {e}", path.display())))?;

    let w_embedding = tensors
        .remove(KEY_EMBEDDING)
        .ok_or_else(|| Error::Persistence(format!("missing entry: {KEY_EMBEDDING}")))?;
    let w_relation = tensors
        .remove(KEY_RELATION)
        .ok_or_else(|| Error::Persistence(format!("missing entry: {KEY_RELATION}")))?;
    let n_entities = read_count(&mut tensors, KEY_N_ENTITIES)?;
    let n_relations = read_count(&mut tensors, KEY_N_RELATIONS)?;

    let embedding_rows = w_embedding
        .dims2()
        .map_err(|e| Error::Persistence(format!("malformed {KEY_EMBEDDING}: {e}")))?
        .0;
    let relation_rows = w_relation
        .dims2()
        .map_err(|e| Error::Persistence(format!("malformed {KEY_RELATION}: {e}")))?
        .0;
    if embedding_rows != gravix_core::SLOTS * n_entities || relation_rows != n_relations {
        return Err(Error::Persistence(format!(
            "tables inconsistent with stored counts: embedding rows {embedding_rows} \
             (n_entities {n_entities}), relation rows {relation_rows} (n_relations {n_relations})"
        )));
    }

    Ok(Checkpoint {
        w_embedding,
        w_relation,
        n_entities,
        n_relations,
    })
}
