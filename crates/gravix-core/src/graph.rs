use crate::{Error, Result, Triple};

/// A validated knowledge graph: the full ordered triplet set plus the entity
/// and relation counts everything else is sized from.
///
/// The counts are fixed at construction. Adjacency structures and parameter
/// tensors derived from a graph must never be mixed with a graph built with
/// different counts.
///
/// # Example
///
/// ```rust
/// use gravix_core::{KnowledgeGraph, Triple};
///
/// let kg = KnowledgeGraph::new(vec![Triple::new(0, 0, 1)], 2, 1)?;
/// assert_eq!(kg.triple_count(), 1);
/// assert_eq!(kg.n_entities(), 2);
/// # Ok::<(), gravix_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    triples: Vec<Triple>,
    n_entities: usize,
    n_relations: usize,
}

impl KnowledgeGraph {
    /// Build a graph from a triplet list and declared counts.
    ///
    /// Fails with [`Error::InvalidGraph`] when a count is zero or any triple
    /// indexes outside `[0, n_entities)` / `[0, n_relations)`.
    pub fn new(triples: Vec<Triple>, n_entities: usize, n_relations: usize) -> Result<Self> {
        if n_entities == 0 {
            return Err(Error::InvalidGraph("entity count is unset".into()));
        }
        if n_relations == 0 {
            return Err(Error::InvalidGraph("relation count is unset".into()));
        }
        for (i, t) in triples.iter().enumerate() {
            if t.subject >= n_entities || t.object >= n_entities {
                return Err(Error::InvalidGraph(format!(
                    "triple {i} references entity outside [0, {n_entities}): ({}, {}, {})",
                    t.subject, t.relation, t.object
                )));
            }
            if t.relation >= n_relations {
                return Err(Error::InvalidGraph(format!(
                    "triple {i} references relation {} outside [0, {n_relations})",
                    t.relation
                )));
            }
        }
        Ok(Self {
            triples,
            n_entities,
            n_relations,
        })
    }

    /// The full triplet list, in load order.
    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    /// Number of entities.
    pub fn n_entities(&self) -> usize {
        self.n_entities
    }

    /// Number of relations.
    pub fn n_relations(&self) -> usize {
        self.n_relations
    }

    /// Number of triples.
    pub fn triple_count(&self) -> usize {
        self.triples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_graph() {
        let kg = KnowledgeGraph::new(vec![Triple::new(0, 0, 1), Triple::new(1, 0, 0)], 2, 1);
        assert!(kg.is_ok());
    }

    #[test]
    fn test_zero_entities_rejected() {
        let err = KnowledgeGraph::new(vec![], 0, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidGraph(_)));
    }

    #[test]
    fn test_out_of_range_entity_rejected() {
        let err = KnowledgeGraph::new(vec![Triple::new(0, 0, 5)], 2, 1).unwrap_err();
        assert!(err.to_string().contains("entity"));
    }

    #[test]
    fn test_out_of_range_relation_rejected() {
        let err = KnowledgeGraph::new(vec![Triple::new(0, 3, 1)], 2, 1).unwrap_err();
        assert!(err.to_string().contains("relation"));
    }
}
