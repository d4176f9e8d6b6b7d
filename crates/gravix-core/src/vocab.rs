use crate::Triple;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label ↔ index interning for entities and relations.
///
/// The training core only sees integer indices; this is the glue that turns
/// raw labeled facts into [`Triple`]s and back. Indices are assigned in
/// first-seen order, so interning the same file twice yields the same ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    entities: Vec<String>,
    relations: Vec<String>,

    #[serde(skip)]
    entity_index: HashMap<String, usize>,
    #[serde(skip)]
    relation_index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a labeled fact, assigning fresh ids as needed.
    pub fn intern(&mut self, subject: &str, relation: &str, object: &str) -> Triple {
        let s = self.intern_entity(subject);
        let r = self.intern_relation(relation);
        let o = self.intern_entity(object);
        Triple::new(s, r, o)
    }

    /// Intern an entity label.
    pub fn intern_entity(&mut self, label: &str) -> usize {
        if let Some(&id) = self.entity_index.get(label) {
            return id;
        }
        let id = self.entities.len();
        self.entities.push(label.to_string());
        self.entity_index.insert(label.to_string(), id);
        id
    }

    /// Intern a relation label.
    pub fn intern_relation(&mut self, label: &str) -> usize {
        if let Some(&id) = self.relation_index.get(label) {
            return id;
        }
        let id = self.relations.len();
        self.relations.push(label.to_string());
        self.relation_index.insert(label.to_string(), id);
        id
    }

    /// Look up an entity label by id.
    pub fn entity(&self, id: usize) -> Option<&str> {
        self.entities.get(id).map(String::as_str)
    }

    /// Look up a relation label by id.
    pub fn relation(&self, id: usize) -> Option<&str> {
        self.relations.get(id).map(String::as_str)
    }

    /// Look up an entity id by label.
    pub fn entity_id(&self, label: &str) -> Option<usize> {
        self.entity_index.get(label).copied()
    }

    /// Look up a relation id by label.
    pub fn relation_id(&self, label: &str) -> Option<usize> {
        self.relation_index.get(label).copied()
    }

    /// Number of distinct entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of distinct relations.
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// Rebuild the label → id maps after deserialization.
    pub fn rebuild_indexes(&mut self) {
        self.entity_index = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.clone(), i))
            .collect();
        self.relation_index = self
            .relations
            .iter()
            .enumerate()
            .map(|(i, r)| (r.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_assigns_stable_ids() {
        let mut vocab = Vocabulary::new();
        let a = vocab.intern("alice", "knows", "bob");
        let b = vocab.intern("bob", "knows", "alice");

        assert_eq!(a, Triple::new(0, 0, 1));
        assert_eq!(b, Triple::new(1, 0, 0));
        assert_eq!(vocab.entity_count(), 2);
        assert_eq!(vocab.relation_count(), 1);
    }

    #[test]
    fn test_lookup_round_trip() {
        let mut vocab = Vocabulary::new();
        vocab.intern("paris", "capital_of", "france");

        assert_eq!(vocab.entity(0), Some("paris"));
        assert_eq!(vocab.entity_id("france"), Some(1));
        assert_eq!(vocab.relation(0), Some("capital_of"));
        assert_eq!(vocab.relation_id("missing"), None);
    }

    #[test]
    fn test_rebuild_indexes() {
        let mut vocab = Vocabulary::new();
        vocab.intern("a", "r", "b");

        let mut stripped = Vocabulary {
            entities: vocab.entities.clone(),
            relations: vocab.relations.clone(),
            ..Default::default()
        };
        assert_eq!(stripped.entity_id("a"), None);

        stripped.rebuild_indexes();
        assert_eq!(stripped.entity_id("a"), Some(0));
        assert_eq!(stripped.relation_id("r"), Some(0));
    }
}
