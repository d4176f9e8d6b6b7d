use serde::{Deserialize, Serialize};

/// A (subject, relation, object) fact with interned indices.
///
/// Subject and object index into `[0, n_entities)`, the relation into
/// `[0, n_relations)`. Triples are immutable once loaded; corruption during
/// negative sampling goes through [`Triple::with_subject`] /
/// [`Triple::with_object`], which copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// Subject entity index.
    pub subject: usize,
    /// Relation index.
    pub relation: usize,
    /// Object entity index.
    pub object: usize,
}

impl Triple {
    /// Create a new triple from raw indices.
    pub fn new(subject: usize, relation: usize, object: usize) -> Self {
        Self {
            subject,
            relation,
            object,
        }
    }

    /// Copy of this triple with the subject replaced.
    pub fn with_subject(self, subject: usize) -> Self {
        Self { subject, ..self }
    }

    /// Copy of this triple with the object replaced.
    pub fn with_object(self, object: usize) -> Self {
        Self { object, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacement_copies() {
        let t = Triple::new(0, 1, 2);
        let corrupted = t.with_object(7);

        assert_eq!(t, Triple::new(0, 1, 2));
        assert_eq!(corrupted, Triple::new(0, 1, 7));
    }

    #[test]
    fn test_with_subject() {
        let t = Triple::new(3, 0, 5).with_subject(9);
        assert_eq!(t.subject, 9);
        assert_eq!(t.relation, 0);
        assert_eq!(t.object, 5);
    }
}
