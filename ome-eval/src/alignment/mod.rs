//! Ontology alignments
//!
//! An alignment is an ordered list of correspondences between entities of two
//! ontologies, as produced by a matching tool or curated as a reference.

pub mod rdf;

pub use rdf::{parse_alignment, parse_alignment_str};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single proposed correspondence (`<Cell>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Entity IRI in the first ontology
    pub entity1: String,
    /// Entity IRI in the second ontology
    pub entity2: String,
    /// Confidence (1.0 when the cell carries no measure)
    pub measure: f64,
    /// Relation symbol (`=` when absent)
    pub relation: String,
}

impl Correspondence {
    pub fn new(entity1: impl Into<String>, entity2: impl Into<String>, measure: f64) -> Self {
        Self {
            entity1: entity1.into(),
            entity2: entity2.into(),
            measure,
            relation: "=".to_string(),
        }
    }

    pub fn pair(&self) -> (&str, &str) {
        (&self.entity1, &self.entity2)
    }
}

/// Parsed alignment document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub onto1: Option<String>,
    pub onto2: Option<String>,
    pub cells: Vec<Correspondence>,
}

impl Alignment {
    pub fn from_cells(cells: Vec<Correspondence>) -> Self {
        Self {
            onto1: None,
            onto2: None,
            cells,
        }
    }

    /// `(onto1, onto2)` when the header names both
    pub fn ontologies(&self) -> Option<(&str, &str)> {
        Some((self.onto1.as_deref()?, self.onto2.as_deref()?))
    }

    /// True when both headers name their ontologies and the names differ
    pub fn ontologies_differ(&self, other: &Alignment) -> bool {
        matches!(
            (self.ontologies(), other.ontologies()),
            (Some(a), Some(b)) if a != b
        )
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Set of (entity1, entity2) pairs for membership tests
    pub fn pair_index(&self) -> PairIndex<'_> {
        PairIndex {
            pairs: self.cells.iter().map(Correspondence::pair).collect(),
        }
    }
}

/// Borrowed pair set over an alignment
#[derive(Debug)]
pub struct PairIndex<'a> {
    pairs: HashSet<(&'a str, &'a str)>,
}

impl PairIndex<'_> {
    pub fn contains(&self, source: &str, target: &str) -> bool {
        self.pairs.contains(&(source, target))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_index_membership() {
        let alignment = Alignment::from_cells(vec![
            Correspondence::new("a#1", "b#1", 1.0),
            Correspondence::new("a#2", "b#2", 0.8),
            Correspondence::new("a#1", "b#1", 0.5),
        ]);

        let index = alignment.pair_index();
        assert_eq!(index.len(), 2);
        assert!(index.contains("a#2", "b#2"));
        assert!(!index.contains("b#2", "a#2"));
    }

    #[test]
    fn test_header_ontologies() {
        let mut tool = Alignment::default();
        assert_eq!(tool.ontologies(), None);

        let mut reference = Alignment::default();
        reference.onto1 = Some("http://cmt".into());
        reference.onto2 = Some("http://edas".into());
        assert_eq!(reference.ontologies(), Some(("http://cmt", "http://edas")));
        // An unnamed header never counts as a mismatch
        assert!(!tool.ontologies_differ(&reference));

        tool.onto1 = Some("http://cmt".into());
        tool.onto2 = Some("http://sigkdd".into());
        assert!(tool.ontologies_differ(&reference));
        tool.onto2 = Some("http://edas".into());
        assert!(!tool.ontologies_differ(&reference));
    }
}
