//! Hyperparameter grids

use crate::model::{ParamSet, ParamValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candidate values per parameter name
///
/// Expansion is the Cartesian product over parameter names in sorted order,
/// with the last name varying fastest. An empty grid expands to exactly one
/// empty combination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    axes: BTreeMap<String, Vec<ParamValue>>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style axis insertion
    pub fn with<V: Into<ParamValue>>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.axes
            .insert(name.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn axes(&self) -> &BTreeMap<String, Vec<ParamValue>> {
        &self.axes
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.axes.values().map(Vec::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn combinations(&self) -> Vec<ParamSet> {
        let mut combos = vec![ParamSet::new()];
        for (name, values) in &self.axes {
            combos = combos
                .into_iter()
                .flat_map(|combo| {
                    values.iter().map(move |value| {
                        let mut next = combo.clone();
                        next.insert(name.clone(), value.clone());
                        next
                    })
                })
                .collect();
        }
        combos
    }
}
