//! CART decision trees over `linfa-trees`
//!
//! Unit sample weights make linfa's `min_weight_leaf` a row count, so
//! `min_samples_leaf` resolves against the training size and passes straight
//! through. The random forest grows its bootstrap trees with [`grow`].

use super::{
    check_training_data, dataset, fit_failed, not_fitted, Classifier, LeafSize, ParamReader,
    ParamSet,
};
use crate::error::EvalResult;
use linfa::traits::{Fit, Predict};
use linfa_trees::{DecisionTree as LinfaTree, SplitQuality};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Gini,
    Entropy,
}

impl Criterion {
    pub const NAMES: [&'static str; 2] = ["gini", "entropy"];

    pub fn parse(name: &str) -> Option<Criterion> {
        match name {
            "gini" => Some(Criterion::Gini),
            "entropy" => Some(Criterion::Entropy),
            _ => None,
        }
    }

    fn split_quality(self) -> SplitQuality {
        match self {
            Criterion::Gini => SplitQuality::Gini,
            Criterion::Entropy => SplitQuality::Entropy,
        }
    }
}

/// Fit one fully grown tree on `(x, y)`
pub(crate) fn grow(
    model: &str,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, usize>,
    criterion: Criterion,
    min_samples_leaf: LeafSize,
) -> EvalResult<LinfaTree<f64, usize>> {
    LinfaTree::params()
        .split_quality(criterion.split_quality())
        .max_depth(None)
        .min_weight_leaf(min_samples_leaf.resolve(x.nrows()) as f32)
        .fit(&dataset(x, y))
        .map_err(|e| fit_failed(model, e))
}

/// Single CART classifier
///
/// Parameters: `criterion` (gini | entropy, default gini), `min_samples_leaf`
/// (count or fraction of the training rows, default 1).
pub struct DecisionTree {
    criterion: Criterion,
    min_samples_leaf: LeafSize,
    tree: Option<LinfaTree<f64, usize>>,
}

impl DecisionTree {
    pub fn new(criterion: Criterion, min_samples_leaf: LeafSize) -> Self {
        Self {
            criterion,
            min_samples_leaf,
            tree: None,
        }
    }

    pub fn from_params(model: &'static str, params: &ParamSet) -> EvalResult<Self> {
        let reader = ParamReader::new(model, params, &["criterion", "min_samples_leaf"])?;
        let criterion = reader.choice_or("criterion", &Criterion::NAMES, "gini")?;
        let min_samples_leaf = reader.leaf_size_or("min_samples_leaf", LeafSize::Count(1))?;
        Ok(Self::new(
            Criterion::parse(criterion).unwrap_or(Criterion::Gini),
            min_samples_leaf,
        ))
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("DecisionTree", x, y)?;
        self.tree = Some(grow(
            "DecisionTree",
            x,
            y,
            self.criterion,
            self.min_samples_leaf,
        )?);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        let tree = self.tree.as_ref().ok_or_else(|| not_fitted("DecisionTree"))?;
        let predicted: Array1<usize> = tree.predict(&x);
        Ok(predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::*;

    #[test]
    fn test_fully_grown_tree_fits_majority_vote() {
        let (x, y) = majority_vote_dataset();
        for criterion in [Criterion::Gini, Criterion::Entropy] {
            let mut tree = DecisionTree::new(criterion, LeafSize::Count(1));
            tree.fit(x.view(), y.view()).unwrap();
            assert_eq!(tree.predict(x.view()).unwrap(), y, "{:?}", criterion);
        }
    }

    #[test]
    fn test_full_fraction_leaf_cannot_split() {
        let (x, y) = majority_vote_dataset();
        let mut tree = DecisionTree::new(Criterion::Gini, LeafSize::Fraction(1.0));
        tree.fit(x.view(), y.view()).unwrap();
        let predicted = tree.predict(x.view()).unwrap();
        assert!(predicted.iter().all(|&p| p == predicted[0]));
    }

    #[test]
    fn test_unknown_criterion() {
        let mut params = ParamSet::new();
        params.insert("criterion".into(), "log_loss".into());
        assert!(DecisionTree::from_params("DecisionTreeClassifier", &params).is_err());
    }
}
