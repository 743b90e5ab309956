//! Random forest
//!
//! Bagging over `linfa-trees`: every tree trains on its own seeded bootstrap
//! sample of the rows. linfa grows each tree over all features, so the
//! ensemble varies by resampling alone.

use super::tree::{grow, Criterion};
use super::{check_training_data, not_fitted, Classifier, LeafSize, ParamReader, ParamSet};
use crate::error::EvalResult;
use linfa::traits::Predict;
use linfa_trees::DecisionTree as LinfaTree;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use ome_common::Seed;
use rand::Rng;

/// Bagged CART trees voting by majority
///
/// Parameters: `n_estimators` (default 100), `criterion` (gini | entropy).
/// A tied vote predicts 0.
pub struct RandomForest {
    n_estimators: usize,
    criterion: Criterion,
    seed: Seed,
    trees: Vec<LinfaTree<f64, usize>>,
}

impl RandomForest {
    pub fn new(n_estimators: usize, criterion: Criterion, seed: Seed) -> Self {
        Self {
            n_estimators,
            criterion,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn from_params(model: &'static str, params: &ParamSet, seed: Seed) -> EvalResult<Self> {
        let reader = ParamReader::new(model, params, &["n_estimators", "criterion"])?;
        let n_estimators = reader.usize_or("n_estimators", 100)?;
        let criterion = reader.choice_or("criterion", &Criterion::NAMES, "gini")?;
        Ok(Self::new(
            n_estimators,
            Criterion::parse(criterion).unwrap_or(Criterion::Gini),
            seed,
        ))
    }

    /// Positive votes per row
    fn votes(&self, x: ArrayView2<'_, f64>) -> Array1<usize> {
        let mut votes = Array1::<usize>::zeros(x.nrows());
        for tree in &self.trees {
            let predicted: Array1<usize> = tree.predict(&x);
            votes += &predicted;
        }
        votes
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("RandomForest", x, y)?;
        let n = x.nrows();
        self.trees = (0..self.n_estimators)
            .map(|t| {
                let mut rng = self.seed.rng(t as u64);
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                grow(
                    "RandomForest",
                    x.select(Axis(0), &rows).view(),
                    y.select(Axis(0), &rows).view(),
                    self.criterion,
                    LeafSize::Count(1),
                )
            })
            .collect::<EvalResult<_>>()?;
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        if self.trees.is_empty() {
            return Err(not_fitted("RandomForest"));
        }
        let n_trees = self.trees.len();
        Ok(self.votes(x).mapv(|v| usize::from(v * 2 > n_trees)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::*;
    use ndarray::array;

    #[test]
    fn test_forest_learns_majority_vote() {
        let (x, y) = majority_vote_dataset();
        let mut forest = RandomForest::new(25, Criterion::Entropy, Seed::new(11));
        forest.fit(x.view(), y.view()).unwrap();
        assert!(accuracy(&forest.predict(x.view()).unwrap(), &y) >= 0.9);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = majority_vote_dataset();
        let rows = array![[1.0, 0.0, 0.0], [1.0, 1.0, 0.0]];

        let mut a = RandomForest::new(10, Criterion::Gini, Seed::new(5));
        let mut b = RandomForest::new(10, Criterion::Gini, Seed::new(5));
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();
        assert_eq!(a.votes(rows.view()), b.votes(rows.view()));
    }

    #[test]
    fn test_unfitted_forest_is_an_error() {
        let forest = RandomForest::new(10, Criterion::Gini, Seed::new(1));
        assert!(forest.predict(array![[1.0]].view()).is_err());
    }
}
