//! Boosted ensembles: gradient boosting and AdaBoost

use super::logistic::LogisticRegression;
use super::regression_tree::RegressionTree;
use super::{
    check_training_data, fit_failed, not_fitted, sigmoid, Classifier, LeafSize, ParamReader,
    ParamSet,
};
use crate::error::EvalResult;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use ome_common::Seed;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::debug;

const GB_MAX_DEPTH: usize = 3;
const PRIOR_CLAMP: f64 = 1e-6;

/// Gradient boosting on log-loss with depth-3 regression trees
///
/// Parameters: `n_estimators` (default 100), `learning_rate` (default 0.1),
/// `min_samples_leaf` (count or fraction, default 1). Each stage fits a tree
/// to the residuals `y − σ(F)`; leaves hold the mean residual.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    n_estimators: usize,
    learning_rate: f64,
    min_samples_leaf: LeafSize,
    init: f64,
    stages: Option<Vec<RegressionTree>>,
}

impl GradientBoosting {
    pub fn new(n_estimators: usize, learning_rate: f64, min_samples_leaf: LeafSize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            min_samples_leaf,
            init: 0.0,
            stages: None,
        }
    }

    pub fn from_params(model: &'static str, params: &ParamSet) -> EvalResult<Self> {
        let reader = ParamReader::new(
            model,
            params,
            &["n_estimators", "learning_rate", "min_samples_leaf"],
        )?;
        Ok(Self::new(
            reader.usize_or("n_estimators", 100)?,
            reader.positive_f64_or("learning_rate", 0.1)?,
            reader.leaf_size_or("min_samples_leaf", LeafSize::Count(1))?,
        ))
    }

    fn stage_sum(stages: &[RegressionTree], row: ArrayView1<'_, f64>) -> f64 {
        stages.iter().map(|t| t.predict_row(row)).sum()
    }
}

impl Classifier for GradientBoosting {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("GradientBoosting", x, y)?;
        let targets = y.mapv(|l| l as f64);

        let prior = targets
            .mean()
            .unwrap_or(0.5)
            .clamp(PRIOR_CLAMP, 1.0 - PRIOR_CLAMP);
        self.init = (prior / (1.0 - prior)).ln();

        let mut scores = Array1::from_elem(x.nrows(), self.init);
        let mut stages = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let residuals = &targets - &scores.mapv(sigmoid);
            let tree = RegressionTree::fit(
                x,
                residuals.view(),
                self.min_samples_leaf,
                GB_MAX_DEPTH,
            );
            for (score, row) in scores.iter_mut().zip(x.rows()) {
                *score += self.learning_rate * tree.predict_row(row);
            }
            stages.push(tree);
        }
        self.stages = Some(stages);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        let stages = self
            .stages
            .as_ref()
            .ok_or_else(|| not_fitted("GradientBoosting"))?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                let decision = self.init + self.learning_rate * Self::stage_sum(stages, row);
                usize::from(decision > 0.0)
            })
            .collect())
    }
}

/// SAMME AdaBoost over logistic regressions
///
/// Parameters: `n_estimators` (default 50), `base_estimator` (only
/// `logistic_regression`). The base estimator takes no sample weights, so
/// each round trains on a seeded resample drawn in proportion to the current
/// weights. Boosting stops early on a perfect estimator. An estimator no
/// better than chance ends boosting; if it is the first one it is kept with
/// unit weight so the ensemble is never empty.
pub struct AdaBoost {
    n_estimators: usize,
    seed: Seed,
    estimators: Option<Vec<(f64, LogisticRegression)>>,
}

impl AdaBoost {
    pub fn new(n_estimators: usize, seed: Seed) -> Self {
        Self {
            n_estimators,
            seed,
            estimators: None,
        }
    }

    pub fn from_params(model: &'static str, params: &ParamSet, seed: Seed) -> EvalResult<Self> {
        let reader = ParamReader::new(model, params, &["n_estimators", "base_estimator"])?;
        reader.choice_or("base_estimator", &["logistic_regression"], "logistic_regression")?;
        Ok(Self::new(reader.usize_or("n_estimators", 50)?, seed))
    }

    #[cfg(test)]
    fn n_fitted(&self) -> usize {
        self.estimators.as_ref().map_or(0, Vec::len)
    }

    fn base() -> LogisticRegression {
        LogisticRegression::new(1.0, 1e-4)
    }
}

impl Classifier for AdaBoost {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("AdaBoost", x, y)?;
        let n = x.nrows();
        let mut weights = Array1::from_elem(n, 1.0 / n as f64);
        let mut estimators = Vec::new();

        for round in 0..self.n_estimators {
            let sampler =
                WeightedIndex::new(weights.iter()).map_err(|e| fit_failed("AdaBoost", e))?;
            let mut rng = self.seed.rng(round as u64);
            let rows: Vec<usize> = (0..n).map(|_| sampler.sample(&mut rng)).collect();

            let mut estimator = Self::base();
            estimator.fit(
                x.select(Axis(0), &rows).view(),
                y.select(Axis(0), &rows).view(),
            )?;
            let predicted = estimator.predict(x)?;
            let missed: Vec<bool> = predicted.iter().zip(y).map(|(p, l)| p != l).collect();
            let error: f64 = weights
                .iter()
                .zip(&missed)
                .filter(|(_, &m)| m)
                .map(|(w, _)| w)
                .sum::<f64>()
                / weights.sum();

            if error <= 0.0 {
                estimators.push((1.0, estimator));
                debug!(round, "AdaBoost: perfect estimator");
                break;
            }
            if error >= 0.5 {
                if estimators.is_empty() {
                    estimators.push((1.0, estimator));
                }
                debug!(round, error, "AdaBoost: estimator no better than chance, stopping");
                break;
            }

            let alpha = ((1.0 - error) / error).ln();
            for (w, &m) in weights.iter_mut().zip(&missed) {
                if m {
                    *w *= alpha.exp();
                }
            }
            let total = weights.sum();
            weights.mapv_inplace(|w| w / total);
            estimators.push((alpha, estimator));
        }
        self.estimators = Some(estimators);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        let estimators = self
            .estimators
            .as_ref()
            .ok_or_else(|| not_fitted("AdaBoost"))?;
        let mut votes = Array1::<f64>::zeros(x.nrows());
        for (alpha, estimator) in estimators {
            for (v, p) in votes.iter_mut().zip(estimator.predict(x)?) {
                *v += if p == 1 { *alpha } else { -*alpha };
            }
        }
        Ok(votes.mapv(|v| usize::from(v > 0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_gradient_boosting_learns_majority_vote() {
        let (x, y) = majority_vote_dataset();
        let mut model = GradientBoosting::new(50, 0.1, LeafSize::Count(1));
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_gradient_boosting_full_leaf_fraction_predicts_prior() {
        let x = array![[0.0], [1.0], [1.0], [1.0]];
        let y = array![0, 1, 1, 1];
        let mut model = GradientBoosting::new(10, 0.1, LeafSize::Fraction(1.0));
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), array![1, 1, 1, 1]);
    }

    #[test]
    fn test_adaboost_stops_on_perfect_estimator() {
        let (x, y) = first_feature_dataset();
        let mut model = AdaBoost::new(50, Seed::new(2));
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.n_fitted(), 1);
        assert_eq!(model.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_adaboost_never_empty() {
        // Identical rows with mixed labels: no estimator beats chance
        let x = Array2::from_elem((4, 1), 1.0);
        let y = array![0, 1, 0, 1];
        let mut model = AdaBoost::new(10, Seed::new(2));
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.n_fitted(), 1);
    }

    #[test]
    fn test_adaboost_same_seed_same_ensemble() {
        let (x, y) = majority_vote_dataset();
        let mut a = AdaBoost::new(5, Seed::new(9));
        let mut b = AdaBoost::new(5, Seed::new(9));
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();
        assert_eq!(a.n_fitted(), b.n_fitted());
        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_adaboost_rejects_other_base_estimators() {
        let mut params = ParamSet::new();
        params.insert("base_estimator".into(), "decision_tree".into());
        assert!(AdaBoost::from_params("AdaBoostClassifier", &params, Seed::new(1)).is_err());
    }
}
