//! Exhaustive grid search with stratified cross-validation
//!
//! Every combination is fitted once per fold. Combinations run in parallel;
//! each fit derives its RNG from the search seed and the (combination, fold)
//! position, so results do not depend on scheduling.

use super::folds::{stratified_k_fold, Fold};
use super::grid::ParamGrid;
use super::metrics::{mean, std_dev, Confusion};
use crate::error::{EvalError, EvalResult};
use crate::model::{describe, ClassifierKind, ParamSet};
use ome_common::config::SelectionMetric;
use ome_common::Seed;
use ndarray::{ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Scores of one fit on one fold
#[derive(Debug, Clone, PartialEq)]
pub struct FoldScore {
    pub fold: usize,
    pub accuracy: f64,
    pub f1: f64,
}

/// Cross-validated scores of one combination
///
/// A combination that failed to build or fit on any fold carries the error,
/// zero scores and the rank after every successful combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub params: ParamSet,
    pub fold_scores: Vec<FoldScore>,
    pub mean_accuracy: f64,
    pub mean_f1: f64,
    pub std_f1: f64,
    /// 1 = best by the selection metric; ties share a rank
    pub rank: usize,
    pub error: Option<String>,
}

impl CandidateResult {
    fn failed(params: &ParamSet, error: &EvalError) -> Self {
        Self {
            params: params.clone(),
            fold_scores: Vec::new(),
            mean_accuracy: 0.0,
            mean_f1: 0.0,
            std_f1: 0.0,
            rank: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn mean_score(&self, metric: SelectionMetric) -> f64 {
        match metric {
            SelectionMetric::Accuracy => self.mean_accuracy,
            SelectionMetric::F1 => self.mean_f1,
        }
    }
}

/// All candidates in grid order plus the selected one
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub candidates: Vec<CandidateResult>,
    /// `None` when every combination failed
    pub best_index: Option<usize>,
    pub n_folds: usize,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&CandidateResult> {
        self.best_index.map(|i| &self.candidates[i])
    }

    /// Total number of successful model fits
    pub fn fits(&self) -> usize {
        self.candidates.iter().map(|c| c.fold_scores.len()).sum()
    }
}

/// Grid search configuration for one classifier family
#[derive(Debug, Clone)]
pub struct GridSearch {
    pub kind: ClassifierKind,
    pub grid: ParamGrid,
    pub folds: usize,
    pub metric: SelectionMetric,
    pub seed: Seed,
}

impl GridSearch {
    pub fn new(kind: ClassifierKind, grid: ParamGrid, folds: usize, seed: Seed) -> Self {
        Self {
            kind,
            grid,
            folds,
            metric: SelectionMetric::default(),
            seed,
        }
    }

    pub fn with_metric(mut self, metric: SelectionMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Seed for fitting combination `candidate` on `fold`
    pub fn fit_seed(&self, candidate: usize, fold: usize) -> Seed {
        self.seed.derive((candidate * 1000 + fold) as u64)
    }

    /// Evaluate every combination on every fold of `(x, y)`
    ///
    /// The best combination has the highest mean selection score; ties go to
    /// the earliest in grid order. Failed combinations are logged and kept
    /// but never selected.
    ///
    /// # Errors
    /// An empty grid axis, or rows that cannot be split into the folds
    pub fn run(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<SearchOutcome> {
        let combinations = self.grid.combinations();
        if combinations.is_empty() {
            return Err(EvalError::Model(format!(
                "{}: parameter grid has an empty axis",
                self.kind
            )));
        }
        let labels: Vec<usize> = y.to_vec();
        let folds = stratified_k_fold(&labels, self.folds)?;

        debug!(
            "{}: {} combinations x {} folds",
            self.kind,
            combinations.len(),
            folds.len()
        );

        let mut candidates: Vec<CandidateResult> = combinations
            .par_iter()
            .enumerate()
            .map(|(ci, params)| match self.cross_validate(ci, params, &folds, x, y) {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!("{}: {} failed: {}", self.kind, describe(params), e);
                    CandidateResult::failed(params, &e)
                }
            })
            .collect();

        let scores: Vec<Option<f64>> = candidates
            .iter()
            .map(|c| (!c.is_failed()).then(|| c.mean_score(self.metric)))
            .collect();
        let succeeded = scores.iter().flatten().count();
        for (candidate, score) in candidates.iter_mut().zip(&scores) {
            candidate.rank = match score {
                Some(s) => 1 + scores.iter().flatten().filter(|&&o| o > *s).count(),
                None => succeeded + 1,
            };
        }
        let best_index = scores
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (i, s)))
            .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
                Some((_, b)) if s <= b => best,
                _ => Some((i, s)),
            })
            .map(|(i, _)| i);

        match best_index {
            Some(i) => debug!(
                "{}: best {} ({} = {:.4})",
                self.kind,
                describe(&candidates[i].params),
                match self.metric {
                    SelectionMetric::Accuracy => "accuracy",
                    SelectionMetric::F1 => "f1",
                },
                candidates[i].mean_score(self.metric)
            ),
            None => warn!("{}: every combination failed", self.kind),
        }

        Ok(SearchOutcome {
            candidates,
            best_index,
            n_folds: folds.len(),
        })
    }

    fn cross_validate(
        &self,
        ci: usize,
        params: &ParamSet,
        folds: &[Fold],
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, usize>,
    ) -> EvalResult<CandidateResult> {
        let mut fold_scores = Vec::with_capacity(folds.len());
        for (fi, fold) in folds.iter().enumerate() {
            let train_x = x.select(Axis(0), &fold.train);
            let train_y = y.select(Axis(0), &fold.train);
            let test_x = x.select(Axis(0), &fold.test);
            let test_y = y.select(Axis(0), &fold.test);

            let mut model = self.kind.build(params, self.fit_seed(ci, fi))?;
            model.fit(train_x.view(), train_y.view())?;
            let predicted = model.predict(test_x.view())?;
            let confusion = Confusion::from_predictions(&test_y, &predicted);
            fold_scores.push(FoldScore {
                fold: fi,
                accuracy: confusion.accuracy(),
                f1: confusion.f1(),
            });
        }

        let accuracies: Vec<f64> = fold_scores.iter().map(|s| s.accuracy).collect();
        let f1s: Vec<f64> = fold_scores.iter().map(|s| s.f1).collect();
        Ok(CandidateResult {
            params: params.clone(),
            mean_accuracy: mean(&accuracies),
            mean_f1: mean(&f1s),
            std_f1: std_dev(&f1s),
            fold_scores,
            rank: 0,
            error: None,
        })
    }
}
