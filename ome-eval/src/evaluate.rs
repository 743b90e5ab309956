//! Training and evaluation over dataset combinations
//!
//! **Purpose:** For each (training tables, test tables, tag) combination and
//! each classifier family, run a cross-validated grid search on the combined
//! training data, then refit every hyperparameter combination on the whole
//! training set and score it on the combined test data.

use crate::dataset::{random_undersample, FeatureTable};
use crate::error::{EvalError, EvalResult};
use crate::model::{describe, ClassifierKind, ParamValue};
use crate::report::{ResultRow, ResultTable, RunInfo};
use crate::selection::{Confusion, GridSearch, ParamGrid};
use ome_common::config::SelectionMetric;
use ome_common::Seed;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

/// Training tables, test tables and the tag identifying the split
#[derive(Debug, Clone)]
pub struct CrossTuple {
    pub train: Vec<FeatureTable>,
    pub test: Vec<FeatureTable>,
    pub tag: String,
}

impl CrossTuple {
    pub fn new(train: Vec<FeatureTable>, test: Vec<FeatureTable>, tag: impl Into<String>) -> Self {
        Self {
            train,
            test,
            tag: tag.into(),
        }
    }
}

/// A classifier family with its hyperparameter grid
#[derive(Debug, Clone)]
pub struct ClassifierSpec {
    pub kind: ClassifierKind,
    pub grid: ParamGrid,
}

impl ClassifierSpec {
    pub fn new(kind: ClassifierKind, grid: ParamGrid) -> Self {
        Self { kind, grid }
    }
}

const LEAF_FRACTIONS: [f64; 5] = [0.2, 0.4, 0.6, 0.8, 1.0];
const ESTIMATOR_COUNTS: [i64; 4] = [50, 100, 150, 200];

/// The eight classifier families with their published grids
pub fn default_classifiers() -> Vec<ClassifierSpec> {
    let hidden_layers: Vec<ParamValue> = [vec![10], vec![40], vec![100], vec![10, 10], vec![40, 40], vec![100, 100]]
        .into_iter()
        .map(ParamValue::Layers)
        .collect();

    vec![
        ClassifierSpec::new(
            ClassifierKind::RandomForest,
            ParamGrid::new()
                .with("n_estimators", ESTIMATOR_COUNTS)
                .with("criterion", ["gini", "entropy"]),
        ),
        ClassifierSpec::new(
            ClassifierKind::KNeighbors,
            ParamGrid::new()
                .with("n_neighbors", 1i64..=6)
                .with("p", [1i64, 2]),
        ),
        ClassifierSpec::new(
            ClassifierKind::DecisionTree,
            ParamGrid::new()
                .with("criterion", ["gini", "entropy"])
                .with("min_samples_leaf", LEAF_FRACTIONS),
        ),
        ClassifierSpec::new(
            ClassifierKind::Mlp,
            ParamGrid::new()
                .with("hidden_layer_sizes", hidden_layers)
                .with("learning_rate_init", [0.01, 0.05, 0.1]),
        ),
        ClassifierSpec::new(ClassifierKind::GaussianNb, ParamGrid::new()),
        ClassifierSpec::new(
            ClassifierKind::GradientBoosting,
            ParamGrid::new()
                .with("n_estimators", ESTIMATOR_COUNTS)
                .with("learning_rate", [0.01, 0.1, 0.2])
                .with("min_samples_leaf", LEAF_FRACTIONS),
        ),
        ClassifierSpec::new(
            ClassifierKind::LogisticRegression,
            ParamGrid::new()
                .with("C", [0.1, 0.5, 1.0, 10.0])
                .with("tol", [1e-2, 1e-3, 1e-4]),
        ),
        ClassifierSpec::new(
            ClassifierKind::AdaBoost,
            ParamGrid::new().with("n_estimators", ESTIMATOR_COUNTS),
        ),
    ]
}

/// Options shared by every search in a run
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub undersample: bool,
    pub cv_folds: usize,
    pub metric: SelectionMetric,
    pub seed: Seed,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            undersample: true,
            cv_folds: 10,
            metric: SelectionMetric::default(),
            seed: Seed::default(),
        }
    }
}

/// Grid-search every classifier on every combination and score on test data
///
/// # Arguments
/// - `cross_tuples`: (train tables, test tables, tag) combinations; all tables
///   of a combination must share the same columns
/// - `classifiers`: families and grids to evaluate
/// - `options`: undersampling, fold count, selection metric, seed
///
/// # Returns
/// One row per (tag, classifier, combination), in input order. A combination
/// that fails to fit during the search or the final refit keeps its row, with
/// the error recorded and zero test scores.
pub fn train_and_eval(
    cross_tuples: &[CrossTuple],
    classifiers: &[ClassifierSpec],
    options: &TrainOptions,
) -> EvalResult<ResultTable> {
    let mut table = ResultTable::new(RunInfo::new(
        options.seed,
        options.cv_folds,
        options.undersample,
        options.metric,
    ));

    for (ti, tuple) in cross_tuples.iter().enumerate() {
        let train = FeatureTable::concat(&tuple.train)?;
        let test = FeatureTable::concat(&tuple.test)?;
        if train.columns() != test.columns() {
            return Err(EvalError::Schema(format!(
                "split '{}': training columns {:?} differ from test columns {:?}",
                tuple.tag,
                train.columns(),
                test.columns()
            )));
        }

        let tuple_seed = options.seed.derive(ti as u64);
        let train = if options.undersample {
            random_undersample(&train, tuple_seed)?
        } else {
            train
        };
        let (negatives, positives) = train.class_counts();
        if negatives == 0 || positives == 0 {
            warn!(
                "Split '{}': training data has a single class after preparation",
                tuple.tag
            );
        }
        info!(
            "Split '{}': {} training rows ({} positive), {} test rows, {} features",
            tuple.tag,
            train.len(),
            positives,
            test.len(),
            train.columns().len()
        );

        let train_x = train.records();
        let train_y = train.targets();
        let test_x = test.records();
        let test_y = test.targets();

        for (ci, spec) in classifiers.iter().enumerate() {
            let search = GridSearch::new(
                spec.kind,
                spec.grid.clone(),
                options.cv_folds,
                tuple_seed.derive(ci as u64),
            )
            .with_metric(options.metric);

            let started = Instant::now();
            let outcome = search.run(train_x.view(), train_y.view())?;

            let rows: Vec<ResultRow> = outcome
                .candidates
                .par_iter()
                .enumerate()
                .map(|(index, candidate)| {
                    let mut row = ResultRow {
                        tag: tuple.tag.clone(),
                        classifier: spec.kind.name().to_string(),
                        params: candidate.params.clone(),
                        cv_accuracy: candidate.mean_accuracy,
                        cv_f1: candidate.mean_f1,
                        cv_f1_std: candidate.std_f1,
                        rank: candidate.rank,
                        test_accuracy: 0.0,
                        test_precision: 0.0,
                        test_recall: 0.0,
                        test_f1: 0.0,
                        selected: outcome.best_index == Some(index),
                        n_train: train.len(),
                        n_test: test.len(),
                        fit_millis: 0,
                        error: candidate.error.clone(),
                    };
                    if candidate.is_failed() {
                        return row;
                    }

                    let fit_start = Instant::now();
                    let refit = spec
                        .kind
                        .build(&candidate.params, search.fit_seed(index, outcome.n_folds))
                        .and_then(|mut model| {
                            model.fit(train_x.view(), train_y.view())?;
                            model.predict(test_x.view())
                        });
                    row.fit_millis = fit_start.elapsed().as_millis() as u64;
                    match refit {
                        Ok(predicted) => {
                            let confusion = Confusion::from_predictions(&test_y, &predicted);
                            row.test_accuracy = confusion.accuracy();
                            row.test_precision = confusion.precision();
                            row.test_recall = confusion.recall();
                            row.test_f1 = confusion.f1();
                        }
                        Err(e) => {
                            warn!(
                                "Split '{}' {} {}: refit failed: {}",
                                tuple.tag,
                                spec.kind,
                                describe(&candidate.params),
                                e
                            );
                            row.error = Some(e.to_string());
                        }
                    }
                    row
                })
                .collect();

            match (outcome.best(), rows.iter().find(|r| r.selected)) {
                (Some(best), Some(row)) => info!(
                    "Split '{}' {}: {} combinations in {:.1}s, selected {} cv_f1={:.4} test_f1={:.4}",
                    tuple.tag,
                    spec.kind,
                    rows.len(),
                    started.elapsed().as_secs_f64(),
                    describe(&best.params),
                    best.mean_f1,
                    row.test_f1
                ),
                _ => warn!(
                    "Split '{}' {}: none of {} combinations could be fitted",
                    tuple.tag,
                    spec.kind,
                    rows.len()
                ),
            }
            table.rows.extend(rows);
        }
    }

    Ok(table)
}
