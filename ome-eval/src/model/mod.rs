//! Binary classifiers
//!
//! **Purpose:** Fit and predict 0/1 labels from binary tool-agreement features.
//!
//! Every classifier family sits behind the [`Classifier`] trait and is built
//! from a [`ClassifierKind`] plus a hyperparameter combination. Construction
//! validates parameters; fitting validates the training data. Randomized
//! families (forest, MLP, AdaBoost) take an explicit [`Seed`].
//!
//! Families with a linfa implementation wrap it (k-nearest neighbours over a
//! `linfa-nn` ball tree, `linfa-logistic`, `linfa-trees`, `linfa-bayes`).
//! The forest bags `linfa-trees` trees; gradient boosting, AdaBoost and the
//! MLP are built here on `ndarray`.

pub mod boosting;
pub mod forest;
pub mod knn;
pub mod logistic;
pub mod mlp;
pub mod naive_bayes;
pub mod params;
pub mod regression_tree;
pub mod tree;

pub use params::{describe, LeafSize, ParamReader, ParamSet, ParamValue};

use crate::error::{EvalError, EvalResult};
use linfa::Dataset;
use ndarray::{Array1, ArrayView1, ArrayView2, Ix1};
use ome_common::Seed;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A trainable binary classifier
pub trait Classifier: Send {
    /// Fit on rows `x` with labels `y` (each 0 or 1)
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()>;

    /// Predict a label per row of `x`
    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>>;
}

/// Classifier families available to grid search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    RandomForest,
    KNeighbors,
    DecisionTree,
    Mlp,
    GaussianNb,
    GradientBoosting,
    LogisticRegression,
    AdaBoost,
}

impl ClassifierKind {
    /// All families in evaluation order
    pub const ALL: [ClassifierKind; 8] = [
        ClassifierKind::RandomForest,
        ClassifierKind::KNeighbors,
        ClassifierKind::DecisionTree,
        ClassifierKind::Mlp,
        ClassifierKind::GaussianNb,
        ClassifierKind::GradientBoosting,
        ClassifierKind::LogisticRegression,
        ClassifierKind::AdaBoost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::RandomForest => "RandomForestClassifier",
            ClassifierKind::KNeighbors => "KNeighborsClassifier",
            ClassifierKind::DecisionTree => "DecisionTreeClassifier",
            ClassifierKind::Mlp => "MLPClassifier",
            ClassifierKind::GaussianNb => "GaussianNB",
            ClassifierKind::GradientBoosting => "GradientBoostingClassifier",
            ClassifierKind::LogisticRegression => "LogisticRegression",
            ClassifierKind::AdaBoost => "AdaBoostClassifier",
        }
    }

    /// Build an unfitted classifier from one hyperparameter combination
    pub fn build(&self, params: &ParamSet, seed: Seed) -> EvalResult<Box<dyn Classifier>> {
        let name = self.name();
        Ok(match self {
            ClassifierKind::RandomForest => {
                Box::new(forest::RandomForest::from_params(name, params, seed)?)
            }
            ClassifierKind::KNeighbors => Box::new(knn::KNeighbors::from_params(name, params)?),
            ClassifierKind::DecisionTree => {
                Box::new(tree::DecisionTree::from_params(name, params)?)
            }
            ClassifierKind::Mlp => Box::new(mlp::Mlp::from_params(name, params, seed)?),
            ClassifierKind::GaussianNb => {
                Box::new(naive_bayes::GaussianNb::from_params(name, params)?)
            }
            ClassifierKind::GradientBoosting => {
                Box::new(boosting::GradientBoosting::from_params(name, params)?)
            }
            ClassifierKind::LogisticRegression => {
                Box::new(logistic::LogisticRegression::from_params(name, params)?)
            }
            ClassifierKind::AdaBoost => {
                Box::new(boosting::AdaBoost::from_params(name, params, seed)?)
            }
        })
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared training-data checks
///
/// # Returns
/// Number of features per row
pub(crate) fn check_training_data(
    model: &str,
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, usize>,
) -> EvalResult<usize> {
    if x.nrows() == 0 {
        return Err(EvalError::Model(format!("{}: empty training set", model)));
    }
    if x.nrows() != y.len() {
        return Err(EvalError::Model(format!(
            "{}: {} rows but {} labels",
            model,
            x.nrows(),
            y.len()
        )));
    }
    if y.iter().any(|&l| l > 1) {
        return Err(EvalError::Model(format!("{}: labels must be 0 or 1", model)));
    }
    Ok(x.ncols())
}

/// The label shared by every row, if there is only one
pub(crate) fn single_class(y: ArrayView1<'_, usize>) -> Option<usize> {
    let first = *y.iter().next()?;
    y.iter().all(|&l| l == first).then_some(first)
}

/// Owned linfa dataset over `(x, y)`
pub(crate) fn dataset(x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> Dataset<f64, usize, Ix1> {
    Dataset::new(x.to_owned(), y.to_owned())
}

pub(crate) fn not_fitted(model: &str) -> EvalError {
    EvalError::Model(format!("{}: predict called before fit", model))
}

pub(crate) fn fit_failed(model: &str, err: impl fmt::Display) -> EvalError {
    EvalError::Model(format!("{}: {}", model, err))
}

/// A fitted linfa model, or the only class seen during training
pub(crate) enum Fitted<M> {
    Constant(usize),
    Model(M),
}

/// Logistic function, clamped against overflow
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Small separable datasets shared by the classifier tests

    use ndarray::{Array1, Array2};

    /// Label equals the first feature; the other two are noise
    pub fn first_feature_dataset() -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_fn((40, 3), |(i, j)| ((i >> j) % 2) as f64);
        let y = x.column(0).mapv(|v| v as usize);
        (x, y)
    }

    /// Label is 1 when at least two of three features are 1
    pub fn majority_vote_dataset() -> (Array2<f64>, Array1<usize>) {
        let x = Array2::from_shape_fn((48, 3), |(i, j)| ((i % 8) >> j & 1) as f64);
        let y = x.rows().into_iter().map(|row| usize::from(row.sum() >= 2.0)).collect();
        (x, y)
    }

    pub fn accuracy(pred: &Array1<usize>, y: &Array1<usize>) -> f64 {
        let hits = pred.iter().zip(y).filter(|(a, b)| a == b).count();
        hits as f64 / y.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_every_family_builds_with_defaults() {
        for kind in ClassifierKind::ALL {
            assert!(kind.build(&ParamSet::new(), Seed::new(1)).is_ok(), "{}", kind);
        }
    }

    #[test]
    fn test_every_family_learns_first_feature() {
        let (x, y) = first_feature_dataset();
        for kind in ClassifierKind::ALL {
            let mut params = ParamSet::new();
            if kind == ClassifierKind::Mlp {
                params.insert("learning_rate_init".into(), ParamValue::Float(0.05));
            }
            let mut model = kind.build(&params, Seed::new(3)).unwrap();
            model.fit(x.view(), y.view()).unwrap();
            let acc = accuracy(&model.predict(x.view()).unwrap(), &y);
            assert!(acc >= 0.95, "{} accuracy {}", kind, acc);
        }
    }

    #[test]
    fn test_every_family_requires_fit_before_predict() {
        let (x, _) = first_feature_dataset();
        for kind in ClassifierKind::ALL {
            let model = kind.build(&ParamSet::new(), Seed::new(3)).unwrap();
            assert!(model.predict(x.view()).is_err(), "{}", kind);
        }
    }

    #[test]
    fn test_unknown_parameter_is_model_error() {
        let mut params = ParamSet::new();
        params.insert("bogus".into(), ParamValue::Int(1));
        for kind in ClassifierKind::ALL {
            let err = kind.build(&params, Seed::new(1)).err().unwrap();
            assert!(matches!(err, EvalError::Model(_)), "{}", kind);
        }
    }

    #[test]
    fn test_training_data_checks() {
        let empty = Array2::<f64>::zeros((0, 1));
        let empty_y = Array1::<usize>::zeros(0);
        assert!(check_training_data("m", empty.view(), empty_y.view()).is_err());
        assert!(check_training_data("m", array![[1.0]].view(), array![0, 1].view()).is_err());
        assert!(check_training_data("m", array![[1.0]].view(), array![2].view()).is_err());
        assert_eq!(
            check_training_data("m", array![[1.0, 0.0]].view(), array![1].view()).unwrap(),
            2
        );
    }

    #[test]
    fn test_single_class() {
        assert_eq!(single_class(array![1, 1, 1].view()), Some(1));
        assert_eq!(single_class(array![1, 0].view()), None);
        assert_eq!(single_class(Array1::<usize>::zeros(0).view()), None);
    }

    #[test]
    fn test_sigmoid_is_stable() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(!sigmoid(-1000.0).is_nan());
    }
}
