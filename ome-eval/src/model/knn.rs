//! k-nearest neighbours over a linfa-nn ball tree

use super::{check_training_data, fit_failed, not_fitted, Classifier, ParamReader, ParamSet};
use crate::error::{EvalError, EvalResult};
use linfa_nn::distance::{L1Dist, L2Dist};
use linfa_nn::{BallTree, NearestNeighbour};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::collections::HashMap;

/// Minkowski distance selected by `p`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Manhattan,
    Euclidean,
}

/// Majority vote of the `n_neighbors` closest training rows
///
/// Parameters: `n_neighbors` (default 5), `p` (1 = Manhattan, 2 = Euclidean;
/// default 2). A tied vote predicts 0.
#[derive(Debug, Clone)]
pub struct KNeighbors {
    n_neighbors: usize,
    metric: Metric,
    training: Option<(Array2<f64>, Array1<usize>)>,
}

impl KNeighbors {
    pub fn new(n_neighbors: usize, metric: Metric) -> Self {
        Self {
            n_neighbors,
            metric,
            training: None,
        }
    }

    pub fn from_params(model: &'static str, params: &ParamSet) -> EvalResult<Self> {
        let reader = ParamReader::new(model, params, &["n_neighbors", "p"])?;
        let n_neighbors = reader.usize_or("n_neighbors", 5)?;
        let metric = match reader.usize_or("p", 2)? {
            1 => Metric::Manhattan,
            2 => Metric::Euclidean,
            other => {
                return Err(EvalError::Model(format!(
                    "{}: p must be 1 or 2, got {}",
                    model, other
                )))
            }
        };
        Ok(Self::new(n_neighbors, metric))
    }
}

impl Classifier for KNeighbors {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("KNeighbors", x, y)?;
        if self.n_neighbors == 0 || self.n_neighbors > x.nrows() {
            return Err(EvalError::Model(format!(
                "KNeighbors: n_neighbors = {} outside 1..={} training rows",
                self.n_neighbors,
                x.nrows()
            )));
        }
        self.training = Some((x.to_owned(), y.to_owned()));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        let (points, labels) = self
            .training
            .as_ref()
            .ok_or_else(|| not_fitted("KNeighbors"))?;
        let index = match self.metric {
            Metric::Manhattan => BallTree::new().from_batch(points, L1Dist),
            Metric::Euclidean => BallTree::new().from_batch(points, L2Dist),
        }
        .map_err(|e| fit_failed("KNeighbors", e))?;

        // Binary feature rows repeat heavily; vote once per distinct row
        let mut votes: HashMap<Vec<u64>, usize> = HashMap::new();
        let mut predicted = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let key: Vec<u64> = row.iter().map(|v| v.to_bits()).collect();
            let label = match votes.get(&key) {
                Some(&label) => label,
                None => {
                    let neighbours = index
                        .k_nearest(row, self.n_neighbors)
                        .map_err(|e| fit_failed("KNeighbors", e))?;
                    let positives = neighbours.iter().filter(|(_, i)| labels[*i] == 1).count();
                    let label = usize::from(positives * 2 > neighbours.len());
                    votes.insert(key, label);
                    label
                }
            };
            predicted.push(label);
        }
        Ok(Array1::from(predicted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::*;
    use crate::model::ParamValue;
    use ndarray::array;

    #[test]
    fn test_nearest_neighbour_recovers_labels() {
        let (x, y) = majority_vote_dataset();
        let mut model = KNeighbors::new(1, Metric::Euclidean);
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_manhattan_and_euclidean_agree_on_binary_rows() {
        let (x, y) = majority_vote_dataset();
        let mut l1 = KNeighbors::new(3, Metric::Manhattan);
        let mut l2 = KNeighbors::new(3, Metric::Euclidean);
        l1.fit(x.view(), y.view()).unwrap();
        l2.fit(x.view(), y.view()).unwrap();
        assert_eq!(l1.predict(x.view()).unwrap(), l2.predict(x.view()).unwrap());
    }

    #[test]
    fn test_tied_vote_predicts_negative() {
        let mut model = KNeighbors::new(2, Metric::Euclidean);
        model.fit(array![[0.0], [1.0]].view(), array![1, 0].view()).unwrap();
        assert_eq!(model.predict(array![[0.5]].view()).unwrap(), array![0]);
    }

    #[test]
    fn test_too_many_neighbours() {
        let mut model = KNeighbors::new(6, Metric::Euclidean);
        let err = model
            .fit(array![[0.0], [1.0]].view(), array![0, 1].view())
            .unwrap_err();
        assert!(matches!(err, EvalError::Model(_)));
    }

    #[test]
    fn test_invalid_p() {
        let mut params = ParamSet::new();
        params.insert("p".into(), ParamValue::Int(3));
        assert!(KNeighbors::from_params("KNeighborsClassifier", &params).is_err());
    }
}
