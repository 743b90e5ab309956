//! L2-regularized logistic regression over `linfa-logistic`
//!
//! linfa penalizes with `alpha`; the grid is expressed as `C`, so
//! `alpha = 1 / C`.

use super::{
    check_training_data, dataset, fit_failed, not_fitted, single_class, Classifier, Fitted,
    ParamReader, ParamSet,
};
use crate::error::EvalResult;
use linfa::traits::{Fit, Predict};
use linfa_logistic::{FittedLogisticRegression, LogisticRegression as LinfaLogistic};
use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::debug;

const MAX_ITERATIONS: u64 = 100;

pub struct LogisticRegression {
    c: f64,
    tol: f64,
    fitted: Option<Fitted<FittedLogisticRegression<f64, usize>>>,
}

impl LogisticRegression {
    pub fn new(c: f64, tol: f64) -> Self {
        Self {
            c,
            tol,
            fitted: None,
        }
    }

    /// Parameters: `C` (inverse regularization, default 1.0), `tol` (gradient
    /// tolerance, default 1e-4)
    pub fn from_params(model: &'static str, params: &ParamSet) -> EvalResult<Self> {
        let reader = ParamReader::new(model, params, &["C", "tol"])?;
        Ok(Self::new(
            reader.positive_f64_or("C", 1.0)?,
            reader.positive_f64_or("tol", 1e-4)?,
        ))
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("LogisticRegression", x, y)?;
        // linfa-logistic needs both classes present
        if let Some(class) = single_class(y) {
            debug!(class, "LogisticRegression: single-class training set");
            self.fitted = Some(Fitted::Constant(class));
            return Ok(());
        }
        let model = LinfaLogistic::default()
            .alpha(1.0 / self.c)
            .gradient_tolerance(self.tol)
            .max_iterations(MAX_ITERATIONS)
            .fit(&dataset(x, y))
            .map_err(|e| fit_failed("LogisticRegression", e))?;
        self.fitted = Some(Fitted::Model(model));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        match self.fitted.as_ref() {
            None => Err(not_fitted("LogisticRegression")),
            Some(Fitted::Constant(class)) => Ok(Array1::from_elem(x.nrows(), *class)),
            Some(Fitted::Model(model)) => {
                let predicted: Array1<usize> = model.predict(&x);
                Ok(predicted)
            }
        }
    }
}
