//! Gaussian naive Bayes over `linfa-bayes`

use super::{
    check_training_data, dataset, fit_failed, not_fitted, single_class, Classifier, Fitted,
    ParamReader, ParamSet,
};
use crate::error::EvalResult;
use linfa::traits::{Fit, Predict};
use linfa_bayes::GaussianNb as LinfaGaussianNb;
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use tracing::debug;

/// Per-class independent Gaussians over each feature
///
/// Parameter: `var_smoothing` (default 1e-9), the fraction of the largest
/// feature variance added to every class variance.
pub struct GaussianNb {
    var_smoothing: f64,
    fitted: Option<Fitted<LinfaGaussianNb<f64, usize>>>,
}

impl GaussianNb {
    pub fn new(var_smoothing: f64) -> Self {
        Self {
            var_smoothing,
            fitted: None,
        }
    }

    pub fn from_params(model: &'static str, params: &ParamSet) -> EvalResult<Self> {
        let reader = ParamReader::new(model, params, &["var_smoothing"])?;
        Ok(Self::new(reader.positive_f64_or("var_smoothing", 1e-9)?))
    }
}

/// The more frequent label, 0 on a tie
fn majority(y: ArrayView1<'_, usize>) -> usize {
    let positives = y.iter().filter(|&&l| l == 1).count();
    usize::from(positives * 2 > y.len())
}

impl Classifier for GaussianNb {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        check_training_data("GaussianNB", x, y)?;
        if let Some(class) = single_class(y) {
            self.fitted = Some(Fitted::Constant(class));
            return Ok(());
        }
        // Smoothing scales with the largest variance; with none, only the
        // priors separate the classes
        if x.var_axis(Axis(0), 0.0).iter().all(|&v| v == 0.0) {
            let class = majority(y);
            debug!(class, "GaussianNB: every feature constant, predicting the prior");
            self.fitted = Some(Fitted::Constant(class));
            return Ok(());
        }
        let model = LinfaGaussianNb::params()
            .var_smoothing(self.var_smoothing)
            .fit(&dataset(x, y))
            .map_err(|e| fit_failed("GaussianNB", e))?;
        self.fitted = Some(Fitted::Model(model));
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        match self.fitted.as_ref() {
            None => Err(not_fitted("GaussianNB")),
            Some(Fitted::Constant(class)) => Ok(Array1::from_elem(x.nrows(), *class)),
            Some(Fitted::Model(model)) => {
                let predicted: Array1<usize> = model.predict(&x);
                Ok(predicted)
            }
        }
    }
}
