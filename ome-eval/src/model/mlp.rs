//! Multi-layer perceptron
//!
//! ReLU hidden layers, a single sigmoid output unit, log-loss with L2
//! penalty, trained by mini-batch Adam on `ndarray` matrices. Training stops
//! after `MAX_EPOCHS` or once the epoch loss has not improved by `TOL` for
//! `NO_CHANGE_EPOCHS` consecutive epochs.

use super::{check_training_data, not_fitted, sigmoid, Classifier, ParamReader, ParamSet};
use crate::error::EvalResult;
use ndarray::{Array, Array1, Array2, ArrayView1, ArrayView2, Axis, Dimension, Zip};
use ome_common::Seed;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

const MAX_EPOCHS: usize = 200;
const BATCH_SIZE: usize = 200;
const ALPHA: f64 = 1e-4;
const TOL: f64 = 1e-4;
const NO_CHANGE_EPOCHS: usize = 10;
const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

/// Dense layer with `n_in × n_out` weights
#[derive(Debug, Clone)]
struct Layer {
    w: Array2<f64>,
    b: Array1<f64>,
}

impl Layer {
    fn zeros_like(other: &Layer) -> Self {
        Self {
            w: Array2::zeros(other.w.raw_dim()),
            b: Array1::zeros(other.b.raw_dim()),
        }
    }

    /// Glorot-uniform initialization
    fn random(n_in: usize, n_out: usize, rng: &mut impl Rng) -> Self {
        let bound = (6.0 / (n_in + n_out) as f64).sqrt();
        let w = Array2::from_shape_fn((n_in, n_out), |_| rng.gen_range(-bound..bound));
        let b = Array1::from_shape_fn(n_out, |_| rng.gen_range(-bound..bound));
        Self { w, b }
    }

    fn forward(&self, input: &Array2<f64>) -> Array2<f64> {
        input.dot(&self.w) + &self.b
    }
}

#[derive(Debug, Clone)]
pub struct Mlp {
    hidden: Vec<usize>,
    learning_rate: f64,
    seed: Seed,
    layers: Vec<Layer>,
}

impl Mlp {
    pub fn new(hidden: Vec<usize>, learning_rate: f64, seed: Seed) -> Self {
        Self {
            hidden,
            learning_rate,
            seed,
            layers: Vec::new(),
        }
    }

    /// Parameters: `hidden_layer_sizes` (default (100)), `learning_rate_init`
    /// (default 0.001)
    pub fn from_params(model: &'static str, params: &ParamSet, seed: Seed) -> EvalResult<Self> {
        let reader =
            ParamReader::new(model, params, &["hidden_layer_sizes", "learning_rate_init"])?;
        Ok(Self::new(
            reader.layers_or("hidden_layer_sizes", &[100])?,
            reader.positive_f64_or("learning_rate_init", 0.001)?,
            seed,
        ))
    }

    /// Activations of every layer for a batch, input first, output
    /// probabilities (one column) last
    fn forward(&self, x: ArrayView2<'_, f64>) -> Vec<Array2<f64>> {
        let mut activations = vec![x.to_owned()];
        let last = self.layers.len().saturating_sub(1);
        for (l, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&activations[l]);
            activations.push(if l == last {
                z.mapv(sigmoid)
            } else {
                z.mapv(|v| v.max(0.0))
            });
        }
        activations
    }

    fn probabilities(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        match self.forward(x).pop() {
            Some(out) if !self.layers.is_empty() => out.column(0).to_owned(),
            _ => Array1::zeros(x.nrows()),
        }
    }

    /// Batch-summed gradients per layer and the batch's summed log-loss
    fn backprop(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> (Vec<Layer>, f64) {
        let activations = self.forward(x);
        let mut grads: Vec<Layer> = self.layers.iter().map(Layer::zeros_like).collect();
        let Some(out) = activations.last() else {
            return (grads, 0.0);
        };
        let p = out.column(0);
        let loss: f64 = p
            .iter()
            .zip(y)
            .map(|(&p, &y)| {
                let p = p.clamp(1e-12, 1.0 - 1e-12);
                -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
            })
            .sum();

        let mut delta = (&p - &y).insert_axis(Axis(1));
        for l in (0..self.layers.len()).rev() {
            let input = &activations[l];
            grads[l].w = input.t().dot(&delta);
            grads[l].b = delta.sum_axis(Axis(0));
            if l > 0 {
                let mut back = delta.dot(&self.layers[l].w.t());
                Zip::from(&mut back)
                    .and(input)
                    .for_each(|d, &a| if a <= 0.0 { *d = 0.0 });
                delta = back;
            }
        }
        (grads, loss)
    }
}

impl Classifier for Mlp {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, usize>) -> EvalResult<()> {
        let width = check_training_data("MLP", x, y)?;
        let mut rng = self.seed.rng(0);
        let targets = y.mapv(|l| l as f64);

        let mut sizes = vec![width];
        sizes.extend(&self.hidden);
        sizes.push(1);
        self.layers = sizes
            .windows(2)
            .map(|pair| Layer::random(pair[0], pair[1], &mut rng))
            .collect();

        let mut first_moment: Vec<Layer> = self.layers.iter().map(Layer::zeros_like).collect();
        let mut second_moment = first_moment.clone();
        let mut step = 0i32;

        let n = x.nrows();
        let batch_size = BATCH_SIZE.min(n);
        let mut order: Vec<usize> = (0..n).collect();
        let mut best_loss = f64::INFINITY;
        let mut stale_epochs = 0;

        for epoch in 0..MAX_EPOCHS {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(batch_size) {
                let (grads, loss) = self.backprop(
                    x.select(Axis(0), batch).view(),
                    targets.select(Axis(0), batch).view(),
                );
                epoch_loss += loss;

                let m = batch.len() as f64;
                let penalty: f64 = self.layers.iter().map(|l| l.w.mapv(|w| w * w).sum()).sum();
                epoch_loss += 0.5 * ALPHA * penalty;

                step += 1;
                let lr = self.learning_rate * (1.0 - BETA2.powi(step)).sqrt()
                    / (1.0 - BETA1.powi(step));
                for (l, layer) in self.layers.iter_mut().enumerate() {
                    let g = &grads[l];
                    let (m1, m2) = (&mut first_moment[l], &mut second_moment[l]);
                    adam_update(&mut layer.w, &g.w, &mut m1.w, &mut m2.w, lr, m, ALPHA);
                    // Biases are not penalized
                    adam_update(&mut layer.b, &g.b, &mut m1.b, &mut m2.b, lr, m, 0.0);
                }
            }

            let loss = epoch_loss / n as f64;
            if loss > best_loss - TOL {
                stale_epochs += 1;
            } else {
                stale_epochs = 0;
            }
            best_loss = best_loss.min(loss);
            if stale_epochs > NO_CHANGE_EPOCHS {
                debug!(epochs = epoch + 1, loss, "MLP stopped early");
                break;
            }
        }
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> EvalResult<Array1<usize>> {
        if self.layers.is_empty() {
            return Err(not_fitted("MLP"));
        }
        Ok(self.probabilities(x).mapv(|p| usize::from(p > 0.5)))
    }
}

/// One Adam step on batch-summed gradients
fn adam_update<D: Dimension>(
    params: &mut Array<f64, D>,
    grads: &Array<f64, D>,
    m1: &mut Array<f64, D>,
    m2: &mut Array<f64, D>,
    lr: f64,
    batch: f64,
    l2: f64,
) {
    Zip::from(params)
        .and(grads)
        .and(m1)
        .and(m2)
        .for_each(|p, &g, m1, m2| {
            let g = (g + l2 * *p) / batch;
            *m1 = BETA1 * *m1 + (1.0 - BETA1) * g;
            *m2 = BETA2 * *m2 + (1.0 - BETA2) * g * g;
            *p -= lr * *m1 / (m2.sqrt() + ADAM_EPSILON);
        });
}
