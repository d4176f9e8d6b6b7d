//! Optimizer contract and the Adam training loop.
//!
//! The core exposes itself to optimization through [`TrainableModel`]: the
//! trainable parameter list, the minibatch transform (negative sampling),
//! the loss expression, and the save hook. [`Trainer`] is the consumer of
//! that contract: shuffled minibatches, global-norm gradient clipping,
//! bias-corrected Adam updates, and loss-criteria early stopping.
//!
//! Reference: Kingma & Ba (2014), "Adam: A Method for Stochastic
//! Optimization".

use candle_core::backprop::GradStore;
use candle_core::{Tensor, Var};
use gravix_core::Triple;
use rand::seq::SliceRandom;
use rand::RngCore;
use std::path::Path;

use crate::error::{Error, Result};

/// Options the external optimizer runs with.
#[derive(Debug, Clone)]
pub struct OptimizerOptions {
    /// Minibatch size (default: 4831).
    pub batch_size: usize,
    /// Hard iteration cap (default: 50000).
    pub max_iterations: usize,
    /// Global gradient-norm clip (default: 1.0).
    pub max_gradient_norm: f64,
    /// Learning rate (default: 0.005).
    pub learning_rate: f64,
    /// First-moment decay (default: 0.9).
    pub beta1: f64,
    /// Second-moment decay (default: 0.999).
    pub beta2: f64,
    /// Adam denominator fuzz (default: 1e-8).
    pub epsilon: f64,
    /// Loss-evaluation interval in iterations (default: 500).
    pub evaluate_every: usize,
    /// Consecutive non-improving evaluations before stopping
    /// (default: Some(10); None disables early stopping).
    pub patience: Option<usize>,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            batch_size: 4831,
            max_iterations: 50_000,
            max_gradient_norm: 1.0,
            learning_rate: 0.005,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            evaluate_every: 500,
            patience: Some(10),
        }
    }
}

impl OptimizerOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_evaluate_every(mut self, evaluate_every: usize) -> Self {
        self.evaluate_every = evaluate_every.max(1);
        self
    }

    pub fn with_patience(mut self, patience: Option<usize>) -> Self {
        self.patience = patience;
        self
    }
}

/// The contract a model exposes to the optimizer.
///
/// Anything that yields parameters, a loss expression, a batch transform,
/// and a save hook can be driven by [`Trainer`].
pub trait TrainableModel {
    /// Trainable parameter tensors. Clones share storage with the model's
    /// own parameters, so optimizer updates are visible to it.
    fn parameters(&self) -> Vec<Var>;

    /// Minibatch transform: positives in, labeled positives + negatives out.
    fn transform(&self, batch: &[Triple], rng: &mut dyn RngCore)
        -> Result<(Vec<Triple>, Vec<f32>)>;

    /// Loss expression over the current parameter values.
    fn minibatch_loss(&self, examples: &[Triple], labels: &[f32]) -> Result<Tensor>;

    /// The optimizer setup this model wants to be trained with.
    fn optimizer_options(&self) -> OptimizerOptions {
        OptimizerOptions::default()
    }

    /// Persist the model's parameter tuple.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Iterations actually executed.
    pub iterations: usize,
    /// Mean loss per evaluation window.
    pub loss_history: Vec<f32>,
    /// Best evaluation-window loss seen.
    pub best_loss: f32,
}

/// Global L2 norm over every parameter's gradient.
pub fn global_grad_norm(params: &[Var], grads: &GradStore) -> Result<f64> {
    let mut total = 0.0f64;
    for param in params {
        if let Some(grad) = grads.get(param) {
            total += grad.sqr()?.sum_all()?.to_scalar::<f32>()? as f64;
        }
    }
    Ok(total.sqrt())
}

/// Bias-corrected Adam state over a fixed parameter list.
struct AdamState {
    m: Vec<Tensor>,
    v: Vec<Tensor>,
    step: usize,
}

impl AdamState {
    fn new(params: &[Var]) -> Result<Self> {
        let m = params
            .iter()
            .map(|p| p.zeros_like())
            .collect::<candle_core::Result<Vec<_>>>()?;
        let v = params
            .iter()
            .map(|p| p.zeros_like())
            .collect::<candle_core::Result<Vec<_>>>()?;
        Ok(Self { m, v, step: 0 })
    }

    /// One clipped Adam update across all parameters.
    fn step(&mut self, params: &[Var], grads: &GradStore, options: &OptimizerOptions) -> Result<()> {
        self.step += 1;

        let norm = global_grad_norm(params, grads)?;
        let scale = if norm > options.max_gradient_norm && norm > 0.0 {
            options.max_gradient_norm / norm
        } else {
            1.0
        };

        let bias1 = 1.0 - options.beta1.powi(self.step as i32);
        let bias2 = 1.0 - options.beta2.powi(self.step as i32);

        for (i, param) in params.iter().enumerate() {
            let Some(grad) = grads.get(param) else {
                continue;
            };
            let grad = if scale != 1.0 {
                (grad * scale)?
            } else {
                grad.clone()
            };

            self.m[i] = ((&self.m[i] * options.beta1)? + (&grad * (1.0 - options.beta1))?)?;
            self.v[i] = ((&self.v[i] * options.beta2)? + (grad.sqr()? * (1.0 - options.beta2))?)?;

            let m_hat = (&self.m[i] / bias1)?;
            let v_hat = (&self.v[i] / bias2)?;
            let delta = (m_hat / (v_hat.sqrt()? + options.epsilon)?)?;

            param.set(&(param.as_tensor() - &(delta * options.learning_rate)?)?)?;
        }
        Ok(())
    }
}

/// Drives a [`TrainableModel`] to convergence or the iteration cap.
pub struct Trainer {
    options: OptimizerOptions,
}

impl Trainer {
    pub fn new(options: OptimizerOptions) -> Self {
        Self { options }
    }

    /// Train on the graph's positive triplets.
    ///
    /// Minibatches are sampled without contiguity (indices reshuffled every
    /// epoch). Every `evaluate_every` iterations the mean window loss is
    /// reported; `patience` consecutive non-improving windows end the run.
    pub fn fit<M: TrainableModel + ?Sized>(
        &self,
        model: &M,
        triples: &[Triple],
        rng: &mut dyn RngCore,
    ) -> Result<TrainingReport> {
        if triples.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let params = model.parameters();
        let mut adam = AdamState::new(&params)?;

        let mut order: Vec<usize> = (0..triples.len()).collect();
        let mut window = Vec::with_capacity(self.options.evaluate_every);
        let mut history = Vec::new();
        let mut best_loss = f32::INFINITY;
        let mut strikes = 0usize;
        let mut iterations = 0usize;

        'training: while iterations < self.options.max_iterations {
            order.shuffle(rng);

            for chunk in order.chunks(self.options.batch_size.max(1)) {
                let batch: Vec<Triple> = chunk.iter().map(|&i| triples[i]).collect();
                let (examples, labels) = model.transform(&batch, rng)?;

                let loss = model.minibatch_loss(&examples, &labels)?;
                let grads = loss.backward()?;
                adam.step(&params, &grads, &self.options)?;

                window.push(loss.to_scalar::<f32>()?);
                iterations += 1;

                if iterations % self.options.evaluate_every == 0 {
                    let mean = window.iter().sum::<f32>() / window.len() as f32;
                    window.clear();
                    history.push(mean);
                    eprintln!("iteration {iterations}: loss = {mean:.4}");

                    if mean < best_loss {
                        best_loss = mean;
                        strikes = 0;
                    } else if let Some(patience) = self.options.patience {
                        strikes += 1;
                        if strikes >= patience {
                            eprintln!("early stop at iteration {iterations} (best {best_loss:.4})");
                            break 'training;
                        }
                    }
                }

                if iterations >= self.options.max_iterations {
                    break 'training;
                }
            }
        }

        if !window.is_empty() {
            let mean = window.iter().sum::<f32>() / window.len() as f32;
            history.push(mean);
            best_loss = best_loss.min(mean);
        }

        Ok(TrainingReport {
            iterations,
            loss_history: history,
            best_loss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_options() {
        let options = OptimizerOptions::default();
        assert_eq!(options.batch_size, 4831);
        assert_eq!(options.max_iterations, 50_000);
        assert!((options.max_gradient_norm - 1.0).abs() < 1e-9);
        assert!((options.learning_rate - 0.005).abs() < 1e-9);
        assert!((options.beta1 - 0.9).abs() < 1e-9);
        assert!((options.beta2 - 0.999).abs() < 1e-9);
        assert_eq!(options.evaluate_every, 500);
    }

    #[test]
    fn test_global_grad_norm() {
        let var = Var::from_tensor(
            &Tensor::from_vec(vec![3.0f32, 4.0], (2,), &Device::Cpu).unwrap(),
        )
        .unwrap();
        let loss = var.as_tensor().sqr().unwrap().sum_all().unwrap();
        let grads = loss.backward().unwrap();

        // grad = 2 * [3, 4] = [6, 8], norm 10.
        let norm = global_grad_norm(&[var], &grads).unwrap();
        assert!((norm - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_adam_minimizes_quadratic() {
        let var = Var::from_tensor(
            &Tensor::from_vec(vec![3.0f32, -4.0], (2,), &Device::Cpu).unwrap(),
        )
        .unwrap();
        let params = vec![var.clone()];
        let mut adam = AdamState::new(&params).unwrap();
        let options = OptimizerOptions::default().with_learning_rate(0.1);

        for _ in 0..300 {
            let loss = var.as_tensor().sqr().unwrap().sum_all().unwrap();
            let grads = loss.backward().unwrap();
            adam.step(&params, &grads, &options).unwrap();
        }

        for value in var.as_tensor().to_vec1::<f32>().unwrap() {
            assert!(value.abs() < 0.5, "did not converge: {value}");
        }
    }

    /// Minimal contract implementation: loss = Σ (x - 3)².
    struct Quadratic {
        var: Var,
    }

    impl TrainableModel for Quadratic {
        fn parameters(&self) -> Vec<Var> {
            vec![self.var.clone()]
        }

        fn transform(
            &self,
            batch: &[Triple],
            _rng: &mut dyn RngCore,
        ) -> Result<(Vec<Triple>, Vec<f32>)> {
            Ok((batch.to_vec(), vec![0.0; batch.len()]))
        }

        fn minibatch_loss(&self, _examples: &[Triple], _labels: &[f32]) -> Result<Tensor> {
            let shifted = (self.var.as_tensor() - 3.0)?;
            Ok(shifted.sqr()?.sum_all()?)
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_trainer_reports_decreasing_loss() {
        let var = Var::from_tensor(&Tensor::zeros((2,), candle_core::DType::F32, &Device::Cpu).unwrap())
            .unwrap();
        let model = Quadratic { var };
        let triples: Vec<Triple> = (0..8).map(|i| Triple::new(i, 0, i)).collect();

        let options = OptimizerOptions::default()
            .with_batch_size(4)
            .with_max_iterations(40)
            .with_evaluate_every(10)
            .with_learning_rate(0.05);
        let mut rng = StdRng::seed_from_u64(1);

        let report = Trainer::new(options).fit(&model, &triples, &mut rng).unwrap();
        assert_eq!(report.iterations, 40);
        assert_eq!(report.loss_history.len(), 4);
        assert!(report.loss_history[3] < report.loss_history[0]);
        assert!((report.best_loss - report.loss_history[3]).abs() < 1e-6);
    }

    #[test]
    fn test_empty_training_set_rejected() {
        let var =
            Var::from_tensor(&Tensor::zeros((1,), candle_core::DType::F32, &Device::Cpu).unwrap())
                .unwrap();
        let model = Quadratic { var };
        let mut rng = StdRng::seed_from_u64(1);

        let err = Trainer::new(OptimizerOptions::default())
            .fit(&model, &[], &mut rng)
            .unwrap_err();
        assert!(matches!(err, Error::EmptyBatch));
    }
}
