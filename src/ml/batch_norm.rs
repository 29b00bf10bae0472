// ============================================================
// Batch Normalisation with explicit state
// ============================================================
// One instance per normalisation site. The state is spelled out:
//
//   scale            γ  [features]  trainable, init 1
//   shift            β  [features]  trainable, init 0
//   running_mean        [features]  init 0
//   running_variance    [features]  init 1
//
// Mode::Training  → normalise with the batch mean / variance and
//                   fold them into the running averages:
//                   r ← momentum·r + (1 − momentum)·batch
// Mode::Inference → normalise with the running averages, no update
//
// Input is [rows, features]; callers flatten any other axes into
// rows first so statistics are taken per feature (channels-last).

use burn::{
    module::{Param, RunningState},
    prelude::*,
};

use crate::domain::error::CrnnError;
use crate::domain::mode::Mode;
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

#[derive(Config, Debug)]
pub struct BatchNormConfig {
    pub num_features: usize,
    #[config(default = 0.99)]
    pub momentum: f64,
    #[config(default = 1e-3)]
    pub epsilon: f64,
}

impl BatchNormConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<BatchNorm<B>, CrnnError> {
        if self.num_features == 0 {
            return Err(CrnnError::zero_sized("batch norm num_features"));
        }
        let n = self.num_features;
        Ok(BatchNorm {
            scale: Param::from_tensor(Tensor::ones([n], device)),
            shift: Param::from_tensor(Tensor::zeros([n], device)),
            running_mean: RunningState::new(Tensor::zeros([n], device)),
            running_variance: RunningState::new(Tensor::ones([n], device)),
            momentum: self.momentum,
            epsilon: self.epsilon,
        })
    }
}

#[derive(Module, Debug)]
pub struct BatchNorm<B: Backend> {
    scale: Param<Tensor<B, 1>>,
    shift: Param<Tensor<B, 1>>,
    running_mean: RunningState<Tensor<B, 1>>,
    running_variance: RunningState<Tensor<B, 1>>,
    momentum: f64,
    epsilon: f64,
}

impl<B: Backend> BatchNorm<B> {
    /// [rows, features] → [rows, features]
    pub fn forward(&self, x: Tensor<B, 2>, mode: Mode) -> Tensor<B, 2> {
        match mode {
            Mode::Training => self.forward_train(x),
            Mode::Inference => self.forward_inference(x),
        }
    }

    fn forward_train(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let [_, features] = x.dims();
        let mean = x.clone().mean_dim(0);
        let variance = (x.clone() - mean.clone()).powf_scalar(2.0).mean_dim(0);

        let device = x.device();
        let keep = self.momentum;
        let running_mean = self
            .running_mean
            .value_sync()
            .to_device(&device)
            .mul_scalar(keep)
            + mean.clone().detach().reshape([features]).mul_scalar(1.0 - keep);
        let running_variance = self
            .running_variance
            .value_sync()
            .to_device(&device)
            .mul_scalar(keep)
            + variance.clone().detach().reshape([features]).mul_scalar(1.0 - keep);
        self.running_mean.update(running_mean.detach());
        self.running_variance.update(running_variance.detach());

        self.normalize(x, mean, variance)
    }

    fn forward_inference(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = x.device();
        let mean = self.running_mean.value_sync().to_device(&device).unsqueeze::<2>();
        let variance = self
            .running_variance
            .value_sync()
            .to_device(&device)
            .unsqueeze::<2>();
        self.normalize(x, mean, variance)
    }

    fn normalize(&self, x: Tensor<B, 2>, mean: Tensor<B, 2>, variance: Tensor<B, 2>) -> Tensor<B, 2> {
        let std = variance.add_scalar(self.epsilon).sqrt();
        let x = (x - mean) / std;
        x * self.scale.val().unsqueeze::<2>() + self.shift.val().unsqueeze::<2>()
    }

    pub fn running_mean(&self) -> Tensor<B, 1> {
        self.running_mean.value_sync()
    }

    pub fn running_variance(&self) -> Tensor<B, 1> {
        self.running_variance.value_sync()
    }
}

impl<B: Backend> Regularized<B> for BatchNorm<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        registry.register(scoped(scope, "gamma"), self.scale.val());
        registry.register(scoped(scope, "beta"), self.shift.val());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray;

    fn values<const D: usize>(t: Tensor<TestBackend, D>) -> Vec<f32> {
        t.into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_training_normalises_each_feature() {
        let device = Default::default();
        let bn = BatchNormConfig::new(3).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 2>::random([32, 3], Distribution::Normal(5.0, 2.0), &device);

        let y = bn.forward(x, Mode::Training);
        let col_means = values(y.mean_dim(0));
        assert!(col_means.iter().all(|m| m.abs() < 1e-4));
    }

    #[test]
    fn test_running_stats_move_only_in_training() {
        let device = Default::default();
        let bn = BatchNormConfig::new(2).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 2>::from_floats([[1.0, 10.0], [3.0, 30.0]], &device);

        bn.forward(x.clone(), Mode::Inference);
        assert_eq!(values(bn.running_mean()), vec![0.0, 0.0]);
        assert_eq!(values(bn.running_variance()), vec![1.0, 1.0]);

        bn.forward(x, Mode::Training);
        // batch mean [2, 20], variance [1, 100]
        let mean = values(bn.running_mean());
        let var = values(bn.running_variance());
        assert!((mean[0] - 0.02).abs() < 1e-5);
        assert!((mean[1] - 0.2).abs() < 1e-5);
        assert!((var[0] - 1.0).abs() < 1e-5);
        assert!((var[1] - (0.99 + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn test_inference_uses_running_stats() {
        let device = Default::default();
        let bn = BatchNormConfig::new(2).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 2>::from_floats([[2.0, -4.0]], &device);

        // fresh state: mean 0, variance 1
        let y = values(bn.forward(x, Mode::Inference));
        let denom = (1.0f32 + 1e-3).sqrt();
        assert!((y[0] - 2.0 / denom).abs() < 1e-5);
        assert!((y[1] + 4.0 / denom).abs() < 1e-5);
    }

    #[test]
    fn test_inference_sees_latest_training_update() {
        let device = Default::default();
        let bn = BatchNormConfig::new(1).init::<TestBackend>(&device).unwrap();
        let batch = Tensor::<TestBackend, 2>::from_floats([[100.0], [102.0]], &device);
        bn.forward(batch, Mode::Training);

        // batch mean 101, variance 1
        let mean = 0.99f32 * 0.0 + 0.01 * 101.0;
        let var = 0.99f32 * 1.0 + 0.01 * 1.0;
        assert!((values(bn.running_mean())[0] - mean).abs() < 1e-4);
        assert!((values(bn.running_variance())[0] - var).abs() < 1e-5);

        let x = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let y = values(bn.forward(x, Mode::Inference))[0];
        let expected = (1.0 - mean) / (var + 1e-3).sqrt();
        assert!((y - expected).abs() < 1e-4, "{y} != {expected}");
    }

    #[test]
    fn test_inference_is_repeatable() {
        let device = Default::default();
        let bn = BatchNormConfig::new(4).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 2>::random([8, 4], Distribution::Default, &device);
        bn.forward(x.clone(), Mode::Training);

        let a = values(bn.forward(x.clone(), Mode::Inference));
        let b = values(bn.forward(x, Mode::Inference));
        assert_eq!(a, b);
    }

    #[test]
    fn test_registers_scale_and_shift_only() {
        let device = Default::default();
        let bn = BatchNormConfig::new(4).init::<TestBackend>(&device).unwrap();
        let mut reg = ParamRegistry::new();
        bn.register_params("fc/bn", &mut reg);
        assert_eq!(reg.names(), vec!["fc/bn/gamma", "fc/bn/beta"]);
    }

    #[test]
    fn test_zero_features_rejected() {
        let device = Default::default();
        assert!(BatchNormConfig::new(0).init::<TestBackend>(&device).is_err());
    }
}
