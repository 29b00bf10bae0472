// ============================================================
// Linear Projection
// ============================================================
// y = x · Wᵀ + b with W: [output_size, input_size], b: [output_size]
//
// Construction mirrors shape inference on a symbolic input:
// from_input_dims() takes the input dims as known at build time
// (None = unknown, e.g. the batch axis) and refuses anything
// that is not rank 2 with a known, non-zero feature width.

use burn::{module::Param, prelude::*};

use crate::domain::error::CrnnError;
use crate::ml::init;
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

/// How a projection's weight and bias are initialised.
#[derive(Config, Debug, PartialEq)]
pub enum ProjectionInit {
    /// Weight and bias ~ U(-l, l), l = sqrt(6 / (fan_in + fan_out)).
    GlorotUniform,
    /// Weight ~ N(0, std) clipped to ±2σ, bias = constant.
    TruncatedNormal { std: f64, bias: f64 },
}

#[derive(Config, Debug)]
pub struct ProjectionConfig {
    pub input_size: usize,
    pub output_size: usize,
    #[config(default = "ProjectionInit::GlorotUniform")]
    pub initializer: ProjectionInit,
}

impl ProjectionConfig {
    /// Infer the input width from the dims of the tensor to be projected.
    pub fn from_input_dims(dims: &[Option<usize>], output_size: usize) -> Result<Self, CrnnError> {
        match dims {
            [_, Some(width)] if *width > 0 => Ok(Self::new(*width, output_size)),
            _ => Err(CrnnError::InvalidProjectionInput {
                dims: dims.to_vec(),
            }),
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Projection<B>, CrnnError> {
        if self.input_size == 0 {
            return Err(CrnnError::InvalidProjectionInput {
                dims: vec![None, Some(0)],
            });
        }
        if self.output_size == 0 {
            return Err(CrnnError::zero_sized("projection output_size"));
        }

        let shape = [self.output_size, self.input_size];
        let (weight, bias) = match &self.initializer {
            ProjectionInit::GlorotUniform => (
                init::glorot_uniform(shape, self.input_size, self.output_size, device),
                init::glorot_uniform([self.output_size], self.output_size, self.output_size, device),
            ),
            ProjectionInit::TruncatedNormal { std, bias } => (
                init::truncated_normal(shape, *std, device),
                init::constant([self.output_size], *bias, device),
            ),
        };

        Ok(Projection {
            weight: Param::from_tensor(weight),
            bias: Param::from_tensor(bias),
        })
    }
}

#[derive(Module, Debug)]
pub struct Projection<B: Backend> {
    weight: Param<Tensor<B, 2>>,
    bias: Param<Tensor<B, 1>>,
}

impl<B: Backend> Projection<B> {
    /// [batch, input_size] → [batch, output_size]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x.matmul(self.weight.val().transpose()) + self.bias.val().unsqueeze::<2>()
    }

    pub fn input_size(&self) -> usize {
        self.weight.val().dims()[1]
    }

    pub fn output_size(&self) -> usize {
        self.weight.val().dims()[0]
    }
}

impl<B: Backend> Regularized<B> for Projection<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        registry.register(scoped(scope, "W"), self.weight.val());
        registry.register(scoped(scope, "b"), self.bias.val());
    }
}
