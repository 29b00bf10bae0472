// ============================================================
// Highway Block
// ============================================================
// Srivastava et al. (2015), Highway Networks.
//
// Per layer:
//   g = f(W_g·x + b_g)                candidate
//   t = sigmoid(W_t·x + b_t + bias)   transform gate
//   y = t * g + (1 - t) * x           carry the rest
//
// The output of one layer is the input of the next. Widths never
// change: this is a residual gate, not a projection. A negative
// `bias` pushes t towards 0 (carry) at initialisation.

use burn::{
    module::Ignored,
    prelude::*,
    tensor::activation::{relu, sigmoid, tanh},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::CrnnError;
use crate::ml::linear::{Projection, ProjectionConfig};
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

/// Nonlinearity applied to the candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Tanh,
    Sigmoid,
    Identity,
}

impl Activation {
    pub fn apply<B: Backend, const D: usize>(self, x: Tensor<B, D>) -> Tensor<B, D> {
        match self {
            Activation::Relu => relu(x),
            Activation::Tanh => tanh(x),
            Activation::Sigmoid => sigmoid(x),
            Activation::Identity => x,
        }
    }
}

#[derive(Config, Debug)]
pub struct HighwayConfig {
    /// Feature width, identical on input and output
    pub size: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    /// Added to the gate pre-activation
    #[config(default = "-2.0")]
    pub bias: f64,
    #[config(default = "Activation::Relu")]
    pub activation: Activation,
}

impl HighwayConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<Highway<B>, CrnnError> {
        if self.size == 0 {
            return Err(CrnnError::zero_sized("highway size"));
        }
        if self.num_layers == 0 {
            return Err(CrnnError::zero_sized("highway num_layers"));
        }

        let layers = (0..self.num_layers)
            .map(|_| {
                Ok(HighwayLayer {
                    candidate: ProjectionConfig::new(self.size, self.size).init(device)?,
                    gate: ProjectionConfig::new(self.size, self.size).init(device)?,
                })
            })
            .collect::<Result<Vec<_>, CrnnError>>()?;

        Ok(Highway {
            layers,
            bias: self.bias,
            activation: Ignored(self.activation),
        })
    }
}

#[derive(Module, Debug)]
pub struct HighwayLayer<B: Backend> {
    candidate: Projection<B>,
    gate: Projection<B>,
}

#[derive(Module, Debug)]
pub struct Highway<B: Backend> {
    layers: Vec<HighwayLayer<B>>,
    bias: f64,
    activation: Ignored<Activation>,
}

impl<B: Backend> Highway<B> {
    /// [batch, size] → [batch, size]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let activation = self.activation.0;
        self.layers.iter().fold(x, |input, layer| {
            let g = activation.apply(layer.candidate.forward(input.clone()));
            let t = sigmoid(layer.gate.forward(input.clone()).add_scalar(self.bias));
            let carry = t.clone().neg().add_scalar(1.0);
            t * g + carry * input
        })
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }
}

impl<B: Backend> Regularized<B> for Highway<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        for (idx, layer) in self.layers.iter().enumerate() {
            layer
                .candidate
                .register_params(&scoped(scope, &format!("lin_{idx}")), registry);
            layer
                .gate
                .register_params(&scoped(scope, &format!("gate_{idx}")), registry);
        }
    }
}
