// ============================================================
// Parameter Registry
// ============================================================
// Explicit list of every trainable tensor in the model, built
// by walking the components in construction order. Each entry
// carries a unique scoped name such as
//
//   conv-filter3/W
//   bi-lstm-0/fw/kernel
//   fc/bn/gamma
//
// and the tensor's ½‖θ‖² term, still attached to the autodiff
// graph, so the L2 penalty stays differentiable.
//
// Frozen tensors (a frozen embedding table, batch-norm running
// statistics) are never registered.

use burn::prelude::*;

/// Components that own trainable parameters.
pub trait Regularized<B: Backend> {
    /// Push every trainable tensor under `scope` into `registry`.
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>);
}

/// Join a parent scope and a local name with `/`.
pub fn scoped(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}/{name}")
    }
}

struct Entry<B: Backend> {
    name: String,
    shape: Vec<usize>,
    half_sq_norm: Tensor<B, 1>,
}

/// Ordered, name-unique collection of trainable tensors.
pub struct ParamRegistry<B: Backend> {
    entries: Vec<Entry<B>>,
}

impl<B: Backend> Default for ParamRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> ParamRegistry<B> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register one tensor. Names are unique within a registry.
    pub fn register<const D: usize>(&mut self, name: impl Into<String>, tensor: Tensor<B, D>) {
        let name = name.into();
        debug_assert!(
            !self.contains(&name),
            "parameter '{name}' registered twice"
        );
        let shape = tensor.dims().to_vec();
        let half_sq_norm = tensor.powf_scalar(2.0).sum().div_scalar(2.0);
        self.entries.push(Entry {
            name,
            shape,
            half_sq_norm,
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Registered names in construction order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Shape recorded for `name`, if registered.
    pub fn shape_of(&self, name: &str) -> Option<&[usize]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.shape.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of scalar parameters.
    pub fn num_scalars(&self) -> usize {
        self.entries
            .iter()
            .map(|e| e.shape.iter().product::<usize>())
            .sum()
    }

    /// Σ ½‖θ‖² over every registered tensor, as a 1-element tensor.
    pub fn l2_loss(&self, device: &B::Device) -> Tensor<B, 1> {
        self.entries
            .iter()
            .fold(Tensor::zeros([1], device), |acc, e| {
                acc + e.half_sq_norm.clone()
            })
    }
}
