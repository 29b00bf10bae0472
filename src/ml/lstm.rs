// ============================================================
// Basic LSTM cell and bidirectional encoder
// ============================================================
// LstmCell — one fused kernel over [x, h]:
//
//   [i, j, f, o] = [x, h] · K + b          K: [input + hidden, 4·hidden]
//   c' = c · σ(f + forget_bias) + σ(i) · tanh(j)
//   h' = tanh(c') · σ(o)
//
// The state starts at zero; forget_bias = 1.0 keeps the cell
// remembering early in training.
//
// BiLstmEncoder — independent forward and backward cells:
//
//   forward  runs t = 0 .. T-1
//   backward runs t = T-1 .. 0, outputs re-aligned to t order
//   each direction's outputs pass through dropout
//   concat   [N, T, 2·hidden]
//   mean over T  → [N, 2·hidden]
//
// Inside the CRNN every branch has already been pooled to T = 1,
// so each direction is a single cell step and the mean is over a
// single row. That topology is kept as is.

use burn::{
    module::Param,
    prelude::*,
    tensor::activation::{sigmoid, tanh},
};

use crate::domain::error::CrnnError;
use crate::domain::mode::ForwardOptions;
use crate::ml::dropout::dropout;
use crate::ml::init;
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

#[derive(Config, Debug)]
pub struct LstmCellConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    #[config(default = 1.0)]
    pub forget_bias: f64,
}

impl LstmCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LstmCell<B>, CrnnError> {
        if self.input_size == 0 {
            return Err(CrnnError::zero_sized("lstm input_size"));
        }
        if self.hidden_size == 0 {
            return Err(CrnnError::zero_sized("lstm_hidden_size"));
        }
        let fan_in = self.input_size + self.hidden_size;
        let fan_out = 4 * self.hidden_size;
        Ok(LstmCell {
            kernel: Param::from_tensor(init::glorot_uniform([fan_in, fan_out], fan_in, fan_out, device)),
            bias: Param::from_tensor(Tensor::zeros([fan_out], device)),
            hidden_size: self.hidden_size,
            forget_bias: self.forget_bias,
        })
    }
}

/// Cell state `c` and hidden state `h`, both [N, hidden].
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub cell: Tensor<B, 2>,
    pub hidden: Tensor<B, 2>,
}

impl<B: Backend> LstmState<B> {
    pub fn zeros(batch: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            cell: Tensor::zeros([batch, hidden_size], device),
            hidden: Tensor::zeros([batch, hidden_size], device),
        }
    }
}

#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    kernel: Param<Tensor<B, 2>>,
    bias: Param<Tensor<B, 1>>,
    hidden_size: usize,
    forget_bias: f64,
}

impl<B: Backend> LstmCell<B> {
    /// One time step: x [N, input] with the previous state → next state.
    pub fn step(&self, x: Tensor<B, 2>, state: LstmState<B>) -> LstmState<B> {
        let [batch, _] = x.dims();
        let h = self.hidden_size;

        let gates = Tensor::cat(vec![x, state.hidden], 1).matmul(self.kernel.val())
            + self.bias.val().unsqueeze::<2>();
        let gate = |k: usize| gates.clone().slice([0..batch, k * h..(k + 1) * h]);

        let input = sigmoid(gate(0));
        let candidate = tanh(gate(1));
        let forget = sigmoid(gate(2).add_scalar(self.forget_bias));
        let output = sigmoid(gate(3));

        let cell = state.cell * forget + input * candidate;
        let hidden = tanh(cell.clone()) * output;
        LstmState { cell, hidden }
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }
}

impl<B: Backend> Regularized<B> for LstmCell<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        registry.register(scoped(scope, "kernel"), self.kernel.val());
        registry.register(scoped(scope, "bias"), self.bias.val());
    }
}

#[derive(Config, Debug)]
pub struct BiLstmEncoderConfig {
    pub input_size: usize,
    pub hidden_size: usize,
}

impl BiLstmEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<BiLstmEncoder<B>, CrnnError> {
        let cell = LstmCellConfig::new(self.input_size, self.hidden_size);
        Ok(BiLstmEncoder {
            forward_cell: cell.init(device)?,
            backward_cell: cell.init(device)?,
        })
    }
}

#[derive(Module, Debug)]
pub struct BiLstmEncoder<B: Backend> {
    forward_cell: LstmCell<B>,
    backward_cell: LstmCell<B>,
}

impl<B: Backend> BiLstmEncoder<B> {
    /// [N, T, input] → [N, 2·hidden]
    pub fn forward(&self, sequence: Tensor<B, 3>, opts: &ForwardOptions) -> Tensor<B, 2> {
        let outputs = self.outputs(sequence, opts);
        let [batch, _, width] = outputs.dims();
        outputs.mean_dim(1).reshape([batch, width])
    }

    /// Per-step concatenated outputs, [N, T, 2·hidden].
    pub fn outputs(&self, sequence: Tensor<B, 3>, opts: &ForwardOptions) -> Tensor<B, 3> {
        let [batch, steps, features] = sequence.dims();
        let device = sequence.device();
        let at = |t: usize| {
            sequence
                .clone()
                .slice([0..batch, t..t + 1, 0..features])
                .reshape([batch, features])
        };

        let fw = Self::run(&self.forward_cell, (0..steps).map(&at), batch, &device);
        let mut bw = Self::run(&self.backward_cell, (0..steps).rev().map(&at), batch, &device);
        bw.reverse();

        let fw = dropout(Tensor::cat(fw, 1), opts);
        let bw = dropout(Tensor::cat(bw, 1), opts);
        Tensor::cat(vec![fw, bw], 2)
    }

    /// Unroll `cell` over `inputs`, returning each step's hidden state as [N, 1, hidden].
    fn run(
        cell: &LstmCell<B>,
        inputs: impl Iterator<Item = Tensor<B, 2>>,
        batch: usize,
        device: &B::Device,
    ) -> Vec<Tensor<B, 3>> {
        let mut state = LstmState::zeros(batch, cell.hidden_size(), device);
        inputs
            .map(|x| {
                state = cell.step(x, state.clone());
                state.hidden.clone().unsqueeze_dim(1)
            })
            .collect()
    }

    /// Width of the summary vector.
    pub fn output_size(&self) -> usize {
        2 * self.forward_cell.hidden_size()
    }
}

impl<B: Backend> Regularized<B> for BiLstmEncoder<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        self.forward_cell.register_params(&scoped(scope, "fw"), registry);
        self.backward_cell.register_params(&scoped(scope, "bw"), registry);
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
    fn test_zero_weights_keep_zero_state() {
        let device = Default::default();
        let cell = LstmCell::<TestBackend> {
            kernel: Param::from_tensor(Tensor::zeros([3 + 2, 8], &device)),
            bias: Param::from_tensor(Tensor::zeros([8], &device)),
            hidden_size: 2,
            forget_bias: 1.0,
        };
        let x = Tensor::<TestBackend, 2>::ones([1, 3], &device);
        let state = cell.step(x, LstmState::zeros(1, 2, &device));

        // i = σ(0), j = tanh(0) = 0 → c = 0, h = 0
        assert_eq!(values(state.cell), vec![0.0, 0.0]);
        assert_eq!(values(state.hidden), vec![0.0, 0.0]);
    }

    #[test]
    fn test_cell_matches_hand_computation() {
        let device = Default::default();
        // input 1, hidden 1: kernel rows [x, h], columns [i, j, f, o]
        let cell = LstmCell::<TestBackend> {
            kernel: Param::from_tensor(Tensor::from_floats(
                [[1.0, 2.0, 0.0, -1.0], [0.0, 0.0, 0.0, 0.0]],
                &device,
            )),
            bias: Param::from_tensor(Tensor::zeros([4], &device)),
            hidden_size: 1,
            forget_bias: 1.0,
        };
        let prev = LstmState {
            cell: Tensor::<TestBackend, 2>::from_floats([[0.5]], &device),
            hidden: Tensor::<TestBackend, 2>::zeros([1, 1], &device),
        };
        let x = Tensor::<TestBackend, 2>::from_floats([[1.0]], &device);
        let next = cell.step(x, prev);

        let sig = |v: f32| 1.0 / (1.0 + (-v).exp());
        let c = 0.5 * sig(1.0) + sig(1.0) * 2.0f32.tanh();
        let h = c.tanh() * sig(-1.0);
        assert!((values(next.cell)[0] - c).abs() < 1e-5);
        assert!((values(next.hidden)[0] - h).abs() < 1e-5);
    }

    #[test]
    fn test_length_one_summary_width() {
        let device = Default::default();
        let enc = BiLstmEncoderConfig::new(4, 6).init::<TestBackend>(&device).unwrap();
        assert_eq!(enc.output_size(), 12);

        let x = Tensor::<TestBackend, 3>::random([2, 1, 4], Distribution::Default, &device);
        assert_eq!(enc.outputs(x.clone(), &ForwardOptions::inference()).dims(), [2, 1, 12]);
        assert_eq!(enc.forward(x, &ForwardOptions::inference()).dims(), [2, 12]);
    }

    #[test]
    fn test_length_one_mean_is_the_single_step() {
        let device = Default::default();
        let enc = BiLstmEncoderConfig::new(3, 2).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([2, 1, 3], Distribution::Default, &device);
        let opts = ForwardOptions::inference();

        let steps = enc.outputs(x.clone(), &opts).reshape([2, 4]);
        let summary = enc.forward(x, &opts);
        assert_eq!(values(steps), values(summary));
    }

    #[test]
    fn test_longer_sequences_are_averaged() {
        let device = Default::default();
        let enc = BiLstmEncoderConfig::new(3, 5).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([2, 4, 3], Distribution::Default, &device);
        let opts = ForwardOptions::inference();

        let outputs = enc.outputs(x.clone(), &opts);
        assert_eq!(outputs.dims(), [2, 4, 10]);
        let expected = values(outputs.mean_dim(1).reshape([2, 10]));
        let got = values(enc.forward(x, &opts));
        for (a, b) in expected.iter().zip(got.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_backward_direction_reads_sequence_reversed() {
        let device = Default::default();
        let enc = BiLstmEncoderConfig::new(2, 3).init::<TestBackend>(&device).unwrap();
        let x = Tensor::<TestBackend, 3>::random([1, 3, 2], Distribution::Default, &device);
        let opts = ForwardOptions::inference();

        // the backward output at the last step has seen only that step
        let outputs = enc.outputs(x.clone(), &opts);
        let last_bw = outputs.slice([0..1, 2..3, 3..6]).reshape([1, 3]);
        let last_x = x.slice([0..1, 2..3, 0..2]).reshape([1, 2]);
        let alone = enc
            .backward_cell
            .step(last_x, LstmState::zeros(1, 3, &device))
            .hidden;
        assert_eq!(values(last_bw), values(alone));
    }

    #[test]
    fn test_registry_names_per_direction() {
        let device = Default::default();
        let enc = BiLstmEncoderConfig::new(4, 6).init::<TestBackend>(&device).unwrap();
        let mut reg = ParamRegistry::new();
        enc.register_params("bi-lstm-0", &mut reg);
        assert_eq!(
            reg.names(),
            vec![
                "bi-lstm-0/fw/kernel",
                "bi-lstm-0/fw/bias",
                "bi-lstm-0/bw/kernel",
                "bi-lstm-0/bw/bias",
            ]
        );
        assert_eq!(reg.shape_of("bi-lstm-0/fw/kernel"), Some(&[10usize, 24][..]));
    }

    #[test]
    fn test_zero_hidden_rejected() {
        let device = Default::default();
        assert!(BiLstmEncoderConfig::new(4, 0).init::<TestBackend>(&device).is_err());
    }
}
