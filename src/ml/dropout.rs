// ============================================================
// Mode-gated dropout
// ============================================================
// Inverted dropout: keep each activation with probability p and
// scale survivors by 1/p so the expected value is unchanged.
// Unlike burn's Dropout module the keep probability is a
// per-pass input and the on/off switch is the explicit Mode.

use burn::{prelude::*, tensor::Distribution};

use crate::domain::mode::ForwardOptions;

pub fn dropout<B: Backend, const D: usize>(x: Tensor<B, D>, opts: &ForwardOptions) -> Tensor<B, D> {
    if !opts.dropout_active() {
        return x;
    }
    let keep = opts.keep_prob();
    let mask = x.random_like(Distribution::Bernoulli(keep));
    (x * mask).div_scalar(keep)
}
