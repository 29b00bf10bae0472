// ============================================================
// Multi-label loss
// ============================================================
// Each class is an independent yes/no decision, so the base loss
// is a per-class sigmoid cross-entropy, summed over classes and
// averaged over the batch:
//
//   ℓ(x, z) = max(x, 0) − x·z + ln(1 + e^{−|x|})
//
// which equals −z·ln σ(x) − (1−z)·ln(1−σ(x)) without overflowing
// for large |x|. Soft labels in [0, 1] are accepted.

use burn::prelude::*;

/// Element-wise sigmoid cross-entropy, [N, C] → [N, C].
pub fn sigmoid_cross_entropy_with_logits<B: Backend>(
    logits: Tensor<B, 2>,
    labels: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let softplus_neg_abs = logits.clone().abs().neg().exp().add_scalar(1.0).log();
    logits.clone().clamp_min(0.0) - logits * labels + softplus_neg_abs
}

/// Sum over classes, mean over the batch → 1-element tensor.
pub fn multilabel_loss<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 2>) -> Tensor<B, 1> {
    sigmoid_cross_entropy_with_logits(logits, labels)
        .sum_dim(1)
        .mean()
}
