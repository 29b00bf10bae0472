// ============================================================
// Parameter initialisers
// ============================================================
// Small helpers shared by every layer that owns raw Params.
// All draw from the backend RNG through Tensor::random.

use burn::{
    prelude::*,
    tensor::{Distribution, ElementConversion},
};

/// Redraw rounds before any remaining outliers are clamped.
const MAX_REDRAWS: usize = 32;

/// Normal(0, std) truncated to ±2σ: out-of-range draws are redrawn.
pub fn truncated_normal<B: Backend, const D: usize>(
    shape: [usize; D],
    std: f64,
    device: &B::Device,
) -> Tensor<B, D> {
    let bound = 2.0 * std;
    let dist = Distribution::Normal(0.0, std);
    let mut values: Tensor<B, D> = Tensor::random(shape, dist, device);

    for _ in 0..MAX_REDRAWS {
        let outside = values.clone().abs().greater_elem(bound);
        let remaining: i64 = outside.clone().int().sum().into_scalar().elem();
        if remaining == 0 {
            break;
        }
        values = values.mask_where(outside, Tensor::random(shape, dist, device));
    }
    // draws still outside after MAX_REDRAWS rounds
    values.clamp(-bound, bound)
}

/// Glorot / Xavier uniform: U(-l, l) with l = sqrt(6 / (fan_in + fan_out)).
pub fn glorot_uniform<B: Backend, const D: usize>(
    shape: [usize; D],
    fan_in: usize,
    fan_out: usize,
    device: &B::Device,
) -> Tensor<B, D> {
    let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
    Tensor::random(shape, Distribution::Uniform(-limit, limit), device)
}

/// Every element set to `value`.
pub fn constant<B: Backend, const D: usize>(
    shape: [usize; D],
    value: f64,
    device: &B::Device,
) -> Tensor<B, D> {
    Tensor::<B, D>::ones(shape, device).mul_scalar(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_truncated_normal_stays_within_two_sigma() {
        let device = Default::default();
        let t = truncated_normal::<TestBackend, 2>([64, 64], 0.1, &device);
        let values = t.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.abs() <= 0.2 + 1e-6));
    }

    #[test]
    fn test_truncated_normal_does_not_pile_up_at_bounds() {
        let device = Default::default();
        let t = truncated_normal::<TestBackend, 1>([20_000], 1.0, &device);
        let values = t.into_data().to_vec::<f32>().unwrap();
        // clipping would leave ~4.6% exactly on ±2
        let at_bound = values.iter().filter(|v| (v.abs() - 2.0).abs() < 1e-6).count();
        assert!(at_bound < 10, "{at_bound} values sit on the bound");

        let mean = values.iter().sum::<f32>() / values.len() as f32;
        assert!(mean.abs() < 0.05);
    }

    #[test]
    fn test_glorot_limit() {
        let device = Default::default();
        let t = glorot_uniform::<TestBackend, 2>([10, 20], 20, 10, &device);
        let limit = (6.0f32 / 30.0).sqrt();
        let values = t.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| v.abs() <= limit));
    }

    #[test]
    fn test_constant_fill() {
        let device = Default::default();
        let t = constant::<TestBackend, 1>([5], 0.1, &device);
        let values = t.into_data().to_vec::<f32>().unwrap();
        assert!(values.iter().all(|v| (v - 0.1).abs() < 1e-7));
    }
}
