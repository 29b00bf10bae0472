// ============================================================
// ML Layer (Burn)
// ============================================================
// Every burn tensor op in the crate lives here. Each component
// owns its parameters explicitly and reports them to a shared
// ParamRegistry under a caller-chosen scope, so the L2 penalty
// and the set of trainable tensors are both inspectable.
//
//   init.rs        — truncated normal / Glorot / constant fills
//   registry.rs    — named parameter registry + Regularized trait
//   dropout.rs     — mode-gated inverted dropout
//   linear.rs      — Projection (xWᵀ + b)
//   highway.rs     — gated residual block
//   batch_norm.rs  — batch norm with explicit running statistics
//   embedding.rs   — random / frozen / trainable lookup table
//   conv_branch.rs — conv → BN → ReLU → full-height max pool
//   lstm.rs        — LSTM cell and bidirectional encoder
//   loss.rs        — multi-label sigmoid cross-entropy
//   model.rs       — TextCrnn assembly, forward and loss

/// Parameter initialisers
pub mod init;

/// Named parameter registry for the L2 penalty
pub mod registry;

pub mod dropout;

/// Affine projection
pub mod linear;

/// Highway (gated residual) block
pub mod highway;

/// Batch normalisation with explicit running state
pub mod batch_norm;

/// Word embedding lookup
pub mod embedding;

/// One convolution + max-pool branch per filter width
pub mod conv_branch;

/// LSTM cell and bidirectional encoder
pub mod lstm;

pub mod loss;

/// The full CRNN classifier
pub mod model;
