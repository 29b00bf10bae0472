#![recursion_limit = "256"]

//! CRNN text classifier on burn.
//!
//! Token indices are embedded, fed through one convolution + max-pool branch
//! per filter width, each branch is summarised by a bidirectional LSTM, and the
//! concatenated summaries go through FC → batch norm → ReLU → highway →
//! dropout → linear → sigmoid. The loss is multi-label sigmoid cross-entropy
//! plus an L2 penalty over an explicit parameter registry.

pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;

pub use domain::embedding::{EmbeddingType, PretrainedEmbedding};
pub use domain::error::CrnnError;
pub use domain::mode::{ForwardOptions, Mode};
pub use ml::model::{CrnnLoss, CrnnOutput, TextCrnn, TextCrnnConfig};
