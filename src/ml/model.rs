// ============================================================
// TextCrnn — full classifier graph
// ============================================================
//
//   input_x [N, seq]
//     │ embedding                     [N, 1, seq, emb]
//     ├──────────────┬──────────────┐
//     ▼              ▼              ▼
//   conv-filter f₁  conv-filter f₂  …   each → [N, 1, filters]
//     ▼              ▼              ▼
//   bi-lstm-0      bi-lstm-1      …   each → [N, 2·lstm_hidden]
//     └──────────────┴──────────────┘
//     │ concat                        [N, 2·lstm_hidden·|filters|]
//     │ fc → batch norm → ReLU        [N, fc_hidden]
//     │ highway (1 layer, bias 0)     [N, fc_hidden]
//     │ dropout
//     │ output projection             [N, num_classes] logits
//     ▼ sigmoid                       scores
//
// forward_loss() adds the multi-label sigmoid cross-entropy and
// λ·Σ½‖θ‖² over the explicit parameter registry.

use std::collections::HashSet;

use burn::{
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

use crate::domain::embedding::{EmbeddingType, PretrainedEmbedding};
use crate::domain::error::CrnnError;
use crate::domain::mode::ForwardOptions;
use crate::ml::batch_norm::{BatchNorm, BatchNormConfig};
use crate::ml::conv_branch::{ConvBranch, ConvBranchConfig};
use crate::ml::dropout::dropout;
use crate::ml::embedding::{WordEmbedding, WordEmbeddingConfig};
use crate::ml::highway::{Activation, Highway, HighwayConfig};
use crate::ml::linear::{Projection, ProjectionConfig, ProjectionInit};
use crate::ml::loss::multilabel_loss;
use crate::ml::lstm::{BiLstmEncoder, BiLstmEncoderConfig};
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

const DENSE_INIT: ProjectionInit = ProjectionInit::TruncatedNormal { std: 0.1, bias: 0.1 };

#[derive(Config, Debug)]
pub struct TextCrnnConfig {
    pub sequence_length: usize,
    pub num_classes: usize,
    pub vocab_size: usize,
    pub lstm_hidden_size: usize,
    pub fc_hidden_size: usize,
    pub embedding_size: usize,
    /// One conv branch per distinct width; each ≤ sequence_length
    pub filter_sizes: Vec<usize>,
    /// Output channels per branch
    pub num_filters: usize,
    /// Only consulted when a pretrained matrix is supplied
    #[config(default = "EmbeddingType::Frozen")]
    pub embedding_type: EmbeddingType,
    #[config(default = 0.0)]
    pub l2_reg_lambda: f64,
}

impl TextCrnnConfig {
    /// Check every construction-time rule without allocating tensors.
    pub fn validate(&self) -> Result<(), CrnnError> {
        let sizes = [
            (self.sequence_length, "sequence_length"),
            (self.num_classes, "num_classes"),
            (self.vocab_size, "vocab_size"),
            (self.lstm_hidden_size, "lstm_hidden_size"),
            (self.fc_hidden_size, "fc_hidden_size"),
            (self.embedding_size, "embedding_size"),
            (self.num_filters, "num_filters"),
        ];
        if let Some((_, what)) = sizes.iter().find(|(n, _)| *n == 0) {
            return Err(CrnnError::zero_sized(*what));
        }

        if self.filter_sizes.is_empty() {
            return Err(CrnnError::EmptyFilterSizes);
        }
        let mut seen = HashSet::new();
        for &f in &self.filter_sizes {
            if f == 0 {
                return Err(CrnnError::zero_sized("filter size"));
            }
            if f > self.sequence_length {
                return Err(CrnnError::filter_too_wide(f, self.sequence_length));
            }
            if !seen.insert(f) {
                return Err(CrnnError::DuplicateFilterSize(f));
            }
        }

        if !(self.l2_reg_lambda.is_finite() && self.l2_reg_lambda >= 0.0) {
            return Err(CrnnError::InvalidL2Lambda(self.l2_reg_lambda));
        }
        Ok(())
    }

    /// Width of the concatenated branch summaries.
    pub fn fused_width(&self) -> usize {
        self.lstm_hidden_size * 2 * self.filter_sizes.len()
    }

    /// Build the graph. Nothing is returned unless every part is valid.
    pub fn init<B: Backend>(
        &self,
        pretrained: Option<&PretrainedEmbedding>,
        device: &B::Device,
    ) -> Result<TextCrnn<B>, CrnnError> {
        self.validate()?;

        let embedding = WordEmbeddingConfig::new(self.vocab_size, self.embedding_size)
            .with_embedding_type(self.embedding_type)
            .init(pretrained, device)?;

        let branches = self
            .filter_sizes
            .iter()
            .map(|&f| {
                ConvBranchConfig::new(self.sequence_length, self.embedding_size, f, self.num_filters)
                    .init(device)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let encoders = branches
            .iter()
            .map(|b| BiLstmEncoderConfig::new(b.num_filters(), self.lstm_hidden_size).init(device))
            .collect::<Result<Vec<_>, _>>()?;

        // ── Fusion ────────────────────────────────────────────────────────────
        // Recomputed from the built encoders rather than the config, so a
        // branch whose summary width drifts from lstm_hidden_size * 2 is caught.
        let fused: usize = encoders.iter().map(BiLstmEncoder::output_size).sum();
        let fc = ProjectionConfig::from_input_dims(&[None, Some(self.fused_width())], self.fc_hidden_size)?
            .with_initializer(DENSE_INIT)
            .init(device)?;
        if fc.input_size() != fused {
            return Err(CrnnError::FusionWidthMismatch {
                expected: fc.input_size(),
                actual: fused,
            });
        }
        let fc_norm = BatchNormConfig::new(self.fc_hidden_size).init(device)?;

        // ── Head ──────────────────────────────────────────────────────────────
        let highway = HighwayConfig::new(fc.output_size())
            .with_num_layers(1)
            .with_bias(0.0)
            .with_activation(Activation::Relu)
            .init(device)?;
        let output = ProjectionConfig::new(self.fc_hidden_size, self.num_classes)
            .with_initializer(DENSE_INIT)
            .init(device)?;

        tracing::info!(
            "TextCrnn ready: {} branches (filters {:?} x {}), fused width {}, fc {}, classes {}, trainable embedding {}",
            branches.len(),
            self.filter_sizes,
            self.num_filters,
            fused,
            self.fc_hidden_size,
            self.num_classes,
            embedding.is_trainable(),
        );

        Ok(TextCrnn {
            embedding,
            branches,
            encoders,
            fc,
            fc_norm,
            highway,
            output,
            sequence_length: self.sequence_length,
            l2_reg_lambda: self.l2_reg_lambda,
        })
    }
}

#[derive(Module, Debug)]
pub struct TextCrnn<B: Backend> {
    embedding: WordEmbedding<B>,
    branches: Vec<ConvBranch<B>>,
    encoders: Vec<BiLstmEncoder<B>>,
    fc: Projection<B>,
    fc_norm: BatchNorm<B>,
    highway: Highway<B>,
    output: Projection<B>,
    sequence_length: usize,
    l2_reg_lambda: f64,
}

/// Logits and independent per-class probabilities, both [N, num_classes].
#[derive(Debug, Clone)]
pub struct CrnnOutput<B: Backend> {
    pub logits: Tensor<B, 2>,
    pub scores: Tensor<B, 2>,
}

/// Total loss with its two parts, each a 1-element tensor.
#[derive(Debug, Clone)]
pub struct CrnnLoss<B: Backend> {
    pub loss: Tensor<B, 1>,
    pub base_loss: Tensor<B, 1>,
    pub l2_loss: Tensor<B, 1>,
    pub output: CrnnOutput<B>,
}

impl<B: Backend> TextCrnn<B> {
    /// input_x [N, seq] → concatenated branch summaries [N, fused_width]
    pub fn encode(
        &self,
        input_x: Tensor<B, 2, Int>,
        opts: &ForwardOptions,
    ) -> Result<Tensor<B, 2>, CrnnError> {
        self.check_sequence_length(&input_x)?;

        let embedded = self.embedding.expand(input_x);
        let summaries = self
            .branches
            .iter()
            .zip(&self.encoders)
            .map(|(branch, encoder)| encoder.forward(branch.forward(embedded.clone(), opts), opts))
            .collect();
        Ok(Tensor::cat(summaries, 1))
    }

    /// input_x [N, seq] → logits, scores [N, num_classes]
    pub fn forward(
        &self,
        input_x: Tensor<B, 2, Int>,
        opts: &ForwardOptions,
    ) -> Result<CrnnOutput<B>, CrnnError> {
        let fused = self.encode(input_x, opts)?;

        let fc = relu(self.fc_norm.forward(self.fc.forward(fused), opts.mode()));
        let gated = dropout(self.highway.forward(fc), opts);

        let logits = self.output.forward(gated);
        let scores = sigmoid(logits.clone());
        Ok(CrnnOutput { logits, scores })
    }

    /// Forward pass plus sigmoid cross-entropy and the scaled L2 penalty.
    pub fn forward_loss(
        &self,
        input_x: Tensor<B, 2, Int>,
        input_y: Tensor<B, 2>,
        opts: &ForwardOptions,
    ) -> Result<CrnnLoss<B>, CrnnError> {
        let [_, classes] = input_y.dims();
        if classes != self.num_classes() {
            return Err(CrnnError::LabelWidth {
                expected: self.num_classes(),
                actual: classes,
            });
        }

        let device = input_x.device();
        let output = self.forward(input_x, opts)?;

        let base_loss = multilabel_loss(output.logits.clone(), input_y);
        let l2_loss = self.l2_penalty(&device);
        let loss = base_loss.clone() + l2_loss.clone();

        Ok(CrnnLoss {
            loss,
            base_loss,
            l2_loss,
            output,
        })
    }

    // Pool windows are sized from sequence_length at construction.
    fn check_sequence_length(&self, input_x: &Tensor<B, 2, Int>) -> Result<(), CrnnError> {
        let [_, actual] = input_x.dims();
        if actual != self.sequence_length {
            return Err(CrnnError::SequenceLength {
                expected: self.sequence_length,
                actual,
            });
        }
        Ok(())
    }

    /// λ·Σ½‖θ‖²; exactly zero when λ is zero.
    pub fn l2_penalty(&self, device: &B::Device) -> Tensor<B, 1> {
        if self.l2_reg_lambda == 0.0 {
            return Tensor::zeros([1], device);
        }
        self.param_registry()
            .l2_loss(device)
            .mul_scalar(self.l2_reg_lambda)
    }

    /// Every trainable tensor, named by its place in the graph.
    pub fn param_registry(&self) -> ParamRegistry<B> {
        let mut registry = ParamRegistry::new();
        self.register_params("", &mut registry);
        tracing::debug!(
            "Parameter registry: {} tensors, {} scalars",
            registry.len(),
            registry.num_scalars()
        );
        registry
    }

    pub fn embedding(&self) -> &WordEmbedding<B> {
        &self.embedding
    }

    pub fn filter_sizes(&self) -> Vec<usize> {
        self.branches.iter().map(ConvBranch::filter_size).collect()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn num_classes(&self) -> usize {
        self.output.output_size()
    }

    pub fn fused_width(&self) -> usize {
        self.fc.input_size()
    }
}

impl<B: Backend> Regularized<B> for TextCrnn<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        self.embedding
            .register_params(&scoped(scope, "embedding"), registry);
        for branch in &self.branches {
            let name = format!("conv-filter{}", branch.filter_size());
            branch.register_params(&scoped(scope, &name), registry);
        }
        for (index, encoder) in self.encoders.iter().enumerate() {
            encoder.register_params(&scoped(scope, &format!("bi-lstm-{index}")), registry);
        }
        self.fc.register_params(&scoped(scope, "fc"), registry);
        self.fc_norm.register_params(&scoped(scope, "fc/bn"), registry);
        self.highway.register_params(&scoped(scope, "highway"), registry);
        self.output.register_params(&scoped(scope, "output"), registry);
    }
}
