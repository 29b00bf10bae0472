// ============================================================
// Convolution + Max-Pool Branch
// ============================================================
// One branch per filter width f. Shapes for a batch of N:
//
//   input    [N, 1, seq, emb]          single input channel
//   conv     [N, filters, seq-f+1, 1]  valid padding, stride 1
//   + bias, batch norm (per filter), ReLU
//   max-pool, window (seq-f+1, 1)   →  [N, filters, 1, 1]
//   reshape                         →  [N, 1, filters]
//   dropout
//
// The kernel spans the whole embedding width, so each filter
// sees f consecutive words at a time. f > seq has no valid
// output row and is refused at construction.

use burn::{
    module::Param,
    prelude::*,
    tensor::{
        activation::relu,
        module::{conv2d, max_pool2d},
        ops::ConvOptions,
    },
};

use crate::domain::error::CrnnError;
use crate::domain::mode::ForwardOptions;
use crate::ml::batch_norm::{BatchNorm, BatchNormConfig};
use crate::ml::dropout::dropout;
use crate::ml::init;
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

#[derive(Config, Debug)]
pub struct ConvBranchConfig {
    pub sequence_length: usize,
    pub embedding_size: usize,
    pub filter_size: usize,
    pub num_filters: usize,
    #[config(default = 0.1)]
    pub weight_std: f64,
    #[config(default = 0.1)]
    pub bias_init: f64,
}

impl ConvBranchConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ConvBranch<B>, CrnnError> {
        if self.filter_size == 0 {
            return Err(CrnnError::zero_sized("filter size"));
        }
        if self.filter_size > self.sequence_length {
            return Err(CrnnError::filter_too_wide(
                self.filter_size,
                self.sequence_length,
            ));
        }
        if self.num_filters == 0 {
            return Err(CrnnError::zero_sized("num_filters"));
        }
        if self.embedding_size == 0 {
            return Err(CrnnError::zero_sized("embedding_size"));
        }

        // [out_channels, in_channels, kernel_h, kernel_w]
        let shape = [self.num_filters, 1, self.filter_size, self.embedding_size];
        Ok(ConvBranch {
            weight: Param::from_tensor(init::truncated_normal(shape, self.weight_std, device)),
            bias: Param::from_tensor(init::constant([self.num_filters], self.bias_init, device)),
            norm: BatchNormConfig::new(self.num_filters).init(device)?,
            filter_size: self.filter_size,
            sequence_length: self.sequence_length,
        })
    }
}

#[derive(Module, Debug)]
pub struct ConvBranch<B: Backend> {
    weight: Param<Tensor<B, 4>>,
    bias: Param<Tensor<B, 1>>,
    norm: BatchNorm<B>,
    filter_size: usize,
    sequence_length: usize,
}

impl<B: Backend> ConvBranch<B> {
    /// [N, 1, seq, emb] → [N, 1, num_filters]
    pub fn forward(&self, embedded: Tensor<B, 4>, opts: &ForwardOptions) -> Tensor<B, 3> {
        let conv = conv2d(
            embedded,
            self.weight.val(),
            Some(self.bias.val()),
            ConvOptions::new([1, 1], [0, 0], [1, 1], 1),
        );
        let [batch, filters, height, _] = conv.dims();

        // channels-last rows so batch norm sees one column per filter
        let rows = conv
            .reshape([batch, filters, height])
            .swap_dims(1, 2)
            .reshape([batch * height, filters]);
        let activated = relu(self.norm.forward(rows, opts.mode()))
            .reshape([batch, height, filters])
            .swap_dims(1, 2)
            .reshape([batch, filters, height, 1]);

        // pooling window == every remaining row
        let pooled = max_pool2d(activated, [height, 1], [1, 1], [0, 0], [1, 1]);
        dropout(pooled.reshape([batch, 1, filters]), opts)
    }

    pub fn filter_size(&self) -> usize {
        self.filter_size
    }

    pub fn num_filters(&self) -> usize {
        self.bias.val().dims()[0]
    }

    /// Rows produced by the valid convolution and covered by the pool.
    pub fn pool_height(&self) -> usize {
        self.sequence_length - self.filter_size + 1
    }
}

impl<B: Backend> Regularized<B> for ConvBranch<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        registry.register(scoped(scope, "W"), self.weight.val());
        registry.register(scoped(scope, "b"), self.bias.val());
        self.norm.register_params(&scoped(scope, "bn"), registry);
    }
}
