// ============================================================
// Word Embedding
// ============================================================
// Lookup table [vocab_size, embedding_size] shared by every
// position and every convolution branch.
//
//   pretrained = None                    → U(-1, 1), trainable
//   pretrained + EmbeddingType::Frozen    → constant, no gradient,
//                                           not in the L2 registry
//   pretrained + EmbeddingType::Trainable → initial value, trainable
//
// forward():  [batch, seq]  →  [batch, seq, embedding_size]
// expand():   adds the single input channel the convolutions read:
//             [batch, 1, seq, embedding_size]

use burn::{
    module::Param,
    prelude::*,
    tensor::{module::embedding, Distribution, TensorData},
};

use crate::domain::embedding::{EmbeddingType, PretrainedEmbedding};
use crate::domain::error::CrnnError;
use crate::ml::registry::{scoped, ParamRegistry, Regularized};

#[derive(Config, Debug)]
pub struct WordEmbeddingConfig {
    pub vocab_size: usize,
    pub embedding_size: usize,
    #[config(default = "EmbeddingType::Frozen")]
    pub embedding_type: EmbeddingType,
}

impl WordEmbeddingConfig {
    pub fn init<B: Backend>(
        &self,
        pretrained: Option<&PretrainedEmbedding>,
        device: &B::Device,
    ) -> Result<WordEmbedding<B>, CrnnError> {
        if self.vocab_size == 0 {
            return Err(CrnnError::zero_sized("vocab_size"));
        }
        if self.embedding_size == 0 {
            return Err(CrnnError::zero_sized("embedding_size"));
        }
        let shape = [self.vocab_size, self.embedding_size];

        let (table, trainable) = match pretrained {
            None => (
                Tensor::random(shape, Distribution::Uniform(-1.0, 1.0), device),
                true,
            ),
            Some(matrix) => {
                matrix.check_shape(self.vocab_size, self.embedding_size)?;
                let data = TensorData::new(matrix.values().to_vec(), shape)
                    .convert::<B::FloatElem>();
                (
                    Tensor::from_data(data, device),
                    self.embedding_type == EmbeddingType::Trainable,
                )
            }
        };

        tracing::debug!(
            "Embedding table {}x{} (pretrained={}, trainable={})",
            self.vocab_size,
            self.embedding_size,
            pretrained.is_some(),
            trainable
        );

        let layer = WordEmbedding {
            weight: Param::from_tensor(table),
            trainable,
        };
        Ok(if trainable { layer } else { layer.no_grad() })
    }
}

#[derive(Module, Debug)]
pub struct WordEmbedding<B: Backend> {
    weight: Param<Tensor<B, 2>>,
    trainable: bool,
}

impl<B: Backend> WordEmbedding<B> {
    /// [batch, seq] → [batch, seq, embedding_size]
    pub fn forward(&self, input_x: Tensor<B, 2, Int>) -> Tensor<B, 3> {
        embedding(self.weight.val(), input_x)
    }

    /// [batch, seq] → [batch, 1, seq, embedding_size]
    pub fn expand(&self, input_x: Tensor<B, 2, Int>) -> Tensor<B, 4> {
        self.forward(input_x).unsqueeze_dim(1)
    }

    /// The lookup table as currently held.
    pub fn table(&self) -> Tensor<B, 2> {
        self.weight.val()
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub fn vocab_size(&self) -> usize {
        self.weight.val().dims()[0]
    }

    pub fn embedding_size(&self) -> usize {
        self.weight.val().dims()[1]
    }
}

impl<B: Backend> Regularized<B> for WordEmbedding<B> {
    fn register_params(&self, scope: &str, registry: &mut ParamRegistry<B>) {
        if self.trainable {
            registry.register(scoped(scope, "W"), self.weight.val());
        }
    }
}
