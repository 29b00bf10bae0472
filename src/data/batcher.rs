// ============================================================
// Classification Batcher
// ============================================================
// Stacks fixed-length token sequences and multi-hot label rows
// into the two tensors a TextCrnn pass consumes:
//
//   N samples of S tokens  →  input_x [N, S]  (Int)
//   N label rows of C      →  input_y [N, C]  (Float)
//
// Rows are flattened in sample order and reshaped, so row i of
// both tensors always belongs to sample i.
//
// Padding and vocabulary lookup happen upstream; a sample that
// does not fit the model can be caught with validate() before
// it reaches the batcher.

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::TensorData};
use serde::{Deserialize, Serialize};

use crate::domain::error::CrnnError;
use crate::ml::model::TextCrnnConfig;

// ─── ClassificationSample ─────────────────────────────────────────────────────
/// One pre-tokenised, pre-padded example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSample {
    /// Vocabulary indices, exactly sequence_length of them
    pub token_ids: Vec<u32>,
    /// One value per class in [0, 1]
    pub labels: Vec<f32>,
}

impl ClassificationSample {
    pub fn new(token_ids: Vec<u32>, labels: Vec<f32>) -> Self {
        Self { token_ids, labels }
    }

    /// Build a multi-hot label row from the indices of the positive classes.
    pub fn from_label_indices(
        token_ids: Vec<u32>,
        label_indices: &[usize],
        num_classes: usize,
    ) -> Result<Self, CrnnError> {
        let mut labels = vec![0.0; num_classes];
        for &class in label_indices {
            let slot = labels.get_mut(class).ok_or(CrnnError::LabelWidth {
                expected: num_classes,
                actual: class + 1,
            })?;
            *slot = 1.0;
        }
        Ok(Self { token_ids, labels })
    }

    /// Check the sample against the model it will be fed to.
    pub fn validate(&self, config: &TextCrnnConfig) -> Result<(), CrnnError> {
        if self.token_ids.len() != config.sequence_length {
            return Err(CrnnError::SequenceLength {
                expected: config.sequence_length,
                actual: self.token_ids.len(),
            });
        }
        if let Some((position, &token)) = self
            .token_ids
            .iter()
            .enumerate()
            .find(|&(_, &t)| t as usize >= config.vocab_size)
        {
            return Err(CrnnError::TokenOutOfRange {
                position,
                token,
                vocab_size: config.vocab_size,
            });
        }
        if self.labels.len() != config.num_classes {
            return Err(CrnnError::LabelWidth {
                expected: config.num_classes,
                actual: self.labels.len(),
            });
        }
        if let Some((class, &value)) = self
            .labels
            .iter()
            .enumerate()
            .find(|&(_, &v)| !(0.0..=1.0).contains(&v))
        {
            return Err(CrnnError::InvalidLabel { class, value });
        }
        Ok(())
    }
}

// ─── ClassificationBatch ──────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// [batch_size, sequence_length]
    pub input_x: Tensor<B, 2, Int>,
    /// [batch_size, num_classes]
    pub input_y: Tensor<B, 2>,
}

// ─── ClassificationBatcher ────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<ClassificationSample, ClassificationBatch<B>> for ClassificationBatcher<B> {
    /// Stack `items` in order.
    ///
    /// # Panics
    ///
    /// Every sample must share the first sample's token count and label
    /// width; ragged input fails the tensor shape check. Run
    /// [`ClassificationSample::validate`] first to get a `CrnnError` instead.
    fn batch(&self, items: Vec<ClassificationSample>) -> ClassificationBatch<B> {
        let batch_size = items.len();
        let seq_len = items.first().map_or(0, |s| s.token_ids.len());
        let num_classes = items.first().map_or(0, |s| s.labels.len());
        debug_assert!(
            items
                .iter()
                .all(|s| s.token_ids.len() == seq_len && s.labels.len() == num_classes),
            "ragged batch: every sample needs {seq_len} tokens and {num_classes} labels"
        );

        let tokens: Vec<i32> = items
            .iter()
            .flat_map(|s| s.token_ids.iter().map(|&t| t as i32))
            .collect();
        let labels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.labels.iter().copied())
            .collect();

        let input_x = Tensor::<B, 2, Int>::from_data(
            TensorData::new(tokens, [batch_size, seq_len]).convert::<B::IntElem>(),
            &self.device,
        );
        let input_y = Tensor::<B, 2>::from_data(
            TensorData::new(labels, [batch_size, num_classes]).convert::<B::FloatElem>(),
            &self.device,
        );

        ClassificationBatch { input_x, input_y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mode::ForwardOptions;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn config() -> TextCrnnConfig {
        TextCrnnConfig::new(4, 3, 20, 2, 4, 3, vec![2, 3], 2)
    }

    #[test]
    fn test_multi_hot_labels() {
        let sample = ClassificationSample::from_label_indices(vec![1, 2, 3, 4], &[0, 2], 3).unwrap();
        assert_eq!(sample.labels, vec![1.0, 0.0, 1.0]);

        let err = ClassificationSample::from_label_indices(vec![1, 2, 3, 4], &[3], 3).unwrap_err();
        assert_eq!(err, CrnnError::LabelWidth { expected: 3, actual: 4 });
    }

    #[test]
    fn test_validate_against_config() {
        let cfg = config();
        let ok = ClassificationSample::new(vec![0, 5, 19, 2], vec![0.0, 1.0, 0.5]);
        assert!(ok.validate(&cfg).is_ok());

        let short = ClassificationSample::new(vec![0, 5], vec![0.0, 1.0, 0.0]);
        assert_eq!(
            short.validate(&cfg),
            Err(CrnnError::SequenceLength { expected: 4, actual: 2 })
        );

        let oov = ClassificationSample::new(vec![0, 20, 1, 1], vec![0.0, 1.0, 0.0]);
        assert_eq!(
            oov.validate(&cfg),
            Err(CrnnError::TokenOutOfRange { position: 1, token: 20, vocab_size: 20 })
        );

        let wide = ClassificationSample::new(vec![0, 1, 1, 1], vec![0.0, 1.0, 0.0, 1.0]);
        assert_eq!(wide.validate(&cfg), Err(CrnnError::LabelWidth { expected: 3, actual: 4 }));

        let bad = ClassificationSample::new(vec![0, 1, 1, 1], vec![0.0, 1.5, 0.0]);
        assert_eq!(bad.validate(&cfg), Err(CrnnError::InvalidLabel { class: 1, value: 1.5 }));
    }

    #[test]
    fn test_batch_keeps_sample_order() {
        let device = Default::default();
        let batcher = ClassificationBatcher::<TestBackend>::new(device);
        let items = vec![
            ClassificationSample::new(vec![1, 2, 3, 4], vec![1.0, 0.0, 0.0]),
            ClassificationSample::new(vec![5, 6, 7, 8], vec![0.0, 1.0, 1.0]),
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.input_x.dims(), [2, 4]);
        assert_eq!(batch.input_y.dims(), [2, 3]);
        assert_eq!(
            batch.input_x.into_data().convert::<i64>().to_vec::<i64>().unwrap(),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(
            batch.input_y.into_data().to_vec::<f32>().unwrap(),
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    #[should_panic(expected = "ragged batch")]
    fn test_ragged_batch_is_refused() {
        let batcher = ClassificationBatcher::<TestBackend>::new(Default::default());
        batcher.batch(vec![
            ClassificationSample::new(vec![1, 2, 3, 4], vec![1.0, 0.0, 0.0]),
            ClassificationSample::new(vec![5, 6], vec![0.0, 1.0, 1.0]),
        ]);
    }

    #[test]
    fn test_batch_feeds_model() {
        let device = Default::default();
        let cfg = config();
        let model = cfg.init::<TestBackend>(None, &device).unwrap();
        let batcher = ClassificationBatcher::<TestBackend>::new(device);

        let items: Vec<_> = (0..3u32)
            .map(|i| ClassificationSample::from_label_indices(vec![i, i + 1, i + 2, i + 3], &[i as usize], 3).unwrap())
            .collect();
        assert!(items.iter().all(|s| s.validate(&cfg).is_ok()));

        let batch = batcher.batch(items);
        let out = model
            .forward_loss(batch.input_x, batch.input_y, &ForwardOptions::inference())
            .unwrap();
        assert_eq!(out.output.scores.dims(), [3, 3]);
        assert_eq!(out.loss.dims(), [1]);
    }
}
