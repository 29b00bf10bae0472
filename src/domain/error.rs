//! Error types for building and feeding the CRNN.

use thiserror::Error;

/// Every way graph construction (or batch validation) can fail.
///
/// All of these are configuration errors: nothing is retried and no partial
/// model is ever returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CrnnError {
    /// A projection was asked to consume something other than a rank-2 input
    /// with a known, non-zero feature width.
    #[error("projection expects a rank-2 input with a known non-zero feature width, got {dims:?}")]
    InvalidProjectionInput {
        /// Input dims as seen at construction (`None` = unknown)
        dims: Vec<Option<usize>>,
    },

    /// A size hyperparameter was zero.
    #[error("{what} must be greater than zero")]
    ZeroSized {
        /// Name of the offending hyperparameter
        what: &'static str,
    },

    /// No filter sizes were configured.
    #[error("filter_sizes must contain at least one width")]
    EmptyFilterSizes,

    /// A filter is taller than the sequence it slides over.
    #[error("filter size {filter_size} exceeds sequence length {sequence_length}")]
    FilterTooWide {
        filter_size: usize,
        sequence_length: usize,
    },

    /// The same width appears twice in filter_sizes.
    #[error("filter size {0} is listed more than once")]
    DuplicateFilterSize(usize),

    /// Concatenated branch summaries do not match the FC input width.
    #[error("fused summary width {actual} does not match FC input width {expected}")]
    FusionWidthMismatch { expected: usize, actual: usize },

    /// Pretrained embedding matrix has the wrong shape.
    #[error("pretrained embedding is {actual:?}, expected {expected:?} (vocab_size, embedding_size)")]
    PretrainedShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Pretrained embedding buffer length is not rows * cols.
    #[error("pretrained embedding holds {actual} values, expected {rows} x {cols}")]
    PretrainedValueCount {
        rows: usize,
        cols: usize,
        actual: usize,
    },

    /// Dropout keep probability outside (0, 1].
    #[error("dropout keep probability must be in (0, 1], got {0}")]
    InvalidKeepProb(f64),

    /// Negative or non-finite L2 coefficient.
    #[error("l2_reg_lambda must be a finite non-negative number, got {0}")]
    InvalidL2Lambda(f64),

    /// Unknown integer code for the embedding type.
    #[error("embedding type must be 0 (frozen) or 1 (trainable), got {0}")]
    InvalidEmbeddingType(u8),

    /// A sample's token sequence has the wrong length.
    #[error("sample has {actual} tokens, model expects {expected}")]
    SequenceLength { expected: usize, actual: usize },

    /// A token index falls outside the vocabulary.
    #[error("token {token} at position {position} is outside vocabulary of size {vocab_size}")]
    TokenOutOfRange {
        position: usize,
        token: u32,
        vocab_size: usize,
    },

    /// A label vector has the wrong number of classes.
    #[error("label vector has {actual} classes, model expects {expected}")]
    LabelWidth { expected: usize, actual: usize },

    /// A label value is not a probability.
    #[error("label {value} for class {class} is not in [0, 1]")]
    InvalidLabel { class: usize, value: f32 },
}

impl CrnnError {
    /// Create a ZeroSized error.
    pub fn zero_sized(what: &'static str) -> Self {
        Self::ZeroSized { what }
    }

    /// Create a FilterTooWide error.
    pub fn filter_too_wide(filter_size: usize, sequence_length: usize) -> Self {
        Self::FilterTooWide {
            filter_size,
            sequence_length,
        }
    }

    /// Create a PretrainedShapeMismatch error.
    pub fn pretrained_shape(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::PretrainedShapeMismatch { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let errors = vec![
            (CrnnError::zero_sized("num_filters"), "num_filters"),
            (CrnnError::filter_too_wide(12, 10), "12"),
            (CrnnError::pretrained_shape((100, 8), (99, 8)), "(99, 8)"),
            (CrnnError::InvalidKeepProb(1.5), "1.5"),
            (CrnnError::DuplicateFilterSize(3), "3"),
            (
                CrnnError::FusionWidthMismatch {
                    expected: 36,
                    actual: 24,
                },
                "24",
            ),
            (
                CrnnError::SequenceLength {
                    expected: 10,
                    actual: 25,
                },
                "25 tokens",
            ),
            (
                CrnnError::InvalidProjectionInput {
                    dims: vec![None, None],
                },
                "[None, None]",
            ),
        ];

        for (err, needle) in errors {
            let msg = err.to_string();
            assert!(msg.contains(needle), "'{msg}' should mention '{needle}'");
        }
    }
}
