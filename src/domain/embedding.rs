// ============================================================
// Domain — Embedding Types
// ============================================================
// The embedding table can start in one of three states:
//
//   no pretrained matrix            → random U(-1, 1), trainable
//   pretrained + EmbeddingType::Frozen    (code 0) → fixed
//   pretrained + EmbeddingType::Trainable (code 1) → fine-tuned
//
// PretrainedEmbedding is the plain row-major matrix a
// collaborator hands over; the ml layer turns it into a tensor.

use serde::{Deserialize, Serialize};

use crate::domain::error::CrnnError;

/// How a supplied pretrained matrix is treated during training.
/// Ignored when no pretrained matrix is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbeddingType {
    /// Code 0: used as a constant, receives no gradient.
    Frozen,
    /// Code 1: used as the initial value of a trainable table.
    Trainable,
}

impl TryFrom<u8> for EmbeddingType {
    type Error = CrnnError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EmbeddingType::Frozen),
            1 => Ok(EmbeddingType::Trainable),
            other => Err(CrnnError::InvalidEmbeddingType(other)),
        }
    }
}

/// A dense `(rows, cols)` matrix of word vectors, stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PretrainedEmbedding {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl PretrainedEmbedding {
    /// Wrap a row-major buffer; its length must be `rows * cols`.
    pub fn new(rows: usize, cols: usize, values: Vec<f32>) -> Result<Self, CrnnError> {
        if values.len() != rows * cols {
            return Err(CrnnError::PretrainedValueCount {
                rows,
                cols,
                actual: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Build from one vector per vocabulary entry.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, CrnnError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(Vec::len).unwrap_or(0);
        let values: Vec<f32> = rows.into_iter().flatten().collect();
        Self::new(n_rows, n_cols, values)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Check the matrix against the model's (vocab_size, embedding_size).
    pub fn check_shape(&self, vocab_size: usize, embedding_size: usize) -> Result<(), CrnnError> {
        let expected = (vocab_size, embedding_size);
        if self.shape() != expected {
            return Err(CrnnError::pretrained_shape(expected, self.shape()));
        }
        Ok(())
    }
}
