// ============================================================
// Domain — Mode and ForwardOptions
// ============================================================
// A single switch decides, for the whole forward pass at once:
//
//   Training   → batch norm uses live batch statistics and
//                updates its running averages; dropout is on
//   Inference  → batch norm reads its running averages;
//                dropout is off
//
// The keep probability travels with the mode because the
// collaborator supplies both per pass.

use serde::{Deserialize, Serialize};

use crate::domain::error::CrnnError;

/// Global behavioural mode of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Training,
    Inference,
}

impl Mode {
    /// Map the external `is_training` flag onto a mode.
    pub fn from_flag(is_training: bool) -> Self {
        if is_training {
            Mode::Training
        } else {
            Mode::Inference
        }
    }

    pub fn is_training(self) -> bool {
        matches!(self, Mode::Training)
    }
}

/// Everything a single forward pass needs besides the inputs themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardOptions {
    mode: Mode,
    keep_prob: f64,
}

impl ForwardOptions {
    /// Build options, rejecting a keep probability outside (0, 1].
    pub fn new(mode: Mode, keep_prob: f64) -> Result<Self, CrnnError> {
        if !(keep_prob > 0.0 && keep_prob <= 1.0) {
            return Err(CrnnError::InvalidKeepProb(keep_prob));
        }
        Ok(Self { mode, keep_prob })
    }

    /// Training pass with the given dropout keep probability.
    pub fn training(keep_prob: f64) -> Result<Self, CrnnError> {
        Self::new(Mode::Training, keep_prob)
    }

    /// Inference pass; nothing is dropped.
    pub fn inference() -> Self {
        Self {
            mode: Mode::Inference,
            keep_prob: 1.0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn keep_prob(&self) -> f64 {
        self.keep_prob
    }

    /// True when dropout actually removes activations on this pass.
    pub fn dropout_active(&self) -> bool {
        self.mode.is_training() && self.keep_prob < 1.0
    }
}
