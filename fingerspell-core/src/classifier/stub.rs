//! `StubClassifier`: placeholder backend that returns fixed scores.
//!
//! Used in development and tests before a trained model is available.
//! Produces the same score vector for every canvas so the full
//! normalize → render → disambiguate → stabilize path can be exercised
//! end-to-end.

use tracing::debug;

use crate::classifier::{GroupClassifier, GroupScores};
use crate::error::{FingerspellError, Result};
use crate::render::Canvas;

/// Fixed-output stub classifier.
pub struct StubClassifier {
    scores: GroupScores,
    predictions: u64,
}

impl StubClassifier {
    /// Always return `scores`.
    pub fn new(scores: GroupScores) -> Self {
        Self {
            scores,
            predictions: 0,
        }
    }

    /// Number of `predict` calls served so far.
    pub fn predictions(&self) -> u64 {
        self.predictions
    }
}

impl Default for StubClassifier {
    /// A mild vote for group 0 (fist shapes) over group 2 (C/O).
    fn default() -> Self {
        Self::new([0.55, 0.05, 0.25, 0.03, 0.03, 0.03, 0.03, 0.03])
    }
}

impl GroupClassifier for StubClassifier {
    fn warm_up(&mut self) -> Result<()> {
        debug!("StubClassifier::warm_up (no-op)");
        Ok(())
    }

    fn predict(&mut self, canvas: &Canvas) -> Result<GroupScores> {
        if canvas.width() == 0 || canvas.height() == 0 {
            return Err(FingerspellError::Inference("empty canvas".into()));
        }
        self.predictions += 1;
        Ok(self.scores)
    }
}
