//! Event types published to UI and sentence-builder consumers.
//!
//! ## Channels
//!
//! | Event | Source |
//! |-------|--------|
//! | `PredictionEvent` | `FingerspellEngine::subscribe_predictions` |
//! | `EngineStatusEvent` | `FingerspellEngine::subscribe_status` |
//!
//! Consumers should treat repeated empty `PredictionEvent`s as "no signal".

use serde::{Deserialize, Serialize};

use crate::recognizer::PredictionResult;

// ---------------------------------------------------------------------------
// Prediction events
// ---------------------------------------------------------------------------

/// One stabilized output, at most one per throttle + settle cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    /// Zero or one uppercase letter.
    pub character: String,
    /// Confidence in [0.0, 1.0]; 0 when `character` is empty.
    pub confidence: f32,
}

impl PredictionEvent {
    pub fn new(seq: u64, result: &PredictionResult) -> Self {
        match result.character {
            Some(c) => Self {
                seq,
                character: c.to_string(),
                confidence: result.confidence,
            },
            None => Self {
                seq,
                character: String::new(),
                confidence: 0.0,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.character.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine status events
// ---------------------------------------------------------------------------

/// Emitted when the engine state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatusEvent {
    pub status: EngineStatus,
    /// Optional human-readable detail (e.g. error message).
    pub detail: Option<String>,
}

/// Current state of the fingerspelling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Classifier loaded (or not yet loaded); no detection session.
    Idle,
    /// Loading the classifier.
    WarmingUp,
    /// A detection session is accepting frames.
    Detecting,
    /// Session stopped; the engine may be restarted.
    Stopped,
    /// Classifier failed to load. `warm_up` again to retry.
    Error,
}
