//! # fingerspell-core
//!
//! Reusable fingerspelling recognition engine: hand landmarks in, stabilized
//! letters out.
//!
//! ## Architecture
//!
//! ```text
//! detector frame (21 landmarks) → Stabilizer (settle + throttle)
//!                                       │ spawn_blocking
//!                        normalize → render → GroupClassifier::predict
//!                                       │ scores[8]
//!                              DisambiguationEngine (raw landmarks)
//!                                       │
//!                        broadcast::Sender<PredictionEvent>
//! ```
//!
//! Frame delivery never waits on the model; at most one inference runs per
//! session at a time.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod classifier;
pub mod disambiguation;
pub mod engine;
pub mod error;
pub mod ipc;
pub mod landmarks;
pub mod recognizer;
pub mod render;

// Convenience re-exports for downstream crates
pub use classifier::{
    ClassificationGroup, ClassifierHandle, ClassifierRuntime, GroupClassifier, GroupScores,
    LoadStatus, StubClassifier,
};
pub use disambiguation::{DisambiguationEngine, DisambiguationThresholds};
pub use engine::stabilizer::{Stabilizer, StabilizerConfig, StabilizerPhase};
pub use engine::{EngineConfig, FingerspellEngine};
pub use error::{FingerspellError, Result};
pub use ipc::events::{EngineStatus, EngineStatusEvent, PredictionEvent};
pub use landmarks::{HandFrame, Landmark, LandmarkSet};
pub use recognizer::{PredictionResult, Recognizer, SignRecognizer};

#[cfg(feature = "onnx")]
pub use classifier::{OnnxClassifier, OnnxClassifierConfig};
