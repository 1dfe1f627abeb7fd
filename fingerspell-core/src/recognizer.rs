//! One synchronous recognition pass.
//!
//! ```text
//! raw LandmarkSet ─► normalize ─► render ─► ClassifierRuntime::predict
//!        │                                          │ scores[8]
//!        └──────────────► DisambiguationEngine ◄────┘
//!                                 │
//!                         PredictionResult
//! ```
//!
//! Everything here blocks (rendering and the model); the stabilizer calls it
//! from `spawn_blocking`.

use tracing::debug;

use crate::classifier::{ClassifierRuntime, GroupScores};
use crate::disambiguation::{top_two, DisambiguationEngine};
use crate::error::Result;
use crate::landmarks::{normalize::normalize, LandmarkSet};
use crate::render::render;

/// A letter and its confidence, or nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    /// `None` means no reliable sign in this cycle.
    pub character: Option<char>,
    /// In `[0, 1]`; always 0 for an empty result.
    pub confidence: f32,
}

impl PredictionResult {
    pub const fn empty() -> Self {
        Self {
            character: None,
            confidence: 0.0,
        }
    }

    pub fn letter(character: char, confidence: f32) -> Self {
        Self {
            character: Some(character),
            confidence,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.character.is_none()
    }
}

impl Default for PredictionResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Anything the stabilizer can hand a landmark set to.
pub trait SignRecognizer: Send + Sync + 'static {
    /// Whether `recognize` may be called.
    fn is_ready(&self) -> bool;

    /// Classify one hand. Blocking.
    ///
    /// # Errors
    /// `NotReady` before the classifier has loaded; backend errors otherwise.
    fn recognize(&self, raw: &LandmarkSet) -> Result<PredictionResult>;
}

/// The production recognizer: renderer, classifier and disambiguation.
#[derive(Debug, Clone)]
pub struct Recognizer {
    runtime: ClassifierRuntime,
    engine: DisambiguationEngine,
    canvas_size: u32,
}

impl Recognizer {
    pub fn new(runtime: ClassifierRuntime, engine: DisambiguationEngine, canvas_size: u32) -> Self {
        Self {
            runtime,
            engine,
            canvas_size,
        }
    }

    pub fn runtime(&self) -> &ClassifierRuntime {
        &self.runtime
    }
}

impl SignRecognizer for Recognizer {
    fn is_ready(&self) -> bool {
        self.runtime.is_ready()
    }

    fn recognize(&self, raw: &LandmarkSet) -> Result<PredictionResult> {
        let normalized = normalize(raw, self.canvas_size);
        let canvas = render(&normalized, self.canvas_size);
        let scores = self.runtime.predict(&canvas)?;
        let confidence = top_confidence(&scores);
        let trace = self.engine.explain(&scores, raw);

        debug!(
            g1 = trace.coarse.0,
            g2 = trace.coarse.1,
            rule = trace.rule.unwrap_or("none"),
            group = ?trace.group,
            letter = %trace.letter,
            confidence,
            "hand recognized"
        );
        Ok(PredictionResult::letter(trace.letter, confidence))
    }
}

/// Share of the total score held by the top group.
///
/// Scores that already sum to 1 pass through unchanged. A non-finite or
/// non-positive total gives 0.
pub fn top_confidence(scores: &GroupScores) -> f32 {
    let total: f32 = scores.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return 0.0;
    }
    let (g1, _) = top_two(scores);
    (scores[g1] / total).clamp(0.0, 1.0)
}
