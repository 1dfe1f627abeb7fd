//! Group classifier abstraction.
//!
//! The `GroupClassifier` trait decouples recognition from any specific model
//! backend (fixed-score stub, ONNX graph, etc.). The core only relies on the
//! contract: a 400×400×3 canvas in, eight group scores out.
//!
//! `&mut self` on `predict` reflects that inference sessions are stateful
//! (`ort::Session::run` needs exclusive access). All calls are serialised
//! through `ClassifierHandle`'s `parking_lot::Mutex`; [`ClassifierRuntime`]
//! adds the load lifecycle on top.

pub mod group;
pub mod lifecycle;
pub mod stub;

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::{OnnxClassifier, OnnxClassifierConfig};

pub use group::{ClassificationGroup, GroupScores, GROUP_COUNT};
pub use lifecycle::{ClassifierRuntime, LoadStatus};
pub use stub::StubClassifier;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::render::Canvas;

/// Contract for group classifier backends.
pub trait GroupClassifier: Send + 'static {
    /// One-time load: read model assets, build the session, optionally run a
    /// dummy inference. Blocking; the runtime calls it off the async executor.
    ///
    /// # Errors
    /// Returns an error if asset files are missing or corrupt.
    fn warm_up(&mut self) -> Result<()>;

    /// Score a rendered hand canvas.
    ///
    /// Implementations resize the canvas if their input resolution differs.
    /// Scores should sum to 1; callers treat them as relative otherwise.
    fn predict(&mut self, canvas: &Canvas) -> Result<GroupScores>;
}

/// Thread-safe reference-counted handle to any `GroupClassifier` implementor.
///
/// Uses `parking_lot::Mutex` for non-poisoning on panic (unlike
/// `std::sync::Mutex`): a panicking backend must not wedge later frames.
#[derive(Clone)]
pub struct ClassifierHandle(pub Arc<Mutex<dyn GroupClassifier>>);

impl ClassifierHandle {
    /// Wrap any `GroupClassifier` in a `ClassifierHandle`.
    pub fn new<C: GroupClassifier>(classifier: C) -> Self {
        Self(Arc::new(Mutex::new(classifier)))
    }
}

impl std::fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierHandle").finish_non_exhaustive()
    }
}
