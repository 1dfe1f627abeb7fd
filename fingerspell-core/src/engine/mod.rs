//! `FingerspellEngine`: top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! FingerspellEngine::new()
//!     └─► warm_up().await    → classifier loaded, status = WarmingUp → Idle
//!         └─► start()        → session open, status = Detecting
//!             └─► stop()     → timer cancelled, status = Stopped
//! ```
//!
//! `start()`/`stop()` are idempotent: calling them in the wrong state returns
//! an error rather than panicking. Frames submitted outside a session are
//! ignored.
//!
//! ## Threading
//!
//! `submit_frame` only takes a short lock and may spawn a timer task; all
//! rendering and inference happen on the blocking pool. The engine therefore
//! has to live inside a Tokio runtime.

pub mod stabilizer;

use std::path::Path;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    classifier::{ClassifierHandle, ClassifierRuntime},
    disambiguation::{DisambiguationEngine, DisambiguationThresholds},
    error::{FingerspellError, Result},
    ipc::events::{EngineStatus, EngineStatusEvent, PredictionEvent},
    landmarks::Landmark,
    recognizer::{PredictionResult, Recognizer},
    render::CLASSIFIER_INPUT_SIZE,
};

use stabilizer::{DiagnosticsSnapshot, Stabilizer, StabilizerConfig, StabilizerPhase};

/// Default broadcast channel capacity: 256 events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

/// Configuration for `FingerspellEngine`.
///
/// Every field has a default, so a partial JSON file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Side of the square skeleton canvas (px). Default: 400.
    pub canvas_size: u32,
    /// Quiet period after the last frame before inference (ms). Default: 100.
    pub settle_delay_ms: u64,
    /// Minimum spacing between inferences (ms). Default: 400.
    pub throttle_interval_ms: u64,
    /// Letters below this confidence are published as empty. Default: 0.3.
    pub confidence_floor: f32,
    /// Capacity of the prediction and status broadcast channels. Default: 256.
    pub event_capacity: usize,
    /// Geometric thresholds for group correction and letter resolution.
    pub thresholds: DisambiguationThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_size: CLASSIFIER_INPUT_SIZE,
            settle_delay_ms: 100,
            throttle_interval_ms: 400,
            confidence_floor: 0.3,
            event_capacity: BROADCAST_CAP,
            thresholds: DisambiguationThresholds::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. The result is already normalized.
    ///
    /// # Errors
    /// `Io` if the file cannot be read, `Config` if it is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&raw)
            .map_err(|e| FingerspellError::Config(format!("{}: {e}", path.display())))?;
        config.normalize();
        Ok(config)
    }

    /// Clamp every field into a usable range.
    pub fn normalize(&mut self) {
        self.canvas_size = self.canvas_size.clamp(64, 2048);
        self.settle_delay_ms = self.settle_delay_ms.min(2_000);
        self.throttle_interval_ms = self.throttle_interval_ms.min(10_000);
        self.confidence_floor = if self.confidence_floor.is_finite() {
            self.confidence_floor.clamp(0.0, 1.0)
        } else {
            Self::default().confidence_floor
        };
        self.event_capacity = self.event_capacity.clamp(1, 4_096);
        self.thresholds.normalize();
    }

    /// Apply `FINGERSPELL_*` environment overrides, then normalize.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `FINGERSPELL_SETTLE_MS` | `settle_delay_ms` |
    /// | `FINGERSPELL_THROTTLE_MS` | `throttle_interval_ms` |
    /// | `FINGERSPELL_CONFIDENCE_FLOOR` | `confidence_floor` |
    /// | `FINGERSPELL_CANVAS_SIZE` | `canvas_size` |
    ///
    /// Unparseable values are logged and ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = parse_override(&lookup, "FINGERSPELL_SETTLE_MS") {
            self.settle_delay_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "FINGERSPELL_THROTTLE_MS") {
            self.throttle_interval_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "FINGERSPELL_CONFIDENCE_FLOOR") {
            self.confidence_floor = v;
        }
        if let Some(v) = parse_override(&lookup, "FINGERSPELL_CANVAS_SIZE") {
            self.canvas_size = v;
        }
        self.normalize();
        self
    }

    pub fn stabilizer_config(&self) -> StabilizerConfig {
        StabilizerConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            throttle_interval: Duration::from_millis(self.throttle_interval_ms),
            confidence_floor: self.confidence_floor,
        }
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = trimmed, "ignoring unparseable env override");
            None
        }
    }
}

/// The top-level engine handle.
///
/// `FingerspellEngine` is `Send + Sync`; all fields use interior mutability.
/// Wrap in `Arc<FingerspellEngine>` to share between a host and
/// event-forwarding tasks.
pub struct FingerspellEngine {
    config: EngineConfig,
    runtime: ClassifierRuntime,
    stabilizer: Stabilizer,
    /// `true` while a detection session is open.
    running: AtomicBool,
    status: Mutex<EngineStatus>,
    prediction_tx: broadcast::Sender<PredictionEvent>,
    status_tx: broadcast::Sender<EngineStatusEvent>,
}

impl FingerspellEngine {
    /// Create a new engine. Loads nothing; call `warm_up()` then `start()`.
    pub fn new(mut config: EngineConfig, classifier: ClassifierHandle) -> Self {
        config.normalize();
        let (prediction_tx, _) = broadcast::channel(config.event_capacity);
        let (status_tx, _) = broadcast::channel(config.event_capacity);

        let runtime = ClassifierRuntime::new(classifier);
        let recognizer = Recognizer::new(
            runtime.clone(),
            DisambiguationEngine::new(config.thresholds),
            config.canvas_size,
        );
        let stabilizer = Stabilizer::new(
            config.stabilizer_config(),
            Arc::new(recognizer),
            prediction_tx.clone(),
        );

        Self {
            config,
            runtime,
            stabilizer,
            running: AtomicBool::new(false),
            status: Mutex::new(EngineStatus::Idle),
            prediction_tx,
            status_tx,
        }
    }

    /// Load the classifier. Concurrent calls share one load.
    ///
    /// A previous failure is retried; a ready classifier returns immediately.
    ///
    /// # Errors
    /// `AssetLoad` if the classifier could not be loaded. Status becomes
    /// `Error` with the message as detail.
    pub async fn warm_up(&self) -> Result<()> {
        if self.runtime.is_ready() {
            return Ok(());
        }
        self.set_status(EngineStatus::WarmingUp, None);
        info!(canvas_size = self.config.canvas_size, "warming up classifier");

        // reload() joins a live load and retries a failed or abandoned one.
        match self.runtime.reload().await {
            Ok(()) => {
                self.set_status(EngineStatus::Idle, None);
                info!(attempts = self.runtime.load_attempts(), "classifier ready");
                Ok(())
            }
            Err(e) => {
                self.set_status(EngineStatus::Error, Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Open a detection session.
    ///
    /// # Errors
    /// - `FingerspellError::NotReady` if the classifier has not loaded.
    /// - `FingerspellError::AlreadyRunning` if a session is open.
    pub fn start(&self) -> Result<()> {
        if !self.runtime.is_ready() {
            return Err(FingerspellError::NotReady);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(FingerspellError::AlreadyRunning);
        }

        self.stabilizer.diagnostics().reset();
        self.stabilizer.start_session();
        self.set_status(EngineStatus::Detecting, None);
        info!(
            settle_delay_ms = self.config.settle_delay_ms,
            throttle_interval_ms = self.config.throttle_interval_ms,
            confidence_floor = self.config.confidence_floor,
            "engine started, detecting"
        );
        Ok(())
    }

    /// Close the session. The pending timer is cancelled before this returns;
    /// nothing from the closed session is published afterwards.
    ///
    /// # Errors
    /// - `FingerspellError::NotRunning` if no session is open.
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(FingerspellError::NotRunning);
        }

        self.stabilizer.end_session();
        self.set_status(EngineStatus::Stopped, None);
        log_diagnostics(&self.stabilizer.diagnostics().snapshot());
        Ok(())
    }

    /// Feed one detector frame: 21 landmarks, or an empty slice for "no hand".
    pub fn submit_frame(&self, landmarks: &[Landmark]) {
        self.stabilizer.on_frame(landmarks);
    }

    /// The most recently published prediction (empty when idle).
    pub fn current_prediction(&self) -> PredictionResult {
        self.stabilizer.current()
    }

    pub fn phase(&self) -> StabilizerPhase {
        self.stabilizer.phase()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &ClassifierRuntime {
        &self.runtime
    }

    /// Subscribe to stabilized prediction events.
    pub fn subscribe_predictions(&self) -> broadcast::Receiver<PredictionEvent> {
        self.prediction_tx.subscribe()
    }

    /// Subscribe to live status change events.
    pub fn subscribe_status(&self) -> broadcast::Receiver<EngineStatusEvent> {
        self.status_tx.subscribe()
    }

    /// Snapshot of stabilizer counters for observability.
    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.stabilizer.diagnostics().snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    fn set_status(&self, new_status: EngineStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(EngineStatusEvent {
            status: new_status,
            detail,
        });
    }
}

fn log_diagnostics(snap: &DiagnosticsSnapshot) {
    info!(
        frames_in = snap.frames_in,
        no_hand_frames = snap.no_hand_frames,
        debounced = snap.debounced,
        dropped_in_flight = snap.dropped_in_flight,
        throttled = snap.throttled,
        not_ready = snap.not_ready,
        inference_calls = snap.inference_calls,
        inference_errors = snap.inference_errors,
        low_confidence = snap.low_confidence,
        events_emitted = snap.events_emitted,
        "engine stopped; diagnostics"
    );
}
