//! Frame-driven temporal stabilizer.
//!
//! ## States
//!
//! ```text
//!             hand frame                settle timer fires
//!   Idle ─────────────────► Tracking ───────────────────────► (in flight)
//!    ▲                        ▲  │ hand frame: re-arm timer         │
//!    │ no-hand frame          │  └──────────────┘                   │ publish
//!    │ or end_session         │ hand frame after throttle           ▼
//!    └────────────────────────┴───────────────────────────────── Emitting
//! ```
//!
//! * Every hand frame while a settle timer is pending re-arms it for
//!   `now + settle_delay`, capped at `first_arm + throttle_interval`. A burst
//!   shorter than the settle window is classified once, using its last frame;
//!   a continuous stream still gets one inference per throttle window.
//! * Frames arriving while an inference is in flight are dropped, never
//!   queued. Outside `Idle`, frames within `throttle_interval` of the last
//!   inference start are dropped too.
//! * A no-hand frame cancels the timer, clears the current prediction and
//!   moves to `Idle`.
//!
//! Each armed timer carries a token and each reset bumps a generation. A timer
//! only proceeds if its token is still the pending one; a finished inference
//! only publishes if its generation is still current. The in-flight flag is
//! set and cleared by the same task.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::ipc::events::PredictionEvent;
use crate::landmarks::{Landmark, LandmarkSet};
use crate::recognizer::{PredictionResult, SignRecognizer};

/// Timing and gating knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    /// Quiet period after the latest frame before classifying it.
    pub settle_delay: Duration,
    /// Minimum spacing between inference starts.
    pub throttle_interval: Duration,
    /// Results below this confidence are published as empty.
    pub confidence_floor: f32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(100),
            throttle_interval: Duration::from_millis(400),
            confidence_floor: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilizerPhase {
    /// No hand present.
    Idle,
    /// Hand present, settle timer armed or waiting for the throttle window.
    Tracking,
    /// A result was just published.
    Emitting,
}

/// Suppress letters whose confidence is below `floor`.
pub fn apply_confidence_floor(result: PredictionResult, floor: f32) -> PredictionResult {
    match result.character {
        Some(_) if result.confidence.is_finite() && result.confidence >= floor => result,
        _ => PredictionResult::empty(),
    }
}

#[derive(Default)]
pub struct StabilizerDiagnostics {
    pub frames_in: AtomicUsize,
    pub no_hand_frames: AtomicUsize,
    pub debounced: AtomicUsize,
    pub dropped_in_flight: AtomicUsize,
    pub throttled: AtomicUsize,
    pub not_ready: AtomicUsize,
    pub inference_calls: AtomicUsize,
    pub inference_errors: AtomicUsize,
    pub low_confidence: AtomicUsize,
    pub events_emitted: AtomicUsize,
}

impl StabilizerDiagnostics {
    pub fn reset(&self) {
        for counter in self.counters() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_in: self.frames_in.load(Ordering::Relaxed),
            no_hand_frames: self.no_hand_frames.load(Ordering::Relaxed),
            debounced: self.debounced.load(Ordering::Relaxed),
            dropped_in_flight: self.dropped_in_flight.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            not_ready: self.not_ready.load(Ordering::Relaxed),
            inference_calls: self.inference_calls.load(Ordering::Relaxed),
            inference_errors: self.inference_errors.load(Ordering::Relaxed),
            low_confidence: self.low_confidence.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
        }
    }

    fn counters(&self) -> [&AtomicUsize; 10] {
        [
            &self.frames_in,
            &self.no_hand_frames,
            &self.debounced,
            &self.dropped_in_flight,
            &self.throttled,
            &self.not_ready,
            &self.inference_calls,
            &self.inference_errors,
            &self.low_confidence,
            &self.events_emitted,
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub frames_in: usize,
    pub no_hand_frames: usize,
    pub debounced: usize,
    pub dropped_in_flight: usize,
    pub throttled: usize,
    pub not_ready: usize,
    pub inference_calls: usize,
    pub inference_errors: usize,
    pub low_confidence: usize,
    pub events_emitted: usize,
}

struct PendingSettle {
    token: u64,
    first_armed: Instant,
    landmarks: LandmarkSet,
    timer: JoinHandle<()>,
}

struct SessionState {
    active: bool,
    phase: StabilizerPhase,
    current: PredictionResult,
    last_emitted: Option<Instant>,
    last_inference: Option<Instant>,
    pending: Option<PendingSettle>,
    in_flight: bool,
    generation: u64,
    next_token: u64,
}

impl SessionState {
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Back to `Idle` with an empty prediction. Returns the phase left.
    fn reset(&mut self) -> StabilizerPhase {
        self.cancel_pending();
        self.generation += 1;
        self.current = PredictionResult::empty();
        self.last_inference = None;
        std::mem::replace(&mut self.phase, StabilizerPhase::Idle)
    }
}

struct Shared {
    config: StabilizerConfig,
    recognizer: Arc<dyn SignRecognizer>,
    state: Mutex<SessionState>,
    prediction_tx: broadcast::Sender<PredictionEvent>,
    seq: AtomicU64,
    diagnostics: Arc<StabilizerDiagnostics>,
}

/// Per-session stabilizer. Cheap to clone; clones share the session.
///
/// Must be driven from within a Tokio runtime: timers and inference are
/// spawned tasks.
#[derive(Clone)]
pub struct Stabilizer {
    shared: Arc<Shared>,
}

impl Stabilizer {
    pub fn new(
        config: StabilizerConfig,
        recognizer: Arc<dyn SignRecognizer>,
        prediction_tx: broadcast::Sender<PredictionEvent>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                recognizer,
                state: Mutex::new(SessionState {
                    active: false,
                    phase: StabilizerPhase::Idle,
                    current: PredictionResult::empty(),
                    last_emitted: None,
                    last_inference: None,
                    pending: None,
                    in_flight: false,
                    generation: 0,
                    next_token: 0,
                }),
                prediction_tx,
                seq: AtomicU64::new(0),
                diagnostics: Arc::new(StabilizerDiagnostics::default()),
            }),
        }
    }

    /// Begin accepting frames.
    pub fn start_session(&self) {
        let mut state = self.shared.state.lock();
        state.reset();
        state.active = true;
    }

    /// Stop accepting frames. Cancels the pending timer before returning; an
    /// inference already in flight finishes but does not publish.
    pub fn end_session(&self) {
        let mut state = self.shared.state.lock();
        state.active = false;
        state.reset();
    }

    pub fn phase(&self) -> StabilizerPhase {
        self.shared.state.lock().phase
    }

    /// The most recently published result (empty after a reset).
    pub fn current(&self) -> PredictionResult {
        self.shared.state.lock().current
    }

    /// When the last result was published.
    pub fn last_emitted(&self) -> Option<Instant> {
        self.shared.state.lock().last_emitted
    }

    pub fn diagnostics(&self) -> Arc<StabilizerDiagnostics> {
        Arc::clone(&self.shared.diagnostics)
    }

    /// Feed one detector frame. Never blocks on inference.
    ///
    /// Anything but exactly 21 landmarks counts as "no hand".
    pub fn on_frame(&self, landmarks: &[Landmark]) {
        let diag = &self.shared.diagnostics;
        diag.frames_in.fetch_add(1, Ordering::Relaxed);

        let hand = match LandmarkSet::from_slice(landmarks) {
            Ok(hand) => hand,
            Err(e) => {
                if !landmarks.is_empty() {
                    debug!(error = %e, "incomplete hand treated as no hand");
                }
                self.on_no_hand();
                return;
            }
        };

        let mut state = self.shared.state.lock();
        if !state.active {
            return;
        }
        if state.in_flight {
            diag.dropped_in_flight.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let now = Instant::now();
        let first_armed = match state.pending.as_mut() {
            Some(pending) => {
                diag.debounced.fetch_add(1, Ordering::Relaxed);
                pending.timer.abort();
                pending.first_armed
            }
            None => {
                let throttled = state.phase != StabilizerPhase::Idle
                    && state
                        .last_inference
                        .is_some_and(|t| now.duration_since(t) < self.shared.config.throttle_interval);
                if throttled {
                    diag.throttled.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                now
            }
        };

        let cap = first_armed + self.shared.config.throttle_interval;
        let deadline = (now + self.shared.config.settle_delay).min(cap).max(now);
        let token = state.next_token;
        state.next_token += 1;

        let shared = Arc::clone(&self.shared);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            shared.fire(token).await;
        });

        state.pending = Some(PendingSettle {
            token,
            first_armed,
            landmarks: hand,
            timer,
        });
        state.phase = StabilizerPhase::Tracking;
    }

    fn on_no_hand(&self) {
        let mut state = self.shared.state.lock();
        if !state.active {
            return;
        }
        self.shared
            .diagnostics
            .no_hand_frames
            .fetch_add(1, Ordering::Relaxed);
        let left = state.reset();
        if left != StabilizerPhase::Idle {
            debug!(from = ?left, "hand lost");
            self.shared.publish(&PredictionResult::empty());
        }
    }
}

impl Shared {
    async fn fire(self: Arc<Self>, token: u64) {
        let (hand, generation) = {
            let mut state = self.state.lock();
            if state.pending.as_ref().map(|p| p.token) != Some(token) {
                return;
            }
            if !self.recognizer.is_ready() {
                state.pending = None;
                self.diagnostics.not_ready.fetch_add(1, Ordering::Relaxed);
                warn!("settle timer fired before the classifier was ready; skipping");
                return;
            }
            let Some(pending) = state.pending.take() else {
                return;
            };
            state.in_flight = true;
            state.last_inference = Some(Instant::now());
            (pending.landmarks, state.generation)
        };

        self.diagnostics
            .inference_calls
            .fetch_add(1, Ordering::Relaxed);
        let recognizer = Arc::clone(&self.recognizer);
        let result = match tokio::task::spawn_blocking(move || recognizer.recognize(&hand)).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                self.diagnostics
                    .inference_errors
                    .fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "recognition failed; publishing empty result");
                PredictionResult::empty()
            }
            Err(e) => {
                self.diagnostics
                    .inference_errors
                    .fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "recognition task panicked; publishing empty result");
                PredictionResult::empty()
            }
        };

        let gated = apply_confidence_floor(result, self.config.confidence_floor);
        if !result.is_empty() && gated.is_empty() {
            self.diagnostics
                .low_confidence
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                character = ?result.character,
                confidence = result.confidence,
                floor = self.config.confidence_floor,
                "low-confidence result suppressed"
            );
        }

        let mut state = self.state.lock();
        state.in_flight = false;
        if state.generation != generation {
            debug!("session reset during inference; result discarded");
            return;
        }
        state.current = gated;
        state.phase = StabilizerPhase::Emitting;
        state.last_emitted = Some(Instant::now());
        self.publish(&gated);
    }

    /// Caller holds the state lock, so events leave in timer order.
    fn publish(&self, result: &PredictionResult) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let event = PredictionEvent::new(seq, result);
        let delivered = self.prediction_tx.send(event).is_ok();
        self.diagnostics
            .events_emitted
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            seq,
            character = ?result.character,
            confidence = result.confidence,
            delivered,
            "prediction published"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FingerspellError, Result};
    use crate::landmarks::{fixtures::open_palm, WRIST};
    use std::collections::VecDeque;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::{sleep, timeout};

    /// Replays queued results, then a fixed default. Records every hand.
    struct ScriptedRecognizer {
        ready: bool,
        script: Mutex<VecDeque<Result<PredictionResult>>>,
        fallback: PredictionResult,
        seen: Mutex<Vec<LandmarkSet>>,
        gate: Option<Mutex<std::sync::mpsc::Receiver<()>>>,
    }

    impl ScriptedRecognizer {
        fn new(fallback: PredictionResult) -> Self {
            Self {
                ready: true,
                script: Mutex::new(VecDeque::new()),
                fallback,
                seen: Mutex::new(Vec::new()),
                gate: None,
            }
        }

        fn then(self, next: Result<PredictionResult>) -> Self {
            self.script.lock().push_back(next);
            self
        }

        fn calls(&self) -> usize {
            self.seen.lock().len()
        }

        fn marker_of_call(&self, i: usize) -> f32 {
            self.seen.lock()[i][WRIST].x
        }
    }

    impl SignRecognizer for ScriptedRecognizer {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn recognize(&self, raw: &LandmarkSet) -> Result<PredictionResult> {
            self.seen.lock().push(*raw);
            if let Some(gate) = &self.gate {
                let _ = gate.lock().recv();
            }
            self.script.lock().pop_front().unwrap_or(Ok(self.fallback))
        }
    }

    /// An open palm whose wrist x identifies the frame.
    fn hand(marker: f32) -> Vec<Landmark> {
        let mut points = open_palm().points().to_vec();
        points[WRIST].x = marker;
        points
    }

    fn setup(
        config: StabilizerConfig,
        recognizer: ScriptedRecognizer,
    ) -> (
        Stabilizer,
        Arc<ScriptedRecognizer>,
        broadcast::Receiver<PredictionEvent>,
    ) {
        let recognizer = Arc::new(recognizer);
        let (tx, rx) = broadcast::channel(64);
        let stabilizer = Stabilizer::new(config, recognizer.clone(), tx);
        stabilizer.start_session();
        (stabilizer, recognizer, rx)
    }

    async fn next_event(rx: &mut broadcast::Receiver<PredictionEvent>) -> PredictionEvent {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for prediction")
            .expect("prediction channel closed")
    }

    async fn assert_quiet(rx: &mut broadcast::Receiver<PredictionEvent>, wait: Duration) {
        if let Ok(event) = timeout(wait, rx.recv()).await {
            panic!("expected no event, got {event:?}");
        }
    }

    #[test]
    fn confidence_floor_gates_letters() {
        let floor = 0.3;
        assert!(apply_confidence_floor(PredictionResult::letter('A', 0.29), floor).is_empty());
        assert_eq!(
            apply_confidence_floor(PredictionResult::letter('A', 0.31), floor),
            PredictionResult::letter('A', 0.31)
        );
        assert_eq!(
            apply_confidence_floor(PredictionResult::letter('A', 0.3), floor),
            PredictionResult::letter('A', 0.3)
        );
        assert!(apply_confidence_floor(PredictionResult::letter('A', f32::NAN), floor).is_empty());
        assert_eq!(
            apply_confidence_floor(PredictionResult::empty(), floor),
            PredictionResult::empty()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn burst_within_settle_window_classifies_last_frame_once() {
        let (stab, rec, mut rx) = setup(
            StabilizerConfig::default(),
            ScriptedRecognizer::new(PredictionResult::letter('B', 0.9)),
        );

        for i in 0..5 {
            stab.on_frame(&hand(100.0 + i as f32));
            sleep(Duration::from_millis(10)).await;
        }

        let event = next_event(&mut rx).await;
        assert_eq!(event.character, "B");
        assert_eq!(event.seq, 0);
        assert_eq!(rec.calls(), 1);
        assert_eq!(rec.marker_of_call(0), 104.0);
        assert_eq!(stab.phase(), StabilizerPhase::Emitting);
        assert_eq!(stab.current(), PredictionResult::letter('B', 0.9));

        assert_quiet(&mut rx, Duration::from_secs(2)).await;
        let diag = stab.diagnostics().snapshot();
        assert_eq!(diag.inference_calls, 1);
        assert_eq!(diag.debounced, 4);
        assert_eq!(diag.events_emitted, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn low_confidence_is_published_empty() {
        let (stab, _rec, mut rx) = setup(
            StabilizerConfig::default(),
            ScriptedRecognizer::new(PredictionResult::letter('C', 0.31))
                .then(Ok(PredictionResult::letter('O', 0.29))),
        );

        stab.on_frame(&hand(1.0));
        let suppressed = next_event(&mut rx).await;
        assert_eq!(suppressed.character, "");
        assert_eq!(suppressed.confidence, 0.0);
        assert!(stab.current().is_empty());

        sleep(Duration::from_millis(500)).await;
        stab.on_frame(&hand(2.0));
        let passed = next_event(&mut rx).await;
        assert_eq!(passed.character, "C");
        assert!((passed.confidence - 0.31).abs() < 1e-6);
        assert_eq!(stab.diagnostics().snapshot().low_confidence, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn no_hand_frame_cancels_pending_timer() {
        let (stab, rec, mut rx) = setup(
            StabilizerConfig::default(),
            ScriptedRecognizer::new(PredictionResult::letter('B', 0.9)),
        );

        stab.on_frame(&hand(1.0));
        sleep(Duration::from_millis(50)).await;
        stab.on_frame(&[]);
        assert_eq!(stab.phase(), StabilizerPhase::Idle);

        let cleared = next_event(&mut rx).await;
        assert!(cleared.is_empty());
        assert_quiet(&mut rx, Duration::from_secs(2)).await;
        assert_eq!(rec.calls(), 0);

        // Further no-hand frames stay silent.
        stab.on_frame(&[]);
        stab.on_frame(&hand(1.0)[..20]);
        assert_quiet(&mut rx, Duration::from_millis(500)).await;
        assert_eq!(stab.diagnostics().snapshot().no_hand_frames, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn end_session_cancels_and_ignores_later_frames() {
        let (stab, rec, mut rx) = setup(
            StabilizerConfig::default(),
            ScriptedRecognizer::new(PredictionResult::letter('B', 0.9)),
        );

        stab.on_frame(&hand(1.0));
        stab.end_session();
        assert_eq!(stab.phase(), StabilizerPhase::Idle);
        stab.on_frame(&hand(2.0));

        assert_quiet(&mut rx, Duration::from_secs(2)).await;
        assert_eq!(rec.calls(), 0);

        stab.start_session();
        stab.on_frame(&hand(3.0));
        assert_eq!(next_event(&mut rx).await.character, "B");
        assert_eq!(rec.marker_of_call(0), 3.0);
    }

    #[tokio::test(start_paused = true)]
    async fn continuous_stream_is_throttled_to_one_inference_per_window() {
        let (stab, rec, mut rx) = setup(
            StabilizerConfig::default(),
            ScriptedRecognizer::new(PredictionResult::letter('W', 0.8)),
        );

        // ~30 fps for 1.3 s: inferences at 400 ms and 1225 ms.
        let mut t = 0;
        while t < 1_300 {
            stab.on_frame(&hand(t as f32));
            sleep(Duration::from_millis(33)).await;
            t += 33;
        }
        sleep(Duration::from_secs(2)).await;

        assert_eq!(rec.calls(), 2);
        assert_eq!(rec.marker_of_call(0), 396.0);
        assert_eq!(rec.marker_of_call(1), 1_221.0);

        let mut events = 0;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    assert_eq!(event.character, "W");
                    events += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(e) => panic!("unexpected channel state: {e}"),
            }
        }
        assert_eq!(events, 2);
        assert!(stab.diagnostics().snapshot().throttled > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recognition_error_publishes_empty_and_releases_guard() {
        let (stab, rec, mut rx) = setup(
            StabilizerConfig::default(),
            ScriptedRecognizer::new(PredictionResult::letter('L', 0.95))
                .then(Err(FingerspellError::Inference("device lost".into()))),
        );

        stab.on_frame(&hand(1.0));
        assert!(next_event(&mut rx).await.is_empty());

        sleep(Duration::from_millis(500)).await;
        stab.on_frame(&hand(2.0));
        assert_eq!(next_event(&mut rx).await.character, "L");
        assert_eq!(rec.calls(), 2);
        assert_eq!(stab.diagnostics().snapshot().inference_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn classifier_is_not_invoked_before_ready() {
        let mut scripted = ScriptedRecognizer::new(PredictionResult::letter('B', 0.9));
        scripted.ready = false;
        let (stab, rec, mut rx) = setup(StabilizerConfig::default(), scripted);

        stab.on_frame(&hand(1.0));
        assert_quiet(&mut rx, Duration::from_secs(1)).await;
        assert_eq!(rec.calls(), 0);
        assert_eq!(stab.diagnostics().snapshot().not_ready, 1);
    }

    fn gated(fallback: PredictionResult) -> (ScriptedRecognizer, std::sync::mpsc::Sender<()>) {
        let (release, gate) = std::sync::mpsc::channel();
        let mut scripted = ScriptedRecognizer::new(fallback);
        scripted.gate = Some(Mutex::new(gate));
        (scripted, release)
    }

    async fn wait_for_calls(rec: &ScriptedRecognizer, n: usize) {
        timeout(Duration::from_secs(5), async {
            while rec.calls() < n {
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("recognizer was not called");
    }

    #[tokio::test]
    async fn frames_during_inference_are_dropped() {
        let config = StabilizerConfig {
            settle_delay: Duration::from_millis(5),
            throttle_interval: Duration::ZERO,
            confidence_floor: 0.3,
        };
        let (scripted, release) = gated(PredictionResult::letter('I', 0.7));
        let (stab, rec, mut rx) = setup(config, scripted);

        stab.on_frame(&hand(1.0));
        wait_for_calls(&rec, 1).await;

        stab.on_frame(&hand(2.0));
        stab.on_frame(&hand(3.0));
        assert_eq!(stab.diagnostics().snapshot().dropped_in_flight, 2);

        release.send(()).expect("release first inference");
        assert_eq!(next_event(&mut rx).await.character, "I");

        stab.on_frame(&hand(4.0));
        wait_for_calls(&rec, 2).await;
        release.send(()).expect("release second inference");
        assert_eq!(next_event(&mut rx).await.character, "I");
        assert_eq!(rec.marker_of_call(1), 4.0);
    }

    #[tokio::test]
    async fn result_of_reset_session_is_discarded() {
        let config = StabilizerConfig {
            settle_delay: Duration::from_millis(5),
            ..StabilizerConfig::default()
        };
        let (scripted, release) = gated(PredictionResult::letter('K', 0.9));
        let (stab, rec, mut rx) = setup(config, scripted);

        stab.on_frame(&hand(1.0));
        wait_for_calls(&rec, 1).await;

        stab.on_frame(&[]);
        assert!(next_event(&mut rx).await.is_empty());

        release.send(()).expect("release inference");
        assert_quiet(&mut rx, Duration::from_millis(200)).await;
        assert!(stab.current().is_empty());
        assert_eq!(stab.phase(), StabilizerPhase::Idle);

        // The guard was released: a new hand is classified again.
        stab.on_frame(&hand(2.0));
        wait_for_calls(&rec, 2).await;
        release.send(()).expect("release second inference");
        assert_eq!(next_event(&mut rx).await.character, "K");
    }
}
