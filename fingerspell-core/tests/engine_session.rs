use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use fingerspell_core::render::Canvas;
use fingerspell_core::{
    ClassifierHandle, EngineConfig, EngineStatus, FingerspellEngine, GroupClassifier,
    GroupScores, HandFrame, Landmark, PredictionEvent, Result, StabilizerPhase,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

/// Returns whatever scores the test last set.
struct SharedScores(Arc<Mutex<GroupScores>>);

impl GroupClassifier for SharedScores {
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    fn predict(&mut self, _canvas: &Canvas) -> Result<GroupScores> {
        Ok(*self.0.lock())
    }
}

const FIST_VOTE: GroupScores = [0.1, 0.05, 0.25, 0.03, 0.03, 0.5, 0.02, 0.02];
const L_VOTE: GroupScores = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];

/// Upright open palm in a 640×480 frame, thumb out to the left.
fn open_palm() -> Vec<Landmark> {
    [
        (300.0, 400.0),
        (260.0, 380.0),
        (235.0, 350.0),
        (220.0, 320.0),
        (210.0, 295.0),
        (265.0, 300.0),
        (260.0, 250.0),
        (258.0, 220.0),
        (256.0, 195.0),
        (295.0, 295.0),
        (295.0, 240.0),
        (295.0, 210.0),
        (295.0, 180.0),
        (325.0, 300.0),
        (328.0, 250.0),
        (330.0, 222.0),
        (332.0, 198.0),
        (352.0, 310.0),
        (358.0, 270.0),
        (362.0, 248.0),
        (365.0, 228.0),
    ]
    .into_iter()
    .map(|(x, y)| Landmark::new(x, y, 0.0))
    .collect()
}

async fn started_engine(scores: GroupScores) -> (FingerspellEngine, Arc<Mutex<GroupScores>>) {
    let shared = Arc::new(Mutex::new(scores));
    let engine = FingerspellEngine::new(
        EngineConfig::default(),
        ClassifierHandle::new(SharedScores(Arc::clone(&shared))),
    );
    engine.warm_up().await.expect("warm up");
    engine.start().expect("start");
    (engine, shared)
}

async fn next_event(rx: &mut broadcast::Receiver<PredictionEvent>) -> PredictionEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("prediction within timeout")
        .expect("channel open")
}

async fn assert_quiet(rx: &mut broadcast::Receiver<PredictionEvent>, window: Duration) {
    if let Ok(event) = timeout(window, rx.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn open_palm_with_fist_votes_spells_a_then_clears_on_hand_loss() {
    let (engine, _) = started_engine(FIST_VOTE).await;
    let mut rx = engine.subscribe_predictions();

    engine.submit_frame(&open_palm());
    let event = next_event(&mut rx).await;
    assert_eq!(event.character, "A");
    assert_relative_eq!(event.confidence, 0.5, epsilon = 1e-6);
    assert_eq!(engine.current_prediction().character, Some('A'));

    engine.submit_frame(&[]);
    let cleared = next_event(&mut rx).await;
    assert!(cleared.is_empty());
    assert_eq!(cleared.confidence, 0.0);
    assert!(cleared.seq > event.seq);
    assert_eq!(engine.phase(), StabilizerPhase::Idle);
    assert!(engine.current_prediction().is_empty());
}

#[tokio::test(start_paused = true)]
async fn burst_of_frames_yields_one_event() {
    let (engine, _) = started_engine(FIST_VOTE).await;
    let mut rx = engine.subscribe_predictions();

    for _ in 0..5 {
        engine.submit_frame(&open_palm());
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(next_event(&mut rx).await.character, "A");
    assert_quiet(&mut rx, Duration::from_secs(2)).await;

    let diag = engine.diagnostics_snapshot();
    assert_eq!(diag.inference_calls, 1);
    assert_eq!(diag.debounced, 4);
    assert_eq!(diag.events_emitted, 1);
}

#[tokio::test(start_paused = true)]
async fn letter_follows_the_classifier_between_windows() {
    let (engine, scores) = started_engine(FIST_VOTE).await;
    let mut rx = engine.subscribe_predictions();

    engine.submit_frame(&open_palm());
    assert_eq!(next_event(&mut rx).await.character, "A");

    *scores.lock() = L_VOTE;
    sleep(Duration::from_millis(500)).await;
    engine.submit_frame(&open_palm());
    let event = next_event(&mut rx).await;
    assert_eq!(event.character, "L");
    assert_relative_eq!(event.confidence, 1.0, epsilon = 1e-6);
}

#[tokio::test(start_paused = true)]
async fn stop_before_settle_publishes_nothing() {
    let (engine, _) = started_engine(FIST_VOTE).await;
    let mut rx = engine.subscribe_predictions();
    let mut status_rx = engine.subscribe_status();

    engine.submit_frame(&open_palm());
    engine.stop().expect("stop");
    assert_eq!(
        status_rx.recv().await.expect("status event").status,
        EngineStatus::Stopped
    );

    assert_quiet(&mut rx, Duration::from_secs(2)).await;
    assert_eq!(engine.diagnostics_snapshot().inference_calls, 0);

    // Frames after stop are ignored.
    engine.submit_frame(&open_palm());
    assert_quiet(&mut rx, Duration::from_secs(1)).await;
}

#[tokio::test(start_paused = true)]
async fn recorded_frames_drive_the_engine() {
    let palm = serde_json::to_value(open_palm()).expect("serialize landmarks");
    let recording = serde_json::json!([
        { "tMs": 0, "landmarks": palm },
        { "tMs": 33, "landmarks": palm },
        { "tMs": 66 },
    ]);
    let frames: Vec<HandFrame> = serde_json::from_value(recording).expect("parse recording");
    assert_eq!(frames.len(), 3);
    assert!(frames[2].landmarks.is_empty());

    let (engine, _) = started_engine(FIST_VOTE).await;
    let mut rx = engine.subscribe_predictions();

    // Two hand frames then a dropout before the settle window closes: the
    // pending inference is cancelled and nothing was ever published.
    engine.submit_frame(&frames[0].landmarks);
    sleep(Duration::from_millis(33)).await;
    engine.submit_frame(&frames[1].landmarks);
    sleep(Duration::from_millis(33)).await;
    engine.submit_frame(&frames[2].landmarks);

    let cleared = next_event(&mut rx).await;
    assert!(cleared.is_empty());
    assert_quiet(&mut rx, Duration::from_secs(1)).await;

    let diag = engine.diagnostics_snapshot();
    assert_eq!(diag.frames_in, 3);
    assert_eq!(diag.no_hand_frames, 1);
    assert_eq!(diag.inference_calls, 0);
}
