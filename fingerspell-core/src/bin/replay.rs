//! Feed a recorded landmark stream through the engine and print every
//! prediction event as a JSON line.
//!
//! ```text
//! cargo run -p fingerspell-core --features replay --bin replay -- frames.json \
//!     [--config engine.json] [--model fingerspell_groups.onnx]
//! ```
//!
//! `frames.json` is an array of `{"tMs": 0, "landmarks": [{"x":..,"y":..,"z":..}, ..]}`.
//! Frames are submitted at their recorded offsets. Without the `onnx` feature
//! (or without `--model`) the fixed-score stub classifier is used.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use fingerspell_core::{
    ClassifierHandle, EngineConfig, FingerspellEngine, HandFrame, PredictionEvent,
    StubClassifier,
};
use tokio::sync::{broadcast, oneshot};
use tokio::time::Instant;
use tracing::{info, warn};

/// Extra time after the last frame for the final settle + inference.
const DRAIN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug)]
struct Args {
    frames: PathBuf,
    config: Option<PathBuf>,
    model: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut frames: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut model: Option<PathBuf> = None;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --config");
                };
                config = Some(PathBuf::from(v));
            }
            "--model" => {
                let Some(v) = it.next() else {
                    bail!("missing value for --model");
                };
                model = Some(PathBuf::from(v));
            }
            "--help" | "-h" => {
                println!(
                    "Usage: replay <frames.json> [--config <engine.json>] [--model <model.onnx>]"
                );
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown argument: {other}"),
            other => {
                if frames.is_some() {
                    bail!("unexpected extra argument: {other}");
                }
                frames = Some(PathBuf::from(other));
            }
        }
    }

    let Some(frames) = frames else {
        bail!("missing <frames.json>");
    };
    Ok(Args {
        frames,
        config,
        model,
    })
}

#[cfg(feature = "onnx")]
fn classifier(model: Option<PathBuf>) -> ClassifierHandle {
    use fingerspell_core::{OnnxClassifier, OnnxClassifierConfig};

    match model {
        Some(model_path) => {
            info!(model = ?model_path, "using ONNX group classifier");
            ClassifierHandle::new(OnnxClassifier::new(OnnxClassifierConfig { model_path }))
        }
        None => {
            info!("no --model given; using stub classifier");
            ClassifierHandle::new(StubClassifier::default())
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn classifier(model: Option<PathBuf>) -> ClassifierHandle {
    if model.is_some() {
        warn!("--model ignored: built without the 'onnx' feature; using stub classifier");
    }
    ClassifierHandle::new(StubClassifier::default())
}

fn print_event(event: &PredictionEvent) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    }
    .with_env_overrides();

    let raw = std::fs::read_to_string(&args.frames)
        .with_context(|| format!("reading frames {}", args.frames.display()))?;
    let mut frames: Vec<HandFrame> =
        serde_json::from_str(&raw).context("parsing recorded frames")?;
    frames.sort_by_key(|f| f.t_ms);
    info!(frames = frames.len(), "recording loaded");

    let engine = std::sync::Arc::new(FingerspellEngine::new(config, classifier(args.model)));
    engine.warm_up().await?;
    let mut rx = engine.subscribe_predictions();
    engine.start()?;

    let tail = Duration::from_millis(
        engine.config().settle_delay_ms + engine.config().throttle_interval_ms,
    ) + DRAIN_GRACE;
    let (done_tx, mut done_rx) = oneshot::channel::<()>();
    let feeder = {
        let engine = std::sync::Arc::clone(&engine);
        tokio::spawn(async move {
            let origin = Instant::now();
            for frame in &frames {
                tokio::time::sleep_until(origin + Duration::from_millis(frame.t_ms)).await;
                engine.submit_frame(&frame.landmarks);
            }
            tokio::time::sleep(tail).await;
            let _ = done_tx.send(());
        })
    };

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(event) => print_event(&event)?,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "output lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = &mut done_rx => break,
        }
    }
    feeder.await.context("frame feeder task failed")?;
    engine.stop()?;
    while let Ok(event) = rx.try_recv() {
        print_event(&event)?;
    }

    let diagnostics = engine.diagnostics_snapshot();
    eprintln!("{}", serde_json::to_string(&diagnostics)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    // ── Tracing ───────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fingerspell_core=info,replay=info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("replay failed: {e:#}");
        std::process::exit(1);
    }
}
