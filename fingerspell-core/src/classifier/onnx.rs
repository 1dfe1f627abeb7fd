//! Group classifier ONNX backend via the `ort` crate.
//!
//! ## Model I/O
//!
//! | Name      | Shape             | DType | Direction |
//! |-----------|-------------------|-------|-----------|
//! | input #0  | `[1, 400, 400, 3]`| f32   | in        |
//! | output #0 | `[1, 8]`          | f32   | out       |
//!
//! The input is the rendered skeleton canvas in NHWC order, channels scaled
//! to `[0, 1]`. The output is one probability per `ClassificationGroup`, in
//! group order. Tensor names are read from the graph, so any export that
//! keeps this shape works.

use std::path::{Path, PathBuf};

use ndarray::Array4;
use ort::session::{Session, SessionInputValue};
use ort::value::Value;
use ort::{
    ep,
    session::builder::{GraphOptimizationLevel, SessionBuilder},
};
use tracing::{info, warn};

use crate::classifier::{GroupClassifier, GroupScores, GROUP_COUNT};
use crate::error::{FingerspellError, Result};
use crate::render::{canvas_to_input, Canvas, CLASSIFIER_INPUT_SIZE};

/// File name of the group classifier inside the models directory.
pub const MODEL_FILE_NAME: &str = "fingerspell_groups.onnx";

/// Configuration for `OnnxClassifier`.
#[derive(Debug, Clone)]
pub struct OnnxClassifierConfig {
    /// Path to the `.onnx` graph.
    pub model_path: PathBuf,
}

impl Default for OnnxClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: selected_models_dir().join(MODEL_FILE_NAME),
        }
    }
}

fn selected_models_dir() -> PathBuf {
    if let Ok(explicit) = std::env::var("FINGERSPELL_MODEL_DIR") {
        if !explicit.trim().is_empty() {
            return PathBuf::from(explicit.trim());
        }
    }
    default_models_dir()
}

/// Platform data directory for downloaded models.
pub fn default_models_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(|p| PathBuf::from(p).join("Fingerspell").join("models"))
            .unwrap_or_else(|| PathBuf::from("models"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("fingerspell")
            .join("models")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrtExecutionPreference {
    Auto,
    Cpu,
    DirectML,
}

fn ort_execution_preference() -> OrtExecutionPreference {
    match std::env::var("FINGERSPELL_ORT_EP")
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
        .as_str()
    {
        "cpu" => OrtExecutionPreference::Cpu,
        "dml" | "directml" => OrtExecutionPreference::DirectML,
        _ => OrtExecutionPreference::Auto,
    }
}

fn create_session(model_path: &Path) -> Result<Session> {
    let pref = ort_execution_preference();
    let logical_cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let intra_threads = std::env::var("FINGERSPELL_ORT_INTRA_THREADS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or_else(|| logical_cores.clamp(1, 4))
        .clamp(1, 32);

    let mut builder = SessionBuilder::new()
        .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?
        .with_intra_threads(intra_threads)
        .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?
        .with_optimization_level(GraphOptimizationLevel::All)
        .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?;
    info!(intra_threads, logical_cores, ?pref, "ONNX session configured");

    #[cfg(target_os = "windows")]
    {
        builder = match pref {
            OrtExecutionPreference::Cpu => builder
                .with_execution_providers([ep::CPU::default().build()])
                .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?,
            OrtExecutionPreference::DirectML => builder
                .with_execution_providers([
                    ep::DirectML::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                    ep::CPU::default().build(),
                ])
                .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?,
            OrtExecutionPreference::Auto => builder
                .with_execution_providers([
                    ep::DirectML::default()
                        .with_device_id(0)
                        .build()
                        .fail_silently(),
                    ep::CPU::default().build(),
                ])
                .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?,
        };
    }

    #[cfg(not(target_os = "windows"))]
    {
        if pref == OrtExecutionPreference::DirectML {
            warn!("FINGERSPELL_ORT_EP=directml requested on non-Windows host; using CPU EP");
        }
        builder = builder
            .with_execution_providers([ep::CPU::default().build()])
            .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?;
    }

    builder
        .commit_from_file(model_path)
        .map_err(|e| FingerspellError::OnnxSession(e.to_string()))
}

// ── OnnxClassifier ───────────────────────────────────────────────────────────

/// Eight-way group classifier backed by an ONNX graph.
pub struct OnnxClassifier {
    config: OnnxClassifierConfig,
    session: Option<Session>,
    input_name: String,
}

impl OnnxClassifier {
    pub fn new(config: OnnxClassifierConfig) -> Self {
        Self {
            config,
            session: None,
            input_name: String::new(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.config.model_path
    }

    fn run(&mut self, input: Vec<f32>) -> Result<GroupScores> {
        let side = CLASSIFIER_INPUT_SIZE as usize;
        let session = self.session.as_mut().ok_or(FingerspellError::NotReady)?;

        let tensor = Array4::<f32>::from_shape_vec((1, side, side, 3), input)
            .map_err(|e| FingerspellError::Inference(e.to_string()))?;
        let value = Value::from_array(tensor)
            .map_err(|e: ort::Error| FingerspellError::OnnxSession(e.to_string()))?;
        let inputs: Vec<(String, SessionInputValue<'_>)> =
            vec![(self.input_name.clone(), value.into())];

        let outputs = session
            .run(inputs)
            .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?;
        let (_, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| FingerspellError::OnnxSession(e.to_string()))?;
        scores_from_output(data)
    }
}

impl GroupClassifier for OnnxClassifier {
    fn warm_up(&mut self) -> Result<()> {
        let path = self.config.model_path.clone();
        if !path.exists() {
            return Err(FingerspellError::ModelNotFound { path });
        }

        info!(model = ?path, "loading group classifier graph");
        let session = create_session(&path)?;
        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| FingerspellError::OnnxSession("graph has no inputs".into()))?;
        if session.outputs().is_empty() {
            return Err(FingerspellError::OnnxSession("graph has no outputs".into()));
        }
        info!(input = %input_name, outputs = session.outputs().len(), "graph loaded");

        self.session = Some(session);
        self.input_name = input_name;

        // Dummy forward pass on a blank canvas: validates the output shape
        // and populates caches before the first real frame.
        let side = CLASSIFIER_INPUT_SIZE as usize;
        if let Err(e) = self.run(vec![1.0; side * side * 3]) {
            self.session = None;
            return Err(e);
        }
        info!("OnnxClassifier warm-up complete");
        Ok(())
    }

    fn predict(&mut self, canvas: &Canvas) -> Result<GroupScores> {
        let input = canvas_to_input(canvas, CLASSIFIER_INPUT_SIZE);
        self.run(input)
    }
}

/// Exactly eight scores, or an `Inference` error.
fn scores_from_output(data: &[f32]) -> Result<GroupScores> {
    <GroupScores>::try_from(data).map_err(|_| {
        FingerspellError::Inference(format!(
            "classifier produced {} scores, expected {GROUP_COUNT}",
            data.len()
        ))
    })
}
