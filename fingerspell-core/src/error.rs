use thiserror::Error;

/// All errors produced by fingerspell-core.
#[derive(Debug, Error)]
pub enum FingerspellError {
    #[error("classifier asset load failed: {0}")]
    AssetLoad(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("classifier is not ready: load has not completed or failed")]
    NotReady,

    #[error("expected 21 hand landmarks, got {found}")]
    InvalidLandmarkCount { found: usize },

    #[error("inference error: {0}")]
    Inference(String),

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("detection session is already running")]
    AlreadyRunning,

    #[error("detection session is not running")]
    NotRunning,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FingerspellError>;
