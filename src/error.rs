use std::path::PathBuf;

use thiserror::Error;

/// Every failure the assistant can surface, at startup or while serving a request.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("failed to read settings file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model file {0:?} not found")]
    MissingModelFile(PathBuf),
    #[error("model download failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("model error: {0}")]
    Model(#[from] candle_core::Error),
    #[error("invalid model config: {0}")]
    ModelConfig(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model state lock poisoned by an earlier panic")]
    GatewayPoisoned,
}

pub type Result<T> = std::result::Result<T, AssistantError>;
