use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AssistantError, Result};

pub const DEFAULT_MODEL_ID: &str = "google/flan-t5-small";
pub const DEFAULT_REVISION: &str = "main";
pub const DEFAULT_CONTEXT_PATH: &str = "context.txt";
/// FLAN-T5 is trained with 512-token inputs.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 512;

/// Runtime settings. Every field has a default so a partial JSON file is accepted.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub model_id: String,
    pub revision: String,
    /// Local directory holding `config.json`, `tokenizer.json` and
    /// `model.safetensors`. When set, the hub is never contacted.
    pub model_dir: Option<PathBuf>,
    pub context_path: PathBuf,
    /// Base seed for sampling; random when absent.
    pub seed: Option<u64>,
    pub max_input_tokens: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            revision: DEFAULT_REVISION.to_string(),
            model_dir: None,
            context_path: PathBuf::from(DEFAULT_CONTEXT_PATH),
            seed: None,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
        }
    }
}

impl AppConfig {
    pub fn load(config_path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(config_path).map_err(|source| AssistantError::ConfigRead {
            path: config_path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| AssistantError::ConfigParse {
            path: config_path.to_path_buf(),
            source,
        })
    }
}
