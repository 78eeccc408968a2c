use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::Result;

/// Summarize pasted text or answer questions about a local file with FLAN-T5.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    /// JSON settings file; command-line flags take precedence over it
    #[clap(long, value_parser)]
    pub config: Option<PathBuf>,

    /// Hugging Face model id
    #[clap(long, value_parser)]
    pub model_id: Option<String>,

    /// Model revision on the hub
    #[clap(long, value_parser)]
    pub revision: Option<String>,

    /// Directory with config.json, tokenizer.json and model.safetensors (no download)
    #[clap(long, value_parser)]
    pub model_dir: Option<PathBuf>,

    /// Plain-text file the Q&A answers from
    #[clap(long, value_parser)]
    pub context_file: Option<PathBuf>,

    /// Base seed for sampling
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// Prompts longer than this many tokens are truncated
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_input_tokens: Option<u32>,
}

impl CliArgs {
    /// Defaults, then the settings file, then flags.
    pub fn into_config(self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading settings from {:?}", path);
                AppConfig::load(path)?
            }
            None => AppConfig::default(),
        };

        if let Some(model_id) = self.model_id {
            config.model_id = model_id;
        }
        if let Some(revision) = self.revision {
            config.revision = revision;
        }
        if self.model_dir.is_some() {
            config.model_dir = self.model_dir;
        }
        if let Some(context_file) = self.context_file {
            config.context_path = context_file;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(max_input_tokens) = self.max_input_tokens {
            config.max_input_tokens = max_input_tokens as usize;
        }
        Ok(config)
    }
}
