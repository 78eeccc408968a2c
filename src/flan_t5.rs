//! FLAN-T5 behind the [`TextGenerator`] seam, running on candle.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::t5;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use log::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AssistantError, Result};
use crate::generator::{GenerationRequest, SamplingParams, TextGenerator};
use crate::tokenizer::TokenizerWrapper;

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Paths of the three files a T5 checkpoint needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Uses a local directory when one is configured, otherwise the hub cache
    /// (downloading on first use).
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        match &config.model_dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::from_hub(&config.model_id, &config.revision),
        }
    }

    pub fn from_dir(dir: &Path) -> Result<Self> {
        let files = Self {
            config: dir.join(CONFIG_FILE),
            tokenizer: dir.join(TOKENIZER_FILE),
            weights: dir.join(WEIGHTS_FILE),
        };
        for path in [&files.config, &files.tokenizer, &files.weights] {
            if !path.exists() {
                return Err(AssistantError::MissingModelFile(path.clone()));
            }
        }
        info!("Using local model files from {:?}", dir);
        Ok(files)
    }

    pub fn from_hub(model_id: &str, revision: &str) -> Result<Self> {
        info!("Resolving {} ({}) from the Hugging Face hub", model_id, revision);
        let api = Api::new()?;
        let repo = api.repo(Repo::with_revision(
            model_id.to_string(),
            RepoType::Model,
            revision.to_string(),
        ));
        Ok(Self {
            config: repo.get(CONFIG_FILE)?,
            tokenizer: repo.get(TOKENIZER_FILE)?,
            weights: repo.get(WEIGHTS_FILE)?,
        })
    }
}

fn sampling_strategy(sampling: &SamplingParams) -> Sampling {
    Sampling::TopP {
        p: sampling.top_p,
        temperature: sampling.temperature,
    }
}

/// The pretrained seq2seq model, loaded once and kept for the process lifetime.
///
/// Decoder state (the KV cache) is mutated on every request, so the network
/// sits behind a mutex. Requests are served one at a time.
pub struct FlanT5Generator {
    model: Mutex<t5::T5ForConditionalGeneration>,
    model_config: t5::Config,
    tokenizer: TokenizerWrapper,
    device: Device,
    base_seed: u64,
    requests_served: AtomicU64,
}

impl FlanT5Generator {
    pub fn load(config: &AppConfig) -> Result<Self> {
        let files = ModelFiles::resolve(config)?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Self::from_files(&files, config.max_input_tokens, seed)
    }

    pub fn from_files(files: &ModelFiles, max_input_tokens: usize, base_seed: u64) -> Result<Self> {
        let started = Instant::now();
        let device = Device::Cpu;

        let model_config: t5::Config = serde_json::from_str(&fs::read_to_string(&files.config)?)?;
        let tokenizer = TokenizerWrapper::new(&files.tokenizer, max_input_tokens)?;

        let vb = VarBuilder::from_buffered_safetensors(fs::read(&files.weights)?, DType::F32, &device)?;
        let model = t5::T5ForConditionalGeneration::load(vb, &model_config)?;

        info!("Model loaded in {:.2?}", started.elapsed());

        Ok(Self {
            model: Mutex::new(model),
            model_config,
            tokenizer,
            device,
            base_seed,
            requests_served: AtomicU64::new(0),
        })
    }

    fn logits_processor(&self, sampling: &SamplingParams) -> LogitsProcessor {
        let request_index = self.requests_served.fetch_add(1, Ordering::Relaxed);
        let seed = self.base_seed.wrapping_add(request_index);
        debug!("Request #{} sampling with seed {}", request_index, seed);

        LogitsProcessor::from_sampling(seed, sampling_strategy(sampling))
    }

    fn decoder_start_token(&self) -> u32 {
        self.model_config
            .decoder_start_token_id
            .unwrap_or(self.model_config.pad_token_id) as u32
    }

    /// Runs the encoder once, then decodes token by token until EOS or the
    /// budget is spent. Returns only the newly generated ids.
    fn generate_ids(
        &self,
        model: &mut t5::T5ForConditionalGeneration,
        prompt_ids: &[u32],
        max_new_tokens: usize,
        logits_processor: &mut LogitsProcessor,
    ) -> Result<Vec<u32>> {
        let input = Tensor::new(prompt_ids, &self.device)?.unsqueeze(0)?;
        let encoder_output = model.encode(&input)?;

        let eos_token_id = self.model_config.eos_token_id as u32;
        let mut decoder_ids = vec![self.decoder_start_token()];

        for step in 0..max_new_tokens {
            let decoder_input = if step == 0 || !self.model_config.use_cache {
                Tensor::new(decoder_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = decoder_ids[decoder_ids.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };

            let logits = model.decode(&decoder_input, &encoder_output)?.squeeze(0)?;
            let next_token_id = logits_processor.sample(&logits)?;
            if next_token_id == eos_token_id {
                break;
            }
            decoder_ids.push(next_token_id);
        }

        Ok(decoder_ids.split_off(1))
    }
}

impl TextGenerator for FlanT5Generator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let started = Instant::now();
        let encoded = self.tokenizer.encode(&request.prompt)?;
        if encoded.truncated {
            warn!(
                "Prompt exceeded the model input limit and was truncated to {} tokens",
                encoded.ids.len()
            );
        }
        debug!(
            "Prompt encoded to {} tokens, budget {} new tokens",
            encoded.ids.len(),
            request.max_new_tokens
        );

        let mut logits_processor = self.logits_processor(&request.sampling);
        let mut model = self.model.lock().map_err(|_| AssistantError::GatewayPoisoned)?;
        let generated = self.generate_ids(&mut model, &encoded.ids, request.max_new_tokens, &mut logits_processor);
        model.clear_kv_cache();
        drop(model);
        let generated = generated?;

        debug!("Generated {} tokens in {:.2?}", generated.len(), started.elapsed());
        self.tokenizer.decode(&generated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounded_qa::GroundedQa;
    use crate::summarizer::Summarizer;
    use crate::tokenizer::TINY_TOKENIZER;
    use candle_nn::VarMap;
    use std::fs::File;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    // One encoder and one decoder layer over the tiny word-level vocabulary.
    const TINY_T5_CONFIG: &str = r#"{
        "vocab_size": 8,
        "d_model": 8,
        "d_kv": 4,
        "d_ff": 16,
        "num_layers": 1,
        "num_decoder_layers": 1,
        "num_heads": 2,
        "relative_attention_num_buckets": 8,
        "relative_attention_max_distance": 16,
        "dropout_rate": 0.0,
        "layer_norm_epsilon": 1e-6,
        "initializer_factor": 1.0,
        "feed_forward_proj": "gated-gelu",
        "tie_word_embeddings": false,
        "is_encoder_decoder": true,
        "use_cache": true,
        "pad_token_id": 0,
        "eos_token_id": 1,
        "decoder_start_token_id": 0
    }"#;

    /// Writes a randomly initialised T5 checkpoint with its tokenizer.
    fn tiny_model_dir() -> (TempDir, ModelFiles) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), TINY_T5_CONFIG).unwrap();
        fs::write(dir.path().join(TOKENIZER_FILE), TINY_TOKENIZER).unwrap();

        let config: t5::Config = serde_json::from_str(TINY_T5_CONFIG).unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        t5::T5ForConditionalGeneration::load(vb, &config).unwrap();
        varmap.save(dir.path().join(WEIGHTS_FILE)).unwrap();

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        (dir, files)
    }

    fn assert_clean_output(text: &str, budget: usize) {
        assert!(text.split_whitespace().count() <= budget, "output over budget: {:?}", text);
        assert!(!text.contains("<pad>") && !text.contains("</s>"), "special token leaked: {:?}", text);
        assert_eq!(text, text.trim());
    }

    fn tiny_generator(dir: &Path) -> FlanT5Generator {
        let files = ModelFiles::from_dir(dir).unwrap();
        FlanT5Generator::from_files(&files, 16, 3).unwrap()
    }

    #[test]
    fn test_from_dir_reports_first_missing_file() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join(CONFIG_FILE)).unwrap();

        match ModelFiles::from_dir(dir.path()) {
            Err(AssistantError::MissingModelFile(path)) => {
                assert_eq!(path, dir.path().join(TOKENIZER_FILE));
            }
            other => panic!("expected missing tokenizer, got {:?}", other),
        }
    }

    #[test]
    fn test_from_dir_resolves_all_three_files() {
        let dir = tempdir().unwrap();
        for name in [CONFIG_FILE, TOKENIZER_FILE, WEIGHTS_FILE] {
            File::create(dir.path().join(name)).unwrap();
        }

        let files = ModelFiles::from_dir(dir.path()).unwrap();
        assert_eq!(files.config, dir.path().join("config.json"));
        assert_eq!(files.tokenizer, dir.path().join("tokenizer.json"));
        assert_eq!(files.weights, dir.path().join("model.safetensors"));
    }

    #[test]
    fn test_resolve_prefers_local_dir() {
        let dir = tempdir().unwrap();
        let config = AppConfig {
            model_dir: Some(dir.path().to_path_buf()),
            ..AppConfig::default()
        };

        // An empty directory must fail locally rather than falling back to the hub.
        assert!(matches!(
            ModelFiles::resolve(&config),
            Err(AssistantError::MissingModelFile(_))
        ));
    }

    #[test]
    fn test_from_files_fails_on_invalid_model_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();
        File::create(dir.path().join(TOKENIZER_FILE)).unwrap();
        File::create(dir.path().join(WEIGHTS_FILE)).unwrap();
        let files = ModelFiles::from_dir(dir.path()).unwrap();

        let result = FlanT5Generator::from_files(&files, 512, 0);
        assert!(matches!(result, Err(AssistantError::ModelConfig(_))));
    }

    #[test]
    fn test_sampling_strategy_is_always_nucleus() {
        let strategy = sampling_strategy(&SamplingParams::default());
        assert!(matches!(
            strategy,
            Sampling::TopP { p, temperature } if (p - 0.9).abs() < 1e-9 && (temperature - 0.7).abs() < 1e-9
        ));
    }

    #[test]
    fn test_tiny_model_loads_from_saved_weights() {
        let (_dir, files) = tiny_model_dir();
        assert!(FlanT5Generator::from_files(&files, 16, 3).is_ok());
    }

    #[test]
    fn test_tiny_model_respects_budget_and_strips_special_tokens() {
        let (dir, _files) = tiny_model_dir();
        let generator = tiny_generator(dir.path());

        for budget in [1, 4, 10] {
            let request = GenerationRequest::sampled("hello world".to_string(), budget);
            let text = generator.generate(&request).unwrap();
            assert_clean_output(&text, budget);
        }
    }

    #[test]
    fn test_tiny_model_serves_repeated_requests_with_truncation() {
        let (dir, _files) = tiny_model_dir();
        let generator = tiny_generator(dir.path());
        let long_text = vec!["the capital"; 500].join(" ");

        // Each request must start from a cleared KV cache; a stale cache
        // breaks the shapes of the next encoder/decoder pass.
        for _ in 0..3 {
            let answer = GroundedQa::new(&generator)
                .answer("hello world", &long_text)
                .unwrap();
            assert_clean_output(&answer, crate::grounded_qa::QA_MAX_NEW_TOKENS);

            let summary = Summarizer::new(&generator).summarize(&long_text).unwrap();
            assert_clean_output(&summary, crate::summarizer::SUMMARY_MAX_NEW_TOKENS);
        }
        assert_eq!(generator.requests_served.load(Ordering::Relaxed), 6);
    }
}
