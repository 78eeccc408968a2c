use std::path::Path;

use tokenizers::{Tokenizer, TruncationParams};

use crate::error::{AssistantError, Result};

/// Encoded prompt plus whether the tokenizer had to cut it down.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPrompt {
    pub ids: Vec<u32>,
    pub truncated: bool,
}

#[derive(Debug)]
pub struct TokenizerWrapper {
    tokenizer: Tokenizer,
}

impl TokenizerWrapper {
    /// Loads a `tokenizer.json` and caps every encoding at `max_input_tokens`
    /// using the tokenizer's own truncation strategy.
    pub fn new(tokenizer_path: &Path, max_input_tokens: usize) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            AssistantError::Tokenizer(format!("failed to load tokenizer from {:?}: {}", tokenizer_path, e))
        })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_input_tokens,
                ..Default::default()
            }))
            .map_err(|e| AssistantError::Tokenizer(format!("invalid truncation settings: {}", e)))?;
        Ok(Self { tokenizer })
    }

    pub fn encode(&self, text: &str) -> Result<EncodedPrompt> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| AssistantError::Tokenizer(format!("encoding failed: {}", e)))?;
        Ok(EncodedPrompt {
            ids: encoding.get_ids().to_vec(),
            truncated: !encoding.get_overflowing().is_empty(),
        })
    }

    /// Decodes generated ids, dropping pad/eos and other special tokens.
    pub fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, true)
            .map(|text| text.trim().to_string())
            .map_err(|e| AssistantError::Tokenizer(format!("decoding failed for {} ids: {}", ids.len(), e)))
    }
}

// Word-level vocabulary with T5-style special tokens.
#[cfg(test)]
pub(crate) const TINY_TOKENIZER: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [
        {"id": 0, "content": "<pad>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true},
        {"id": 1, "content": "</s>", "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
    ],
    "normalizer": null,
    "pre_tokenizer": {"type": "Whitespace"},
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {"<pad>": 0, "</s>": 1, "<unk>": 2, "hello": 3, "world": 4, "the": 5, "capital": 6},
        "unk_token": "<unk>"
    }
}"#;
