//! The generation seam between prompt builders and the pretrained model.

use crate::error::Result;

pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// How the next token is sampled at every decoding step. Decoding is never greedy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Nucleus threshold: only tokens inside this cumulative probability mass are candidates.
    pub top_p: f64,
    pub temperature: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            top_p: DEFAULT_TOP_P,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_new_tokens: usize,
    pub sampling: SamplingParams,
}

impl GenerationRequest {
    /// A request using the default nucleus sampling settings.
    pub fn sampled(prompt: String, max_new_tokens: usize) -> Self {
        Self {
            prompt,
            max_new_tokens,
            sampling: SamplingParams::default(),
        }
    }
}

/// Anything that turns a prompt into text.
///
/// Calls are synchronous and block until decoding finishes. Implementations
/// return the decoded text with special tokens removed and surrounding
/// whitespace trimmed; an empty string is a valid result.
pub trait TextGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sampling_is_nucleus_with_temperature() {
        let params = SamplingParams::default();
        assert!((params.top_p - 0.9).abs() < f64::EPSILON);
        assert!((params.temperature - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sampled_request_carries_budget() {
        let request = GenerationRequest::sampled("hello".to_string(), 42);
        assert_eq!(request.prompt, "hello");
        assert_eq!(request.max_new_tokens, 42);
        assert_eq!(request.sampling, SamplingParams::default());
    }
}
