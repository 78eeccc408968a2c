use crate::error::Result;
use crate::generator::{GenerationRequest, TextGenerator};

pub const SUMMARY_INSTRUCTION: &str = "Summarize the following text in 4-6 bullet points:";
/// A bullet list needs more room than a one-line answer.
pub const SUMMARY_MAX_NEW_TOKENS: usize = 160;

/// Instruction, blank line, then the text exactly as given.
pub fn build_summary_prompt(text: &str) -> String {
    format!("{}\n\n{}", SUMMARY_INSTRUCTION, text)
}

/// Abstractive summaries of pasted text.
///
/// The bullet count is only requested from the model, never checked.
pub struct Summarizer<'g, G: TextGenerator + ?Sized> {
    generator: &'g G,
}

impl<'g, G: TextGenerator + ?Sized> Summarizer<'g, G> {
    pub fn new(generator: &'g G) -> Self {
        Self { generator }
    }

    /// Callers must reject empty text first.
    pub fn summarize(&self, text: &str) -> Result<String> {
        let request = GenerationRequest::sampled(build_summary_prompt(text), SUMMARY_MAX_NEW_TOKENS);
        self.generator.generate(&request)
    }
}
