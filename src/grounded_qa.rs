use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Result;
use crate::generator::{GenerationRequest, TextGenerator};

pub const ROLE_INSTRUCTION: &str = "You are a helpful assistant. Answer the question only using the context";
pub const FALLBACK_INSTRUCTION: &str = "If the answer is not in the context, reply exactly: Not found";
/// What the model is told to say when the context lacks the answer.
pub const NOT_FOUND_SENTINEL: &str = "Not found";
/// Names no file; the session reports the configured path.
pub const MISSING_CONTEXT_MESSAGE: &str = "Context file not found or empty. Create the context file first.";
pub const QA_MAX_NEW_TOKENS: usize = 120;

/// Reads the whole context file. A missing file is an empty context, not an error.
pub fn load_context(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn build_qa_prompt(question: &str, context: &str) -> String {
    format!(
        "{ROLE_INSTRUCTION}\n{FALLBACK_INSTRUCTION}\n\nContext:\n{context}\n\nQuestion: {question}\nAnswer:\n"
    )
}

/// Question answering restricted to a supplied context.
///
/// Grounding is an instruction to the model only: answers are not checked
/// against the context and the sentinel is not enforced.
pub struct GroundedQa<'g, G: TextGenerator + ?Sized> {
    generator: &'g G,
}

impl<'g, G: TextGenerator + ?Sized> GroundedQa<'g, G> {
    pub fn new(generator: &'g G) -> Self {
        Self { generator }
    }

    pub fn answer(&self, question: &str, context: &str) -> Result<String> {
        if context.trim().is_empty() {
            return Ok(MISSING_CONTEXT_MESSAGE.to_string());
        }
        let request = GenerationRequest::sampled(build_qa_prompt(question, context), QA_MAX_NEW_TOKENS);
        self.generator.generate(&request)
    }
}
