pub mod cli;
pub mod config;
pub mod error;
pub mod flan_t5;
pub mod generator;
pub mod grounded_qa;
pub mod session;
pub mod summarizer;
pub mod system_resources;
pub mod tokenizer;

pub use error::{AssistantError, Result};
pub use generator::{GenerationRequest, SamplingParams, TextGenerator};
