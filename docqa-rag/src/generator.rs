//! Generator trait for the text-completion collaborator.

use async_trait::async_trait;

use crate::error::Result;

/// A generative language model that completes a prompt into an answer.
///
/// The engine owns the prompt template (see
/// [`build_prompt`](crate::context::build_prompt)); implementations only
/// turn a finished prompt into text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt` into an answer.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
