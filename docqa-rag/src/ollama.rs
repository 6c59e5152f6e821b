//! Ollama-backed embedding and generation collaborators.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generator::Generator;

/// The default Ollama server URL.
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// The default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// The dimensionality of `all-minilm` embeddings.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;

/// The default generation model.
const DEFAULT_GENERATION_MODEL: &str = "mistral";

fn request_failed(message: String) -> RagError {
    RagError::EmbeddingUnavailable { provider: "ollama".to_string(), message }
}

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// The first call probes `/api/tags` once to verify the configured model is
/// actually pulled; the probe runs at most once per provider even under
/// concurrent first use, and a failed probe is retried by the next caller.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new()
///     .with_model("nomic-embed-text", 768);
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimensions: usize,
    probed: OnceCell<()>,
}

impl Default for OllamaEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaEmbeddingProvider {
    /// Create a provider against the default local Ollama server.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            probed: OnceCell::new(),
        }
    }

    /// Set the server URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model name and its embedding dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }

    /// One-time check that the configured model is present on the server.
    ///
    /// The probe runs at most once even under concurrent first calls; a
    /// failed probe leaves the cell empty so the next caller retries.
    async fn ensure_model(&self) -> Result<()> {
        self.probed.get_or_try_init(|| self.probe_model()).await.map(|_| ())
    }

    async fn probe_model(&self) -> Result<()> {
        let response = self
            .client
            .get(self.tags_url())
            .send()
            .await
            .map_err(|e| request_failed(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(request_failed(format!(
                "server returned {} listing models",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| request_failed(format!("failed to parse model list: {e}")))?;
        let available = tags.models.iter().any(|m| m.name.starts_with(&self.model));
        if !available {
            return Err(request_failed(format!(
                "model '{}' is not available on the server",
                self.model
            )));
        }

        debug!(model = %self.model, "ollama embedding model available");
        Ok(())
    }
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| request_failed("server returned an empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.ensure_model().await?;

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let request = EmbedRequest { model: &self.model, input: texts };
        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "ollama embed request failed");
                request_failed(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "ollama embed returned an error");
            return Err(request_failed(format!("server returned {status}: {body}")));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| request_failed(format!("failed to parse response: {e}")))?;

        if body.embeddings.len() != texts.len() {
            return Err(request_failed(format!(
                "server returned {} embeddings for {} inputs",
                body.embeddings.len(),
                texts.len()
            )));
        }

        Ok(body.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A [`Generator`] backed by Ollama's `/api/generate` endpoint.
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl Default for OllamaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaGenerator {
    /// Create a generator against the default local Ollama server.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_GENERATION_MODEL.to_string(),
        }
    }

    /// Set the server URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the generation model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn generation_failed(&self, message: String) -> RagError {
        RagError::Generation { provider: format!("ollama/{}", self.model), message }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(model = %self.model, prompt_len = prompt.len(), "generating answer");

        let request = GenerateRequest { model: &self.model, prompt, stream: false };
        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "ollama generate request failed");
                self.generation_failed(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(%status, "ollama generate returned an error");
            return Err(self.generation_failed(format!("server returned {status}: {body}")));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| self.generation_failed(format!("failed to parse response: {e}")))?;

        Ok(body.response)
    }
}
