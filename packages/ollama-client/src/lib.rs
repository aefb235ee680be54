//! Pure Ollama REST API client
//!
//! A clean, minimal client for an Ollama-compatible runtime with no
//! domain-specific logic. Supports embeddings and non-streaming text
//! generation.
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::OllamaClient;
//!
//! let client = OllamaClient::from_env();
//!
//! // Embedding
//! let vector = client.embed("nomic-embed-text", "senior rust engineer").await?;
//!
//! // Text generation
//! let letter = client.generate("llama3.1", "Draft a short cover letter...").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OllamaError, Result};
pub use types::*;

use reqwest::Client;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Pure Ollama API client.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a new client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Create from the `OLLAMA_HOST` environment variable, falling back to
    /// `http://localhost:11434`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate an embedding for `text` with the given model.
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        debug!(model = %model, text_len = text.len(), "Requesting embedding");

        let response = self
            .http_client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{status}: {body}")));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))?;

        if embedding_response.embedding.is_empty() {
            return Err(OllamaError::Api("empty embedding returned".to_string()));
        }

        Ok(embedding_response.embedding)
    }

    /// Generate a completion for `prompt` with the given model.
    ///
    /// Streaming is disabled; the full response text is returned at once.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            stream: false,
        };

        debug!(model = %model, prompt_len = prompt.len(), "Requesting generation");

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("{status}: {body}")));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))?;

        Ok(generate_response.response)
    }

    /// Query the runtime version. Useful as a reachability check.
    pub async fn version(&self) -> Result<String> {
        let response = self
            .http_client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OllamaError::Api(response.status().to_string()));
        }

        let version_response: VersionResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))?;

        Ok(version_response.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_falls_back_to_default() {
        std::env::remove_var("OLLAMA_HOST");
        let client = OllamaClient::from_env();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    #[ignore] // Requires a running Ollama instance
    async fn test_embed_live() {
        let client = OllamaClient::from_env();
        let embedding = client
            .embed("nomic-embed-text", "senior backend engineer, Rust and Postgres")
            .await
            .expect("Failed to generate embedding");
        assert!(!embedding.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires a running Ollama instance
    async fn test_generate_live() {
        let client = OllamaClient::from_env();
        let response = client
            .generate("llama3.1", "Say hello in five words or fewer.")
            .await
            .expect("Failed to generate completion");
        assert!(!response.is_empty());
    }
}
