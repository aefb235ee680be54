//! Reference provider implementation over a local Ollama runtime.
//!
//! Enabled with the `ollama` feature. Adapts [`ollama_client::OllamaClient`]
//! to the engine's [`Embedder`] and [`Generator`] seams.

use async_trait::async_trait;
use ollama_client::OllamaClient;

use crate::error::{EngineError, Result};
use crate::traits::{Embedder, Generator};

/// Embedding and generation backed by an Ollama-compatible runtime.
#[derive(Clone)]
pub struct OllamaAI {
    client: OllamaClient,
    generation_model: String,
}

impl OllamaAI {
    pub fn new(client: OllamaClient, generation_model: impl Into<String>) -> Self {
        Self {
            client,
            generation_model: generation_model.into(),
        }
    }

    /// Client against `OLLAMA_HOST` (default `http://localhost:11434`).
    pub fn from_env(generation_model: impl Into<String>) -> Self {
        Self::new(OllamaClient::from_env(), generation_model)
    }
}

#[async_trait]
impl Embedder for OllamaAI {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        self.client
            .embed(model, text)
            .await
            .map_err(|e| EngineError::Embedding(Box::new(e)))
    }
}

#[async_trait]
impl Generator for OllamaAI {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client
            .generate(&self.generation_model, prompt)
            .await
            .map_err(|e| EngineError::Generation(Box::new(e)))
    }
}
