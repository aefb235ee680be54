//! Embedding and text-generation seams.

use async_trait::async_trait;

use crate::error::Result;

/// Embedding provider.
///
/// Implementations wrap a specific runtime (Ollama, OpenAI, ...) and fail
/// with `EngineError::Embedding` when the provider is unreachable. The
/// returned vector's dimensionality is native to `model`; the engine never
/// compares vectors across models.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}

/// Text-generation provider, used for cover letter drafting.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
