//! Durable embedding cache in front of the embedding provider.

use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::traits::{Embedder, EmbeddingCacheStore};
use crate::types::{hash_text, normalize_text, EmbeddingCacheEntry};

/// Content-addressed cache: identical text under the same model always hits
/// the same entry, regardless of incidental casing or whitespace.
///
/// Concurrent misses on one key may both compute; the store's upsert is
/// idempotent, so the duplicate work is wasted but harmless.
pub struct EmbeddingCache<S, E> {
    store: Arc<S>,
    embedder: Arc<E>,
}

impl<S, E> Clone for EmbeddingCache<S, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            embedder: Arc::clone(&self.embedder),
        }
    }
}

impl<S, E> EmbeddingCache<S, E>
where
    S: EmbeddingCacheStore,
    E: Embedder,
{
    pub fn new(store: Arc<S>, embedder: Arc<E>) -> Self {
        Self { store, embedder }
    }

    /// Return the embedding for `text`, computing and persisting it on a
    /// cache miss. Provider failures propagate to the caller, which owns
    /// the fail-open policy.
    pub async fn get_or_compute(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let normalized = normalize_text(text);
        let text_hash = hash_text(&normalized);

        if let Some(entry) = self.store.get_entry(model, &text_hash).await? {
            debug!(model = %model, text_hash = %text_hash, "Embedding cache hit");
            return Ok(entry.embedding);
        }

        let embedding = self.embedder.embed(model, &normalized).await?;

        let entry = EmbeddingCacheEntry::new(model, text_hash.clone(), normalized, embedding.clone());
        self.store.upsert_entry(&entry).await?;

        debug!(
            model = %model,
            text_hash = %text_hash,
            dimensions = embedding.len(),
            "Embedding computed and cached"
        );

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::MockEmbedder;

    const MODEL: &str = "test-embed";

    #[tokio::test]
    async fn cold_cache_computes_once() {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(MockEmbedder::new());
        let cache = EmbeddingCache::new(Arc::clone(&store), Arc::clone(&embedder));

        let first = cache.get_or_compute(MODEL, "Rust Engineer").await.unwrap();
        assert_eq!(embedder.call_count(), 1);
        assert_eq!(store.entry_count(), 1);

        let second = cache.get_or_compute(MODEL, "Rust Engineer").await.unwrap();
        assert_eq!(embedder.call_count(), 1, "warm hit must not call the provider");
        assert_eq!(first, second, "cached vector must be bit-identical");
    }

    #[tokio::test]
    async fn normalization_collapses_to_one_key() {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(MockEmbedder::new());
        let cache = EmbeddingCache::new(Arc::clone(&store), Arc::clone(&embedder));

        cache.get_or_compute(MODEL, "Rust  Engineer").await.unwrap();
        cache.get_or_compute(MODEL, "  rust engineer\n").await.unwrap();

        assert_eq!(embedder.call_count(), 1);
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn models_do_not_share_entries() {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(MockEmbedder::new());
        let cache = EmbeddingCache::new(Arc::clone(&store), Arc::clone(&embedder));

        cache.get_or_compute("model-a", "engineer").await.unwrap();
        cache.get_or_compute("model-b", "engineer").await.unwrap();

        assert_eq!(embedder.call_count(), 2);
        assert_eq!(store.entry_count(), 2);
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(MockEmbedder::new().with_failure());
        let cache = EmbeddingCache::new(Arc::clone(&store), embedder);

        let result = cache.get_or_compute(MODEL, "engineer").await;
        assert!(result.is_err());
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_misses_converge_on_one_entry() {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(MockEmbedder::new());
        let cache = EmbeddingCache::new(Arc::clone(&store), Arc::clone(&embedder));

        let a = cache.clone();
        let b = cache.clone();
        let (ra, rb) = tokio::join!(
            a.get_or_compute(MODEL, "site reliability engineer"),
            b.get_or_compute(MODEL, "site reliability engineer"),
        );

        assert_eq!(ra.unwrap(), rb.unwrap());
        assert_eq!(store.entry_count(), 1, "upsert must be idempotent on the key");
    }
}
