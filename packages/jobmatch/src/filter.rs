//! Two-stage semantic relevance filter.
//!
//! Stage 1 scores the job title, stage 2 the full description; both compare
//! against the run's profile embedding. Stage 1 exists purely to avoid
//! opening job pages for obvious non-matches.
//!
//! The filter fails open: when the embedding provider is unreachable, a job
//! is treated as relevant with the sentinel score `-1`. A degraded AI layer
//! degrades ranking, never coverage.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::EmbeddingCache;
use crate::error::{EngineError, Result};
use crate::similarity::cosine_similarity;
use crate::traits::{Embedder, EmbeddingCacheStore};
use crate::types::{normalize_text, EngineConfig};

/// A relevance decision. `score` is `round(similarity * 100)`, or `-1` for a
/// fail-open decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relevance {
    pub relevant: bool,
    pub score: i32,
}

impl Relevance {
    /// Sentinel score for decisions taken while the provider was down.
    pub const FAIL_OPEN_SCORE: i32 = -1;

    fn fail_open() -> Self {
        Self {
            relevant: true,
            score: Self::FAIL_OPEN_SCORE,
        }
    }
}

/// Bounded in-process memo of title decisions, FIFO eviction.
///
/// Sits in front of the durable embedding cache so repeated titles skip even
/// the store round-trip. Owned by the filter instance; one filter serves one
/// profile and one threshold pair, so decisions are safe to memoize as-is.
struct TitleCache {
    capacity: usize,
    entries: HashMap<String, Relevance>,
    order: VecDeque<String>,
}

impl TitleCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<Relevance> {
        self.entries.get(key).copied()
    }

    fn insert(&mut self, key: String, relevance: Relevance) {
        if self.capacity == 0 || self.entries.contains_key(&key) {
            return;
        }
        if self.entries.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, relevance);
    }
}

/// The two-stage filter.
pub struct RelevanceFilter<S, E> {
    cache: EmbeddingCache<S, E>,
    model: String,
    title_threshold: f32,
    description_threshold: f32,
    title_cache: Mutex<TitleCache>,
}

impl<S, E> RelevanceFilter<S, E>
where
    S: EmbeddingCacheStore,
    E: Embedder,
{
    pub fn new(cache: EmbeddingCache<S, E>, config: &EngineConfig) -> Self {
        Self {
            cache,
            model: config.embedding_model.clone(),
            title_threshold: config.title_threshold,
            description_threshold: config.description_threshold,
            title_cache: Mutex::new(TitleCache::new(config.title_cache_capacity)),
        }
    }

    /// Stage 1: score a job title against the profile embedding.
    pub async fn check_title(&self, profile: &[f32], title: &str) -> Result<Relevance> {
        let key = normalize_text(title);

        if let Some(hit) = self.title_cache.lock().unwrap().get(&key) {
            debug!(title = %title, score = hit.score, "Title check served from memo");
            return Ok(hit);
        }

        let relevance = self.score(profile, title, self.title_threshold).await?;

        // Fail-open decisions are not memoized; a recovered provider should
        // produce a real score on the next sighting of this title.
        if relevance.score != Relevance::FAIL_OPEN_SCORE {
            self.title_cache.lock().unwrap().insert(key, relevance);
        }

        debug!(
            title = %title,
            score = relevance.score,
            relevant = relevance.relevant,
            "Title check"
        );
        Ok(relevance)
    }

    /// Stage 2: score a full job description against the profile embedding.
    pub async fn check_description(&self, profile: &[f32], description: &str) -> Result<Relevance> {
        let relevance = self
            .score(profile, description, self.description_threshold)
            .await?;
        debug!(
            score = relevance.score,
            relevant = relevance.relevant,
            "Description check"
        );
        Ok(relevance)
    }

    async fn score(&self, profile: &[f32], text: &str, threshold: f32) -> Result<Relevance> {
        let embedding = match self.cache.get_or_compute(&self.model, text).await {
            Ok(embedding) => embedding,
            Err(err) => {
                warn!(error = %err, "Embedding unavailable, failing open");
                return Ok(Relevance::fail_open());
            }
        };

        if embedding.len() != profile.len() {
            return Err(EngineError::DimensionMismatch {
                profile: profile.len(),
                candidate: embedding.len(),
            });
        }

        let similarity = cosine_similarity(profile, &embedding);
        Ok(Relevance {
            relevant: similarity >= threshold,
            score: (similarity * 100.0).round() as i32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::MockEmbedder;
    use std::sync::Arc;

    fn filter_with(
        embedder: MockEmbedder,
    ) -> (RelevanceFilter<MemoryStore, MockEmbedder>, Arc<MockEmbedder>) {
        let store = Arc::new(MemoryStore::new());
        let embedder = Arc::new(embedder);
        let cache = EmbeddingCache::new(store, Arc::clone(&embedder));
        let filter = RelevanceFilter::new(cache, &EngineConfig::default());
        (filter, embedder)
    }

    #[tokio::test]
    async fn strong_title_passes_stage_one() {
        // Profile (1, 0) vs embedding (0.8, 0.6): cosine 0.80, above 0.45.
        let (filter, _) =
            filter_with(MockEmbedder::new().with_embedding("rust engineer", vec![0.8, 0.6]));
        let profile = vec![1.0, 0.0];

        let relevance = filter.check_title(&profile, "Rust Engineer").await.unwrap();
        assert!(relevance.relevant);
        assert_eq!(relevance.score, 80);
    }

    #[tokio::test]
    async fn weak_title_is_rejected_with_score() {
        // Cosine 0.10 against (1, 0).
        let (filter, _) = filter_with(
            MockEmbedder::new().with_embedding("pastry chef", vec![0.1, 0.994_987_4]),
        );
        let profile = vec![1.0, 0.0];

        let relevance = filter.check_title(&profile, "Pastry Chef").await.unwrap();
        assert!(!relevance.relevant);
        assert_eq!(relevance.score, 10);
    }

    #[tokio::test]
    async fn provider_failure_fails_open_on_both_stages() {
        let (filter, _) = filter_with(MockEmbedder::new().with_failure());
        let profile = vec![1.0, 0.0];

        let title = filter.check_title(&profile, "Anything").await.unwrap();
        let description = filter.check_description(&profile, "Anything at all").await.unwrap();

        for relevance in [title, description] {
            assert!(relevance.relevant);
            assert_eq!(relevance.score, Relevance::FAIL_OPEN_SCORE);
        }
    }

    #[tokio::test]
    async fn fail_open_results_are_not_memoized() {
        let (filter, embedder) = filter_with(
            MockEmbedder::new()
                .with_embedding("rust engineer", vec![0.8, 0.6])
                .fail_times(1),
        );
        let profile = vec![1.0, 0.0];

        let degraded = filter.check_title(&profile, "Rust Engineer").await.unwrap();
        assert_eq!(degraded.score, Relevance::FAIL_OPEN_SCORE);

        let recovered = filter.check_title(&profile, "Rust Engineer").await.unwrap();
        assert_eq!(recovered.score, 80);
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn repeated_titles_are_memoized() {
        let (filter, embedder) =
            filter_with(MockEmbedder::new().with_embedding("rust engineer", vec![0.8, 0.6]));
        let profile = vec![1.0, 0.0];

        filter.check_title(&profile, "Rust Engineer").await.unwrap();
        filter.check_title(&profile, "rust   engineer").await.unwrap();

        assert_eq!(embedder.call_count(), 1);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let (filter, _) =
            filter_with(MockEmbedder::new().with_embedding("rust engineer", vec![1.0, 0.0, 0.0]));
        let profile = vec![1.0, 0.0];

        let result = filter.check_title(&profile, "Rust Engineer").await;
        assert!(matches!(
            result,
            Err(EngineError::DimensionMismatch {
                profile: 2,
                candidate: 3
            })
        ));
    }

    #[test]
    fn title_cache_evicts_oldest_first() {
        let hit = Relevance {
            relevant: true,
            score: 50,
        };
        let mut cache = TitleCache::new(2);
        cache.insert("a".to_string(), hit);
        cache.insert("b".to_string(), hit);
        cache.insert("c".to_string(), hit);

        assert!(cache.get("a").is_none(), "oldest entry must be evicted");
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn title_cache_reinsert_does_not_duplicate() {
        let hit = Relevance {
            relevant: false,
            score: 12,
        };
        let mut cache = TitleCache::new(2);
        cache.insert("a".to_string(), hit);
        cache.insert("a".to_string(), hit);
        cache.insert("b".to_string(), hit);
        cache.insert("c".to_string(), hit);

        // "a" was inserted once; after two newer keys it is gone.
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("c").unwrap().score, 12);
    }
}
