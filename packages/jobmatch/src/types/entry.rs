//! Embedding cache entries and the text normalization behind their keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A cached embedding, keyed by `(model, text_hash)`.
///
/// Entries are append/upsert-only: recomputing the same key overwrites in
/// place, nothing is ever deleted by the engine. Vectors are only comparable
/// within a single `model`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingCacheEntry {
    pub model: String,
    pub text_hash: String,
    pub normalized_text: String,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmbeddingCacheEntry {
    pub fn new(
        model: impl Into<String>,
        text_hash: impl Into<String>,
        normalized_text: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        let now = Utc::now();
        Self {
            model: model.into(),
            text_hash: text_hash.into(),
            normalized_text: normalized_text.into(),
            embedding,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Normalize text for consistent cache keys: trim, collapse whitespace,
/// lowercase. Identical content with incidental formatting differences
/// always lands on the same key.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// SHA-256 content hash of (already normalized) text, as lowercase hex.
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_text("  Senior   Rust\n\tEngineer  "),
            "senior rust engineer"
        );
        assert_eq!(normalize_text("Senior Rust Engineer"), "senior rust engineer");
    }

    #[test]
    fn incidental_formatting_yields_same_hash() {
        let a = hash_text(&normalize_text("Staff  Engineer,\nPlatform"));
        let b = hash_text(&normalize_text("staff engineer, platform"));
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_yields_different_hash() {
        assert_ne!(
            hash_text(&normalize_text("data engineer")),
            hash_text(&normalize_text("data scientist"))
        );
    }
}
