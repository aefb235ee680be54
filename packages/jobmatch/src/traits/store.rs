//! Persistence seams for cache entries, companies, and applications.
//!
//! The storage layer is split into focused traits:
//! - `EmbeddingCacheStore`: upsert-only embedding cache
//! - `CompanyStore`: companies unique per `(owner_id, url)`
//! - `ApplicationStore`: applications unique per `(owner_id, job_url)`
//! - `EngineStore`: composite trait combining all three
//!
//! Unique constraints live in the store, not in callers: an insert that
//! collides reports [`InsertOutcome::AlreadyExists`] instead of erroring, so
//! a race between two runs resolves to exactly one record.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ApplicationRecord, CompanyId, CompanyRecord, CompanyStatus, EmbeddingCacheEntry, OwnerId,
};

/// Result of a unique-keyed insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The unique key was already taken; the write was a no-op.
    AlreadyExists,
}

/// Upsert-only store for embedding cache entries, keyed `(model, text_hash)`.
#[async_trait]
pub trait EmbeddingCacheStore: Send + Sync {
    /// Look up an entry by model and content hash.
    async fn get_entry(&self, model: &str, text_hash: &str) -> Result<Option<EmbeddingCacheEntry>>;

    /// Insert or overwrite the entry at its `(model, text_hash)` key.
    ///
    /// Must tolerate concurrent writers on the same key (last write wins);
    /// duplicate computation is wasted work, not a conflict.
    async fn upsert_entry(&self, entry: &EmbeddingCacheEntry) -> Result<()>;
}

/// Store for company records.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    /// Insert a company; reports `AlreadyExists` on an `(owner_id, url)` collision.
    async fn insert_company(&self, company: &CompanyRecord) -> Result<InsertOutcome>;

    /// Find a company by owner and URL.
    async fn find_company(&self, owner_id: OwnerId, url: &str) -> Result<Option<CompanyRecord>>;

    /// Update a company's status, the only mutable field.
    async fn update_company_status(&self, id: CompanyId, status: CompanyStatus) -> Result<()>;
}

/// Store for application records.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert an application; reports `AlreadyExists` on an
    /// `(owner_id, job_url)` collision.
    async fn insert_application(&self, application: &ApplicationRecord) -> Result<InsertOutcome>;

    /// Find an application by owner and job URL.
    async fn find_application(
        &self,
        owner_id: OwnerId,
        job_url: &str,
    ) -> Result<Option<ApplicationRecord>>;

    /// All applications for an owner, in insertion order.
    async fn list_applications(&self, owner_id: OwnerId) -> Result<Vec<ApplicationRecord>>;
}

/// Composite storage trait the engine is wired with.
pub trait EngineStore: EmbeddingCacheStore + CompanyStore + ApplicationStore {}

// Blanket implementation: anything implementing all three traits is an EngineStore.
impl<T: EmbeddingCacheStore + CompanyStore + ApplicationStore> EngineStore for T {}
