//! Seen-once checks for companies and jobs, scoped per owner.
//!
//! These are advisory existence checks: they avoid wasted navigation, but a
//! narrow race remains between "checked new" and "recorded". The store's
//! unique constraint is the authoritative guard; a colliding insert reports
//! `AlreadyExists` and is treated as handled, never as an error.

use std::sync::Arc;

use crate::error::Result;
use crate::traits::{ApplicationStore, CompanyStore};
use crate::types::OwnerId;

pub struct DedupLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for DedupLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> DedupLedger<S>
where
    S: CompanyStore + ApplicationStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Whether no company record exists yet for `(owner_id, url)`.
    pub async fn is_new_company(&self, owner_id: OwnerId, url: &str) -> Result<bool> {
        Ok(self.store.find_company(owner_id, url).await?.is_none())
    }

    /// Whether no application record exists yet for `(owner_id, job_url)`.
    pub async fn is_new_job(&self, owner_id: OwnerId, job_url: &str) -> Result<bool> {
        Ok(self.store.find_application(owner_id, job_url).await?.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::traits::{ApplicationStore, CompanyStore, InsertOutcome};
    use crate::types::{ApplicationRecord, CompanyRecord};
    use uuid::Uuid;

    #[tokio::test]
    async fn companies_are_new_until_recorded() {
        let store = Arc::new(MemoryStore::new());
        let ledger = DedupLedger::new(Arc::clone(&store));
        let owner = OwnerId(Uuid::new_v4());
        let url = "https://listings.example.com/company/acme";

        assert!(ledger.is_new_company(owner, url).await.unwrap());

        let record = CompanyRecord::discovered(owner, url, "Acme");
        assert_eq!(
            store.insert_company(&record).await.unwrap(),
            InsertOutcome::Inserted
        );

        assert!(!ledger.is_new_company(owner, url).await.unwrap());

        // A different owner still sees the company as new.
        let other = OwnerId(Uuid::new_v4());
        assert!(ledger.is_new_company(other, url).await.unwrap());
    }

    #[tokio::test]
    async fn jobs_are_new_until_an_application_exists() {
        let store = Arc::new(MemoryStore::new());
        let ledger = DedupLedger::new(Arc::clone(&store));
        let owner = OwnerId(Uuid::new_v4());
        let job_url = "https://listings.example.com/jobs/42";

        assert!(ledger.is_new_job(owner, job_url).await.unwrap());

        let record =
            ApplicationRecord::skipped(owner, "Engineer", "Acme", job_url, 10, "title below threshold");
        store.insert_application(&record).await.unwrap();

        assert!(!ledger.is_new_job(owner, job_url).await.unwrap());
    }
}
