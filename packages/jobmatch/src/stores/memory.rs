//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::{
    ApplicationStore, CompanyStore, EmbeddingCacheStore, InsertOutcome,
};
use crate::types::{
    ApplicationRecord, CompanyId, CompanyRecord, CompanyStatus, EmbeddingCacheEntry, OwnerId,
};

/// In-memory store enforcing the same unique keys as the durable backend:
/// `(model, text_hash)` for cache entries, `(owner_id, url)` for companies,
/// `(owner_id, job_url)` for applications.
///
/// Useful for testing and development; data is lost on restart.
pub struct MemoryStore {
    entries: RwLock<HashMap<(String, String), EmbeddingCacheEntry>>,
    companies: RwLock<Vec<CompanyRecord>>,
    applications: RwLock<Vec<ApplicationRecord>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            companies: RwLock::new(Vec::new()),
            applications: RwLock::new(Vec::new()),
        }
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
        self.companies.write().unwrap().clear();
        self.applications.write().unwrap().clear();
    }

    /// Number of cached embedding entries.
    pub fn entry_count(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Number of company records.
    pub fn company_count(&self) -> usize {
        self.companies.read().unwrap().len()
    }

    /// Number of application records.
    pub fn application_count(&self) -> usize {
        self.applications.read().unwrap().len()
    }
}

#[async_trait]
impl EmbeddingCacheStore for MemoryStore {
    async fn get_entry(&self, model: &str, text_hash: &str) -> Result<Option<EmbeddingCacheEntry>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .get(&(model.to_string(), text_hash.to_string()))
            .cloned())
    }

    async fn upsert_entry(&self, entry: &EmbeddingCacheEntry) -> Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert((entry.model.clone(), entry.text_hash.clone()), entry.clone());
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn insert_company(&self, company: &CompanyRecord) -> Result<InsertOutcome> {
        let mut companies = self.companies.write().unwrap();
        if companies
            .iter()
            .any(|c| c.owner_id == company.owner_id && c.url == company.url)
        {
            return Ok(InsertOutcome::AlreadyExists);
        }
        companies.push(company.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_company(&self, owner_id: OwnerId, url: &str) -> Result<Option<CompanyRecord>> {
        Ok(self
            .companies
            .read()
            .unwrap()
            .iter()
            .find(|c| c.owner_id == owner_id && c.url == url)
            .cloned())
    }

    async fn update_company_status(&self, id: CompanyId, status: CompanyStatus) -> Result<()> {
        let mut companies = self.companies.write().unwrap();
        if let Some(company) = companies.iter_mut().find(|c| c.id == id) {
            company.status = status;
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(&self, application: &ApplicationRecord) -> Result<InsertOutcome> {
        let mut applications = self.applications.write().unwrap();
        if applications
            .iter()
            .any(|a| a.owner_id == application.owner_id && a.job_url == application.job_url)
        {
            return Ok(InsertOutcome::AlreadyExists);
        }
        applications.push(application.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_application(
        &self,
        owner_id: OwnerId,
        job_url: &str,
    ) -> Result<Option<ApplicationRecord>> {
        Ok(self
            .applications
            .read()
            .unwrap()
            .iter()
            .find(|a| a.owner_id == owner_id && a.job_url == job_url)
            .cloned())
    }

    async fn list_applications(&self, owner_id: OwnerId) -> Result<Vec<ApplicationRecord>> {
        Ok(self
            .applications
            .read()
            .unwrap()
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn duplicate_application_insert_is_reported_not_raised() {
        let store = MemoryStore::new();
        let owner = OwnerId(Uuid::new_v4());
        let job_url = "https://listings.example.com/jobs/7";

        let first = ApplicationRecord::skipped(owner, "A", "Acme", job_url, 12, "low title score");
        let second = ApplicationRecord::submitted(owner, "A", "Acme", job_url, "letter", 88);

        assert_eq!(
            store.insert_application(&first).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.insert_application(&second).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
        assert_eq!(store.application_count(), 1);

        // The first terminal outcome wins.
        let stored = store.find_application(owner, job_url).await.unwrap().unwrap();
        assert_eq!(stored.match_score, 12);
    }

    #[tokio::test]
    async fn concurrent_inserts_leave_exactly_one_record() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let owner = OwnerId(Uuid::new_v4());
        let job_url = "https://listings.example.com/jobs/9";

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let record = ApplicationRecord::skipped(
                    owner,
                    "Engineer",
                    "Acme",
                    job_url,
                    i,
                    "low title score",
                );
                store.insert_application(&record).await.unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap() == InsertOutcome::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(store.application_count(), 1);
    }

    #[tokio::test]
    async fn applications_list_in_insertion_order() {
        let store = MemoryStore::new();
        let owner = OwnerId(Uuid::new_v4());

        for i in 0..3 {
            let record = ApplicationRecord::skipped(
                owner,
                format!("Job {i}"),
                "Acme",
                format!("https://listings.example.com/jobs/{i}"),
                i,
                "low title score",
            );
            store.insert_application(&record).await.unwrap();
        }

        let titles: Vec<_> = store
            .list_applications(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.job_title)
            .collect();
        assert_eq!(titles, ["Job 0", "Job 1", "Job 2"]);
    }

    #[tokio::test]
    async fn company_status_update_touches_only_status() {
        let store = MemoryStore::new();
        let owner = OwnerId(Uuid::new_v4());
        let record = CompanyRecord::discovered(owner, "https://c.example.com/acme", "Acme");
        store.insert_company(&record).await.unwrap();

        store
            .update_company_status(record.id, CompanyStatus::Visited)
            .await
            .unwrap();

        let stored = store
            .find_company(owner, "https://c.example.com/acme")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, CompanyStatus::Visited);
        assert_eq!(stored.name, "Acme");
    }
}
