//! Postgres storage implementation.
//!
//! Unique constraints are the authoritative dedup guard: inserts use
//! `ON CONFLICT ... DO NOTHING` and report `AlreadyExists` from the affected
//! row count, while cache writes upsert in place. Embedding vectors are
//! stored as BYTEA of little-endian f32; similarity is computed in-process
//! against the run's profile vector, so no vector extension is required.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::error::{EngineError, Result};
use crate::traits::{
    ApplicationStore, CompanyStore, EmbeddingCacheStore, InsertOutcome,
};
use crate::types::{
    ApplicationRecord, ApplicationStatus, CompanyId, CompanyRecord, CompanyStatus,
    EmbeddingCacheEntry, OwnerId,
};

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables and unique constraints if they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS embedding_cache (
                model TEXT NOT NULL,
                text_hash TEXT NOT NULL,
                normalized_text TEXT NOT NULL,
                embedding BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (model, text_hash)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id UUID PRIMARY KEY,
                owner_id UUID NOT NULL,
                url TEXT NOT NULL,
                name TEXT NOT NULL,
                status TEXT NOT NULL,
                visited_at TIMESTAMPTZ NOT NULL,
                UNIQUE (owner_id, url)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id UUID PRIMARY KEY,
                owner_id UUID NOT NULL,
                job_title TEXT NOT NULL,
                company_name TEXT NOT NULL,
                job_url TEXT NOT NULL,
                cover_letter TEXT NOT NULL,
                status TEXT NOT NULL,
                match_score INTEGER NOT NULL,
                skip_reason TEXT,
                applied_at TIMESTAMPTZ NOT NULL,
                UNIQUE (owner_id, job_url)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_applications_owner ON applications(owner_id)",
        )
        .execute(&self.pool)
        .await
        .ok();

        Ok(())
    }
}

fn storage_err(err: sqlx::Error) -> EngineError {
    EngineError::Storage(Box::new(err))
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let mut arr = [0u8; 4];
            arr.copy_from_slice(chunk);
            f32::from_le_bytes(arr)
        })
        .collect()
}

#[async_trait]
impl EmbeddingCacheStore for PostgresStore {
    async fn get_entry(&self, model: &str, text_hash: &str) -> Result<Option<EmbeddingCacheEntry>> {
        let row = sqlx::query(
            r#"
            SELECT model, text_hash, normalized_text, embedding, created_at, updated_at
            FROM embedding_cache
            WHERE model = $1 AND text_hash = $2
            "#,
        )
        .bind(model)
        .bind(text_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(|r| EmbeddingCacheEntry {
            model: r.get("model"),
            text_hash: r.get("text_hash"),
            normalized_text: r.get("normalized_text"),
            embedding: bytes_to_embedding(r.get::<Vec<u8>, _>("embedding").as_slice()),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn upsert_entry(&self, entry: &EmbeddingCacheEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO embedding_cache (
                model, text_hash, normalized_text, embedding, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (model, text_hash) DO UPDATE SET
                normalized_text = EXCLUDED.normalized_text,
                embedding = EXCLUDED.embedding,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&entry.model)
        .bind(&entry.text_hash)
        .bind(&entry.normalized_text)
        .bind(embedding_to_bytes(&entry.embedding))
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl CompanyStore for PostgresStore {
    async fn insert_company(&self, company: &CompanyRecord) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO companies (id, owner_id, url, name, status, visited_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (owner_id, url) DO NOTHING
            "#,
        )
        .bind(company.id.0)
        .bind(company.owner_id.0)
        .bind(&company.url)
        .bind(&company.name)
        .bind(company.status.as_str())
        .bind(company.visited_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn find_company(&self, owner_id: OwnerId, url: &str) -> Result<Option<CompanyRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, url, name, status, visited_at
            FROM companies
            WHERE owner_id = $1 AND url = $2
            "#,
        )
        .bind(owner_id.0)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(|r| CompanyRecord {
            id: CompanyId(r.get("id")),
            owner_id: OwnerId(r.get("owner_id")),
            url: r.get("url"),
            name: r.get("name"),
            status: CompanyStatus::parse(r.get::<String, _>("status").as_str())
                .unwrap_or(CompanyStatus::Discovered),
            visited_at: r.get("visited_at"),
        }))
    }

    async fn update_company_status(&self, id: CompanyId, status: CompanyStatus) -> Result<()> {
        sqlx::query("UPDATE companies SET status = $2 WHERE id = $1")
            .bind(id.0)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for PostgresStore {
    async fn insert_application(&self, application: &ApplicationRecord) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO applications (
                id, owner_id, job_title, company_name, job_url,
                cover_letter, status, match_score, skip_reason, applied_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (owner_id, job_url) DO NOTHING
            "#,
        )
        .bind(application.id.0)
        .bind(application.owner_id.0)
        .bind(&application.job_title)
        .bind(&application.company_name)
        .bind(&application.job_url)
        .bind(&application.cover_letter)
        .bind(application.status.as_str())
        .bind(application.match_score)
        .bind(&application.skip_reason)
        .bind(application.applied_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn find_application(
        &self,
        owner_id: OwnerId,
        job_url: &str,
    ) -> Result<Option<ApplicationRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, job_title, company_name, job_url,
                   cover_letter, status, match_score, skip_reason, applied_at
            FROM applications
            WHERE owner_id = $1 AND job_url = $2
            "#,
        )
        .bind(owner_id.0)
        .bind(job_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(row.map(application_from_row))
    }

    async fn list_applications(&self, owner_id: OwnerId) -> Result<Vec<ApplicationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, job_title, company_name, job_url,
                   cover_letter, status, match_score, skip_reason, applied_at
            FROM applications
            WHERE owner_id = $1
            ORDER BY applied_at ASC
            "#,
        )
        .bind(owner_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(rows.into_iter().map(application_from_row).collect())
    }
}

fn application_from_row(r: sqlx::postgres::PgRow) -> ApplicationRecord {
    ApplicationRecord {
        id: crate::types::ApplicationId(r.get("id")),
        owner_id: OwnerId(r.get("owner_id")),
        job_title: r.get("job_title"),
        company_name: r.get("company_name"),
        job_url: r.get("job_url"),
        cover_letter: r.get("cover_letter"),
        status: ApplicationStatus::parse(r.get::<String, _>("status").as_str())
            .unwrap_or(ApplicationStatus::Skipped),
        match_score: r.get("match_score"),
        skip_reason: r.get("skip_reason"),
        applied_at: r.get("applied_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_bytes_round_trip() {
        let embedding = vec![0.5f32, -1.25, 3.0e-5, 0.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), embedding.len() * 4);
        assert_eq!(bytes_to_embedding(&bytes), embedding);
    }

    #[tokio::test]
    #[ignore] // Requires a running Postgres (DATABASE_URL)
    async fn test_unique_constraint_live() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let pool = PgPool::connect(&url).await.expect("connect failed");
        let store = PostgresStore::new(pool);
        store.ensure_schema().await.unwrap();

        let owner = OwnerId(uuid::Uuid::new_v4());
        let job_url = format!("https://listings.example.com/jobs/{}", uuid::Uuid::new_v4());
        let first = ApplicationRecord::skipped(owner, "A", "Acme", &job_url, 10, "low score");
        let second = ApplicationRecord::skipped(owner, "A", "Acme", &job_url, 20, "low score");

        assert_eq!(
            store.insert_application(&first).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.insert_application(&second).await.unwrap(),
            InsertOutcome::AlreadyExists
        );
    }
}
