//! Durable records: companies and applications.
//!
//! Uniqueness is enforced per owner: companies on `(owner_id, url)`,
//! applications on `(owner_id, job_url)`. The application key is the
//! authoritative dedup boundary for job processing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity a crawl run is scoped to. Supplied by the caller, never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

/// Unique identifier for a company record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompanyId(pub Uuid);

impl CompanyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for an application record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a company record.
///
/// `Discovered` claims the `(owner_id, url)` slot as soon as the link passes
/// the dedup check; `Visited` is set once the job list has been enumerated.
/// Status is the only field ever mutated after insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Discovered,
    Visited,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Discovered => "discovered",
            CompanyStatus::Visited => "visited",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "discovered" => Some(CompanyStatus::Discovered),
            "visited" => Some(CompanyStatus::Visited),
            _ => None,
        }
    }
}

/// A company seen during crawling, unique per `(owner_id, url)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: CompanyId,
    pub owner_id: OwnerId,
    pub url: String,
    pub name: String,
    pub status: CompanyStatus,
    pub visited_at: DateTime<Utc>,
}

impl CompanyRecord {
    pub fn discovered(owner_id: OwnerId, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CompanyId::new(),
            owner_id,
            url: url.into(),
            name: name.into(),
            status: CompanyStatus::Discovered,
            visited_at: Utc::now(),
        }
    }
}

/// Terminal outcome of a processed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    Skipped,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ApplicationStatus::Submitted),
            "skipped" => Some(ApplicationStatus::Skipped),
            _ => None,
        }
    }
}

/// The terminal record for a job, unique per `(owner_id, job_url)`.
///
/// Exactly one record exists per job: either a drafted application with a
/// passing score, or a skip carrying the score and reason that rejected it.
/// A score of `-1` marks a fail-open decision taken while the embedding
/// provider was unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub owner_id: OwnerId,
    pub job_title: String,
    pub company_name: String,
    pub job_url: String,
    pub cover_letter: String,
    pub status: ApplicationStatus,
    pub match_score: i32,
    pub skip_reason: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// A drafted application that passed both relevance stages.
    pub fn submitted(
        owner_id: OwnerId,
        job_title: impl Into<String>,
        company_name: impl Into<String>,
        job_url: impl Into<String>,
        cover_letter: impl Into<String>,
        match_score: i32,
    ) -> Self {
        Self {
            id: ApplicationId::new(),
            owner_id,
            job_title: job_title.into(),
            company_name: company_name.into(),
            job_url: job_url.into(),
            cover_letter: cover_letter.into(),
            status: ApplicationStatus::Submitted,
            match_score,
            skip_reason: None,
            applied_at: Utc::now(),
        }
    }

    /// A rejected job, recorded with the score and reason that rejected it.
    pub fn skipped(
        owner_id: OwnerId,
        job_title: impl Into<String>,
        company_name: impl Into<String>,
        job_url: impl Into<String>,
        match_score: i32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: ApplicationId::new(),
            owner_id,
            job_title: job_title.into(),
            company_name: company_name.into(),
            job_url: job_url.into(),
            cover_letter: String::new(),
            status: ApplicationStatus::Skipped,
            match_score,
            skip_reason: Some(reason.into()),
            applied_at: Utc::now(),
        }
    }
}
