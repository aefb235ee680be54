//! Leads produced by the crawl driver and the candidate profile they are
//! matched against.

use serde::{Deserialize, Serialize};

use super::records::OwnerId;

/// A `(company, job link)` pair yielded by the crawl driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLead {
    pub company_name: String,
    pub company_url: String,
    pub job_url: String,
    pub job_title: String,
}

/// An opened job page, ready for the description check.
#[derive(Debug, Clone)]
pub struct JobPage {
    pub description: String,
    pub already_applied: bool,
}

/// The candidate a run works on behalf of.
///
/// `persona` is the job-posting-shaped text derived from the resume; the
/// controller embeds it once at start and holds the vector for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub owner_id: OwnerId,
    pub persona: String,
}

impl CandidateProfile {
    pub fn new(owner_id: OwnerId, persona: impl Into<String>) -> Self {
        Self {
            owner_id,
            persona: persona.into(),
        }
    }
}
