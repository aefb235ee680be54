//! Engine and crawl configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TITLE_THRESHOLD: f32 = 0.45;
const DEFAULT_DESCRIPTION_THRESHOLD: f32 = 0.45;
const DEFAULT_TITLE_CACHE_CAPACITY: usize = 128;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

const DEFAULT_FALLBACK_COVER_LETTER: &str = "Dear hiring team,\n\n\
    I came across this opening and believe my background is a strong fit. \
    I would welcome the chance to discuss the role in more detail.\n\n\
    Best regards";

/// Configuration for the automation controller and relevance filter.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Embedding model identifier; cache keys and vectors are scoped to it.
    pub embedding_model: String,

    /// Stage-1 relevance threshold for job titles.
    pub title_threshold: f32,

    /// Stage-2 relevance threshold for job descriptions.
    pub description_threshold: f32,

    /// Capacity of the in-memory title-check cache (FIFO eviction).
    pub title_cache_capacity: usize,

    /// Upper bound on every external call, so stop/pause checkpoints stay
    /// reachable even when a provider hangs.
    pub call_timeout: Duration,

    /// Generic cover letter used when the generation provider is down.
    pub fallback_cover_letter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_model: "nomic-embed-text".to_string(),
            title_threshold: DEFAULT_TITLE_THRESHOLD,
            description_threshold: DEFAULT_DESCRIPTION_THRESHOLD,
            title_cache_capacity: DEFAULT_TITLE_CACHE_CAPACITY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            fallback_cover_letter: DEFAULT_FALLBACK_COVER_LETTER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_title_threshold(mut self, threshold: f32) -> Self {
        self.title_threshold = threshold;
        self
    }

    pub fn with_description_threshold(mut self, threshold: f32) -> Self {
        self.description_threshold = threshold;
        self
    }

    pub fn with_title_cache_capacity(mut self, capacity: usize) -> Self {
        self.title_cache_capacity = capacity;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Where and how the crawl driver enumerates companies and jobs.
///
/// Selectors address the listings site's DOM through the browser driver;
/// defaults match a generic listings layout and are overridden per site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// The listings page enumeration starts from.
    pub listings_url: String,

    /// Links to company pages on the listings page.
    pub company_link_selector: String,

    /// Company display name on a company page.
    pub company_name_selector: String,

    /// Links to job postings on a company page.
    pub job_link_selector: String,

    /// Full description text on a job page.
    pub description_selector: String,

    /// Marker present on a job page when an application already exists.
    pub applied_marker_selector: String,

    /// Cover letter field on a job page (fill-only).
    pub cover_letter_selector: String,
}

impl CrawlConfig {
    pub fn new(listings_url: impl Into<String>) -> Self {
        Self {
            listings_url: listings_url.into(),
            company_link_selector: "a.company-link".to_string(),
            company_name_selector: "h1.company-name".to_string(),
            job_link_selector: "a.job-link".to_string(),
            description_selector: "div.job-description".to_string(),
            applied_marker_selector: ".already-applied".to_string(),
            cover_letter_selector: "textarea.cover-letter".to_string(),
        }
    }

    pub fn with_company_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.company_link_selector = selector.into();
        self
    }

    pub fn with_job_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.job_link_selector = selector.into();
        self
    }

    pub fn with_description_selector(mut self, selector: impl Into<String>) -> Self {
        self.description_selector = selector.into();
        self
    }
}
