//! Job-Posting Discovery and Application Matching Engine
//!
//! A library-style engine that crawls a listings site for companies and job
//! postings, filters them against a candidate profile with a two-stage
//! semantic relevance check, drafts applications for matches, and records an
//! auditable trail of every decision.
//!
//! # Design Philosophy
//!
//! - Library handles mechanics, host handles rendering and bootstrap
//! - Collaborators (browser, models, storage, event feed) behind traits
//! - Fail-open relevance: a degraded AI layer degrades ranking, never coverage
//! - Unique keys in storage are the dedup authority; checks are advisory
//! - Cooperative control: pause at checkpoints, stop within one bounded call
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jobmatch::{
//!     AutomationController, CandidateProfile, CrawlConfig, EngineConfig, OwnerId,
//! };
//! use jobmatch::stores::MemoryStore;
//! use jobmatch::traits::TracingSink;
//!
//! let mut controller = AutomationController::new(
//!     browser,                       // your BrowserDriver
//!     Arc::new(MemoryStore::new()),  // or PostgresStore (feature "postgres")
//!     embedder,                      // your Embedder, e.g. OllamaAI (feature "ollama")
//!     generator,                     // your Generator
//!     Arc::new(TracingSink),
//!     EngineConfig::default(),
//!     CrawlConfig::new("https://listings.example.com/browse"),
//! );
//!
//! let handle = controller.handle();  // pause / resume / stop from the UI
//! let stats = controller
//!     .start(CandidateProfile::new(owner_id, persona_text))
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (browser, providers, storage, sink)
//! - [`types`] - Records, events, leads, configuration
//! - [`controller`] - The pausable/resumable automation state machine
//! - [`crawl`] - Company/job discovery over the browser seam
//! - [`filter`] - Two-stage semantic relevance filter
//! - [`cache`] - Durable embedding cache
//! - [`ledger`] - Seen-once checks for companies and jobs
//! - [`stores`] - Storage implementations (memory, Postgres)
//! - [`testing`] - Mock implementations for testing

pub mod cache;
pub mod controller;
pub mod crawl;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod similarity;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

mod timeouts;

#[cfg(feature = "ollama")]
pub mod ai;

// Re-export core types at crate root
pub use cache::EmbeddingCache;
pub use controller::{AutomationController, ControlHandle, EngineState, RunStats};
pub use crawl::CrawlDriver;
pub use error::{EngineError, NavigationError, Result};
pub use filter::{Relevance, RelevanceFilter};
pub use ledger::DedupLedger;
pub use similarity::cosine_similarity;
pub use traits::{
    ActivitySink, ApplicationStore, BrowserDriver, CompanyStore, Embedder, EmbeddingCacheStore,
    EngineStore, Generator, InsertOutcome, PageLink, ScrollState, TracingSink,
};
pub use types::{
    ActivityEvent, ApplicationRecord, ApplicationStatus, CandidateProfile, CompanyRecord,
    CompanyStatus, CrawlConfig, EngineConfig, EventKind, JobLead, JobPage, OwnerId,
};

#[cfg(feature = "ollama")]
pub use ai::OllamaAI;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
