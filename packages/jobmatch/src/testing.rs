//! Testing utilities including mock implementations.
//!
//! These are useful for testing hosts that embed the engine without a real
//! browser, model runtime, or database. All mocks record their calls for
//! assertions and support failure injection.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::error::{EngineError, NavigationError, Result};
use crate::traits::{
    ActivitySink, BrowserDriver, Embedder, Generator, PageLink, ScrollState,
};
use crate::types::{normalize_text, ActivityEvent, CrawlConfig, EventKind};

// =============================================================================
// Mock Embedder
// =============================================================================

/// A mock embedding provider with canned vectors and failure injection.
///
/// Texts without a canned vector get a deterministic pseudo-embedding, so
/// cache tests observe bit-identical results without configuration.
#[derive(Default)]
pub struct MockEmbedder {
    embeddings: Mutex<HashMap<String, Vec<f32>>>,
    calls: Mutex<Vec<(String, String)>>,
    fail_all: AtomicBool,
    fail_first: Mutex<usize>,
    fail_after: Mutex<Option<usize>>,
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: 8,
            ..Default::default()
        }
    }

    /// Canned vector for a text (matched after normalization).
    pub fn with_embedding(self, text: impl AsRef<str>, embedding: Vec<f32>) -> Self {
        self.embeddings
            .lock()
            .unwrap()
            .insert(normalize_text(text.as_ref()), embedding);
        self
    }

    /// Every call fails.
    pub fn with_failure(self) -> Self {
        self.fail_all.store(true, Ordering::SeqCst);
        self
    }

    /// The first `n` calls fail, later ones succeed.
    pub fn fail_times(self, n: usize) -> Self {
        *self.fail_first.lock().unwrap() = n;
        self
    }

    /// The first `n` calls succeed, later ones fail.
    pub fn with_failure_after(self, n: usize) -> Self {
        *self.fail_after.lock().unwrap() = Some(n);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// All `(model, text)` pairs requested so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

fn derived_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    if dimensions == 0 {
        return Vec::new();
    }
    let mut embedding = vec![0.0f32; dimensions];
    for (i, byte) in text.bytes().enumerate() {
        embedding[i % dimensions] += f32::from(byte) / 255.0;
    }
    embedding
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let call_index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((model.to_string(), text.to_string()));
            calls.len()
        };

        let failing = self.fail_all.load(Ordering::SeqCst)
            || call_index <= *self.fail_first.lock().unwrap()
            || self
                .fail_after
                .lock()
                .unwrap()
                .is_some_and(|n| call_index > n);
        if failing {
            return Err(EngineError::Embedding(
                "mock embedding provider offline".into(),
            ));
        }

        if let Some(embedding) = self.embeddings.lock().unwrap().get(&normalize_text(text)) {
            return Ok(embedding.clone());
        }
        Ok(derived_embedding(text, self.dimensions))
    }
}

// =============================================================================
// Mock Generator
// =============================================================================

/// A mock text-generation provider.
///
/// An optional gate (semaphore) lets tests hold a generation call in flight,
/// which is how the pause/stop checkpoints are exercised deterministically.
#[derive(Default)]
pub struct MockGenerator {
    response: Mutex<String>,
    fail: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            response: Mutex::new("Dear hiring team, I would be a great fit.".to_string()),
            ..Default::default()
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        *self.response.lock().unwrap() = response.into();
        self
    }

    pub fn with_failure(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    /// Each call must acquire a permit from `gate` before responding.
    pub fn with_gate(self, gate: Arc<Semaphore>) -> Self {
        *self.gate.lock().unwrap() = Some(gate);
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        // Record before gating so tests can observe an in-flight call.
        self.prompts.lock().unwrap().push(prompt.to_string());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| EngineError::Generation("gate closed".into()))?;
            permit.forget();
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(EngineError::Generation(
                "mock generation provider offline".into(),
            ));
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

// =============================================================================
// Mock Browser
// =============================================================================

/// A page served by [`MockBrowser`].
#[derive(Debug, Default, Clone)]
pub struct MockPage {
    links: HashMap<String, Vec<PageLink>>,
    text: HashMap<String, String>,
    markers: HashSet<String>,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links(mut self, selector: impl Into<String>, links: Vec<PageLink>) -> Self {
        self.links.insert(selector.into(), links);
        self
    }

    pub fn with_text(mut self, selector: impl Into<String>, text: impl Into<String>) -> Self {
        self.text.insert(selector.into(), text.into());
        self
    }

    pub fn with_marker(mut self, selector: impl Into<String>) -> Self {
        self.markers.insert(selector.into());
        self
    }
}

/// A scripted single-page browser.
///
/// Scroll positions are monotonically increasing counters stamped per
/// navigation, so tests can assert that each restore replays the position
/// captured before leaving the listings page.
#[derive(Default)]
pub struct MockBrowser {
    pages: Mutex<HashMap<String, MockPage>>,
    current: Mutex<String>,
    navigations: Mutex<Vec<String>>,
    typed: Mutex<Vec<(String, String)>>,
    scroll_counter: Mutex<u64>,
    captures: Mutex<Vec<u64>>,
    restores: Mutex<Vec<u64>>,
    failing_urls: Mutex<HashSet<String>>,
    session_lost: AtomicBool,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, page: MockPage) -> Self {
        self.pages.lock().unwrap().insert(url.into(), page);
        self
    }

    /// Navigation to this URL fails with a page-load error.
    pub fn with_navigation_failure(self, url: impl Into<String>) -> Self {
        self.failing_urls.lock().unwrap().insert(url.into());
        self
    }

    /// Simulate the browser session dying; every later call fails fatally.
    pub fn lose_session(&self) {
        self.session_lost.store(true, Ordering::SeqCst);
    }

    pub fn visited(&self, url: &str) -> bool {
        self.navigations.lock().unwrap().iter().any(|u| u == url)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// All `(selector, text)` pairs typed so far.
    pub fn typed_text(&self) -> Vec<(String, String)> {
        self.typed.lock().unwrap().clone()
    }

    pub fn scroll_captures(&self) -> Vec<u64> {
        self.captures.lock().unwrap().clone()
    }

    pub fn scroll_restores(&self) -> Vec<u64> {
        self.restores.lock().unwrap().clone()
    }

    fn check_session(&self) -> Result<()> {
        if self.session_lost.load(Ordering::SeqCst) {
            return Err(EngineError::DriverLost("session closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.check_session()?;
        if self.failing_urls.lock().unwrap().contains(url) {
            return Err(EngineError::Navigation(NavigationError::Load {
                url: url.to_string(),
            }));
        }
        *self.current.lock().unwrap() = url.to_string();
        self.navigations.lock().unwrap().push(url.to_string());
        *self.scroll_counter.lock().unwrap() += 1;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.check_session()?;
        Ok(self.current.lock().unwrap().clone())
    }

    async fn find_links(&self, selector: &str) -> Result<Vec<PageLink>> {
        self.check_session()?;
        let current = self.current.lock().unwrap().clone();
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&current)
            .and_then(|page| page.links.get(selector).cloned())
            .unwrap_or_default())
    }

    async fn scroll_position(&self) -> Result<ScrollState> {
        self.check_session()?;
        let position = *self.scroll_counter.lock().unwrap();
        self.captures.lock().unwrap().push(position);
        Ok(ScrollState(serde_json::json!(position)))
    }

    async fn restore_scroll(&self, state: &ScrollState) -> Result<()> {
        self.check_session()?;
        let position = state.0.as_u64().unwrap_or_default();
        self.restores.lock().unwrap().push(position);
        Ok(())
    }

    async fn text_content(&self, selector: &str) -> Result<String> {
        self.check_session()?;
        let current = self.current.lock().unwrap().clone();
        self.pages
            .lock()
            .unwrap()
            .get(&current)
            .and_then(|page| page.text.get(selector).cloned())
            .ok_or_else(|| {
                EngineError::Navigation(NavigationError::SelectorNotFound {
                    selector: selector.to_string(),
                })
            })
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        self.check_session()?;
        self.typed
            .lock()
            .unwrap()
            .push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn has_marker(&self, selector: &str) -> Result<bool> {
        self.check_session()?;
        let current = self.current.lock().unwrap().clone();
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&current)
            .map(|page| page.markers.contains(selector))
            .unwrap_or(false))
    }
}

// =============================================================================
// Scripted site builder
// =============================================================================

/// Builds a [`MockBrowser`] wired as a small listings site, using the default
/// selectors of [`CrawlConfig`].
pub struct ScriptedSite {
    listings_url: String,
    companies: Vec<(String, String, Vec<(String, String)>)>,
    applied: HashSet<String>,
    descriptions: HashMap<String, String>,
}

impl ScriptedSite {
    pub fn new(listings_url: impl Into<String>) -> Self {
        Self {
            listings_url: listings_url.into(),
            companies: Vec::new(),
            applied: HashSet::new(),
            descriptions: HashMap::new(),
        }
    }

    /// Add a company page with its job postings as `(url, title)` pairs.
    pub fn company(
        mut self,
        url: impl Into<String>,
        name: impl Into<String>,
        jobs: Vec<(&str, &str)>,
    ) -> Self {
        self.companies.push((
            url.into(),
            name.into(),
            jobs.into_iter()
                .map(|(u, t)| (u.to_string(), t.to_string()))
                .collect(),
        ));
        self
    }

    /// Mark a job page with the "already applied" marker.
    pub fn already_applied(mut self, job_url: impl Into<String>) -> Self {
        self.applied.insert(job_url.into());
        self
    }

    /// Set a job page's description text (defaults to empty).
    pub fn description(mut self, job_url: impl Into<String>, text: impl Into<String>) -> Self {
        self.descriptions.insert(job_url.into(), text.into());
        self
    }

    pub fn into_browser(self) -> MockBrowser {
        let config = CrawlConfig::new(&self.listings_url);
        let company_links = self
            .companies
            .iter()
            .map(|(url, name, _)| PageLink::new(url, name))
            .collect();
        let mut browser = MockBrowser::new().with_page(
            &self.listings_url,
            MockPage::new().with_links(&config.company_link_selector, company_links),
        );

        for (company_url, name, jobs) in &self.companies {
            let job_links = jobs
                .iter()
                .map(|(url, title)| PageLink::new(url, title))
                .collect();
            browser = browser.with_page(
                company_url,
                MockPage::new()
                    .with_text(&config.company_name_selector, name)
                    .with_links(&config.job_link_selector, job_links),
            );

            for (job_url, _) in jobs {
                let description = self
                    .descriptions
                    .get(job_url)
                    .cloned()
                    .unwrap_or_default();
                let mut page =
                    MockPage::new().with_text(&config.description_selector, description);
                if self.applied.contains(job_url) {
                    page = page.with_marker(&config.applied_marker_selector);
                }
                browser = browser.with_page(job_url, page);
            }
        }
        browser
    }
}

// =============================================================================
// Collecting sink
// =============================================================================

/// Sink that records every event for assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ActivityEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ActivityEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl ActivitySink for CollectingSink {
    fn emit(&self, event: ActivityEvent) {
        self.events.lock().unwrap().push(event);
    }
}
