//! Page-by-page discovery of companies and their job postings.
//!
//! The driver produces a lazy, finite, non-restartable sequence of leads for
//! the current run. It owns the listings-page position: after visiting a
//! company it returns to the listings page and restores the scroll position,
//! so enumeration neither misses nor duplicates company links.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ledger::DedupLedger;
use crate::timeouts::bounded;
use crate::traits::{
    ApplicationStore, BrowserDriver, CompanyStore, InsertOutcome, PageLink, ScrollState,
};
use crate::types::{CompanyRecord, CompanyStatus, CrawlConfig, JobLead, JobPage, OwnerId};

pub struct CrawlDriver<B, S> {
    browser: Arc<B>,
    store: Arc<S>,
    ledger: DedupLedger<S>,
    config: CrawlConfig,
    owner_id: OwnerId,
    call_timeout: Duration,

    /// Company URLs already handled this run, including known-old ones.
    handled_companies: HashSet<String>,
    pending_jobs: VecDeque<JobLead>,
    listing_scroll: Option<ScrollState>,
    exhausted: bool,
    companies_visited: usize,
}

impl<B, S> CrawlDriver<B, S>
where
    B: BrowserDriver,
    S: CompanyStore + ApplicationStore,
{
    pub fn new(
        browser: Arc<B>,
        store: Arc<S>,
        config: CrawlConfig,
        owner_id: OwnerId,
        call_timeout: Duration,
    ) -> Self {
        Self {
            browser,
            ledger: DedupLedger::new(Arc::clone(&store)),
            store,
            config,
            owner_id,
            call_timeout,
            handled_companies: HashSet::new(),
            pending_jobs: VecDeque::new(),
            listing_scroll: None,
            exhausted: false,
            companies_visited: 0,
        }
    }

    /// Companies recorded by this run so far.
    pub fn companies_visited(&self) -> usize {
        self.companies_visited
    }

    /// Next `(company, job)` lead, or `None` once the listings page holds no
    /// unseen companies. The sequence does not restart: after `None`, every
    /// later call returns `None`.
    pub async fn next_lead(&mut self) -> Result<Option<JobLead>> {
        loop {
            if let Some(lead) = self.pending_jobs.pop_front() {
                return Ok(Some(lead));
            }
            if self.exhausted {
                return Ok(None);
            }

            match self.discover_next_company().await {
                Ok(true) => continue,
                Ok(false) => {
                    self.exhausted = true;
                    info!("Listings exhausted, crawl sequence complete");
                    return Ok(None);
                }
                Err(err) if err.is_fatal_to_run() => return Err(err),
                Err(err) => {
                    // Transient infrastructure: the company stays unrecorded
                    // so a later run can retry it.
                    warn!(error = %err, "Company visit failed, moving to next");
                    continue;
                }
            }
        }
    }

    /// Visit one new company and queue its unseen jobs.
    ///
    /// Returns `false` when no unseen company link remains.
    async fn discover_next_company(&mut self) -> Result<bool> {
        self.return_to_listings().await?;

        let links = bounded(
            "enumerate company links",
            self.call_timeout,
            self.browser.find_links(&self.config.company_link_selector),
        )
        .await?;

        let mut chosen: Option<PageLink> = None;
        for link in links {
            if self.handled_companies.contains(&link.url) {
                continue;
            }
            if !self.ledger.is_new_company(self.owner_id, &link.url).await? {
                self.handled_companies.insert(link.url);
                continue;
            }
            chosen = Some(link);
            break;
        }

        let Some(link) = chosen else {
            return Ok(false);
        };
        self.handled_companies.insert(link.url.clone());

        // Keep our place before navigating away from the listings page.
        let scroll = bounded(
            "capture scroll position",
            self.call_timeout,
            self.browser.scroll_position(),
        )
        .await?;
        self.listing_scroll = Some(scroll);

        self.visit_company(&link).await?;
        Ok(true)
    }

    async fn visit_company(&mut self, link: &PageLink) -> Result<()> {
        bounded(
            "navigate to company",
            self.call_timeout,
            self.browser.navigate(&link.url),
        )
        .await?;

        let name = match bounded(
            "read company name",
            self.call_timeout,
            self.browser.text_content(&self.config.company_name_selector),
        )
        .await
        {
            Ok(name) if !name.trim().is_empty() => name,
            _ => link.label.clone(),
        };

        let record = CompanyRecord::discovered(self.owner_id, &link.url, name);
        match self.store.insert_company(&record).await? {
            InsertOutcome::AlreadyExists => {
                debug!(url = %link.url, "Company already claimed by another run");
                return Ok(());
            }
            InsertOutcome::Inserted => {}
        }

        let job_links = bounded(
            "enumerate job links",
            self.call_timeout,
            self.browser.find_links(&self.config.job_link_selector),
        )
        .await?;

        let mut queued = 0;
        for job in job_links {
            if self.ledger.is_new_job(self.owner_id, &job.url).await? {
                self.pending_jobs.push_back(JobLead {
                    company_name: record.name.clone(),
                    company_url: record.url.clone(),
                    job_url: job.url,
                    job_title: job.label,
                });
                queued += 1;
            }
        }

        self.store
            .update_company_status(record.id, CompanyStatus::Visited)
            .await?;
        self.companies_visited += 1;

        info!(company = %record.name, jobs_queued = queued, "Company visited");
        Ok(())
    }

    async fn return_to_listings(&self) -> Result<()> {
        let current = bounded(
            "read current url",
            self.call_timeout,
            self.browser.current_url(),
        )
        .await?;
        if current == self.config.listings_url {
            return Ok(());
        }

        bounded(
            "navigate to listings",
            self.call_timeout,
            self.browser.navigate(&self.config.listings_url),
        )
        .await?;

        if let Some(scroll) = &self.listing_scroll {
            bounded(
                "restore scroll position",
                self.call_timeout,
                self.browser.restore_scroll(scroll),
            )
            .await?;
        }
        Ok(())
    }

    /// Open a job page. An "already applied" marker short-circuits without
    /// reading the description.
    pub async fn open_job(&self, job_url: &str) -> Result<JobPage> {
        bounded(
            "navigate to job",
            self.call_timeout,
            self.browser.navigate(job_url),
        )
        .await?;

        let already_applied = bounded(
            "check applied marker",
            self.call_timeout,
            self.browser.has_marker(&self.config.applied_marker_selector),
        )
        .await?;
        if already_applied {
            return Ok(JobPage {
                description: String::new(),
                already_applied: true,
            });
        }

        let description = bounded(
            "read job description",
            self.call_timeout,
            self.browser.text_content(&self.config.description_selector),
        )
        .await?;

        Ok(JobPage {
            description,
            already_applied: false,
        })
    }

    /// Fill the cover letter field on the current job page. Fill-only: the
    /// engine never submits the form.
    pub async fn fill_cover_letter(&self, text: &str) -> Result<()> {
        bounded(
            "fill cover letter",
            self.call_timeout,
            self.browser
                .type_text(&self.config.cover_letter_selector, text),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{MockBrowser, ScriptedSite};
    use uuid::Uuid;

    const LISTINGS: &str = "https://listings.example.com/browse";

    fn driver_for(
        browser: Arc<MockBrowser>,
        store: Arc<MemoryStore>,
    ) -> CrawlDriver<MockBrowser, MemoryStore> {
        CrawlDriver::new(
            browser,
            store,
            CrawlConfig::new(LISTINGS),
            OwnerId(Uuid::new_v4()),
            Duration::from_secs(5),
        )
    }

    fn two_company_site() -> ScriptedSite {
        ScriptedSite::new(LISTINGS)
            .company("https://c.example.com/acme", "Acme", vec![
                ("https://c.example.com/acme/jobs/1", "Rust Engineer"),
                ("https://c.example.com/acme/jobs/2", "Staff Engineer"),
            ])
            .company("https://c.example.com/globex", "Globex", vec![
                ("https://c.example.com/globex/jobs/9", "Data Engineer"),
            ])
    }

    #[tokio::test]
    async fn yields_every_job_of_every_new_company() {
        let browser = Arc::new(two_company_site().into_browser());
        let store = Arc::new(MemoryStore::new());
        let mut driver = driver_for(browser, Arc::clone(&store));

        let mut titles = Vec::new();
        while let Some(lead) = driver.next_lead().await.unwrap() {
            titles.push(lead.job_title);
        }

        assert_eq!(titles, ["Rust Engineer", "Staff Engineer", "Data Engineer"]);
        assert_eq!(store.company_count(), 2);

        // Non-restartable: the sequence stays finished.
        assert!(driver.next_lead().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seen_companies_are_not_revisited() {
        let owner = OwnerId(Uuid::new_v4());
        let store = Arc::new(MemoryStore::new());
        let record = CompanyRecord::discovered(owner, "https://c.example.com/acme", "Acme");
        store.insert_company(&record).await.unwrap();

        let browser = Arc::new(two_company_site().into_browser());
        let mut driver = CrawlDriver::new(
            Arc::clone(&browser),
            Arc::clone(&store),
            CrawlConfig::new(LISTINGS),
            owner,
            Duration::from_secs(5),
        );

        let mut titles = Vec::new();
        while let Some(lead) = driver.next_lead().await.unwrap() {
            titles.push(lead.job_title);
        }

        assert_eq!(titles, ["Data Engineer"]);
        assert!(
            !browser.visited("https://c.example.com/acme"),
            "a recorded company must not be navigated to again"
        );
    }

    #[tokio::test]
    async fn scroll_position_is_restored_between_companies() {
        let browser = Arc::new(two_company_site().into_browser());
        let store = Arc::new(MemoryStore::new());
        let mut driver = driver_for(Arc::clone(&browser), store);

        while driver.next_lead().await.unwrap().is_some() {}

        let captured = browser.scroll_captures();
        let restored = browser.scroll_restores();
        assert!(!restored.is_empty());
        // Every restore replays a previously captured position, in order.
        assert_eq!(restored, captured[..restored.len()].to_vec());
    }

    #[tokio::test]
    async fn company_navigation_failure_skips_to_next_company() {
        let browser = Arc::new(
            two_company_site()
                .into_browser()
                .with_navigation_failure("https://c.example.com/acme"),
        );
        let store = Arc::new(MemoryStore::new());
        let mut driver = driver_for(browser, Arc::clone(&store));

        let mut titles = Vec::new();
        while let Some(lead) = driver.next_lead().await.unwrap() {
            titles.push(lead.job_title);
        }

        assert_eq!(titles, ["Data Engineer"]);
        // The failed company stays unrecorded so a later run retries it.
        assert_eq!(store.company_count(), 1);
    }

    #[tokio::test]
    async fn open_job_reports_already_applied_marker() {
        let site = ScriptedSite::new(LISTINGS)
            .company("https://c.example.com/acme", "Acme", vec![
                ("https://c.example.com/acme/jobs/1", "Rust Engineer"),
            ])
            .already_applied("https://c.example.com/acme/jobs/1");
        let browser = Arc::new(site.into_browser());
        let store = Arc::new(MemoryStore::new());
        let mut driver = driver_for(browser, store);

        let lead = driver.next_lead().await.unwrap().unwrap();
        let page = driver.open_job(&lead.job_url).await.unwrap();

        assert!(page.already_applied);
        assert!(page.description.is_empty());
    }

    #[tokio::test]
    async fn open_job_reads_description() {
        let site = ScriptedSite::new(LISTINGS)
            .company("https://c.example.com/acme", "Acme", vec![
                ("https://c.example.com/acme/jobs/1", "Rust Engineer"),
            ])
            .description("https://c.example.com/acme/jobs/1", "We build databases in Rust.");
        let browser = Arc::new(site.into_browser());
        let store = Arc::new(MemoryStore::new());
        let mut driver = driver_for(browser, store);

        let lead = driver.next_lead().await.unwrap().unwrap();
        let page = driver.open_job(&lead.job_url).await.unwrap();

        assert!(!page.already_applied);
        assert_eq!(page.description, "We build databases in Rust.");
    }
}
