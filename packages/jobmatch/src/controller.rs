//! Top-level automation state machine.
//!
//! One logical worker per run: the controller drives one job at a time
//! through stage-1 filtering, job-page navigation, stage-2 filtering, and
//! drafting. Pause is cooperative and takes effect at the checkpoint between
//! jobs; stop is a cancellation observed at every suspension point, so even a
//! hung provider cannot block shutdown past one bounded call.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::EmbeddingCache;
use crate::crawl::CrawlDriver;
use crate::error::{EngineError, Result};
use crate::filter::RelevanceFilter;
use crate::timeouts::bounded;
use crate::traits::{
    ActivitySink, BrowserDriver, Embedder, EngineStore, Generator, InsertOutcome,
};
use crate::types::{
    ActivityEvent, ApplicationRecord, CandidateProfile, CrawlConfig, EngineConfig, JobLead,
    OwnerId,
};

/// Lifecycle of an automation run.
///
/// `Stopped` is the normal terminal state (completion or `stop`); `Failed`
/// is the distinct terminal state for an unrecoverable resource failure,
/// never a silent stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Running,
    Paused,
    Stopped,
    Failed,
}

/// Pause/resume intent. Stop is a cancellation, not a command, so it cannot
/// be overwritten by a later resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunCommand {
    Run,
    Pause,
}

/// Counters accumulated over a run, in the same causal order as events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub companies_visited: usize,
    pub jobs_seen: usize,
    pub matched: usize,
    pub skipped: usize,
    pub errored: usize,
}

/// Handle for driving a run from the host's UI boundary.
#[derive(Clone)]
pub struct ControlHandle {
    command: Arc<watch::Sender<RunCommand>>,
    cancel: CancellationToken,
    state: watch::Receiver<EngineState>,
}

impl ControlHandle {
    /// Request a pause; takes effect at the next between-jobs checkpoint.
    pub fn pause(&self) {
        let _ = self.command.send(RunCommand::Pause);
    }

    /// Resume a paused run; the sequence continues where it left off.
    pub fn resume(&self) {
        let _ = self.command.send(RunCommand::Run);
    }

    /// Stop the run. Terminal: the run cannot be resumed afterwards.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Current state of the run.
    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Wait until the run reaches `target`. Returns `false` if the
    /// controller went away first.
    pub async fn wait_for(&mut self, target: EngineState) -> bool {
        loop {
            if *self.state.borrow() == target {
                return true;
            }
            if self.state.changed().await.is_err() {
                return false;
            }
        }
    }
}

/// The automation controller: `Idle → Running ⇄ Paused → Stopped`.
pub struct AutomationController<B, S, E, G> {
    browser: Arc<B>,
    store: Arc<S>,
    cache: EmbeddingCache<S, E>,
    filter: RelevanceFilter<S, E>,
    generator: Arc<G>,
    sink: Arc<dyn ActivitySink>,
    config: EngineConfig,
    crawl_config: CrawlConfig,
    state_tx: watch::Sender<EngineState>,
    command_tx: Arc<watch::Sender<RunCommand>>,
    command_rx: watch::Receiver<RunCommand>,
    cancel: CancellationToken,
}

impl<B, S, E, G> AutomationController<B, S, E, G>
where
    B: BrowserDriver,
    S: EngineStore,
    E: Embedder,
    G: Generator,
{
    pub fn new(
        browser: Arc<B>,
        store: Arc<S>,
        embedder: Arc<E>,
        generator: Arc<G>,
        sink: Arc<dyn ActivitySink>,
        config: EngineConfig,
        crawl_config: CrawlConfig,
    ) -> Self {
        let cache = EmbeddingCache::new(Arc::clone(&store), embedder);
        let filter = RelevanceFilter::new(cache.clone(), &config);
        let (state_tx, _) = watch::channel(EngineState::Idle);
        let (command_tx, command_rx) = watch::channel(RunCommand::Run);

        Self {
            browser,
            store,
            cache,
            filter,
            generator,
            sink,
            config,
            crawl_config,
            state_tx,
            command_tx: Arc::new(command_tx),
            command_rx,
            cancel: CancellationToken::new(),
        }
    }

    /// Handle for pausing, resuming, and stopping the run.
    pub fn handle(&self) -> ControlHandle {
        ControlHandle {
            command: Arc::clone(&self.command_tx),
            cancel: self.cancel.clone(),
            state: self.state_tx.subscribe(),
        }
    }

    /// Current state of the run.
    pub fn state(&self) -> EngineState {
        *self.state_tx.borrow()
    }

    /// Run the automation to completion (or stop/failure).
    ///
    /// Requires the profile embedding to be computable before entering
    /// `Running`; stop and completion both end in `Stopped`, with the
    /// accumulated stats returned either way.
    pub async fn start(&mut self, profile: CandidateProfile) -> Result<RunStats> {
        let current = self.state();
        if current != EngineState::Idle {
            return Err(EngineError::InvalidStart {
                reason: format!("run state is {current:?}, expected Idle"),
            });
        }

        let profile_embedding = bounded(
            "embed candidate persona",
            self.config.call_timeout,
            self.cache
                .get_or_compute(&self.config.embedding_model, &profile.persona),
        )
        .await?;
        debug!(
            dimensions = profile_embedding.len(),
            "Profile embedding ready"
        );

        let mut driver = CrawlDriver::new(
            Arc::clone(&self.browser),
            Arc::clone(&self.store),
            self.crawl_config.clone(),
            profile.owner_id,
            self.config.call_timeout,
        );

        self.set_state(EngineState::Running);
        self.emit(ActivityEvent::info("Automation started"));

        let mut stats = RunStats::default();
        let outcome = self
            .run_loop(&mut driver, &profile, &profile_embedding, &mut stats)
            .await;
        stats.companies_visited = driver.companies_visited();

        match outcome {
            Ok(()) => {
                self.emit(ActivityEvent::success(format!(
                    "Run complete: {} matched, {} skipped, {} errors",
                    stats.matched, stats.skipped, stats.errored
                )));
                self.set_state(EngineState::Stopped);
                Ok(stats)
            }
            Err(EngineError::Cancelled) => {
                self.emit(ActivityEvent::info("Automation stopped"));
                self.set_state(EngineState::Stopped);
                Ok(stats)
            }
            Err(err) => {
                error!(error = %err, "Run ended by unrecoverable failure");
                self.emit(ActivityEvent::error(format!("Run failed: {err}")));
                self.set_state(EngineState::Failed);
                Err(err)
            }
        }
    }

    async fn run_loop(
        &self,
        driver: &mut CrawlDriver<B, S>,
        profile: &CandidateProfile,
        profile_embedding: &[f32],
        stats: &mut RunStats,
    ) -> Result<()> {
        loop {
            self.checkpoint().await?;

            let lead = self.with_cancel(driver.next_lead()).await?;
            let Some(lead) = lead else {
                return Ok(());
            };
            stats.jobs_seen += 1;

            match self
                .process_lead(driver, profile, profile_embedding, &lead, stats)
                .await
            {
                Ok(()) => {}
                Err(err) if err.is_fatal_to_run() => return Err(err),
                Err(err) => {
                    // One job's failure never aborts the run. The job stays
                    // unrecorded so a later run can retry it.
                    stats.errored += 1;
                    error!(job_title = %lead.job_title, error = %err, "Job processing failed");
                    self.emit(
                        ActivityEvent::error(format!(
                            "Failed to process {}: {err}",
                            lead.job_title
                        ))
                        .with_job_title(&lead.job_title),
                    );
                }
            }
        }
    }

    async fn process_lead(
        &self,
        driver: &mut CrawlDriver<B, S>,
        profile: &CandidateProfile,
        profile_embedding: &[f32],
        lead: &JobLead,
        stats: &mut RunStats,
    ) -> Result<()> {
        let owner_id = profile.owner_id;

        // Stage 1: title check, no navigation spent yet.
        let title_check = self
            .with_cancel(bounded(
                "title relevance check",
                self.config.call_timeout,
                self.filter.check_title(profile_embedding, &lead.job_title),
            ))
            .await?;
        if !title_check.relevant {
            self.record_skip(owner_id, lead, title_check.score, "title below threshold", stats)
                .await?;
            return Ok(());
        }

        // Stage 2: open the job page.
        let page = self.with_cancel(driver.open_job(&lead.job_url)).await?;
        if page.already_applied {
            self.record_skip(owner_id, lead, 0, "already applied", stats)
                .await?;
            return Ok(());
        }

        let description_check = self
            .with_cancel(bounded(
                "description relevance check",
                self.config.call_timeout,
                self.filter
                    .check_description(profile_embedding, &page.description),
            ))
            .await?;
        if !description_check.relevant {
            self.record_skip(
                owner_id,
                lead,
                description_check.score,
                "description below threshold",
                stats,
            )
            .await?;
            return Ok(());
        }

        // Draft. Generation failures fall back to the generic letter so the
        // job still reaches a terminal state.
        let prompt = cover_letter_prompt(lead, &profile.persona, &page.description);
        let letter = match self
            .with_cancel(bounded(
                "draft cover letter",
                self.config.call_timeout,
                self.generator.generate(&prompt),
            ))
            .await
        {
            Ok(letter) => letter,
            Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
            Err(err) => {
                warn!(error = %err, "Generation unavailable, using fallback letter");
                self.config.fallback_cover_letter.clone()
            }
        };

        // Fill-only: the form is never submitted.
        self.with_cancel(driver.fill_cover_letter(&letter)).await?;

        let record = ApplicationRecord::submitted(
            owner_id,
            &lead.job_title,
            &lead.company_name,
            &lead.job_url,
            letter,
            description_check.score,
        );
        match self.store.insert_application(&record).await? {
            InsertOutcome::AlreadyExists => {
                debug!(job_url = %lead.job_url, "Job already handled by another run");
                return Ok(());
            }
            InsertOutcome::Inserted => {}
        }

        stats.matched += 1;
        self.emit(
            ActivityEvent::matched(format!(
                "Matched {} at {}",
                lead.job_title, lead.company_name
            ))
            .with_job_title(&lead.job_title)
            .with_match_score(description_check.score),
        );
        self.emit(
            ActivityEvent::success(format!("Application drafted for {}", lead.job_title))
                .with_job_title(&lead.job_title),
        );
        Ok(())
    }

    async fn record_skip(
        &self,
        owner_id: OwnerId,
        lead: &JobLead,
        score: i32,
        reason: &str,
        stats: &mut RunStats,
    ) -> Result<()> {
        let record = ApplicationRecord::skipped(
            owner_id,
            &lead.job_title,
            &lead.company_name,
            &lead.job_url,
            score,
            reason,
        );
        match self.store.insert_application(&record).await? {
            InsertOutcome::AlreadyExists => {
                debug!(job_url = %lead.job_url, "Job already handled by another run");
            }
            InsertOutcome::Inserted => {
                stats.skipped += 1;
                self.emit(
                    ActivityEvent::skip(format!("Skipped {}: {reason}", lead.job_title))
                        .with_job_title(&lead.job_title)
                        .with_match_score(score),
                );
            }
        }
        Ok(())
    }

    /// Between-jobs checkpoint: observes stop immediately and parks while
    /// paused. Pausing never interrupts an in-flight job.
    async fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if *self.command_rx.borrow() != RunCommand::Pause {
            return Ok(());
        }

        self.set_state(EngineState::Paused);
        self.emit(ActivityEvent::info("Automation paused"));

        let mut command_rx = self.command_rx.clone();
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
                changed = command_rx.changed() => {
                    if changed.is_err() {
                        return Err(EngineError::Cancelled);
                    }
                }
            }
            if *command_rx.borrow() == RunCommand::Run {
                break;
            }
        }

        self.set_state(EngineState::Running);
        self.emit(ActivityEvent::info("Automation resumed"));
        Ok(())
    }

    /// Race a suspension point against stop, so cancellation is observable
    /// within one external call.
    async fn with_cancel<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            result = fut => result,
        }
    }

    fn set_state(&self, state: EngineState) {
        info!(state = ?state, "Engine state changed");
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: ActivityEvent) {
        self.sink.emit(event);
    }
}

fn cover_letter_prompt(lead: &JobLead, persona: &str, description: &str) -> String {
    format!(
        "Draft a concise, personable cover letter for the position \"{}\" at {}.\n\n\
         Candidate profile:\n{persona}\n\nJob description:\n{description}",
        lead.job_title, lead.company_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{CollectingSink, MockEmbedder, MockGenerator, ScriptedSite};
    use uuid::Uuid;

    fn controller_for(
        site: ScriptedSite,
        embedder: MockEmbedder,
    ) -> AutomationController<crate::testing::MockBrowser, MemoryStore, MockEmbedder, MockGenerator>
    {
        AutomationController::new(
            Arc::new(site.into_browser()),
            Arc::new(MemoryStore::new()),
            Arc::new(embedder),
            Arc::new(MockGenerator::new()),
            Arc::new(CollectingSink::new()),
            EngineConfig::default(),
            CrawlConfig::new("https://listings.example.com/browse"),
        )
    }

    #[tokio::test]
    async fn start_requires_idle_state() {
        let site = ScriptedSite::new("https://listings.example.com/browse");
        let mut controller = controller_for(site, MockEmbedder::new());
        let profile = CandidateProfile::new(OwnerId(Uuid::new_v4()), "rust engineer");

        controller.start(profile.clone()).await.unwrap();
        assert_eq!(controller.state(), EngineState::Stopped);

        let result = controller.start(profile).await;
        assert!(matches!(result, Err(EngineError::InvalidStart { .. })));
    }

    #[tokio::test]
    async fn profile_embedding_failure_prevents_start() {
        let site = ScriptedSite::new("https://listings.example.com/browse");
        let mut controller = controller_for(site, MockEmbedder::new().with_failure());
        let profile = CandidateProfile::new(OwnerId(Uuid::new_v4()), "rust engineer");

        let result = controller.start(profile).await;
        assert!(matches!(result, Err(EngineError::Embedding(_))));
        assert_eq!(controller.state(), EngineState::Idle);
    }
}
