//! Crawler coordinator - main crawl orchestration logic
//!
//! A single coordinator task owns the frontier, the visited set, the path
//! synthesizer and the content repository. Workers on a `JoinSet` only do the
//! robots lookup and the extraction; their results are re-sequenced by
//! dispatch order before they are committed, so visit order equals dequeue
//! order no matter how the workers interleave.

use crate::config::Config;
use crate::crawler::frontier::{CrawlTask, Frontier, VisitedSet};
use crate::crawler::CrawlServices;
use crate::extract::{Extraction, ExtractionDispatcher};
use crate::output::{write_page, PathSynthesizer, INDEX_FILES};
use crate::repository::{ContentRepository, PageRecord};
use crate::state::{CrawlPhase, PageState};
use crate::url::{normalize_url, split_fragment, ScopeConfig, ScopeDecision, ScopeFilter};
use crate::{ConfigError, Result, ScraperError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Final state of one dequeued URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    pub url: String,
    pub state: PageState,
    /// Output path for exported pages, reason for everything else
    pub detail: Option<String>,
}

/// Everything a finished crawl produced
#[derive(Debug)]
pub struct CrawlReport {
    pub repository: ContentRepository,
    pub outcomes: Vec<PageOutcome>,
    pub phase: CrawlPhase,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// URLs still waiting in the frontier when the crawl stopped
    pub frontier_remaining: usize,
}

impl CrawlReport {
    pub fn count(&self, state: PageState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }

    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }
}

/// What a worker hands back to the coordinator
#[derive(Debug)]
enum WorkOutput {
    Rejected(ScopeDecision),
    Extracted(Extraction),
    Failed(ScraperError),
}

#[derive(Debug)]
struct Completed {
    seq: u64,
    task: CrawlTask,
    output: WorkOutput,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    seeds: Vec<String>,
    scope: Arc<ScopeConfig>,
    filter: ScopeFilter,
    dispatcher: ExtractionDispatcher,
    output_dir: PathBuf,
    concurrency: usize,
    max_depth: Option<u32>,
    export_fragments: bool,

    phase: CrawlPhase,
    frontier: Frontier,
    visited: VisitedSet,
    paths: PathSynthesizer,
    repository: ContentRepository,
    outcomes: Vec<PageOutcome>,
}

impl Coordinator {
    /// Creates a coordinator for one crawl run
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    /// * `services` - Renderer, fallback, fetcher and robots capabilities
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, in the `Idle` phase
    /// * `Err(ScraperError)` - The scope could not be derived from the seeds
    pub fn new(config: &Config, services: CrawlServices) -> Result<Self> {
        let crawl = &config.crawl;
        let scope = Arc::new(ScopeConfig::from_crawl_config(crawl)?);

        let filter = ScopeFilter::new(
            Arc::clone(&scope),
            services.robots,
            &config.user_agent.crawler_name,
        );
        let dispatcher = ExtractionDispatcher::new(
            services.renderer,
            services.fallback,
            services.fetcher,
            Duration::from_secs(config.fetch.render_timeout_secs),
            crawl.export_fragments,
        );

        Ok(Self {
            seeds: crawl.seeds.clone(),
            scope,
            filter,
            dispatcher,
            output_dir: config.output.directory.clone(),
            concurrency: crawl.concurrency.max(1),
            max_depth: crawl.max_depth,
            export_fragments: crawl.export_fragments,
            phase: CrawlPhase::Idle,
            frontier: Frontier::new(crawl.export_fragments),
            visited: VisitedSet::new(),
            paths: PathSynthesizer::with_reserved(INDEX_FILES.iter().copied()),
            repository: ContentRepository::new(),
            outcomes: Vec::new(),
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl to completion
    ///
    /// Seeds are parsed before anything is fetched; a bad seed aborts the run.
    /// A worker panic or an output write failure also aborts it.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl completed
    /// * `Err(ScraperError)` - The crawl was aborted
    pub async fn run(mut self) -> Result<CrawlReport> {
        let started_at = Utc::now();

        if let Err(e) = self.seed_frontier() {
            self.phase.transition(CrawlPhase::Aborted)?;
            return Err(e);
        }
        self.phase.transition(CrawlPhase::Running)?;
        tracing::info!(
            "Starting crawl: {} seed(s), budget {} pages, concurrency {}",
            self.frontier.len(),
            self.scope.max_pages,
            self.concurrency
        );

        if let Err(e) = self.crawl_loop().await {
            tracing::error!("Crawl aborted: {}", e);
            self.phase.transition(CrawlPhase::Aborted)?;
            return Err(e);
        }

        self.phase.transition(CrawlPhase::Completed)?;
        let finished_at = Utc::now();
        tracing::info!(
            "Crawl completed: {} pages exported ({} degraded), {} URLs left in frontier",
            self.repository.len(),
            self.repository.degraded_count(),
            self.frontier.len()
        );

        Ok(CrawlReport {
            repository: self.repository,
            outcomes: self.outcomes,
            phase: self.phase,
            started_at,
            finished_at,
            frontier_remaining: self.frontier.len(),
        })
    }

    fn seed_frontier(&mut self) -> Result<()> {
        if self.seeds.is_empty() {
            return Err(ScraperError::NoSeeds);
        }

        for seed in &self.seeds {
            let (url, fragment) = split_fragment(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;
            let fragment = fragment.filter(|_| self.export_fragments);
            if !self.frontier.push(CrawlTask::new(url, fragment, 0)) {
                tracing::debug!("Duplicate seed {}", seed);
            }
        }
        Ok(())
    }

    async fn crawl_loop(&mut self) -> Result<()> {
        let mut workers: JoinSet<Completed> = JoinSet::new();
        let mut ready: BTreeMap<u64, Completed> = BTreeMap::new();
        let mut next_seq: u64 = 0;
        let mut next_commit: u64 = 0;

        loop {
            while self.may_dispatch(next_seq - next_commit) {
                let Some(task) = self.frontier.pop() else {
                    break;
                };
                if let Some(task) = self.admit(task) {
                    let filter = self.filter.clone();
                    let dispatcher = self.dispatcher.clone();
                    workers.spawn(process_task(filter, dispatcher, next_seq, task));
                    next_seq += 1;
                }
            }

            if next_seq == next_commit {
                return Ok(());
            }

            let completed = match workers.join_next().await {
                Some(Ok(completed)) => completed,
                Some(Err(e)) => {
                    workers.abort_all();
                    return Err(ScraperError::Worker(e.to_string()));
                }
                None => {
                    return Err(ScraperError::Worker(format!(
                        "{} dispatched tasks never completed",
                        next_seq - next_commit
                    )))
                }
            };
            ready.insert(completed.seq, completed);

            while let Some(completed) = ready.remove(&next_commit) {
                next_commit += 1;
                if let Err(e) = self.commit(completed) {
                    workers.abort_all();
                    return Err(e);
                }
            }
        }
    }

    /// Whether another task may be dispatched with `outstanding` uncommitted
    fn may_dispatch(&self, outstanding: u64) -> bool {
        let remaining = self.scope.max_pages.saturating_sub(self.repository.len()) as u64;
        outstanding < self.concurrency as u64 && outstanding < remaining
    }

    /// Dequeue-time checks; returns the task when it should go to a worker
    fn admit(&mut self, task: CrawlTask) -> Option<CrawlTask> {
        if !self.visited.insert(task.key(self.export_fragments)) {
            tracing::trace!("Already visited {}", task.display_url());
            return None;
        }

        let decision = self.scope.check_static(&task.url);
        if !decision.is_accepted() {
            tracing::debug!("Out of scope {}: {}", task.display_url(), decision);
            self.record(&task, PageState::OutOfScope, Some(decision.to_string()));
            return None;
        }

        Some(task)
    }

    /// The single point where pages are accepted into the export
    fn commit(&mut self, completed: Completed) -> Result<()> {
        let Completed { task, output, .. } = completed;

        let extraction = match output {
            WorkOutput::Extracted(extraction) => extraction,
            WorkOutput::Rejected(decision) => {
                let state = match decision {
                    ScopeDecision::RobotsDisallowed => PageState::RobotsDenied,
                    _ => PageState::OutOfScope,
                };
                tracing::info!("Skipping {}: {}", task.display_url(), decision);
                self.record(&task, state, Some(decision.to_string()));
                return Ok(());
            }
            WorkOutput::Failed(e) => {
                tracing::warn!("Skipping {}: {}", task.display_url(), e);
                self.record(&task, PageState::Failed, Some(e.to_string()));
                return Ok(());
            }
        };

        if self.repository.len() >= self.scope.max_pages {
            tracing::debug!("Budget exhausted before {}", task.display_url());
            self.record(&task, PageState::BudgetExhausted, None);
            return Ok(());
        }

        let fragment = task.fragment.as_deref().filter(|_| self.export_fragments);
        let output_path = self.paths.synthesize(&task.url, fragment);
        let state = if extraction.is_degraded() {
            PageState::Degraded
        } else {
            PageState::Exported
        };

        let Extraction {
            title,
            markdown,
            links,
            metrics,
            summary,
            ..
        } = extraction;

        let record = PageRecord {
            source_url: task.url.to_string(),
            fragment: fragment.map(str::to_string),
            title,
            markdown_body: markdown,
            output_path: output_path.clone(),
            is_fragment: fragment.is_some(),
            word_count: metrics.word_count,
            estimated_read_minutes: metrics.estimated_read_minutes,
            first_h2_heading: metrics.first_h2_heading,
            detected_endpoints: metrics.detected_endpoints,
            visit_order: self.repository.len(),
            depth: task.depth,
            summary,
            degraded: state == PageState::Degraded,
        };

        self.repository.push(record)?;
        if let Some(record) = self.repository.records().last() {
            write_page(&self.output_dir, record)?;
        }

        if state == PageState::Degraded {
            tracing::warn!("Exported {} -> {} (degraded)", task.display_url(), output_path);
        } else {
            tracing::info!("Exported {} -> {}", task.display_url(), output_path);
        }
        self.record(&task, state, Some(output_path));

        if self.repository.len() % 10 == 0 {
            tracing::info!(
                "Progress: {} pages exported, {} in frontier",
                self.repository.len(),
                self.frontier.len()
            );
        }

        self.enqueue_links(&task, &links);
        Ok(())
    }

    /// Enqueues discovered links at `depth + 1`, in order of appearance
    fn enqueue_links(&mut self, parent: &CrawlTask, links: &[String]) {
        let depth = parent.depth + 1;
        if self.max_depth.is_some_and(|max| depth > max) {
            tracing::trace!("Depth limit reached below {}", parent.display_url());
            return;
        }

        for link in links {
            let url = match normalize_url(link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Failed to normalize URL {}: {}", link, e);
                    continue;
                }
            };

            if !self.scope.check_static(&url).is_accepted() {
                tracing::trace!("Not following {}", url);
                continue;
            }

            let task = CrawlTask::new(url, None, depth);
            let key = task.key(self.export_fragments);
            if self.visited.contains(&key) || self.frontier.contains_key(&key) {
                continue;
            }
            self.frontier.push(task);
        }
    }

    fn record(&mut self, task: &CrawlTask, state: PageState, detail: Option<String>) {
        self.outcomes.push(PageOutcome {
            url: task.display_url(),
            state,
            detail,
        });
    }
}

/// Worker body: robots-aware scope check, then extraction
async fn process_task(
    filter: ScopeFilter,
    dispatcher: ExtractionDispatcher,
    seq: u64,
    task: CrawlTask,
) -> Completed {
    let decision = filter.accept(&task.url).await;
    let output = if !decision.is_accepted() {
        WorkOutput::Rejected(decision)
    } else {
        match dispatcher
            .extract(&task.url, task.fragment.as_deref())
            .await
        {
            Ok(extraction) => WorkOutput::Extracted(extraction),
            Err(e) => WorkOutput::Failed(e),
        }
    };

    Completed { seq, task, output }
}
