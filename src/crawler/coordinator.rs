//! Crawl coordinator - phased harvest orchestration
//!
//! This module drives one run through its phases:
//! - `Discover`: prepare the output directory, fetch the entry page, seed the
//!   navigation set from its links
//! - `CrawlNav`: fetch navigation pages in bounded batches and collect media
//!   candidates from them
//! - `FetchMedia`: download every candidate through the content-addressed
//!   downloader under its own limiter
//! - `Done`: assemble the final report
//!
//! All shared sets and counters are owned by the coordinator and only mutated
//! between awaits of a single task; the concurrent futures of a batch only
//! borrow the fetchers.

use crate::classify::Classifier;
use crate::config::Config;
use crate::crawler::downloader::{DimensionProbe, DownloadOutcome, Downloader, RejectReason};
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{build_http_client, BoundedFetcher, FetchError, FetchedPage};
use crate::crawler::limiter::Limiter;
use crate::output::{prepare_output_dir, CrawlReport, CrawlStats};
use crate::state::{CrawlPhase, CrawlState};
use crate::url::{resolve, strip_query, ScopeFilter};
use crate::HarvestError;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use scraper::Html;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    page_fetcher: BoundedFetcher,
    downloader: Downloader,
    extractor: Extractor,
    state: CrawlState,
    stats: CrawlStats,
    phase: CrawlPhase,
    batch_size: usize,
    home_markers: Vec<String>,
    output_dir: PathBuf,
    config_hash: Option<String>,
    cancelled: Arc<AtomicBool>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - A validated harvester configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run, in the `Init` phase
    /// * `Err(HarvestError)` - The HTTP client or a classifier rule could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let entry = Url::parse(&config.crawl.entry_url)?;
        let home_url = resolve(&config.crawl.entry_url, &entry).unwrap_or_else(|| entry.to_string());

        let client = build_http_client(&config.fetch)?;
        let max_concurrent = config.fetch.max_concurrent.max(1) as usize;
        let timeout = Duration::from_secs(config.fetch.request_timeout_secs);
        let cancelled = Arc::new(AtomicBool::new(false));

        let page_fetcher = BoundedFetcher::new(
            client.clone(),
            Limiter::new(
                max_concurrent,
                Duration::from_millis(config.fetch.request_delay_ms),
            ),
            timeout,
        )
        .with_cancel_flag(cancelled.clone());
        let media_fetcher = BoundedFetcher::new(
            client,
            Limiter::new(
                (max_concurrent / 2).max(1),
                Duration::from_millis(config.fetch.media_delay_ms),
            ),
            timeout * 2,
        )
        .with_cancel_flag(cancelled.clone());

        let classifier = Classifier::from_config(&config)?;
        let extractor = Extractor::new(classifier.clone(), ScopeFilter::new(&config.crawl.scope))?;

        let output_dir = PathBuf::from(&config.output.directory);
        let downloader = Downloader::new(
            media_fetcher,
            classifier,
            config.limits.clone(),
            output_dir.clone(),
            config.output.file_prefix.clone(),
            config.media.extensions.clone(),
        );

        let home_markers = config
            .crawl
            .home_markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();

        Ok(Self {
            config: Arc::new(config),
            page_fetcher,
            downloader,
            extractor,
            state: CrawlState::new(home_url),
            stats: CrawlStats::new(),
            phase: CrawlPhase::Init,
            batch_size: max_concurrent,
            home_markers,
            output_dir,
            config_hash: None,
            cancelled,
        })
    }

    /// Records the configuration hash in the final report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Replaces the downloader's dimension probe
    pub fn with_probe(mut self, probe: Option<Box<dyn DimensionProbe>>) -> Self {
        self.downloader = self.downloader.with_probe(probe);
        self
    }

    /// Shared flag that stops the run
    ///
    /// Once set, no further request is sent: requests still waiting for a
    /// permit fail as cancelled and the run moves straight to `Done`.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs every phase and returns the final report
    ///
    /// A failed entry page ends the run early with zero results; the report
    /// is still produced. Only setup failures (the output directory cannot be
    /// prepared, or the coordinator was already run) are returned as errors.
    pub async fn run(&mut self) -> Result<CrawlReport, HarvestError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!("Starting harvest from {}", self.state.home().url());

        self.transition(CrawlPhase::Discover)?;
        let discovered = self.discover().await?;

        if discovered && !self.is_cancelled() {
            self.transition(CrawlPhase::CrawlNav)?;
            self.crawl_navigation().await;

            if !self.is_cancelled() {
                self.transition(CrawlPhase::FetchMedia)?;
                self.fetch_media().await;
            }
        }

        self.transition(CrawlPhase::Done)?;
        self.stats.media_found = self.state.media().len() as u64;

        let report = self.report(started_at, clock.elapsed());
        tracing::info!(
            "Harvest finished in {:.2}s: {} pages, {} media found, {} saved",
            report.elapsed_seconds,
            report.pages_crawled(),
            report.media_found(),
            report.media_downloaded()
        );
        Ok(report)
    }

    /// Fetches the entry page and seeds the navigation set
    ///
    /// Returns false when the entry page could not be fetched.
    async fn discover(&mut self) -> Result<bool, HarvestError> {
        prepare_output_dir(&self.output_dir).await?;

        let home_url = self.state.home().url().to_string();
        let page = match self.page_fetcher.fetch_page(&home_url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Entry page {} could not be fetched: {}", home_url, e);
                self.state.freeze_navigation();
                return Ok(false);
            }
        };

        self.stats.record_page();
        self.state.mark_visited(&home_url);

        let links = {
            let base = Url::parse(&page.url)?;
            let document = Html::parse_document(&page.body);
            let state = &self.state;
            self.extractor
                .extract_navigation(&document, &base, |url| state.is_visited(url))
        };

        let added = self.state.add_navigation(links);
        self.state.freeze_navigation();
        tracing::info!("Discovered {} navigation pages from {}", added, home_url);

        Ok(true)
    }

    /// Fetches navigation pages in batches and collects media candidates
    async fn crawl_navigation(&mut self) {
        let mut batch_number = 0usize;

        loop {
            if self.is_cancelled() {
                tracing::warn!("Cancellation requested, stopping navigation crawl");
                break;
            }

            let batch = self.state.claim_batch(self.batch_size);
            if batch.is_empty() {
                break;
            }
            batch_number += 1;
            tracing::debug!("Navigation batch {}: {} pages", batch_number, batch.len());

            let fetcher = &self.page_fetcher;
            let results =
                futures::future::join_all(batch.iter().map(|target| fetcher.fetch_page(target.url())))
                    .await;

            for (target, result) in batch.iter().zip(results) {
                match result {
                    Ok(page) => {
                        self.stats.record_page();
                        self.collect_media(&page);
                    }
                    Err(FetchError::Cancelled) => tracing::debug!("Skipped {}: cancelled", target.url()),
                    Err(e) => tracing::warn!("Failed to fetch {}: {}", target.url(), e),
                }
            }
        }

        tracing::info!(
            "Crawled {} pages, {} media candidates",
            self.stats.pages_crawled,
            self.state.media().len()
        );
    }

    fn collect_media(&mut self, page: &FetchedPage) {
        if self.is_home_duplicate(&page.url) {
            tracing::debug!("Skipping media on {}: duplicate of the entry page", page.url);
            return;
        }

        let base = match Url::parse(&page.url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Cannot resolve links on {}: {}", page.url, e);
                return;
            }
        };

        let media = {
            let document = Html::parse_document(&page.body);
            self.extractor.extract_media(&document, &base)
        };
        let added = self.state.add_media(media);
        tracing::info!("{}: {} new media candidates", page.url, added);
    }

    /// Downloads every media candidate under the media limiter
    async fn fetch_media(&mut self) {
        let targets = self.state.media_targets();
        tracing::info!("Fetching {} media candidates", targets.len());

        let downloader = &self.downloader;
        let digests = self.state.digests();
        let stats = &mut self.stats;

        let mut pending: FuturesUnordered<_> = targets
            .iter()
            .map(|target| downloader.download(target.url(), digests))
            .collect();

        let mut skipped = 0usize;
        while let Some(outcome) = pending.next().await {
            match outcome {
                DownloadOutcome::Accepted { .. } => stats.record_download(),
                DownloadOutcome::Rejected {
                    reason: RejectReason::Cancelled,
                    ..
                } => skipped += 1,
                DownloadOutcome::Rejected { reason, .. } => stats.record_rejection(reason.category()),
            }
        }

        if skipped > 0 {
            tracing::warn!("Cancellation requested, {} media downloads skipped", skipped);
        }
    }

    /// True for the entry page reached again under another query string or
    /// for any URL carrying a home marker
    fn is_home_duplicate(&self, url: &str) -> bool {
        if strip_query(url) == strip_query(self.state.home().url()) {
            return true;
        }
        let lowered = url.to_lowercase();
        self.home_markers.iter().any(|m| lowered.contains(m.as_str()))
    }

    fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn report(&self, started_at: DateTime<Utc>, elapsed: Duration) -> CrawlReport {
        CrawlReport {
            entry_url: self.config.crawl.entry_url.clone(),
            output_directory: self.output_dir.display().to_string(),
            started_at: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            finished_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            elapsed_seconds: elapsed.as_secs_f64(),
            config_hash: self.config_hash.clone(),
            cancelled: self.is_cancelled(),
            stats: self.stats,
        }
    }
}

/// Runs a complete harvest with the given configuration
///
/// # Arguments
///
/// * `config` - A validated harvester configuration
/// * `config_hash` - Optional hash of the configuration file, recorded in the report
pub async fn run_crawl(config: Config, config_hash: Option<String>) -> Result<CrawlReport, HarvestError> {
    let mut coordinator = Coordinator::new(config)?;
    if let Some(hash) = config_hash {
        coordinator = coordinator.with_config_hash(hash);
    }
    coordinator.run().await
}
