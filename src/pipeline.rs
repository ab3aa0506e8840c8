//! One full discovery cycle, wired together.

use crate::classifier;
use crate::content_store::{ContentStore, RANK_SLOTS};
use crate::prober::{LivenessProber, Probe};
use crate::rank_filter;
use crate::reconciler::RankReconciler;
use crate::scraper::{Scrape, ScrapeOrchestrator};
use crate::source::RankSource;
use crate::types::{CycleReport, PipelineConfig, Result};
use crate::visited_store::VisitedStore;
use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

pub struct DiscoveryPipeline {
    visited: Arc<VisitedStore>,
    content: Arc<ContentStore>,
    prober: LivenessProber,
    scraper: ScrapeOrchestrator,
    source: Arc<dyn RankSource>,
    reconciler: RankReconciler,
    config: PipelineConfig,
}

impl DiscoveryPipeline {
    pub async fn new(
        pool: SqlitePool,
        source: Arc<dyn RankSource>,
        probe: Arc<dyn Probe>,
        scrape: Arc<dyn Scrape>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let visited = Arc::new(VisitedStore::new(pool.clone()).await?);
        let content = Arc::new(ContentStore::new(pool).await?);
        let prober = LivenessProber::new(probe, config.probe_concurrency);
        let scraper = ScrapeOrchestrator::new(scrape, config.scrape_concurrency);
        let reconciler = RankReconciler::new(visited.clone(), config.window_days);

        Ok(Self {
            visited,
            content,
            prober,
            scraper,
            source,
            reconciler,
            config,
        })
    }

    pub fn visited_store(&self) -> Arc<VisitedStore> {
        self.visited.clone()
    }

    pub fn content_store(&self) -> Arc<ContentStore> {
        self.content.clone()
    }

    /// Run one daily cycle: ingest the ranking, discover and scrape new
    /// live apex domains, reconcile display ranks for the known universe,
    /// then advance the visited window. A store failure aborts this cycle's
    /// writes but never the process; the caller decides whether to retry.
    pub async fn run_cycle(&self, as_of: NaiveDate) -> Result<CycleReport> {
        let mut report = CycleReport::default();

        let ranklist = self.source.fetch(as_of).await?;
        report.ranklist_len = ranklist.len();

        let candidates = rank_filter::process_ranklist(&ranklist, self.config.ranklist_limit);
        report.candidates = candidates.len();
        info!(
            "{} apex candidates from {} ranklist entries",
            candidates.len(),
            ranklist.len()
        );

        // Snapshot the history before this cycle mutates it; both the
        // scrape dedup and the touch list are defined against it.
        let previously_visited = self.visited.list_domains().await?;

        let to_scrape = rank_filter::urls_to_scrape(&self.visited, &candidates).await?;
        report.to_scrape = to_scrape.len();

        let live = self.prober.active_urls(&to_scrape).await;
        report.live = live.len();

        let scraped = self.scraper.fast_scrap(&live).await;
        report.scraped = scraped.len();

        self.content.append_rows(&scraped, as_of).await?;

        let content_rows = self.content.list_rows().await?;
        let assignment = self
            .reconciler
            .adjusted_ranks(as_of, &content_rows, &ranklist)
            .await?;
        report.ranked = assignment.len();

        let slot = (as_of.ordinal0() % RANK_SLOTS) + 1;
        self.content.write_ranks(&assignment, slot).await?;

        // Window maintenance: domains that reappeared keep their residency,
        // freshly scraped ones enter it. A probe can canonicalize a fresh
        // candidate onto a domain that is already resident (cross-domain
        // redirect), so scraped domains are split against the pre-cycle
        // snapshot: known ones go to the touch list, only truly new ones
        // are inserted.
        let mut reappeared = Vec::new();
        let mut reappeared_seen = HashSet::new();
        for url in &candidates {
            if let Ok(domain) = classifier::registrable_domain(url) {
                if previously_visited.contains(&domain) && reappeared_seen.insert(domain.clone()) {
                    reappeared.push(domain);
                }
            }
        }

        let mut new_domains = Vec::new();
        let mut new_seen = HashSet::new();
        for outcome in &scraped {
            if let Ok(domain) = classifier::registrable_domain(&outcome.url) {
                if previously_visited.contains(&domain) {
                    if reappeared_seen.insert(domain.clone()) {
                        reappeared.push(domain);
                    }
                } else if new_seen.insert(domain.clone()) {
                    new_domains.push(domain);
                }
            }
        }

        report.expired = self
            .visited
            .update_cycle(&reappeared, &new_domains, as_of, self.config.window_days)
            .await?;

        info!(
            "Cycle {} done: {} candidates, {} probed, {} live, {} scraped, {} ranked, {} expired",
            as_of,
            report.candidates,
            report.to_scrape,
            report.live,
            report.scraped,
            report.ranked,
            report.expired
        );

        Ok(report)
    }
}
