use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use crate::classifier::ClassifyError;

/// Status value for a visited-domain row that is subject to normal expiry.
pub const STATUS_ACTIVE: i64 = 1;

/// One row of the `visited_domains` table. The `url` column is the
/// registrable domain itself (`domain.suffix`), which doubles as the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitedRecord {
    pub url: String,
    pub date: NaiveDate,
    pub status: i64,
}

/// The slice of a `global_data` row the discovery core reads back:
/// the key and the date it was scraped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRow {
    pub url: String,
    pub date: NaiveDate,
}

/// Result of a single liveness probe: the HTTP status observed and the
/// canonical URL the probe settled on (after scheme/redirect resolution).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status: u16,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrapeStatus {
    Success,
    Failed,
}

/// Result of scraping one domain. Only `Success` outcomes are kept by the
/// orchestrator and persisted into the content table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub status: ScrapeStatus,
    pub url: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Dense 1-based ranking for one cycle: `ordered[i]` carries rank `i + 1`.
#[derive(Debug, Clone, Default)]
pub struct RankAssignment {
    pub ordered: Vec<String>,
    pub ranks: HashMap<String, u32>,
}

impl RankAssignment {
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn rank_of(&self, url: &str) -> Option<u32> {
        self.ranks.get(url).copied()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ranklist entries to consider at ingestion; lower ranks are ignored.
    pub ranklist_limit: usize,
    /// Rolling retention window for visited domains, in days.
    pub window_days: i64,
    pub probe_concurrency: usize,
    pub scrape_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ranklist_limit: 500_000,
            window_days: 30,
            probe_concurrency: 50,
            scrape_concurrency: 50,
        }
    }
}

/// Shared settings for the HTTP-backed collaborators (probe, scraper,
/// ranklist source).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "domain-radar/0.1".to_string(),
            timeout_seconds: 30,
            max_redirects: 5,
            max_retries: 3,
            retry_delay_seconds: 5,
        }
    }
}

/// Per-stage counts for one pipeline cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub ranklist_len: usize,
    pub candidates: usize,
    pub to_scrape: usize,
    pub live: usize,
    pub scraped: usize,
    pub ranked: usize,
    pub expired: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum RadarError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Ranking source error: {0}")]
    RankSource(String),

    #[error("Rank slot {0} out of range (expected 1..=30)")]
    RankSlotOutOfRange(u32),

    #[error("Invalid stored date: {0}")]
    BadDate(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RadarError>;
