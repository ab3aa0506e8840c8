//! Fan-out scraping of accepted domains, with a sequential fallback for
//! backends that cannot run in parallel.

use crate::classifier;
use crate::types::{HttpConfig, Result, ScrapeOutcome, ScrapeStatus};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// External content-scraper collaborator.
#[async_trait]
pub trait Scrape: Send + Sync {
    async fn scrape(&self, domain: &str) -> Result<ScrapeOutcome>;
}

pub struct ScrapeOrchestrator {
    scraper: Arc<dyn Scrape>,
    concurrency: usize,
}

impl ScrapeOrchestrator {
    pub fn new(scraper: Arc<dyn Scrape>, concurrency: usize) -> Self {
        Self {
            scraper,
            concurrency: concurrency.max(1),
        }
    }

    /// Scrape through a bounded pool, collecting successes in completion
    /// order. Failed scrapes and task errors are dropped; the batch always
    /// runs to completion.
    pub async fn fast_scrap(&self, urls: &[String]) -> Vec<ScrapeOutcome> {
        let outcomes: Vec<(String, Result<ScrapeOutcome>)> = stream::iter(urls.iter().cloned())
            .map(|url| {
                let scraper = self.scraper.clone();
                async move {
                    let outcome = scraper.scrape(&url).await;
                    (url, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut results = Vec::new();
        for (domain, outcome) in outcomes {
            match outcome {
                Ok(outcome) if outcome.status == ScrapeStatus::Success => results.push(outcome),
                Ok(_) => debug!("Scrape of {} did not succeed", domain),
                Err(e) => warn!("Scrape failed for {}: {}", domain, e),
            }
        }

        info!("Scraped {} of {} domains", results.len(), urls.len());
        results
    }

    /// One domain at a time, for stateful backends (browser automation)
    /// that cannot share workers. Same success filter as `fast_scrap`;
    /// every success in the batch is accumulated.
    pub async fn complete_scrap(&self, urls: &[String]) -> Vec<ScrapeOutcome> {
        let mut results = Vec::new();

        for url in urls {
            match self.scraper.scrape(url).await {
                Ok(outcome) if outcome.status == ScrapeStatus::Success => results.push(outcome),
                Ok(_) => debug!("Scrape of {} did not succeed", url),
                Err(e) => warn!("Scrape failed for {}: {}", url, e),
            }
        }

        info!(
            "Sequentially scraped {} of {} domains",
            results.len(),
            urls.len()
        );
        results
    }
}

/// Default scraper: fetch the page body over HTTP and store it verbatim.
/// Embedding computation stays with the real scraping backend; rows from
/// this scraper carry an empty embedding.
pub struct HttpScraper {
    client: Client,
}

impl HttpScraper {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Scrape for HttpScraper {
    async fn scrape(&self, domain: &str) -> Result<ScrapeOutcome> {
        let target = classifier::normalize_url(domain);
        let response = self.client.get(&target).send().await?;

        let success = response.status().is_success();
        let final_url = response.url().to_string();
        let content = if success {
            response.text().await?
        } else {
            String::new()
        };

        Ok(ScrapeOutcome {
            status: if success {
                ScrapeStatus::Success
            } else {
                ScrapeStatus::Failed
            },
            url: final_url,
            content,
            embedding: Vec::new(),
        })
    }
}
