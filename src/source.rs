//! The periodic ranking source the pipeline ingests from.
//!
//! The core only needs an ordered sequence of URLs (rank = position); the
//! HTTP implementation fetches a date-templated top-sites CSV and splits
//! `rank,domain` lines, leaving real format handling to the feed itself.

use crate::types::{HttpConfig, RadarError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_RANKLIST_URL: &str =
    "https://s3-us-west-1.amazonaws.com/umbrella-static/top-1m-{date}.csv";

/// Ranking-source collaborator: ordered URLs for a given day.
#[async_trait]
pub trait RankSource: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<String>>;
}

pub struct HttpRankSource {
    client: Client,
    template: String,
    max_retries: u32,
    retry_delay_seconds: u64,
}

impl HttpRankSource {
    /// `template` must contain a `{date}` placeholder, replaced with the
    /// cycle date in `YYYY-MM-DD` form.
    pub fn new(template: impl Into<String>, config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            template: template.into(),
            max_retries: config.max_retries,
            retry_delay_seconds: config.retry_delay_seconds,
        })
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.retry_delay_seconds),
            max_interval: Duration::from_secs(self.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    return Ok(response.text().await?);
                }
                Ok(response) => {
                    last_error = Some(RadarError::RankSource(format!(
                        "HTTP {} from {}",
                        response.status(),
                        url
                    )));
                }
                Err(e) => last_error = Some(e.into()),
            }

            if attempt < self.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!(
                        "Ranklist fetch attempt {} failed for {}, retrying in {:?}",
                        attempt + 1,
                        url,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| RadarError::RankSource(format!("unreachable source: {}", url))))
    }
}

#[async_trait]
impl RankSource for HttpRankSource {
    async fn fetch(&self, date: NaiveDate) -> Result<Vec<String>> {
        let url = self.template.replace("{date}", &date.to_string());
        let body = self.fetch_body(&url).await?;

        let urls: Vec<String> = body
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                // "rank,domain" rows; bare-domain rows pass through as-is.
                Some(match line.split_once(',') {
                    Some((_, domain)) => domain.trim().to_string(),
                    None => line.to_string(),
                })
            })
            .collect();

        info!("Fetched ranklist for {}: {} entries", date, urls.len());
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_default_template_has_date_placeholder() {
        assert!(super::DEFAULT_RANKLIST_URL.contains("{date}"));
    }
}
