//! Concurrent liveness probing of candidate domains.

use crate::classifier;
use crate::types::{HttpConfig, ProbeOutcome, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// External liveness-probe collaborator: given a candidate URL, report the
/// status observed and the canonical URL it resolved to.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome>;
}

pub struct LivenessProber {
    probe: Arc<dyn Probe>,
    concurrency: usize,
}

impl LivenessProber {
    pub fn new(probe: Arc<dyn Probe>, concurrency: usize) -> Self {
        Self {
            probe,
            concurrency: concurrency.max(1),
        }
    }

    /// Fan one probe task per candidate into a bounded pool and keep the
    /// canonical URLs that answered 200. Results arrive in completion
    /// order, not submission order. Non-200 statuses and probe errors are
    /// dropped without failing the batch.
    pub async fn active_urls(&self, urls: &[String]) -> Vec<String> {
        let outcomes: Vec<(String, Result<ProbeOutcome>)> = stream::iter(urls.iter().cloned())
            .map(|url| {
                let probe = self.probe.clone();
                async move {
                    let outcome = probe.probe(&url).await;
                    (url, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut active = Vec::new();
        for (candidate, outcome) in outcomes {
            match outcome {
                Ok(outcome) if outcome.status == 200 => active.push(outcome.url),
                Ok(outcome) => {
                    debug!("Dropping {} (probe status {})", candidate, outcome.status)
                }
                Err(e) => warn!("Probe failed for {}: {}", candidate, e),
            }
        }

        info!("{} of {} candidates are live", active.len(), urls.len());
        active
    }
}

/// Default probe: an HTTP GET with redirect following. Liveness is an
/// HTTP 200 final response; the canonical URL is wherever the redirects
/// settled.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
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
impl Probe for HttpProbe {
    async fn probe(&self, url: &str) -> Result<ProbeOutcome> {
        let target = classifier::normalize_url(url);
        let response = self.client.get(&target).send().await?;

        Ok(ProbeOutcome {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        })
    }
}
