//! Turns a raw popularity ranking into the cycle's scrape candidates.

use crate::classifier;
use crate::types::Result;
use crate::visited_store::VisitedStore;
use std::collections::HashSet;
use tracing::debug;

/// Truncate the ranklist to its first `limit` entries, then keep apex
/// domains only. Truncation runs first: entries ranked below `limit` are
/// too low-value to crawl, so the effective candidate count after the apex
/// filter can come out below `limit`.
pub fn process_ranklist(urls: &[String], limit: usize) -> Vec<String> {
    urls.iter()
        .take(limit)
        .filter(|url| classifier::is_apex(url))
        .cloned()
        .collect()
}

/// Reduce the filtered candidates to domains actually worth probing:
/// anything already in the visited history is skipped, and duplicates
/// within the batch collapse to their first occurrence. Output entries are
/// normalized registrable domains (`domain.suffix`).
pub async fn urls_to_scrape(store: &VisitedStore, urls: &[String]) -> Result<Vec<String>> {
    let visited = store.list_domains().await?;

    let mut batch_seen = HashSet::new();
    let mut to_scrape = Vec::new();
    let mut rejected = 0usize;

    for url in urls {
        match classifier::registrable_domain(url) {
            Ok(domain) => {
                if !visited.contains(&domain) && batch_seen.insert(domain.clone()) {
                    to_scrape.push(domain);
                }
            }
            Err(_) => rejected += 1,
        }
    }

    if rejected > 0 {
        debug!("Skipped {} unclassifiable ranklist entries", rejected);
    }

    Ok(to_scrape)
}
