//! Reconciles a fresh ranking against the domains that already carry
//! scraped content, producing the cycle's dense 1..K rank assignment.

use crate::classifier;
use crate::rank_filter;
use crate::types::{ContentRow, RankAssignment, Result};
use crate::visited_store::VisitedStore;
use chrono::NaiveDate;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

pub struct RankReconciler {
    store: Arc<VisitedStore>,
    window_days: i64,
}

impl RankReconciler {
    pub fn new(store: Arc<VisitedStore>, window_days: i64) -> Self {
        Self { store, window_days }
    }

    /// Rank assignment for the current cycle.
    ///
    /// The history universe is the union of non-expired visited rows and
    /// every domain that already has a content row; scraped content keeps a
    /// domain relevant even after its visited record expired. The entire
    /// ranklist is considered (the ingestion limit does not apply here),
    /// filtered to apex, walked in rank order with first-occurrence-wins,
    /// and only in-universe domains receive a rank. Output ranks are a
    /// dense permutation of 1..=K.
    pub async fn adjusted_ranks(
        &self,
        as_of: NaiveDate,
        content_rows: &[ContentRow],
        full_ranklist: &[String],
    ) -> Result<RankAssignment> {
        // domain -> (representative URL spelling, date it was last seen)
        let mut universe: HashMap<String, (String, NaiveDate)> = HashMap::new();

        for record in self.store.list_active(as_of, self.window_days).await? {
            if let Ok(domain) = classifier::registrable_domain(&record.url) {
                prefer_recent(&mut universe, domain, record.url, record.date, false);
            }
        }

        for row in content_rows {
            if let Ok(domain) = classifier::registrable_domain(&row.url) {
                prefer_recent(&mut universe, domain, row.url.clone(), row.date, true);
            }
        }

        let apex_ranklist = rank_filter::process_ranklist(full_ranklist, full_ranklist.len());

        let mut ranked_domains = HashSet::new();
        let mut ordered = Vec::new();

        for url in &apex_ranklist {
            let Ok(domain) = classifier::registrable_domain(url) else {
                continue;
            };
            if ranked_domains.contains(&domain) {
                continue;
            }
            if let Some((representative, _)) = universe.get(&domain) {
                ordered.push(representative.clone());
                ranked_domains.insert(domain);
            }
        }

        let ranks = ordered
            .iter()
            .enumerate()
            .map(|(i, url)| (url.clone(), (i + 1) as u32))
            .collect();

        info!(
            "Assigned ranks to {} of {} apex ranklist entries",
            ordered.len(),
            apex_ranklist.len()
        );

        Ok(RankAssignment { ordered, ranks })
    }
}

/// When one domain has several recorded URL spellings, the most recently
/// seen one wins; at equal dates the content-store spelling beats the
/// visited-store one, since scraped content is the authoritative signal.
fn prefer_recent(
    universe: &mut HashMap<String, (String, NaiveDate)>,
    domain: String,
    url: String,
    date: NaiveDate,
    from_content: bool,
) {
    match universe.entry(domain) {
        Entry::Vacant(slot) => {
            slot.insert((url, date));
        }
        Entry::Occupied(mut slot) => {
            let (_, existing) = slot.get();
            if date > *existing || (from_content && date == *existing) {
                slot.insert((url, date));
            }
        }
    }
}
