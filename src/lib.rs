pub mod classifier;
pub mod content_store;
pub mod pipeline;
pub mod prober;
pub mod rank_filter;
pub mod reconciler;
pub mod scraper;
pub mod source;
pub mod types;
pub mod visited_store;

pub use content_store::ContentStore;
pub use pipeline::DiscoveryPipeline;
pub use prober::{HttpProbe, LivenessProber, Probe};
pub use reconciler::RankReconciler;
pub use scraper::{HttpScraper, Scrape, ScrapeOrchestrator};
pub use source::{HttpRankSource, RankSource, DEFAULT_RANKLIST_URL};
pub use types::*;
pub use visited_store::VisitedStore;
