use chrono::{NaiveDate, Utc};
use clap::Parser;
use domain_radar::{
    DiscoveryPipeline, HttpConfig, HttpProbe, HttpRankSource, HttpScraper, PipelineConfig,
    DEFAULT_RANKLIST_URL,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "domain-radar", about = "Daily apex-domain discovery and rank tracking")]
struct Args {
    /// SQLite database URL
    #[arg(long, default_value = "sqlite:web.db")]
    database_url: String,

    /// Cycle date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Ranklist entries to consider at ingestion
    #[arg(long, default_value_t = 500_000)]
    limit: usize,

    /// Width of the probe/scrape worker pools
    #[arg(long, default_value_t = 50)]
    concurrency: usize,

    /// Rolling retention window for visited domains, in days
    #[arg(long, default_value_t = 30)]
    window_days: i64,

    /// Ranklist URL template; `{date}` is replaced with the cycle date
    #[arg(long, default_value = DEFAULT_RANKLIST_URL)]
    ranklist_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let as_of = args.date.unwrap_or_else(|| Utc::now().date_naive());

    info!("Starting discovery cycle for {}", as_of);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(SqliteConnectOptions::from_str(&args.database_url)?.create_if_missing(true))
        .await?;

    let http_config = HttpConfig::default();
    let pipeline_config = PipelineConfig {
        ranklist_limit: args.limit,
        window_days: args.window_days,
        probe_concurrency: args.concurrency,
        scrape_concurrency: args.concurrency,
    };

    let source = Arc::new(HttpRankSource::new(args.ranklist_url.as_str(), &http_config)?);
    let probe = Arc::new(HttpProbe::new(&http_config)?);
    let scraper = Arc::new(HttpScraper::new(&http_config)?);

    let pipeline =
        DiscoveryPipeline::new(pool, source, probe, scraper, pipeline_config).await?;

    let report = pipeline.run_cycle(as_of).await?;
    info!(
        "Cycle {} complete: {}",
        as_of,
        serde_json::to_string(&report)?
    );

    Ok(())
}
