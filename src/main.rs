use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use topic_collector::config::Config;
use topic_collector::export::SystemClock;
use topic_collector::pipeline::{self, RunReport};
use topic_collector::sources::SourceRegistry;

/// Exit status when the export succeeded but at least one source failed.
const EXIT_PARTIAL: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(report) if report.has_failures() => std::process::exit(EXIT_PARTIAL),
        Ok(_) => {}
        Err(e) => {
            error!("Fatal error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<RunReport> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    init_tracing()?;

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        topic = %config.search.topic,
        subreddit = %config.search.subreddit,
        boards = ?config.search.boards,
        limit = config.search.result_limit,
        "Configuration loaded"
    );

    if config.reddit.client_id.is_none() || config.reddit.client_secret.is_none() {
        warn!("Reddit credentials not configured - Reddit source will fail to authenticate");
    }

    let registry = SourceRegistry::from_config(&config).context("Failed to set up sources")?;
    let report = pipeline::run(&config, &registry, &SystemClock).await?;

    info!(
        posts = report.export.posts_written,
        comments = report.export.comments_written,
        posts_file = %report.export.posts_path.display(),
        comments_file = %report.export.comments_path.display(),
        "Run complete"
    );

    Ok(report)
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,topic_collector=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
