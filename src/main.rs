use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use newspulse::config::AppConfig;
use newspulse::db::store::Store;
use newspulse::enrich::client::EnrichmentClient;
use newspulse::logging;
use newspulse::pipeline::IngestionPipeline;
use newspulse::scrape::HttpContentFetcher;
use newspulse::sources::newsapi::NewsApiSource;
use newspulse::web::{self, AppState};

#[derive(Parser)]
#[command(name = "newspulse", about = "News ingestion and enrichment backend")]
struct Cli {
    /// Path to the toml config file.
    #[arg(long, default_value = "config/default.toml")]
    config: PathBuf,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, secrets) = AppConfig::load(&cli.config)?;

    logging::init_logging(&config.monitoring)?;

    tracing::info!(
        db = %config.database.path,
        source_configured = secrets.news_api_key.is_some(),
        "newspulse starting"
    );

    let store = Store::new(&config.database.path).await?;

    let source = NewsApiSource::new(
        config.source.base_url.clone(),
        secrets.news_api_key.clone(),
        config.source.timeout_seconds,
    );
    let fetcher = HttpContentFetcher::new(config.scrape.timeout_seconds);
    let enricher = EnrichmentClient::new(
        config.enrichment_base_url(&secrets),
        config.enrichment.timeout_seconds,
    );

    let pipeline = IngestionPipeline::new(
        Arc::new(source),
        Arc::new(fetcher),
        Arc::new(enricher),
        store,
        config.ingestion,
    );

    let state = AppState::new(pipeline);
    let port = cli.port.unwrap_or(config.server.port);
    web::serve(state, &config.server.bind, port).await
}
