use anyhow::{Context, Result};
use chrono::Local;
use std::sync::Arc;
use tracing::{error, info};

use ean_scraper::batch::process_table;
use ean_scraper::browser::{BrowserSession, ChromiumSession};
use ean_scraper::config::Config;
use ean_scraper::scrapers::{DovganScraper, ProductLookup};
use ean_scraper::sheet::fetch_table;
use ean_scraper::storage::{FsImageStore, ImageStore};
use ean_scraper::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ean_scraper=info".parse()?),
        )
        .init();

    info!(
        "Starting EAN lookup at {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    if let Err(e) = run().await {
        error!("Run aborted: {:#}", e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = Arc::new(Config::load().context("Failed to load configuration")?);

    let client = utils::http::create_client(&config)?;
    let mut table = fetch_table(&client, &config.sheet_url)
        .await
        .context("Failed to fetch product sheet")?;

    let session: Arc<dyn BrowserSession> = Arc::new(
        ChromiumSession::launch(&config)
            .await
            .context("Failed to launch browser")?,
    );

    let images: Arc<dyn ImageStore> = Arc::new(FsImageStore::new(
        client.clone(),
        config.image_dir.clone(),
        config.download_retries,
        config.download_backoff(),
    ));
    let lookup: Arc<dyn ProductLookup> = Arc::new(DovganScraper::new(config.clone(), images));

    let summary = process_table(
        &mut table,
        session,
        lookup,
        config.max_concurrent_pages,
        &config.output_csv,
    )
    .await
    .with_context(|| format!("Failed to write {}", config.output_csv.display()))?;

    info!("Run summary: {}", serde_json::to_string(&summary)?);
    info!(
        "Updated sheet saved as {}",
        config.output_csv.display()
    );
    Ok(())
}
