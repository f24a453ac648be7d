use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use listing_harvester::config::{Config, DEFAULT_CONFIG_FILE};
use listing_harvester::utils::http::create_client;
use listing_harvester::{Harvester, HtmlPageQuery, Shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("listing_harvester=info".parse()?),
        )
        .init();

    info!("Starting Listing Harvester");

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
    let config = Config::load_from(&config_path)?;
    info!("Harvesting from {}", config.source.start_url);

    let client = create_client(&config)?;
    let query = HtmlPageQuery::new(client, &config)?;

    let cancel = CancellationToken::new();
    let (mut listings, producer) = Harvester::from_config(query, &config).start(cancel.clone());

    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received, shutting down");
        ctrl_c_cancel.cancel();
    });

    let mut delivered = 0usize;
    while let Some(listing) = listings.recv().await {
        info!("New listing: {}", listing);
        println!(
            "{}",
            serde_json::to_string(&listing).context("Failed to serialize listing")?
        );
        delivered += 1;
    }

    match producer.await.context("Producer task panicked")? {
        Ok(Shutdown::Cancelled) => info!("Harvest cancelled after {} listings", delivered),
        Ok(Shutdown::ConsumerClosed) => warn!("Harvest stopped: consumer went away"),
        Err(e) => {
            error!("Harvest ended with an error after {} listings: {}", delivered, e);
            return Err(e.into());
        }
    }

    Ok(())
}
