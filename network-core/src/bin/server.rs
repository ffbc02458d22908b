//! Network core server binary

use kit_catalog::CatalogStore;
use network_core::{Config, LogNotifier, Network};
use std::error::Error;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting GrowHub Network Core");

    // Load configuration
    let config = Config::from_env()?;

    // Catalog starts empty; products are registered by the back office
    let catalog = Arc::new(CatalogStore::new());

    let network = Network::open(config, catalog, Arc::new(LogNotifier)).await?;
    tracing::info!("Network opened successfully");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down network core");
    network.shutdown().await?;
    Ok(())
}
