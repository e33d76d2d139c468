use anyhow::Context;
use playfab_fetcher::logging::initialize_logging;
use playfab_fetcher::{FetcherConfig, PlayFabFetcher};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = FetcherConfig::default_path();
    let config = FetcherConfig::load_from_file(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    initialize_logging(&config.logging).context("Failed to initialize logging")?;
    info!(path = %config_path.display(), title_id = %config.playfab.title_id, "Starting PlayFab Fetcher");

    let fetcher = PlayFabFetcher::new(config, &config_path)
        .await
        .context("Failed to start fetcher")?;

    match fetcher.run().await {
        Ok(summary) => {
            info!(
                requested = summary.requested,
                collected = summary.collected,
                stored = summary.stored,
                failed_writes = summary.failed_writes,
                "PlayFab Fetcher finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "PlayFab Fetcher failed");
            Err(e.into())
        }
    }
}
