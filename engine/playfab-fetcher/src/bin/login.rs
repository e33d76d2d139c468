//! Log in with the configured custom ID and store the session ticket

use anyhow::Context;
use playfab_fetcher::config::persist_session_ticket;
use playfab_fetcher::logging::initialize_logging;
use playfab_fetcher::session::login_with_custom_id;
use playfab_fetcher::FetcherConfig;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = FetcherConfig::default_path();
    let config = FetcherConfig::load_from_file(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    initialize_logging(&config.logging).context("Failed to initialize logging")?;

    let ticket = login_with_custom_id(&config.playfab).await.context("PlayFab login failed")?;
    persist_session_ticket(&config_path, &ticket)
        .with_context(|| format!("Failed to save session ticket to {}", config_path.display()))?;

    info!(path = %config_path.display(), "Session ticket saved");
    Ok(())
}
