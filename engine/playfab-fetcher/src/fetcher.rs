use crate::client::{PlayFabClient, PlayerSource};
use crate::collector::collect_all;
use crate::config::{DatabaseDriver, FetcherConfig};
use crate::error::Result;
use crate::ids::IdSource;
use crate::session::ensure_session;
use crate::store::PlayerStore;
use std::path::Path;
use tracing::{info, warn};

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub requested: usize,
    pub collected: usize,
    pub stored: usize,
    pub failed_writes: usize,
}

/// Main PlayFab fetcher service
pub struct PlayFabFetcher {
    config: FetcherConfig,
    client: PlayFabClient,
    store: PlayerStore,
}

impl PlayFabFetcher {
    /// Create a fetcher, logging in first when no session ticket is configured.
    ///
    /// A fresh ticket is written back to `config_path`.
    pub async fn new(config: FetcherConfig, config_path: &Path) -> Result<Self> {
        let config = ensure_session(config, config_path).await?;
        let client = PlayFabClient::new(&config.playfab)?;
        let store = PlayerStore::connect(&config.database).await?;

        // SQLite databases may be brand new
        if config.database.effective_driver() == DatabaseDriver::Sqlite {
            info!("Ensuring table {} exists", config.database.table);
            store.ensure_table().await?;
        }

        Ok(Self { config, client, store })
    }

    /// Run one collection pass and close the pool
    pub async fn run(self) -> Result<RunSummary> {
        let result = run_pipeline(&self.config, &self.client, &self.store).await;
        self.store.close().await;
        result
    }
}

/// Resolve IDs, fetch them concurrently and upsert whatever came back
pub async fn run_pipeline<S>(
    config: &FetcherConfig,
    source: &S,
    store: &PlayerStore,
) -> Result<RunSummary>
where
    S: PlayerSource + ?Sized,
{
    // Step 1: resolve IDs
    let ids = IdSource::from_config(config).resolve(store.pool()).await?;
    info!(
        "Fetching {} players with at most {} requests in flight",
        ids.len(),
        config.playfab.semaphore_limit
    );

    // Step 2: fetch
    let records = collect_all(source, &ids, config.playfab.semaphore_limit).await;
    info!("Collected data for {} of {} players", records.len(), ids.len());

    // Step 3: store
    let written = store.upsert_all(&records).await;
    let summary = RunSummary {
        requested: ids.len(),
        collected: records.len(),
        stored: written.stored,
        failed_writes: written.failed,
    };

    if summary.failed_writes > 0 {
        warn!("{} players could not be stored", summary.failed_writes);
    }
    info!(?summary, "Run complete");
    Ok(summary)
}
