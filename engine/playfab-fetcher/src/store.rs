use crate::config::{DatabaseConfig, DatabaseDriver};
use crate::error::{FetcherError, Result};
use crate::models::PlayerRecord;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::{info, warn};

const COLUMNS: &str =
    "playfab_id, platform_account_id, username, platform, entity_id, created_at, stats_json";

/// Outcome of a batch upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub stored: usize,
    pub failed: usize,
}

/// Writes player records into the configured table
pub struct PlayerStore {
    pool: AnyPool,
    table: String,
    driver: DatabaseDriver,
}

impl PlayerStore {
    /// Open a connection pool for the configured database
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.connection_url()?)
            .await?;

        info!(driver = ?config.effective_driver(), table = %config.table, "Connected to database");
        Ok(Self::new(pool, config.table.clone(), config.effective_driver()))
    }

    /// Wrap an existing pool
    pub fn new(pool: AnyPool, table: impl Into<String>, driver: DatabaseDriver) -> Self {
        Self { pool, table: table.into(), driver }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Create the target table if it does not exist yet
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(&create_table_sql(self.driver, &self.table)).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a record, or refresh the mutable columns of an existing row.
    ///
    /// `playfab_id`, `platform_account_id` and `entity_id` are only written on insert.
    pub async fn upsert(&self, record: &PlayerRecord) -> Result<()> {
        let sql = upsert_sql(self.driver, &self.table);

        sqlx::query(&sql)
            .bind(record.playfab_id.clone())
            .bind(record.platform_account_id.clone())
            .bind(record.username.clone())
            .bind(record.platform.clone())
            .bind(record.entity_id.clone())
            .bind(record.created_at_sql())
            .bind(record.stats_json()?)
            .execute(&self.pool)
            .await
            .map_err(|e| FetcherError::persistence(e.to_string()))?;

        Ok(())
    }

    /// Upsert every record; a failed row is logged and skipped
    pub async fn upsert_all(&self, records: &[PlayerRecord]) -> WriteSummary {
        let mut summary = WriteSummary::default();

        for record in records {
            match self.upsert(record).await {
                Ok(()) => {
                    info!(playfab_id = %record.playfab_id, username = %record.username, "Player stored");
                    summary.stored += 1;
                }
                Err(e) => {
                    warn!(playfab_id = %record.playfab_id, error = %e, "Player insert failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn upsert_sql(driver: DatabaseDriver, table: &str) -> String {
    match driver {
        DatabaseDriver::Mysql => format!(
            "INSERT INTO {table} ({COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE \
             username = VALUES(username), \
             platform = VALUES(platform), \
             created_at = VALUES(created_at), \
             stats_json = VALUES(stats_json)"
        ),
        DatabaseDriver::Postgres => format!(
            "INSERT INTO {table} ({COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, CAST($6 AS TIMESTAMP), $7) \
             ON CONFLICT (playfab_id) DO UPDATE SET \
             username = EXCLUDED.username, \
             platform = EXCLUDED.platform, \
             created_at = EXCLUDED.created_at, \
             stats_json = EXCLUDED.stats_json"
        ),
        DatabaseDriver::Sqlite => format!(
            "INSERT INTO {table} ({COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (playfab_id) DO UPDATE SET \
             username = excluded.username, \
             platform = excluded.platform, \
             created_at = excluded.created_at, \
             stats_json = excluded.stats_json"
        ),
    }
}

fn create_table_sql(driver: DatabaseDriver, table: &str) -> String {
    let (created_at, stats_json) = match driver {
        DatabaseDriver::Mysql => ("DATETIME NULL", "JSON"),
        DatabaseDriver::Postgres => ("TIMESTAMP NULL", "TEXT"),
        DatabaseDriver::Sqlite => ("TEXT NULL", "TEXT"),
    };

    format!(
        "CREATE TABLE IF NOT EXISTS {table} (\
         playfab_id VARCHAR(64) NOT NULL PRIMARY KEY, \
         platform_account_id VARCHAR(64) NOT NULL, \
         username VARCHAR(255), \
         platform VARCHAR(64), \
         entity_id VARCHAR(64), \
         created_at {created_at}, \
         stats_json {stats_json})"
    )
}
