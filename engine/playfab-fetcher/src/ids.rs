use crate::config::{FetcherConfig, InputSource};
use crate::error::{FetcherError, Result};
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the PlayFab IDs for a run come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// Newline-delimited text file, one ID per non-blank line
    ManualFile(PathBuf),
    /// Query whose first column holds the IDs
    Database { query: String },
}

impl IdSource {
    pub fn from_config(config: &FetcherConfig) -> Self {
        match config.input.source {
            InputSource::ManualFile => Self::ManualFile(config.input.manual_file.clone()),
            InputSource::Database => {
                Self::Database { query: config.sql_query.get_playfab_ids.clone() }
            }
        }
    }

    /// Produce the IDs in source order, without deduplication
    pub async fn resolve(&self, pool: &AnyPool) -> Result<Vec<String>> {
        let ids = match self {
            Self::ManualFile(path) => read_manual_ids(path)?,
            Self::Database { query } => query_ids(pool, query).await?,
        };
        info!(source = ?self, count = ids.len(), "Resolved PlayFab IDs");
        Ok(ids)
    }
}

/// Read IDs from a newline-delimited file, skipping blank lines
pub fn read_manual_ids(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FetcherError::not_found(format!(
            "Manual PlayFab ID file {} does not exist",
            path.display()
        )),
        _ => FetcherError::Io(e),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Run `query` and take the first column of each row
pub async fn query_ids(pool: &AnyPool, query: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(query).fetch_all(pool).await?;
    Ok(rows.iter().enumerate().filter_map(|(index, row)| first_column(index, row)).collect())
}

fn first_column(index: usize, row: &AnyRow) -> Option<String> {
    if let Ok(Some(id)) = row.try_get::<Option<String>, _>(0) {
        return Some(id);
    }
    if let Ok(Some(id)) = row.try_get::<Option<i64>, _>(0) {
        return Some(id.to_string());
    }
    warn!(row = index, "Skipping row without a usable PlayFab ID");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::memory_pool;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_manual_file_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "  6A2B3C4D5E6F7A8B  \n\n1F2E3D4C5B6A7980\n").unwrap();

        let ids = read_manual_ids(file.path()).unwrap();
        assert_eq!(ids, vec!["6A2B3C4D5E6F7A8B", "1F2E3D4C5B6A7980"]);
    }

    #[test]
    fn test_manual_file_keeps_duplicates_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "B\nA\r\nB\n   \n").unwrap();

        assert_eq!(read_manual_ids(file.path()).unwrap(), vec!["B", "A", "B"]);
    }

    #[test]
    fn test_missing_manual_file_is_not_found() {
        let err = read_manual_ids("/nonexistent/manual_playfabids.txt").unwrap_err();
        assert!(matches!(err, FetcherError::NotFound(_)));
    }

    #[test]
    fn test_source_from_config() {
        let mut config = FetcherConfig::default();
        config.sql_query.get_playfab_ids = "SELECT playfab_id FROM accounts".to_string();
        assert_eq!(
            IdSource::from_config(&config),
            IdSource::Database { query: "SELECT playfab_id FROM accounts".to_string() }
        );

        config.input.source = InputSource::ManualFile;
        config.input.manual_file = PathBuf::from("ids.txt");
        assert_eq!(IdSource::from_config(&config), IdSource::ManualFile(PathBuf::from("ids.txt")));
    }

    #[tokio::test]
    async fn test_query_takes_first_column() {
        let pool = memory_pool().await;
        sqlx::query("CREATE TABLE accounts (playfab_id TEXT, region TEXT, seq INTEGER)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO accounts VALUES ('C0FFEE', 'eu', 1), ('BEEF01', 'na', 2), (NULL, 'eu', 3)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let source = IdSource::Database {
            query: "SELECT playfab_id, region FROM accounts ORDER BY seq".to_string(),
        };
        assert_eq!(source.resolve(&pool).await.unwrap(), vec!["C0FFEE", "BEEF01"]);
    }
}
