use crate::client::PlayerSource;
use crate::models::PlayerRecord;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Fetch every ID with at most `limit` requests in flight.
///
/// Failures are logged with the offending ID and dropped; the batch always
/// runs to completion. Successful records come back in launch order.
pub async fn collect_all<S>(source: &S, ids: &[String], limit: usize) -> Vec<PlayerRecord>
where
    S: PlayerSource + ?Sized,
{
    let semaphore = Semaphore::new(limit.max(1));

    let tasks = ids.iter().map(|playfab_id| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore.acquire().await.ok()?;

            match source.fetch(playfab_id).await {
                Ok(record) => {
                    info!(
                        playfab_id = %record.playfab_id,
                        platform_account_id = %record.platform_account_id,
                        username = %record.username,
                        "Player fetched"
                    );
                    Some(record)
                }
                Err(e) => {
                    warn!(playfab_id = %playfab_id, error = %e, "Player fetch failed");
                    None
                }
            }
        }
    });

    join_all(tasks).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetcherError, Result};
    use crate::models::{PlayerStats, StatValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source that records how many fetches overlap
    #[derive(Default)]
    struct TrackingSource {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    fn record(playfab_id: &str) -> PlayerRecord {
        let mut stats = PlayerStats::new();
        stats.insert("Score".to_string(), StatValue::Integer(10));
        PlayerRecord {
            playfab_id: playfab_id.to_string(),
            platform_account_id: format!("{playfab_id}-steam"),
            platform: "Steam".to_string(),
            username: format!("user-{playfab_id}"),
            entity_id: String::new(),
            created_at: None,
            stats,
        }
    }

    #[async_trait::async_trait]
    impl PlayerSource for TrackingSource {
        async fn fetch(&self, playfab_id: &str) -> Result<PlayerRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(2)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if playfab_id.starts_with("bad") {
                return Err(FetcherError::upstream("Invalid PlayFabId"));
            }
            Ok(record(playfab_id))
        }
    }

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("P{i:03}")).collect()
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        for limit in [1, 3, 8] {
            let source = TrackingSource::default();
            let records = collect_all(&source, &ids(25), limit).await;

            assert_eq!(records.len(), 25);
            assert_eq!(source.max_in_flight.load(Ordering::SeqCst), limit);
            assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_limit_larger_than_batch() {
        let source = TrackingSource::default();
        let records = collect_all(&source, &ids(4), 12).await;

        assert_eq!(records.len(), 4);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let source = TrackingSource::default();
        let ids = vec!["A".to_string(), "bad-B".to_string(), "C".to_string()];

        let records = collect_all(&source, &ids, 2).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        let collected: Vec<_> = records.iter().map(|r| r.playfab_id.as_str()).collect();
        assert_eq!(collected, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_one_success_one_upstream_failure() {
        let source = TrackingSource::default();
        let ids = vec!["A".to_string(), "bad".to_string()];

        let records = collect_all(&source, &ids, 10).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].playfab_id, "A");
        assert_eq!(records[0].stats["Score"], StatValue::Integer(10));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let source = TrackingSource::default();
        assert!(collect_all(&source, &[], 5).await.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
