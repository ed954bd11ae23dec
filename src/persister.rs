// ==========================================
// Apparel Season Reconciliation - Batch Persister
// ==========================================
// Writes large record sets (up to ~400K rows) in bounded chunks with
// replace semantics, retry/backoff and per-chunk failure isolation.
//
// Invariants:
// - The delete step runs exactly once, before the first chunk.
// - Chunks are strictly sequential: chunk n+1 starts only after chunk n
//   completed (success or logged failure).
// - One bad chunk never aborts the whole import.
// ==========================================

use crate::domain::types::{ReplaceScope, Table};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::table_store::{TableRow, TableStore};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

// ==========================================
// RetryPolicy
// ==========================================
/// Bounded retry with linear backoff, plus the unconditional inter-chunk
/// delay that keeps the direct-SQL path under the store's rate limits.
/// Tests run with zero delays.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt, so a chunk is
    /// tried at most `max_attempts + 1` times before it counts as
    /// failed.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    pub inter_chunk_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_secs(5),
            backoff_cap: Duration::from_secs(30),
            inter_chunk_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: attempt x base, capped. Attempts are 1-based.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        (self.backoff_base * attempt).min(self.backoff_cap)
    }

    /// Zero-delay policy for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: Duration::ZERO,
            backoff_cap: Duration::ZERO,
            inter_chunk_delay: Duration::ZERO,
        }
    }
}

// ==========================================
// Persist options and report
// ==========================================
#[derive(Debug, Clone)]
pub struct PersistOptions {
    pub chunk_size: usize,
    pub replace_existing: bool,
    pub scope: ReplaceScope,
}

impl PersistOptions {
    pub fn replace_table(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            replace_existing: true,
            scope: ReplaceScope::Table,
        }
    }

    pub fn replace_seasons(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            replace_existing: true,
            scope: ReplaceScope::Seasons,
        }
    }

    pub fn append_only(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            replace_existing: false,
            scope: ReplaceScope::Seasons,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PersistReport {
    pub inserted: usize,
    pub deleted: usize,
    /// Rows belonging to chunks that failed after retries.
    pub failed_rows: usize,
    pub chunks_total: usize,
    pub chunks_failed: usize,
}

// ==========================================
// BatchPersister
// ==========================================
pub struct BatchPersister<S: TableStore> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: TableStore> BatchPersister<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Persist a record set with replace semantics.
    ///
    /// A failed replace-delete aborts the run: inserting on top of stale
    /// rows would double data. Insert failures are isolated per chunk.
    pub async fn persist(
        &self,
        table: Table,
        rows: Vec<TableRow>,
        options: &PersistOptions,
    ) -> RepositoryResult<PersistReport> {
        let mut report = PersistReport::default();

        if options.replace_existing {
            report.deleted = match options.scope {
                ReplaceScope::Table => self.store.delete_all(table).await?,
                ReplaceScope::Seasons => {
                    let seasons = seasons_in(&rows);
                    self.store.delete_seasons(table, &seasons).await?
                }
            };
            info!(table = %table, deleted = report.deleted, scope = ?options.scope, "replace delete complete");
        }

        let skip_duplicates = table.skip_duplicates();
        let chunk_size = options.chunk_size.max(1);
        let chunks: Vec<&[TableRow]> = rows.chunks(chunk_size).collect();
        report.chunks_total = chunks.len();

        for (index, chunk) in chunks.iter().enumerate() {
            match self.insert_with_retry(table, chunk, skip_duplicates).await {
                Ok(inserted) => {
                    report.inserted += inserted;
                }
                Err(e) => {
                    // Partial-failure isolation: log the chunk's row
                    // range, count it, and keep going.
                    let start = index * chunk_size;
                    error!(
                        table = %table,
                        chunk = index,
                        rows = format!("{}..{}", start, start + chunk.len()),
                        error = %e,
                        "chunk failed, continuing with next chunk"
                    );
                    report.failed_rows += chunk.len();
                    report.chunks_failed += 1;
                }
            }

            if index + 1 < chunks.len() && !self.retry.inter_chunk_delay.is_zero() {
                tokio::time::sleep(self.retry.inter_chunk_delay).await;
            }
        }

        info!(
            table = %table,
            inserted = report.inserted,
            failed_rows = report.failed_rows,
            chunks = report.chunks_total,
            chunks_failed = report.chunks_failed,
            "persist complete"
        );
        Ok(report)
    }

    /// One chunk: bounded retry loop for transient errors, tagged result
    /// (inserted count / final error) rather than implicit propagation.
    async fn insert_with_retry(
        &self,
        table: Table,
        chunk: &[TableRow],
        skip_duplicates: bool,
    ) -> RepositoryResult<usize> {
        let mut attempt = 1;
        loop {
            match self.store.insert_rows(table, chunk, skip_duplicates).await {
                Ok(inserted) => return Ok(inserted),
                Err(e) if e.is_transient() && attempt <= self.retry.max_attempts => {
                    let delay = self.retry.backoff_delay(attempt);
                    warn!(
                        table = %table,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient store error, backing off"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn seasons_in(rows: &[TableRow]) -> Vec<String> {
    let seasons: BTreeSet<String> = rows.iter().filter_map(|r| r.season.clone()).collect();
    seasons.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// In-memory store with scripted failures per insert call.
    struct ScriptedStore {
        rows: Mutex<Vec<TableRow>>,
        /// One entry per expected insert call; None = success.
        failures: Mutex<Vec<Option<RepositoryError>>>,
        insert_calls: Mutex<u32>,
    }

    impl ScriptedStore {
        fn new(failures: Vec<Option<RepositoryError>>) -> Self {
            Self {
                rows: Mutex::new(Vec::new()),
                failures: Mutex::new(failures),
                insert_calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl TableStore for ScriptedStore {
        async fn insert_rows(
            &self,
            _table: Table,
            rows: &[TableRow],
            _skip_duplicates: bool,
        ) -> RepositoryResult<usize> {
            *self.insert_calls.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if !failures.is_empty() {
                if let Some(error) = failures.remove(0) {
                    return Err(error);
                }
            }
            self.rows.lock().unwrap().extend_from_slice(rows);
            Ok(rows.len())
        }

        async fn delete_all(&self, _table: Table) -> RepositoryResult<usize> {
            let mut rows = self.rows.lock().unwrap();
            let deleted = rows.len();
            rows.clear();
            Ok(deleted)
        }

        async fn delete_seasons(
            &self,
            _table: Table,
            seasons: &[String],
        ) -> RepositoryResult<usize> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| match &r.season {
                Some(season) => !seasons.contains(season),
                None => true,
            });
            Ok(before - rows.len())
        }

        async fn read_page(
            &self,
            _table: Table,
            offset: usize,
            limit: usize,
        ) -> RepositoryResult<Vec<TableRow>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().skip(offset).take(limit).cloned().collect())
        }

        async fn count_rows(
            &self,
            _table: Table,
            _season: Option<&str>,
        ) -> RepositoryResult<usize> {
            Ok(self.rows.lock().unwrap().len())
        }

        async fn inventory_rollup(&self) -> RepositoryResult<crate::repository::InventoryRollup> {
            unimplemented!("not used by persister tests")
        }

        async fn sales_rollup(&self) -> RepositoryResult<crate::repository::SalesRollup> {
            unimplemented!("not used by persister tests")
        }

        async fn sales_page(
            &self,
            _offset: usize,
            _limit: usize,
        ) -> RepositoryResult<Vec<TableRow>> {
            unimplemented!("not used by persister tests")
        }
    }

    fn rows(n: usize, season: &str) -> Vec<TableRow> {
        (0..n)
            .map(|i| {
                TableRow::new(
                    Some(format!("S{i}_{season}")),
                    Some(season.to_string()),
                    json!({"n": i}),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_chunk_isolation() {
        // Three chunks, chunk 2 fails with a non-transient error:
        // inserted = chunk1 + chunk3, failed = chunk2, both survive in
        // the store.
        let store = Arc::new(ScriptedStore::new(vec![
            None,
            Some(RepositoryError::DatabaseQueryError("bad batch".to_string())),
            None,
        ]));
        let persister = BatchPersister::new(Arc::clone(&store), RetryPolicy::immediate(1));

        let report = persister
            .persist(
                Table::Products,
                rows(30, "26FA"),
                &PersistOptions::append_only(10),
            )
            .await
            .unwrap();

        assert_eq!(report.chunks_total, 3);
        assert_eq!(report.chunks_failed, 1);
        assert_eq!(report.inserted, 20);
        assert_eq!(report.failed_rows, 10);
        assert_eq!(store.rows.lock().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let store = Arc::new(ScriptedStore::new(vec![
            Some(RepositoryError::RateLimited("429".to_string())),
            Some(RepositoryError::Unavailable {
                status: 503,
                message: "down".to_string(),
            }),
            None,
        ]));
        let persister = BatchPersister::new(Arc::clone(&store), RetryPolicy::immediate(5));

        let report = persister
            .persist(
                Table::Products,
                rows(5, "26FA"),
                &PersistOptions::append_only(10),
            )
            .await
            .unwrap();

        assert_eq!(report.inserted, 5);
        assert_eq!(report.chunks_failed, 0);
        assert_eq!(*store.insert_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_counts_as_chunk_failure() {
        // max_attempts = 3 retries on top of the initial attempt, so the
        // chunk is tried 4 times before it is given up on.
        let rate_limited = || Some(RepositoryError::RateLimited("429".to_string()));
        let store = Arc::new(ScriptedStore::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
        ]));
        let persister = BatchPersister::new(Arc::clone(&store), RetryPolicy::immediate(3));

        let report = persister
            .persist(
                Table::Products,
                rows(5, "26FA"),
                &PersistOptions::append_only(10),
            )
            .await
            .unwrap();

        assert_eq!(report.inserted, 0);
        assert_eq!(report.failed_rows, 5);
        assert_eq!(*store.insert_calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_final_retry_can_still_succeed() {
        // A chunk that recovers on the last allowed retry is not a
        // failure: 5 retries after the first attempt, 6 calls total.
        let rate_limited = || Some(RepositoryError::RateLimited("429".to_string()));
        let store = Arc::new(ScriptedStore::new(vec![
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
            rate_limited(),
            None,
        ]));
        let persister = BatchPersister::new(Arc::clone(&store), RetryPolicy::immediate(5));

        let report = persister
            .persist(
                Table::Products,
                rows(5, "26FA"),
                &PersistOptions::append_only(10),
            )
            .await
            .unwrap();

        assert_eq!(report.inserted, 5);
        assert_eq!(report.chunks_failed, 0);
        assert_eq!(*store.insert_calls.lock().unwrap(), 6);
    }

    #[tokio::test]
    async fn test_non_transient_error_not_retried() {
        let store = Arc::new(ScriptedStore::new(vec![Some(
            RepositoryError::Unavailable {
                status: 400,
                message: "malformed".to_string(),
            },
        )]));
        let persister = BatchPersister::new(Arc::clone(&store), RetryPolicy::immediate(5));

        let report = persister
            .persist(
                Table::Products,
                rows(3, "26FA"),
                &PersistOptions::append_only(10),
            )
            .await
            .unwrap();

        assert_eq!(report.failed_rows, 3);
        assert_eq!(*store.insert_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_season_scoped_replace_deletes_only_batch_seasons() {
        let store = Arc::new(ScriptedStore::new(vec![]));
        let persister = BatchPersister::new(Arc::clone(&store), RetryPolicy::immediate(1));

        // Seed both seasons.
        let mut seed = rows(3, "26SP");
        seed.extend(rows(3, "26FA"));
        persister
            .persist(Table::Products, seed, &PersistOptions::append_only(100))
            .await
            .unwrap();

        // Season-scoped replace for 26FA only.
        let report = persister
            .persist(
                Table::Products,
                rows(2, "26FA"),
                &PersistOptions::replace_seasons(100),
            )
            .await
            .unwrap();

        assert_eq!(report.deleted, 3);
        let remaining = store.rows.lock().unwrap();
        assert_eq!(
            remaining
                .iter()
                .filter(|r| r.season.as_deref() == Some("26SP"))
                .count(),
            3
        );
        assert_eq!(
            remaining
                .iter()
                .filter(|r| r.season.as_deref() == Some("26FA"))
                .count(),
            2
        );
    }

    #[test]
    fn test_backoff_is_linear_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(5));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(15));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(30));
    }
}
