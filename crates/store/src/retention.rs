//! Retention-window purge of records and files.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use recordops_core::{
    traits::{FileSweepStrategy, RecordStore},
    types::{Credential, CutoffDate, RecordQuery, MAX_PAGE_SIZE},
    Error, Result,
};

/// Counts removed by a retention purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionReport {
    pub deleted_records: usize,
    pub deleted_files: usize,
    pub before_date: CutoffDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_store_path: Option<PathBuf>,
}

/// Repeatedly select up to `batch_size` rows created before the cutoff and
/// delete them, until a selection comes back empty.
///
/// Deleted rows drop out of the selection, so no offset is tracked. A
/// failing batch stops the sweep; the rows of earlier batches stay deleted.
pub async fn drain_before(
    store: &dyn RecordStore,
    credential: &Credential,
    class_name: &str,
    cutoff: &CutoffDate,
    batch_size: usize,
) -> Result<usize> {
    let query = RecordQuery::new()
        .created_before(cutoff.instant())
        .limit(batch_size.clamp(1, MAX_PAGE_SIZE));
    let mut deleted = 0;

    loop {
        let batch = store.find(credential, class_name, &query).await.map_err(|e| {
            Error::storage(format!(
                "Failed to query {} after deleting {}: {}",
                class_name, deleted, e
            ))
        })?;
        if batch.is_empty() {
            break;
        }

        let ids: Vec<String> = batch.into_iter().map(|r| r.object_id).collect();
        let removed = store
            .delete_many(credential, class_name, &ids)
            .await
            .map_err(|e| {
                Error::storage(format!(
                    "Failed to delete {} batch after deleting {}: {}",
                    class_name, deleted, e
                ))
            })?;

        // A non-empty selection that deletes nothing would loop forever.
        if removed == 0 {
            return Err(Error::storage(format!(
                "Store deleted none of {} selected {} rows",
                ids.len(),
                class_name
            )));
        }

        deleted += removed;
        tracing::debug!(class = class_name, batch = ids.len(), deleted, "Deleted batch");
    }

    Ok(deleted)
}

/// Deletes records and files strictly older than a cutoff date.
pub struct RetentionPurger {
    store: Arc<dyn RecordStore>,
    files: Arc<dyn FileSweepStrategy>,
    batch_size: usize,
}

impl RetentionPurger {
    pub fn new(store: Arc<dyn RecordStore>, files: Arc<dyn FileSweepStrategy>) -> Self {
        Self {
            store,
            files,
            batch_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Name of the configured file sweep strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.files.name()
    }

    /// Purge `class_name` records and stored files older than `before_date`
    /// (`YYYY-MM-DD`).
    pub async fn purge_before(
        &self,
        credential: &Credential,
        before_date: &str,
        class_name: &str,
    ) -> Result<RetentionReport> {
        let cutoff = CutoffDate::parse(before_date)?;
        if class_name.trim().is_empty() {
            return Err(Error::invalid_request("className must not be empty"));
        }
        let user = credential.require_authenticated()?;
        let elevated = credential.elevate();

        let deleted_records =
            drain_before(self.store.as_ref(), &elevated, class_name, &cutoff, self.batch_size).await?;
        let deleted_files = self.files.sweep_before(&elevated, &cutoff).await?;

        tracing::info!(
            class = class_name,
            user = user,
            before = %cutoff,
            strategy = self.files.name(),
            deleted_records,
            deleted_files,
            "Retention purge complete"
        );

        Ok(RetentionReport {
            deleted_records,
            deleted_files,
            before_date: cutoff,
            file_store_path: self.files.file_store_path().map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRecordStore;
    use crate::sweep::QueryFileSweep;
    use chrono::{TimeZone, Utc};
    use recordops_core::mocks::FlakyRecordStore;
    use recordops_core::types::Fields;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn purger(store: Arc<dyn RecordStore>) -> RetentionPurger {
        let files = Arc::new(QueryFileSweep::new(store.clone(), "_FileMetadata"));
        RetentionPurger::new(store, files)
    }

    #[tokio::test]
    async fn test_purges_only_older_records() {
        let store = Arc::new(InMemoryRecordStore::new());
        for ts in [at(2023, 1, 1), at(2023, 6, 15), at(2024, 2, 1)] {
            store.insert_at("FileStore", ts, Fields::new());
        }

        let report = purger(store.clone())
            .purge_before(&Credential::user("alice"), "2024-01-01", "FileStore")
            .await
            .unwrap();

        assert_eq!(report.deleted_records, 2);
        assert_eq!(report.deleted_files, 0);
        assert_eq!(report.before_date.to_string(), "2024-01-01");
        assert_eq!(store.len("FileStore"), 1);
    }

    #[tokio::test]
    async fn test_record_at_cutoff_is_retained() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.insert_at("FileStore", at(2024, 1, 1), Fields::new());
        store.insert_at("FileStore", at(2024, 1, 1) - chrono::Duration::milliseconds(1), Fields::new());

        let report = purger(store.clone())
            .purge_before(&Credential::user("alice"), "2024-01-01", "FileStore")
            .await
            .unwrap();
        assert_eq!(report.deleted_records, 1);
        assert_eq!(store.len("FileStore"), 1);
    }

    #[tokio::test]
    async fn test_drains_across_batches_and_is_idempotent() {
        let store = Arc::new(InMemoryRecordStore::new());
        for _ in 0..2300 {
            store.insert_at("FileStore", at(2020, 1, 1), Fields::new());
        }
        for _ in 0..40 {
            store.insert_at("_FileMetadata", at(2020, 1, 1), Fields::new());
        }
        let flaky = Arc::new(FlakyRecordStore::new(store.clone()));
        let retention = purger(flaky.clone());
        let user = Credential::user("alice");

        let report = retention.purge_before(&user, "2021-01-01", "FileStore").await.unwrap();
        assert_eq!(report.deleted_records, 2300);
        assert_eq!(report.deleted_files, 40);
        // 3 record batches + 1 file batch.
        assert_eq!(flaky.delete_calls(), 4);

        let again = retention.purge_before(&user, "2021-01-01", "FileStore").await.unwrap();
        assert_eq!(again.deleted_records, 0);
        assert_eq!(again.deleted_files, 0);
    }

    #[tokio::test]
    async fn test_invalid_dates_touch_nothing() {
        let store = Arc::new(InMemoryRecordStore::new());
        store.insert_at("FileStore", at(2020, 1, 1), Fields::new());
        let flaky = Arc::new(FlakyRecordStore::new(store.clone()));
        let retention = purger(flaky.clone());

        for bad in ["2024-13-40", "not-a-date"] {
            let err = retention
                .purge_before(&Credential::user("alice"), bad, "FileStore")
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
        assert!(flaky.calls().is_empty());
        assert_eq!(store.len("FileStore"), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_touches_nothing() {
        let flaky = Arc::new(FlakyRecordStore::new(Arc::new(InMemoryRecordStore::new())));
        let err = purger(flaky.clone())
            .purge_before(&Credential::anonymous(), "2024-01-01", "FileStore")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
        assert!(flaky.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_halts_sweep() {
        let store = Arc::new(InMemoryRecordStore::new());
        for i in 0..25 {
            let mut f = Fields::new();
            f.insert("n".into(), json!(i));
            store.insert_at("FileStore", at(2020, 1, 1), f);
        }
        let flaky = Arc::new(FlakyRecordStore::new(store.clone()).fail_delete_at(2));
        let retention = purger(flaky.clone()).with_batch_size(10);

        let err = retention
            .purge_before(&Credential::user("alice"), "2021-01-01", "FileStore")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after deleting 10"), "{err}");
        assert_eq!(store.len("FileStore"), 15);

        // Re-running finishes the job.
        let report = purger(store.clone())
            .with_batch_size(10)
            .purge_before(&Credential::user("alice"), "2021-01-01", "FileStore")
            .await
            .unwrap();
        assert_eq!(report.deleted_records, 15);
        assert_eq!(store.len("FileStore"), 0);
    }

    #[tokio::test]
    async fn test_batch_deleting_nothing_stops_sweep() {
        let store = Arc::new(InMemoryRecordStore::new());
        for _ in 0..3 {
            store.insert_at("FileStore", at(2020, 1, 1), Fields::new());
        }
        let flaky = Arc::new(FlakyRecordStore::new(store.clone()).ignore_deletes());

        let err = purger(flaky.clone())
            .purge_before(&Credential::user("alice"), "2021-01-01", "FileStore")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("deleted none of 3"), "{err}");
        assert_eq!(flaky.find_calls(), 1);
        assert_eq!(flaky.delete_calls(), 1);
        assert_eq!(store.len("FileStore"), 3);
    }
}
