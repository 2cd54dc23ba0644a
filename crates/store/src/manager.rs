//! Lifecycle-guarded operations on the primary record collection.

use std::sync::{Arc, Mutex, PoisonError};

use recordops_core::{
    traits::RecordStore,
    types::{Credential, DataRecord},
    LifecycleEvent, LifecycleState, Result,
};

use crate::fetcher::PaginatedFetcher;
use crate::import::{parse_csv, ImportSummary, ReplaceAllImporter};

/// Runs fetch, count and import against one collection while keeping a
/// caller-visible [`LifecycleState`].
///
/// Starting an operation while another one is in flight fails with
/// `Error::Busy`. The guard lives here only; the store itself is not locked.
pub struct RecordManager {
    store: Arc<dyn RecordStore>,
    class_name: String,
    fields: Vec<String>,
    fetcher: PaginatedFetcher,
    importer: ReplaceAllImporter,
    state: Mutex<LifecycleState>,
}

impl RecordManager {
    pub fn new(store: Arc<dyn RecordStore>, class_name: impl Into<String>, fields: Vec<String>) -> Self {
        let class_name = class_name.into();
        Self {
            fetcher: PaginatedFetcher::new(store.clone()),
            importer: ReplaceAllImporter::new(store.clone()),
            state: Mutex::new(LifecycleState::new(class_name.clone())),
            store,
            class_name,
            fields,
        }
    }

    /// Use a custom page size for fetches.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.fetcher = PaginatedFetcher::new(self.store.clone()).with_page_size(page_size);
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Current lifecycle snapshot.
    pub fn state(&self) -> LifecycleState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, event: LifecycleEvent) -> Result<()> {
        self.lock().apply(event)
    }

    /// Record a failure and hand the error back.
    fn fail<T>(&self, err: recordops_core::Error) -> Result<T> {
        if let Err(e) = self.apply(LifecycleEvent::Failed(err.to_string())) {
            tracing::warn!(error = %e, "Could not record failure in lifecycle");
        }
        Err(err)
    }

    /// Apply a start event and arm a guard for the running operation.
    fn begin(&self, event: LifecycleEvent) -> Result<InFlight<'_>> {
        self.apply(event)?;
        Ok(InFlight {
            manager: self,
            armed: true,
        })
    }

    /// Count the collection.
    pub async fn refresh_count(&self, credential: &Credential) -> Result<usize> {
        let guard = self.begin(LifecycleEvent::FetchStart)?;
        let result: Result<usize> = async {
            let count = self.store.count(credential, &self.class_name).await?;
            self.apply(LifecycleEvent::FetchSuccess { count })?;
            Ok(count)
        }
        .await;
        guard.settle(result)
    }

    /// Fetch every record, projected onto the configured fields.
    pub async fn fetch_all(&self, credential: &Credential) -> Result<Vec<DataRecord>> {
        let guard = self.begin(LifecycleEvent::FetchStart)?;
        let result: Result<Vec<DataRecord>> = async {
            let records = self
                .fetcher
                .fetch_all(credential, &self.class_name, &self.fields)
                .await?;
            self.apply(LifecycleEvent::FetchSuccess { count: records.len() })?;
            Ok(records)
        }
        .await;
        guard.settle(result)
    }

    /// Replace the collection with the rows of a CSV dataset.
    pub async fn replace_all(&self, credential: &Credential, csv_text: &str) -> Result<ImportSummary> {
        let guard = self.begin(LifecycleEvent::DeleteStart)?;
        let result: Result<ImportSummary> = async {
            let dataset = parse_csv(csv_text)?;
            let prepared = self.importer.prepare(credential, &self.class_name, dataset).await?;
            self.apply(LifecycleEvent::DeleteSuccess {
                deleted: prepared.previous_count(),
                upload_total: prepared.total(),
            })?;

            let summary = prepared
                .run(|completed| {
                    if let Err(e) = self.apply(LifecycleEvent::UploadProgress { completed }) {
                        tracing::warn!(error = %e, "Progress out of order");
                    }
                })
                .await?;
            self.apply(LifecycleEvent::UploadSuccess { count: summary.new_count })?;
            Ok(summary)
        }
        .await;
        guard.settle(result)
    }
}

/// Marks the lifecycle failed when an operation future is dropped before
/// it settles, so a cancelled request cannot leave the manager busy.
struct InFlight<'a> {
    manager: &'a RecordManager,
    armed: bool,
}

impl InFlight<'_> {
    fn settle<T>(mut self, result: Result<T>) -> Result<T> {
        self.armed = false;
        match result {
            Ok(value) => Ok(value),
            Err(e) => self.manager.fail(e),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(class = %self.manager.class_name, "Operation cancelled before completion");
        if let Err(e) = self
            .manager
            .apply(LifecycleEvent::Failed("operation cancelled before completion".into()))
        {
            tracing::warn!(error = %e, "Could not record cancellation in lifecycle");
        }
    }
}
