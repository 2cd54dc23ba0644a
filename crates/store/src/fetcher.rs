//! Paginated collection reads.

use std::sync::Arc;

use recordops_core::{
    traits::RecordStore,
    types::{Credential, DataRecord, FileStoreRecord, PageCursor, Record, SortOrder, MAX_PAGE_SIZE},
    Error, Result,
};

/// Drains a collection into memory page by page.
///
/// A page shorter than the page size ends the walk. A final page of exactly
/// `page_size` rows therefore costs one extra, empty round-trip. Query
/// failures are returned immediately without retry.
pub struct PaginatedFetcher {
    store: Arc<dyn RecordStore>,
    page_size: usize,
}

impl PaginatedFetcher {
    /// Create a fetcher using the store's maximum page size.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Override the page size (clamped to the store ceiling).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetch every record of a collection, projected onto `fields`.
    pub async fn fetch_all(
        &self,
        credential: &Credential,
        class_name: &str,
        fields: &[String],
    ) -> Result<Vec<DataRecord>> {
        let records = self.drain(credential, class_name, SortOrder::Natural).await?;
        Ok(records.iter().map(|r| r.project(fields)).collect())
    }

    /// Fetch every file metadata record, oldest first.
    pub async fn fetch_all_files(
        &self,
        credential: &Credential,
        class_name: &str,
    ) -> Result<Vec<FileStoreRecord>> {
        let records = self
            .drain(credential, class_name, SortOrder::CreatedAtAscending)
            .await?;
        Ok(records.into_iter().map(FileStoreRecord::from).collect())
    }

    /// Walk the collection with `skip = page * page_size`.
    pub async fn drain(
        &self,
        credential: &Credential,
        class_name: &str,
        order: SortOrder,
    ) -> Result<Vec<Record>> {
        credential.require_authenticated()?;

        let mut cursor = PageCursor::start(self.page_size);
        let mut records = Vec::new();

        loop {
            let mut query = cursor.query();
            query.order = order;

            let page = self.store.find(credential, class_name, &query).await?;
            let len = page.len();

            if let Some(bad) = page.iter().find(|r| r.object_id.is_empty()) {
                return Err(Error::storage(format!(
                    "Store returned a {} record without an id (created {})",
                    class_name, bad.created_at
                )));
            }

            tracing::debug!(
                class = class_name,
                page = cursor.page,
                skip = query.skip,
                rows = len,
                "Fetched page"
            );

            records.extend(page);
            if cursor.is_last(len) {
                break;
            }
            cursor.advance();
        }

        tracing::info!(class = class_name, total = records.len(), "Fetched collection");
        Ok(records)
    }
}
