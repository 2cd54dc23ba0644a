#![deny(unused)]
//! Bulk record lifecycle manager for RecordOps.
//!
//! This crate drains collections page by page, purges whole collections,
//! ages out records and files older than a cutoff date, and replaces a
//! collection with a freshly parsed CSV dataset. Two `RecordStore` backends
//! are included for development and single-node deployments.

pub mod fetcher;
pub mod import;
pub mod json_file;
pub mod manager;
pub mod memory;
pub mod purge;
pub mod retention;
pub mod sweep;

use std::sync::Arc;

use recordops_core::{
    config::{FileSweepKind, RetentionConfig},
    traits::{FileSweepStrategy, RecordStore},
    Error, Result,
};

pub use fetcher::PaginatedFetcher;
pub use import::{parse_csv, ImportSummary, ParsedDataset, PreparedImport, ReplaceAllImporter, RowOutcome};
pub use json_file::JsonFileRecordStore;
pub use manager::RecordManager;
pub use memory::InMemoryRecordStore;
pub use purge::{ClassPurger, PurgeReport};
pub use retention::{drain_before, RetentionPurger, RetentionReport};
pub use sweep::{FilesystemFileSweep, QueryFileSweep};

/// Build the file sweep strategy selected by deployment configuration.
pub fn file_sweep_from_config(
    store: Arc<dyn RecordStore>,
    config: &RetentionConfig,
) -> Result<Arc<dyn FileSweepStrategy>> {
    match config.file_sweep {
        FileSweepKind::Query => Ok(Arc::new(
            QueryFileSweep::new(store, config.file_metadata_class.clone())
                .with_batch_size(config.batch_size),
        )),
        FileSweepKind::Filesystem => {
            let root = config.file_store_path.clone().ok_or_else(|| {
                Error::invalid_request("retention.file_store_path is required for the filesystem sweep")
            })?;
            Ok(Arc::new(FilesystemFileSweep::new(root)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordops_core::config::AppConfig;

    #[test]
    fn test_sweep_selection() {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
        let mut config = AppConfig::default().retention;

        let sweep = file_sweep_from_config(store.clone(), &config).unwrap();
        assert_eq!(sweep.name(), "query");

        config.file_sweep = FileSweepKind::Filesystem;
        assert!(file_sweep_from_config(store.clone(), &config).is_err());

        config.file_store_path = Some("/srv/files".into());
        let sweep = file_sweep_from_config(store, &config).unwrap();
        assert_eq!(sweep.name(), "filesystem");
        assert_eq!(sweep.file_store_path().unwrap().to_str(), Some("/srv/files"));
    }
}
