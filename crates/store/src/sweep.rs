//! File sweep strategies.
//!
//! `QueryFileSweep` deletes file metadata records through the record store
//! and never touches file bytes. `FilesystemFileSweep` deletes files under a
//! root directory by modification time and never touches the record store.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use recordops_core::{
    traits::{FileSweepStrategy, RecordStore},
    types::{Credential, CutoffDate, MAX_PAGE_SIZE},
    Error, Result,
};

use crate::retention::drain_before;

/// Drains the reserved file metadata collection.
pub struct QueryFileSweep {
    store: Arc<dyn RecordStore>,
    class_name: String,
    batch_size: usize,
}

impl QueryFileSweep {
    pub fn new(store: Arc<dyn RecordStore>, class_name: impl Into<String>) -> Self {
        Self {
            store,
            class_name: class_name.into(),
            batch_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[async_trait]
impl FileSweepStrategy for QueryFileSweep {
    fn name(&self) -> &'static str {
        "query"
    }

    async fn sweep_before(&self, credential: &Credential, cutoff: &CutoffDate) -> Result<usize> {
        drain_before(
            self.store.as_ref(),
            credential,
            &self.class_name,
            cutoff,
            self.batch_size,
        )
        .await
    }
}

/// Deletes regular files under a root directory modified before the cutoff.
pub struct FilesystemFileSweep {
    root: PathBuf,
}

impl FilesystemFileSweep {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileSweepStrategy for FilesystemFileSweep {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn file_store_path(&self) -> Option<&Path> {
        Some(&self.root)
    }

    async fn sweep_before(&self, credential: &Credential, cutoff: &CutoffDate) -> Result<usize> {
        credential.require_authenticated()?;
        let root = self.root.clone();
        let cutoff = *cutoff;

        tokio::task::spawn_blocking(move || sweep_dir(&root, &cutoff))
            .await
            .map_err(|e| Error::internal(format!("File sweep task failed: {}", e)))?
    }
}

fn sweep_dir(root: &Path, cutoff: &CutoffDate) -> Result<usize> {
    if !root.is_dir() {
        return Err(Error::file_system(format!(
            "File store path does not exist: {}",
            root.display()
        )));
    }

    let mut deleted = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            Error::file_system(format!("Failed to walk {}: {}", root.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let modified = entry
            .metadata()
            .map_err(|e| Error::file_system(format!("Failed to stat {}: {}", path.display(), e)))?
            .modified()
            .map_err(|e| {
                Error::file_system(format!("No modification time for {}: {}", path.display(), e))
            })?;

        if cutoff.is_expired_system_time(modified) {
            std::fs::remove_file(path).map_err(|e| {
                Error::file_system(format!(
                    "Failed to delete {} after removing {} files: {}",
                    path.display(),
                    deleted,
                    e
                ))
            })?;
            deleted += 1;
            tracing::trace!(path = %path.display(), "Deleted expired file");
        }
    }

    tracing::debug!(root = %root.display(), deleted, "Filesystem sweep complete");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    fn touch(path: &Path, modified: SystemTime) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let file = File::create(path).unwrap();
        file.set_modified(modified).unwrap();
    }

    fn cutoff() -> (CutoffDate, SystemTime) {
        let cutoff = CutoffDate::parse("2024-01-01").unwrap();
        (cutoff, SystemTime::from(cutoff.instant()))
    }

    #[tokio::test]
    async fn test_boundary_file_is_retained() {
        let dir = tempfile::tempdir().unwrap();
        let (cutoff, instant) = cutoff();
        touch(&dir.path().join("before.bin"), instant - Duration::from_nanos(1));
        touch(&dir.path().join("exact.bin"), instant);
        touch(&dir.path().join("after.bin"), instant + Duration::from_nanos(1));

        let sweep = FilesystemFileSweep::new(dir.path());
        let deleted = sweep
            .sweep_before(&Credential::user("alice"), &cutoff)
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(!dir.path().join("before.bin").exists());
        assert!(dir.path().join("exact.bin").exists());
        assert!(dir.path().join("after.bin").exists());
    }

    #[tokio::test]
    async fn test_nested_files_and_idempotence() {
        let dir = tempfile::tempdir().unwrap();
        let (cutoff, instant) = cutoff();
        let old = instant - Duration::from_secs(86_400);
        touch(&dir.path().join("a/b/old1.dat"), old);
        touch(&dir.path().join("a/old2.dat"), old);
        touch(&dir.path().join("a/new.dat"), SystemTime::now());

        let sweep = FilesystemFileSweep::new(dir.path());
        let user = Credential::user("alice");
        assert_eq!(sweep.sweep_before(&user, &cutoff).await.unwrap(), 2);
        assert_eq!(sweep.sweep_before(&user, &cutoff).await.unwrap(), 0);
        assert!(dir.path().join("a/new.dat").exists());
        assert!(dir.path().join("a/b").is_dir());
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = FilesystemFileSweep::new(dir.path().join("nope"));
        let (cutoff, _) = cutoff();

        let err = sweep
            .sweep_before(&Credential::user("alice"), &cutoff)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileSystem(_)));
        assert!(err.to_string().contains("does not exist"));
        assert_eq!(sweep.file_store_path(), Some(dir.path().join("nope").as_path()));
    }

    #[tokio::test]
    async fn test_query_sweep_has_no_path() {
        let store = Arc::new(crate::memory::InMemoryRecordStore::new());
        let sweep = QueryFileSweep::new(store, "_FileMetadata");
        assert_eq!(sweep.name(), "query");
        assert!(sweep.file_store_path().is_none());
    }
}
