//! Record store persisted as JSON files.
//!
//! Each collection lives in `<dir>/<class>.json`. Collection names are
//! restricted to ASCII alphanumerics, `_` and `-`.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::sync::Mutex;

use recordops_core::{
    traits::RecordStore,
    types::{Credential, Fields, Record, RecordQuery},
    Error, Result,
};

use crate::memory::{new_object_id, run_query};

/// Persistent record store keeping one JSON file per collection.
///
/// Writes go to a temporary file that is renamed over the collection file.
pub struct JsonFileRecordStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileRecordStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn class_path(&self, class_name: &str) -> Result<PathBuf> {
        let valid = !class_name.is_empty()
            && class_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::invalid_request(format!(
                "Invalid class name \"{}\"",
                class_name
            )));
        }
        Ok(self.dir.join(format!("{}.json", class_name)))
    }

    async fn load(&self, class_name: &str) -> Result<Vec<Record>> {
        let path = self.class_path(class_name)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            Error::storage(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    async fn persist(&self, class_name: &str, records: &[Record]) -> Result<()> {
        let path = self.class_path(class_name)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::storage(format!("Failed to create store directory: {}", e))
        })?;
        let content = serde_json::to_vec_pretty(records)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| Error::storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::storage(format!("Failed to replace {}: {}", path.display(), e)))?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn find(&self, credential: &Credential, class_name: &str, query: &RecordQuery) -> Result<Vec<Record>> {
        credential.require_authenticated()?;
        let records = self.load(class_name).await?;
        Ok(run_query(records.iter(), query))
    }

    async fn count(&self, credential: &Credential, class_name: &str) -> Result<usize> {
        credential.require_authenticated()?;
        Ok(self.load(class_name).await?.len())
    }

    async fn create(&self, credential: &Credential, class_name: &str, fields: Fields) -> Result<Record> {
        credential.require_authenticated()?;
        let _guard = self.write_lock.lock().await;

        let mut records = self.load(class_name).await?;
        let now = Utc::now();
        let record = Record {
            object_id: new_object_id(),
            created_at: now,
            updated_at: now,
            fields,
        };
        records.push(record.clone());
        self.persist(class_name, &records).await?;
        Ok(record)
    }

    async fn delete_many(&self, credential: &Credential, class_name: &str, ids: &[String]) -> Result<usize> {
        credential.require_authenticated()?;
        let _guard = self.write_lock.lock().await;

        let mut records = self.load(class_name).await?;
        let before = records.len();
        records.retain(|r| !ids.contains(&r.object_id));
        let removed = before - records.len();
        if removed > 0 {
            self.persist(class_name, &records).await?;
        }
        Ok(removed)
    }

    async fn purge_class(&self, credential: &Credential, class_name: &str) -> Result<()> {
        credential.require_elevated()?;
        let _guard = self.write_lock.lock().await;

        let path = self.class_path(class_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
