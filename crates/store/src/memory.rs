//! In-memory record store implementation using DashMap.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use recordops_core::{
    traits::RecordStore,
    types::{Credential, Fields, Record, RecordQuery, SortOrder, MAX_PAGE_SIZE},
    Result,
};

/// In-memory record store using DashMap for concurrent access.
///
/// Each collection keeps its rows in insertion order, which is the natural
/// order of unsorted queries.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    /// Collection name -> rows.
    classes: DashMap<String, Vec<Record>>,
}

impl InMemoryRecordStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record with an explicit creation time.
    ///
    /// Bypasses credentials; used to seed data with historic timestamps.
    pub fn insert_at(&self, class_name: &str, created_at: DateTime<Utc>, fields: Fields) -> Record {
        let record = Record {
            object_id: new_object_id(),
            created_at,
            updated_at: created_at,
            fields,
        };
        self.classes
            .entry(class_name.to_string())
            .or_default()
            .push(record.clone());
        record
    }

    /// Number of rows in a collection.
    pub fn len(&self, class_name: &str) -> usize {
        self.classes.get(class_name).map(|r| r.len()).unwrap_or(0)
    }

    /// Whether a collection exists in the schema.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes.contains_key(class_name)
    }
}

/// Generate a store identifier (a full 128-bit v4 UUID in simple form).
pub(crate) fn new_object_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Evaluate a query over a collection snapshot.
///
/// The store never returns more than `MAX_PAGE_SIZE` rows per call.
pub(crate) fn run_query<'a>(rows: impl Iterator<Item = &'a Record>, query: &RecordQuery) -> Vec<Record> {
    let mut selected: Vec<&Record> = rows
        .filter(|r| query.created_before.map_or(true, |cutoff| r.created_at < cutoff))
        .collect();

    match query.order {
        SortOrder::Natural => {}
        SortOrder::CreatedAtAscending => selected.sort_by_key(|r| r.created_at),
        SortOrder::CreatedAtDescending => selected.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }

    selected
        .into_iter()
        .skip(query.skip)
        .take(query.limit.min(MAX_PAGE_SIZE))
        .cloned()
        .collect()
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find(&self, credential: &Credential, class_name: &str, query: &RecordQuery) -> Result<Vec<Record>> {
        credential.require_authenticated()?;
        Ok(self
            .classes
            .get(class_name)
            .map(|rows| run_query(rows.iter(), query))
            .unwrap_or_default())
    }

    async fn count(&self, credential: &Credential, class_name: &str) -> Result<usize> {
        credential.require_authenticated()?;
        Ok(self.len(class_name))
    }

    async fn create(&self, credential: &Credential, class_name: &str, fields: Fields) -> Result<Record> {
        credential.require_authenticated()?;
        let record = self.insert_at(class_name, Utc::now(), fields);

        tracing::trace!(
            class = class_name,
            object_id = %record.object_id,
            "Stored record in memory"
        );
        Ok(record)
    }

    async fn delete_many(&self, credential: &Credential, class_name: &str, ids: &[String]) -> Result<usize> {
        credential.require_authenticated()?;
        let Some(mut rows) = self.classes.get_mut(class_name) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !ids.contains(&r.object_id));
        Ok(before - rows.len())
    }

    async fn purge_class(&self, credential: &Credential, class_name: &str) -> Result<()> {
        credential.require_elevated()?;
        self.classes.remove(class_name);
        Ok(())
    }
}
