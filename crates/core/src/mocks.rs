//! Test doubles for the record store.
//!
//! `FlakyRecordStore` wraps a real store, records every call and can be told
//! to fail a specific call.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{
    traits::RecordStore,
    types::{Credential, Fields, Record, RecordQuery},
    Error, Result,
};

/// A recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Find { class_name: String, query: RecordQuery },
    Count { class_name: String },
    Create { class_name: String },
    DeleteMany { class_name: String, ids: usize },
    PurgeClass { class_name: String },
}

#[derive(Debug, Default)]
struct Faults {
    fail_find_at: Option<usize>,
    fail_create_at: Option<usize>,
    fail_delete_at: Option<usize>,
    fail_purge: bool,
    fail_count: bool,
    blank_ids: bool,
    ignore_deletes: bool,
}

/// Store decorator with call recording and failure injection.
///
/// Call numbers are 1-based and counted per operation kind.
pub struct FlakyRecordStore {
    inner: Arc<dyn RecordStore>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<StoreCall>>,
}

impl FlakyRecordStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the n-th `find`.
    pub fn fail_find_at(self, n: usize) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_find_at = Some(n);
        self
    }

    /// Fail the n-th `create`.
    pub fn fail_create_at(self, n: usize) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_create_at = Some(n);
        self
    }

    /// Fail the n-th `delete_many`.
    pub fn fail_delete_at(self, n: usize) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_delete_at = Some(n);
        self
    }

    /// Fail every `purge_class`.
    pub fn fail_purge(self) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_purge = true;
        self
    }

    /// Fail every `count`.
    pub fn fail_count(self) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_count = true;
        self
    }

    /// Return found records with an empty `objectId`.
    pub fn blank_ids(self) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).blank_ids = true;
        self
    }

    /// Accept every `delete_many` but remove nothing.
    pub fn ignore_deletes(self) -> Self {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner).ignore_deletes = true;
        self
    }

    /// All calls made so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of `find` calls made so far.
    pub fn find_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, StoreCall::Find { .. }))
    }

    /// Number of `create` calls made so far.
    pub fn create_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, StoreCall::Create { .. }))
    }

    /// Number of `delete_many` calls made so far.
    pub fn delete_calls(&self) -> usize {
        self.count_calls(|c| matches!(c, StoreCall::DeleteMany { .. }))
    }

    fn count_calls(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

fn injected(what: &str, n: usize) -> Error {
    Error::storage(format!("injected failure on {} #{}", what, n))
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn find(&self, credential: &Credential, class_name: &str, query: &RecordQuery) -> Result<Vec<Record>> {
        self.record(StoreCall::Find {
            class_name: class_name.to_string(),
            query: query.clone(),
        });
        let n = self.find_calls();
        if self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_find_at == Some(n) {
            return Err(injected("find", n));
        }
        let blank_ids = self.faults.lock().unwrap_or_else(PoisonError::into_inner).blank_ids;
        let mut records = self.inner.find(credential, class_name, query).await?;
        if blank_ids {
            records.iter_mut().for_each(|r| r.object_id.clear());
        }
        Ok(records)
    }

    async fn count(&self, credential: &Credential, class_name: &str) -> Result<usize> {
        self.record(StoreCall::Count {
            class_name: class_name.to_string(),
        });
        if self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_count {
            return Err(Error::storage("injected failure on count"));
        }
        self.inner.count(credential, class_name).await
    }

    async fn create(&self, credential: &Credential, class_name: &str, fields: Fields) -> Result<Record> {
        self.record(StoreCall::Create {
            class_name: class_name.to_string(),
        });
        let n = self.create_calls();
        if self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_create_at == Some(n) {
            return Err(injected("create", n));
        }
        self.inner.create(credential, class_name, fields).await
    }

    async fn delete_many(&self, credential: &Credential, class_name: &str, ids: &[String]) -> Result<usize> {
        self.record(StoreCall::DeleteMany {
            class_name: class_name.to_string(),
            ids: ids.len(),
        });
        let n = self.delete_calls();
        if self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_delete_at == Some(n) {
            return Err(injected("delete", n));
        }
        if self.faults.lock().unwrap_or_else(PoisonError::into_inner).ignore_deletes {
            return Ok(0);
        }
        self.inner.delete_many(credential, class_name, ids).await
    }

    async fn purge_class(&self, credential: &Credential, class_name: &str) -> Result<()> {
        self.record(StoreCall::PurgeClass {
            class_name: class_name.to_string(),
        });
        if self.faults.lock().unwrap_or_else(PoisonError::into_inner).fail_purge {
            return Err(Error::storage("injected failure on purge"));
        }
        self.inner.purge_class(credential, class_name).await
    }
}
