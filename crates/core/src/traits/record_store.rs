//! Record store capability surface.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Credential, Fields, Record, RecordQuery};

/// Remote structured-data backend.
///
/// Every call carries the caller's credential. Implementations decide which
/// operations need `Credential::elevated`; `purge_class` always does.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run one paged query against a collection.
    async fn find(&self, credential: &Credential, class_name: &str, query: &RecordQuery) -> Result<Vec<Record>>;

    /// Count the rows of a collection. May lag behind concurrent writes.
    async fn count(&self, credential: &Credential, class_name: &str) -> Result<usize>;

    /// Create a record and return it with store-assigned system fields.
    async fn create(&self, credential: &Credential, class_name: &str, fields: Fields) -> Result<Record>;

    /// Delete the given ids, returning how many existed.
    async fn delete_many(&self, credential: &Credential, class_name: &str, ids: &[String]) -> Result<usize>;

    /// Drop every object in the collection along with its indexes.
    async fn purge_class(&self, credential: &Credential, class_name: &str) -> Result<()>;
}
