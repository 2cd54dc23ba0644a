//! Audit logging for destructive administrative commands.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio::io::AsyncWriteExt;

use recordops_core::{Error, Result};

/// Outcome of an audited action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Denied,
    Error(String),
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID.
    pub id: String,
    /// Timestamp (ISO 8601).
    pub timestamp: String,
    /// User identifier from RBAC.
    pub user_id: String,
    /// Action performed (e.g., "deleteAll", "import").
    pub action: String,
    /// Resource affected (class name or file store path).
    pub resource: String,
    /// Outcome of the action.
    pub outcome: AuditOutcome,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

impl AuditEntry {
    /// New entry stamped with a fresh id and the current time.
    pub fn new(
        user_id: impl Into<String>,
        action: impl Into<String>,
        resource: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            user_id: user_id.into(),
            action: action.into(),
            resource: resource.into(),
            outcome,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Filter for querying audit logs.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    fn matches(&self, e: &AuditEntry) -> bool {
        self.user_id.as_ref().map_or(true, |u| &e.user_id == u)
            && self.action.as_ref().map_or(true, |a| &e.action == a)
            && self.resource.as_ref().map_or(true, |r| &e.resource == r)
    }
}

/// Trait for audit log persistence.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Log an audit entry.
    async fn log(&self, entry: AuditEntry) -> Result<()>;

    /// Query audit logs with optional filters.
    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEntry>>;
}

/// In-memory audit store.
#[derive(Default)]
pub struct InMemoryAuditStore {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEntry>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            result.truncate(limit);
        }

        Ok(result)
    }
}

/// Append-only JSON-lines audit log.
pub struct FileAuditStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileAuditStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }
}

#[async_trait]
impl AuditStore for FileAuditStore {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::storage(format!("Failed to create audit log directory: {}", e))
            })?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| Error::storage(format!("Failed to open audit log: {}", e)))?;
        file.write_all(&line)
            .await
            .map_err(|e| Error::storage(format!("Failed to write audit log: {}", e)))?;
        // tokio completes file writes in the background until flushed.
        file.flush()
            .await
            .map_err(|e| Error::storage(format!("Failed to flush audit log: {}", e)))?;
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::storage(format!("Failed to read audit log: {}", e))),
        };

        let mut result = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let entry: AuditEntry = serde_json::from_str(line)?;
            if filter.matches(&entry) {
                result.push(entry);
            }
        }
        if let Some(limit) = filter.limit {
            result.truncate(limit);
        }
        Ok(result)
    }
}
