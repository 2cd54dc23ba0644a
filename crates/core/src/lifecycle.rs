//! Caller-visible status of a fetch / import cycle.
//!
//! ```text
//! idle ──FetchStart──▶ loading ──FetchSuccess──▶ idle
//! idle ──DeleteStart─▶ deleting ─DeleteSuccess─▶ updating ──UploadSuccess──▶ success
//! loading | deleting | updating ──Failed──▶ error
//! ```
//!
//! `success` and `error` behave like `idle` for the purpose of starting the
//! next operation. There is no cancel transition.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Idle,
    Loading,
    Updating,
    Deleting,
    Success,
    Error,
}

impl LifecycleStatus {
    /// Whether an operation is currently running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Loading | Self::Updating | Self::Deleting)
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Events driving the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A count/fetch begins.
    FetchStart,
    /// The fetch returned a count.
    FetchSuccess { count: usize },
    /// The purge preceding a re-import begins.
    DeleteStart,
    /// The purge finished and the upload of `upload_total` rows begins.
    DeleteSuccess { deleted: usize, upload_total: usize },
    /// `completed` rows have been saved.
    UploadProgress { completed: usize },
    /// Every row was saved; the collection now holds `count` rows.
    UploadSuccess { count: usize },
    /// The running operation failed.
    Failed(String),
}

/// Snapshot of the lifecycle for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleState {
    pub class_name: String,
    pub count: Option<usize>,
    pub status: LifecycleStatus,
    pub error: Option<String>,
    pub previous_count: Option<usize>,
    pub upload_progress: usize,
    pub upload_total: usize,
}

impl LifecycleState {
    /// Fresh idle state for a collection.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            count: None,
            status: LifecycleStatus::Idle,
            error: None,
            previous_count: None,
            upload_progress: 0,
            upload_total: 0,
        }
    }

    /// Upload progress as a whole percentage.
    pub fn progress_percentage(&self) -> u8 {
        if self.upload_total == 0 {
            return 0;
        }
        ((self.upload_progress * 100 + self.upload_total / 2) / self.upload_total).min(100) as u8
    }

    /// Apply an event. On error the state is left untouched.
    pub fn apply(&mut self, event: LifecycleEvent) -> Result<()> {
        match (self.status, event) {
            (status, LifecycleEvent::FetchStart) => {
                self.ensure_not_in_flight(status, "fetch")?;
                self.status = LifecycleStatus::Loading;
                self.error = None;
            }
            (LifecycleStatus::Loading, LifecycleEvent::FetchSuccess { count }) => {
                self.status = LifecycleStatus::Idle;
                self.count = Some(count);
            }
            (status, LifecycleEvent::DeleteStart) => {
                self.ensure_not_in_flight(status, "import")?;
                self.status = LifecycleStatus::Deleting;
                self.error = None;
            }
            (LifecycleStatus::Deleting, LifecycleEvent::DeleteSuccess { deleted, upload_total }) => {
                self.status = LifecycleStatus::Updating;
                self.previous_count = Some(deleted);
                self.upload_total = upload_total;
                self.upload_progress = 0;
            }
            (LifecycleStatus::Updating, LifecycleEvent::UploadProgress { completed }) => {
                if completed <= self.upload_progress || completed > self.upload_total {
                    return Err(Error::invalid_transition(format!(
                        "progress {} after {} of {}",
                        completed, self.upload_progress, self.upload_total
                    )));
                }
                self.upload_progress = completed;
            }
            (LifecycleStatus::Updating, LifecycleEvent::UploadSuccess { count }) => {
                self.status = LifecycleStatus::Success;
                self.count = Some(count);
                self.upload_progress = self.upload_total;
            }
            (status, LifecycleEvent::Failed(message)) if status.is_in_flight() => {
                self.status = LifecycleStatus::Error;
                self.error = Some(message);
            }
            (status, event) => {
                return Err(Error::invalid_transition(format!(
                    "{:?} is not allowed while {}",
                    event, status
                )));
            }
        }
        Ok(())
    }

    fn ensure_not_in_flight(&self, status: LifecycleStatus, operation: &str) -> Result<()> {
        if status.is_in_flight() {
            return Err(Error::busy(format!(
                "cannot start {} on {}: status is {}",
                operation, self.class_name, status
            )));
        }
        Ok(())
    }
}
