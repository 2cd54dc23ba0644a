//! File sweep strategies for retention purges.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::{Credential, CutoffDate};

/// Removes stored files older than a cutoff.
///
/// Exactly one strategy is configured per deployment. Re-running a sweep
/// after it succeeded must report zero deletions.
#[async_trait]
pub trait FileSweepStrategy: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Root directory the sweep works on, if it touches the filesystem.
    fn file_store_path(&self) -> Option<&Path> {
        None
    }

    /// Delete everything strictly older than the cutoff; returns the count.
    async fn sweep_before(&self, credential: &Credential, cutoff: &CutoffDate) -> Result<usize>;
}
