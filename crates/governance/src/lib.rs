#![deny(unused)]
//! Governance for RecordOps.
//!
//! This crate provides:
//! - Log subscriber setup
//! - Prometheus counters for destructive operations
//! - RBAC connector resolving bearer tokens into credentials
//! - Audit logging

pub mod audit;
pub mod metrics;
pub mod rbac;
pub mod tracing_layer;

pub use audit::{AuditEntry, AuditFilter, AuditOutcome, AuditStore, FileAuditStore, InMemoryAuditStore};
pub use metrics::{setup_metrics_recorder, track_files_deleted, track_records_deleted, track_records_imported};
pub use rbac::{NoOpRbacConnector, RbacConnector, StaticTokenRbacConnector, UserRoles};
pub use tracing_layer::configure_tracing;
