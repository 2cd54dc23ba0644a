//! Core traits for RecordOps.
//!
//! - `record_store`: the record store capability consumed by every operation
//! - `file_sweep`: interchangeable file deletion strategies

pub mod file_sweep;
pub mod record_store;

pub use file_sweep::*;
pub use record_store::*;
