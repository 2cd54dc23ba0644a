//! Core type definitions for RecordOps.
//!
//! Records, cutoff dates, paging and caller credentials shared by every
//! layer of the service.

pub mod credential;
pub mod cutoff;
pub mod query;
pub mod record;

pub use credential::*;
pub use cutoff::*;
pub use query::*;
pub use record::*;
