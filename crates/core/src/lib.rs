#![deny(unused)]
//! Core types, traits, and error definitions for RecordOps.
//!
//! This crate provides the building blocks shared by the store, governance
//! and admin layers: the record data model, the record store and file sweep
//! capabilities, caller credentials, configuration and the lifecycle state
//! machine.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use lifecycle::*;
pub use traits::*;
pub use types::*;
