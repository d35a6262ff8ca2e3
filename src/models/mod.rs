//! # Models
//!
//! Persistent records the dataflow core reads and writes. Each model carries
//! its own SQLx queries; the storage ports in [`crate::database`] delegate to
//! them for PostgreSQL.

pub mod dataflow;
pub mod run_record;

// Re-export core models for easy access
pub use dataflow::{Dataflow, NewDataflow};
pub use run_record::RunRecord;
