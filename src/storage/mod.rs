//! SQLite storage layer shared by every container.
//!
//! Provides:
//! - Backing-file lifecycle (temporary or durable)
//! - A single lock serializing all access to one container
//! - Commit batching for high write throughput
//! - Table layouts and lazy paged scans

pub mod batch;
pub mod engine;
pub mod scan;
pub mod schema;

pub use engine::{Cursor, StorageEngine};
