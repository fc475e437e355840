//! sqlite-object: persistent containers backed by SQLite tables.
//!
//! Each container owns a single table in an embedded SQLite database and
//! exposes the operations of its in-memory counterpart, so calling code can
//! treat durable storage like a `HashMap`, `VecDeque` or `HashSet`.
//!
//! # Architecture
//!
//! - **One table per container**: a dict, list or set maps its operations
//!   onto point lookups, prefix scans and full-table scans of one table
//! - **Gap-indexed lists**: append and prepend never renumber existing rows
//! - **Commit batching**: durability commits can be deferred across many
//!   mutations to amortize fsync cost
//! - **Pluggable coders**: values are stored as text produced by a
//!   caller-supplied [`Coder`], JSON by default
//!
//! # Modules
//!
//! - [`codec`]: Value encoding strategies
//! - [`config`]: Store configuration and table naming
//! - [`dict`]: Key/value mapping container
//! - [`dump`]: Bulk JSON and line-delimited dumps
//! - [`list`]: Append/prepend sequence container
//! - [`observability`]: Tracing setup
//! - [`set`]: Membership set container
//! - [`storage`]: Storage engine shared by all containers
//! - [`traits`]: Capability interfaces implemented by the containers
//!
//! # Example
//!
//! ```
//! use sqlite_object::{SqliteDict, StoreConfig};
//!
//! # fn main() -> sqlite_object::Result<()> {
//! let dict: SqliteDict<String, i64> = SqliteDict::open(StoreConfig::temporary())?;
//! dict.set(&"answer".to_string(), &42)?;
//! assert_eq!(dict.get(&"answer".to_string())?, 42);
//! # Ok(())
//! # }
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // dict::SqliteDict is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Every container operation can fail
    clippy::needless_raw_string_hashes  // r#""# is fine for SQL
)]

pub mod codec;
pub mod config;
pub mod dict;
pub mod dump;
pub mod error;
pub mod list;
pub mod observability;
pub mod set;
pub mod storage;
pub mod traits;

pub use codec::{Coder, FnCoder, JsonCoder};
pub use config::{ContainerKind, StoreConfig, TableNames};
pub use dict::SqliteDict;
pub use dump::LineFormat;
pub use error::{Error, Result};
pub use list::{SliceSpec, SqliteList};
pub use set::SqliteSet;
pub use storage::StorageEngine;
pub use traits::{Container, Indexable, Mapping, Membership, SetLike};
