//! Store configuration and table naming.
//!
//! Supports:
//! - Temporary or caller-supplied backing files
//! - Commit batching threshold
//! - Named containers sharing one file, or legacy unnamed tables

use std::path::PathBuf;
use std::time::Duration;

/// Default number of rows fetched per page by lazy scans.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 256;

/// Default time SQLite waits on a locked database file.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for opening a container.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backing file. `None` allocates a fresh temporary file.
    pub path: Option<PathBuf>,
    /// Keep the backing file after the container is closed or dropped.
    ///
    /// Applies to caller-supplied paths too: a non-persistent container
    /// removes whatever file it was opened on.
    pub persist: bool,
    /// Number of mutations per durability commit; 0 commits every mutation.
    ///
    /// A crash loses at most `commit_every - 1` mutations that the open
    /// container already reflects.
    pub commit_every: usize,
    /// Logical container name used to derive table and index names.
    pub name: Option<String>,
    /// Create a secondary index on the value column.
    ///
    /// `None` uses the container's default: off for dicts, on for lists.
    pub index_values: Option<bool>,
    /// How long SQLite waits on a file locked by another connection.
    pub busy_timeout: Duration,
    /// Rows fetched per round trip by lazy iteration.
    pub scan_page_size: usize,
    /// Table name template; `{name}` is replaced with the container name.
    pub table_name_fmt: Option<String>,
    /// Index name template; `{name}` is replaced with the container name.
    pub index_name_fmt: Option<String>,
}

impl StoreConfig {
    /// Configuration for a throwaway container in a temporary file.
    pub fn temporary() -> Self {
        Self::default()
    }

    /// Configuration for a container stored at `path`.
    ///
    /// The file is kept after close only if [`StoreConfig::persist`] is set.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_commit_every(mut self, commit_every: usize) -> Self {
        self.commit_every = commit_every;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_index_values(mut self, index_values: bool) -> Self {
        self.index_values = Some(index_values);
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_scan_page_size(mut self, scan_page_size: usize) -> Self {
        self.scan_page_size = scan_page_size.max(1);
        self
    }

    pub fn with_table_name_fmt(mut self, fmt: impl Into<String>) -> Self {
        self.table_name_fmt = Some(fmt.into());
        self
    }

    pub fn with_index_name_fmt(mut self, fmt: impl Into<String>) -> Self {
        self.index_name_fmt = Some(fmt.into());
        self
    }

    /// Resolve table and index names for a container of the given kind.
    pub fn table_names(&self, kind: ContainerKind) -> TableNames {
        match &self.name {
            None => kind.legacy_names(),
            Some(name) => {
                let table_fmt = self
                    .table_name_fmt
                    .as_deref()
                    .unwrap_or(kind.table_name_fmt());
                let index_fmt = self
                    .index_name_fmt
                    .as_deref()
                    .unwrap_or(kind.index_name_fmt());
                TableNames {
                    table: table_fmt.replace("{name}", name),
                    index: index_fmt.replace("{name}", name),
                }
            }
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            persist: false,
            commit_every: 0,
            name: None,
            index_values: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            table_name_fmt: None,
            index_name_fmt: None,
        }
    }
}

/// The three container shapes, each with its own naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Dict,
    List,
    Set,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Dict => "dict",
            ContainerKind::List => "list",
            ContainerKind::Set => "set",
        }
    }

    fn table_name_fmt(&self) -> &'static str {
        match self {
            ContainerKind::Dict => "{name}_dict_table",
            ContainerKind::List => "{name}_list_table",
            ContainerKind::Set => "{name}_set_table",
        }
    }

    fn index_name_fmt(&self) -> &'static str {
        match self {
            ContainerKind::Dict => "{name}_dict_index",
            ContainerKind::List => "{name}_list_index",
            // Sets have no secondary index; the name is never used.
            ContainerKind::Set => "{name}_set_index",
        }
    }

    /// Names used by stores created without a container name.
    fn legacy_names(&self) -> TableNames {
        let (table, index) = match self {
            ContainerKind::Dict => ("dict", "dict_index"),
            ContainerKind::List => ("list", "list_value"),
            ContainerKind::Set => ("set_table", "set_index"),
        };
        TableNames {
            table: table.to_string(),
            index: index.to_string(),
        }
    }
}

/// Resolved table and secondary-index names for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub table: String,
    pub index: String,
}
