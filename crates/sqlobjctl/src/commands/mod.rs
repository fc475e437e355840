//! Subcommand implementations.

pub mod dump;
pub mod get;
pub mod len;
pub mod tables;

use anyhow::{bail, Context, Result};
use sqlite_object::storage::schema::list_tables;
use sqlite_object::{ContainerKind, StorageEngine, StoreConfig};
use std::path::{Path, PathBuf};

use crate::Kind;

/// The store file a command operates on.
pub struct Target {
    path: PathBuf,
}

impl Target {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Config for opening the store without ever deleting it or adding
    /// indexes to it.
    pub fn config(&self, name: Option<String>) -> StoreConfig {
        let config = StoreConfig::at(&self.path)
            .with_persist(true)
            .with_index_values(false);
        match name {
            Some(name) => config.with_name(name),
            None => config,
        }
    }

    fn ensure_exists(&self) -> Result<()> {
        if !self.path.is_file() {
            bail!("store not found: {}", self.path.display());
        }
        Ok(())
    }

    /// Names of the tables in the store.
    pub fn tables(&self) -> Result<Vec<String>> {
        self.ensure_exists()?;
        let engine = StorageEngine::open(&self.config(None))
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let tables = {
            let cursor = engine.acquire_cursor()?;
            list_tables(&cursor)?
        };
        engine.close()?;
        Ok(tables)
    }

    /// Config for an existing container. Fails instead of creating a new
    /// table when the container is missing.
    pub fn existing(&self, kind: Kind, name: Option<String>) -> Result<StoreConfig> {
        let config = self.config(name);
        let table = config.table_names(ContainerKind::from(kind)).table;
        if !self.tables()?.contains(&table) {
            bail!(
                "no {} container in {} (expected table '{}')",
                ContainerKind::from(kind).as_str(),
                self.path.display(),
                table
            );
        }
        Ok(config)
    }
}
