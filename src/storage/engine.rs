//! Storage engine shared by every container.
//!
//! Owns the SQLite connection, the backing file, the commit batch and the
//! lock that serializes all access to one container. Containers reach the
//! connection only through [`StorageEngine::acquire_cursor`].

use rusqlite::{Connection, Params};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::batch::{BatchConfig, BatchCounter};
use super::schema;
use crate::config::{ContainerKind, StoreConfig, TableNames};
use crate::error::{Error, Result};

/// Storage engine for one container.
///
/// Field order matters: the connection is dropped before the backing file
/// is removed.
pub struct StorageEngine {
    state: Mutex<EngineState>,
    file: BackingFile,
    scan_page_size: usize,
}

struct EngineState {
    conn: Connection,
    batch: BatchCounter,
}

impl EngineState {
    /// Commit the open batch, if any.
    fn commit(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        if self.batch.pending() > 0 {
            tracing::trace!(
                writes = self.batch.pending(),
                commits = self.batch.commits() + 1,
                "Committed write batch"
            );
        }
        self.batch.committed();
        Ok(())
    }
}

impl StorageEngine {
    /// Open the backing file described by `config`.
    ///
    /// Allocates a temporary file when no path is configured. Failure to
    /// create or open the file is returned immediately.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let file = match &config.path {
            Some(path) => BackingFile::new(path.clone(), config.persist),
            None => BackingFile::temporary(config.persist)?,
        };

        let conn = Connection::open(file.path())?;
        schema::apply_pragmas(&conn, config.busy_timeout)?;

        tracing::debug!(
            path = %file.path().display(),
            persist = config.persist,
            commit_every = config.commit_every,
            "Opened storage engine"
        );

        Ok(Self {
            state: Mutex::new(EngineState {
                conn,
                batch: BatchCounter::new(BatchConfig::new(config.commit_every)),
            }),
            file,
            scan_page_size: config.scan_page_size.max(1),
        })
    }

    /// Create the table for a container if it does not exist yet.
    pub fn initialize_table(
        &self,
        kind: ContainerKind,
        names: &TableNames,
        index_values: bool,
    ) -> Result<()> {
        let cursor = self.acquire_cursor()?;
        schema::initialize_table(&cursor, kind, names, index_values)?;
        Ok(())
    }

    /// Acquire the engine lock and a cursor onto the connection.
    ///
    /// The lock is held until the returned [`Cursor`] is dropped, on every
    /// exit path. Hold one cursor across any sequence of statements that
    /// must not interleave with other callers.
    pub fn acquire_cursor(&self) -> Result<Cursor<'_>> {
        let guard = self.state.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(Cursor { guard })
    }

    /// Commit any batched mutations now.
    pub fn flush(&self) -> Result<()> {
        let mut cursor = self.acquire_cursor()?;
        cursor.guard.commit()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Whether the backing file survives teardown.
    pub fn persist(&self) -> bool {
        self.file.persist
    }

    /// Rows fetched per page by lazy scans.
    pub fn scan_page_size(&self) -> usize {
        self.scan_page_size
    }

    /// Number of durability commits issued so far.
    pub fn commit_count(&self) -> Result<u64> {
        Ok(self.acquire_cursor()?.guard.batch.commits())
    }

    /// Mutations made since the last durability commit.
    pub fn pending_writes(&self) -> Result<usize> {
        Ok(self.acquire_cursor()?.guard.batch.pending())
    }

    /// Commit pending writes, close the connection and apply the persist
    /// policy, reporting any failure.
    pub fn close(mut self) -> Result<()> {
        {
            let state = self.state.get_mut().map_err(|_| Error::LockPoisoned)?;
            state.commit()?;
            let conn = std::mem::replace(&mut state.conn, Connection::open_in_memory()?);
            conn.close().map_err(|(_, e)| e)?;
            tracing::debug!(
                path = %self.file.path().display(),
                commits = state.batch.commits(),
                "Closed storage engine"
            );
        }
        self.file.remove()?;
        Ok(())
    }
}

impl Drop for StorageEngine {
    fn drop(&mut self) {
        match self.state.get_mut() {
            Ok(state) => {
                if let Err(e) = state.commit() {
                    tracing::warn!(error = %e, "Failed to commit pending writes on drop");
                }
            }
            Err(_) => tracing::warn!("Storage lock poisoned; pending writes not committed"),
        }
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("path", &self.file.path)
            .field("persist", &self.file.persist)
            .finish_non_exhaustive()
    }
}

/// Scoped access to the connection while holding the engine lock.
pub struct Cursor<'a> {
    guard: MutexGuard<'a, EngineState>,
}

impl Cursor<'_> {
    /// Open the batch transaction when batching is enabled.
    fn begin_batch(&mut self) -> Result<()> {
        if self.guard.batch.is_batching() && self.guard.conn.is_autocommit() {
            self.guard.conn.execute_batch("BEGIN")?;
            tracing::trace!("Opened batch transaction");
        }
        Ok(())
    }

    /// Execute a mutating statement inside the current batch.
    pub fn execute_write<P: Params>(&mut self, sql: &str, params: P) -> Result<usize> {
        self.begin_batch()?;
        let changed = self.guard.conn.execute(sql, params)?;
        tracing::trace!(sql, changed, "Executed write");
        Ok(changed)
    }

    /// Run several statements atomically.
    ///
    /// Everything `op` does is rolled back if it returns an error.
    pub fn atomic<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        self.begin_batch()?;
        let savepoint = self.guard.conn.savepoint()?;
        let out = op(&savepoint)?;
        savepoint.commit()?;
        tracing::trace!("Released savepoint");
        Ok(out)
    }

    /// Count one mutation and commit if the batch is full.
    ///
    /// Returns true if a durability commit was issued.
    pub fn record_write(&mut self) -> Result<bool> {
        if self.guard.batch.record() {
            self.guard.commit()?;
            return Ok(true);
        }
        Ok(false)
    }
}

impl Deref for Cursor<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.guard.conn
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        // A failed operation can leave a batch transaction open with no
        // recorded writes; end it so other connections are not blocked.
        let state = &mut *self.guard;
        if state.batch.pending() == 0 && !state.conn.is_autocommit() {
            if let Err(e) = state.conn.execute_batch("COMMIT") {
                tracing::warn!(error = %e, "Failed to close idle transaction");
            }
        }
    }
}

/// Backing file and its retention policy.
struct BackingFile {
    path: PathBuf,
    persist: bool,
    removed: bool,
}

impl BackingFile {
    fn new(path: PathBuf, persist: bool) -> Self {
        Self {
            path,
            persist,
            removed: false,
        }
    }

    fn temporary(persist: bool) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("sqlite-object-")
            .suffix(".sqlite3")
            .tempfile()?
            .into_temp_path()
            .keep()
            .map_err(|e| e.error)?;
        Ok(Self::new(path, persist))
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file (and its rollback journal) unless it should persist.
    fn remove(&mut self) -> std::io::Result<()> {
        if self.persist || self.removed {
            return Ok(());
        }
        self.removed = true;

        let mut journal = self.path.clone().into_os_string();
        journal.push("-journal");
        for path in [self.path.clone(), PathBuf::from(journal)] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(path = %self.path.display(), "Removed backing file");
        Ok(())
    }
}

impl Drop for BackingFile {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove backing file");
        }
    }
}
