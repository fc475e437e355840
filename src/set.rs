//! Membership set backed by one table.
//!
//! One row per member: `(key TEXT PRIMARY KEY)`. Members are stored as coder
//! output, so two values are the same member exactly when they encode to the
//! same text.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;

use crate::codec::{Coder, JsonCoder};
use crate::config::{ContainerKind, StoreConfig, TableNames};
use crate::dump::{self, LineFormat};
use crate::error::{Error, Result};
use crate::storage::scan::{Direction, PagedScan, ScanQuery};
use crate::storage::schema::quote_ident;
use crate::storage::StorageEngine;
use crate::traits::{Container, Membership, SetLike};

#[derive(Debug)]
struct SetSql {
    count: String,
    insert: String,
    delete: String,
    has_member: String,
    first_member: String,
    clear: String,
    all_members: String,
}

impl SetSql {
    fn new(table: &str) -> Self {
        let t = quote_ident(table);
        Self {
            count: format!("SELECT COUNT(*) FROM {t}"),
            insert: format!("INSERT OR IGNORE INTO {t} (key) VALUES (?1)"),
            delete: format!("DELETE FROM {t} WHERE key = ?1"),
            has_member: format!("SELECT 1 FROM {t} WHERE key = ?1"),
            first_member: format!("SELECT key FROM {t} LIMIT 1"),
            clear: format!("DELETE FROM {t}"),
            all_members: format!("SELECT key FROM {t}"),
        }
    }
}

/// Persistent set.
///
/// Comparisons accept any [`SetLike`] operand, including std sets and other
/// persistent sets.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use sqlite_object::{SqliteSet, StoreConfig};
///
/// # fn main() -> sqlite_object::Result<()> {
/// let set: SqliteSet<String> = SqliteSet::open(StoreConfig::temporary())?;
/// set.add(&"a".to_string())?;
/// set.add(&"a".to_string())?;
/// assert_eq!(set.len()?, 1);
///
/// let wider: HashSet<String> = ["a".to_string(), "b".to_string()].into();
/// assert!(set.is_strict_subset_of(&wider)?);
/// # Ok(())
/// # }
/// ```
pub struct SqliteSet<T, C = JsonCoder> {
    engine: StorageEngine,
    coder: C,
    names: TableNames,
    sql: SetSql,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SqliteSet<T, JsonCoder> {
    /// Open a set using the JSON coder.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::with_coder(config, JsonCoder)
    }
}

impl<T, C> SqliteSet<T, C> {
    /// Open a set with a caller-supplied coder.
    pub fn with_coder(config: StoreConfig, coder: C) -> Result<Self> {
        let names = config.table_names(ContainerKind::Set);
        let engine = StorageEngine::open(&config)?;
        // The primary key already indexes members.
        engine.initialize_table(ContainerKind::Set, &names, false)?;
        let sql = SetSql::new(&names.table);
        Ok(Self {
            engine,
            coder,
            names,
            sql,
            _marker: PhantomData,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.names.table
    }

    pub fn path(&self) -> &Path {
        self.engine.path()
    }

    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Commit pending writes, then release the backing file.
    pub fn close(self) -> Result<()> {
        self.engine.close()
    }

    /// Number of members.
    pub fn len(&self) -> Result<usize> {
        let cursor = self.engine.acquire_cursor()?;
        let count: i64 = cursor.query_row(&self.sql.count, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<()> {
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.clear, [])?;
        cursor.record_write()?;
        Ok(())
    }
}

impl<T, C: Coder<T>> SqliteSet<T, C> {
    /// Add `value`. Adding an existing member is a no-op.
    pub fn add(&self, value: &T) -> Result<()> {
        let encoded = self.coder.encode(value)?;
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.insert, params![encoded])?;
        cursor.record_write()?;
        Ok(())
    }

    /// Add every value in `values`, holding the lock throughout.
    pub fn update<'v, I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'v T>,
        T: 'v,
    {
        let mut cursor = self.engine.acquire_cursor()?;
        for value in values {
            let encoded = self.coder.encode(value)?;
            cursor.execute_write(&self.sql.insert, params![encoded])?;
            cursor.record_write()?;
        }
        Ok(())
    }

    /// Remove `value`, failing with [`Error::KeyNotFound`] if it is absent.
    pub fn remove(&self, value: &T) -> Result<()> {
        if self.remove_encoded(value)? {
            Ok(())
        } else {
            Err(Error::KeyNotFound)
        }
    }

    /// Remove `value` if present. Never fails on a missing member.
    pub fn discard(&self, value: &T) -> Result<()> {
        self.remove_encoded(value)?;
        Ok(())
    }

    fn remove_encoded(&self, value: &T) -> Result<bool> {
        let encoded = self.coder.encode(value)?;
        let mut cursor = self.engine.acquire_cursor()?;
        let removed = cursor.execute_write(&self.sql.delete, params![encoded])?;
        cursor.record_write()?;
        Ok(removed > 0)
    }

    pub fn contains(&self, value: &T) -> Result<bool> {
        let encoded = self.coder.encode(value)?;
        let cursor = self.engine.acquire_cursor()?;
        let found = cursor
            .query_row(&self.sql.has_member, params![encoded], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Remove and return some member. Which one is unspecified.
    pub fn pop_arbitrary(&self) -> Result<T> {
        let mut cursor = self.engine.acquire_cursor()?;
        let key = cursor.atomic(|conn| {
            let key: String = conn
                .query_row(&self.sql.first_member, [], |row| row.get(0))
                .optional()?
                .ok_or(Error::EmptyContainer)?;
            conn.execute(&self.sql.delete, params![key])?;
            Ok(key)
        })?;
        cursor.record_write()?;
        drop(cursor);
        self.coder.decode(&key)
    }

    /// Iterate over members. Order is unspecified.
    pub fn iter(&self) -> SetIter<'_, T, C> {
        SetIter {
            set: self,
            scan: PagedScan::new(
                &self.engine,
                ScanQuery::new(&self.names.table, "key", None, Direction::Ascending),
            ),
        }
    }

    /// True if no member of `self` is in `other`.
    ///
    /// Iterates whichever operand is smaller.
    pub fn is_disjoint_from<O>(&self, other: &O) -> Result<bool>
    where
        O: SetLike<T> + ?Sized,
    {
        if other.cardinality()? < self.len()? {
            for member in other.members() {
                if self.contains(&member?)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        for member in self.iter() {
            if other.contains(&member?)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True if every member of `self` is in `other`.
    pub fn is_subset_of<O>(&self, other: &O) -> Result<bool>
    where
        O: SetLike<T> + ?Sized,
    {
        if self.len()? > other.cardinality()? {
            return Ok(false);
        }
        for member in self.iter() {
            if !other.contains(&member?)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// True if every member of `other` is in `self`.
    pub fn is_superset_of<O>(&self, other: &O) -> Result<bool>
    where
        O: SetLike<T> + ?Sized,
    {
        if other.cardinality()? > self.len()? {
            return Ok(false);
        }
        for member in other.members() {
            if !self.contains(&member?)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn is_strict_subset_of<O>(&self, other: &O) -> Result<bool>
    where
        O: SetLike<T> + ?Sized,
    {
        Ok(self.len()? < other.cardinality()? && self.is_subset_of(other)?)
    }

    pub fn is_strict_superset_of<O>(&self, other: &O) -> Result<bool>
    where
        O: SetLike<T> + ?Sized,
    {
        Ok(self.len()? > other.cardinality()? && self.is_superset_of(other)?)
    }

    /// Same members as `other`.
    pub fn set_eq<O>(&self, other: &O) -> Result<bool>
    where
        O: SetLike<T> + ?Sized,
    {
        Ok(self.len()? == other.cardinality()? && self.is_subset_of(other)?)
    }

    fn for_each_member<F>(&self, mut sink: F) -> Result<()>
    where
        F: FnMut(T) -> Result<()>,
    {
        let cursor = self.engine.acquire_cursor()?;
        let mut stmt = cursor.prepare(&self.sql.all_members)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            sink(self.coder.decode(&key)?)?;
        }
        Ok(())
    }

    /// Write the whole set as one JSON array.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()>
    where
        T: Serialize,
    {
        let mut writer = dump::JsonArrayWriter::begin(out)?;
        self.for_each_member(|member| writer.element(&member))?;
        writer.finish()
    }

    /// Write one JSON-encoded member per line.
    pub fn write_lines<W: Write>(&self, out: &mut W, format: &LineFormat) -> Result<()>
    where
        T: Serialize + serde::de::DeserializeOwned,
    {
        self.write_lines_with(out, format, &JsonCoder)
    }

    pub fn write_lines_with<W, EC>(&self, out: &mut W, format: &LineFormat, coder: &EC) -> Result<()>
    where
        W: Write,
        EC: Coder<T>,
    {
        self.for_each_member(|member| dump::write_line(out, format, &coder.encode(&member)?))
    }
}

impl<T, C> std::fmt::Debug for SqliteSet<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSet")
            .field("table", &self.names.table)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Lazy iterator over set members.
pub struct SetIter<'a, T, C> {
    set: &'a SqliteSet<T, C>,
    scan: PagedScan<'a, String>,
}

impl<T, C: Coder<T>> Iterator for SetIter<'_, T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.scan.next()?;
        Some(row.and_then(|row| self.set.coder.decode(&row.key)))
    }
}

impl<'a, T, C: Coder<T>> IntoIterator for &'a SqliteSet<T, C> {
    type Item = Result<T>;
    type IntoIter = SetIter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C> Container for SqliteSet<T, C> {
    fn len(&self) -> Result<usize> {
        SqliteSet::len(self)
    }

    fn clear(&self) -> Result<()> {
        SqliteSet::clear(self)
    }
}

impl<T, C: Coder<T>> Membership<T> for SqliteSet<T, C> {
    fn contains(&self, item: &T) -> Result<bool> {
        SqliteSet::contains(self, item)
    }
}

impl<T, C: Coder<T>> SetLike<T> for SqliteSet<T, C> {
    fn cardinality(&self) -> Result<usize> {
        SqliteSet::len(self)
    }

    fn members(&self) -> Box<dyn Iterator<Item = Result<T>> + '_> {
        Box::new(self.iter())
    }
}
