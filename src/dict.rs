//! Key/value mapping backed by one table.
//!
//! One row per key: `(key TEXT PRIMARY KEY, value TEXT)`. Both columns hold
//! coder output, so keys must encode repeatably.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use std::borrow::Borrow;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;

use crate::codec::{Coder, JsonCoder};
use crate::config::{ContainerKind, StoreConfig, TableNames};
use crate::dump::{self, LineFormat};
use crate::error::{Error, Result};
use crate::storage::scan::{Direction, PagedScan, ScanQuery, ScanRow};
use crate::storage::schema::quote_ident;
use crate::storage::StorageEngine;
use crate::traits::{Container, Mapping, Membership};

/// Precomputed statements for one dict table.
#[derive(Debug)]
struct DictSql {
    count: String,
    get: String,
    upsert: String,
    delete: String,
    clear: String,
    first_item: String,
    has_item: String,
    has_value: String,
    all_items: String,
}

impl DictSql {
    fn new(table: &str) -> Self {
        let t = quote_ident(table);
        Self {
            count: format!("SELECT COUNT(*) FROM {t}"),
            get: format!("SELECT value FROM {t} WHERE key = ?1"),
            upsert: format!("REPLACE INTO {t} (key, value) VALUES (?1, ?2)"),
            delete: format!("DELETE FROM {t} WHERE key = ?1"),
            clear: format!("DELETE FROM {t}"),
            first_item: format!("SELECT key, value FROM {t} LIMIT 1"),
            has_item: format!("SELECT 1 FROM {t} WHERE key = ?1 AND value = ?2 LIMIT 1"),
            has_value: format!("SELECT 1 FROM {t} WHERE value = ?1 LIMIT 1"),
            all_items: format!("SELECT key, value FROM {t}"),
        }
    }
}

/// Persistent dict.
///
/// # Example
///
/// ```
/// use sqlite_object::{SqliteDict, StoreConfig};
///
/// # fn main() -> sqlite_object::Result<()> {
/// let dict: SqliteDict<String, Vec<u32>> = SqliteDict::open(StoreConfig::temporary())?;
/// dict.set(&"primes".into(), &vec![2, 3, 5])?;
/// assert_eq!(dict.get(&"primes".into())?, vec![2, 3, 5]);
/// assert_eq!(dict.len()?, 1);
/// # Ok(())
/// # }
/// ```
pub struct SqliteDict<K, V, C = JsonCoder> {
    engine: StorageEngine,
    coder: C,
    names: TableNames,
    sql: DictSql,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> SqliteDict<K, V, JsonCoder> {
    /// Open a dict using the JSON coder.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::with_coder(config, JsonCoder)
    }
}

impl<K, V, C> SqliteDict<K, V, C> {
    /// Open a dict with a caller-supplied coder.
    pub fn with_coder(config: StoreConfig, coder: C) -> Result<Self> {
        let names = config.table_names(ContainerKind::Dict);
        let engine = StorageEngine::open(&config)?;
        engine.initialize_table(
            ContainerKind::Dict,
            &names,
            config.index_values.unwrap_or(false),
        )?;
        let sql = DictSql::new(&names.table);
        Ok(Self {
            engine,
            coder,
            names,
            sql,
            _marker: PhantomData,
        })
    }

    /// Name of the backing table.
    pub fn table_name(&self) -> &str {
        &self.names.table
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        self.engine.path()
    }

    /// The underlying storage engine.
    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Commit pending writes, then release the backing file.
    pub fn close(self) -> Result<()> {
        self.engine.close()
    }

    /// Number of entries.
    pub fn len(&self) -> Result<usize> {
        let cursor = self.engine.acquire_cursor()?;
        let count: i64 = cursor.query_row(&self.sql.count, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.clear, [])?;
        cursor.record_write()?;
        Ok(())
    }
}

impl<K, V, C> SqliteDict<K, V, C>
where
    C: Coder<K> + Coder<V>,
{
    fn encode_key(&self, key: &K) -> Result<String> {
        <C as Coder<K>>::encode(&self.coder, key)
    }

    fn encode_value(&self, value: &V) -> Result<String> {
        <C as Coder<V>>::encode(&self.coder, value)
    }

    fn decode_key(&self, text: &str) -> Result<K> {
        <C as Coder<K>>::decode(&self.coder, text)
    }

    fn decode_value(&self, text: Option<&str>) -> Result<V> {
        let text = text.ok_or_else(|| Error::Decode("stored value is NULL".into()))?;
        <C as Coder<V>>::decode(&self.coder, text)
    }

    /// Look up the value stored for `key`.
    pub fn get(&self, key: &K) -> Result<V> {
        let encoded = self.encode_key(key)?;
        let cursor = self.engine.acquire_cursor()?;
        let stored: Option<Option<String>> = cursor
            .query_row(&self.sql.get, params![encoded], |row| row.get(0))
            .optional()?;
        drop(cursor);
        match stored {
            Some(text) => self.decode_value(text.as_deref()),
            None => Err(Error::KeyNotFound),
        }
    }

    /// Look up `key`, falling back to `default` when it is absent.
    pub fn get_or_default(&self, key: &K, default: V) -> Result<V> {
        match self.get(key) {
            Err(Error::KeyNotFound) => Ok(default),
            other => other,
        }
    }

    /// Insert or replace the value for `key`.
    pub fn set(&self, key: &K, value: &V) -> Result<()> {
        let encoded_key = self.encode_key(key)?;
        let encoded_value = self.encode_value(value)?;
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.upsert, params![encoded_key, encoded_value])?;
        cursor.record_write()?;
        Ok(())
    }

    /// Remove `key`, failing with [`Error::KeyNotFound`] if it is absent.
    pub fn delete(&self, key: &K) -> Result<()> {
        let encoded = self.encode_key(key)?;
        let mut cursor = self.engine.acquire_cursor()?;
        let removed = cursor.execute_write(&self.sql.delete, params![encoded])?;
        cursor.record_write()?;
        if removed == 0 {
            return Err(Error::KeyNotFound);
        }
        Ok(())
    }

    pub fn contains(&self, key: &K) -> Result<bool> {
        let encoded = self.encode_key(key)?;
        let cursor = self.engine.acquire_cursor()?;
        let found = cursor
            .query_row(&self.sql.get, params![encoded], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Return the value for `key`, first storing `default` if it is absent.
    pub fn set_if_absent(&self, key: &K, default: V) -> Result<V> {
        let encoded_key = self.encode_key(key)?;
        let mut cursor = self.engine.acquire_cursor()?;
        let stored: Option<Option<String>> = cursor
            .query_row(&self.sql.get, params![encoded_key], |row| row.get(0))
            .optional()?;
        if let Some(text) = stored {
            drop(cursor);
            return self.decode_value(text.as_deref());
        }

        let encoded_value = self.encode_value(&default)?;
        cursor.execute_write(&self.sql.upsert, params![encoded_key, encoded_value])?;
        cursor.record_write()?;
        Ok(default)
    }

    /// Remove `key` and return its value.
    pub fn pop(&self, key: &K) -> Result<V> {
        let encoded = self.encode_key(key)?;
        let mut cursor = self.engine.acquire_cursor()?;
        let stored = cursor.atomic(|conn| {
            let stored: Option<String> = conn
                .query_row(&self.sql.get, params![encoded], |row| row.get(0))
                .optional()?
                .ok_or(Error::KeyNotFound)?;
            conn.execute(&self.sql.delete, params![encoded])?;
            Ok(stored)
        })?;
        cursor.record_write()?;
        drop(cursor);
        self.decode_value(stored.as_deref())
    }

    /// Remove and return some entry. Which one is unspecified.
    pub fn pop_arbitrary_item(&self) -> Result<(K, V)> {
        let mut cursor = self.engine.acquire_cursor()?;
        let (key, value) = cursor.atomic(|conn| {
            let (key, value): (String, Option<String>) = conn
                .query_row(&self.sql.first_item, [], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?
                .ok_or(Error::EmptyContainer)?;
            conn.execute(&self.sql.delete, params![key])?;
            Ok((key, value))
        })?;
        cursor.record_write()?;
        drop(cursor);
        Ok((self.decode_key(&key)?, self.decode_value(value.as_deref())?))
    }

    /// Insert every pair, replacing existing keys.
    ///
    /// Accepts owned pairs or borrowed ones, so both `Vec<(K, V)>` and
    /// `&HashMap<K, V>` work. The lock is held for the whole update.
    pub fn update_from<I, KB, VB>(&self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (KB, VB)>,
        KB: Borrow<K>,
        VB: Borrow<V>,
    {
        let mut cursor = self.engine.acquire_cursor()?;
        for (key, value) in pairs {
            let encoded_key = self.encode_key(key.borrow())?;
            let encoded_value = self.encode_value(value.borrow())?;
            cursor.execute_write(&self.sql.upsert, params![encoded_key, encoded_value])?;
            cursor.record_write()?;
        }
        Ok(())
    }

    fn scan<T>(
        &self,
        with_value: bool,
        project: fn(&Self, ScanRow<String>) -> Result<T>,
    ) -> DictIter<'_, K, V, C, T> {
        let value_col = with_value.then_some("value");
        DictIter {
            dict: self,
            scan: PagedScan::new(
                &self.engine,
                ScanQuery::new(&self.names.table, "key", value_col, Direction::Ascending),
            ),
            project,
        }
    }

    /// Iterate over keys. Order is unspecified.
    pub fn iter_keys(&self) -> Keys<'_, K, V, C> {
        self.scan(false, |dict, row| dict.decode_key(&row.key))
    }

    /// Iterate over `(key, value)` pairs. Order is unspecified.
    pub fn iter_items(&self) -> Items<'_, K, V, C> {
        self.scan(true, |dict, row| {
            Ok((dict.decode_key(&row.key)?, dict.decode_value(row.value.as_deref())?))
        })
    }

    /// Iterate over values. Order is unspecified.
    pub fn iter_values(&self) -> Values<'_, K, V, C> {
        self.scan(true, |dict, row| dict.decode_value(row.value.as_deref()))
    }

    /// Live view of the keys.
    pub fn keys(&self) -> KeysView<'_, K, V, C> {
        KeysView { dict: self }
    }

    /// Live view of the entries.
    pub fn items(&self) -> ItemsView<'_, K, V, C> {
        ItemsView { dict: self }
    }

    /// Live view of the values.
    pub fn values(&self) -> ValuesView<'_, K, V, C> {
        ValuesView { dict: self }
    }

    fn has_item(&self, key: &K, value: &V) -> Result<bool> {
        let encoded_key = self.encode_key(key)?;
        let encoded_value = self.encode_value(value)?;
        let cursor = self.engine.acquire_cursor()?;
        let found = cursor
            .query_row(&self.sql.has_item, params![encoded_key, encoded_value], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn has_value(&self, value: &V) -> Result<bool> {
        let encoded = self.encode_value(value)?;
        let cursor = self.engine.acquire_cursor()?;
        let found = cursor
            .query_row(&self.sql.has_value, params![encoded], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Stream every entry through `sink` while holding the lock, so the
    /// dump reflects a single point in time.
    fn for_each_item<F>(&self, mut sink: F) -> Result<()>
    where
        F: FnMut(K, V) -> Result<()>,
    {
        let cursor = self.engine.acquire_cursor()?;
        let mut stmt = cursor.prepare(&self.sql.all_items)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let value: Option<String> = row.get(1)?;
            sink(self.decode_key(&key)?, self.decode_value(value.as_deref())?)?;
        }
        Ok(())
    }

    /// Write the whole dict as one JSON object.
    ///
    /// Keys that do not serialize to JSON strings are written as the JSON
    /// text of the key.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()>
    where
        K: Serialize,
        V: Serialize,
    {
        let mut writer = dump::JsonObjectWriter::begin(out)?;
        self.for_each_item(|key, value| writer.entry(&key, &value))?;
        writer.finish()
    }

    /// Write one `key<field separator>value<line separator>` record per
    /// entry, both encoded as JSON.
    pub fn write_lines<W: Write>(&self, out: &mut W, format: &LineFormat) -> Result<()>
    where
        K: Serialize + serde::de::DeserializeOwned,
        V: Serialize + serde::de::DeserializeOwned,
    {
        self.write_lines_with(out, format, &JsonCoder, &JsonCoder)
    }

    /// Like [`SqliteDict::write_lines`] with caller-supplied key and value coders.
    pub fn write_lines_with<W, KC, VC>(
        &self,
        out: &mut W,
        format: &LineFormat,
        key_coder: &KC,
        value_coder: &VC,
    ) -> Result<()>
    where
        W: Write,
        KC: Coder<K>,
        VC: Coder<V>,
    {
        self.for_each_item(|key, value| {
            dump::write_pair_line(
                out,
                format,
                &key_coder.encode(&key)?,
                &value_coder.encode(&value)?,
            )
        })
    }
}

impl<K, V, C> std::fmt::Debug for SqliteDict<K, V, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDict")
            .field("table", &self.names.table)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Lazy iterator over a dict scan.
///
/// Each page is a fresh query, so entries written while iterating may or
/// may not be observed.
pub struct DictIter<'a, K, V, C, T> {
    dict: &'a SqliteDict<K, V, C>,
    scan: PagedScan<'a, String>,
    project: fn(&SqliteDict<K, V, C>, ScanRow<String>) -> Result<T>,
}

pub type Keys<'a, K, V, C> = DictIter<'a, K, V, C, K>;
pub type Items<'a, K, V, C> = DictIter<'a, K, V, C, (K, V)>;
pub type Values<'a, K, V, C> = DictIter<'a, K, V, C, V>;

impl<K, V, C, T> Iterator for DictIter<'_, K, V, C, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.scan.next()?;
        Some(row.and_then(|row| (self.project)(self.dict, row)))
    }
}

/// Live view of a dict's keys; every use re-queries the table.
pub struct KeysView<'a, K, V, C> {
    dict: &'a SqliteDict<K, V, C>,
}

impl<'a, K, V, C: Coder<K> + Coder<V>> KeysView<'a, K, V, C> {
    pub fn iter(&self) -> Keys<'a, K, V, C> {
        self.dict.iter_keys()
    }

    pub fn contains(&self, key: &K) -> Result<bool> {
        self.dict.contains(key)
    }
}

impl<'a, K, V, C: Coder<K> + Coder<V>> IntoIterator for &KeysView<'a, K, V, C> {
    type Item = Result<K>;
    type IntoIter = Keys<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Live view of a dict's entries; every use re-queries the table.
pub struct ItemsView<'a, K, V, C> {
    dict: &'a SqliteDict<K, V, C>,
}

impl<'a, K, V, C: Coder<K> + Coder<V>> ItemsView<'a, K, V, C> {
    pub fn iter(&self) -> Items<'a, K, V, C> {
        self.dict.iter_items()
    }

    /// Whether `key` is present with exactly `value`.
    pub fn contains(&self, item: &(K, V)) -> Result<bool> {
        self.dict.has_item(&item.0, &item.1)
    }
}

impl<'a, K, V, C: Coder<K> + Coder<V>> IntoIterator for &ItemsView<'a, K, V, C> {
    type Item = Result<(K, V)>;
    type IntoIter = Items<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Live view of a dict's values; every use re-queries the table.
pub struct ValuesView<'a, K, V, C> {
    dict: &'a SqliteDict<K, V, C>,
}

impl<'a, K, V, C: Coder<K> + Coder<V>> ValuesView<'a, K, V, C> {
    pub fn iter(&self) -> Values<'a, K, V, C> {
        self.dict.iter_values()
    }

    /// Whether any key maps to `value`. Uses the value index when present.
    pub fn contains(&self, value: &V) -> Result<bool> {
        self.dict.has_value(value)
    }
}

impl<'a, K, V, C: Coder<K> + Coder<V>> IntoIterator for &ValuesView<'a, K, V, C> {
    type Item = Result<V>;
    type IntoIter = Values<'a, K, V, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, C> Container for SqliteDict<K, V, C> {
    fn len(&self) -> Result<usize> {
        SqliteDict::len(self)
    }

    fn clear(&self) -> Result<()> {
        SqliteDict::clear(self)
    }
}

impl<K, V, C: Coder<K> + Coder<V>> Membership<K> for SqliteDict<K, V, C> {
    fn contains(&self, key: &K) -> Result<bool> {
        SqliteDict::contains(self, key)
    }
}

impl<K, V, C: Coder<K> + Coder<V>> Mapping<K, V> for SqliteDict<K, V, C> {
    fn get(&self, key: &K) -> Result<V> {
        SqliteDict::get(self, key)
    }

    fn set(&self, key: &K, value: &V) -> Result<()> {
        SqliteDict::set(self, key, value)
    }

    fn delete(&self, key: &K) -> Result<()> {
        SqliteDict::delete(self, key)
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        SqliteDict::contains(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn new_dict() -> SqliteDict<String, i64> {
        SqliteDict::open(StoreConfig::temporary()).unwrap()
    }

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_set_get_roundtrip() {
        let dict = new_dict();
        dict.set(&key("a"), &1).unwrap();
        assert_eq!(dict.get(&key("a")).unwrap(), 1);
        assert!(matches!(dict.get(&key("b")), Err(Error::KeyNotFound)));
    }

    #[test]
    fn test_set_replaces_existing() {
        let dict = new_dict();
        dict.set(&key("a"), &1).unwrap();
        dict.set(&key("a"), &2).unwrap();
        assert_eq!(dict.get(&key("a")).unwrap(), 2);
        assert_eq!(dict.len().unwrap(), 1);
    }

    #[test]
    fn test_delete_missing_key() {
        let dict = new_dict();
        assert!(matches!(dict.delete(&key("x")), Err(Error::KeyNotFound)));
    }

    #[test]
    fn test_delete_missing_key_counts_as_write() {
        let dict: SqliteDict<String, i64> =
            SqliteDict::open(StoreConfig::temporary().with_commit_every(2)).unwrap();
        dict.set(&key("a"), &1).unwrap();
        assert_eq!(dict.engine().pending_writes().unwrap(), 1);
        assert!(dict.delete(&key("x")).is_err());
        assert_eq!(dict.engine().commit_count().unwrap(), 1);
        assert_eq!(dict.engine().pending_writes().unwrap(), 0);
    }

    #[test]
    fn test_get_or_default_and_set_if_absent() {
        let dict = new_dict();
        assert_eq!(dict.get_or_default(&key("a"), 7).unwrap(), 7);
        assert!(!dict.contains(&key("a")).unwrap());

        assert_eq!(dict.set_if_absent(&key("a"), 7).unwrap(), 7);
        assert_eq!(dict.set_if_absent(&key("a"), 9).unwrap(), 7);
        assert_eq!(dict.get(&key("a")).unwrap(), 7);
    }

    #[test]
    fn test_pop_arbitrary_item_drains() {
        let dict = new_dict();
        dict.update_from(vec![(key("a"), 1i64), (key("b"), 2)]).unwrap();

        let mut popped = vec![dict.pop_arbitrary_item().unwrap(), dict.pop_arbitrary_item().unwrap()];
        popped.sort();
        assert_eq!(popped, vec![(key("a"), 1i64), (key("b"), 2)]);
        assert!(matches!(dict.pop_arbitrary_item(), Err(Error::EmptyContainer)));
    }

    #[test]
    fn test_pop_missing_leaves_dict_unchanged() {
        let dict = new_dict();
        dict.set(&key("a"), &1).unwrap();
        assert!(matches!(dict.pop(&key("z")), Err(Error::KeyNotFound)));
        assert_eq!(dict.len().unwrap(), 1);
    }

    #[test]
    fn test_update_from_borrowed_map() {
        let dict = new_dict();
        let source: HashMap<String, i64> = [(key("x"), 10), (key("y"), 20)].into_iter().collect();
        dict.update_from(&source).unwrap();

        let items: BTreeMap<String, i64> =
            dict.iter_items().collect::<Result<_>>().unwrap();
        assert_eq!(items, source.into_iter().collect::<BTreeMap<_, _>>());
    }

    #[test]
    fn test_views_are_live() {
        let dict = new_dict();
        let keys = dict.keys();
        let values = dict.values();
        assert_eq!(keys.iter().count(), 0);

        dict.set(&key("a"), &1).unwrap();
        assert_eq!(keys.iter().collect::<Result<Vec<_>>>().unwrap(), vec![key("a")]);
        assert!(keys.contains(&key("a")).unwrap());
        assert!(values.contains(&1).unwrap());
        assert!(!values.contains(&2).unwrap());

        let items = dict.items();
        assert!(items.contains(&(key("a"), 1)).unwrap());
        assert!(!items.contains(&(key("a"), 2)).unwrap());
    }

    #[test]
    fn test_iteration_spans_pages() {
        let dict: SqliteDict<i64, i64> =
            SqliteDict::open(StoreConfig::temporary().with_scan_page_size(3)).unwrap();
        dict.update_from((0..10i64).map(|i| (i, i * i))).unwrap();

        let mut values: Vec<i64> = dict.iter_values().collect::<Result<_>>().unwrap();
        values.sort_unstable();
        assert_eq!(values, (0..10).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn test_mutation_while_iterating() {
        let dict: SqliteDict<i64, i64> =
            SqliteDict::open(StoreConfig::temporary().with_scan_page_size(2)).unwrap();
        dict.update_from((0..6i64).map(|i| (i, i))).unwrap();

        for key in dict.iter_keys() {
            let key = key.unwrap();
            dict.delete(&key).unwrap();
        }
        assert!(dict.is_empty().unwrap());
    }

    #[test]
    fn test_clear() {
        let dict = new_dict();
        dict.update_from(vec![(key("a"), 1i64), (key("b"), 2)]).unwrap();
        dict.clear().unwrap();
        assert_eq!(dict.len().unwrap(), 0);
    }
}
