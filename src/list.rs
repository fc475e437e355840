//! Append/prepend sequence backed by one table.
//!
//! Rows are `(list_index INTEGER PRIMARY KEY, value TEXT)`. Stored positions
//! grow upward on append and downward on prepend, so neither operation
//! renumbers existing rows. Positions are only required to be strictly
//! increasing in logical order: logical index `i` is stored at
//! `MIN(list_index) + i`, with an ordered offset lookup as fallback for
//! stores whose positions have gaps.
//!
//! Insertion and removal in the middle of the sequence are not supported.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
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
use crate::traits::{Container, Indexable, Membership};

/// Position given to the first element of an empty list.
pub const SEED_POSITION: i64 = 0;

/// Python-style slice: optional start, stop and step.
///
/// Resolution against a length follows Python's `slice.indices`: negative
/// bounds count from the end, out-of-range bounds are clamped, and a
/// negative step walks backwards with defaults flipped accordingly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceSpec {
    pub start: Option<isize>,
    pub stop: Option<isize>,
    pub step: Option<isize>,
}

impl SliceSpec {
    pub fn new(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Self {
        Self { start, stop, step }
    }

    /// `[start:stop]`
    pub fn range(start: isize, stop: isize) -> Self {
        Self::new(Some(start), Some(stop), None)
    }

    /// `[::-1]`
    pub fn reversed() -> Self {
        Self::new(None, None, Some(-1))
    }

    /// Resolve against a sequence of length `len`.
    pub fn resolve(&self, len: usize) -> Result<ResolvedSlice> {
        let len = i64::try_from(len)
            .map_err(|_| Error::InvalidKeyType("sequence length exceeds i64".into()))?;
        let step = to_i64(self.step.unwrap_or(1))?;
        if step == 0 {
            return Err(Error::InvalidKeyType("slice step cannot be zero".into()));
        }

        let (lower, upper) = if step < 0 { (-1, len - 1) } else { (0, len) };
        let clamp = |bound: Option<isize>, default: i64| -> Result<i64> {
            let Some(bound) = bound else {
                return Ok(default);
            };
            let bound = to_i64(bound)?;
            Ok(if bound < 0 {
                (bound + len).max(lower)
            } else {
                bound.min(upper)
            })
        };
        let start = clamp(self.start, if step < 0 { upper } else { lower })?;
        let stop = clamp(self.stop, if step < 0 { lower } else { upper })?;

        // Widened so that a step of i64::MIN can be negated.
        let (start_w, stop_w, step_w) = (i128::from(start), i128::from(stop), i128::from(step));
        let count = if step > 0 && start < stop {
            (stop_w - start_w - 1) / step_w + 1
        } else if step < 0 && start > stop {
            (start_w - stop_w - 1) / -step_w + 1
        } else {
            0
        };

        Ok(ResolvedSlice {
            start,
            step,
            len: usize::try_from(count).unwrap_or(0),
        })
    }
}

fn to_i64(value: isize) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::InvalidKeyType(format!("index {value} exceeds i64")))
}

/// A slice resolved to concrete logical indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: i64,
    pub step: i64,
    pub len: usize,
}

impl ResolvedSlice {
    /// Logical index of the `n`th element of the slice.
    pub fn index(&self, n: usize) -> Option<i64> {
        if n >= self.len {
            return None;
        }
        let n = i128::try_from(n).ok()?;
        i64::try_from(i128::from(self.start) + i128::from(self.step) * n).ok()
    }

    pub fn indices(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len).filter_map(|n| self.index(n))
    }
}

/// Precomputed statements for one list table.
#[derive(Debug)]
struct ListSql {
    count: String,
    append: String,
    prepend: String,
    bounds: String,
    value_at: String,
    position_nth: String,
    update: String,
    first: String,
    last: String,
    delete_position: String,
    has_value: String,
    clear: String,
    all_values: String,
}

impl ListSql {
    fn new(table: &str) -> Self {
        let t = quote_ident(table);
        Self {
            count: format!("SELECT COUNT(*) FROM {t}"),
            append: format!(
                "INSERT INTO {t} (list_index, value) VALUES (COALESCE((SELECT MAX(list_index) FROM {t}) + 1, {SEED_POSITION}), ?1)"
            ),
            prepend: format!(
                "INSERT INTO {t} (list_index, value) VALUES (COALESCE((SELECT MIN(list_index) FROM {t}) - 1, {SEED_POSITION}), ?1)"
            ),
            bounds: format!("SELECT COUNT(*), MIN(list_index), MAX(list_index) FROM {t}"),
            value_at: format!("SELECT value FROM {t} WHERE list_index = ?1"),
            position_nth: format!(
                "SELECT list_index FROM {t} ORDER BY list_index ASC LIMIT 1 OFFSET ?1"
            ),
            update: format!("UPDATE {t} SET value = ?2 WHERE list_index = ?1"),
            first: format!("SELECT list_index, value FROM {t} ORDER BY list_index ASC LIMIT 1"),
            last: format!("SELECT list_index, value FROM {t} ORDER BY list_index DESC LIMIT 1"),
            delete_position: format!("DELETE FROM {t} WHERE list_index = ?1"),
            has_value: format!("SELECT 1 FROM {t} WHERE value = ?1 LIMIT 1"),
            clear: format!("DELETE FROM {t}"),
            all_values: format!("SELECT value FROM {t} ORDER BY list_index ASC"),
        }
    }
}

/// Persistent list supporting O(1) append and prepend.
///
/// # Example
///
/// ```
/// use sqlite_object::{SqliteList, StoreConfig};
///
/// # fn main() -> sqlite_object::Result<()> {
/// let list: SqliteList<String> = SqliteList::open(StoreConfig::temporary())?;
/// list.append(&"x".into())?;
/// list.append(&"y".into())?;
/// list.prepend(&"w".into())?;
/// assert_eq!(list.get(0)?, "w");
/// assert_eq!(list.get(-1)?, "y");
/// assert_eq!(list.pop_first()?, "w");
/// # Ok(())
/// # }
/// ```
pub struct SqliteList<T, C = JsonCoder> {
    engine: StorageEngine,
    coder: C,
    names: TableNames,
    sql: ListSql,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SqliteList<T, JsonCoder> {
    /// Open a list using the JSON coder.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::with_coder(config, JsonCoder)
    }
}

impl<T, C> SqliteList<T, C> {
    /// Open a list with a caller-supplied coder.
    ///
    /// The value column is indexed unless `index_values` is set to false.
    pub fn with_coder(config: StoreConfig, coder: C) -> Result<Self> {
        let names = config.table_names(ContainerKind::List);
        let engine = StorageEngine::open(&config)?;
        engine.initialize_table(
            ContainerKind::List,
            &names,
            config.index_values.unwrap_or(true),
        )?;
        let sql = ListSql::new(&names.table);
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

    fn count(&self, conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row(&self.sql.count, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn len(&self) -> Result<usize> {
        let cursor = self.engine.acquire_cursor()?;
        self.count(&cursor)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every element.
    pub fn clear(&self) -> Result<()> {
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.clear, [])?;
        cursor.record_write()?;
        Ok(())
    }

    fn bounds(&self, conn: &Connection) -> Result<Bounds> {
        let (count, min, max): (i64, Option<i64>, Option<i64>) = conn
            .query_row(&self.sql.bounds, [], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
        Ok(Bounds {
            len: usize::try_from(count).unwrap_or(0),
            min,
            max,
        })
    }

    /// Resolve a possibly negative index and map it to a stored position.
    fn locate(&self, conn: &Connection, index: isize) -> Result<i64> {
        let bounds = self.bounds(conn)?;
        let logical = bounds.resolve(index)?;
        if bounds.is_contiguous() {
            if let Some(min) = bounds.min {
                return Ok(min + logical);
            }
        }
        conn.query_row(&self.sql.position_nth, params![logical], |row| row.get(0))
            .optional()?
            .ok_or(Error::IndexOutOfRange {
                index: logical,
                len: bounds.len,
            })
    }
}

/// Row count and position range of a list table.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    len: usize,
    min: Option<i64>,
    max: Option<i64>,
}

impl Bounds {
    /// Resolve a possibly negative index against the length.
    fn resolve(&self, index: isize) -> Result<i64> {
        let index = to_i64(index)?;
        let len = i64::try_from(self.len).unwrap_or(i64::MAX);
        let resolved = if index < 0 { len + index } else { index };
        if resolved < 0 || resolved >= len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(resolved)
    }

    /// Whether positions run without gaps, so index `i` is at `min + i`.
    fn is_contiguous(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => i128::from(max) - i128::from(min) + 1 == self.len as i128,
            _ => true,
        }
    }
}

impl<T, C: Coder<T>> SqliteList<T, C> {
    fn decode(&self, text: Option<&str>) -> Result<T> {
        let text = text.ok_or_else(|| Error::Decode("stored value is NULL".into()))?;
        self.coder.decode(text)
    }

    /// Element at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<T> {
        let cursor = self.engine.acquire_cursor()?;
        let position = self.locate(&cursor, index)?;
        let stored: Option<String> = cursor
            .query_row(&self.sql.value_at, params![position], |row| row.get(0))
            .optional()?
            .ok_or_else(|| Error::Decode(format!("no row at list position {position}")))?;
        drop(cursor);
        self.decode(stored.as_deref())
    }

    /// Overwrite the element at `index` in place.
    pub fn set(&self, index: isize, value: &T) -> Result<()> {
        let encoded = self.coder.encode(value)?;
        let mut cursor = self.engine.acquire_cursor()?;
        let position = self.locate(&cursor, index)?;
        cursor.execute_write(&self.sql.update, params![position, encoded])?;
        cursor.record_write()?;
        Ok(())
    }

    /// Add an element after the current last one.
    pub fn append(&self, value: &T) -> Result<()> {
        let encoded = self.coder.encode(value)?;
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.append, params![encoded])?;
        cursor.record_write()?;
        Ok(())
    }

    /// Add an element before the current first one.
    pub fn prepend(&self, value: &T) -> Result<()> {
        let encoded = self.coder.encode(value)?;
        let mut cursor = self.engine.acquire_cursor()?;
        cursor.execute_write(&self.sql.prepend, params![encoded])?;
        cursor.record_write()?;
        Ok(())
    }

    /// Append every element of `values`, holding the lock throughout.
    pub fn extend<'v, I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = &'v T>,
        T: 'v,
    {
        let mut cursor = self.engine.acquire_cursor()?;
        for value in values {
            let encoded = self.coder.encode(value)?;
            cursor.execute_write(&self.sql.append, params![encoded])?;
            cursor.record_write()?;
        }
        Ok(())
    }

    fn pop_end(&self, end_sql: &str) -> Result<T> {
        let mut cursor = self.engine.acquire_cursor()?;
        let stored = cursor.atomic(|conn| {
            let (position, value): (i64, Option<String>) = conn
                .query_row(end_sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?
                .ok_or(Error::EmptyContainer)?;
            conn.execute(&self.sql.delete_position, params![position])?;
            Ok(value)
        })?;
        cursor.record_write()?;
        drop(cursor);
        self.decode(stored.as_deref())
    }

    /// Remove and return the first element.
    pub fn pop_first(&self) -> Result<T> {
        self.pop_end(&self.sql.first)
    }

    /// Remove and return the last element.
    pub fn pop_last(&self) -> Result<T> {
        self.pop_end(&self.sql.last)
    }

    /// Whether any element encodes to the same text as `value`.
    pub fn contains(&self, value: &T) -> Result<bool> {
        let encoded = self.coder.encode(value)?;
        let cursor = self.engine.acquire_cursor()?;
        let found = cursor
            .query_row(&self.sql.has_value, params![encoded], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    fn scan(&self, direction: Direction) -> ListIter<'_, T, C> {
        ListIter {
            list: self,
            scan: PagedScan::new(
                &self.engine,
                ScanQuery::new(&self.names.table, "list_index", Some("value"), direction),
            ),
        }
    }

    /// Iterate front to back.
    pub fn iter(&self) -> ListIter<'_, T, C> {
        self.scan(Direction::Ascending)
    }

    /// Iterate back to front.
    pub fn iter_rev(&self) -> ListIter<'_, T, C> {
        self.scan(Direction::Descending)
    }

    /// Lazy slice resolved against the current length.
    ///
    /// Every element is fetched with an independent [`SqliteList::get`], so
    /// a slice over a list that shrinks yields [`Error::IndexOutOfRange`]
    /// for elements that no longer exist.
    pub fn slice(&self, spec: SliceSpec) -> Result<Slice<'_, T, C>> {
        let len = self.len()?;
        Ok(Slice {
            list: self,
            resolved: spec.resolve(len)?,
        })
    }

    fn get_logical(&self, logical: i64) -> Result<T> {
        let index = isize::try_from(logical)
            .map_err(|_| Error::InvalidKeyType(format!("index {logical} exceeds isize")))?;
        self.get(index)
    }

    /// Stream every element through `sink` in order while holding the lock.
    fn for_each_value<F>(&self, mut sink: F) -> Result<()>
    where
        F: FnMut(T) -> Result<()>,
    {
        let cursor = self.engine.acquire_cursor()?;
        let mut stmt = cursor.prepare(&self.sql.all_values)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let value: Option<String> = row.get(0)?;
            sink(self.decode(value.as_deref())?)?;
        }
        Ok(())
    }

    /// Write the whole list as one JSON array.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()>
    where
        T: Serialize,
    {
        let mut writer = dump::JsonArrayWriter::begin(out)?;
        self.for_each_value(|value| writer.element(&value))?;
        writer.finish()
    }

    /// Write one JSON-encoded element per line.
    pub fn write_lines<W: Write>(&self, out: &mut W, format: &LineFormat) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.write_lines_with(out, format, &JsonCoder)
    }

    /// Write one element per line using `coder`.
    pub fn write_lines_with<W, EC>(&self, out: &mut W, format: &LineFormat, coder: &EC) -> Result<()>
    where
        W: Write,
        EC: Coder<T>,
    {
        self.for_each_value(|value| dump::write_line(out, format, &coder.encode(&value)?))
    }
}

impl<T, C> std::fmt::Debug for SqliteList<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteList")
            .field("table", &self.names.table)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Lazy in-order iterator over a list.
pub struct ListIter<'a, T, C> {
    list: &'a SqliteList<T, C>,
    scan: PagedScan<'a, i64>,
}

impl<T, C: Coder<T>> Iterator for ListIter<'_, T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.scan.next()?;
        Some(row.and_then(|row| self.list.decode(row.value.as_deref())))
    }
}

impl<'a, T, C: Coder<T>> IntoIterator for &'a SqliteList<T, C> {
    type Item = Result<T>;
    type IntoIter = ListIter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A finite, restartable lazy slice of a list.
pub struct Slice<'a, T, C> {
    list: &'a SqliteList<T, C>,
    resolved: ResolvedSlice,
}

impl<'a, T, C: Coder<T>> Slice<'a, T, C> {
    /// Number of elements the slice selects.
    pub fn len(&self) -> usize {
        self.resolved.len
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.len == 0
    }

    pub fn resolved(&self) -> ResolvedSlice {
        self.resolved
    }

    /// Start a fresh pass over the slice.
    pub fn iter(&self) -> SliceIter<'a, T, C> {
        SliceIter {
            list: self.list,
            resolved: self.resolved,
            next: 0,
        }
    }
}

impl<'a, T, C: Coder<T>> IntoIterator for &Slice<'a, T, C> {
    type Item = Result<T>;
    type IntoIter = SliceIter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a [`Slice`].
pub struct SliceIter<'a, T, C> {
    list: &'a SqliteList<T, C>,
    resolved: ResolvedSlice,
    next: usize,
}

impl<T, C: Coder<T>> Iterator for SliceIter<'_, T, C> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let logical = self.resolved.index(self.next)?;
        self.next += 1;
        Some(self.list.get_logical(logical))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.resolved.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<T, C> Container for SqliteList<T, C> {
    fn len(&self) -> Result<usize> {
        SqliteList::len(self)
    }

    fn clear(&self) -> Result<()> {
        SqliteList::clear(self)
    }
}

impl<T, C: Coder<T>> Membership<T> for SqliteList<T, C> {
    fn contains(&self, item: &T) -> Result<bool> {
        SqliteList::contains(self, item)
    }
}

impl<T, C: Coder<T>> Indexable<T> for SqliteList<T, C> {
    fn get(&self, index: isize) -> Result<T> {
        SqliteList::get(self, index)
    }

    fn set(&self, index: isize, value: &T) -> Result<()> {
        SqliteList::set(self, index, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_list() -> SqliteList<i64> {
        SqliteList::open(StoreConfig::temporary()).unwrap()
    }

    fn positions(list: &SqliteList<i64>) -> Vec<i64> {
        let cursor = list.engine().acquire_cursor().unwrap();
        let mut stmt = cursor
            .prepare("SELECT list_index FROM list ORDER BY list_index ASC")
            .unwrap();
        let rows = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<i64>>>()
            .unwrap();
        rows
    }

    fn resolve(start: Option<isize>, stop: Option<isize>, step: Option<isize>, len: usize) -> Vec<i64> {
        SliceSpec::new(start, stop, step)
            .resolve(len)
            .unwrap()
            .indices()
            .collect()
    }

    #[test]
    fn test_gap_indexing_never_renumbers() {
        let list = new_list();
        list.append(&1).unwrap();
        assert_eq!(positions(&list), vec![0]);
        list.append(&2).unwrap();
        list.prepend(&0).unwrap();
        list.prepend(&-1).unwrap();
        assert_eq!(positions(&list), vec![-2, -1, 0, 1]);
        assert_eq!(list.iter().collect::<Result<Vec<_>>>().unwrap(), vec![-1, 0, 1, 2]);
    }

    #[test]
    fn test_prepend_seeds_empty_list() {
        let list = new_list();
        list.prepend(&5).unwrap();
        assert_eq!(positions(&list), vec![SEED_POSITION]);
        assert_eq!(list.get(0).unwrap(), 5);
    }

    #[test]
    fn test_negative_indexing() {
        let list = new_list();
        list.extend(&[10, 20, 30]).unwrap();
        assert_eq!(list.get(-1).unwrap(), 30);
        assert_eq!(list.get(-3).unwrap(), 10);
        assert!(matches!(
            list.get(-4),
            Err(Error::IndexOutOfRange { index: -4, len: 3 })
        ));
        assert!(matches!(list.get(3), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let list = new_list();
        list.extend(&[1, 2, 3]).unwrap();
        list.prepend(&0).unwrap();
        list.set(1, &100).unwrap();
        list.set(-1, &300).unwrap();
        assert_eq!(positions(&list), vec![-1, 0, 1, 2]);
        assert_eq!(list.iter().collect::<Result<Vec<_>>>().unwrap(), vec![0, 100, 2, 300]);
        assert!(matches!(list.set(4, &9), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_pops_on_empty_list() {
        let list = new_list();
        assert!(matches!(list.pop_first(), Err(Error::EmptyContainer)));
        assert!(matches!(list.pop_last(), Err(Error::EmptyContainer)));
        assert_eq!(list.engine().commit_count().unwrap(), 0);
    }

    #[test]
    fn test_pops_shift_min_and_max() {
        let list = new_list();
        list.extend(&[1, 2, 3, 4]).unwrap();
        assert_eq!(list.pop_first().unwrap(), 1);
        assert_eq!(list.pop_last().unwrap(), 4);
        assert_eq!(list.get(0).unwrap(), 2);
        assert_eq!(list.get(1).unwrap(), 3);
        list.prepend(&1).unwrap();
        assert_eq!(positions(&list), vec![0, 1, 2]);
    }

    #[test]
    fn test_gapped_positions_fall_back_to_offset() {
        let list = new_list();
        {
            let mut cursor = list.engine().acquire_cursor().unwrap();
            for (position, value) in [(3, "30"), (5, "50"), (6, "60"), (20, "200")] {
                cursor
                    .execute_write(
                        "INSERT INTO list (list_index, value) VALUES (?1, ?2)",
                        params![position, value],
                    )
                    .unwrap();
                cursor.record_write().unwrap();
            }
        }
        // MIN + 2 would land on position 5, which holds logical index 1.
        assert_eq!(list.get(1).unwrap(), 50);
        assert_eq!(list.get(2).unwrap(), 60);
        assert_eq!(list.get(-1).unwrap(), 200);
        list.set(3, &201).unwrap();
        assert_eq!(positions(&list), vec![3, 5, 6, 20]);
        assert_eq!(list.get(3).unwrap(), 201);
        list.append(&300).unwrap();
        assert_eq!(positions(&list), vec![3, 5, 6, 20, 21]);
    }

    #[test]
    fn test_iter_rev_and_contains() {
        let list = SqliteList::<i64>::open(StoreConfig::temporary().with_scan_page_size(2)).unwrap();
        list.extend(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(
            list.iter_rev().collect::<Result<Vec<_>>>().unwrap(),
            vec![5, 4, 3, 2, 1]
        );
        assert!(list.contains(&3).unwrap());
        assert!(!list.contains(&6).unwrap());
    }

    #[test]
    fn test_slice_resolution_matches_python() {
        // range(5)[1:4]
        assert_eq!(resolve(Some(1), Some(4), None, 5), vec![1, 2, 3]);
        // range(5)[::-1]
        assert_eq!(resolve(None, None, Some(-1), 5), vec![4, 3, 2, 1, 0]);
        // range(5)[::2]
        assert_eq!(resolve(None, None, Some(2), 5), vec![0, 2, 4]);
        // range(5)[-2:]
        assert_eq!(resolve(Some(-2), None, None, 5), vec![3, 4]);
        // range(5)[3:0:-1]
        assert_eq!(resolve(Some(3), Some(0), Some(-1), 5), vec![3, 2, 1]);
        // range(5)[10:-10:-2]
        assert_eq!(resolve(Some(10), Some(-10), Some(-2), 5), vec![4, 2, 0]);
        // range(5)[-100:100]
        assert_eq!(resolve(Some(-100), Some(100), None, 5), vec![0, 1, 2, 3, 4]);
        // range(5)[4:1]
        assert!(resolve(Some(4), Some(1), None, 5).is_empty());
        // range(0)[::-1]
        assert!(resolve(None, None, Some(-1), 0).is_empty());
        // range(3)[::-sys.maxsize - 1]
        assert_eq!(resolve(None, None, Some(isize::MIN), 3), vec![2]);
        // range(3)[::sys.maxsize]
        assert_eq!(resolve(None, None, Some(isize::MAX), 3), vec![0]);
        // range(3)[-1:-100:isize::MIN]
        assert_eq!(resolve(Some(-1), Some(-100), Some(isize::MIN), 3), vec![2]);
    }

    #[test]
    fn test_slice_with_extreme_step() {
        let list = new_list();
        list.extend(&[1, 2, 3]).unwrap();
        let slice = list.slice(SliceSpec::new(None, None, Some(isize::MIN))).unwrap();
        assert_eq!(slice.len(), 1);
        assert_eq!(slice.iter().collect::<Result<Vec<_>>>().unwrap(), vec![3]);
    }

    #[test]
    fn test_zero_step_rejected() {
        let result = SliceSpec::new(None, None, Some(0)).resolve(3);
        assert!(matches!(result, Err(Error::InvalidKeyType(_))));
    }

    #[test]
    fn test_slice_is_restartable() {
        let list = new_list();
        list.extend(&[10, 20, 30]).unwrap();
        let slice = list.slice(SliceSpec::reversed()).unwrap();
        assert_eq!(slice.len(), 3);
        let first: Vec<i64> = slice.iter().collect::<Result<_>>().unwrap();
        let second: Vec<i64> = (&slice).into_iter().collect::<Result<_>>().unwrap();
        assert_eq!(first, vec![30, 20, 10]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_slice_observes_shrinking_list() {
        let list = new_list();
        list.extend(&[1, 2, 3]).unwrap();
        let slice = list.slice(SliceSpec::default()).unwrap();
        let mut iter = slice.iter();
        assert_eq!(iter.next().unwrap().unwrap(), 1);
        list.pop_last().unwrap();
        assert_eq!(iter.next().unwrap().unwrap(), 2);
        assert!(matches!(
            iter.next().unwrap(),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(iter.next().is_none());
    }
}
