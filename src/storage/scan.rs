//! Lazy, paged table scans.
//!
//! A scan fetches rows in pages ordered by the table's primary key and
//! resumes each page after the last key seen. The engine lock is held only
//! while a page is fetched, so a scan is not snapshot-isolated: it observes
//! mutations made between pages, and the caller may mutate the container
//! while iterating.

use rusqlite::types::FromSql;
use rusqlite::{params, Row, ToSql};
use std::collections::VecDeque;

use super::engine::StorageEngine;
use super::schema::quote_ident;
use crate::error::Result;

/// One raw row produced by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRow<K> {
    /// Primary-key column.
    pub key: K,
    /// Value column, when the scan selects one.
    pub value: Option<String>,
}

/// Scan direction over the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Which table and columns a scan reads.
#[derive(Debug, Clone)]
pub struct ScanQuery {
    first_page: String,
    next_page: String,
    with_value: bool,
}

impl ScanQuery {
    pub fn new(table: &str, key_col: &str, value_col: Option<&str>, direction: Direction) -> Self {
        let table = quote_ident(table);
        let columns = match value_col {
            Some(value_col) => format!("{key_col}, {value_col}"),
            None => key_col.to_string(),
        };
        let (order, cmp) = match direction {
            Direction::Ascending => ("ASC", ">"),
            Direction::Descending => ("DESC", "<"),
        };
        Self {
            first_page: format!(
                "SELECT {columns} FROM {table} ORDER BY {key_col} {order} LIMIT ?1"
            ),
            next_page: format!(
                "SELECT {columns} FROM {table} WHERE {key_col} {cmp} ?1 ORDER BY {key_col} {order} LIMIT ?2"
            ),
            with_value: value_col.is_some(),
        }
    }
}

/// Iterator over the rows of a table, fetched a page at a time.
pub struct PagedScan<'a, K> {
    engine: &'a StorageEngine,
    query: ScanQuery,
    after: Option<K>,
    buffer: VecDeque<ScanRow<K>>,
    exhausted: bool,
}

impl<'a, K> PagedScan<'a, K>
where
    K: FromSql + ToSql + Clone,
{
    pub fn new(engine: &'a StorageEngine, query: ScanQuery) -> Self {
        Self {
            engine,
            query,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_page(&mut self) -> Result<()> {
        let page_size = self.engine.scan_page_size();
        let with_value = self.query.with_value;
        let read_row = |row: &Row<'_>| -> rusqlite::Result<ScanRow<K>> {
            Ok(ScanRow {
                key: row.get(0)?,
                value: if with_value { row.get(1)? } else { None },
            })
        };

        let rows = {
            let cursor = self.engine.acquire_cursor()?;
            let limit = i64::try_from(page_size).unwrap_or(i64::MAX);
            match &self.after {
                None => {
                    let mut stmt = cursor.prepare_cached(&self.query.first_page)?;
                    let rows = stmt
                        .query_map(params![limit], read_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
                Some(after) => {
                    let mut stmt = cursor.prepare_cached(&self.query.next_page)?;
                    let rows = stmt
                        .query_map(params![after, limit], read_row)?
                        .collect::<rusqlite::Result<Vec<_>>>()?;
                    rows
                }
            }
        };

        if rows.len() < page_size {
            self.exhausted = true;
        }
        if let Some(last) = rows.last() {
            self.after = Some(last.key.clone());
        }
        self.buffer.extend(rows);
        Ok(())
    }
}

impl<K> Iterator for PagedScan<'_, K>
where
    K: FromSql + ToSql + Clone,
{
    type Item = Result<ScanRow<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
