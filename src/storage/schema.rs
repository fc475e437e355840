//! Table layouts and connection pragmas.
//!
//! Column layouts are fixed so that stores stay readable across
//! implementations:
//! - dict: `key TEXT PRIMARY KEY, value TEXT`, optional index on `value`
//! - list: `list_index INTEGER PRIMARY KEY, value TEXT`, optional index on `value`
//! - set: `key TEXT PRIMARY KEY`

use rusqlite::Connection;
use std::time::Duration;

use crate::config::{ContainerKind, TableNames};

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Apply per-connection pragmas.
pub fn apply_pragmas(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    // Full fsync on commit; batching is what amortizes the cost.
    conn.pragma_update(None, "synchronous", "FULL")?;
    Ok(())
}

/// DDL for a container table.
pub fn table_ddl(kind: ContainerKind, names: &TableNames) -> String {
    let table = quote_ident(&names.table);
    match kind {
        ContainerKind::Dict => {
            format!("CREATE TABLE IF NOT EXISTS {table} (key TEXT PRIMARY KEY, value TEXT)")
        }
        ContainerKind::List => format!(
            "CREATE TABLE IF NOT EXISTS {table} (list_index INTEGER PRIMARY KEY, value TEXT)"
        ),
        ContainerKind::Set => format!("CREATE TABLE IF NOT EXISTS {table} (key TEXT PRIMARY KEY)"),
    }
}

/// DDL for the optional value index. Sets have none.
pub fn value_index_ddl(kind: ContainerKind, names: &TableNames) -> Option<String> {
    match kind {
        ContainerKind::Set => None,
        ContainerKind::Dict | ContainerKind::List => Some(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (value)",
            quote_ident(&names.index),
            quote_ident(&names.table)
        )),
    }
}

/// Create the container table, and its value index when requested.
pub fn initialize_table(
    conn: &Connection,
    kind: ContainerKind,
    names: &TableNames,
    index_values: bool,
) -> rusqlite::Result<()> {
    conn.execute(&table_ddl(kind, names), [])?;
    if index_values {
        if let Some(ddl) = value_index_ddl(kind, names) {
            conn.execute(&ddl, [])?;
        }
    }
    tracing::debug!(
        table = %names.table,
        kind = kind.as_str(),
        index_values,
        "Container table ready"
    );
    Ok(())
}

/// List the user tables in a store file, in name order.
pub fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name ASC",
    )?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
