//! Dump command implementation.

use anyhow::Result;
use serde_json::Value;
use sqlite_object::{LineFormat, SqliteDict, SqliteList, SqliteSet};
use std::io::Write;

use super::Target;
use crate::{DumpFormat, Kind};

pub fn run(
    target: &Target,
    kind: Kind,
    name: Option<String>,
    format: DumpFormat,
    field_separator: String,
) -> Result<()> {
    let config = target.existing(kind, name)?;
    let line_format = LineFormat {
        field_separator,
        ..LineFormat::default()
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match kind {
        Kind::Dict => {
            let dict: SqliteDict<Value, Value> = SqliteDict::open(config)?;
            match format {
                DumpFormat::Json => dict.write_json(&mut out)?,
                DumpFormat::Lines => dict.write_lines(&mut out, &line_format)?,
            }
            dict.close()?;
        }
        Kind::List => {
            let list: SqliteList<Value> = SqliteList::open(config)?;
            match format {
                DumpFormat::Json => list.write_json(&mut out)?,
                DumpFormat::Lines => list.write_lines(&mut out, &line_format)?,
            }
            list.close()?;
        }
        Kind::Set => {
            let set: SqliteSet<Value> = SqliteSet::open(config)?;
            match format {
                DumpFormat::Json => set.write_json(&mut out)?,
                DumpFormat::Lines => set.write_lines(&mut out, &line_format)?,
            }
            set.close()?;
        }
    }

    if format == DumpFormat::Json {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
