//! Len command implementation.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use sqlite_object::{SqliteDict, SqliteList, SqliteSet};

use super::Target;
use crate::{Kind, OutputFormat};

#[derive(Serialize)]
struct LenOutput {
    table: String,
    len: usize,
}

pub fn run(target: &Target, kind: Kind, name: Option<String>, format: OutputFormat) -> Result<()> {
    let config = target.existing(kind, name)?;

    let output = match kind {
        Kind::Dict => {
            let dict: SqliteDict<Value, Value> = SqliteDict::open(config)?;
            let output = LenOutput {
                table: dict.table_name().to_string(),
                len: dict.len()?,
            };
            dict.close()?;
            output
        }
        Kind::List => {
            let list: SqliteList<Value> = SqliteList::open(config)?;
            let output = LenOutput {
                table: list.table_name().to_string(),
                len: list.len()?,
            };
            list.close()?;
            output
        }
        Kind::Set => {
            let set: SqliteSet<Value> = SqliteSet::open(config)?;
            let output = LenOutput {
                table: set.table_name().to_string(),
                len: set.len()?,
            };
            set.close()?;
            output
        }
    };

    match format {
        OutputFormat::Text => println!("{}", output.len),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    Ok(())
}
