//! Get command implementation.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::Value;
use sqlite_object::{Error, SqliteDict, SqliteList};

use super::Target;
use crate::{Kind, OutputFormat};

#[derive(Serialize)]
struct GetOutput {
    table: String,
    key: Value,
    value: Value,
}

/// Parse a list index; anything but an integer is a key-type error.
pub fn parse_index(raw: &str) -> Result<isize, Error> {
    raw.trim()
        .parse::<isize>()
        .map_err(|_| Error::InvalidKeyType(format!("list index must be an integer, got '{raw}'")))
}

/// Parse a dict key: JSON when it parses, otherwise a bare string.
pub fn parse_key(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn run(
    target: &Target,
    kind: Kind,
    name: Option<String>,
    raw: &str,
    format: OutputFormat,
) -> Result<()> {
    let output = match kind {
        Kind::Dict => {
            let key = parse_key(raw);
            let dict: SqliteDict<Value, Value> = SqliteDict::open(target.existing(kind, name)?)?;
            let table = dict.table_name().to_string();
            let value = lookup(dict.get(&key), &table, raw)?;
            dict.close()?;
            GetOutput { table, key, value }
        }
        Kind::List => {
            let index = parse_index(raw)?;
            let list: SqliteList<Value> = SqliteList::open(target.existing(kind, name)?)?;
            let table = list.table_name().to_string();
            let value = lookup(list.get(index), &table, raw)?;
            list.close()?;
            GetOutput {
                table,
                key: Value::from(index),
                value,
            }
        }
        Kind::Set => bail!("get is not supported for sets; use dump instead"),
    };

    match format {
        OutputFormat::Text => println!("{}", serde_json::to_string(&output.value)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    Ok(())
}

fn lookup(result: sqlite_object::Result<Value>, table: &str, raw: &str) -> Result<Value> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.is_lookup_failure() => bail!("{table}: nothing at '{raw}' ({e})"),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("3").unwrap(), 3);
        assert_eq!(parse_index(" -1 ").unwrap(), -1);
        assert!(matches!(parse_index("1.5"), Err(Error::InvalidKeyType(_))));
        assert!(matches!(parse_index("first"), Err(Error::InvalidKeyType(_))));
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("7"), Value::from(7));
        assert_eq!(parse_key(r#""quoted""#), Value::from("quoted"));
        assert_eq!(parse_key("bare"), Value::from("bare"));
    }
}
