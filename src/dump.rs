//! Bulk text dumps.
//!
//! Two shapes:
//! - a single JSON literal for the whole container (object for dicts,
//!   array for lists and sets)
//! - one record per line, with pluggable field and line separators

use serde::Serialize;
use std::io::Write;

use crate::error::{Error, Result};

/// Separators used by line-delimited dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFormat {
    /// Written between a key and its value.
    pub field_separator: String,
    /// Written after every record, including the last.
    pub line_separator: String,
}

impl Default for LineFormat {
    fn default() -> Self {
        Self {
            field_separator: "\t".into(),
            line_separator: "\n".into(),
        }
    }
}

impl LineFormat {
    pub fn new(field_separator: impl Into<String>, line_separator: impl Into<String>) -> Self {
        Self {
            field_separator: field_separator.into(),
            line_separator: line_separator.into(),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Encode(e.to_string()))
}

/// Incremental writer for a JSON object.
pub struct JsonObjectWriter<'w, W: Write> {
    out: &'w mut W,
    first: bool,
}

impl<'w, W: Write> JsonObjectWriter<'w, W> {
    pub fn begin(out: &'w mut W) -> Result<Self> {
        out.write_all(b"{")?;
        Ok(Self { out, first: true })
    }

    /// Write one member. Keys that are not JSON strings are written as a
    /// string holding their JSON text.
    pub fn entry<K, V>(&mut self, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        if !self.first {
            self.out.write_all(b",")?;
        }
        self.first = false;

        let key = match serde_json::to_value(key).map_err(|e| Error::Encode(e.to_string()))? {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        self.out.write_all(to_json(&key)?.as_bytes())?;
        self.out.write_all(b":")?;
        self.out.write_all(to_json(value)?.as_bytes())?;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        self.out.write_all(b"}")?;
        Ok(())
    }
}

/// Incremental writer for a JSON array.
pub struct JsonArrayWriter<'w, W: Write> {
    out: &'w mut W,
    first: bool,
}

impl<'w, W: Write> JsonArrayWriter<'w, W> {
    pub fn begin(out: &'w mut W) -> Result<Self> {
        out.write_all(b"[")?;
        Ok(Self { out, first: true })
    }

    pub fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        if !self.first {
            self.out.write_all(b",")?;
        }
        self.first = false;
        self.out.write_all(to_json(value)?.as_bytes())?;
        Ok(())
    }

    pub fn finish(self) -> Result<()> {
        self.out.write_all(b"]")?;
        Ok(())
    }
}

/// Write `key<field separator>value<line separator>`.
pub fn write_pair_line<W: Write>(
    out: &mut W,
    format: &LineFormat,
    key: &str,
    value: &str,
) -> Result<()> {
    out.write_all(key.as_bytes())?;
    out.write_all(format.field_separator.as_bytes())?;
    out.write_all(value.as_bytes())?;
    out.write_all(format.line_separator.as_bytes())?;
    Ok(())
}

/// Write `element<line separator>`.
pub fn write_line<W: Write>(out: &mut W, format: &LineFormat, element: &str) -> Result<()> {
    out.write_all(element.as_bytes())?;
    out.write_all(format.line_separator.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_writer_stringifies_keys() {
        let mut out = Vec::new();
        let mut writer = JsonObjectWriter::begin(&mut out).unwrap();
        writer.entry("a", &1).unwrap();
        writer.entry(&7, &vec![1, 2]).unwrap();
        writer.entry(&("x", 1), &serde_json::Value::Null).unwrap();
        writer.finish().unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"a":1,"7":[1,2],"[\"x\",1]":null}"#
        );
    }

    #[test]
    fn test_empty_writers() {
        let mut out = Vec::new();
        JsonObjectWriter::begin(&mut out).unwrap().finish().unwrap();
        JsonArrayWriter::begin(&mut out).unwrap().finish().unwrap();
        assert_eq!(out, b"{}[]");
    }

    #[test]
    fn test_array_writer() {
        let mut out = Vec::new();
        let mut writer = JsonArrayWriter::begin(&mut out).unwrap();
        writer.element("w").unwrap();
        writer.element(&3.5).unwrap();
        writer.finish().unwrap();
        assert_eq!(out, br#"["w",3.5]"#);
    }

    #[test]
    fn test_line_writers_use_separators() {
        let format = LineFormat::new("=", ";");
        let mut out = Vec::new();
        write_pair_line(&mut out, &format, "k", "v").unwrap();
        write_line(&mut out, &format, "e").unwrap();
        assert_eq!(out, b"k=v;e;");
    }
}
