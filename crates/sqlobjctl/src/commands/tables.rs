//! Tables command implementation.

use anyhow::Result;
use serde::Serialize;

use super::Target;
use crate::OutputFormat;

#[derive(Serialize)]
struct TablesOutput {
    tables: Vec<String>,
    total: usize,
}

pub fn run(target: &Target, format: OutputFormat) -> Result<()> {
    let tables = target.tables()?;
    let output = TablesOutput {
        total: tables.len(),
        tables,
    };

    match format {
        OutputFormat::Text => {
            if output.tables.is_empty() {
                println!("No tables found in {}.", target.path().display());
            } else {
                for table in &output.tables {
                    println!("{table}");
                }
                println!();
                println!("Total: {} table(s)", output.total);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
