//! sqlobjctl: Command-line inspector for sqlite-object stores.
//!
//! Lists container tables, reports their sizes, dumps their contents and
//! looks up single entries. Stores are always opened with `persist = true`,
//! so inspecting a file never deletes it.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line inspector for sqlite-object stores.
#[derive(Parser)]
#[command(name = "sqlobjctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the store file
    db: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: OutputFormat,

    /// Log filter directives (e.g., debug, sqlite_object=trace)
    #[arg(long, env = "SQLOBJ_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

/// Container kind as accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Dict,
    List,
    Set,
}

impl From<Kind> for sqlite_object::ContainerKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Dict => Self::Dict,
            Kind::List => Self::List,
            Kind::Set => Self::Set,
        }
    }
}

/// Dump layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    /// A single JSON object or array
    Json,
    /// One record per line
    Lines,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables in the store
    Tables,
    /// Print the number of entries in a container
    Len {
        #[arg(short, long, value_enum)]
        kind: Kind,
        /// Container name (omit for the unnamed layout)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Write a container's contents to stdout
    Dump {
        #[arg(short, long, value_enum)]
        kind: Kind,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, value_enum, default_value = "json")]
        format: DumpFormat,
        /// Separator between key and value in line dumps
        #[arg(long, default_value = "\t")]
        field_separator: String,
    },
    /// Look up one dict key or list index
    Get {
        #[arg(short, long, value_enum)]
        kind: Kind,
        #[arg(short, long)]
        name: Option<String>,
        /// Dict key (JSON or bare string) or list index
        key: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    sqlite_object::observability::tracing::init_tracing(&cli.log);

    tracing::debug!(db = %cli.db.display(), "Inspecting store");
    let target = commands::Target::new(cli.db);

    match cli.command {
        Commands::Tables => commands::tables::run(&target, cli.output)?,
        Commands::Len { kind, name } => {
            commands::len::run(&target, kind, name, cli.output)?;
        }
        Commands::Dump {
            kind,
            name,
            format,
            field_separator,
        } => {
            commands::dump::run(&target, kind, name, format, field_separator)?;
        }
        Commands::Get { kind, name, key } => {
            commands::get::run(&target, kind, name, &key, cli.output)?;
        }
    }

    Ok(())
}
