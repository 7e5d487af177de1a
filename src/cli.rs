//! CLI struct definitions for the kanban-migrate command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::core::config::{ConfigOverrides, DestinationKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "kanban-migrate",
    version = env!("CARGO_PKG_VERSION"),
    about = "One-time migration of Kanban V1 JSON data into the V2 Supabase backend.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Default)]
pub(crate) struct GlobalArgs {
    /// Config file (default: ./kanban-migrate.toml if present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding the V1 JSON files.
    #[clap(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Where the data goes.
    #[clap(long, value_enum, global = true)]
    pub destination: Option<DestinationKind>,
    /// SQLite file for `--destination sqlite`.
    #[clap(long, global = true)]
    pub sqlite_path: Option<PathBuf>,
    /// Records per activity-log upsert.
    #[clap(long, global = true)]
    pub chunk_size: Option<usize>,
    /// Run journal path (JSONL).
    #[clap(long, global = true)]
    pub journal: Option<PathBuf>,
    /// Do not write a run journal.
    #[clap(long, global = true, conflicts_with = "journal")]
    pub no_journal: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            data_dir: self.data_dir.clone(),
            destination: self.destination,
            sqlite_path: self.sqlite_path.clone(),
            chunk_size: self.chunk_size,
            journal: self.journal.clone(),
            no_journal: self.no_journal,
        }
    }
}

#[derive(clap::Args, Debug, Default)]
pub(crate) struct RunCli {
    /// Load and transform everything, write nothing.
    #[clap(long)]
    pub dry_run: bool,
    /// Exit 0 even when some entities failed to migrate.
    #[clap(long)]
    pub allow_partial: bool,
    /// Skip the row counts after writing.
    #[clap(long)]
    pub skip_verify: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct SchemaCli {
    #[clap(subcommand)]
    pub command: SchemaCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum SchemaCommand {
    /// Check which destination tables exist and print setup steps
    Check,
    /// Print the destination schema (schema.sql)
    Sql,
    /// Create the tables (SQLite destination only)
    Apply,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Migrate all V1 data into the destination
    Run(RunCli),
    /// Count rows in every destination table
    Verify,
    /// Destination schema helpers
    Schema(SchemaCli),
    /// Print version
    Version,
}
