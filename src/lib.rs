//! kanban-migrate: move Kanban V1 JSON data into the V2 tables.
//!
//! A one-shot tool. It reads the V1 app's JSON files, normalizes every
//! record into the fixed V2 column layout and upserts it into the hosted
//! backend, keyed on `id` so it can be re-run safely.
//!
//! # Architecture
//!
//! - **Source loader** (`pipeline::source`): one JSON file per entity; a
//!   missing or corrupt file skips the entity, never the run.
//! - **Transformer** (`pipeline::transform`): legacy camelCase records to
//!   canonical rows, with V1 defaults; projects are lifted out of clients.
//! - **Batch writer** (`pipeline::writer`): idempotent upserts, activity
//!   log in fixed-size chunks.
//! - **Verifier** (`pipeline::verify`): row count per table.
//! - **Schema check** (`pipeline::schema_check`): read-only presence check
//!   plus the manual steps for creating the hosted schema.
//!
//! All stages take `&mut dyn Destination` (`destination`): the PostgREST
//! backend, a local SQLite file, or the in-memory fake used in tests.
//!
//! # Exit codes
//!
//! - `0`: everything migrated (or `--allow-partial`)
//! - `1`: configuration error, nothing was done
//! - `2`: at least one entity failed, was unreadable or had rejected records

pub(crate) mod cli;
pub mod core;
pub mod destination;
pub mod pipeline;
pub mod render;

use crate::cli::{Cli, Command, RunCli, SchemaCli, SchemaCommand};
use crate::core::config::{self, DestinationConfig, MigrateConfig};
use crate::core::error::MigrateError;
use crate::core::journal::RunJournal;
use crate::core::{logging, schemas};
use crate::destination::SqliteDestination;
use crate::pipeline::source::SourceDir;
use crate::pipeline::{RunOptions, schema_check, verify};
use clap::Parser;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse the command line, run the command and return the process exit
/// code. Only configuration and setup failures come back as `Err`.
pub fn run() -> Result<i32, MigrateError> {
    let cli = Cli::parse();
    logging::init();

    match cli.command {
        Command::Version => {
            println!("v{}", VERSION);
            Ok(0)
        }
        Command::Schema(SchemaCli {
            command: SchemaCommand::Sql,
        }) => {
            print!("{}", schemas::POSTGRES_SCHEMA);
            Ok(0)
        }
        command => {
            let current_dir = std::env::current_dir()?;
            let config = config::load(&cli.global.overrides(), &current_dir)?;
            tracing::debug!(destination = %config.destination.label(), data_dir = %config.data_dir.display(), "configuration loaded");
            match command {
                Command::Run(args) => cmd_run(&config, &args),
                Command::Verify => cmd_verify(&config),
                Command::Schema(SchemaCli {
                    command: SchemaCommand::Check,
                }) => cmd_schema_check(&config),
                Command::Schema(SchemaCli {
                    command: SchemaCommand::Apply,
                }) => cmd_schema_apply(&config),
                Command::Version
                | Command::Schema(SchemaCli {
                    command: SchemaCommand::Sql,
                }) => Ok(0),
            }
        }
    }
}

fn rest_url(config: &MigrateConfig) -> Option<&str> {
    match &config.destination {
        DestinationConfig::Rest { url, .. } => Some(url.as_str()),
        DestinationConfig::Sqlite { .. } => None,
    }
}

fn cmd_run(config: &MigrateConfig, args: &RunCli) -> Result<i32, MigrateError> {
    let mut dest = destination::open(&config.destination)?;

    let source_label = std::path::absolute(&config.data_dir)
        .unwrap_or_else(|_| config.data_dir.clone())
        .display()
        .to_string();
    render::banner(&source_label, &config.destination.label(), args.dry_run);

    let journal = RunJournal::new(config.journal.as_deref());
    let options = RunOptions {
        chunk_size: config.chunk_size,
        dry_run: args.dry_run,
        verify: !args.skip_verify,
    };

    let report = pipeline::run_migration(
        dest.as_mut(),
        &SourceDir::new(&config.data_dir),
        &journal,
        &options,
    );
    render::migration(&report, args.allow_partial);
    if let Some(path) = journal.path() {
        println!("\n📓 Journal: {}", path.display());
    }
    Ok(report.exit_code(args.allow_partial))
}

fn cmd_verify(config: &MigrateConfig) -> Result<i32, MigrateError> {
    let mut dest = destination::open(&config.destination)?;
    let journal = RunJournal::new(config.journal.as_deref());
    let report = verify::verify_tables(dest.as_mut(), &journal);
    render::verification(&report);
    Ok(0)
}

fn cmd_schema_check(config: &MigrateConfig) -> Result<i32, MigrateError> {
    let mut dest = destination::open(&config.destination)?;
    let report = schema_check::check_schema(dest.as_mut());
    render::schema_report(&report);
    render::manual_steps(rest_url(config));
    Ok(if report.reachable() { 0 } else { 1 })
}

fn cmd_schema_apply(config: &MigrateConfig) -> Result<i32, MigrateError> {
    match &config.destination {
        DestinationConfig::Sqlite { path } => {
            let dest = SqliteDestination::open(path)?;
            dest.initialize()?;
            tracing::info!(path = %path.display(), "schema created");
            render::schema_applied(&config.destination.label(), schemas::ALL_TABLES.len());
            Ok(0)
        }
        DestinationConfig::Rest { url, .. } => {
            eprintln!("The hosted backend does not accept DDL over its table API.");
            render::manual_steps(Some(url));
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn bad_service_key_fails_before_the_run_starts() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = tmp.path().join("events.jsonl");
        let config = MigrateConfig {
            data_dir: tmp.path().to_path_buf(),
            destination: DestinationConfig::Rest {
                url: "https://abc.supabase.co".to_string(),
                service_key: "key\nwith newline".to_string(),
                timeout: Duration::from_secs(1),
            },
            chunk_size: 1000,
            journal: Some(journal.clone()),
        };
        let err = cmd_run(&config, &RunCli::default()).unwrap_err();
        assert!(matches!(err, MigrateError::ConfigError(_)));
        assert!(!journal.exists());
    }
}
