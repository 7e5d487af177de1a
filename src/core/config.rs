//! Layered run configuration.
//!
//! Precedence, lowest first: built-in defaults, `kanban-migrate.toml`,
//! environment (after `.env` is loaded), command-line flags.

use crate::core::error::MigrateError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATA_DIR: &str = "../kanban/data";
pub const DEFAULT_CONFIG_FILE: &str = "kanban-migrate.toml";
pub const DEFAULT_JOURNAL_FILE: &str = "migration.events.jsonl";
pub const DEFAULT_SQLITE_PATH: &str = "kanban.db";
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_URL: &str = "SUPABASE_URL";
pub const ENV_SERVICE_KEY: &str = "SUPABASE_SERVICE_KEY";
pub const ENV_DATA_DIR: &str = "KANBAN_DATA_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    /// Hosted table store over HTTPS (PostgREST).
    Rest,
    /// Local SQLite file with the same tables.
    Sqlite,
}

/// Contents of the optional TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub destination: Option<DestinationKind>,
    pub supabase_url: Option<String>,
    pub sqlite_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub journal: Option<PathBuf>,
}

/// Values supplied on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub destination: Option<DestinationKind>,
    pub sqlite_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub journal: Option<PathBuf>,
    pub no_journal: bool,
}

#[derive(Debug, Clone)]
pub enum DestinationConfig {
    Rest {
        url: String,
        service_key: String,
        timeout: Duration,
    },
    Sqlite {
        path: PathBuf,
    },
}

impl DestinationConfig {
    /// Human-readable target, never including credentials.
    pub fn label(&self) -> String {
        match self {
            DestinationConfig::Rest { url, .. } => url.clone(),
            DestinationConfig::Sqlite { path } => format!("sqlite://{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub data_dir: PathBuf,
    pub destination: DestinationConfig,
    pub chunk_size: usize,
    pub journal: Option<PathBuf>,
}

/// Load the TOML file. An explicitly requested file must exist; the default
/// file is optional.
pub fn load_file_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<FileConfig, MigrateError> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(MigrateError::ConfigError(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let p = working_dir.join(DEFAULT_CONFIG_FILE);
            if !p.exists() {
                return Ok(FileConfig::default());
            }
            p
        }
    };
    let content = fs::read_to_string(&path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Merge file, environment and overrides into a validated config.
///
/// `env` is a lookup so callers can pass the process environment or a
/// fixed map in tests.
pub fn resolve(
    file: FileConfig,
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<MigrateConfig, MigrateError> {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let data_dir = overrides
        .data_dir
        .clone()
        .or_else(|| non_empty(ENV_DATA_DIR).map(PathBuf::from))
        .or(file.data_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let chunk_size = overrides
        .chunk_size
        .or(file.chunk_size)
        .unwrap_or(DEFAULT_CHUNK_SIZE);
    if chunk_size == 0 {
        return Err(MigrateError::ConfigError(
            "chunk size must be at least 1".to_string(),
        ));
    }

    let journal = if overrides.no_journal {
        None
    } else {
        Some(
            overrides
                .journal
                .clone()
                .or(file.journal)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_JOURNAL_FILE)),
        )
    };

    let kind = overrides
        .destination
        .or(file.destination)
        .unwrap_or(DestinationKind::Rest);

    let destination = match kind {
        DestinationKind::Sqlite => DestinationConfig::Sqlite {
            path: overrides
                .sqlite_path
                .clone()
                .or(file.sqlite_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH)),
        },
        DestinationKind::Rest => {
            let url = non_empty(ENV_URL).or(file.supabase_url.filter(|u| !u.trim().is_empty()));
            let service_key = non_empty(ENV_SERVICE_KEY);
            let (Some(url), Some(service_key)) = (url, service_key) else {
                return Err(MigrateError::ConfigError(format!(
                    "Missing Supabase credentials: set {} and {} in .env",
                    ENV_URL, ENV_SERVICE_KEY
                )));
            };
            let url = url.trim().trim_end_matches('/').to_string();
            reqwest::Url::parse(&url).map_err(|e| {
                MigrateError::ConfigError(format!("{} is not a valid URL: {}", ENV_URL, e))
            })?;
            DestinationConfig::Rest {
                url,
                service_key: service_key.trim().to_string(),
                timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            }
        }
    };

    Ok(MigrateConfig {
        data_dir,
        destination,
        chunk_size,
        journal,
    })
}

/// Full resolution against the real process environment. Loads `.env`
/// from the working directory first; a missing `.env` is fine.
pub fn load(overrides: &ConfigOverrides, working_dir: &Path) -> Result<MigrateConfig, MigrateError> {
    match dotenvy::from_path(working_dir.join(".env")) {
        Ok(()) => tracing::debug!("loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(MigrateError::ConfigError(format!("failed to read .env: {}", e))),
    }
    let file = load_file_config(overrides.config_path.as_deref(), working_dir)?;
    resolve(file, overrides, |key| std::env::var(key).ok())
}
