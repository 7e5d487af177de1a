//! Append-only JSONL journal of everything a run touched.
//!
//! One line per source read, write call and verification count, all sharing
//! the run's id. The journal is an audit trail: failing to append to it is
//! logged and never stops the migration.

use crate::core::error;
use crate::core::time;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct JournalEvent {
    pub ts: String,
    pub event_id: String,
    pub run_id: String,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub detail: JsonValue,
}

pub struct RunJournal {
    path: Option<PathBuf>,
    run_id: String,
}

impl RunJournal {
    pub fn new(path: Option<&Path>) -> Self {
        Self {
            path: path.map(Path::to_path_buf),
            run_id: time::new_event_id(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record an event; append failures are downgraded to a warning.
    pub fn record(&self, op: &str, table: Option<&str>, status: &str, detail: JsonValue) {
        if let Err(e) = self.append(op, table, status, detail) {
            tracing::warn!(error = %e, op, "could not append to run journal");
        }
    }

    fn append(
        &self,
        op: &str,
        table: Option<&str>,
        status: &str,
        detail: JsonValue,
    ) -> Result<(), error::MigrateError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let ev = JournalEvent {
            ts: time::now_iso(),
            event_id: time::new_event_id(),
            run_id: self.run_id.clone(),
            op: op.to_string(),
            table: table.map(|s| s.to_string()),
            status: status.to_string(),
            detail,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(f, "{}", serde_json::to_string(&ev)?)?;
        Ok(())
    }
}

/// Read every event in a journal file, oldest first.
pub fn read_events(path: &Path) -> Result<Vec<JournalEvent>, error::MigrateError> {
    let content = fs::read_to_string(path)?;
    let mut out = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        out.push(serde_json::from_str(line)?);
    }
    Ok(out)
}
