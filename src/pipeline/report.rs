//! Structured results of each pipeline stage.
//!
//! Stages never print; they return these values and `render` turns them
//! into console output.

use serde::Serialize;
use std::path::PathBuf;

/// A source element that could not become a destination row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    /// Position (0-based) in the collection it was rejected from: the file
    /// for undecodable elements, the decoded records for unmappable ones.
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: String,
}

/// Outcome of one upsert call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkReport {
    /// 1-based chunk number.
    pub index: usize,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    MissingFile,
    Unreadable(String),
    Empty,
    /// Projects when the clients source was skipped.
    ParentSkipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Migrated,
    Partial,
    Failed,
    Skipped,
    DryRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub table: String,
    pub source: String,
    /// Elements found in the source (decodable or not).
    pub found: usize,
    /// Rows produced by the transformer.
    pub prepared: usize,
    pub rejected: Vec<Rejection>,
    pub chunks: Vec<ChunkReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<SkipReason>,
    pub dry_run: bool,
}

impl StageReport {
    pub fn new(table: &str, source: &str) -> Self {
        Self {
            table: table.to_string(),
            source: source.to_string(),
            found: 0,
            prepared: 0,
            rejected: Vec::new(),
            chunks: Vec::new(),
            skip: None,
            dry_run: false,
        }
    }

    pub fn skipped(table: &str, source: &str, reason: SkipReason) -> Self {
        let mut r = Self::new(table, source);
        r.skip = Some(reason);
        r
    }

    pub fn written(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| c.succeeded())
            .map(|c| c.records)
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.chunks
            .iter()
            .filter(|c| !c.succeeded())
            .map(|c| c.records)
            .sum()
    }

    pub fn status(&self) -> StageStatus {
        if let Some(skip) = &self.skip {
            return match skip {
                SkipReason::Unreadable(_) => StageStatus::Failed,
                _ => StageStatus::Skipped,
            };
        }
        if self.dry_run {
            return StageStatus::DryRun;
        }
        let troubled = self.failed() > 0 || !self.rejected.is_empty();
        match (self.written(), troubled) {
            (_, false) => StageStatus::Migrated,
            (0, true) => StageStatus::Failed,
            (_, true) => StageStatus::Partial,
        }
    }

    /// Whether this stage makes the run a partial failure.
    pub fn is_failure(&self) -> bool {
        matches!(self.status(), StageStatus::Failed | StageStatus::Partial)
            || !self.rejected.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub counts: Vec<TableCount>,
}

impl VerificationReport {
    pub fn count_of(&self, table: &str) -> Option<u64> {
        self.counts
            .iter()
            .find(|c| c.table == table)
            .and_then(|c| c.count)
    }

    pub fn errors(&self) -> usize {
        self.counts.iter().filter(|c| c.error.is_some()).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub run_id: String,
    pub source_dir: PathBuf,
    pub target: String,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationReport>,
    pub dry_run: bool,
}

impl MigrationReport {
    pub fn stage(&self, table: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.table == table)
    }

    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(StageReport::is_failure)
    }

    pub fn total_written(&self) -> usize {
        self.stages.iter().map(StageReport::written).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.stages.iter().map(StageReport::failed).sum()
    }

    /// 0 on a clean run; 2 when anything failed unless partial runs are
    /// accepted. Verification errors never change the code.
    pub fn exit_code(&self, allow_partial: bool) -> i32 {
        if self.has_failures() && !allow_partial {
            2
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablePresence {
    pub table: String,
    pub exists: bool,
    /// Rows returned by the one-row probe read (0 or 1).
    pub rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_error: Option<String>,
    pub tables: Vec<TablePresence>,
}

impl SchemaReport {
    pub fn reachable(&self) -> bool {
        self.probe_error.is_none()
    }

    pub fn missing(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| !t.exists)
            .map(|t| t.table.as_str())
            .collect()
    }
}
