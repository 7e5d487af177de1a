//! Loader -> transformer -> writer, once per entity, then verification.
//!
//! Stages run in a fixed order: clients (and their embedded projects),
//! tasks, activity log, progress logs, schedule, revenue, analytics,
//! achievements. Nothing below a configuration error aborts the run; every
//! problem ends up in the returned `MigrationReport`.

pub mod entity;
pub mod records;
pub mod report;
pub mod schema_check;
pub mod source;
pub mod transform;
pub mod verify;
pub mod writer;

use crate::core::config::DEFAULT_CHUNK_SIZE;
use crate::core::journal::RunJournal;
use crate::core::output;
use crate::core::schemas::PROJECTS;
use crate::destination::Destination;
use entity::{SourceKind, WriteMode, table_label};
use records::*;
use report::{ChunkReport, MigrationReport, Rejection, SkipReason, StageReport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use source::{Decoded, FileFingerprint, SourceDir, SourceLoad};
use transform::{TransformContext, Transformed};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub chunk_size: usize,
    /// Load and transform only; no write calls.
    pub dry_run: bool,
    /// Count rows in every table after the writes.
    pub verify: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            dry_run: false,
            verify: true,
        }
    }
}

/// Run the whole migration against `dest`.
pub fn run_migration(
    dest: &mut dyn Destination,
    source: &SourceDir,
    journal: &RunJournal,
    options: &RunOptions,
) -> MigrationReport {
    run_migration_at(dest, source, journal, options, &TransformContext::new())
}

/// Same as `run_migration` with a caller-supplied run timestamp.
pub fn run_migration_at(
    dest: &mut dyn Destination,
    source: &SourceDir,
    journal: &RunJournal,
    options: &RunOptions,
    ctx: &TransformContext,
) -> MigrationReport {
    let target = dest.label();
    tracing::info!(
        run_id = journal.run_id(),
        source = %source.root().display(),
        destination = %target,
        dry_run = options.dry_run,
        "migration started"
    );
    journal.record(
        "run.start",
        None,
        "success",
        json!({
            "source_dir": source.root().display().to_string(),
            "target": target,
            "dry_run": options.dry_run,
            "chunk_size": options.chunk_size,
        }),
    );

    let mut stages = Vec::with_capacity(9);
    {
        let mut runner = StageRunner {
            dest: &mut *dest,
            source,
            journal,
            options,
        };

        let (clients, projects) = runner.clients_and_projects(ctx);
        stages.push(clients);
        stages.push(projects);

        stages.push(runner.collection::<LegacyTask, _>(SourceKind::Tasks, |ds| {
            transform::transform_all(ds, |t| transform::task_row(ctx, t))
        }));
        stages.push(
            runner.collection::<LegacyActivity, _>(SourceKind::ActivityLog, |ds| {
                transform::transform_all(ds, transform::activity_row)
            }),
        );
        stages.push(
            runner.collection::<LegacyProgressLog, _>(SourceKind::ProgressLogs, |ds| {
                transform::transform_all(ds, transform::progress_log_row)
            }),
        );
        stages.push(
            runner.collection::<LegacyScheduleEntry, _>(SourceKind::Schedule, |ds| {
                transform::transform_all(ds, |s| Ok(transform::schedule_row(ctx, s)))
            }),
        );
        stages.push(
            runner.collection::<LegacyRevenueEntry, _>(SourceKind::Revenue, |ds| {
                transform::transform_all(ds, transform::revenue_row)
            }),
        );
        stages.push(
            runner.singleton::<LegacyAnalytics, _>(SourceKind::Analytics, |a| {
                transform::analytics_row(ctx, a)
            }),
        );
        stages.push(
            runner.singleton::<LegacyAchievements, _>(SourceKind::Achievements, |a| {
                transform::achievements_row(ctx, a)
            }),
        );
    }

    let verification = options.verify.then(|| verify::verify_tables(dest, journal));

    let report = MigrationReport {
        run_id: journal.run_id().to_string(),
        source_dir: source.root().to_path_buf(),
        target,
        stages,
        verification,
        dry_run: options.dry_run,
    };

    let status = if report.has_failures() { "partial" } else { "success" };
    journal.record(
        "run.finish",
        None,
        status,
        json!({
            "written": report.total_written(),
            "failed": report.total_failed(),
        }),
    );
    tracing::info!(
        written = report.total_written(),
        failed = report.total_failed(),
        status,
        "migration finished"
    );
    report
}

struct StageRunner<'a> {
    dest: &'a mut dyn Destination,
    source: &'a SourceDir,
    journal: &'a RunJournal,
    options: &'a RunOptions,
}

impl StageRunner<'_> {
    fn record_read(&self, kind: SourceKind, fp: &FileFingerprint, found: usize, rejected: usize) {
        self.journal.record(
            "source.read",
            Some(kind.table()),
            "success",
            json!({
                "file": kind.file_name(),
                "bytes": fp.bytes,
                "sha256": fp.sha256,
                "records": found,
                "rejected": rejected,
            }),
        );
    }

    fn skip<T>(&self, kind: SourceKind, load: SourceLoad<T>) -> StageReport {
        let table = kind.table();
        let reason = match load {
            SourceLoad::Missing => {
                tracing::info!(table, file = kind.file_name(), "no {} to migrate", table_label(table));
                self.journal.record(
                    "source.read",
                    Some(table),
                    "missing",
                    json!({ "file": kind.file_name() }),
                );
                SkipReason::MissingFile
            }
            SourceLoad::Unreadable(msg) => {
                let msg = output::compact_error(&msg);
                tracing::warn!(table, error = %msg, "could not load {}", kind.file_name());
                self.journal.record(
                    "source.read",
                    Some(table),
                    "error",
                    json!({ "file": kind.file_name(), "error": msg }),
                );
                SkipReason::Unreadable(msg)
            }
            SourceLoad::Loaded(_) => SkipReason::Empty,
        };
        StageReport::skipped(table, kind.file_name(), reason)
    }

    /// Load a collection, or the stage report explaining why there is
    /// nothing to write.
    fn load<T: DeserializeOwned>(&self, kind: SourceKind) -> Result<Decoded<T>, StageReport> {
        match self.source.load_collection::<T>(kind) {
            SourceLoad::Loaded(decoded) => {
                if let Some(fp) = &decoded.file {
                    self.record_read(kind, fp, decoded.found(), decoded.rejected.len());
                }
                if decoded.found() == 0 {
                    tracing::info!(table = kind.table(), "no {} to migrate", table_label(kind.table()));
                    return Err(StageReport::skipped(
                        kind.table(),
                        kind.file_name(),
                        SkipReason::Empty,
                    ));
                }
                tracing::info!(
                    table = kind.table(),
                    found = decoded.found(),
                    "found {}",
                    output::plural(decoded.found(), "record", "records")
                );
                Ok(decoded)
            }
            other => Err(self.skip(kind, other)),
        }
    }

    fn collection<T, R>(
        &mut self,
        kind: SourceKind,
        map: impl FnOnce(&[T]) -> Transformed<R>,
    ) -> StageReport
    where
        T: DeserializeOwned,
        R: Serialize,
    {
        let decoded = match self.load::<T>(kind) {
            Ok(d) => d,
            Err(skipped) => return skipped,
        };
        let found = decoded.found();
        let transformed = map(&decoded.records);
        self.write_stage(
            kind.table(),
            kind.file_name(),
            kind.write_mode(),
            found,
            decoded.rejected,
            transformed,
        )
    }

    fn singleton<T, R>(&mut self, kind: SourceKind, map: impl FnOnce(&T) -> R) -> StageReport
    where
        T: DeserializeOwned,
        R: Serialize,
    {
        match self.source.load_object::<T>(kind) {
            SourceLoad::Loaded((legacy, fp)) => {
                self.record_read(kind, &fp, 1, 0);
                let row = map(&legacy);
                self.write_stage(
                    kind.table(),
                    kind.file_name(),
                    WriteMode::Whole,
                    1,
                    Vec::new(),
                    Transformed {
                        rows: vec![row],
                        rejected: Vec::new(),
                    },
                )
            }
            other => self.skip(kind, other),
        }
    }

    fn clients_and_projects(&mut self, ctx: &TransformContext) -> (StageReport, StageReport) {
        let kind = SourceKind::Clients;
        let decoded = match self.load::<LegacyClient>(kind) {
            Ok(d) => d,
            Err(skipped) => {
                let projects =
                    StageReport::skipped(PROJECTS, kind.file_name(), SkipReason::ParentSkipped);
                return (skipped, projects);
            }
        };

        let decoded_projects = transform::embedded_project_count(&decoded.records);
        let orphans = transform::orphaned_projects(&decoded.rejected_items, decoded_projects);
        let embedded = decoded_projects + orphans.len();
        let found = decoded.found();
        let (clients, projects) = transform::transform_clients(ctx, &decoded.records);

        let client_report = self.write_stage(
            kind.table(),
            kind.file_name(),
            WriteMode::Whole,
            found,
            decoded.rejected,
            clients,
        );

        // Projects are written even when the clients write failed.
        let project_report = if embedded == 0 {
            tracing::info!(table = PROJECTS, "no projects embedded in clients");
            StageReport::skipped(PROJECTS, kind.file_name(), SkipReason::Empty)
        } else {
            tracing::info!(table = PROJECTS, found = embedded, "migrating {}", output::plural(embedded, "project", "projects"));
            self.write_stage(
                PROJECTS,
                kind.file_name(),
                WriteMode::Whole,
                embedded,
                orphans,
                projects,
            )
        };
        (client_report, project_report)
    }

    fn write_stage<R: Serialize>(
        &mut self,
        table: &str,
        source: &str,
        mode: WriteMode,
        found: usize,
        mut rejected: Vec<Rejection>,
        transformed: Transformed<R>,
    ) -> StageReport {
        rejected.extend(transformed.rejected);
        for r in &rejected {
            tracing::warn!(table, index = r.index, id = r.id.as_deref().unwrap_or("-"), reason = %r.reason, "record rejected");
        }

        let mut report = StageReport::new(table, source);
        report.found = found;
        report.prepared = transformed.rows.len();
        report.rejected = rejected;
        report.dry_run = self.options.dry_run;

        if transformed.rows.is_empty() || self.options.dry_run {
            if self.options.dry_run {
                tracing::info!(table, records = report.prepared, "dry run, nothing written");
            }
            return report;
        }

        report.chunks = match writer::to_values(&transformed.rows) {
            Ok(values) => writer::write_records(
                &mut *self.dest,
                table,
                &values,
                mode,
                self.options.chunk_size,
                self.journal,
            ),
            Err(e) => vec![ChunkReport {
                index: 1,
                records: transformed.rows.len(),
                error: Some(output::compact_error(&e.to_string())),
            }],
        };
        report
    }
}
