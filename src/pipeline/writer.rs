//! Batched, idempotent writes.
//!
//! Every call is an upsert on the `id` conflict key, so re-running a
//! migration overwrites rows instead of duplicating them. Chunks go out one
//! after another; a failed chunk is reported and the next one still runs.

use crate::core::error::MigrateError;
use crate::core::journal::RunJournal;
use crate::core::output;
use crate::core::schemas::CONFLICT_KEY;
use crate::destination::Destination;
use crate::pipeline::entity::WriteMode;
use crate::pipeline::report::ChunkReport;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

/// Serialize canonical rows into the JSON objects the destination takes.
pub fn to_values<T: Serialize>(rows: &[T]) -> Result<Vec<JsonValue>, MigrateError> {
    rows.iter()
        .map(|r| serde_json::to_value(r).map_err(MigrateError::from))
        .collect()
}

/// Split `len` records into `(start, end)` ranges for the given mode.
pub fn plan_chunks(len: usize, mode: WriteMode, chunk_size: usize) -> Vec<(usize, usize)> {
    if len == 0 {
        return Vec::new();
    }
    let size = match mode {
        WriteMode::Whole => len,
        WriteMode::Chunked => chunk_size.max(1),
    };
    (0..len)
        .step_by(size)
        .map(|start| (start, (start + size).min(len)))
        .collect()
}

pub fn write_records(
    dest: &mut dyn Destination,
    table: &str,
    records: &[JsonValue],
    mode: WriteMode,
    chunk_size: usize,
    journal: &RunJournal,
) -> Vec<ChunkReport> {
    let plan = plan_chunks(records.len(), mode, chunk_size);
    let total = plan.len();
    let mut reports = Vec::with_capacity(total);

    for (i, (start, end)) in plan.into_iter().enumerate() {
        let index = i + 1;
        let chunk = &records[start..end];
        let result = dest.upsert(table, chunk, CONFLICT_KEY);

        let error = match result {
            Ok(()) => {
                if total > 1 {
                    tracing::info!(table, chunk = index, of = total, records = chunk.len(), "chunk written");
                } else {
                    tracing::info!(table, records = chunk.len(), "records written");
                }
                None
            }
            Err(e) => {
                let msg = output::compact_error(&e.to_string());
                tracing::warn!(table, chunk = index, of = total, records = chunk.len(), error = %msg, "write failed");
                Some(msg)
            }
        };

        journal.record(
            "write",
            Some(table),
            if error.is_none() { "success" } else { "error" },
            json!({
                "chunk": index,
                "chunks": total,
                "records": chunk.len(),
                "error": error,
            }),
        );

        reports.push(ChunkReport {
            index,
            records: chunk.len(),
            error,
        });
    }
    reports
}
