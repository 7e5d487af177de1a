//! Shared timestamp/id helpers for migrated records and journal events.

use chrono::{DateTime, SecondsFormat, Utc};
use ulid::Ulid;

/// Returns the current instant as RFC 3339 with millisecond precision
/// (e.g. `2026-02-03T04:05:06.789Z`), the shape the V1 app wrote.
pub fn now_iso() -> String {
    format_iso(Utc::now())
}

pub fn format_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Synthesized id for schedule entries that were saved without one:
/// `schedule-<epoch-millis>-<9 lowercase alphanumerics>`.
pub fn new_schedule_id(at: DateTime<Utc>) -> String {
    let random = Ulid::new().to_string().to_ascii_lowercase();
    // Last 16 chars of a ULID are its random component.
    let suffix = &random[random.len() - 9..];
    format!("schedule-{}-{}", at.timestamp_millis(), suffix)
}
