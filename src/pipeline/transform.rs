//! Legacy record -> destination row mapping.
//!
//! "Absent" means what it meant to the V1 app: missing, `null`, `""`, `0`
//! and `false` all take the column default. Arrays and objects are always
//! present, even when empty. Fields without a default pass through as-is.

use crate::core::schemas::SINGLETON_ID;
use crate::core::time;
use crate::pipeline::records::*;
use crate::pipeline::report::Rejection;
use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue, json};

/// Per-run values every mapping shares. Built once so that one run stamps
/// every defaulted timestamp with the same instant.
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub now: DateTime<Utc>,
    pub now_iso: String,
}

impl TransformContext {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            now_iso: time::format_iso(now),
        }
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of mapping one collection.
#[derive(Debug, Clone)]
pub struct Transformed<R> {
    pub rows: Vec<R>,
    pub rejected: Vec<Rejection>,
}

impl<R> Default for Transformed<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

// ===== default rules =====

trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for JsonValue {
    fn is_truthy(&self) -> bool {
        match self {
            JsonValue::Null => false,
            JsonValue::Bool(b) => *b,
            JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            JsonValue::String(s) => s.is_truthy(),
            JsonValue::Array(_) | JsonValue::Object(_) => true,
        }
    }
}

fn truthy<T: Truthy + Clone>(value: &Option<T>) -> Option<T> {
    value.as_ref().filter(|v| v.is_truthy()).cloned()
}

/// The source value when truthy, otherwise `null`.
fn optional(value: &Option<JsonValue>) -> JsonValue {
    truthy(value).unwrap_or(JsonValue::Null)
}

/// The source value as written, `null` when absent.
fn pass(value: &Option<JsonValue>) -> JsonValue {
    value.clone().unwrap_or(JsonValue::Null)
}

fn text_or(value: &Option<JsonValue>, default: &str) -> JsonValue {
    truthy(value).unwrap_or_else(|| JsonValue::String(default.to_string()))
}

fn number_or(value: &Option<JsonValue>, default: i64) -> JsonValue {
    truthy(value).unwrap_or_else(|| JsonValue::from(default))
}

fn list_or(value: &Option<JsonValue>) -> JsonValue {
    truthy(value).unwrap_or_else(|| JsonValue::Array(Vec::new()))
}

fn map_or(value: &Option<JsonValue>, default: impl FnOnce() -> JsonValue) -> JsonValue {
    truthy(value).unwrap_or_else(default)
}

fn required_id(id: &Option<String>) -> Result<String, String> {
    truthy(id).ok_or_else(|| "record has no id".to_string())
}

fn default_priority_distribution() -> JsonValue {
    json!({"low": 0, "medium": 0, "high": 0, "urgent": 0})
}

// ===== per-entity mappings =====

pub fn client_row(ctx: &TransformContext, c: &LegacyClient) -> Result<ClientRow, String> {
    Ok(ClientRow {
        id: required_id(&c.id)?,
        name: pass(&c.name),
        email: text_or(&c.email, ""),
        phone: text_or(&c.phone, ""),
        company: text_or(&c.company, ""),
        rate: number_or(&c.rate, 0),
        rate_type: text_or(&c.rate_type, "project"),
        status: text_or(&c.status, "active"),
        notes: text_or(&c.notes, ""),
        tags: list_or(&c.tags),
        contacts: list_or(&c.contacts),
        locations: list_or(&c.locations),
        total_revenue: number_or(&c.total_revenue, 0),
        created_at: text_or(&c.created_at, &ctx.now_iso),
        updated_at: text_or(&c.updated_at, &ctx.now_iso),
    })
}

pub fn project_row(
    ctx: &TransformContext,
    client_id: &str,
    p: &LegacyProject,
) -> Result<ProjectRow, String> {
    Ok(ProjectRow {
        id: required_id(&p.id)?,
        client_id: client_id.to_string(),
        name: pass(&p.name),
        description: text_or(&p.description, ""),
        status: text_or(&p.status, "active"),
        value: number_or(&p.value, 0),
        currency: text_or(&p.currency, "AUD"),
        deadline: optional(&p.deadline),
        location_id: optional(&p.location_id),
        created_at: text_or(&p.created_at, &ctx.now_iso),
        updated_at: text_or(&p.updated_at, &ctx.now_iso),
    })
}

pub fn task_row(ctx: &TransformContext, t: &LegacyTask) -> Result<TaskRow, String> {
    Ok(TaskRow {
        id: required_id(&t.id)?,
        title: pass(&t.title),
        description: text_or(&t.description, ""),
        priority: text_or(&t.priority, "medium"),
        status: text_or(&t.status, "todo"),
        assignee: text_or(&t.assignee, "Brandon"),
        estimated_minutes: optional(&t.estimated_minutes),
        deadline: optional(&t.deadline),
        subtasks: list_or(&t.subtasks),
        tags: text_or(&t.tags, ""),
        client_id: optional(&t.client_id),
        project_id: optional(&t.project_id),
        calendar_event_id: optional(&t.calendar_event_id),
        scheduled_start: optional(&t.scheduled_start),
        scheduled_end: optional(&t.scheduled_end),
        time_tracked: number_or(&t.time_tracked, 0),
        time_sessions: list_or(&t.time_sessions),
        created_at: text_or(&t.created_at, &ctx.now_iso),
        updated_at: text_or(&t.updated_at, &ctx.now_iso),
        completed_at: optional(&t.completed_at),
    })
}

pub fn activity_row(a: &LegacyActivity) -> Result<ActivityRow, String> {
    Ok(ActivityRow {
        id: required_id(&a.id)?,
        kind: pass(&a.kind),
        description: pass(&a.description),
        metadata: map_or(&a.metadata, || json!({})),
        timestamp: pass(&a.timestamp),
    })
}

pub fn progress_log_row(l: &LegacyProgressLog) -> Result<ProgressLogRow, String> {
    Ok(ProgressLogRow {
        id: required_id(&l.id)?,
        task_id: pass(&l.task_id),
        task_title: pass(&l.task_title),
        status: pass(&l.status),
        comment: text_or(&l.comment, ""),
        actual_minutes: optional(&l.actual_minutes),
        timestamp: pass(&l.timestamp),
    })
}

/// Schedule entries saved without an id get a synthesized one.
pub fn schedule_row(ctx: &TransformContext, s: &LegacyScheduleEntry) -> ScheduleRow {
    ScheduleRow {
        id: truthy(&s.id).unwrap_or_else(|| time::new_schedule_id(ctx.now)),
        task_id: pass(&s.task_id),
        task_title: pass(&s.task_title),
        start_time: pass(&s.start),
        end_time: pass(&s.end),
        created_at: text_or(&s.created_at, &ctx.now_iso),
    }
}

pub fn revenue_row(r: &LegacyRevenueEntry) -> Result<RevenueRow, String> {
    Ok(RevenueRow {
        id: required_id(&r.id)?,
        client_id: optional(&r.client_id),
        client_name: pass(&r.client_name),
        project_id: optional(&r.project_id),
        project_name: optional(&r.project_name),
        amount: pass(&r.amount),
        month: pass(&r.month),
        year: pass(&r.year),
        date: pass(&r.date),
        notes: text_or(&r.notes, ""),
        kind: text_or(&r.kind, "project"),
    })
}

pub fn analytics_row(ctx: &TransformContext, a: &LegacyAnalytics) -> AnalyticsRow {
    AnalyticsRow {
        id: SINGLETON_ID.to_string(),
        total_tasks_completed: number_or(&a.total_tasks_completed, 0),
        average_completion_time: number_or(&a.average_completion_time, 0),
        on_time_completion_rate: number_or(&a.on_time_completion_rate, 0),
        productivity_by_hour: map_or(&a.productivity_by_hour, || json!({})),
        priority_distribution: map_or(&a.priority_distribution, default_priority_distribution),
        last_updated: text_or(&a.last_updated, &ctx.now_iso),
    }
}

/// `last_updated` is the migration instant regardless of the source.
pub fn achievements_row(ctx: &TransformContext, a: &LegacyAchievements) -> AchievementsRow {
    AchievementsRow {
        id: SINGLETON_ID.to_string(),
        total_points: number_or(&a.total_points, 0),
        level: number_or(&a.level, 1),
        unlocked: list_or(&a.unlocked),
        last_updated: ctx.now_iso.clone(),
    }
}

// ===== collections =====

/// Map every record, collecting the ones that cannot become a row.
pub fn transform_all<L, R>(records: &[L], map: impl Fn(&L) -> Result<R, String>) -> Transformed<R> {
    let mut out = Transformed::default();
    for (index, record) in records.iter().enumerate() {
        match map(record) {
            Ok(row) => out.rows.push(row),
            Err(reason) => out.rejected.push(Rejection {
                index,
                id: None,
                reason,
            }),
        }
    }
    out
}

/// Clients plus the projects embedded in them, flattened in client order.
/// Each project is decoded on its own; a client without an id takes its
/// projects down with it.
pub fn transform_clients(
    ctx: &TransformContext,
    clients: &[LegacyClient],
) -> (Transformed<ClientRow>, Transformed<ProjectRow>) {
    let mut client_rows = Transformed::default();
    let mut project_rows = Transformed::default();
    let mut project_index = 0usize;

    for (index, client) in clients.iter().enumerate() {
        let embedded = client.embedded_projects();
        match client_row(ctx, client) {
            Ok(row) => {
                for raw in embedded {
                    let mapped = serde_json::from_value::<LegacyProject>(raw.clone())
                        .map_err(|e| e.to_string())
                        .and_then(|project| project_row(ctx, &row.id, &project));
                    match mapped {
                        Ok(p) => project_rows.rows.push(p),
                        Err(reason) => project_rows.rejected.push(Rejection {
                            index: project_index,
                            id: raw_id(raw),
                            reason: format!("{} (client {})", reason, row.id),
                        }),
                    }
                    project_index += 1;
                }
                client_rows.rows.push(row);
            }
            Err(reason) => {
                for raw in embedded {
                    project_rows.rejected.push(Rejection {
                        index: project_index,
                        id: raw_id(raw),
                        reason: "owning client has no id".to_string(),
                    });
                    project_index += 1;
                }
                client_rows.rejected.push(Rejection {
                    index,
                    id: None,
                    reason,
                });
            }
        }
    }
    (client_rows, project_rows)
}

/// Projects embedded in client elements that could not be decoded at all.
/// Indices continue after the `first_index` projects of decoded clients.
pub fn orphaned_projects(raw_clients: &[JsonValue], first_index: usize) -> Vec<Rejection> {
    raw_clients
        .iter()
        .flat_map(|client| embedded_projects(client.get("projects")))
        .enumerate()
        .map(|(offset, raw)| Rejection {
            index: first_index + offset,
            id: raw_id(raw),
            reason: "owning client could not be read".to_string(),
        })
        .collect()
}

/// Number of projects embedded across all decoded clients.
pub fn embedded_project_count(clients: &[LegacyClient]) -> usize {
    clients.iter().map(|c| c.embedded_projects().len()).sum()
}
