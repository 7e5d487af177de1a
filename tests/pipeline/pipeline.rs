use chrono::{DateTime, Utc};
use kanban_migrate::core::journal::{RunJournal, read_events};
use kanban_migrate::destination::{Destination, MemoryDestination};
use kanban_migrate::pipeline::report::{SkipReason, StageStatus};
use kanban_migrate::pipeline::source::SourceDir;
use kanban_migrate::pipeline::transform::TransformContext;
use kanban_migrate::pipeline::{RunOptions, run_migration, run_migration_at};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::{TempDir, tempdir};

fn write_json(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_vec_pretty(value).expect("encode"))
        .expect("write fixture");
}

fn fixed_ctx() -> TransformContext {
    TransformContext::at(
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00.000Z")
            .expect("timestamp")
            .with_timezone(&Utc),
    )
}

/// A V1 data directory with every file present.
fn full_fixture() -> TempDir {
    let tmp = tempdir().expect("tempdir");
    let dir = tmp.path();
    write_json(
        dir,
        "clients.json",
        &json!([
            {"id": "c1", "name": "Acme", "rate": 120, "projects": [
                {"id": "p1", "name": "Website"},
                {"id": "p2", "name": "Brand", "currency": "USD", "locationId": "loc-1"}
            ]},
            {"id": "c2", "name": "Globex", "email": "ops@globex.test"}
        ]),
    );
    write_json(
        dir,
        "tasks.json",
        &json!([
            {"id": "t1", "title": "Design", "clientId": "c1", "projectId": "p1", "subtasks": [{"id": "s", "done": false}]},
            {"id": 1717171717171u64, "title": "Numeric id"}
        ]),
    );
    let activity: Vec<Value> = (0..25)
        .map(|i| json!({"id": format!("a{i}"), "type": "task_created", "description": "x", "timestamp": "2024-01-01T00:00:00Z"}))
        .collect();
    write_json(dir, "activity.json", &Value::Array(activity));
    write_json(
        dir,
        "progress-logs.json",
        &json!([{"id": "l1", "taskId": "t1", "taskTitle": "Design", "status": "done", "actualMinutes": 45}]),
    );
    write_json(
        dir,
        "schedule.json",
        &json!([
            {"id": "sch1", "taskId": "t1", "taskTitle": "Design", "start": "09:00", "end": "10:00"},
            {"taskId": "t2", "taskTitle": "Numeric id", "start": "11:00", "end": "12:00"}
        ]),
    );
    write_json(
        dir,
        "revenue.json",
        &json!({"entries": [{"id": "r1", "clientId": "c1", "clientName": "Acme", "amount": 1500, "month": 5, "year": 2024}]}),
    );
    write_json(
        dir,
        "analytics.json",
        &json!({"totalTasksCompleted": 12, "productivityByHour": {"9": 3}}),
    );
    write_json(
        dir,
        "achievements.json",
        &json!({"totalPoints": 340, "level": 4, "unlocked": ["first-task"]}),
    );
    tmp
}

fn small_chunks() -> RunOptions {
    RunOptions {
        chunk_size: 10,
        ..RunOptions::default()
    }
}

#[test]
fn full_run_migrates_every_entity() {
    let tmp = full_fixture();
    let mut dest = MemoryDestination::new();
    let report = run_migration_at(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &small_chunks(),
        &fixed_ctx(),
    );

    assert!(!report.has_failures(), "{:#?}", report.stages);
    assert_eq!(report.exit_code(false), 0);
    assert!(
        report
            .stages
            .iter()
            .all(|s| s.status() == StageStatus::Migrated)
    );

    let verification = report.verification.as_ref().expect("verification ran");
    assert_eq!(verification.count_of("clients"), Some(2));
    assert_eq!(verification.count_of("projects"), Some(2));
    assert_eq!(verification.count_of("tasks"), Some(2));
    assert_eq!(verification.count_of("activity_log"), Some(25));
    assert_eq!(verification.count_of("progress_logs"), Some(1));
    assert_eq!(verification.count_of("schedule"), Some(2));
    assert_eq!(verification.count_of("revenue"), Some(1));
    assert_eq!(verification.count_of("analytics"), Some(1));
    assert_eq!(verification.count_of("achievements"), Some(1));

    let client = dest.row("clients", "c1").expect("client row");
    assert!(client.get("projects").is_none());
    assert_eq!(client["rate_type"], "project");
    assert_eq!(client["created_at"], "2025-06-01T12:00:00.000Z");

    let project = dest.row("projects", "p2").expect("project row");
    assert_eq!(project["client_id"], "c1");
    assert_eq!(project["currency"], "USD");
    assert_eq!(project["location_id"], "loc-1");

    let numeric = dest.row("tasks", "1717171717171").expect("numeric id task");
    assert_eq!(numeric["assignee"], "Brandon");
    assert_eq!(numeric["tags"], "");

    let analytics = dest.row("analytics", "singleton").expect("analytics");
    assert_eq!(
        analytics["priority_distribution"],
        json!({"low": 0, "medium": 0, "high": 0, "urgent": 0})
    );
    let achievements = dest.row("achievements", "singleton").expect("achievements");
    assert_eq!(achievements["level"], 4);
    assert_eq!(achievements["last_updated"], "2025-06-01T12:00:00.000Z");

    let generated = dest
        .rows("schedule")
        .into_iter()
        .find(|r| r["task_id"] == "t2")
        .expect("schedule without id");
    assert!(
        generated["id"]
            .as_str()
            .expect("id")
            .starts_with("schedule-1748779200000-")
    );
}

#[test]
fn rerun_is_idempotent() {
    let tmp = full_fixture();
    let source = SourceDir::new(tmp.path());
    let mut dest = MemoryDestination::new();
    let ctx = fixed_ctx();

    run_migration_at(&mut dest, &source, &RunJournal::disabled(), &small_chunks(), &ctx);
    let first_clients = dest.rows("clients").into_iter().cloned().collect::<Vec<_>>();
    let first_activity = dest.count("activity_log").expect("count");

    let report = run_migration_at(&mut dest, &source, &RunJournal::disabled(), &small_chunks(), &ctx);
    assert!(!report.has_failures());
    assert_eq!(dest.count("activity_log").expect("count"), first_activity);
    assert_eq!(dest.count("clients").expect("count"), 2);
    let second_clients = dest.rows("clients").into_iter().cloned().collect::<Vec<_>>();
    assert_eq!(first_clients, second_clients);
    // Schedule rows with generated ids are the one exception: a new id per run.
    assert_eq!(dest.count("schedule").expect("count"), 3);
}

#[test]
fn activity_log_is_chunked_and_other_tables_are_not() {
    let tmp = tempdir().expect("tempdir");
    let activity: Vec<Value> = (0..2500).map(|i| json!({"id": format!("a{i}")})).collect();
    write_json(tmp.path(), "activity.json", &Value::Array(activity));
    let tasks: Vec<Value> = (0..2500).map(|i| json!({"id": format!("t{i}")})).collect();
    write_json(tmp.path(), "tasks.json", &Value::Array(tasks));

    let mut dest = MemoryDestination::new();
    dest.fail_upsert_call("activity_log", 2, "Payload too large");
    let report = run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &RunOptions::default(),
    );

    let sizes: Vec<usize> = dest
        .calls_for("activity_log")
        .iter()
        .map(|c| c.records)
        .collect();
    assert_eq!(sizes, vec![1000, 1000, 500]);
    assert_eq!(dest.calls_for("tasks").len(), 1);

    let activity = report.stage("activity_log").expect("stage");
    assert_eq!(activity.status(), StageStatus::Partial);
    assert_eq!(activity.written(), 1500);
    assert_eq!(activity.failed(), 1000);
    assert_eq!(report.exit_code(false), 2);
    assert_eq!(report.exit_code(true), 0);
}

#[test]
fn missing_and_empty_files_leave_tables_untouched() {
    let tmp = tempdir().expect("tempdir");
    write_json(tmp.path(), "tasks.json", &json!([]));
    write_json(tmp.path(), "revenue.json", &json!({"entries": []}));

    let mut dest = MemoryDestination::new();
    dest.upsert("tasks", &[json!({"id": "existing"})], "id")
        .expect("seed");

    let report = run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &RunOptions::default(),
    );

    assert_eq!(report.stage("tasks").expect("tasks").skip, Some(SkipReason::Empty));
    assert_eq!(report.stage("revenue").expect("revenue").skip, Some(SkipReason::Empty));
    assert_eq!(
        report.stage("schedule").expect("schedule").skip,
        Some(SkipReason::MissingFile)
    );
    assert_eq!(dest.calls().len(), 1, "only the seed write");
    assert_eq!(dest.count("tasks").expect("count"), 1);
    assert_eq!(report.exit_code(false), 0);
}

#[test]
fn corrupt_file_fails_its_stage_only() {
    let tmp = full_fixture();
    fs::write(tmp.path().join("tasks.json"), "[{\"id\": \"t1\",").expect("corrupt");

    let mut dest = MemoryDestination::new();
    let report = run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &small_chunks(),
    );

    let tasks = report.stage("tasks").expect("tasks");
    assert!(matches!(tasks.skip, Some(SkipReason::Unreadable(_))));
    assert_eq!(tasks.status(), StageStatus::Failed);
    assert_eq!(
        report.stage("activity_log").expect("activity").status(),
        StageStatus::Migrated
    );
    assert_eq!(dest.count("tasks").expect("count"), 0);
    assert_eq!(report.exit_code(false), 2);
}

#[test]
fn rejected_records_are_reported_and_the_rest_migrate() {
    let tmp = tempdir().expect("tempdir");
    write_json(
        tmp.path(),
        "progress-logs.json",
        &json!([{"id": "l1"}, "not a record", {"taskId": "t9"}, {"id": "l4"}]),
    );
    let mut dest = MemoryDestination::new();
    let report = run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &RunOptions::default(),
    );
    let logs = report.stage("progress_logs").expect("stage");
    assert_eq!(logs.found, 4);
    assert_eq!(logs.prepared, 2);
    assert_eq!(logs.rejected.len(), 2);
    assert_eq!(logs.status(), StageStatus::Partial);
    assert_eq!(dest.count("progress_logs").expect("count"), 2);
    assert_eq!(report.exit_code(false), 2);
}

#[test]
fn failed_write_does_not_stop_later_entities() {
    let tmp = full_fixture();
    let mut dest = MemoryDestination::new();
    dest.drop_table("tasks");

    let report = run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &small_chunks(),
    );

    let tasks = report.stage("tasks").expect("tasks");
    assert_eq!(tasks.status(), StageStatus::Failed);
    let error = tasks.chunks[0].error.as_deref().expect("error detail");
    assert!(error.contains("does not exist"), "{error}");
    assert_eq!(
        report.stage("achievements").expect("achievements").status(),
        StageStatus::Migrated
    );

    let verification = report.verification.as_ref().expect("verification");
    let tasks_count = verification
        .counts
        .iter()
        .find(|c| c.table == "tasks")
        .expect("tasks count");
    assert!(tasks_count.error.is_some());
    assert_eq!(verification.errors(), 1);
}

#[test]
fn dry_run_issues_no_writes() {
    let tmp = full_fixture();
    let mut dest = MemoryDestination::new();
    let report = run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &RunOptions {
            dry_run: true,
            ..RunOptions::default()
        },
    );
    assert!(dest.calls().is_empty());
    assert_eq!(report.stage("projects").expect("projects").prepared, 2);
    assert_eq!(report.stage("activity_log").expect("activity").prepared, 25);
    assert_eq!(report.total_written(), 0);
    assert!(
        report
            .stages
            .iter()
            .all(|s| s.status() == StageStatus::DryRun)
    );
}

#[test]
fn journal_records_reads_writes_and_counts() {
    let tmp = full_fixture();
    let journal_path = tmp.path().join("out/migration.events.jsonl");
    let journal = RunJournal::new(Some(&journal_path));
    let mut dest = MemoryDestination::new();

    run_migration(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &journal,
        &small_chunks(),
    );

    let events = read_events(&journal_path).expect("journal");
    assert!(events.iter().all(|e| e.run_id == journal.run_id()));
    assert_eq!(events.first().expect("first").op, "run.start");
    assert_eq!(events.last().expect("last").op, "run.finish");

    let reads: Vec<_> = events.iter().filter(|e| e.op == "source.read").collect();
    assert_eq!(reads.len(), 8);
    let clients_read = reads
        .iter()
        .find(|e| e.table.as_deref() == Some("clients"))
        .expect("clients read");
    assert_eq!(
        clients_read.detail["sha256"].as_str().expect("digest").len(),
        64
    );

    let activity_writes = events
        .iter()
        .filter(|e| e.op == "write" && e.table.as_deref() == Some("activity_log"))
        .count();
    assert_eq!(activity_writes, 3);
    assert_eq!(events.iter().filter(|e| e.op == "verify.count").count(), 9);
}

#[test]
fn loosely_typed_fields_do_not_drop_records() {
    let tmp = tempdir().expect("tempdir");
    write_json(
        tmp.path(),
        "clients.json",
        &json!([
            {"id": "c1", "name": "Acme", "projects": [
                {"id": "p1", "name": "Website"},
                {"id": "p2", "name": "Brand", "value": "5000"}
            ]},
            {"id": "c2", "name": "Globex", "rate": "150"},
            {"id": "c3", "name": "Initech", "createdAt": 1717171717171u64}
        ]),
    );
    write_json(
        tmp.path(),
        "tasks.json",
        &json!([{"id": "t1", "title": "Design", "estimatedMinutes": "30"}]),
    );
    let mut dest = MemoryDestination::new();
    let report = run_migration_at(
        &mut dest,
        &SourceDir::new(tmp.path()),
        &RunJournal::disabled(),
        &RunOptions::default(),
        &fixed_ctx(),
    );

    assert!(!report.has_failures(), "{:#?}", report.stages);
    assert_eq!(dest.count("clients").expect("count"), 3);
    assert_eq!(dest.count("projects").expect("count"), 2);
    assert_eq!(dest.count("tasks").expect("count"), 1);
    assert_eq!(dest.row("clients", "c2").expect("c2")["rate"], "150");
    assert_eq!(
        dest.row("clients", "c3").expect("c3")["created_at"],
        1717171717171u64
    );
    assert_eq!(dest.row("projects", "p2").expect("p2")["value"], "5000");
    assert_eq!(dest.row("tasks", "t1").expect("t1")["estimated_minutes"], "30");
}
