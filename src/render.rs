//! Console rendering of pipeline results.

use crate::core::output;
use crate::core::tui::{self, BoxStyle, ItemStatus};
use crate::pipeline::entity::table_label;
use crate::pipeline::report::{
    MigrationReport, SchemaReport, SkipReason, StageReport, StageStatus, VerificationReport,
};
use crate::pipeline::schema_check;
use colored::Colorize;

const REJECTION_PREVIEW: usize = 3;

fn stage_icon(table: &str) -> &'static str {
    match table {
        "clients" => "📋",
        "projects" => "📂",
        "tasks" => "✅",
        "activity_log" => "📜",
        "progress_logs" => "📊",
        "schedule" => "📅",
        "revenue" => "💰",
        "analytics" => "📈",
        "achievements" => "🏆",
        _ => "•",
    }
}

pub fn banner(source: &str, target: &str, dry_run: bool) {
    let mut lines = vec![format!("📦 Source: {}", source), format!("🎯 Target: {}", target)];
    if dry_run {
        lines.push("📝 Dry run: nothing will be written".to_string());
    }
    tui::render_box("🚀 Kanban V2 Data Migration", &lines, BoxStyle::Info);
}

fn status_of(stage: &StageReport) -> ItemStatus {
    match stage.status() {
        StageStatus::Migrated => ItemStatus::Migrated,
        StageStatus::Partial => ItemStatus::Partial,
        StageStatus::Failed => ItemStatus::Failed,
        StageStatus::Skipped => ItemStatus::Skipped,
        StageStatus::DryRun => ItemStatus::DryRun,
    }
}

fn stage_line(stage: &StageReport) -> String {
    let label = table_label(&stage.table);
    match &stage.skip {
        Some(SkipReason::MissingFile) => format!("No {} to migrate ({} not found)", label, stage.source),
        Some(SkipReason::Empty) => format!("No {} to migrate", label),
        Some(SkipReason::ParentSkipped) => format!("No {} to migrate (clients skipped)", label),
        Some(SkipReason::Unreadable(_)) => format!("Could not load {}", stage.source),
        None => match stage.status() {
            StageStatus::DryRun => format!("Would migrate {} {}", stage.prepared, label),
            StageStatus::Failed if stage.chunks.is_empty() => {
                format!("No {} could be prepared", label)
            }
            StageStatus::Failed => format!("Error migrating {}", label),
            StageStatus::Partial => format!(
                "Migrated {} of {} {}",
                stage.written(),
                stage.found,
                label
            ),
            _ => format!("Migrated {} {}", stage.written(), label),
        },
    }
}

pub fn stage(stage: &StageReport) {
    tui::print_section(stage_icon(&stage.table), &format!("Migrating {}...", table_label(&stage.table)));
    if stage.skip.is_none() && stage.found > 0 {
        println!("  Found {} {}", stage.found, table_label(&stage.table));
    }

    if stage.chunks.len() > 1 {
        for chunk in &stage.chunks {
            match &chunk.error {
                None => tui::print_status_line(
                    &format!("Migrated chunk {} ({} records)", chunk.index, chunk.records),
                    ItemStatus::Migrated,
                ),
                Some(e) => {
                    tui::print_status_line(
                        &format!("Error migrating chunk {} ({} records)", chunk.index, chunk.records),
                        ItemStatus::Failed,
                    );
                    tui::print_detail(e);
                }
            }
        }
    }

    tui::print_status_line(&stage_line(stage), status_of(stage));
    if let Some(SkipReason::Unreadable(msg)) = &stage.skip {
        tui::print_detail(msg);
    }
    if stage.chunks.len() == 1 {
        if let Some(e) = &stage.chunks[0].error {
            tui::print_detail(e);
        }
    }
    if !stage.rejected.is_empty() {
        let reasons: Vec<String> = stage
            .rejected
            .iter()
            .map(|r| match &r.id {
                Some(id) => format!("#{} ({}): {}", r.index, id, r.reason),
                None => format!("#{}: {}", r.index, r.reason),
            })
            .collect();
        tui::print_detail(&format!(
            "{} rejected: {}",
            output::plural(reasons.len(), "record", "records"),
            output::preview_messages(&reasons, REJECTION_PREVIEW, 120)
        ));
    }
}

pub fn verification(report: &VerificationReport) {
    tui::print_section("🔍", "Verifying migration...");
    for c in &report.counts {
        match (&c.count, &c.error) {
            (Some(n), _) => {
                tui::print_status_line(&format!("{}: {} rows", c.table, n), ItemStatus::Pass)
            }
            (None, Some(e)) => {
                tui::print_status_line(&format!("{}: ERROR - {}", c.table, e), ItemStatus::Fail)
            }
            (None, None) => tui::print_status_line(&format!("{}: unknown", c.table), ItemStatus::Fail),
        }
    }
}

pub fn migration(report: &MigrationReport, allow_partial: bool) {
    for s in &report.stages {
        stage(s);
    }
    if let Some(v) = &report.verification {
        verification(v);
    }

    println!();
    let failed_stages: Vec<String> = report
        .stages
        .iter()
        .filter(|s| s.is_failure())
        .map(|s| s.table.clone())
        .collect();

    let totals = format!(
        "{} written, {} failed",
        output::plural(report.total_written(), "record", "records"),
        report.total_failed()
    );
    let run = format!("Run {}", report.run_id);

    if report.dry_run {
        tui::render_box("📝 Dry run complete", &[totals, run], BoxStyle::Info);
    } else if failed_stages.is_empty() {
        tui::render_box("✅ Migration completed successfully!", &[totals, run], BoxStyle::Success);
        println!("\nNext steps:");
        println!("1. Check Supabase dashboard to verify data");
        println!("2. Open public/index.html in browser to test locally");
        println!("3. Deploy to GitHub Pages: npm run deploy");
    } else {
        let title = if allow_partial {
            "⚠️  Migration finished with errors (partial run accepted)"
        } else {
            "❌ Migration finished with errors"
        };
        let style = if allow_partial { BoxStyle::Warning } else { BoxStyle::Error };
        tui::render_box(
            title,
            &[totals, format!("Failed: {}", failed_stages.join(", ")), run],
            style,
        );
    }
}

pub fn schema_report(report: &SchemaReport) {
    println!("🔌 Testing connection to {}...\n", report.target);
    if let Some(e) = &report.probe_error {
        tui::print_status_line(&format!("Connection failed: {}", e), ItemStatus::Fail);
        return;
    }
    tui::print_status_line("Connected successfully!", ItemStatus::Pass);

    tui::print_section("📊", "Checking existing tables...");
    for t in &report.tables {
        if t.exists {
            tui::print_status_line(&format!("{}: EXISTS ({} rows)", t.table, t.rows), ItemStatus::Pass);
        } else {
            tui::print_status_line(&format!("{}: NOT FOUND", t.table), ItemStatus::Fail);
        }
    }
}

pub fn manual_steps(url: Option<&str>) {
    tui::print_steps("MANUAL MIGRATION STEPS:", &schema_check::manual_steps(url));
    println!();
}

pub fn schema_applied(target: &str, tables: usize) {
    tui::print_status_line(
        &format!("Created {} tables in {}", tables, target.bright_white()),
        ItemStatus::Pass,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::{ChunkReport, Rejection};

    fn chunk(index: usize, records: usize, error: Option<&str>) -> ChunkReport {
        ChunkReport {
            index,
            records,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn partial_stage_reports_written_of_found() {
        let mut s = StageReport::new("activity_log", "activity.json");
        s.found = 2500;
        s.prepared = 2500;
        s.chunks = vec![chunk(1, 1000, None), chunk(2, 1000, Some("timeout")), chunk(3, 500, None)];
        assert_eq!(stage_line(&s), "Migrated 1500 of 2500 activity logs");
        assert_eq!(status_of(&s), ItemStatus::Partial);
    }

    #[test]
    fn nothing_prepared_vs_write_error() {
        let mut s = StageReport::new("tasks", "tasks.json");
        s.found = 1;
        s.rejected.push(Rejection {
            index: 0,
            id: None,
            reason: "record has no id".into(),
        });
        assert_eq!(stage_line(&s), "No tasks could be prepared");

        let mut s = StageReport::new("tasks", "tasks.json");
        s.chunks = vec![chunk(1, 3, Some("denied"))];
        assert_eq!(stage_line(&s), "Error migrating tasks");
    }

    #[test]
    fn skip_wording() {
        let missing = StageReport::skipped("schedule", "schedule.json", SkipReason::MissingFile);
        assert_eq!(stage_line(&missing), "No schedule entries to migrate (schedule.json not found)");
        let parent = StageReport::skipped("projects", "clients.json", SkipReason::ParentSkipped);
        assert_eq!(stage_line(&parent), "No projects to migrate (clients skipped)");
        let empty = StageReport::skipped("revenue", "revenue.json", SkipReason::Empty);
        assert_eq!(stage_line(&empty), "No revenue entries to migrate");
        let bad = StageReport::skipped("tasks", "tasks.json", SkipReason::Unreadable("eof".into()));
        assert_eq!(stage_line(&bad), "Could not load tasks.json");
        assert_eq!(status_of(&bad), ItemStatus::Failed);
    }

    #[test]
    fn clean_and_dry_runs() {
        let mut s = StageReport::new("clients", "clients.json");
        s.prepared = 2;
        s.chunks = vec![chunk(1, 2, None)];
        assert_eq!(stage_line(&s), "Migrated 2 clients");

        let mut d = StageReport::new("clients", "clients.json");
        d.prepared = 2;
        d.dry_run = true;
        assert_eq!(stage_line(&d), "Would migrate 2 clients");
    }
}
