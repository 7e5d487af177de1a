//! Terminal presentation primitives: framed headings and status lines.

use colored::{ColoredString, Colorize};
use std::env;

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxStyle {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemStatus {
    Migrated,
    Partial,
    Failed,
    Skipped,
    DryRun,
    Info,
    Pass,
    Fail,
}

impl ItemStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ItemStatus::Migrated => "✅",
            ItemStatus::Partial => "⚠️",
            ItemStatus::Failed => "💥",
            ItemStatus::Skipped => "ℹ️",
            ItemStatus::DryRun => "📝",
            ItemStatus::Info => "💡",
            ItemStatus::Pass => "✅",
            ItemStatus::Fail => "❌",
        }
    }

    fn paint(&self, s: &str) -> ColoredString {
        match self {
            ItemStatus::Migrated | ItemStatus::Pass => s.bright_green(),
            ItemStatus::Partial => s.bright_yellow(),
            ItemStatus::Failed | ItemStatus::Fail => s.bright_red(),
            ItemStatus::Skipped => s.bright_black(),
            ItemStatus::DryRun | ItemStatus::Info => s.cyan(),
        }
    }
}

pub fn terminal_width() -> usize {
    env::var("TERM_WIDTH")
        .ok()
        .and_then(|w| w.parse().ok())
        .or_else(|| env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(80)
}

fn effective_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

pub fn rule(width: usize) -> String {
    "=".repeat(width)
}

pub fn box_top(width: usize) -> String {
    format!("╔{}╗", "═".repeat(width.saturating_sub(2)))
}

pub fn box_bottom(width: usize) -> String {
    format!("╚{}╝", "═".repeat(width.saturating_sub(2)))
}

/// A framed line with `content` left-aligned; long content widens nothing
/// and simply overflows the frame.
pub fn box_row(content: &str, width: usize) -> String {
    let inner = width.saturating_sub(4);
    let pad = inner.saturating_sub(content.chars().count());
    format!("║ {}{} ║", content, " ".repeat(pad))
}

fn paint_frame(s: &str, style: BoxStyle) -> ColoredString {
    match style {
        BoxStyle::Info => s.bright_cyan(),
        BoxStyle::Success => s.bright_green(),
        BoxStyle::Warning => s.bright_yellow(),
        BoxStyle::Error => s.bright_red(),
    }
}

pub fn render_box(title: &str, lines: &[String], style: BoxStyle) {
    let width = effective_width();
    println!("{}", paint_frame(&box_top(width), style));
    println!("{}", paint_frame(&box_row(title, width), style).bold());
    for line in lines {
        println!("{}", paint_frame(&box_row(line, width), style));
    }
    println!("{}", paint_frame(&box_bottom(width), style));
}

pub fn print_section(icon: &str, title: &str) {
    println!();
    println!("{} {}", icon, title.bold());
}

pub fn print_status_line(message: &str, status: ItemStatus) {
    println!("  {} {}", status.paint(status.icon()), message.bright_white());
}

/// Secondary line under a status line (error detail, rejected rows).
pub fn print_detail(message: &str) {
    println!("     {}", message.bright_black());
}

pub fn print_steps(title: &str, steps: &[String]) {
    let width = effective_width();
    println!();
    println!("{}", rule(width));
    println!("{}", title.bold());
    println!("{}", rule(width));
    for (i, step) in steps.iter().enumerate() {
        println!("{}. {}", i + 1, step);
    }
    println!("{}", rule(width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_rows_fill_the_frame() {
        let row = box_row("Kanban V2 Data Migration", 40);
        assert_eq!(row.chars().count(), 40);
        assert!(row.starts_with("║ Kanban"));
        assert_eq!(box_top(40).chars().count(), 40);
        assert_eq!(box_bottom(40).chars().count(), 40);
    }

    #[test]
    fn overlong_content_is_kept() {
        let long = "x".repeat(80);
        assert!(box_row(&long, 40).contains(&long));
    }

    #[test]
    fn every_status_has_an_icon() {
        for s in [
            ItemStatus::Migrated,
            ItemStatus::Partial,
            ItemStatus::Failed,
            ItemStatus::Skipped,
            ItemStatus::DryRun,
            ItemStatus::Info,
            ItemStatus::Pass,
            ItemStatus::Fail,
        ] {
            assert!(!s.icon().is_empty());
        }
    }
}
