//! Compact output rendering helpers for CLI surfaces.
//!
//! Keeps command result output bounded and readable while preserving signal.
//! The engine itself never prints; only the bin consumes this module.

use colored::Colorize;

use crate::core::record::{PhaseStatus, TaskStatus};

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// One-glyph phase status marker, colored for terminals.
pub fn phase_glyph(status: PhaseStatus) -> String {
    match status {
        PhaseStatus::Pending => "·".dimmed().to_string(),
        PhaseStatus::InProgress => "▶".yellow().to_string(),
        PhaseStatus::Completed => "✔".green().to_string(),
        PhaseStatus::Failed => "✖".red().to_string(),
        PhaseStatus::Skipped => "–".dimmed().to_string(),
    }
}

pub fn task_glyph(status: TaskStatus) -> String {
    match status {
        TaskStatus::Pending => "·".dimmed().to_string(),
        TaskStatus::InProgress => "▶".yellow().to_string(),
        TaskStatus::Completed => "✔".green().to_string(),
        TaskStatus::Failed => "✖".red().to_string(),
        TaskStatus::Abandoned => "–".dimmed().to_string(),
    }
}
