use crate::calendar::Month;
use crate::domain::{format_cell, tree_connector, TrackingType};
use crate::engine::TrackerEngine;

const NAME_WIDTH: usize = 34;
const CELL_WIDTH: usize = 7;

fn pad_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        let truncated: String = name.chars().take(NAME_WIDTH - 1).collect();
        format!("{}…", truncated)
    } else {
        format!("{:<width$}", name, width = NAME_WIDTH)
    }
}

fn pad_cell(value: &str) -> String {
    format!("{:>width$}", value, width = CELL_WIDTH)
}

/// Render the tracked tree for one month as a plain-text grid: a header
/// row of day numbers, one row per visible task, and a closing row of
/// per-day totals. Weekends are marked with a dot under the day number.
pub fn render_month_grid(engine: &TrackerEngine, month: Month) -> String {
    let days = month.days();
    let mut out = String::new();

    out.push_str(&format!("{}\n\n", month));

    // Day-number header and weekend markers
    out.push_str(&pad_name("TASK"));
    for day in &days {
        out.push_str(&pad_cell(&day.day_of_month.to_string()));
    }
    out.push_str(&pad_cell("TOTAL"));
    out.push('\n');

    out.push_str(&" ".repeat(NAME_WIDTH));
    for day in &days {
        out.push_str(&pad_cell(if day.is_weekend() { "." } else { "" }));
    }
    out.push('\n');

    // One row per visible task
    let hide_completed = engine.preferences().hide_completed;
    for row in engine.visible_rows(hide_completed) {
        let task = match engine.task(row.task_id) {
            Some(task) => task,
            None => continue,
        };

        let label = if row.depth == 0 {
            task.name.clone()
        } else {
            format!(
                "{}{} {}",
                "  ".repeat(row.depth - 1),
                tree_connector(row.is_last),
                task.name
            )
        };
        out.push_str(&pad_name(&label));

        if task.tracking_type.is_check_based() {
            for day in &days {
                let checked = engine
                    .check_entry(task.id, day.date)
                    .map(|entry| entry.is_checked)
                    .unwrap_or(false);
                out.push_str(&pad_cell(if checked { "x" } else { "" }));
            }
            let (checked, total) = engine.check_summary(task.id, month);
            out.push_str(&pad_cell(&format!("{}/{}", checked, total)));
        } else {
            for day in &days {
                let cell = engine
                    .time_entry(task.id, day.date)
                    .map(|entry| format_cell(entry.minutes, task.tracking_type))
                    .unwrap_or_default();
                out.push_str(&pad_cell(&cell));
            }
            let total = engine
                .task_month_total_formatted(task.id, month)
                .unwrap_or_default();
            out.push_str(&pad_cell(&total));
        }
        out.push('\n');
    }

    // Per-day sums across all tasks
    out.push_str(&pad_name("DAY TOTAL"));
    let mut month_total = 0.0;
    for (_, total) in engine.day_totals(month) {
        month_total += total;
        let cell = if total > 0.0 {
            format_cell(total, TrackingType::Manual)
        } else {
            String::new()
        };
        out.push_str(&pad_cell(&cell));
    }
    out.push_str(&pad_cell(&format_cell(month_total, TrackingType::Manual)));
    out.push('\n');

    out
}

/// Render the task hierarchy as an indented list with connectors, ids
/// abbreviated to their first segment for addressing from the CLI
pub fn render_task_list(engine: &TrackerEngine, hide_completed: bool) -> String {
    let mut out = String::new();
    for row in engine.visible_rows(hide_completed) {
        let task = match engine.task(row.task_id) {
            Some(task) => task,
            None => continue,
        };
        let short_id = task.id.to_string()[..8].to_string();
        let indent = if row.depth == 0 {
            String::new()
        } else {
            format!("{}{} ", "  ".repeat(row.depth - 1), tree_connector(row.is_last))
        };
        let marker = if engine.is_fully_completed(task.id) {
            " [done]"
        } else {
            ""
        };
        out.push_str(&format!(
            "{}  {}{} ({}){}\n",
            short_id,
            indent,
            task.name,
            task.tracking_type.to_tag(),
            marker
        ));
    }
    out
}
