use super::check_ledger::CheckLedger;
use super::time_ledger::TimeLedger;
use super::tree::TaskTree;
use crate::calendar::{CalendarDay, Month};
use crate::domain::{flatten_visible, format_cell, TaskId, VisibleRow};

/// Visible-task list annotated with depth and last-sibling flags for
/// rendering tree connectors
pub fn visible_rows(tree: &TaskTree, hide_completed: bool) -> Vec<VisibleRow> {
    let tasks = tree.visible_tasks(hide_completed);
    flatten_visible(&tasks, |task| tree.depth_of(task))
}

/// Month total for one task, formatted per its tracking type:
/// timer-fed tasks as a clock, manual tasks as a plain number.
/// None when the task is unknown.
pub fn task_month_total(
    tree: &TaskTree,
    time: &TimeLedger,
    task_id: TaskId,
    month: Month,
) -> Option<f64> {
    tree.get(task_id)?;
    Some(time.task_month_total(task_id, month))
}

pub fn task_month_total_formatted(
    tree: &TaskTree,
    time: &TimeLedger,
    task_id: TaskId,
    month: Month,
) -> Option<String> {
    let task = tree.get(task_id)?;
    let total = time.task_month_total(task_id, month);
    Some(format_cell(total, task.tracking_type))
}

/// Per-day sums across all tasks, one entry for each day of the month
/// (the grid header row)
pub fn day_totals(time: &TimeLedger, month: Month) -> Vec<(CalendarDay, f64)> {
    month
        .days()
        .into_iter()
        .map(|day| {
            let total = time.day_total(day.date);
            (day, total)
        })
        .collect()
}

/// Completion rollup delegation
pub fn is_fully_completed(tree: &TaskTree, task_id: TaskId) -> bool {
    tree.is_fully_completed(task_id)
}

/// (checked days, days in month) for unique/habit rows
pub fn check_summary(checks: &CheckLedger, task_id: TaskId, month: Month) -> (usize, usize) {
    (
        checks.checked_count_in_month(task_id, month),
        month.day_count() as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{TaskPatch, TrackingType};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_tree() -> (TaskTree, TaskId, TaskId) {
        let mut tree = TaskTree::new();
        let root = tree
            .prepare_create("Projects", None, TrackingType::Manual)
            .unwrap();
        let root_id = root.id;
        tree.insert(root);
        let child = tree
            .prepare_create("Research", Some(root_id), TrackingType::Automatic)
            .unwrap();
        let child_id = child.id;
        tree.insert(child);
        (tree, root_id, child_id)
    }

    #[test]
    fn test_visible_rows_depth() {
        let (mut tree, root_id, child_id) = sample_tree();
        tree.toggle_expand(root_id).unwrap();

        let rows = visible_rows(&tree, false);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].depth, 0);
        assert_eq!(rows[1].depth, 1);
        assert_eq!(rows[1].task_id, child_id);
        assert!(rows[1].is_last);
    }

    #[test]
    fn test_month_total_formats_per_tracking_type() {
        let (tree, root_id, child_id) = sample_tree();
        let mut time = TimeLedger::new();
        let january = Month::parse("2024-01").unwrap();

        time.upsert(root_id, date(2024, 1, 10), 2.5);
        time.upsert(child_id, date(2024, 1, 10), 90.0);

        assert_eq!(
            task_month_total_formatted(&tree, &time, root_id, january),
            Some("2.5".to_string())
        );
        assert_eq!(
            task_month_total_formatted(&tree, &time, child_id, january),
            Some("1:30:00".to_string())
        );
        assert_eq!(
            task_month_total_formatted(&tree, &time, uuid::Uuid::new_v4(), january),
            None
        );
    }

    #[test]
    fn test_day_totals_covers_whole_month() {
        let (_, root_id, _) = sample_tree();
        let mut time = TimeLedger::new();
        time.upsert(root_id, date(2024, 2, 5), 60.0);

        let totals = day_totals(&time, Month::parse("2024-02").unwrap());
        assert_eq!(totals.len(), 29);
        assert_eq!(totals[4].1, 60.0);
        assert_eq!(totals[0].1, 0.0);
    }

    #[test]
    fn test_fully_completed_delegation() {
        let (mut tree, root_id, child_id) = sample_tree();
        assert!(!is_fully_completed(&tree, root_id));
        tree.apply_patch(child_id, &TaskPatch::completed(true)).unwrap();
        assert!(is_fully_completed(&tree, root_id));
    }
}
