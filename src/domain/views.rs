use super::enums::TrackingType;
use super::task::{Task, TaskId};
use crate::calendar::{format_clock, format_minutes_decimal, minutes_to_millis};

/// A flattened row for rendering the visible-task list
#[derive(Debug, Clone)]
pub struct VisibleRow {
    /// Index in the flattened list
    pub index: usize,
    /// Depth in the tree (0 = root)
    pub depth: usize,
    /// Whether this is the last visible sibling of its parent
    pub is_last: bool,
    pub task_id: TaskId,
}

/// Annotate an already-filtered, pre-order task sequence with depth and
/// last-sibling flags. Depth comes from each task's parent chain, so the
/// sequence does not need to carry structure of its own.
pub fn flatten_visible<'a, F>(tasks: &[&'a Task], depth_of: F) -> Vec<VisibleRow>
where
    F: Fn(&Task) -> usize,
{
    let mut rows: Vec<VisibleRow> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| VisibleRow {
            index,
            depth: depth_of(task),
            is_last: false,
            task_id: task.id,
        })
        .collect();

    // A row is the last of its sibling group when no later row reaches its
    // depth again before the traversal climbs above it
    for i in 0..rows.len() {
        let depth = rows[i].depth;
        let mut is_last = true;
        for row in &rows[i + 1..] {
            if row.depth < depth {
                break;
            }
            if row.depth == depth {
                is_last = false;
                break;
            }
        }
        rows[i].is_last = is_last;
    }

    rows
}

/// Tree connector for nested rows
pub fn tree_connector(is_last: bool) -> &'static str {
    if is_last {
        "└─"
    } else {
        "├─"
    }
}

/// Format a per-cell or per-month minutes value according to the task's
/// tracking type: timer-fed values render as a clock, manual values as a
/// plain number with one decimal when fractional.
pub fn format_cell(minutes: f64, tracking_type: TrackingType) -> String {
    match tracking_type {
        TrackingType::Automatic => format_clock(minutes_to_millis(minutes)),
        _ => format_minutes_decimal(minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell_automatic_uses_clock() {
        assert_eq!(format_cell(1.5, TrackingType::Automatic), "1:30");
        assert_eq!(format_cell(90.0, TrackingType::Automatic), "1:30:00");
    }

    #[test]
    fn test_format_cell_manual_uses_decimal() {
        assert_eq!(format_cell(2.5, TrackingType::Manual), "2.5");
        assert_eq!(format_cell(3.0, TrackingType::Manual), "3");
    }

    #[test]
    fn test_flatten_visible_marks_last_siblings() {
        use std::collections::HashMap;

        let root = Task::new("Root".to_string(), None, TrackingType::Manual, 0);
        let mut child_a = Task::new("A".to_string(), Some(root.id), TrackingType::Manual, 0);
        let child_b = Task::new("B".to_string(), Some(root.id), TrackingType::Manual, 1);
        let grandchild = Task::new("A1".to_string(), Some(child_a.id), TrackingType::Manual, 0);
        child_a.children.push(grandchild.id);

        let depths: HashMap<TaskId, usize> = [
            (root.id, 0),
            (child_a.id, 1),
            (child_b.id, 1),
            (grandchild.id, 2),
        ]
        .into_iter()
        .collect();

        // Pre-order: root, A, A1, B
        let rows = flatten_visible(&[&root, &child_a, &grandchild, &child_b], |task| {
            depths[&task.id]
        });

        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_last); // only root
        assert!(!rows[1].is_last); // A has sibling B after its subtree
        assert!(rows[2].is_last); // A1 is the only grandchild
        assert!(rows[3].is_last); // B closes the group
        assert_eq!(rows[2].depth, 2);
    }

    #[test]
    fn test_tree_connector() {
        assert_eq!(tree_connector(false), "├─");
        assert_eq!(tree_connector(true), "└─");
    }
}
