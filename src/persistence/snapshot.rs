use crate::domain::{entry_id, ActiveTimer, CheckEntry, Task, TaskId, TimeEntry, UserPreferences};
use crate::error::{Result, TrackerError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const SNAPSHOT_VERSION: &str = "1.0";

/// The full persisted state: what export produces and import consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub data: SnapshotData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub tasks: HashMap<TaskId, Task>,
    pub time_entries: HashMap<String, TimeEntry>,
    pub check_entries: HashMap<String, CheckEntry>,
    pub active_timers: HashMap<TaskId, ActiveTimer>,
    pub user_preferences: UserPreferences,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(export_date: DateTime<Utc>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            export_date,
            data: SnapshotData::default(),
        }
    }

    /// Structural validation, run at the repository boundary so malformed
    /// data never reaches the engine. Checks shape and referential
    /// integrity: link symmetry, no cycles, no orphan ledger rows, no
    /// stored non-positive minutes.
    pub fn validate(&self) -> Result<()> {
        if self.version.is_empty() {
            return fail("snapshot version is empty");
        }

        let tasks = &self.data.tasks;

        for (key, task) in tasks {
            if *key != task.id {
                return fail(format!("task map key {} does not match task id {}", key, task.id));
            }
            if task.name.trim().is_empty() {
                return fail(format!("task {} has an empty name", task.id));
            }
            if let Some(parent_id) = task.parent_id {
                let Some(parent) = tasks.get(&parent_id) else {
                    return fail(format!("task {} references missing parent {}", task.id, parent_id));
                };
                if !parent.children.contains(&task.id) {
                    return fail(format!(
                        "task {} is not listed in the children of its parent {}",
                        task.id, parent_id
                    ));
                }
            }
            for child_id in &task.children {
                let Some(child) = tasks.get(child_id) else {
                    return fail(format!("task {} lists missing child {}", task.id, child_id));
                };
                if child.parent_id != Some(task.id) {
                    return fail(format!(
                        "child {} of task {} does not point back to it",
                        child_id, task.id
                    ));
                }
            }
        }

        // Walking up from every task must terminate at a root
        for task in tasks.values() {
            let mut seen: HashSet<TaskId> = HashSet::new();
            let mut current = task;
            while let Some(parent_id) = current.parent_id {
                if !seen.insert(current.id) {
                    return fail(format!("parent cycle involving task {}", task.id));
                }
                current = &tasks[&parent_id];
            }
        }

        for (key, entry) in &self.data.time_entries {
            if *key != entry.id || entry.id != entry_id(entry.task_id, entry.date) {
                return fail(format!("time entry key mismatch: {}", key));
            }
            if !tasks.contains_key(&entry.task_id) {
                return fail(format!("time entry {} references missing task", entry.id));
            }
            if entry.minutes <= 0.0 {
                return fail(format!("time entry {} has non-positive minutes", entry.id));
            }
        }

        for (key, entry) in &self.data.check_entries {
            if *key != entry.id || entry.id != entry_id(entry.task_id, entry.date) {
                return fail(format!("check entry key mismatch: {}", key));
            }
            if !tasks.contains_key(&entry.task_id) {
                return fail(format!("check entry {} references missing task", entry.id));
            }
        }

        for (key, timer) in &self.data.active_timers {
            if *key != timer.task_id {
                return fail(format!("timer key {} does not match task id {}", key, timer.task_id));
            }
            if !tasks.contains_key(&timer.task_id) {
                return fail(format!("timer references missing task {}", timer.task_id));
            }
            if timer.elapsed_ms < 0 {
                return fail(format!("timer for task {} has negative elapsed time", timer.task_id));
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|err| TrackerError::Validation(format!("malformed snapshot: {}", err)))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

fn fail(message: impl Into<String>) -> Result<()> {
    Err(TrackerError::Validation(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackingType;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn linked_pair() -> (Snapshot, Task, Task) {
        let mut snapshot = Snapshot::empty();
        let mut parent = Task::new("Parent".to_string(), None, TrackingType::Manual, 0);
        let child = Task::new("Child".to_string(), Some(parent.id), TrackingType::Manual, 0);
        parent.children.push(child.id);
        snapshot.data.tasks.insert(parent.id, parent.clone());
        snapshot.data.tasks.insert(child.id, child.clone());
        (snapshot, parent, child)
    }

    #[test]
    fn test_empty_snapshot_is_valid() {
        assert!(Snapshot::empty().validate().is_ok());
    }

    #[test]
    fn test_valid_tree_round_trips() {
        let (mut snapshot, _, child) = linked_pair();
        let entry = TimeEntry::new(child.id, date(2024, 1, 10), 2.5);
        snapshot.data.time_entries.insert(entry.id.clone(), entry);

        let json = snapshot.to_json().unwrap();
        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn test_wire_field_names() {
        let snapshot = Snapshot::empty();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"exportDate\""));
        assert!(json.contains("\"timeEntries\""));
        assert!(json.contains("\"checkEntries\""));
        assert!(json.contains("\"activeTimers\""));
        assert!(json.contains("\"userPreferences\""));
    }

    #[test]
    fn test_rejects_dangling_parent() {
        let mut snapshot = Snapshot::empty();
        let task = Task::new("A".to_string(), Some(uuid::Uuid::new_v4()), TrackingType::Manual, 0);
        snapshot.data.tasks.insert(task.id, task);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_rejects_asymmetric_links() {
        let (mut snapshot, _, child) = linked_pair();
        // Break the back-link: child no longer points at its parent
        snapshot.data.tasks.get_mut(&child.id).unwrap().parent_id = None;
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_rejects_parent_cycle() {
        let mut snapshot = Snapshot::empty();
        let mut a = Task::new("A".to_string(), None, TrackingType::Manual, 0);
        let mut b = Task::new("B".to_string(), Some(a.id), TrackingType::Manual, 0);
        a.children.push(b.id);
        b.children.push(a.id);
        a.parent_id = Some(b.id);
        snapshot.data.tasks.insert(a.id, a);
        snapshot.data.tasks.insert(b.id, b);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_rejects_orphan_time_entry() {
        let mut snapshot = Snapshot::empty();
        let entry = TimeEntry::new(uuid::Uuid::new_v4(), date(2024, 1, 1), 5.0);
        snapshot.data.time_entries.insert(entry.id.clone(), entry);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_rejects_stored_zero_minutes() {
        let (mut snapshot, _, child) = linked_pair();
        let entry = TimeEntry::new(child.id, date(2024, 1, 1), 0.0);
        snapshot.data.time_entries.insert(entry.id.clone(), entry);
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_task_name() {
        let mut snapshot = Snapshot::empty();
        let task = Task::new("x".to_string(), None, TrackingType::Manual, 0);
        let id = task.id;
        snapshot.data.tasks.insert(id, task);
        snapshot.data.tasks.get_mut(&id).unwrap().name = "  ".to_string();
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Snapshot::from_json("{\"version\": 1}");
        assert!(matches!(err, Err(TrackerError::Validation(_))));
    }
}
