use crate::calendar::Month;
use crate::domain::{entry_id, TaskId, TimeEntry};
use chrono::NaiveDate;
use std::collections::HashMap;

/// What a time-ledger upsert did, so callers can mirror it to persistence
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    Stored(TimeEntry),
    /// Minutes were <= 0: any existing entry is gone
    Deleted,
}

/// Per-(task, day) accumulated minutes, keyed by the composite entry id
#[derive(Debug, Clone, Default)]
pub struct TimeLedger {
    entries: HashMap<String, TimeEntry>,
}

impl TimeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<String, TimeEntry>) -> Self {
        Self { entries }
    }

    pub fn as_map(&self) -> &HashMap<String, TimeEntry> {
        &self.entries
    }

    pub fn get(&self, task_id: TaskId, date: NaiveDate) -> Option<&TimeEntry> {
        self.entries.get(&entry_id(task_id, date))
    }

    /// Full-replace semantics for manual edits: the stored value becomes
    /// exactly `minutes`. Zero or negative deletes the cell instead of
    /// storing it.
    pub fn upsert(&mut self, task_id: TaskId, date: NaiveDate, minutes: f64) -> UpsertOutcome {
        let id = entry_id(task_id, date);
        if minutes <= 0.0 {
            self.entries.remove(&id);
            return UpsertOutcome::Deleted;
        }
        let entry = TimeEntry::new(task_id, date, minutes);
        self.entries.insert(id, entry.clone());
        UpsertOutcome::Stored(entry)
    }

    /// Additive path used by the timer on stop: read-add-replace
    pub fn add_minutes(&mut self, task_id: TaskId, date: NaiveDate, minutes_to_add: f64) -> UpsertOutcome {
        let current = self
            .get(task_id, date)
            .map(|entry| entry.minutes)
            .unwrap_or(0.0);
        self.upsert(task_id, date, current + minutes_to_add)
    }

    /// What `add_minutes` would store, without mutating (persist-first support)
    pub fn preview_add(&self, task_id: TaskId, date: NaiveDate, minutes_to_add: f64) -> f64 {
        let current = self
            .get(task_id, date)
            .map(|entry| entry.minutes)
            .unwrap_or(0.0);
        current + minutes_to_add
    }

    /// Idempotent delete
    pub fn delete(&mut self, task_id: TaskId, date: NaiveDate) {
        self.entries.remove(&entry_id(task_id, date));
    }

    /// Cascading-delete support: drop every entry referencing the task
    pub fn delete_all_for_task(&mut self, task_id: TaskId) {
        self.entries.retain(|_, entry| entry.task_id != task_id);
    }

    pub fn has_entries(&self, task_id: TaskId) -> bool {
        self.entries.values().any(|entry| entry.task_id == task_id)
    }

    /// Sum of minutes for one task across a month
    pub fn task_month_total(&self, task_id: TaskId, month: Month) -> f64 {
        self.entries
            .values()
            .filter(|entry| entry.task_id == task_id && month.contains(entry.date))
            .map(|entry| entry.minutes)
            .sum()
    }

    /// Sum of minutes across all tasks for one day (grid header total)
    pub fn day_total(&self, date: NaiveDate) -> f64 {
        self.entries
            .values()
            .filter(|entry| entry.date == date)
            .map(|entry| entry.minutes)
            .sum()
    }
}
