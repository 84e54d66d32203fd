use crate::calendar::Month;
use crate::domain::{entry_id, CheckEntry, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// Per-(task, day) checkmark state for unique/habit tracking
#[derive(Debug, Clone, Default)]
pub struct CheckLedger {
    entries: HashMap<String, CheckEntry>,
}

impl CheckLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: HashMap<String, CheckEntry>) -> Self {
        Self { entries }
    }

    pub fn as_map(&self) -> &HashMap<String, CheckEntry> {
        &self.entries
    }

    pub fn get(&self, task_id: TaskId, date: NaiveDate) -> Option<&CheckEntry> {
        self.entries.get(&entry_id(task_id, date))
    }

    /// What a toggle would store: a fresh entry stamped `now`, or the
    /// existing one with `is_checked` flipped to the requested value and
    /// `created_at` untouched.
    pub fn preview_toggle(
        &self,
        task_id: TaskId,
        date: NaiveDate,
        is_checked: bool,
        now: DateTime<Utc>,
    ) -> CheckEntry {
        match self.get(task_id, date) {
            Some(existing) => {
                let mut updated = existing.clone();
                updated.is_checked = is_checked;
                updated
            }
            None => CheckEntry::new(task_id, date, is_checked, now),
        }
    }

    pub fn store(&mut self, entry: CheckEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    pub fn toggle(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
        is_checked: bool,
        now: DateTime<Utc>,
    ) -> CheckEntry {
        let entry = self.preview_toggle(task_id, date, is_checked, now);
        self.store(entry.clone());
        entry
    }

    pub fn has_entries(&self, task_id: TaskId) -> bool {
        self.entries.values().any(|entry| entry.task_id == task_id)
    }

    /// Cascading-delete support
    pub fn delete_all_for_task(&mut self, task_id: TaskId) {
        self.entries.retain(|_, entry| entry.task_id != task_id);
    }

    /// Dates with a positive check for a task, ascending
    pub fn checked_dates_for_task(&self, task_id: TaskId) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .entries
            .values()
            .filter(|entry| entry.task_id == task_id && entry.is_checked)
            .map(|entry| entry.date)
            .collect();
        dates.sort();
        dates
    }

    pub fn checked_count_for_task(&self, task_id: TaskId) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.task_id == task_id && entry.is_checked)
            .count()
    }

    pub fn checked_count_in_month(&self, task_id: TaskId, month: Month) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.task_id == task_id && entry.is_checked && month.contains(entry.date))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_toggle_creates_then_updates_in_place() {
        let mut ledger = CheckLedger::new();
        let task = Uuid::new_v4();
        let first = Utc::now();

        let created = ledger.toggle(task, date(2024, 3, 1), true, first);
        assert!(created.is_checked);
        assert_eq!(created.created_at, first);

        // Toggling again updates is_checked but keeps created_at
        let later = first + chrono::Duration::hours(2);
        let updated = ledger.toggle(task, date(2024, 3, 1), false, later);
        assert!(!updated.is_checked);
        assert_eq!(updated.created_at, first);
    }

    #[test]
    fn test_checked_dates_sorted_and_filtered() {
        let mut ledger = CheckLedger::new();
        let task = Uuid::new_v4();
        let now = Utc::now();

        ledger.toggle(task, date(2024, 3, 5), true, now);
        ledger.toggle(task, date(2024, 3, 1), true, now);
        ledger.toggle(task, date(2024, 3, 3), false, now);

        assert_eq!(
            ledger.checked_dates_for_task(task),
            vec![date(2024, 3, 1), date(2024, 3, 5)]
        );
        assert_eq!(ledger.checked_count_for_task(task), 2);
    }

    #[test]
    fn test_checked_count_in_month() {
        let mut ledger = CheckLedger::new();
        let task = Uuid::new_v4();
        let now = Utc::now();

        ledger.toggle(task, date(2024, 3, 1), true, now);
        ledger.toggle(task, date(2024, 4, 1), true, now);

        let march = Month::parse("2024-03").unwrap();
        assert_eq!(ledger.checked_count_in_month(task, march), 1);
    }

    #[test]
    fn test_delete_all_for_task() {
        let mut ledger = CheckLedger::new();
        let task = Uuid::new_v4();
        let other = Uuid::new_v4();
        let now = Utc::now();

        ledger.toggle(task, date(2024, 3, 1), true, now);
        ledger.toggle(other, date(2024, 3, 1), true, now);

        ledger.delete_all_for_task(task);
        assert!(!ledger.has_entries(task));
        assert!(ledger.has_entries(other));
    }
}
