use super::check_ledger::CheckLedger;
use super::projector;
use super::time_ledger::TimeLedger;
use super::timer::{minutes_from_ms, TimerEngine};
use super::tree::TaskTree;
use crate::calendar::{CalendarDay, Month};
use crate::domain::{
    ActiveTimer, CheckEntry, PreferencesPatch, Task, TaskId, TaskPatch, TimeEntry, TrackingType,
    UserPreferences, VisibleRow,
};
use crate::error::{Result, TrackerError};
use crate::persistence::{Repository, Snapshot};
use chrono::{DateTime, NaiveDate, Utc};

/// The engine facade a UI or API layer talks to. Owns the task tree, both
/// ledgers, the timer table, and the preferences record.
///
/// Every mutation commits the complete next state to the repository in a
/// single `save` before touching memory, so a failed (or interrupted)
/// persist leaves both the store and memory exactly as they were.
pub struct TrackerEngine {
    tree: TaskTree,
    time: TimeLedger,
    checks: CheckLedger,
    timers: TimerEngine,
    preferences: UserPreferences,
    repo: Box<dyn Repository>,
}

impl TrackerEngine {
    /// Load state from the repository; malformed snapshots are rejected
    /// here, before anything reaches the stores
    pub fn load(mut repo: Box<dyn Repository>) -> Result<Self> {
        let snapshot = repo.load()?;
        snapshot.validate()?;
        let mut engine = Self {
            tree: TaskTree::new(),
            time: TimeLedger::new(),
            checks: CheckLedger::new(),
            timers: TimerEngine::new(),
            preferences: UserPreferences::default(),
            repo,
        };
        engine.adopt(snapshot);
        Ok(engine)
    }

    fn adopt(&mut self, snapshot: Snapshot) {
        self.tree = TaskTree::from_tasks(snapshot.data.tasks);
        self.time = TimeLedger::from_entries(snapshot.data.time_entries);
        self.checks = CheckLedger::from_entries(snapshot.data.check_entries);
        self.timers = TimerEngine::from_timers(snapshot.data.active_timers);
        self.preferences = snapshot.data.user_preferences;
    }

    fn snapshot_of(
        tree: &TaskTree,
        time: &TimeLedger,
        checks: &CheckLedger,
        timers: &TimerEngine,
        preferences: &UserPreferences,
        now: DateTime<Utc>,
    ) -> Snapshot {
        let mut snapshot = Snapshot::at(now);
        snapshot.data.tasks = tree.as_map().clone();
        snapshot.data.time_entries = time.as_map().clone();
        snapshot.data.check_entries = checks.as_map().clone();
        snapshot.data.active_timers = timers.as_map().clone();
        snapshot.data.user_preferences = preferences.clone();
        snapshot
    }

    /// Save the candidate stores as one snapshot, then swap them in.
    /// Memory is only updated after the save succeeded.
    fn commit(
        &mut self,
        tree: TaskTree,
        time: TimeLedger,
        checks: CheckLedger,
        timers: TimerEngine,
        preferences: UserPreferences,
    ) -> Result<()> {
        let snapshot =
            Self::snapshot_of(&tree, &time, &checks, &timers, &preferences, Utc::now());
        self.repo.save(&snapshot)?;
        self.tree = tree;
        self.time = time;
        self.checks = checks;
        self.timers = timers;
        self.preferences = preferences;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Task tree mutations
    // ------------------------------------------------------------------

    /// Create a task. Empty names are rejected; an unknown parent is
    /// NotFound. The tracking type defaults from preferences when omitted.
    pub fn create_task(
        &mut self,
        name: &str,
        parent_id: Option<TaskId>,
        tracking_type: Option<TrackingType>,
    ) -> Result<Task> {
        let kind = tracking_type.unwrap_or(self.preferences.default_tracking_type);
        let task = self.tree.prepare_create(name, parent_id, kind)?;

        let mut tree = self.tree.clone();
        tree.insert(task.clone());
        self.commit(
            tree,
            self.time.clone(),
            self.checks.clone(),
            self.timers.clone(),
            self.preferences.clone(),
        )?;
        Ok(task)
    }

    /// Merge a partial update. Changing the tracking type is rejected once
    /// the task has children or any ledger entries.
    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let current = self.tree.require(id)?;
        if patch.changes_tracking_type(current.tracking_type) {
            let has_entries =
                self.time.has_entries(id) || self.checks.has_entries(id);
            if !current.is_leaf() || has_entries {
                return Err(TrackerError::InvalidState(format!(
                    "cannot change tracking type of task {}: it has children or recorded entries",
                    id
                )));
            }
        }

        let mut tree = self.tree.clone();
        let updated = tree.apply_patch(id, &patch)?.clone();
        self.commit(
            tree,
            self.time.clone(),
            self.checks.clone(),
            self.timers.clone(),
            self.preferences.clone(),
        )?;
        Ok(updated)
    }

    /// Cascading delete: the task, all descendants, and every time entry,
    /// check entry, and timer referencing any of them. Unknown ids are a
    /// no-op. Returns the removed ids.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Vec<TaskId>> {
        let removed = self.tree.subtree_post_order(id);
        if removed.is_empty() {
            return Ok(removed);
        }

        let mut tree = self.tree.clone();
        tree.remove(id);
        let mut time = self.time.clone();
        let mut checks = self.checks.clone();
        let mut timers = self.timers.clone();
        for removed_id in &removed {
            time.delete_all_for_task(*removed_id);
            checks.delete_all_for_task(*removed_id);
            timers.delete_for_task(*removed_id);
        }

        self.commit(tree, time, checks, timers, self.preferences.clone())?;
        Ok(removed)
    }

    /// Flip the expand flag; allowed (and harmless) on childless tasks
    pub fn toggle_expand(&mut self, id: TaskId) -> Result<Task> {
        let expanded = self.tree.require(id)?.is_expanded;
        self.update_task(
            id,
            TaskPatch {
                is_expanded: Some(!expanded),
                ..TaskPatch::default()
            },
        )
    }

    /// Flip the explicit completion flag, regardless of tracking type or
    /// children
    pub fn toggle_completion(&mut self, id: TaskId) -> Result<Task> {
        let completed = self.tree.require(id)?.is_completed;
        self.update_task(id, TaskPatch::completed(!completed))
    }

    // ------------------------------------------------------------------
    // Time entries
    // ------------------------------------------------------------------

    /// Full-replace upsert for manual edits; zero or negative minutes
    /// deletes the cell. Unknown tasks are NotFound so orphan rows cannot
    /// be created.
    pub fn set_time(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
        minutes: f64,
    ) -> Result<Option<TimeEntry>> {
        self.tree.require(task_id)?;

        let mut time = self.time.clone();
        let entry = if minutes <= 0.0 {
            time.delete(task_id, date);
            None
        } else {
            let entry = TimeEntry::new(task_id, date, minutes);
            time.upsert(task_id, date, minutes);
            Some(entry)
        };

        self.commit(
            self.tree.clone(),
            time,
            self.checks.clone(),
            self.timers.clone(),
            self.preferences.clone(),
        )?;
        Ok(entry)
    }

    pub fn time_entry(&self, task_id: TaskId, date: NaiveDate) -> Option<&TimeEntry> {
        self.time.get(task_id, date)
    }

    pub fn has_time_entries(&self, task_id: TaskId) -> bool {
        self.time.has_entries(task_id)
    }

    // ------------------------------------------------------------------
    // Check entries
    // ------------------------------------------------------------------

    /// Set the check state for a day. Checking a unique-type task also
    /// marks it completed; unchecking never reverts completion.
    pub fn toggle_check(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
        is_checked: bool,
    ) -> Result<CheckEntry> {
        self.toggle_check_at(task_id, date, is_checked, Utc::now())
    }

    pub fn toggle_check_at(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
        is_checked: bool,
        now: DateTime<Utc>,
    ) -> Result<CheckEntry> {
        let task = self.tree.require(task_id)?.clone();
        let entry = self.checks.preview_toggle(task_id, date, is_checked, now);

        let mut checks = self.checks.clone();
        checks.store(entry.clone());
        let mut tree = self.tree.clone();
        if task.tracking_type == TrackingType::Unique && is_checked && !task.is_completed {
            tree.apply_patch(task_id, &TaskPatch::completed(true))?;
        }

        self.commit(
            tree,
            self.time.clone(),
            checks,
            self.timers.clone(),
            self.preferences.clone(),
        )?;
        Ok(entry)
    }

    pub fn check_entry(&self, task_id: TaskId, date: NaiveDate) -> Option<&CheckEntry> {
        self.checks.get(task_id, date)
    }

    pub fn has_check_entries(&self, task_id: TaskId) -> bool {
        self.checks.has_entries(task_id)
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    pub fn start_timer(&mut self, task_id: TaskId, date: NaiveDate) -> Result<ActiveTimer> {
        self.start_timer_at(task_id, date, Utc::now())
    }

    /// Idle -> Running; Conflict when a timer already exists for the task
    pub fn start_timer_at(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ActiveTimer> {
        self.tree.require(task_id)?;
        let timer = self.timers.preview_start(task_id, date, now)?;

        let mut timers = self.timers.clone();
        timers.insert(timer.clone());
        self.commit(
            self.tree.clone(),
            self.time.clone(),
            self.checks.clone(),
            timers,
            self.preferences.clone(),
        )?;
        Ok(timer)
    }

    pub fn stop_timer(&mut self, task_id: TaskId, date: NaiveDate) -> Result<Option<TimeEntry>> {
        self.stop_timer_at(task_id, date, Utc::now())
    }

    /// Running -> Idle: credit the elapsed time to the ledger additively
    /// and drop the timer. No-op when nothing is running. The credited day
    /// is the caller-supplied `date`, which the original allowed to differ
    /// from the day recorded at start.
    pub fn stop_timer_at(
        &mut self,
        task_id: TaskId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<TimeEntry>> {
        let Some(elapsed_ms) = self.timers.preview_stop(task_id, now) else {
            return Ok(None);
        };
        let minutes = minutes_from_ms(elapsed_ms);
        let new_total = self.time.preview_add(task_id, date, minutes);

        let mut time = self.time.clone();
        let mut timers = self.timers.clone();
        timers.delete_for_task(task_id);
        let entry = if new_total <= 0.0 {
            time.delete(task_id, date);
            None
        } else {
            time.upsert(task_id, date, new_total);
            Some(TimeEntry::new(task_id, date, new_total))
        };

        self.commit(
            self.tree.clone(),
            time,
            self.checks.clone(),
            timers,
            self.preferences.clone(),
        )?;
        Ok(entry)
    }

    pub fn pause_timer(&mut self, task_id: TaskId) -> Result<Option<ActiveTimer>> {
        self.pause_timer_at(task_id, Utc::now())
    }

    pub fn pause_timer_at(
        &mut self,
        task_id: TaskId,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveTimer>> {
        let Some(timer) = self.timers.preview_pause(task_id, now) else {
            return Ok(None);
        };
        self.commit_timer(timer.clone())?;
        Ok(Some(timer))
    }

    pub fn resume_timer(&mut self, task_id: TaskId) -> Result<Option<ActiveTimer>> {
        self.resume_timer_at(task_id, Utc::now())
    }

    pub fn resume_timer_at(
        &mut self,
        task_id: TaskId,
        now: DateTime<Utc>,
    ) -> Result<Option<ActiveTimer>> {
        let Some(timer) = self.timers.preview_resume(task_id, now) else {
            return Ok(None);
        };
        self.commit_timer(timer.clone())?;
        Ok(Some(timer))
    }

    fn commit_timer(&mut self, timer: ActiveTimer) -> Result<()> {
        let mut timers = self.timers.clone();
        timers.insert(timer);
        self.commit(
            self.tree.clone(),
            self.time.clone(),
            self.checks.clone(),
            timers,
            self.preferences.clone(),
        )
    }

    pub fn active_timer(&self, task_id: TaskId) -> Option<&ActiveTimer> {
        self.timers.get(task_id)
    }

    /// Live display value for a running timer; never mutates state
    pub fn running_minutes(&self, task_id: TaskId, now: DateTime<Utc>) -> Option<f64> {
        self.timers.running_minutes(task_id, now)
    }

    // ------------------------------------------------------------------
    // Read views
    // ------------------------------------------------------------------

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tree.get(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tree.iter()
    }

    pub fn task_count(&self) -> usize {
        self.tree.len()
    }

    pub fn visible_tasks(&self, hide_completed: bool) -> Vec<&Task> {
        self.tree.visible_tasks(hide_completed)
    }

    pub fn visible_rows(&self, hide_completed: bool) -> Vec<VisibleRow> {
        projector::visible_rows(&self.tree, hide_completed)
    }

    pub fn is_fully_completed(&self, task_id: TaskId) -> bool {
        projector::is_fully_completed(&self.tree, task_id)
    }

    pub fn task_month_total(&self, task_id: TaskId, month: Month) -> Option<f64> {
        projector::task_month_total(&self.tree, &self.time, task_id, month)
    }

    pub fn task_month_total_formatted(&self, task_id: TaskId, month: Month) -> Option<String> {
        projector::task_month_total_formatted(&self.tree, &self.time, task_id, month)
    }

    pub fn day_totals(&self, month: Month) -> Vec<(CalendarDay, f64)> {
        projector::day_totals(&self.time, month)
    }

    pub fn check_summary(&self, task_id: TaskId, month: Month) -> (usize, usize) {
        projector::check_summary(&self.checks, task_id, month)
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    /// Partial update; unnamed fields keep their current value
    pub fn update_preferences(&mut self, patch: PreferencesPatch) -> Result<UserPreferences> {
        let mut updated = self.preferences.clone();
        if let Some(theme) = patch.theme {
            updated.theme = theme;
        }
        if let Some(kind) = patch.default_tracking_type {
            updated.default_tracking_type = kind;
        }
        if let Some(format) = patch.time_format {
            updated.time_format = format;
        }
        if let Some(hide) = patch.hide_completed {
            updated.hide_completed = hide;
        }

        self.commit(
            self.tree.clone(),
            self.time.clone(),
            self.checks.clone(),
            self.timers.clone(),
            updated.clone(),
        )?;
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Snapshot export / import
    // ------------------------------------------------------------------

    pub fn export_snapshot(&self) -> Snapshot {
        self.export_snapshot_at(Utc::now())
    }

    pub fn export_snapshot_at(&self, now: DateTime<Utc>) -> Snapshot {
        Self::snapshot_of(
            &self.tree,
            &self.time,
            &self.checks,
            &self.timers,
            &self.preferences,
            now,
        )
    }

    /// Replace all state atomically: validate, persist, then swap memory.
    /// Any failure leaves the prior state intact.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        snapshot.validate()?;
        self.repo.save(&snapshot)?;
        self.adopt(snapshot);
        Ok(())
    }

    // ------------------------------------------------------------------
    // First-run seeding
    // ------------------------------------------------------------------

    /// Populate the starter hierarchy on an empty store; no-op otherwise
    pub fn seed_sample_tasks(&mut self) -> Result<()> {
        if !self.tree.is_empty() {
            return Ok(());
        }

        self.create_task("PROJECTS", None, Some(TrackingType::Manual))?;
        let non_project = self
            .create_task("NON-PROJECT ACTIVITIES", None, Some(TrackingType::Manual))?
            .id;

        let other = self
            .create_task("OTH - Other", Some(non_project), Some(TrackingType::Manual))?
            .id;
        self.create_task("npa-oth", Some(other), Some(TrackingType::Manual))?;
        self.create_task("bench", Some(other), Some(TrackingType::Manual))?;

        for name in [
            "Business development",
            "Delivery and program management",
            "People management",
            "Research and development",
            "Teaching",
            "Upskilling",
        ] {
            let category = self
                .create_task(name, Some(non_project), Some(TrackingType::Manual))?
                .id;
            self.create_task(name, Some(category), Some(TrackingType::Manual))?;
        }

        self.toggle_expand(non_project)?;
        self.toggle_expand(other)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryRepository;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        date(y, m, d).and_hms_opt(h, min, s).unwrap().and_utc()
    }

    fn engine() -> TrackerEngine {
        TrackerEngine::load(Box::new(MemoryRepository::new())).unwrap()
    }

    /// Repository that accepts reads but fails every save, for checking
    /// that a failed persist leaves memory untouched
    struct BrokenRepository;

    impl Repository for BrokenRepository {
        fn load(&mut self) -> anyhow::Result<Snapshot> {
            Ok(Snapshot::empty())
        }
        fn save(&mut self, _: &Snapshot) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    /// Repository whose stored snapshot stays inspectable after the engine
    /// takes ownership, and whose saves can be made to fail on demand
    struct SharedRepository {
        stored: Rc<RefCell<Snapshot>>,
        failing: Rc<Cell<bool>>,
    }

    impl Repository for SharedRepository {
        fn load(&mut self) -> anyhow::Result<Snapshot> {
            Ok(self.stored.borrow().clone())
        }
        fn save(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
            if self.failing.get() {
                anyhow::bail!("disk full");
            }
            *self.stored.borrow_mut() = snapshot.clone();
            Ok(())
        }
    }

    #[test]
    fn test_create_task_links_parent_once() {
        let mut engine = engine();
        let root = engine.create_task("Projects", None, None).unwrap();
        let child = engine
            .create_task("Research", Some(root.id), None)
            .unwrap();

        let parent = engine.task(root.id).unwrap();
        assert_eq!(parent.children, vec![child.id]);
        assert_eq!(engine.task(child.id).unwrap().parent_id, Some(root.id));
        assert_eq!(engine.task_count(), 2);
    }

    #[test]
    fn test_create_task_rejects_empty_name_and_unknown_parent() {
        let mut engine = engine();
        assert!(matches!(
            engine.create_task("   ", None, None),
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            engine.create_task("Orphan", Some(uuid::Uuid::new_v4()), None),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_rename_task() {
        let mut engine = engine();
        let task = engine.create_task("Draft", None, None).unwrap();

        let updated = engine
            .update_task(task.id, TaskPatch::renamed("Final report"))
            .unwrap();
        assert_eq!(updated.name, "Final report");
        assert_eq!(engine.task(task.id).unwrap().name, "Final report");

        assert!(matches!(
            engine.update_task(task.id, TaskPatch::renamed("   ")),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_task_cascades_subtree_and_rows() {
        let mut engine = engine();
        let root = engine.create_task("Projects", None, None).unwrap();
        let child = engine
            .create_task("Research", Some(root.id), None)
            .unwrap();
        let grandchild = engine
            .create_task("Reading", Some(child.id), None)
            .unwrap();
        let sibling = engine
            .create_task("Teaching", Some(root.id), None)
            .unwrap();

        engine.set_time(child.id, date(2024, 3, 4), 1.5).unwrap();
        engine
            .toggle_check(grandchild.id, date(2024, 3, 4), true)
            .unwrap();
        engine
            .start_timer_at(child.id, date(2024, 3, 4), at(2024, 3, 4, 9, 0, 0))
            .unwrap();

        let removed = engine.delete_task(child.id).unwrap();
        assert_eq!(removed.len(), 2);

        assert!(engine.task(child.id).is_none());
        assert!(engine.task(grandchild.id).is_none());
        assert!(!engine.has_time_entries(child.id));
        assert!(!engine.has_check_entries(grandchild.id));
        assert!(engine.active_timer(child.id).is_none());
        assert_eq!(engine.task(root.id).unwrap().children, vec![sibling.id]);
    }

    #[test]
    fn test_delete_unknown_task_is_noop() {
        let mut engine = engine();
        assert!(engine.delete_task(uuid::Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_set_time_replaces_rather_than_adds() {
        let mut engine = engine();
        let task = engine.create_task("Research", None, None).unwrap();
        let day = date(2024, 3, 4);

        engine.set_time(task.id, day, 2.5).unwrap();
        engine.set_time(task.id, day, 1.0).unwrap();
        assert_eq!(engine.time_entry(task.id, day).unwrap().minutes, 1.0);

        assert!(engine.set_time(task.id, day, 0.0).unwrap().is_none());
        assert!(engine.time_entry(task.id, day).is_none());
    }

    #[test]
    fn test_set_time_unknown_task_is_not_found() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_time(uuid::Uuid::new_v4(), date(2024, 3, 4), 1.0),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn test_month_total_accumulates_across_days() {
        let mut engine = engine();
        let task = engine.create_task("Research", None, None).unwrap();

        engine.set_time(task.id, date(2024, 1, 10), 2.5).unwrap();
        engine.set_time(task.id, date(2024, 1, 20), 1.0).unwrap();
        engine.set_time(task.id, date(2024, 2, 1), 4.0).unwrap();

        let january = Month::parse("2024-01").unwrap();
        assert_eq!(engine.task_month_total(task.id, january), Some(3.5));
    }

    #[test]
    fn test_timer_stop_credits_elapsed_additively() {
        let mut engine = engine();
        let task = engine
            .create_task("Research", None, Some(TrackingType::Automatic))
            .unwrap();
        let day = date(2024, 3, 4);
        engine.set_time(task.id, day, 10.0).unwrap();

        let started = at(2024, 3, 4, 9, 0, 0);
        engine.start_timer_at(task.id, day, started).unwrap();
        assert!(matches!(
            engine.start_timer_at(task.id, day, started),
            Err(TrackerError::Conflict(_))
        ));

        // 90 seconds on the clock
        let entry = engine
            .stop_timer_at(task.id, day, started + chrono::Duration::seconds(90))
            .unwrap()
            .unwrap();
        assert_eq!(entry.minutes, 11.5);
        assert!(engine.active_timer(task.id).is_none());
    }

    #[test]
    fn test_timer_pause_excludes_paused_interval() {
        let mut engine = engine();
        let task = engine
            .create_task("Research", None, Some(TrackingType::Automatic))
            .unwrap();
        let day = date(2024, 3, 4);

        let started = at(2024, 3, 4, 9, 0, 0);
        engine.start_timer_at(task.id, day, started).unwrap();
        engine
            .pause_timer_at(task.id, started + chrono::Duration::minutes(2))
            .unwrap()
            .unwrap();
        engine
            .resume_timer_at(task.id, started + chrono::Duration::minutes(10))
            .unwrap()
            .unwrap();

        let entry = engine
            .stop_timer_at(task.id, day, started + chrono::Duration::minutes(11))
            .unwrap()
            .unwrap();
        assert_eq!(entry.minutes, 3.0);
    }

    #[test]
    fn test_stop_without_timer_is_noop() {
        let mut engine = engine();
        let task = engine.create_task("Research", None, None).unwrap();
        assert!(engine
            .stop_timer_at(task.id, date(2024, 3, 4), at(2024, 3, 4, 9, 0, 0))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_unique_check_auto_completes() {
        let mut engine = engine();
        let task = engine
            .create_task("File taxes", None, Some(TrackingType::Unique))
            .unwrap();
        let day = date(2024, 3, 4);

        engine.toggle_check(task.id, day, true).unwrap();
        assert!(engine.task(task.id).unwrap().is_completed);
    }

    #[test]
    fn test_unique_uncheck_keeps_completion() {
        let mut engine = engine();
        let task = engine
            .create_task("File taxes", None, Some(TrackingType::Unique))
            .unwrap();
        let day = date(2024, 3, 4);

        engine.toggle_check(task.id, day, true).unwrap();
        engine.toggle_check(task.id, day, false).unwrap();

        assert!(engine.task(task.id).unwrap().is_completed);
        assert!(!engine.check_entry(task.id, day).unwrap().is_checked);
    }

    #[test]
    fn test_check_toggle_preserves_created_at() {
        let mut engine = engine();
        let task = engine
            .create_task("Exercise", None, Some(TrackingType::Habit))
            .unwrap();
        let day = date(2024, 3, 4);

        let first = engine
            .toggle_check_at(task.id, day, true, at(2024, 3, 4, 8, 0, 0))
            .unwrap();
        let second = engine
            .toggle_check_at(task.id, day, false, at(2024, 3, 4, 20, 0, 0))
            .unwrap();
        assert_eq!(second.created_at, first.created_at);
    }

    #[test]
    fn test_tracking_type_change_guards() {
        let mut engine = engine();
        let parent = engine.create_task("Projects", None, None).unwrap();
        engine
            .create_task("Research", Some(parent.id), None)
            .unwrap();

        let patch = TaskPatch {
            tracking_type: Some(TrackingType::Habit),
            ..TaskPatch::default()
        };
        assert!(matches!(
            engine.update_task(parent.id, patch.clone()),
            Err(TrackerError::InvalidState(_))
        ));

        let leaf = engine.create_task("Exercise", None, None).unwrap();
        engine.set_time(leaf.id, date(2024, 3, 4), 1.0).unwrap();
        assert!(matches!(
            engine.update_task(leaf.id, patch.clone()),
            Err(TrackerError::InvalidState(_))
        ));

        let fresh = engine.create_task("Stretch", None, None).unwrap();
        let updated = engine.update_task(fresh.id, patch).unwrap();
        assert_eq!(updated.tracking_type, TrackingType::Habit);
    }

    #[test]
    fn test_hide_completed_hides_fully_completed_subtree() {
        let mut engine = engine();
        let root = engine.create_task("Projects", None, None).unwrap();
        let child = engine
            .create_task("Research", Some(root.id), None)
            .unwrap();
        engine.toggle_expand(root.id).unwrap();

        assert_eq!(engine.visible_tasks(true).len(), 2);

        engine.toggle_completion(child.id).unwrap();
        assert!(engine.is_fully_completed(root.id));
        assert!(engine.visible_tasks(true).is_empty());
        assert_eq!(engine.visible_tasks(false).len(), 2);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = engine();
        let task = source.create_task("Research", None, None).unwrap();
        source.set_time(task.id, date(2024, 3, 4), 2.5).unwrap();
        source.toggle_check(task.id, date(2024, 3, 5), true).unwrap();
        source
            .update_preferences(PreferencesPatch {
                hide_completed: Some(true),
                ..PreferencesPatch::default()
            })
            .unwrap();

        let exported = source.export_snapshot_at(at(2024, 3, 6, 12, 0, 0));

        let mut target = engine();
        target.import_snapshot(exported.clone()).unwrap();
        let round_trip = target.export_snapshot_at(at(2024, 3, 6, 12, 0, 0));
        assert_eq!(round_trip, exported);
    }

    #[test]
    fn test_import_rejects_invalid_snapshot() {
        let mut engine = engine();
        let kept = engine.create_task("Keep me", None, None).unwrap();

        let mut snapshot = Snapshot::empty();
        let mut task = Task::new("Dangling".to_string(), None, TrackingType::Manual, 0);
        task.parent_id = Some(uuid::Uuid::new_v4());
        snapshot.data.tasks.insert(task.id, task);

        assert!(engine.import_snapshot(snapshot).is_err());
        assert!(engine.task(kept.id).is_some());
    }

    #[test]
    fn test_failed_persist_leaves_memory_unchanged() {
        let mut engine = TrackerEngine::load(Box::new(BrokenRepository)).unwrap();
        assert!(engine.create_task("Research", None, None).is_err());
        assert_eq!(engine.task_count(), 0);
    }

    #[test]
    fn test_failed_save_keeps_store_loadable() {
        let stored = Rc::new(RefCell::new(Snapshot::empty()));
        let failing = Rc::new(Cell::new(false));
        let mut engine = TrackerEngine::load(Box::new(SharedRepository {
            stored: Rc::clone(&stored),
            failing: Rc::clone(&failing),
        }))
        .unwrap();

        let root = engine.create_task("Projects", None, None).unwrap();

        failing.set(true);
        assert!(engine.create_task("Research", Some(root.id), None).is_err());
        assert_eq!(engine.task_count(), 1);

        // The store holds the last committed state, never a partial one
        let persisted = stored.borrow().clone();
        persisted.validate().unwrap();
        assert_eq!(persisted.data.tasks.len(), 1);
        assert!(persisted.data.tasks.contains_key(&root.id));
    }

    #[test]
    fn test_preferences_partial_update() {
        let mut engine = engine();
        let updated = engine
            .update_preferences(PreferencesPatch {
                default_tracking_type: Some(TrackingType::Habit),
                ..PreferencesPatch::default()
            })
            .unwrap();
        assert_eq!(updated.default_tracking_type, TrackingType::Habit);
        assert_eq!(updated.theme, UserPreferences::default().theme);

        // New tasks now pick up the preference
        let task = engine.create_task("Exercise", None, None).unwrap();
        assert_eq!(task.tracking_type, TrackingType::Habit);
    }

    #[test]
    fn test_seed_sample_tasks_runs_once() {
        let mut engine = engine();
        engine.seed_sample_tasks().unwrap();
        let seeded = engine.task_count();
        assert!(seeded > 0);

        engine.seed_sample_tasks().unwrap();
        assert_eq!(engine.task_count(), seeded);
    }
}
