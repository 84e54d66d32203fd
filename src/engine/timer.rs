use crate::domain::{ActiveTimer, TaskId};
use crate::error::{Result, TrackerError};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// Minutes a finished run is worth: total milliseconds / 60000
pub fn minutes_from_ms(milliseconds: i64) -> f64 {
    milliseconds as f64 / 60_000.0
}

/// At most one in-progress timer per task. Stopping converts elapsed
/// wall-clock time into ledger minutes; deleting discards it.
#[derive(Debug, Clone, Default)]
pub struct TimerEngine {
    timers: HashMap<TaskId, ActiveTimer>,
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_timers(timers: HashMap<TaskId, ActiveTimer>) -> Self {
        Self { timers }
    }

    pub fn as_map(&self) -> &HashMap<TaskId, ActiveTimer> {
        &self.timers
    }

    pub fn get(&self, task_id: TaskId) -> Option<&ActiveTimer> {
        self.timers.get(&task_id)
    }

    pub fn is_running(&self, task_id: TaskId) -> bool {
        self.timers.contains_key(&task_id)
    }

    /// What `start_at` would create; Conflict if a timer already exists
    pub fn preview_start(
        &self,
        task_id: TaskId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ActiveTimer> {
        if self.timers.contains_key(&task_id) {
            return Err(TrackerError::Conflict(task_id));
        }
        Ok(ActiveTimer::started_at(task_id, date, now))
    }

    pub fn insert(&mut self, timer: ActiveTimer) {
        self.timers.insert(timer.task_id, timer);
    }

    /// Idle -> Running. Fails with Conflict when a timer already exists.
    pub fn start_at(&mut self, task_id: TaskId, date: NaiveDate, now: DateTime<Utc>) -> Result<&ActiveTimer> {
        let timer = self.preview_start(task_id, date, now)?;
        self.timers.insert(task_id, timer);
        Ok(&self.timers[&task_id])
    }

    /// Total elapsed milliseconds the timer would credit if stopped at `now`.
    /// None when no timer exists (stop is a no-op then).
    pub fn preview_stop(&self, task_id: TaskId, now: DateTime<Utc>) -> Option<i64> {
        self.timers
            .get(&task_id)
            .map(|timer| timer.elapsed_ms_at(now))
    }

    /// Running -> Idle. Removes the timer and returns the elapsed
    /// milliseconds to credit; None when nothing was running.
    pub fn stop_at(&mut self, task_id: TaskId, now: DateTime<Utc>) -> Option<i64> {
        let elapsed = self.preview_stop(task_id, now)?;
        self.timers.remove(&task_id);
        Some(elapsed)
    }

    /// What `pause_at` would store: the current run folded into the
    /// accumulator, clock frozen. None when no timer exists.
    pub fn preview_pause(&self, task_id: TaskId, now: DateTime<Utc>) -> Option<ActiveTimer> {
        let mut timer = self.timers.get(&task_id)?.clone();
        if !timer.is_paused {
            timer.elapsed_ms = timer.elapsed_ms_at(now);
            timer.start_time = now;
            timer.is_paused = true;
        }
        Some(timer)
    }

    /// What `resume_at` would store: clock restarted from `now`, keeping
    /// the accumulator
    pub fn preview_resume(&self, task_id: TaskId, now: DateTime<Utc>) -> Option<ActiveTimer> {
        let mut timer = self.timers.get(&task_id)?.clone();
        if timer.is_paused {
            timer.start_time = now;
            timer.is_paused = false;
        }
        Some(timer)
    }

    /// Fold the current run into the accumulator and freeze. No-op when
    /// absent or already paused.
    pub fn pause_at(&mut self, task_id: TaskId, now: DateTime<Utc>) -> Option<&ActiveTimer> {
        let timer = self.preview_pause(task_id, now)?;
        self.timers.insert(task_id, timer);
        self.timers.get(&task_id)
    }

    /// Restart the clock from `now`, keeping the accumulator
    pub fn resume_at(&mut self, task_id: TaskId, now: DateTime<Utc>) -> Option<&ActiveTimer> {
        let timer = self.preview_resume(task_id, now)?;
        self.timers.insert(task_id, timer);
        self.timers.get(&task_id)
    }

    /// Live display value; never mutates
    pub fn running_minutes(&self, task_id: TaskId, now: DateTime<Utc>) -> Option<f64> {
        self.timers
            .get(&task_id)
            .map(|timer| minutes_from_ms(timer.elapsed_ms_at(now)))
    }

    /// Destructive removal on task deletion: in-progress time is discarded,
    /// not credited
    pub fn delete_for_task(&mut self, task_id: TaskId) {
        self.timers.remove(&task_id);
    }
}
