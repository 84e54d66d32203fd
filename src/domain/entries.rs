use super::enums::{Theme, TimeFormat, TrackingType};
use super::task::TaskId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Composite key for per-(task, date) entries: `"<taskId>-<date>"`
pub fn entry_id(task_id: TaskId, date: NaiveDate) -> String {
    format!("{}-{}", task_id, date.format("%Y-%m-%d"))
}

/// Minutes logged against one task on one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: String,
    pub task_id: TaskId,
    pub date: NaiveDate,
    /// Always positive; zero/negative values are deleted, never stored
    pub minutes: f64,
    /// Legacy flag, true only transiently while a timer owns the entry
    pub is_active: bool,
    /// Set only when associated with an in-progress timer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
}

impl TimeEntry {
    pub fn new(task_id: TaskId, date: NaiveDate, minutes: f64) -> Self {
        Self {
            id: entry_id(task_id, date),
            task_id,
            date,
            minutes,
            is_active: false,
            start_time: None,
        }
    }
}

/// Boolean check state for one task on one day (unique/habit tracking)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEntry {
    pub id: String,
    pub task_id: TaskId,
    pub date: NaiveDate,
    pub is_checked: bool,
    /// Set on first creation, never updated on toggle
    pub created_at: DateTime<Utc>,
}

impl CheckEntry {
    pub fn new(task_id: TaskId, date: NaiveDate, is_checked: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            id: entry_id(task_id, date),
            task_id,
            date,
            is_checked,
            created_at,
        }
    }
}

/// The single in-progress timer for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    pub task_id: TaskId,
    /// The calendar day the accumulating time will be credited to
    pub date: NaiveDate,
    /// Timestamp of the last resume
    pub start_time: DateTime<Utc>,
    /// Milliseconds accumulated before the current run (0 if never paused)
    #[serde(rename = "elapsedTime")]
    pub elapsed_ms: i64,
    /// True while the timer is paused (start_time is then a bookmark, not a run)
    #[serde(default)]
    pub is_paused: bool,
}

impl ActiveTimer {
    pub fn started_at(task_id: TaskId, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            task_id,
            date,
            start_time: now,
            elapsed_ms: 0,
            is_paused: false,
        }
    }

    /// Total elapsed milliseconds as of `now`, including the current run
    pub fn elapsed_ms_at(&self, now: DateTime<Utc>) -> i64 {
        if self.is_paused {
            self.elapsed_ms
        } else {
            self.elapsed_ms + (now - self.start_time).num_milliseconds().max(0)
        }
    }
}

/// Process-wide preferences: one record, created with defaults on first run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub default_tracking_type: TrackingType,
    pub time_format: TimeFormat,
    #[serde(default)]
    pub hide_completed: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            default_tracking_type: TrackingType::Manual,
            time_format: TimeFormat::TwentyFourHour,
            hide_completed: false,
        }
    }
}

/// Partial update for preferences; `None` fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct PreferencesPatch {
    pub theme: Option<Theme>,
    pub default_tracking_type: Option<TrackingType>,
    pub time_format: Option<TimeFormat>,
    pub hide_completed: Option<bool>,
}
