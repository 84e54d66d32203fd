pub mod entries;
pub mod enums;
pub mod task;
pub mod views;

pub use entries::{
    entry_id, ActiveTimer, CheckEntry, PreferencesPatch, TimeEntry, UserPreferences,
};
pub use enums::{Theme, TimeFormat, TrackingType};
pub use task::{Task, TaskId, TaskPatch};
pub use views::{flatten_visible, format_cell, tree_connector, VisibleRow};
