use super::enums::TrackingType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

/// A node in the task hierarchy. Parent and children are stored as ids into
/// the tree's arena, never as direct references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    /// Display name, never empty
    pub name: String,
    pub parent_id: Option<TaskId>,
    /// Child ids; ordering is defined by each child's `order`, not list position
    pub children: Vec<TaskId>,
    pub tracking_type: TrackingType,
    pub is_expanded: bool,
    pub is_completed: bool,
    /// Sibling sort key
    pub order: u32,
}

impl Task {
    pub fn new(name: String, parent_id: Option<TaskId>, tracking_type: TrackingType, order: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            parent_id,
            children: Vec::new(),
            tracking_type,
            is_expanded: false,
            is_completed: false,
            order,
        }
    }

    /// Only leaf tasks carry tracking semantics; parents are pure containers
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Partial update for a task; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub tracking_type: Option<TrackingType>,
    pub is_expanded: Option<bool>,
    pub is_completed: Option<bool>,
    pub order: Option<u32>,
}

impl TaskPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            is_completed: Some(value),
            ..Self::default()
        }
    }

    pub fn renamed(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Whether this patch tries to change the tracking type
    pub fn changes_tracking_type(&self, current: TrackingType) -> bool {
        matches!(self.tracking_type, Some(kind) if kind != current)
    }
}
