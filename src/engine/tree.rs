use crate::domain::{Task, TaskId, TaskPatch, TrackingType};
use crate::error::{Result, TrackerError};
use std::collections::HashMap;

/// The hierarchical task store. Tasks live in an id-indexed arena;
/// parent/child links are ids, so traversal and cascade removal work by
/// lookup, never by pointer chasing.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    tasks: HashMap<TaskId, Task>,
    /// Creation sequence, used to break `order` ties stably
    insertion: Vec<TaskId>,
}

impl TaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: HashMap<TaskId, Task>) -> Self {
        // Rebuild a stable insertion order from the sibling sort key so ties
        // after a reload stay deterministic
        let mut insertion: Vec<TaskId> = tasks.keys().copied().collect();
        insertion.sort_by_key(|id| (tasks[id].order, *id));
        Self { tasks, insertion }
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn require(&self, id: TaskId) -> Result<&Task> {
        self.tasks.get(&id).ok_or(TrackerError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn as_map(&self) -> &HashMap<TaskId, Task> {
        &self.tasks
    }

    /// Build (but do not insert) a task with the order a new sibling of
    /// `parent_id` would get. The facade persists it first, then calls
    /// `insert`.
    pub fn prepare_create(
        &self,
        name: &str,
        parent_id: Option<TaskId>,
        tracking_type: TrackingType,
    ) -> Result<Task> {
        if name.trim().is_empty() {
            return Err(TrackerError::Validation("task name must not be empty".to_string()));
        }
        if let Some(parent) = parent_id {
            self.require(parent)?;
        }
        let order = self.sibling_count(parent_id);
        Ok(Task::new(name.trim().to_string(), parent_id, tracking_type, order))
    }

    /// Insert a prepared task and link it into its parent's children
    pub fn insert(&mut self, task: Task) {
        let id = task.id;
        if let Some(parent_id) = task.parent_id {
            if let Some(parent) = self.tasks.get_mut(&parent_id) {
                if !parent.children.contains(&id) {
                    parent.children.push(id);
                }
            }
        }
        self.tasks.insert(id, task);
        self.insertion.push(id);
    }

    /// Apply a patch in place. The tracking-type guard lives in the facade;
    /// here only existence and name validity are enforced.
    pub fn apply_patch(&mut self, id: TaskId, patch: &TaskPatch) -> Result<&Task> {
        let task = self.patched(id, patch)?;
        self.tasks.insert(id, task);
        Ok(&self.tasks[&id])
    }

    /// Preview a patched copy without mutating the tree (persist-first support)
    pub fn patched(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(TrackerError::Validation("task name must not be empty".to_string()));
            }
        }
        let mut task = self.require(id)?.clone();
        if let Some(name) = &patch.name {
            task.name = name.trim().to_string();
        }
        if let Some(kind) = patch.tracking_type {
            task.tracking_type = kind;
        }
        if let Some(expanded) = patch.is_expanded {
            task.is_expanded = expanded;
        }
        if let Some(completed) = patch.is_completed {
            task.is_completed = completed;
        }
        if let Some(order) = patch.order {
            task.order = order;
        }
        Ok(task)
    }

    /// Ids that a cascading delete of `id` would remove, in post-order
    /// (children before parents) so the tree stays well-formed mid-removal.
    /// Empty if the id is unknown.
    pub fn subtree_post_order(&self, id: TaskId) -> Vec<TaskId> {
        let mut removed = Vec::new();
        self.collect_post_order(id, &mut removed);
        removed
    }

    fn collect_post_order(&self, id: TaskId, out: &mut Vec<TaskId>) {
        let Some(task) = self.tasks.get(&id) else {
            return;
        };
        for child in task.children.clone() {
            self.collect_post_order(child, out);
        }
        out.push(id);
    }

    /// Remove a subtree. Returns the removed ids (post-order); unknown ids
    /// remove nothing. Ledger purges are the caller's responsibility.
    pub fn remove(&mut self, id: TaskId) -> Vec<TaskId> {
        let removed = self.subtree_post_order(id);
        if removed.is_empty() {
            return removed;
        }

        let parent_id = self.tasks.get(&id).and_then(|task| task.parent_id);
        for removed_id in &removed {
            self.tasks.remove(removed_id);
        }
        self.insertion.retain(|kept| !removed.contains(kept));

        // Detach from the former parent's child list
        if let Some(parent) = parent_id.and_then(|pid| self.tasks.get_mut(&pid)) {
            parent.children.retain(|child| *child != id);
        }
        self.compact_orders(parent_id);

        removed
    }

    /// Renumber the remaining siblings 0..n, keeping their relative order.
    /// Keeps `order` equal to the sibling rank, so new siblings created
    /// after a delete never collide with a survivor and ties cannot appear
    /// across a save/reload.
    fn compact_orders(&mut self, parent_id: Option<TaskId>) {
        let siblings = match parent_id {
            Some(parent) => match self.tasks.get(&parent) {
                Some(task) => task.children.clone(),
                None => return,
            },
            None => self
                .tasks
                .values()
                .filter(|task| task.is_root())
                .map(|task| task.id)
                .collect(),
        };
        for (rank, sibling) in self.sorted_by_order(siblings.into_iter()).into_iter().enumerate() {
            if let Some(task) = self.tasks.get_mut(&sibling) {
                task.order = rank as u32;
            }
        }
    }

    pub fn toggle_expand(&mut self, id: TaskId) -> Result<&Task> {
        let task = self.tasks.get_mut(&id).ok_or(TrackerError::NotFound(id))?;
        task.is_expanded = !task.is_expanded;
        Ok(&self.tasks[&id])
    }

    /// Nesting level of a task: 0 for roots, parents walked by id
    pub fn depth_of(&self, task: &Task) -> usize {
        let mut depth = 0;
        let mut current = task;
        while let Some(parent_id) = current.parent_id {
            let Some(parent) = self.tasks.get(&parent_id) else {
                break;
            };
            depth += 1;
            current = parent;
        }
        depth
    }

    fn sibling_count(&self, parent_id: Option<TaskId>) -> u32 {
        match parent_id {
            Some(parent) => self
                .tasks
                .get(&parent)
                .map(|task| task.children.len() as u32)
                .unwrap_or(0),
            None => self.tasks.values().filter(|task| task.is_root()).count() as u32,
        }
    }

    fn sorted_by_order(&self, ids: impl Iterator<Item = TaskId>) -> Vec<TaskId> {
        let mut out: Vec<TaskId> = ids.filter(|id| self.tasks.contains_key(id)).collect();
        out.sort_by_key(|id| {
            let rank = self
                .insertion
                .iter()
                .position(|inserted| inserted == id)
                .unwrap_or(usize::MAX);
            (self.tasks[id].order, rank)
        });
        out
    }

    /// A task is fully completed when explicitly marked complete, or when it
    /// has children and every one of them is recursively fully completed.
    /// A childless, unmarked task never is.
    pub fn is_fully_completed(&self, id: TaskId) -> bool {
        let Some(task) = self.tasks.get(&id) else {
            return false;
        };
        if task.is_completed {
            return true;
        }
        if task.children.is_empty() {
            return false;
        }
        task.children.iter().all(|child| self.is_fully_completed(*child))
    }

    /// Depth-first pre-order over roots sorted by `order`. Children are only
    /// descended into when the parent is expanded. With `hide_completed`, a
    /// fully-completed task hides its entire subtree as a unit.
    pub fn visible_tasks(&self, hide_completed: bool) -> Vec<&Task> {
        let roots = self.sorted_by_order(
            self.tasks
                .values()
                .filter(|task| task.is_root())
                .map(|task| task.id),
        );

        let mut visible = Vec::new();
        for root in roots {
            self.push_visible(root, hide_completed, &mut visible);
        }
        visible
    }

    fn push_visible<'a>(&'a self, id: TaskId, hide_completed: bool, out: &mut Vec<&'a Task>) {
        let Some(task) = self.tasks.get(&id) else {
            return;
        };
        if hide_completed && self.is_fully_completed(id) {
            return;
        }
        out.push(task);
        if task.is_expanded && !task.children.is_empty() {
            for child in self.sorted_by_order(task.children.iter().copied()) {
                self.push_visible(child, hide_completed, out);
            }
        }
    }
}
