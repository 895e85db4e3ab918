//! The task list controller.
//!
//! `TaskList` owns the in-memory list and the active filter and is the only
//! place tasks change. Every mutation runs the same cycle: update memory,
//! rebuild the view, write the full list back to storage. Deletes are the one
//! deferred operation: the row is marked as removing and the actual removal is
//! queued with a cancellation handle, to be fired by `run_due`.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::due::DUE_SOON_HOURS;
use crate::error::TaskError;
use crate::fields::Filter;
use crate::scheduler::{DeleteHandle, Deferred};
use crate::storage::{load_tasks, save_tasks, LoadPolicy, Storage};
use crate::task::Task;
use crate::view::ListView;

/// Default length of the removal animation.
pub const DELETE_DELAY: Duration = Duration::from_millis(300);

/// Behaviour knobs the controller is built with.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Allowed categories, in selector order. Empty means any label is accepted.
    pub categories: Vec<String>,
    pub default_filter: Filter,
    pub delete_delay: Duration,
    pub due_soon_window: chrono::Duration,
    pub load_policy: LoadPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            categories: vec!["personal".into(), "work".into(), "study".into()],
            default_filter: Filter::All,
            delete_delay: DELETE_DELAY,
            due_soon_window: chrono::Duration::hours(DUE_SOON_HOURS),
            load_policy: LoadPolicy::Backup,
        }
    }
}

/// An edit that has been started but not committed or cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub id: u64,
    pub original: String,
}

pub struct TaskList<S: Storage, C: Clock = SystemClock> {
    tasks: Vec<Task>,
    filter: Filter,
    pending_edit: Option<PendingEdit>,
    deletes: Deferred<u64>,
    view: ListView,
    storage: S,
    clock: C,
    settings: Settings,
}

impl<S: Storage, C: Clock> TaskList<S, C> {
    /// Load the stored list and render it once.
    #[tracing::instrument(skip_all)]
    pub fn load(mut storage: S, clock: C, settings: Settings) -> anyhow::Result<Self> {
        let tasks = load_tasks(&mut storage, settings.load_policy).context("failed to load tasks")?;
        info!(count = tasks.len(), "task list loaded");

        let mut list = TaskList {
            tasks,
            filter: settings.default_filter,
            pending_edit: None,
            deletes: Deferred::new(),
            view: ListView::default(),
            storage,
            clock,
            settings,
        };
        list.render();
        Ok(list)
    }

    /// Add a task at the top of the list.
    ///
    /// Returns `Ok(None)` without touching anything when `text` is blank.
    #[tracing::instrument(skip(self, text))]
    pub fn add(&mut self, text: &str, due_date: Option<NaiveDate>, category: &str) -> anyhow::Result<Option<u64>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring blank task");
            return Ok(None);
        }
        let category = self.resolve_category(category)?;

        let id = self.next_id();
        let before = self.tasks.clone();
        self.tasks.insert(0, Task::new(id, text, due_date, category));
        info!(id, "task added");
        self.commit(before)?;
        Ok(Some(id))
    }

    /// Start editing `id` and return the text to pre-fill the editor with.
    pub fn begin_edit(&mut self, id: u64) -> anyhow::Result<&str> {
        let idx = self.position(id).ok_or(TaskError::NotFound(id))?;
        let original = self.tasks[idx].text.clone();
        self.pending_edit = Some(PendingEdit { id, original });
        Ok(&self.tasks[idx].text)
    }

    /// Finish the pending edit with `replacement`.
    ///
    /// Blank input drops the edit. Returns whether the task changed.
    #[tracing::instrument(skip(self, replacement))]
    pub fn commit_edit(&mut self, replacement: &str) -> anyhow::Result<bool> {
        let Some(edit) = self.pending_edit.take() else {
            return Ok(false);
        };
        let replacement = replacement.trim();
        if replacement.is_empty() {
            debug!(id = edit.id, "edit dropped: blank replacement");
            return Ok(false);
        }
        if replacement == edit.original {
            debug!(id = edit.id, "edit dropped: text unchanged");
            return Ok(false);
        }
        let before = self.tasks.clone();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == edit.id) else {
            debug!(id = edit.id, "edit dropped: task no longer exists");
            return Ok(false);
        };
        task.text = replacement.to_string();
        info!(id = edit.id, "task edited");
        self.commit(before)?;
        Ok(true)
    }

    pub fn cancel_edit(&mut self) {
        self.pending_edit = None;
    }

    /// Replace the text of `id` in one step.
    pub fn edit(&mut self, id: u64, replacement: &str) -> anyhow::Result<bool> {
        self.begin_edit(id)?;
        self.commit_edit(replacement)
    }

    /// Flip the completion flag of `id`. Returns whether a task matched.
    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, id: u64) -> anyhow::Result<bool> {
        let before = self.tasks.clone();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        task.done = !task.done;
        info!(id, done = task.done, "task toggled");
        self.commit(before)?;
        Ok(true)
    }

    /// Mark `id` as removing and schedule its removal after the delete delay.
    #[tracing::instrument(skip(self))]
    pub fn request_delete(&mut self, id: u64) -> DeleteHandle {
        let now = self.clock.instant();
        let due = now.checked_add(self.settings.delete_delay).unwrap_or(now);
        let handle = self.deletes.schedule(id, due);
        debug!(id, ?handle, "delete scheduled");
        self.render();
        handle
    }

    /// Cancel a delete that has not fired yet.
    pub fn cancel_delete(&mut self, handle: DeleteHandle) -> bool {
        let cancelled = self.deletes.cancel(handle);
        if let Some(id) = cancelled {
            debug!(id, ?handle, "delete cancelled");
            self.render();
        }
        cancelled.is_some()
    }

    /// Fire every scheduled delete whose deadline has passed.
    pub fn run_due(&mut self) -> anyhow::Result<usize> {
        let ids = self.deletes.take_due(self.clock.instant());
        self.remove(&ids)
    }

    /// Fire every scheduled delete now, whatever its deadline.
    pub fn flush_deferred(&mut self) -> anyhow::Result<usize> {
        let ids = self.deletes.drain();
        self.remove(&ids)
    }

    pub fn next_deadline(&self) -> Option<std::time::Instant> {
        self.deletes.next_deadline()
    }

    pub fn has_pending_deletes(&self) -> bool {
        !self.deletes.is_empty()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.render();
    }

    /// Rebuild the view from the current list and filter.
    pub fn render(&mut self) {
        let removing: HashSet<u64> = self.deletes.iter().copied().collect();
        self.view = ListView::build(
            &self.tasks,
            self.filter,
            &removing,
            self.clock.local_now(),
            self.settings.due_soon_window,
        );
        debug!(rows = self.view.rows.len(), pending = self.view.pending_count, "rendered");
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn view(&self) -> &ListView {
        &self.view
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.done).count()
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.pending_edit.as_ref()
    }

    pub fn categories(&self) -> &[String] {
        &self.settings.categories
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    // Millisecond timestamp, bumped past the largest existing id when the
    // clock has not moved on (or went backwards).
    fn next_id(&self) -> u64 {
        let stamp = u64::try_from(self.clock.epoch_millis()).unwrap_or(0);
        match self.tasks.iter().map(|t| t.id).max() {
            Some(max) if stamp <= max => max + 1,
            _ => stamp,
        }
    }

    fn resolve_category(&self, category: &str) -> Result<String, TaskError> {
        let category = category.trim();
        let allowed = &self.settings.categories;
        if category.is_empty() {
            return Ok(allowed.first().cloned().unwrap_or_default());
        }
        if allowed.is_empty() || allowed.iter().any(|c| c == category) {
            Ok(category.to_string())
        } else {
            Err(TaskError::UnknownCategory {
                name: category.to_string(),
                allowed: allowed.join(", "),
            })
        }
    }

    fn remove(&mut self, ids: &[u64]) -> anyhow::Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let before = self.tasks.clone();
        self.tasks.retain(|t| !ids.contains(&t.id));
        info!(requested = ids.len(), removed = before.len() - self.tasks.len(), "deferred deletes fired");
        self.commit(before)?;
        Ok(ids.len())
    }

    // Memory never runs ahead of storage: a failed write restores `before`.
    fn commit(&mut self, before: Vec<Task>) -> anyhow::Result<()> {
        let saved = save_tasks(&mut self.storage, &self.tasks).context("failed to save tasks");
        if saved.is_err() {
            warn!("save failed; rolling back in-memory change");
            self.tasks = before;
        }
        self.render();
        saved
    }
}
