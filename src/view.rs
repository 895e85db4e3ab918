//! View model the front ends draw from.
//!
//! `ListView` is rebuilt from scratch on every render: the filtered rows in
//! list order, the pending counter over the whole list and the empty-list
//! placeholder. Front ends never look at the raw task list.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::due::{format_due_relative, is_due_soon};
use crate::fields::Filter;
use crate::task::Task;

/// Text shown in place of the list when the filtered view is empty.
pub const EMPTY_PLACEHOLDER: &str = "No tasks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub id: u64,
    pub text: String,
    pub done: bool,
    pub due_date: Option<NaiveDate>,
    pub due_label: String,
    pub category: String,
    pub due_soon: bool,
    /// A delete has been requested and the row is animating out.
    pub removing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListView {
    pub rows: Vec<TaskRow>,
    pub pending_count: usize,
    pub filter: Filter,
    pub placeholder: Option<&'static str>,
}

impl ListView {
    pub fn build(
        tasks: &[Task],
        filter: Filter,
        removing: &HashSet<u64>,
        now: NaiveDateTime,
        due_soon_window: Duration,
    ) -> Self {
        let today = now.date();
        let rows: Vec<TaskRow> = filter
            .apply(tasks)
            .into_iter()
            .map(|task| TaskRow {
                id: task.id,
                text: task.text.clone(),
                done: task.done,
                due_date: task.due_date,
                due_label: if task.due_date.is_some() {
                    format_due_relative(task.due_date, today)
                } else {
                    String::new()
                },
                category: task.category.clone(),
                due_soon: is_due_soon(task.due_date, now, due_soon_window),
                removing: removing.contains(&task.id),
            })
            .collect();

        ListView {
            placeholder: rows.is_empty().then_some(EMPTY_PLACEHOLDER),
            rows,
            pending_count: tasks.iter().filter(|t| !t.done).count(),
            filter,
        }
    }

    pub fn row(&self, id: u64) -> Option<&TaskRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Make user text safe to print to a terminal.
///
/// Control characters (escape sequences, carriage returns, tabs, newlines)
/// are shown as visible `\u{..}` escapes instead of being interpreted.
pub fn terminal_safe(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        if ch.is_control() {
            out.push_str(&ch.escape_unicode().to_string());
        } else {
            out.push(ch);
        }
    }
    Cow::Owned(out)
}
