//! Command implementations for the CLI interface.
//!
//! Each handler runs one controller operation and reports the outcome on
//! `out`. Lookups that the controller treats as soft misses (toggling or
//! deleting an unknown id) are turned into errors here, since a script asked
//! for that id explicitly.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::clock::Clock;
use crate::controller::TaskList;
use crate::due::parse_due_input;
use crate::error::TaskError;
use crate::fields::{Filter, Theme};
use crate::html::render_page;
use crate::storage::Storage;
use crate::view::{terminal_safe, ListView};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive terminal interface.
    Ui,

    /// Add a new task at the top of the list.
    Add {
        /// Task text.
        text: String,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd" or "in Nw".
        #[arg(long)]
        due: Option<String>,
        /// Category; defaults to the first configured category.
        #[arg(long)]
        category: Option<String>,
    },

    /// List tasks.
    List {
        /// Which tasks to show; defaults to the configured filter.
        #[arg(long, value_enum)]
        filter: Option<Filter>,
    },

    /// Mark a task completed, or pending again.
    Toggle {
        /// Task ID.
        id: u64,
    },

    /// Replace the text of a task.
    Edit {
        /// Task ID.
        id: u64,
        /// New text. Blank text leaves the task unchanged.
        text: String,
    },

    /// Delete a task.
    Delete {
        /// Task ID.
        id: u64,
    },

    /// Write the list as a static HTML page.
    Export {
        /// Output file.
        #[arg(long)]
        html: PathBuf,
        /// Which tasks to include; defaults to the configured filter.
        #[arg(long, value_enum)]
        filter: Option<Filter>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Add a new task.
pub fn cmd_add<S: Storage, C: Clock>(
    list: &mut TaskList<S, C>,
    out: &mut impl Write,
    text: &str,
    due: Option<&str>,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let today = list.clock().local_now().date();
    let due_date = parse_due_input(due.unwrap_or_default(), today)?;
    match list.add(text, due_date, category.unwrap_or_default())? {
        Some(id) => writeln!(out, "Added {id}")?,
        None => writeln!(out, "Nothing to add")?,
    }
    Ok(())
}

/// Print the list under `filter`.
pub fn cmd_list<S: Storage, C: Clock>(
    list: &mut TaskList<S, C>,
    out: &mut impl Write,
    filter: Option<Filter>,
) -> anyhow::Result<()> {
    if let Some(filter) = filter {
        list.set_filter(filter);
    }
    print_view(list.view(), out)
}

/// Flip the completion flag of a task.
pub fn cmd_toggle<S: Storage, C: Clock>(list: &mut TaskList<S, C>, out: &mut impl Write, id: u64) -> anyhow::Result<()> {
    if !list.toggle(id)? {
        return Err(TaskError::NotFound(id).into());
    }
    let done = list.get(id).is_some_and(|t| t.done);
    writeln!(out, "{} {id}", if done { "Completed" } else { "Reopened" })?;
    Ok(())
}

/// Replace the text of a task.
pub fn cmd_edit<S: Storage, C: Clock>(
    list: &mut TaskList<S, C>,
    out: &mut impl Write,
    id: u64,
    text: &str,
) -> anyhow::Result<()> {
    if list.edit(id, text)? {
        writeln!(out, "Updated {id}")?;
    } else {
        writeln!(out, "Nothing changed")?;
    }
    Ok(())
}

/// Delete a task. There is no animation to wait for, so the deferred removal
/// is flushed straight away.
pub fn cmd_delete<S: Storage, C: Clock>(list: &mut TaskList<S, C>, out: &mut impl Write, id: u64) -> anyhow::Result<()> {
    if list.get(id).is_none() {
        return Err(TaskError::NotFound(id).into());
    }
    list.request_delete(id);
    list.flush_deferred()?;
    writeln!(out, "Deleted {id}")?;
    Ok(())
}

/// Write the rendered page to `path`.
pub fn cmd_export<S: Storage, C: Clock>(
    list: &mut TaskList<S, C>,
    out: &mut impl Write,
    path: &std::path::Path,
    filter: Option<Filter>,
    theme: Theme,
) -> anyhow::Result<()> {
    if let Some(filter) = filter {
        list.set_filter(filter);
    }
    let page = render_page(list.view(), theme);
    fs::write(path, page).with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(out, "Exported {} task(s) to {}", list.view().rows.len(), path.display())?;
    Ok(())
}

/// Print completions for `shell` to stdout.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Print a view as a plain table followed by the pending counter.
pub fn print_view(view: &ListView, out: &mut impl Write) -> anyhow::Result<()> {
    if let Some(placeholder) = view.placeholder {
        writeln!(out, "{placeholder}")?;
    } else {
        writeln!(out, "{:<14} {:<4} {:<12} {:<12} {}", "ID", "Done", "Due", "Category", "Text")?;
        for row in &view.rows {
            let due = if row.due_soon {
                format!("{} !", row.due_label)
            } else {
                row.due_label.clone()
            };
            writeln!(
                out,
                "{:<14} {:<4} {:<12} {:<12} {}",
                row.id,
                if row.done { "[x]" } else { "[ ]" },
                if due.is_empty() { "-".to_string() } else { due },
                truncate(&terminal_safe(&row.category), 12),
                terminal_safe(&row.text)
            )?;
        }
    }
    writeln!(out, "{} pending ({} shown)", view.pending_count, view.filter)?;
    Ok(())
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::controller::Settings;
    use crate::storage::MemoryStorage;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn list() -> TaskList<MemoryStorage, ManualClock> {
        let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        TaskList::load(MemoryStorage::new(), ManualClock::new(now), Settings::default()).unwrap()
    }

    fn run(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_add_then_list() {
        let mut list = list();
        let printed = run(|out| cmd_add(&mut list, out, "Pay rent", Some("tomorrow"), Some("personal")));
        assert!(printed.starts_with("Added "));
        assert_eq!(list.tasks()[0].due_date, NaiveDate::from_ymd_opt(2024, 6, 2));

        let printed = run(|out| cmd_add(&mut list, out, "  ", None, None));
        assert_eq!(printed, "Nothing to add\n");

        let printed = run(|out| cmd_list(&mut list, out, None));
        assert!(printed.contains("Pay rent"));
        assert!(printed.contains("tomorrow !"));
        assert!(printed.ends_with("1 pending (all shown)\n"));
    }

    #[test]
    fn test_add_rejects_bad_due_date() {
        let mut list = list();
        let err = cmd_add(&mut list, &mut Vec::new(), "x", Some("someday"), None).unwrap_err();
        assert!(matches!(err.downcast_ref::<TaskError>(), Some(TaskError::InvalidDueDate { .. })));
        assert!(list.tasks().is_empty());
    }

    #[test]
    fn test_list_empty_filter_shows_placeholder() {
        let mut list = list();
        list.add("open", None, "work").unwrap();
        let printed = run(|out| cmd_list(&mut list, out, Some(Filter::Completed)));
        assert_eq!(printed, "No tasks\n1 pending (completed shown)\n");
    }

    #[test]
    fn test_toggle_edit_delete() {
        let mut list = list();
        let id = list.add("draft", None, "work").unwrap().unwrap();

        assert_eq!(run(|out| cmd_toggle(&mut list, out, id)), format!("Completed {id}\n"));
        assert_eq!(run(|out| cmd_toggle(&mut list, out, id)), format!("Reopened {id}\n"));
        assert_eq!(run(|out| cmd_edit(&mut list, out, id, "final")), format!("Updated {id}\n"));
        assert_eq!(run(|out| cmd_edit(&mut list, out, id, " ")), "Nothing changed\n");
        assert_eq!(list.get(id).unwrap().text, "final");
        assert_eq!(run(|out| cmd_delete(&mut list, out, id)), format!("Deleted {id}\n"));
        assert!(list.tasks().is_empty());

        for result in [
            cmd_toggle(&mut list, &mut Vec::new(), id),
            cmd_edit(&mut list, &mut Vec::new(), id, "x"),
            cmd_delete(&mut list, &mut Vec::new(), id),
        ] {
            let err = result.unwrap_err();
            assert_eq!(err.downcast_ref::<TaskError>(), Some(&TaskError::NotFound(id)));
        }
    }

    #[test]
    fn test_list_neutralises_control_characters() {
        let mut list = list();
        list.add("evil\u{1b}[2J", None, "work").unwrap();
        let printed = run(|out| cmd_list(&mut list, out, None));
        assert!(!printed.contains('\u{1b}'));
        assert!(printed.contains("evil\\u{1b}[2J"));
    }

    #[test]
    fn test_export_writes_page() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("tasks.html");
        let mut list = list();
        list.add("<i>x</i>", None, "work").unwrap();

        let printed = run(|out| cmd_export(&mut list, out, &path, None, Theme::Light));
        assert!(printed.starts_with("Exported 1 task(s)"));
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("&lt;i&gt;x&lt;/i&gt;"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-10", 10), "exactly-10");
        assert_eq!(truncate("much too long", 6), "much …");
    }
}
