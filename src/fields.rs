//! Enumerations used to select and present tasks.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// View predicate applied when the list is rendered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
}

impl Filter {
    /// Every filter, in the order the filter controls are shown.
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Pending, Filter::Completed];

    /// Whether `task` is visible under this filter.
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Pending => !task.done,
            Filter::Completed => task.done,
        }
    }

    /// Tasks visible under this filter, in list order.
    pub fn apply(self, tasks: &[Task]) -> Vec<&Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }

    /// The next filter control, wrapping around.
    pub fn next(self) -> Filter {
        match self {
            Filter::All => Filter::Pending,
            Filter::Pending => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Pending => "Pending",
            Filter::Completed => "Completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Filter::All => "all",
            Filter::Pending => "pending",
            Filter::Completed => "completed",
        })
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "pending" => Ok(Filter::Pending),
            "completed" | "done" => Ok(Filter::Completed),
            other => Err(format!("unknown filter '{other}' (expected all, pending or completed)")),
        }
    }
}

/// Cosmetic display mode. Starts from configuration and is never stored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Label of the mode toggle, naming the mode it switches to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            Theme::Light => "🌙 Dark mode",
            Theme::Dark => "☀️ Light mode",
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Task> {
        let mut tasks = vec![
            Task::new(3, "three", None, "work"),
            Task::new(2, "two", None, "work"),
            Task::new(1, "one", None, "personal"),
        ];
        tasks[1].done = true;
        tasks
    }

    #[test]
    fn test_filter_predicates() {
        let tasks = sample();
        for filter in Filter::ALL {
            let visible = filter.apply(&tasks);
            // Every visible task matches, and every matching task is visible.
            assert!(visible.iter().all(|t| filter.matches(t)));
            let expected = tasks.iter().filter(|t| filter.matches(t)).count();
            assert_eq!(visible.len(), expected);
        }
        let ids: Vec<u64> = Filter::Pending.apply(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 1]);
        let ids: Vec<u64> = Filter::Completed.apply(&tasks).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(Filter::All.apply(&tasks).len(), 3);
    }

    #[test]
    fn test_parse_and_cycle() {
        assert_eq!("Pending".parse::<Filter>(), Ok(Filter::Pending));
        assert_eq!(" done ".parse::<Filter>(), Ok(Filter::Completed));
        assert!("soon".parse::<Filter>().is_err());
        assert_eq!(Filter::Completed.next(), Filter::All);
        assert_eq!(Filter::default(), Filter::All);
        assert_eq!(Filter::Pending.to_string(), "pending");
    }

    #[test]
    fn test_theme_toggle_label() {
        let theme = Theme::default();
        assert_eq!(theme.toggle_label(), "🌙 Dark mode");
        let theme = theme.toggle();
        assert!(theme.is_dark());
        assert_eq!(theme.toggle_label(), "☀️ Light mode");
        assert_eq!(theme.toggle(), Theme::Light);
    }
}
