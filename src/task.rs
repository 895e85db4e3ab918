//! Task data structure and its stored representation.
//!
//! This module defines the `Task` record kept by the task list, and the serde
//! glue that keeps the stored attribute names (`id`, `text`, `done`, `dueDate`,
//! `category`) stable.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Date format used for stored and displayed due dates.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(
        rename = "dueDate",
        default,
        serialize_with = "serialize_due",
        deserialize_with = "deserialize_due"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: String,
}

impl Task {
    /// Create an open task. `text` is expected to be trimmed and non-empty already.
    pub fn new(id: u64, text: impl Into<String>, due_date: Option<NaiveDate>, category: impl Into<String>) -> Self {
        Task {
            id,
            text: text.into(),
            done: false,
            due_date,
            category: category.into(),
        }
    }
}

// Absent dates are stored as "" rather than omitted.
fn serialize_due<S>(due: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match due {
        Some(date) => serializer.collect_str(&date.format(DUE_DATE_FORMAT)),
        None => serializer.serialize_str(""),
    }
}

fn deserialize_due<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DUE_DATE_FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
