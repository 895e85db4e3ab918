//! Due date handling: parsing user input, the due-soon rule and relative labels.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::TaskError;
use crate::task::DUE_DATE_FORMAT;

/// Default width of the "approaching due" window.
pub const DUE_SOON_HOURS: i64 = 48;

/// Whether a task due on `due` counts as approaching its due date at `now`.
///
/// The date is taken as midnight local time. A task is due soon when that
/// instant lies strictly after `now` and strictly less than `window` ahead.
/// Overdue tasks are never due soon.
pub fn is_due_soon(due: Option<NaiveDate>, now: NaiveDateTime, window: Duration) -> bool {
    let Some(date) = due else {
        return false;
    };
    let diff = date.and_time(chrono::NaiveTime::MIN) - now;
    diff > Duration::zero() && diff < window
}

/// Parse a due date typed by the user.
///
/// Supports:
/// - "" (no due date)
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Result<Option<NaiveDate>, TaskError> {
    let s = s.trim().to_lowercase();
    let invalid = || TaskError::InvalidDueDate { input: s.clone() };

    match s.as_str() {
        "" => return Ok(None),
        "today" => return Ok(Some(today)),
        "tomorrow" => return today.succ_opt().map(Some).ok_or_else(invalid),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let offset = if let Some(nd) = rest.strip_suffix('d') {
            nd.trim().parse::<i64>().ok().and_then(Duration::try_days)
        } else if let Some(nw) = rest.strip_suffix('w') {
            nw.trim().parse::<i64>().ok().and_then(Duration::try_weeks)
        } else {
            None
        };
        return offset
            .and_then(|offset| today.checked_add_signed(offset))
            .map(Some)
            .ok_or_else(invalid);
    }

    NaiveDate::parse_from_str(&s, DUE_DATE_FORMAT)
        .map(Some)
        .map_err(|_| invalid())
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let delta = (d - today).num_days();
            if delta == 0 {
                "today".into()
            } else if delta == 1 {
                "tomorrow".into()
            } else if delta > 1 {
                format!("in {}d", delta)
            } else {
                format!("{}d late", -delta)
            }
        }
    }
}
