//! Static HTML rendering of a list view.
//!
//! Produces the markup of the task list page: one `<li>` per row with the
//! completion and due-soon classes, the empty placeholder, and the pending
//! counter. User-supplied text always goes through `escape`.

use std::borrow::Cow;
use std::fmt::Write;

use crate::fields::{Filter, Theme};
use crate::task::DUE_DATE_FORMAT;
use crate::view::ListView;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Render the list section of the page.
pub fn render_list(view: &ListView) -> String {
    let mut html = String::new();
    html.push_str("<ul class=\"task-list\">\n");

    if let Some(placeholder) = view.placeholder {
        let _ = writeln!(html, "  <li class=\"no-tasks\">{}</li>", escape(placeholder));
    }

    for row in &view.rows {
        let mut classes = vec!["task"];
        if row.done {
            classes.push("completed");
        }
        if row.due_soon {
            classes.push("due-soon");
        }
        if row.removing {
            classes.push("removing");
        }
        let due = row
            .due_date
            .map(|d| d.format(DUE_DATE_FORMAT).to_string())
            .unwrap_or_default();

        let _ = writeln!(html, "  <li class=\"{}\" data-id=\"{}\">", classes.join(" "), row.id);
        let _ = writeln!(
            html,
            "    <input type=\"checkbox\"{}>",
            if row.done { " checked" } else { "" }
        );
        let _ = writeln!(html, "    <span class=\"task-text\">{}</span>", escape(&row.text));
        let _ = writeln!(html, "    <small class=\"category\">{}</small>", escape(&row.category));
        let _ = writeln!(html, "    <small class=\"date\">{}</small>", due);
        html.push_str("    <button class=\"btn-edit\">Edit</button>\n");
        html.push_str("    <button class=\"btn-delete\">Delete</button>\n");
        html.push_str("  </li>\n");
    }

    html.push_str("</ul>\n");
    html
}

/// Render a standalone page: filter controls, pending counter and the list.
pub fn render_page(view: &ListView, theme: Theme) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Tasks</title></head>\n");
    let _ = writeln!(html, "<body{}>", if theme.is_dark() { " class=\"dark\"" } else { "" });

    html.push_str("<nav class=\"filters\">\n");
    for filter in Filter::ALL {
        let active = if filter == view.filter { " active" } else { "" };
        let _ = writeln!(
            html,
            "  <button class=\"filter{}\" data-filter=\"{}\">{}</button>",
            active,
            filter,
            filter.label()
        );
    }
    html.push_str("</nav>\n");

    let _ = writeln!(html, "<p>Pending: <span id=\"pending-count\">{}</span></p>", view.pending_count);
    html.push_str(&render_list(view));
    html.push_str("</body>\n</html>\n");
    html
}
