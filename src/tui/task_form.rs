//! Add-task form for the terminal user interface.
//!
//! The form mirrors the page's add form: a text input, an optional due date
//! input and a category selector, navigated with Tab/Shift+Tab.

use crate::tui::input::InputField;

/// Field order within the form.
pub const TEXT_FIELD: usize = 0;
pub const DUE_FIELD: usize = 1;
pub const CATEGORY_FIELD: usize = 2;
const FIELD_COUNT: usize = 3;

pub struct TaskForm {
    pub text: InputField,
    pub due: InputField,
    pub category: usize,
    pub categories: Vec<String>,
    pub current_field: usize,
}

impl TaskForm {
    pub fn new(categories: Vec<String>) -> Self {
        let mut form = Self {
            text: InputField::new(),
            due: InputField::new(),
            category: 0,
            categories,
            current_field: TEXT_FIELD,
        };
        form.update_active_field();
        form
    }

    /// Keep the `active` flags in line with `current_field`.
    pub fn update_active_field(&mut self) {
        self.text.active = self.current_field == TEXT_FIELD;
        self.due.active = self.current_field == DUE_FIELD;
    }

    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// The text input under the cursor, if the current field is one.
    pub fn active_input_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TEXT_FIELD => Some(&mut self.text),
            DUE_FIELD => Some(&mut self.due),
            _ => None,
        }
    }

    pub fn cycle_category(&mut self, forward: bool) {
        let n = self.categories.len();
        if n == 0 {
            return;
        }
        self.category = if forward {
            (self.category + 1) % n
        } else {
            (self.category + n - 1) % n
        };
    }

    pub fn selected_category(&self) -> &str {
        self.categories.get(self.category).map(String::as_str).unwrap_or_default()
    }

    /// Clear text and date after a successful submit; the category stays.
    pub fn reset_after_submit(&mut self) {
        self.text.clear();
        self.due.clear();
        self.current_field = TEXT_FIELD;
        self.update_active_field();
    }
}
