//! Input field handling for the terminal user interface.

use ratatui::text::Span;

/// A single-line text input with a cursor counted in characters.
#[derive(Clone, Debug, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            active: false,
        }
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn len_chars(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.value.insert(idx, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let idx = self.byte_index(self.cursor - 1);
            self.value.remove(idx);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.len_chars() {
            let idx = self.byte_index(self.cursor);
            self.value.remove(idx);
        }
    }

    /// Move cursor one position to the left.
    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Move cursor one position to the right.
    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len_chars() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.len_chars();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Terminal columns taken by the text before the cursor.
    pub fn cursor_column(&self) -> u16 {
        let before = &self.value[..self.byte_index(self.cursor)];
        u16::try_from(Span::raw(before).width()).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut field = InputField::with_value("café");
        assert_eq!(field.cursor, 4);
        field.handle_backspace();
        assert_eq!(field.value, "caf");
        field.handle_char('é');
        field.move_cursor_home();
        field.handle_char('¡');
        assert_eq!(field.value, "¡café");
        field.move_cursor_right();
        field.handle_delete();
        assert_eq!(field.value, "¡cfé");
        field.move_cursor_end();
        field.handle_delete();
        assert_eq!(field.value, "¡cfé");
        field.clear();
        assert_eq!((field.value.as_str(), field.cursor), ("", 0));
    }

    #[test]
    fn test_cursor_column_counts_display_width() {
        let mut field = InputField::with_value("日本x");
        assert_eq!(field.cursor, 3);
        assert_eq!(field.cursor_column(), 5);
        field.move_cursor_left();
        assert_eq!(field.cursor_column(), 4);
        field.move_cursor_home();
        assert_eq!(field.cursor_column(), 0);
    }
}
