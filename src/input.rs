/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Editable text with a character-based cursor. Newlines are kept in the
/// value but drawn as a return glyph so the box stays one row tall.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
    cursor: usize,
}

impl TextField {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.chars().count();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Empties the field and hands back what was typed
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Visible slice and cursor column for a box `width` characters wide,
    /// scrolled horizontally so the cursor stays in view
    pub fn visible(&self, width: usize) -> (String, usize) {
        let offset = if width == 0 || self.cursor < width {
            0
        } else {
            self.cursor - width + 1
        };
        let text = self
            .value
            .chars()
            .skip(offset)
            .take(width)
            .map(|c| if c == '\n' { '↵' } else { c })
            .collect();
        (text, self.cursor - offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut field = TextField::default();
        for c in "héllo".chars() {
            field.insert(c);
        }
        field.move_left();
        field.move_left();
        field.move_left();
        field.backspace();
        assert_eq!(field.value(), "hllo");
        assert_eq!(field.visible(10).1, 1);
    }

    #[test]
    fn test_delete_at_end_is_noop() {
        let mut field = TextField::new("abc");
        field.delete();
        assert_eq!(field.value(), "abc");
        field.move_home();
        field.delete();
        assert_eq!(field.value(), "bc");
    }

    #[test]
    fn test_take_resets_cursor() {
        let mut field = TextField::new("Hello");
        assert_eq!(field.take(), "Hello");
        assert_eq!(field.value(), "");
        assert_eq!(field.visible(10).1, 0);
    }

    #[test]
    fn test_blank_detection() {
        assert!(TextField::new("   \t").is_blank());
        assert!(!TextField::new(" a ").is_blank());
    }

    #[test]
    fn test_visible_scrolls_with_cursor() {
        let field = TextField::new("abcdefghij");
        let (text, col) = field.visible(4);
        assert_eq!(text, "hij");
        assert_eq!(col, 3);

        let (text, col) = TextField::new("ab").visible(4);
        assert_eq!(text, "ab");
        assert_eq!(col, 2);
    }

    #[test]
    fn test_newline_shown_as_glyph() {
        let mut field = TextField::new("line one");
        field.insert('\n');
        field.insert('x');
        assert_eq!(field.value(), "line one\nx");
        assert_eq!(field.visible(20), ("line one↵x".to_string(), 10));
    }
}
