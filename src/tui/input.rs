// Prompt input buffer
//
// A small multi-line editor: the cursor is a byte offset that always sits on
// a char boundary. Enter submits (handled by the caller), Alt/Shift+Enter
// inserts a newline here.

use unicode_width::UnicodeWidthStr;

#[derive(Debug, Default, Clone)]
pub struct InputBuffer {
    text: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the contents and put the cursor at the end (example prompts)
    pub fn set(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    /// Take the contents, leaving the buffer empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn insert(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn newline(&mut self) {
        self.insert('\n');
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    /// Start of the current line
    pub fn home(&mut self) {
        self.cursor = self.text[..self.cursor]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
    }

    /// End of the current line
    pub fn end(&mut self) {
        self.cursor = self.text[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.text.len());
    }

    /// Delete back to the start of the line (Ctrl+U)
    pub fn clear_line(&mut self) {
        let end = self.cursor;
        self.home();
        self.text.replace_range(self.cursor..end, "");
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Cursor position as (row, display column)
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.text[..self.cursor];
        let row = before.matches('\n').count();
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (row, before[line_start..].width())
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|ch| self.cursor + ch.len_utf8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> InputBuffer {
        let mut input = InputBuffer::new();
        for ch in s.chars() {
            input.insert(ch);
        }
        input
    }

    #[test]
    fn test_typing_and_backspace_over_multibyte() {
        let mut input = typed("héllo 👋");
        input.backspace();
        input.backspace();
        assert_eq!(input.text(), "héllo");

        input.move_left();
        input.move_left();
        input.move_left();
        input.move_left();
        input.backspace();
        assert_eq!(input.text(), "éllo");
    }

    #[test]
    fn test_newline_and_cursor_position() {
        let mut input = typed("first");
        input.newline();
        input.insert_str("ab");
        assert_eq!(input.line_count(), 2);
        assert_eq!(input.cursor_position(), (1, 2));

        input.home();
        assert_eq!(input.cursor_position(), (1, 0));
        input.move_left();
        assert_eq!(input.cursor_position(), (0, 5));
    }

    #[test]
    fn test_home_end_and_delete() {
        let mut input = typed("one\ntwo");
        input.home();
        input.delete();
        assert_eq!(input.text(), "one\nwo");
        input.end();
        assert_eq!(input.cursor_position(), (1, 2));
    }

    #[test]
    fn test_clear_line_keeps_previous_lines() {
        let mut input = typed("keep\ndrop this");
        input.clear_line();
        assert_eq!(input.text(), "keep\n");
    }

    #[test]
    fn test_set_and_take() {
        let mut input = InputBuffer::new();
        input.set("A responsive navbar");
        assert_eq!(input.cursor_position(), (0, 19));
        assert!(!input.is_blank());

        assert_eq!(input.take(), "A responsive navbar");
        assert!(input.is_blank());
        input.insert('x');
        assert_eq!(input.text(), "x");
    }

    #[test]
    fn test_edges_are_noops() {
        let mut input = InputBuffer::new();
        input.backspace();
        input.delete();
        input.move_left();
        input.move_right();
        assert_eq!(input.text(), "");
        assert_eq!(input.cursor_position(), (0, 0));
    }
}
