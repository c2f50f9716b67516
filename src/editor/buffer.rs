use ropey::Rope;

use super::DocumentBuffer;

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
    /// Column to aim for when moving vertically through shorter lines.
    goal_col: usize,
}

impl Cursor {
    pub const fn new() -> Self {
        Self::at(0, 0)
    }

    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            goal_col: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.goal_col = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Editable chart document text backed by a rope.
///
/// The buffer is dirty whenever its text may differ from what was last
/// loaded or saved; callers mark it clean after doing either.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    dirty: bool,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::new(),
            dirty: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Cursor column counted in characters, for display.
    pub fn cursor_char_col(&self) -> usize {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.floor_char_boundary(self.cursor.line, self.cursor.col);
        line[..col].chars().count()
    }

    /// Whether the text changed since the buffer was last marked clean.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line ending.
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(line_idx).to_string();
        Some(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Line length in bytes, without the line ending.
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole text, keeping the cursor as close as possible.
    pub fn replace_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        let line = self.cursor.line.min(self.line_count().saturating_sub(1));
        let col = self.cursor.col.min(self.line_len(line));
        self.cursor = Cursor::at(line, self.floor_char_boundary(line, col));
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.split_line();
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert_char(idx, ch);
        self.cursor.set_col(self.cursor.col + ch.len_utf8());
        self.dirty = true;
    }

    /// Insert a string at the cursor; the cursor ends up after it.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, s);
        match s.rsplit_once('\n') {
            Some((head, tail)) => {
                self.cursor.line += head.matches('\n').count() + 1;
                self.cursor.set_col(tail.len());
            }
            None => self.cursor.set_col(self.cursor.col + s.len()),
        }
        self.dirty = true;
    }

    /// Break the line at the cursor, carrying the current indentation over.
    pub fn split_line(&mut self) {
        let indent: String = self
            .line_at(self.cursor.line)
            .unwrap_or_default()
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let indent_len = indent.len().min(self.cursor.col);
        let idx = self.cursor_char_idx();
        self.rope.insert(idx, &format!("\n{}", &indent[..indent_len]));
        self.cursor.line += 1;
        self.cursor.set_col(indent_len);
        self.dirty = true;
    }

    /// Delete the character before the cursor (Backspace).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor.line == 0 && self.cursor.col == 0 {
            return false;
        }
        let idx = self.cursor_char_idx();
        if self.cursor.col == 0 {
            let prev_len = self.line_len(self.cursor.line - 1);
            let line_start = self.rope.line_to_char(self.cursor.line);
            // Also swallow the '\r' of a CRLF ending.
            let ending = if line_start >= 2 && self.rope.char(line_start - 2) == '\r' {
                2
            } else {
                1
            };
            self.rope.remove(idx - ending..idx);
            self.cursor.line -= 1;
            self.cursor.set_col(prev_len);
        } else {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let prev_len = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.rope.remove(idx - 1..idx);
            self.cursor.set_col(self.cursor.col - prev_len);
        }
        self.dirty = true;
        true
    }

    /// Delete the character under the cursor (Delete).
    ///
    /// Returns `true` if anything was deleted.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if idx >= self.rope.len_chars() {
            return false;
        }
        let end = if self.rope.char(idx) == '\r'
            && idx + 1 < self.rope.len_chars()
            && self.rope.char(idx + 1) == '\n'
        {
            idx + 2
        } else {
            idx + 1
        };
        self.rope.remove(idx..end);
        self.dirty = true;
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
            Direction::Up => self.move_vertical(-1),
            Direction::Down => self.move_vertical(1),
        }
    }

    /// Move up (negative) or down (positive) by up to `delta` lines.
    pub fn move_lines(&mut self, delta: isize) {
        self.move_vertical(delta);
    }

    pub const fn move_home(&mut self) {
        self.cursor.set_col(0);
    }

    pub fn move_end(&mut self) {
        let len = self.line_len(self.cursor.line);
        self.cursor.set_col(len);
    }

    pub const fn move_to_start(&mut self) {
        self.cursor = Cursor::new();
    }

    pub fn move_to_end(&mut self) {
        let last = self.line_count().saturating_sub(1);
        self.cursor = Cursor::at(last, self.line_len(last));
    }

    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        let col = self.cursor.col.min(line.len());
        line_start + line[..col].chars().count()
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            let line = self.line_at(self.cursor.line).unwrap_or_default();
            let width = line[..self.cursor.col]
                .chars()
                .next_back()
                .map_or(1, char::len_utf8);
            self.cursor.set_col(self.cursor.col - width);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            let len = self.line_len(self.cursor.line);
            self.cursor.set_col(len);
        }
    }

    fn move_right(&mut self) {
        let line = self.line_at(self.cursor.line).unwrap_or_default();
        if let Some(ch) = line[self.cursor.col.min(line.len())..].chars().next() {
            self.cursor.set_col(self.cursor.col + ch.len_utf8());
        } else if self.cursor.line + 1 < self.line_count() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let last = self.line_count().saturating_sub(1);
        let target = self.cursor.line.saturating_add_signed(delta).min(last);
        if target == self.cursor.line {
            return;
        }
        self.cursor.line = target;
        let col = self.cursor.goal_col.min(self.line_len(target));
        self.cursor.col = self.floor_char_boundary(target, col);
    }

    fn floor_char_boundary(&self, line_idx: usize, col: usize) -> usize {
        let line = self.line_at(line_idx).unwrap_or_default();
        let mut col = col.min(line.len());
        while !line.is_char_boundary(col) {
            col -= 1;
        }
        col
    }
}

impl DocumentBuffer for EditorBuffer {
    fn read(&self) -> String {
        self.text()
    }

    fn write(&mut self, text: &str) {
        self.replace_text(text);
        self.dirty = true;
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.line_count())
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_at(text: &str, line: usize, col: usize) -> EditorBuffer {
        let mut buf = EditorBuffer::from_text(text);
        buf.cursor = Cursor::at(line, col);
        buf
    }

    #[test]
    fn test_empty_buffer_has_one_line() {
        let buf = EditorBuffer::empty();
        assert_eq!(buf.line_count(), 1);
        assert_eq!(buf.line_at(0).as_deref(), Some(""));
        assert_eq!(buf.line_at(1), None);
    }

    #[test]
    fn test_insert_char_advances_by_utf8_width() {
        let mut buf = EditorBuffer::from_text("ab");
        buf.move_end();
        buf.insert_char('é');
        assert_eq!(buf.text(), "abé");
        assert_eq!(buf.cursor().col, 4);
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_cursor_char_col_counts_characters() {
        let buf = buffer_at("\"é\": 1", 0, 4);
        assert_eq!(buf.cursor().col, 4);
        assert_eq!(buf.cursor_char_col(), 3);
    }

    #[test]
    fn test_insert_str_multiline_moves_cursor_to_tail() {
        let mut buf = EditorBuffer::from_text("{}");
        buf.move_cursor(Direction::Right);
        buf.insert_str("\n  \"a\": 1\n");
        assert_eq!(buf.text(), "{\n  \"a\": 1\n}");
        assert_eq!(buf.cursor(), Cursor::at(2, 0));
    }

    #[test]
    fn test_split_line_keeps_indentation() {
        let mut buf = buffer_at("{\n  \"width\": 600,\n}", 1, 15);
        buf.split_line();
        assert_eq!(buf.text(), "{\n  \"width\": 600,\n  \n}");
        assert_eq!(buf.cursor(), Cursor::at(2, 2));
    }

    #[test]
    fn test_split_line_inside_indent_does_not_duplicate_it() {
        let mut buf = buffer_at("    x", 0, 2);
        buf.split_line();
        assert_eq!(buf.text(), "  \n    x");
        assert_eq!(buf.cursor(), Cursor::at(1, 2));
    }

    #[test]
    fn test_delete_back_joins_lines() {
        let mut buf = buffer_at("ab\ncd", 1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "abcd");
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_delete_back_joins_crlf_lines() {
        let mut buf = buffer_at("ab\r\ncd", 1, 0);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "abcd");
    }

    #[test]
    fn test_delete_back_multibyte() {
        let mut buf = buffer_at("aé", 0, 3);
        assert!(buf.delete_back());
        assert_eq!(buf.text(), "a");
        assert_eq!(buf.cursor().col, 1);
    }

    #[test]
    fn test_delete_at_edges_is_noop() {
        let mut buf = EditorBuffer::from_text("x");
        assert!(!buf.delete_back());
        buf.move_to_end();
        assert!(!buf.delete_forward());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_delete_forward_joins_lines() {
        let mut buf = buffer_at("ab\ncd", 0, 2);
        assert!(buf.delete_forward());
        assert_eq!(buf.text(), "abcd");
    }

    #[test]
    fn test_vertical_move_remembers_goal_column() {
        let mut buf = buffer_at("abcdef\nab\nabcdef", 0, 5);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 5);
    }

    #[test]
    fn test_vertical_move_lands_on_char_boundary() {
        let mut buf = buffer_at("abc\néé", 0, 3);
        buf.move_cursor(Direction::Down);
        assert_eq!(buf.cursor().col, 2);
    }

    #[test]
    fn test_move_lines_clamps() {
        let mut buf = EditorBuffer::from_text("a\nb\nc");
        buf.move_lines(10);
        assert_eq!(buf.cursor().line, 2);
        buf.move_lines(-10);
        assert_eq!(buf.cursor().line, 0);
    }

    #[test]
    fn test_horizontal_move_wraps_lines() {
        let mut buf = buffer_at("ab\ncd", 0, 2);
        buf.move_cursor(Direction::Right);
        assert_eq!(buf.cursor(), Cursor::at(1, 0));
        buf.move_cursor(Direction::Left);
        assert_eq!(buf.cursor(), Cursor::at(0, 2));
    }

    #[test]
    fn test_write_replaces_text_and_clamps_cursor() {
        let mut buf = buffer_at("line one\nline two\nline three", 2, 8);
        buf.write("{}");
        assert_eq!(buf.read(), "{}");
        assert!(buf.is_dirty());
        assert_eq!(buf.cursor(), Cursor::at(0, 2));

        buf.mark_clean();
        assert!(!buf.is_dirty());
    }
}
