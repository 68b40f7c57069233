// crates/block_resolver/src/buffer.rs

//! Cursor, selection and an in-memory [`TextBuffer`].
//!
//! Columns are counted in characters, the way an editor reports them.
//! Resolvers convert to byte offsets with [`char_to_byte`] before comparing
//! against token offsets.

use crate::traits::TextBuffer;

/// Zero-based line and character column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Orders the two ends, so a selection made right to left has the same
    /// `start` as one made left to right.
    pub fn new(anchor: Position, active: Position) -> Self {
        Self { start: anchor.min(active), end: anchor.max(active) }
    }

    /// A collapsed selection (plain cursor).
    pub fn caret(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

/// The line a resolver settled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStart {
    pub line: usize,
    pub text: String,
}

impl BlockStart {
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self { line, text: text.into() }
    }

    /// Column of the first non-whitespace character, or the line length
    /// when the line is blank.
    pub fn first_non_whitespace_column(&self) -> usize {
        self.text
            .chars()
            .position(|c| !c.is_whitespace())
            .unwrap_or_else(|| self.end_column())
    }

    /// Column just past the last character.
    pub fn end_column(&self) -> usize {
        self.text.chars().count()
    }
}

/// Lines of a document held in memory.
#[derive(Debug, Clone, Default)]
pub struct SourceBuffer {
    lines: Vec<String>,
}

impl SourceBuffer {
    /// Splits on `\n`, dropping a trailing `\r` from each line.
    pub fn from_source(source: &str) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
        }
    }
}

impl TextBuffer for SourceBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_at(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn word_range_at(&self, position: Position) -> Option<Selection> {
        let chars: Vec<char> = self.line_at(position.line)?.chars().collect();
        let col = position.character.min(chars.len());
        let is_word = |c: char| c.is_alphanumeric() || c == '_';

        // On a word, or directly after one.
        let anchor = if chars.get(col).copied().is_some_and(is_word) {
            col
        } else if col > 0 && is_word(chars[col - 1]) {
            col - 1
        } else {
            return None;
        };

        let mut start = anchor;
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        let mut end = anchor + 1;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }
        Some(Selection::new(
            Position::new(position.line, start),
            Position::new(position.line, end),
        ))
    }
}

/// Byte offset of character column `column` in `line`, clamped to the line
/// length.
pub(crate) fn char_to_byte(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(offset, _)| offset)
}

/// Width of the leading whitespace run, in characters.
pub(crate) fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_range_covers_word_under_and_after_cursor() {
        let buffer = SourceBuffer::from_source("  some_word(x)");
        let expected = Selection::new(Position::new(0, 2), Position::new(0, 11));
        assert_eq!(buffer.word_range_at(Position::new(0, 5)), Some(expected));
        assert_eq!(buffer.word_range_at(Position::new(0, 11)), Some(expected));
        assert_eq!(buffer.word_range_at(Position::new(0, 0)), None);
        assert_eq!(buffer.word_range_at(Position::new(3, 0)), None);
    }

    #[test]
    fn text_in_selection_uses_character_columns() {
        let buffer = SourceBuffer::from_source("naïve end");
        let sel = Selection::new(Position::new(0, 6), Position::new(0, 9));
        assert_eq!(buffer.text_in(sel).as_deref(), Some("end"));
        let multi = Selection::new(Position::new(0, 0), Position::new(1, 0));
        assert_eq!(buffer.text_in(multi), None);
    }

    #[test]
    fn selection_ends_are_ordered() {
        let backwards = Selection::new(Position::new(0, 9), Position::new(0, 6));
        assert_eq!(backwards.start, Position::new(0, 6));
        assert_eq!(backwards.end, Position::new(0, 9));
        let buffer = SourceBuffer::from_source("naïve end");
        assert_eq!(buffer.text_in(backwards).as_deref(), Some("end"));
        let upwards = Selection::new(Position::new(2, 0), Position::new(1, 4));
        assert_eq!(upwards.start.line, 1);
        assert!(!upwards.is_single_line());
    }

    #[test]
    fn crlf_lines_are_trimmed() {
        let buffer = SourceBuffer::from_source("def a\r\nend\r\n");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line_at(0), Some("def a"));
    }

    #[test]
    fn columns_convert_to_bytes() {
        assert_eq!(char_to_byte("naïve end", 6), 7);
        assert_eq!(char_to_byte("abc", 10), 3);
        assert_eq!(indent_width("\t  x"), 3);
    }

    #[test]
    fn highlight_columns_skip_indentation() {
        let start = BlockStart::new(4, "    def foo");
        assert_eq!(start.first_non_whitespace_column(), 4);
        assert_eq!(start.end_column(), 11);
    }
}
