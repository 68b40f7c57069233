// crates/block_resolver/src/traits.rs

use scope_tokenizer::Language;

use crate::buffer::{BlockStart, Position, Selection};
use crate::error::ResolveError;

/// Read access to the lines of a document.
pub trait TextBuffer {
    fn line_count(&self) -> usize;

    /// Text of line `index` without its terminator, or `None` past the end.
    fn line_at(&self, index: usize) -> Option<&str>;

    /// Range of the word touching `position`, or `None` when the position is
    /// not on or directly after a word character.
    fn word_range_at(&self, position: Position) -> Option<Selection>;

    /// Text inside a single-line selection; `None` for a multi-line one or a
    /// line past the end.
    fn text_in(&self, selection: Selection) -> Option<String> {
        if !selection.is_single_line() {
            return None;
        }
        let line = self.line_at(selection.start.line)?;
        let (from, to) = (selection.start.character, selection.end.character);
        Some(line.chars().skip(from).take(to.saturating_sub(from)).collect())
    }
}

/// Locates the line opening the construct that encloses a cursor.
pub trait BlockResolver {
    fn language(&self) -> Language;

    /// Scans backwards from `cursor.line`.  `Ok(None)` means nothing encloses
    /// the cursor.
    fn resolve(
        &self,
        buffer: &dyn TextBuffer,
        cursor: Position,
    ) -> Result<Option<BlockStart>, ResolveError>;
}
