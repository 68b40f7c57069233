// crates/block_resolver/src/api.rs

use scope_tokenizer::{GrammarRegistry, Language, LineTokenizer};

use crate::buffer::{BlockStart, Position};
use crate::error::ResolveError;
use crate::factory::create_resolver;
use crate::traits::TextBuffer;

/// Resolves the block or scope enclosing `cursor` using the cached grammar
/// for `language`.
pub fn resolve_block_start(
    buffer: &dyn TextBuffer,
    cursor: Position,
    language: Language,
) -> Result<Option<BlockStart>, ResolveError> {
    let tokenizer = GrammarRegistry::global().load(language)?;
    resolve_with(tokenizer, buffer, cursor)
}

/// Same as [`resolve_block_start`] with an explicit tokenizer; the resolver
/// is chosen by the tokenizer's language.
pub fn resolve_with(
    tokenizer: &dyn LineTokenizer,
    buffer: &dyn TextBuffer,
    cursor: Position,
) -> Result<Option<BlockStart>, ResolveError> {
    create_resolver(tokenizer.language(), tokenizer).resolve(buffer, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SourceBuffer;

    #[test]
    fn resolves_through_the_registry() {
        let buffer = SourceBuffer::from_source("class A\n  x\nend");
        let start = resolve_block_start(&buffer, Position::new(1, 2), Language::Ruby).unwrap();
        assert_eq!(start, Some(BlockStart::new(0, "class A")));
    }

    #[test]
    fn empty_buffer_is_out_of_range() {
        let buffer = SourceBuffer::from_source("");
        let err = resolve_block_start(&buffer, Position::new(0, 0), Language::Python).unwrap_err();
        assert_eq!(err, ResolveError::LineOutOfRange { line: 0, line_count: 0 });
    }
}
