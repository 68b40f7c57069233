// crates/block_resolver/src/error.rs

use scope_tokenizer::TokenizeError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
    #[error("line {line} is outside the buffer ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },
}
