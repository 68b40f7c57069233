// crates/block_resolver/src/lib.rs

//! Finds the line that opens the block (Ruby) or scope (Python) enclosing a
//! cursor position by scanning backwards over a [`TextBuffer`].

pub mod api;
pub mod buffer;
mod error;
mod factory; // internal
mod python;
mod ruby;
pub mod traits;

pub use api::{resolve_block_start, resolve_with};
pub use buffer::{BlockStart, Position, Selection, SourceBuffer};
pub use error::ResolveError;
pub use python::PythonScopeResolver;
pub use ruby::RubyBlockResolver;
pub use scope_tokenizer::Language;
pub use traits::{BlockResolver, TextBuffer};
