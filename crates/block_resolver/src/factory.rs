// crates/block_resolver/src/factory.rs

use scope_tokenizer::{Language, LineTokenizer};

use crate::python::PythonScopeResolver;
use crate::ruby::RubyBlockResolver;
use crate::traits::BlockResolver;

// Only visible within the crate.
pub(crate) fn create_resolver<'t>(
    language: Language,
    tokenizer: &'t dyn LineTokenizer,
) -> Box<dyn BlockResolver + 't> {
    match language {
        Language::Ruby => Box::new(RubyBlockResolver::new(tokenizer)),
        Language::Python => Box::new(PythonScopeResolver::new(tokenizer)),
    }
}
