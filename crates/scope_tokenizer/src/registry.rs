// crates/scope_tokenizer/src/registry.rs

use std::borrow::Cow;
use std::fs;
use std::path::PathBuf;

use log::debug;
use once_cell::sync::{Lazy, OnceCell};

use crate::grammar::{bundled_definition, GrammarTokenizer};
use crate::{Language, LineTokenizer, TokenizeError};

static GLOBAL: Lazy<GrammarRegistry> = Lazy::new(GrammarRegistry::bundled);

enum GrammarSource {
    Bundled,
    /// `<dir>/<language>.sublime-syntax`
    Directory(PathBuf),
}

/// Compiles each grammar at most once and hands out the cached tokenizer on
/// every later request.
pub struct GrammarRegistry {
    source: GrammarSource,
    ruby: OnceCell<GrammarTokenizer>,
    python: OnceCell<GrammarTokenizer>,
}

impl GrammarRegistry {
    /// Registry over the grammars compiled into the crate.
    pub fn bundled() -> Self {
        Self::with_source(GrammarSource::Bundled)
    }

    /// Registry that reads `ruby.sublime-syntax` / `python.sublime-syntax`
    /// from `dir` when a language is first requested.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::with_source(GrammarSource::Directory(dir.into()))
    }

    fn with_source(source: GrammarSource) -> Self {
        Self { source, ruby: OnceCell::new(), python: OnceCell::new() }
    }

    /// Process-wide registry over the bundled grammars.
    pub fn global() -> &'static GrammarRegistry {
        &GLOBAL
    }

    fn cell(&self, language: Language) -> &OnceCell<GrammarTokenizer> {
        match language {
            Language::Ruby => &self.ruby,
            Language::Python => &self.python,
        }
    }

    fn definition(&self, language: Language) -> Result<Cow<'static, str>, TokenizeError> {
        match &self.source {
            GrammarSource::Bundled => Ok(Cow::Borrowed(bundled_definition(language))),
            GrammarSource::Directory(dir) => {
                let path = dir.join(language.grammar_file());
                debug!("reading grammar {}", path.display());
                fs::read_to_string(&path).map(Cow::Owned).map_err(|e| {
                    TokenizeError::Unavailable {
                        language,
                        reason: format!("{}: {e}", path.display()),
                    }
                })
            }
        }
    }

    /// Returns the tokenizer for `language`, compiling it on first use.
    /// A failed load is not cached, so the next call tries again.
    pub fn load(&self, language: Language) -> Result<&dyn LineTokenizer, TokenizeError> {
        let tokenizer = self.cell(language).get_or_try_init(|| {
            debug!("loading grammar {}", language.scope_name());
            let definition = self.definition(language)?;
            GrammarTokenizer::from_definition(language, &definition)
        })?;
        Ok(tokenizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_once_and_caches() {
        let registry = GrammarRegistry::bundled();
        let first = registry.load(Language::Ruby).unwrap();
        let second = registry.load(Language::Ruby).unwrap();
        assert!(std::ptr::addr_eq(first, second));
        assert!(registry.python.get().is_none());
        assert_eq!(registry.load(Language::Python).unwrap().language(), Language::Python);
    }

    #[test]
    fn missing_grammar_directory_is_unavailable() {
        let registry = GrammarRegistry::from_dir("/nonexistent/grammars");
        let err = registry.load(Language::Ruby).err();
        assert!(matches!(err, Some(TokenizeError::Unavailable { language: Language::Ruby, .. })));
        assert!(registry.ruby.get().is_none());
    }
}
