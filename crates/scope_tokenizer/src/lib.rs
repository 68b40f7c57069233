// crates/scope_tokenizer/src/lib.rs

//! Line tokenizers that label every token with TextMate-style scope names.
//!
//! - [`LineTokenizer`] is the one trait the resolvers depend on.
//! - [`GrammarRegistry`] compiles the bundled `.sublime-syntax` grammars with
//!   `syntect` on first use.
//! - Labels stay verbatim on each [`Token`] and are classified once into
//!   [`ScopeTags`].
//! - Multi-line constructs are carried through an opaque [`LexState`].

use std::fmt;

use syntect::parsing::{ParseState, ScopeStack};
use thiserror::Error;

mod grammar;
mod registry;
mod scope;

pub use grammar::GrammarTokenizer;
pub use registry::GrammarRegistry;
pub use scope::{ScopeTag, ScopeTags};

/// A span of one line's text together with the scope labels the tokenizer
/// assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Start byte offset into the line (inclusive).
    pub start: usize,
    /// End byte offset into the line (exclusive).
    pub end: usize,
    /// Scope labels, outermost first, exactly as produced by the grammar.
    pub scopes: Vec<String>,
    /// One-pass classification of `scopes`.
    pub tags: ScopeTags,
}

impl Token {
    pub fn new(start: usize, end: usize, scopes: Vec<String>) -> Self {
        let tags = ScopeTags::classify(&scopes);
        Self { start, end, scopes, tags }
    }

    /// The token's text within `line`.
    pub fn text<'a>(&self, line: &'a str) -> &'a str {
        line.get(self.start..self.end).unwrap_or("")
    }

    /// True when the token sits in a comment or a string.
    pub fn is_comment_or_string(&self) -> bool {
        self.tags.contains(ScopeTag::Comment) || self.tags.contains(ScopeTag::String)
    }
}

/// Lexer state carried from the end of one line into the next.
///
/// `LexState::default()` means start of file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LexState(Option<Carried>);

impl LexState {
    /// True if the next line starts in plain code.
    pub fn is_initial(&self) -> bool {
        self.0
            .as_ref()
            .map_or(true, |carried| carried.scopes.as_slice().len() <= 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Carried {
    language: Language,
    parse: ParseState,
    scopes: ScopeStack,
}

/// The tokens of one line plus the state to feed into the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine {
    pub tokens: Vec<Token>,
    pub state: LexState,
}

/// Languages with a bundled grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Ruby,
    Python,
}

impl Language {
    /// TextMate root scope of the grammar.
    pub fn scope_name(self) -> &'static str {
        match self {
            Language::Ruby => "source.ruby",
            Language::Python => "source.python",
        }
    }

    /// Returns the language matching the file extension, ignoring case.
    pub fn for_extension(ext: &str) -> Option<Language> {
        match ext.to_lowercase().as_str() {
            "rb" | "rake" | "gemspec" | "ru" => Some(Language::Ruby),
            "py" | "pyw" => Some(Language::Python),
            _ => None,
        }
    }

    /// File name of the grammar inside a grammar directory.
    pub fn grammar_file(self) -> String {
        format!("{self}.sublime-syntax")
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Ruby => f.write_str("ruby"),
            Language::Python => f.write_str("python"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("grammar for {language} is unavailable: {reason}")]
    Unavailable { language: Language, reason: String },
    #[error("lexer state from another grammar was passed to the {0} tokenizer")]
    ForeignState(Language),
}

/// Abstracts the minimum the resolvers need from a grammar.
pub trait LineTokenizer: Sync + Send {
    /// Which language this tokenizer lexes.
    fn language(&self) -> Language;

    /// Splits `text` (one line, no terminator) into scope-labelled tokens.
    ///
    /// `prior` is the state returned for the previous line, or `None` at the
    /// start of the file or when the context is unknown.
    fn tokenize_line(
        &self,
        text: &str,
        prior: Option<&LexState>,
    ) -> Result<TokenizedLine, TokenizeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(Language::for_extension("RB"), Some(Language::Ruby));
        assert_eq!(Language::for_extension("gemspec"), Some(Language::Ruby));
        assert_eq!(Language::for_extension("Py"), Some(Language::Python));
        assert_eq!(Language::for_extension("swift"), None);
    }

    #[test]
    fn grammar_file_names_follow_the_language() {
        assert_eq!(Language::Ruby.grammar_file(), "ruby.sublime-syntax");
        assert_eq!(Language::Python.grammar_file(), "python.sublime-syntax");
    }

    #[test]
    fn default_state_is_initial() {
        assert!(LexState::default().is_initial());
    }

    #[test]
    fn token_text_is_empty_for_out_of_range_offsets() {
        let token = Token::new(3, 10, vec!["source.ruby".into()]);
        assert_eq!(token.text("abc"), "");
    }
}
