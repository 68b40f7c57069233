// crates/scope_tokenizer/src/grammar.rs

//! `syntect`-backed [`LineTokenizer`].
//!
//! Each line is fed to the parser with its `\n` restored. The scope stack
//! between two consecutive parser operations becomes one region, and regions
//! are cut further into whitespace and non-whitespace runs so callers can
//! look at "the first significant token" directly.

use std::fmt::Display;

use syntect::parsing::{ParseState, ScopeStack, SyntaxDefinition, SyntaxReference, SyntaxSet, SyntaxSetBuilder};

use crate::{Carried, Language, LexState, LineTokenizer, Token, TokenizeError, TokenizedLine};

const RUBY_GRAMMAR: &str = include_str!("../grammars/ruby.sublime-syntax");
const PYTHON_GRAMMAR: &str = include_str!("../grammars/python.sublime-syntax");

/// The grammar shipped with the crate for `language`.
pub(crate) fn bundled_definition(language: Language) -> &'static str {
    match language {
        Language::Ruby => RUBY_GRAMMAR,
        Language::Python => PYTHON_GRAMMAR,
    }
}

/// One compiled grammar.
pub struct GrammarTokenizer {
    language: Language,
    syntaxes: SyntaxSet,
}

impl GrammarTokenizer {
    /// Compiles a `.sublime-syntax` definition. Its root scope must be the
    /// one `language` expects.
    pub fn from_definition(language: Language, source: &str) -> Result<Self, TokenizeError> {
        let definition =
            SyntaxDefinition::load_from_str(source, true, Some(&language.to_string()))
                .map_err(|e| unavailable(language, e))?;
        let root = definition.scope.build_string();
        if root != language.scope_name() {
            return Err(unavailable(
                language,
                format!("grammar declares scope '{root}', expected '{}'", language.scope_name()),
            ));
        }
        let mut builder = SyntaxSetBuilder::new();
        builder.add(definition);
        let tokenizer = Self { language, syntaxes: builder.build() };
        // Resolves the main context once, so a dangling context reference
        // fails here and not in the middle of a scan.
        tokenizer.tokenize_line("", None)?;
        Ok(tokenizer)
    }

    fn syntax(&self) -> Result<&SyntaxReference, TokenizeError> {
        self.syntaxes
            .syntaxes()
            .first()
            .ok_or_else(|| unavailable(self.language, "grammar defines no syntax"))
    }
}

fn unavailable(language: Language, reason: impl Display) -> TokenizeError {
    TokenizeError::Unavailable { language, reason: reason.to_string() }
}

/// Appends `text[start..end]` as whitespace and non-whitespace runs, all
/// labelled with `scopes`.
fn push_region(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize, scopes: &ScopeStack) {
    let Some(region) = text.get(start..end).filter(|region| !region.is_empty()) else {
        return;
    };
    let labels: Vec<String> = scopes.as_slice().iter().map(|scope| scope.build_string()).collect();
    let mut run_start = start;
    let mut run_is_space = None;
    for (offset, ch) in region.char_indices() {
        let is_space = ch.is_whitespace();
        if run_is_space.is_some_and(|previous| previous != is_space) {
            tokens.push(Token::new(run_start, start + offset, labels.clone()));
            run_start = start + offset;
        }
        run_is_space = Some(is_space);
    }
    tokens.push(Token::new(run_start, end, labels));
}

impl LineTokenizer for GrammarTokenizer {
    fn language(&self) -> Language {
        self.language
    }

    fn tokenize_line(
        &self,
        text: &str,
        prior: Option<&LexState>,
    ) -> Result<TokenizedLine, TokenizeError> {
        let (mut parse, mut scopes) = match prior.and_then(|state| state.0.as_ref()) {
            Some(carried) if carried.language != self.language => {
                return Err(TokenizeError::ForeignState(self.language));
            }
            Some(carried) => (carried.parse.clone(), carried.scopes.clone()),
            None => (ParseState::new(self.syntax()?), ScopeStack::new()),
        };

        let line = format!("{text}\n");
        let ops = parse
            .parse_line(&line, &self.syntaxes)
            .map_err(|e| unavailable(self.language, e))?;

        let mut tokens = Vec::new();
        let mut cursor = 0;
        for (offset, op) in &ops {
            let offset = (*offset).min(text.len());
            push_region(&mut tokens, text, cursor, offset, &scopes);
            cursor = cursor.max(offset);
            scopes.apply(op).map_err(|e| unavailable(self.language, e))?;
        }
        push_region(&mut tokens, text, cursor, text.len(), &scopes);

        let state = LexState(Some(Carried { language: self.language, parse, scopes }));
        Ok(TokenizedLine { tokens, state })
    }
}
