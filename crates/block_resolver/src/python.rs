// crates/block_resolver/src/python.rs

//! Python scope resolution by indentation.
//!
//! The target indentation is that of the nearest shallower non-blank line
//! above the cursor.  Walking back, the first line at exactly that width
//! which opens a scope (leading `def`, `if`, …) or continues a statement
//! (`{`, `(`, `[`, trailing `\`, `name = """`) wins.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use scope_tokenizer::{Language, LineTokenizer, ScopeTag, Token};

use crate::buffer::{indent_width, is_blank, BlockStart, Position};
use crate::error::ResolveError;
use crate::traits::{BlockResolver, TextBuffer};

const SCOPE_KEYWORDS: &[&str] = &[
    "class", "def", "elif", "else", "except", "finally", "for", "if", "try", "while", "with",
];

/// Keywords `async` may prefix.
const ASYNC_TARGETS: &[&str] = &["def", "for", "with"];

static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:class|def|elif|else|except|finally|for|if|try|while|with|async)\b").unwrap()
});

static CONTINUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[{(\[\\]|^\s*\w+\s*=\s*["']{3}"#).unwrap());

static DOCSTRING_DELIMITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*["']{3}"#).unwrap());

static ASSIGNED_STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*\w+\s*=\s*["']{3}"#).unwrap());

fn line_of<'b>(buffer: &'b dyn TextBuffer, index: usize) -> Result<&'b str, ResolveError> {
    buffer.line_at(index).ok_or(ResolveError::LineOutOfRange {
        line: index,
        line_count: buffer.line_count(),
    })
}

/// Leading whitespace is exactly `width` wide and code follows.
fn at_indent(line: &str, width: usize) -> bool {
    !is_blank(line) && indent_width(line) == width
}

fn is_code_keyword(token: &Token) -> bool {
    token.tags.contains(ScopeTag::Keyword) && !token.is_comment_or_string()
}

/// The first significant token is a scope keyword, or `async` followed by one.
fn starts_with_scope_keyword(tokens: &[Token], line: &str) -> bool {
    let mut significant = tokens.iter().filter(|t| !t.text(line).trim().is_empty());
    let Some(first) = significant.next() else {
        return false;
    };
    if !is_code_keyword(first) {
        return false;
    }
    match first.text(line) {
        "async" => significant
            .next()
            .is_some_and(|next| is_code_keyword(next) && ASYNC_TARGETS.contains(&next.text(line))),
        word => SCOPE_KEYWORDS.contains(&word),
    }
}

fn has_continuation_marker(tokens: &[Token], line: &str) -> bool {
    tokens.iter().any(|token| {
        let code = !token.is_comment_or_string();
        let tags = token.tags;
        match token.text(line) {
            "{" => code && tags.contains(ScopeTag::DictBegin),
            "(" => code && tags.contains_any(&[ScopeTag::ArgumentsBegin, ScopeTag::ParenthesisBegin]),
            "[" => code && tags.contains(ScopeTag::ListBegin),
            "\\" => code && tags.contains(ScopeTag::LineContinuation),
            // Strings are allowed here: the delimiter itself is string-scoped.
            "\"\"\"" | "'''" => {
                !tags.contains(ScopeTag::Comment)
                    && tags.contains(ScopeTag::StringBegin)
                    && ASSIGNED_STRING_RE.is_match(line)
            }
            _ => false,
        }
    })
}

/// Resolves indentation scopes in Python source.
pub struct PythonScopeResolver<'t> {
    tokenizer: &'t dyn LineTokenizer,
}

impl<'t> PythonScopeResolver<'t> {
    pub fn new(tokenizer: &'t dyn LineTokenizer) -> Self {
        Self { tokenizer }
    }

    fn opens_scope(&self, line: &str) -> Result<bool, ResolveError> {
        let keyword_candidate = KEYWORD_RE.is_match(line);
        let continuation_candidate = CONTINUATION_RE.is_match(line);
        if !keyword_candidate && !continuation_candidate {
            return Ok(false);
        }
        let tokens = self.tokenizer.tokenize_line(line, None)?.tokens;
        Ok((keyword_candidate && starts_with_scope_keyword(&tokens, line))
            || (continuation_candidate && has_continuation_marker(&tokens, line)))
    }

    /// Nearest width below both `target` and `start_indent`, searching back
    /// from a docstring delimiter at `from`.
    fn retarget(
        buffer: &dyn TextBuffer,
        from: usize,
        target: usize,
        start_indent: usize,
    ) -> Result<Option<usize>, ResolveError> {
        for index in (0..=from).rev() {
            let line = line_of(buffer, index)?;
            if is_blank(line) || DOCSTRING_DELIMITER_RE.is_match(line) {
                continue;
            }
            let width = indent_width(line);
            if width < target && width < start_indent {
                return Ok(Some(width));
            }
        }
        Ok(None)
    }
}

impl BlockResolver for PythonScopeResolver<'_> {
    fn language(&self) -> Language {
        Language::Python
    }

    fn resolve(
        &self,
        buffer: &dyn TextBuffer,
        cursor: Position,
    ) -> Result<Option<BlockStart>, ResolveError> {
        let start_line = line_of(buffer, cursor.line)?;
        if is_blank(start_line) {
            return Ok(None);
        }
        let start_indent = indent_width(start_line);
        if start_indent == 0 {
            return Ok(None);
        }

        let mut target = None;
        for index in (0..cursor.line).rev() {
            let line = line_of(buffer, index)?;
            if !is_blank(line) && indent_width(line) < start_indent {
                target = Some(indent_width(line));
                break;
            }
        }
        let Some(mut target) = target else {
            debug!("no shallower line above {}", cursor.line);
            return Ok(None);
        };
        debug!("start indent {start_indent}, target indent {target}");

        for index in (0..=cursor.line).rev() {
            let line = line_of(buffer, index)?;
            if !at_indent(line, target) {
                continue;
            }
            if DOCSTRING_DELIMITER_RE.is_match(line) {
                if let Some(width) = Self::retarget(buffer, index, target, start_indent)? {
                    debug!("line {index}: docstring delimiter, target indent now {width}");
                    target = width;
                }
                if !at_indent(line, target) {
                    continue;
                }
            }
            if self.opens_scope(line)? {
                return Ok(Some(BlockStart::new(index, line)));
            }
        }

        Ok(None)
    }
}
