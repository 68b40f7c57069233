// crates/block_resolver/src/ruby.rs

//! Ruby block resolution.
//!
//! The scan walks backwards from the cursor line keeping a running `depth`
//! that starts at −1 (the block the cursor is in is still open).  Openers
//! add one, closers subtract one, and the line where depth comes back to 0
//! opens the enclosing block.
//!
//!  * Each tokenized line goes through a small state machine over
//!    [`TokenClass`]es, so `x if y` modifiers, `while … do` loop heads and
//!    `x = if …` assignments are told apart without ad hoc flags.
//!  * `=begin` … `=end` regions and heredoc bodies are skipped wholesale;
//!    the tokenizer has the final say on whether a line really ends or starts
//!    a heredoc.
//!  * A pending `elsif`/`else`/`when`/`rescue` at depth −1 wins over its
//!    owning opener when the two are compatible.

use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scope_tokenizer::{Language, LexState, LineTokenizer, ScopeTag, Token};

use crate::buffer::{char_to_byte, BlockStart, Position};
use crate::error::ResolveError;
use crate::traits::{BlockResolver, TextBuffer};

/// Lines without any of these cannot change depth.
static CANDIDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:begin|case|class|def|do|for|module|if|unless|while|until|end|elsif|else|when|rescue)\b|[{}]",
    )
    .unwrap()
});

static HEREDOC_TERMINATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)\s*$").unwrap());

static HEREDOC_OPENER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<<[-~]?(?:'(\w+)'|"(\w+)"|`(\w+)`|(\w+))"#).unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Begin,
    Case,
    Class,
    Def,
    Do,
    For,
    Module,
    If,
    Unless,
    While,
    Until,
    Brace,
}

impl Opener {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "begin" => Opener::Begin,
            "case" => Opener::Case,
            "class" => Opener::Class,
            "def" => Opener::Def,
            "do" => Opener::Do,
            "for" => Opener::For,
            "module" => Opener::Module,
            "if" => Opener::If,
            "unless" => Opener::Unless,
            "while" => Opener::While,
            "until" => Opener::Until,
            _ => return None,
        })
    }

    /// Keywords that are only openers at the start of a statement.
    fn is_modifier(self) -> bool {
        matches!(self, Opener::If | Opener::Unless | Opener::While | Opener::Until)
    }

    /// Loop heads that may be followed by an optional `do`.
    fn is_loop(self) -> bool {
        matches!(self, Opener::While | Opener::Until | Opener::For)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    Elsif,
    Else,
    When,
    Rescue,
}

impl Continuation {
    fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "elsif" => Continuation::Elsif,
            "else" => Continuation::Else,
            "when" => Continuation::When,
            "rescue" => Continuation::Rescue,
            _ => return None,
        })
    }

    fn owned_by(self, opener: Opener) -> bool {
        match self {
            Continuation::Elsif => opener == Opener::If,
            Continuation::Else => matches!(
                opener,
                Opener::If | Opener::Unless | Opener::Case | Opener::Begin
            ),
            Continuation::When => opener == Opener::Case,
            Continuation::Rescue => matches!(opener, Opener::Begin | Opener::Def | Opener::Do),
        }
    }
}

/// What a single token means to the block matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Whitespace,
    CommentStart,
    OpenerKeyword(Opener),
    ModifierKeyword(Opener),
    CloserKeyword,
    ContinuationKeyword(Continuation),
    BraceOpen,
    BraceClose,
    Assignment,
    Other,
}

fn classify(token: &Token, line: &str) -> TokenClass {
    let text = token.text(line);
    if text.trim().is_empty() {
        return TokenClass::Whitespace;
    }
    if token.tags.contains(ScopeTag::Comment) {
        return TokenClass::CommentStart;
    }
    if token.tags.contains(ScopeTag::String) {
        return TokenClass::Other;
    }
    if token.tags.contains(ScopeTag::Keyword) {
        if text == "end" {
            return TokenClass::CloserKeyword;
        }
        if let Some(continuation) = Continuation::from_keyword(text) {
            return TokenClass::ContinuationKeyword(continuation);
        }
        if let Some(opener) = Opener::from_keyword(text) {
            return if opener.is_modifier() {
                TokenClass::ModifierKeyword(opener)
            } else {
                TokenClass::OpenerKeyword(opener)
            };
        }
        if token.tags.contains(ScopeTag::Assignment) {
            return TokenClass::Assignment;
        }
    }
    match text {
        "{" if token.tags.contains(ScopeTag::ScopeBegin) => TokenClass::BraceOpen,
        "}" if token.tags.contains(ScopeTag::ScopeEnd) => TokenClass::BraceClose,
        _ => TokenClass::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// Nothing significant seen yet.
    LineStart,
    /// `target =` seen; a conditional here still opens a block.
    AfterAssignment,
    Body,
    /// Inside `while`/`until`/`for` head; a `do` here belongs to the loop.
    LoopHead,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Open(Opener),
    Close,
    Continue(Continuation),
}

/// Transition table of the per-line machine.  `significant` counts the
/// non-whitespace tokens before this one.
fn step(state: LineState, class: TokenClass, significant: usize) -> (LineState, Option<Action>) {
    use LineState::*;
    use TokenClass::*;

    let after_open = |opener: Opener| if opener.is_loop() { LoopHead } else { Body };
    match (state, class) {
        (Comment, _) | (_, CommentStart) => (Comment, None),
        (state, Whitespace) => (state, None),

        (LoopHead, OpenerKeyword(Opener::Do)) => (Body, None),
        (_, OpenerKeyword(opener)) => (after_open(opener), Some(Action::Open(opener))),

        (LineStart | AfterAssignment, ModifierKeyword(opener)) => {
            (after_open(opener), Some(Action::Open(opener)))
        }
        (LoopHead, ModifierKeyword(_)) => (LoopHead, None),
        (_, ModifierKeyword(_)) => (Body, None),

        (_, CloserKeyword | BraceClose) => (Body, Some(Action::Close)),

        (LineStart, ContinuationKeyword(continuation)) => {
            (Body, Some(Action::Continue(continuation)))
        }
        (_, ContinuationKeyword(_)) => (Body, None),

        (LoopHead, BraceOpen) => (LoopHead, Some(Action::Open(Opener::Brace))),
        (_, BraceOpen) => (Body, Some(Action::Open(Opener::Brace))),

        (Body, Assignment) if significant == 1 => (AfterAssignment, None),
        (LoopHead, Assignment | Other) => (LoopHead, None),
        (_, Assignment | Other) => (Body, None),
    }
}

/// A depth-changing event with the byte range of the token that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Event {
    action: Action,
    start: usize,
    len: usize,
}

fn line_events(tokens: &[Token], line: &str) -> Vec<Event> {
    let mut state = LineState::LineStart;
    let mut significant = 0;
    let mut events = Vec::new();
    for token in tokens {
        let class = classify(token, line);
        let (next, action) = step(state, class, significant);
        if let Some(action) = action {
            events.push(Event { action, start: token.start, len: token.end - token.start });
        }
        if next == LineState::Comment {
            break;
        }
        if class != TokenClass::Whitespace {
            significant += 1;
        }
        state = next;
    }
    events
}

struct PendingContinuation {
    line: usize,
    text: String,
    keyword: Continuation,
}

struct ScanState {
    depth: i64,
    first_closer_consumed: bool,
    in_block_comment: bool,
    /// Delimiter of the heredoc whose body is being skipped.
    heredoc: Option<String>,
    /// Byte start and length of the first opener on the initiating line.
    first_opener: Option<(usize, usize)>,
    /// Opener that last brought depth back to zero.
    last_opener: Option<Opener>,
    pending: Option<PendingContinuation>,
}

impl ScanState {
    fn new() -> Self {
        Self {
            depth: -1,
            first_closer_consumed: false,
            in_block_comment: false,
            heredoc: None,
            first_opener: None,
            last_opener: None,
            pending: None,
        }
    }
}

/// Lexer states at the start of each line, computed forward from line 0 on
/// first use.
struct CarriedStates<'a> {
    tokenizer: &'a dyn LineTokenizer,
    buffer: &'a dyn TextBuffer,
    last_line: usize,
    states: Option<Vec<LexState>>,
}

impl<'a> CarriedStates<'a> {
    fn new(tokenizer: &'a dyn LineTokenizer, buffer: &'a dyn TextBuffer, last_line: usize) -> Self {
        Self { tokenizer, buffer, last_line, states: None }
    }

    fn before(&mut self, index: usize) -> Result<&LexState, ResolveError> {
        if self.states.is_none() {
            debug!("computing carried lexer state for lines 0..={}", self.last_line);
            let mut states = Vec::with_capacity(self.last_line + 1);
            let mut state = LexState::default();
            for line in 0..=self.last_line {
                let text = self.buffer.line_at(line).ok_or(ResolveError::LineOutOfRange {
                    line,
                    line_count: self.buffer.line_count(),
                })?;
                let next = self.tokenizer.tokenize_line(text, Some(&state))?.state;
                states.push(std::mem::replace(&mut state, next));
            }
            self.states = Some(states);
        }
        let line_count = self.buffer.line_count();
        self.states
            .as_ref()
            .and_then(|states| states.get(index))
            .ok_or(ResolveError::LineOutOfRange { line: index, line_count })
    }
}

fn opener_delimiter<'h>(caps: &Captures<'h>) -> Option<&'h str> {
    (1..=4).find_map(|group| caps.get(group)).map(|m| m.as_str())
}

/// Resolves `end`/`}` delimited Ruby blocks.
pub struct RubyBlockResolver<'t> {
    tokenizer: &'t dyn LineTokenizer,
}

impl<'t> RubyBlockResolver<'t> {
    pub fn new(tokenizer: &'t dyn LineTokenizer) -> Self {
        Self { tokenizer }
    }

    /// If `text` closes a heredoc, returns its delimiter.
    fn heredoc_terminator(
        &self,
        text: &str,
        index: usize,
        carried: &mut CarriedStates<'_>,
    ) -> Result<Option<String>, ResolveError> {
        let Some(caps) = HEREDOC_TERMINATOR_RE.captures(text) else {
            return Ok(None);
        };
        let word = &caps[1];
        let prior = carried.before(index)?;
        let tokens = self.tokenizer.tokenize_line(text, Some(prior))?.tokens;
        let confirmed = tokens.iter().any(|t| {
            t.text(text) == word && t.tags.contains_all(&[ScopeTag::Heredoc, ScopeTag::StringEnd])
        });
        Ok(confirmed.then(|| word.to_string()))
    }

    /// True if `text` opens the heredoc terminated by `delimiter`.
    fn opens_heredoc(&self, text: &str, delimiter: &str) -> Result<bool, ResolveError> {
        let mentions = HEREDOC_OPENER_RE
            .captures_iter(text)
            .any(|caps| opener_delimiter(&caps) == Some(delimiter));
        if !mentions {
            return Ok(false);
        }
        let tokens = self.tokenizer.tokenize_line(text, None)?.tokens;
        Ok(tokens.iter().any(|t| {
            t.tags.contains_all(&[ScopeTag::Heredoc, ScopeTag::StringBegin])
                && HEREDOC_OPENER_RE
                    .captures(t.text(text))
                    .is_some_and(|caps| opener_delimiter(&caps) == Some(delimiter))
        }))
    }
}

impl BlockResolver for RubyBlockResolver<'_> {
    fn language(&self) -> Language {
        Language::Ruby
    }

    fn resolve(
        &self,
        buffer: &dyn TextBuffer,
        cursor: Position,
    ) -> Result<Option<BlockStart>, ResolveError> {
        let line_count = buffer.line_count();
        if cursor.line >= line_count {
            return Err(ResolveError::LineOutOfRange { line: cursor.line, line_count });
        }

        let mut scan = ScanState::new();
        let mut carried = CarriedStates::new(self.tokenizer, buffer, cursor.line);

        for index in (0..=cursor.line).rev() {
            let text = buffer
                .line_at(index)
                .ok_or(ResolveError::LineOutOfRange { line: index, line_count })?;
            let initiating = index == cursor.line;

            if let Some(delimiter) = scan.heredoc.as_deref() {
                // `=begin`/`=end` inside a heredoc body are string text.
                if !self.opens_heredoc(text, delimiter)? {
                    continue;
                }
                debug!("line {index}: heredoc {delimiter} opens here");
                scan.heredoc = None;
            } else {
                if text.starts_with("=end") {
                    scan.in_block_comment = true;
                    continue;
                }
                if text.starts_with("=begin") {
                    scan.in_block_comment = false;
                    continue;
                }
                if scan.in_block_comment {
                    continue;
                }
                if let Some(delimiter) = self.heredoc_terminator(text, index, &mut carried)? {
                    debug!("line {index}: heredoc {delimiter} ends here, skipping its body");
                    scan.heredoc = Some(delimiter);
                    continue;
                }
            }

            if !CANDIDATE_RE.is_match(text) {
                continue;
            }

            let tokens = self.tokenizer.tokenize_line(text, None)?.tokens;
            let mut reached_zero = false;
            for event in line_events(&tokens, text) {
                match event.action {
                    Action::Open(opener) => {
                        scan.depth += 1;
                        if initiating && scan.first_opener.is_none() {
                            scan.first_opener = Some((event.start, event.len));
                        }
                        if scan.depth == 0 {
                            scan.last_opener = Some(opener);
                            reached_zero = true;
                        }
                    }
                    Action::Close if initiating && !scan.first_closer_consumed => {
                        scan.first_closer_consumed = true;
                    }
                    Action::Close => scan.depth -= 1,
                    Action::Continue(keyword) => {
                        if !initiating && scan.depth + 1 == 0 && scan.pending.is_none() {
                            debug!("line {index}: pending {keyword:?}");
                            scan.pending = Some(PendingContinuation {
                                line: index,
                                text: text.to_string(),
                                keyword,
                            });
                        }
                    }
                }
            }

            if scan.depth < 0 || !reached_zero {
                continue;
            }

            if initiating {
                if let Some((start, len)) = scan.first_opener.take() {
                    if char_to_byte(text, cursor.character) < start + len + 1 {
                        debug!("line {index}: cursor on the opener, climbing to the parent block");
                        scan.depth = -1;
                        continue;
                    }
                }
            }

            let owner = scan.last_opener;
            if let Some(pending) = scan.pending.take() {
                if owner.is_some_and(|owner| pending.keyword.owned_by(owner)) {
                    return Ok(Some(BlockStart::new(pending.line, pending.text)));
                }
            }
            debug!("line {index}: block opened by {owner:?}");
            return Ok(Some(BlockStart::new(index, text)));
        }

        Ok(None)
    }
}
