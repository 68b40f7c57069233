// crates/show_block_start/src/lib.rs

//! Command layer for "show start of block" (Ruby) and "show start of scope"
//! (Python).
//!
//! - checks the selection preconditions and reports them through a [`Notifier`]
//! - resolves the enclosing block with the cached grammar
//! - highlights the match through a [`HighlightSink`], at most once per
//!   [`HighlightSession`]

pub mod config;
pub mod services;
pub mod session;

#[cfg(test)]
mod testing;

use std::fmt;

use block_resolver::{
    resolve_with, BlockStart, Language, ResolveError, Selection, SourceBuffer, TextBuffer,
};
use log::{debug, error, warn};
use scope_tokenizer::GrammarRegistry;

pub use config::{HighlightColor, HighlightConfig};
pub use services::{HighlightHandle, HighlightSink, Notifier, TerminalHighlighter, TerminalNotifier};
pub use session::{HighlightSession, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCommand {
    StartOfBlock,
    StartOfScope,
}

impl BlockCommand {
    /// Identifier the command is registered under.
    pub fn id(self) -> &'static str {
        match self {
            BlockCommand::StartOfBlock => "extension.showStartOfBlock",
            BlockCommand::StartOfScope => "extension.showStartOfScope",
        }
    }

    pub fn language(self) -> Language {
        match self {
            BlockCommand::StartOfBlock => Language::Ruby,
            BlockCommand::StartOfScope => Language::Python,
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Ruby => BlockCommand::StartOfBlock,
            Language::Python => BlockCommand::StartOfScope,
        }
    }
}

/// Informational notices shown instead of scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    MultiLineSelection,
    NothingSelected,
    NotWordCharacters,
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UserMessage::MultiLineSelection => "Please select content on only one line",
            UserMessage::NothingSelected => "Nothing is selected",
            UserMessage::NotWordCharacters => {
                "Please place the cursor on or select only word characters in a line"
            }
        })
    }
}

/// The document and selection a command runs against.
pub trait Editor {
    fn buffer(&self) -> &dyn TextBuffer;
    fn selection(&self) -> Selection;
}

/// An in-memory document with a fixed selection.
#[derive(Debug, Clone)]
pub struct EditorView {
    buffer: SourceBuffer,
    selection: Selection,
}

impl EditorView {
    pub fn new(buffer: SourceBuffer, selection: Selection) -> Self {
        Self { buffer, selection }
    }
}

impl Editor for EditorView {
    fn buffer(&self) -> &dyn TextBuffer {
        &self.buffer
    }

    fn selection(&self) -> Selection {
        self.selection
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Highlighted(BlockStart),
    /// A highlight is already showing; nothing was done.
    AlreadyHighlighted,
    NoMatch,
    Notice(UserMessage),
    GrammarUnavailable,
}

fn notice(notifier: &mut dyn Notifier, message: UserMessage) -> CommandOutcome {
    notifier.notify(&message);
    CommandOutcome::Notice(message)
}

/// Runs `command` against the editor's current selection with the bundled
/// grammars.
pub fn run_command(
    command: BlockCommand,
    editor: &dyn Editor,
    session: &mut HighlightSession,
    sink: &mut dyn HighlightSink,
    notifier: &mut dyn Notifier,
    config: &HighlightConfig,
) -> CommandOutcome {
    run_command_with(GrammarRegistry::global(), command, editor, session, sink, notifier, config)
}

/// Same as [`run_command`], taking grammars from `registry`.
pub fn run_command_with(
    registry: &GrammarRegistry,
    command: BlockCommand,
    editor: &dyn Editor,
    session: &mut HighlightSession,
    sink: &mut dyn HighlightSink,
    notifier: &mut dyn Notifier,
    config: &HighlightConfig,
) -> CommandOutcome {
    if session.is_highlighted() {
        debug!("{}: highlight already shown", command.id());
        return CommandOutcome::AlreadyHighlighted;
    }

    let buffer = editor.buffer();
    let selection = editor.selection();
    if !selection.is_single_line() {
        return notice(notifier, UserMessage::MultiLineSelection);
    }
    let range = if selection.is_empty() {
        buffer.word_range_at(selection.start)
    } else {
        Some(selection)
    };
    let Some(text) = range.and_then(|range| buffer.text_in(range)) else {
        return notice(notifier, UserMessage::NothingSelected);
    };
    if text.trim().is_empty() {
        return notice(notifier, UserMessage::NotWordCharacters);
    }

    let language = command.language();
    let tokenizer = match registry.load(language) {
        Ok(tokenizer) => tokenizer,
        Err(e) => {
            error!("{}: {e}", command.id());
            return CommandOutcome::GrammarUnavailable;
        }
    };

    match resolve_with(tokenizer, buffer, selection.start) {
        Ok(Some(start)) => {
            session.highlight(sink, &start, &config.color);
            CommandOutcome::Highlighted(start)
        }
        Ok(None) => {
            debug!("{}: no enclosing {language} block", command.id());
            CommandOutcome::NoMatch
        }
        Err(ResolveError::Tokenize(e)) => {
            error!("{}: {e}", command.id());
            CommandOutcome::GrammarUnavailable
        }
        Err(e) => {
            warn!("{}: {e}", command.id());
            CommandOutcome::NoMatch
        }
    }
}
