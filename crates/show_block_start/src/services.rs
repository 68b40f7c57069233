// crates/show_block_start/src/services.rs

//! Side-effect interfaces for the command layer.
//! - HighlightSink: decorates one line of the visible document
//! - Notifier: shows an informational message to the user
//!
//! The terminal implementations back the CLI; an editor integration
//! supplies its own.

use std::collections::HashMap;
use std::io::Write;

use block_resolver::TextBuffer;
use colored::Colorize;
use log::{debug, warn};

use crate::config::HighlightColor;
use crate::UserMessage;

/// Identifies one created highlight until it is disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HighlightHandle(pub u64);

/// Creates, shows and removes line highlights.
pub trait HighlightSink {
    fn create_highlight(&mut self, color: &HighlightColor) -> HighlightHandle;

    /// Decorates `start_column..end_column` (characters) of `line`.
    fn apply_highlight(
        &mut self,
        handle: HighlightHandle,
        line: usize,
        start_column: usize,
        end_column: usize,
    );

    fn is_line_visible(&self, _line: usize) -> bool {
        true
    }

    /// Scrolls `line` into view.
    fn reveal_line(&mut self, line: usize);

    fn dispose_highlight(&mut self, handle: HighlightHandle);
}

/// Shows informational messages.
pub trait Notifier {
    fn notify(&mut self, message: &UserMessage);
}

/// Prints highlighted lines as `<line>: <text>` with a truecolor background
/// on the highlighted span.
pub struct TerminalHighlighter<'b, W: Write> {
    out: W,
    buffer: &'b dyn TextBuffer,
    next_id: u64,
    live: HashMap<HighlightHandle, HighlightColor>,
}

impl<'b, W: Write> TerminalHighlighter<'b, W> {
    pub fn new(out: W, buffer: &'b dyn TextBuffer) -> Self {
        Self {
            out,
            buffer,
            next_id: 0,
            live: HashMap::new(),
        }
    }

    /// Number of highlights created and not yet disposed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> HighlightSink for TerminalHighlighter<'_, W> {
    fn create_highlight(&mut self, color: &HighlightColor) -> HighlightHandle {
        let handle = HighlightHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(handle, color.clone());
        handle
    }

    fn apply_highlight(
        &mut self,
        handle: HighlightHandle,
        line: usize,
        start_column: usize,
        end_column: usize,
    ) {
        let Some(color) = self.live.get(&handle) else {
            warn!("highlight {handle:?} was already disposed");
            return;
        };
        let Some(text) = self.buffer.line_at(line) else {
            warn!("line {line} is past the end of the buffer");
            return;
        };
        let head: String = text.chars().take(start_column).collect();
        let span: String = text
            .chars()
            .skip(start_column)
            .take(end_column.saturating_sub(start_column))
            .collect();
        let tail: String = text.chars().skip(end_column.max(start_column)).collect();
        let (r, g, b) = color.rgb();
        if let Err(e) = writeln!(
            self.out,
            "{}: {}{}{}",
            line + 1,
            head,
            span.on_truecolor(r, g, b),
            tail
        ) {
            warn!("failed to print highlight: {e}");
        }
    }

    fn reveal_line(&mut self, line: usize) {
        debug!("reveal line {line}");
    }

    fn dispose_highlight(&mut self, handle: HighlightHandle) {
        if self.live.remove(&handle).is_some() {
            debug!("disposed highlight {handle:?}");
        }
    }
}

/// Writes each message on its own line.
pub struct TerminalNotifier<W: Write> {
    out: W,
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn notify(&mut self, message: &UserMessage) {
        if let Err(e) = writeln!(self.out, "{message}") {
            warn!("failed to print notice: {e}");
        }
    }
}
