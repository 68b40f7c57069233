// crates/show_block_start/src/session.rs

use block_resolver::BlockStart;
use log::debug;

use crate::config::HighlightColor;
use crate::services::{HighlightHandle, HighlightSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Highlighted { handle: HighlightHandle, line: usize },
}

/// Owns the single active highlight of one editor view.
#[derive(Debug, Default)]
pub struct HighlightSession {
    state: SessionState,
}

impl HighlightSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_highlighted(&self) -> bool {
        matches!(self.state, SessionState::Highlighted { .. })
    }

    /// Highlights `start` from its first non-whitespace character to the end
    /// of the line, revealing it when off screen.  Returns `false` and does
    /// nothing while a highlight is already shown.
    pub fn highlight(
        &mut self,
        sink: &mut dyn HighlightSink,
        start: &BlockStart,
        color: &HighlightColor,
    ) -> bool {
        if self.is_highlighted() {
            return false;
        }
        let handle = sink.create_highlight(color);
        sink.apply_highlight(
            handle,
            start.line,
            start.first_non_whitespace_column(),
            start.end_column(),
        );
        if !sink.is_line_visible(start.line) {
            sink.reveal_line(start.line);
        }
        debug!("highlighted line {} with {color}", start.line);
        self.state = SessionState::Highlighted {
            handle,
            line: start.line,
        };
        true
    }

    /// Any selection change removes the highlight.
    pub fn on_selection_changed(&mut self, sink: &mut dyn HighlightSink) {
        if let SessionState::Highlighted { handle, .. } = std::mem::take(&mut self.state) {
            sink.dispose_highlight(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, SinkEvent};

    #[test]
    fn highlight_then_dispose_on_selection_change() {
        let mut sink = RecordingSink::default();
        let mut session = HighlightSession::new();
        let start = BlockStart::new(3, "    def foo");

        assert!(session.highlight(&mut sink, &start, &HighlightColor::default()));
        let handle = HighlightHandle(0);
        assert_eq!(session.state(), SessionState::Highlighted { handle, line: 3 });
        assert_eq!(
            sink.events,
            vec![
                SinkEvent::Created(handle, "#BABABA".into()),
                SinkEvent::Applied { handle, line: 3, start: 4, end: 11 },
            ]
        );

        session.on_selection_changed(&mut sink);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(sink.events.last(), Some(&SinkEvent::Disposed(handle)));
    }

    #[test]
    fn second_highlight_is_a_no_op() {
        let mut sink = RecordingSink::default();
        let mut session = HighlightSession::new();
        let start = BlockStart::new(0, "def foo");
        assert!(session.highlight(&mut sink, &start, &HighlightColor::default()));
        let recorded = sink.events.len();
        assert!(!session.highlight(&mut sink, &start, &HighlightColor::default()));
        assert_eq!(sink.events.len(), recorded);
    }

    #[test]
    fn off_screen_line_is_revealed() {
        let mut sink = RecordingSink::with_visible(10..20);
        let mut session = HighlightSession::new();
        session.highlight(&mut sink, &BlockStart::new(2, "class A"), &HighlightColor::default());
        assert_eq!(sink.events.last(), Some(&SinkEvent::Revealed(2)));
    }

    #[test]
    fn selection_change_while_idle_does_nothing() {
        let mut sink = RecordingSink::default();
        HighlightSession::new().on_selection_changed(&mut sink);
        assert!(sink.events.is_empty());
    }
}
