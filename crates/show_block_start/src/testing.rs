// crates/show_block_start/src/testing.rs

//! Recording doubles for the side-effect traits.

use std::ops::Range;

use crate::config::HighlightColor;
use crate::services::{HighlightHandle, HighlightSink, Notifier};
use crate::UserMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SinkEvent {
    Created(HighlightHandle, String),
    Applied {
        handle: HighlightHandle,
        line: usize,
        start: usize,
        end: usize,
    },
    Revealed(usize),
    Disposed(HighlightHandle),
}

pub(crate) struct RecordingSink {
    pub(crate) events: Vec<SinkEvent>,
    visible: Range<usize>,
    next_id: u64,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::with_visible(0..usize::MAX)
    }
}

impl RecordingSink {
    pub(crate) fn with_visible(visible: Range<usize>) -> Self {
        Self {
            events: Vec::new(),
            visible,
            next_id: 0,
        }
    }
}

impl HighlightSink for RecordingSink {
    fn create_highlight(&mut self, color: &HighlightColor) -> HighlightHandle {
        let handle = HighlightHandle(self.next_id);
        self.next_id += 1;
        self.events.push(SinkEvent::Created(handle, color.to_string()));
        handle
    }

    fn apply_highlight(&mut self, handle: HighlightHandle, line: usize, start: usize, end: usize) {
        self.events.push(SinkEvent::Applied { handle, line, start, end });
    }

    fn is_line_visible(&self, line: usize) -> bool {
        self.visible.contains(&line)
    }

    fn reveal_line(&mut self, line: usize) {
        self.events.push(SinkEvent::Revealed(line));
    }

    fn dispose_highlight(&mut self, handle: HighlightHandle) {
        self.events.push(SinkEvent::Disposed(handle));
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) messages: Vec<UserMessage>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &UserMessage) {
        self.messages.push(*message);
    }
}
