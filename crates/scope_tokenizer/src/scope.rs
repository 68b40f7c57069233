// crates/scope_tokenizer/src/scope.rs

//! Closed set of semantic tags derived from free-form scope labels.

use std::fmt;

/// A scope-label family the resolvers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ScopeTag {
    Keyword,
    Comment,
    String,
    ScopeBegin,
    ScopeEnd,
    DictBegin,
    ArgumentsBegin,
    ParenthesisBegin,
    ListBegin,
    LineContinuation,
    StringBegin,
    StringEnd,
    Heredoc,
    Assignment,
}

impl ScopeTag {
    pub const ALL: [ScopeTag; 14] = [
        ScopeTag::Keyword,
        ScopeTag::Comment,
        ScopeTag::String,
        ScopeTag::ScopeBegin,
        ScopeTag::ScopeEnd,
        ScopeTag::DictBegin,
        ScopeTag::ArgumentsBegin,
        ScopeTag::ParenthesisBegin,
        ScopeTag::ListBegin,
        ScopeTag::LineContinuation,
        ScopeTag::StringBegin,
        ScopeTag::StringEnd,
        ScopeTag::Heredoc,
        ScopeTag::Assignment,
    ];

    /// Label fragment that marks this family.
    fn needle(self) -> &'static str {
        match self {
            ScopeTag::Keyword => "keyword",
            ScopeTag::Comment => "comment",
            ScopeTag::String => "string",
            ScopeTag::ScopeBegin => "punctuation.section.scope.begin",
            ScopeTag::ScopeEnd => "punctuation.section.scope.end",
            ScopeTag::DictBegin => "punctuation.definition.dict.begin",
            ScopeTag::ArgumentsBegin => "punctuation.definition.arguments.begin",
            ScopeTag::ParenthesisBegin => "punctuation.parenthesis.begin",
            ScopeTag::ListBegin => "punctuation.definition.list.begin",
            ScopeTag::LineContinuation => "punctuation.separator.continuation.line",
            ScopeTag::StringBegin => "punctuation.definition.string.begin",
            ScopeTag::StringEnd => "punctuation.definition.string.end",
            ScopeTag::Heredoc => "string.unquoted.heredoc",
            ScopeTag::Assignment => "keyword.operator.assignment",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u8)
    }
}

/// Bit set of [`ScopeTag`]s carried by one token.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScopeTags(u16);

impl ScopeTags {
    pub const EMPTY: ScopeTags = ScopeTags(0);

    /// Classifies a token's labels in a single pass over them.
    pub fn classify<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut tags = ScopeTags::EMPTY;
        for label in labels {
            let label = label.as_ref();
            for tag in ScopeTag::ALL {
                if label.contains(tag.needle()) {
                    tags.insert(tag);
                }
            }
        }
        tags
    }

    pub fn insert(&mut self, tag: ScopeTag) {
        self.0 |= tag.bit();
    }

    pub fn contains(self, tag: ScopeTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn contains_all(self, tags: &[ScopeTag]) -> bool {
        tags.iter().all(|tag| self.contains(*tag))
    }

    pub fn contains_any(self, tags: &[ScopeTag]) -> bool {
        tags.iter().any(|tag| self.contains(*tag))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ScopeTags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(ScopeTag::ALL.iter().filter(|tag| self.contains(**tag)))
            .finish()
    }
}

impl FromIterator<ScopeTag> for ScopeTags {
    fn from_iter<I: IntoIterator<Item = ScopeTag>>(iter: I) -> Self {
        let mut tags = ScopeTags::EMPTY;
        for tag in iter {
            tags.insert(tag);
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_control_label_is_a_keyword() {
        let tags = ScopeTags::classify(&["source.ruby", "keyword.control.ruby"]);
        assert!(tags.contains(ScopeTag::Keyword));
        assert!(!tags.contains(ScopeTag::Comment));
        assert!(!tags.contains(ScopeTag::String));
    }

    #[test]
    fn heredoc_opener_carries_both_markers() {
        let tags = ScopeTags::classify(&[
            "source.ruby",
            "string.unquoted.heredoc.ruby",
            "punctuation.definition.string.begin.ruby",
        ]);
        assert!(tags.contains_all(&[ScopeTag::Heredoc, ScopeTag::StringBegin, ScopeTag::String]));
        assert!(!tags.contains(ScopeTag::StringEnd));
    }

    #[test]
    fn assignment_operator_is_also_a_keyword_family_label() {
        let tags = ScopeTags::classify(&["keyword.operator.assignment.augmented.ruby"]);
        assert!(tags.contains(ScopeTag::Assignment));
        assert!(tags.contains(ScopeTag::Keyword));
    }

    #[test]
    fn empty_labels_give_no_tags() {
        let labels: [&str; 0] = [];
        assert!(ScopeTags::classify(&labels).is_empty());
    }

    #[test]
    fn collects_from_iterator() {
        let tags: ScopeTags = [ScopeTag::DictBegin, ScopeTag::ListBegin].into_iter().collect();
        assert!(tags.contains_any(&[ScopeTag::ListBegin, ScopeTag::Comment]));
        assert!(!tags.contains_any(&[ScopeTag::Comment, ScopeTag::String]));
    }
}
