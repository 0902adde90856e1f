use std::fmt;

pub const DEFAULT_TRIGGER: char = '@';

/// An open "the user may be typing a mention" region. `anchor` is the byte
/// offset just past the trigger character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MentionSession {
    anchor: usize,
}

impl MentionSession {
    pub fn on_trigger(caret: usize) -> Self {
        Self { anchor: caret }
    }

    pub fn anchor(self) -> usize {
        self.anchor
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    CaretBeforeAnchor,
    AnchorOutOfRange,
    TriggerRemoved,
    Whitespace,
    Cancelled,
    Committed,
    FocusLost,
    Replaced,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::CaretBeforeAnchor => "caret moved before anchor",
            Self::AnchorOutOfRange => "anchor out of range",
            Self::TriggerRemoved => "trigger removed",
            Self::Whitespace => "whitespace in query",
            Self::Cancelled => "cancelled",
            Self::Committed => "committed",
            Self::FocusLost => "focus lost",
            Self::Replaced => "buffer replaced",
        };
        f.write_str(reason)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryState {
    Active(String),
    Closed(CloseReason),
}

/// Evaluated after every edit or caret move while a session is open.
pub fn current_query(text: &str, caret: usize, session: MentionSession, trigger: char) -> QueryState {
    let anchor = session.anchor;
    if caret < anchor {
        return QueryState::Closed(CloseReason::CaretBeforeAnchor);
    }
    if anchor > text.len() || !text.is_char_boundary(anchor) {
        return QueryState::Closed(CloseReason::AnchorOutOfRange);
    }
    if !text[..anchor].ends_with(trigger) {
        return QueryState::Closed(CloseReason::TriggerRemoved);
    }
    let Some(query) = text.get(anchor..caret) else {
        return QueryState::Closed(CloseReason::AnchorOutOfRange);
    };
    if query.chars().any(char::is_whitespace) {
        return QueryState::Closed(CloseReason::Whitespace);
    }
    QueryState::Active(query.to_string())
}

/// Opens a session when the character just before the caret is the trigger.
pub fn typed_trigger(text: &str, caret: usize, trigger: char) -> Option<MentionSession> {
    text.get(..caret)
        .filter(|before| before.ends_with(trigger))
        .map(|_| MentionSession::on_trigger(caret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_spans_anchor_to_caret() {
        let session = MentionSession::on_trigger(4);
        assert_eq!(
            current_query("hi @al bob", 6, session, '@'),
            QueryState::Active("al".to_string())
        );
        assert_eq!(
            current_query("hi @al bob", 4, session, '@'),
            QueryState::Active(String::new())
        );
    }

    #[test]
    fn caret_before_anchor_closes() {
        let session = MentionSession::on_trigger(4);
        assert_eq!(
            current_query("hi @al", 3, session, '@'),
            QueryState::Closed(CloseReason::CaretBeforeAnchor)
        );
    }

    #[test]
    fn whitespace_in_query_closes() {
        let session = MentionSession::on_trigger(1);
        assert_eq!(
            current_query("@al ", 4, session, '@'),
            QueryState::Closed(CloseReason::Whitespace)
        );
        assert_eq!(
            current_query("@a\nb", 4, session, '@'),
            QueryState::Closed(CloseReason::Whitespace)
        );
    }

    #[test]
    fn replaced_trigger_closes() {
        let session = MentionSession::on_trigger(1);
        assert_eq!(
            current_query("xal", 3, session, '@'),
            QueryState::Closed(CloseReason::TriggerRemoved)
        );
    }

    #[test]
    fn anchor_past_end_closes() {
        let session = MentionSession::on_trigger(9);
        assert_eq!(
            current_query("short", 9, session, '@'),
            QueryState::Closed(CloseReason::AnchorOutOfRange)
        );
    }

    #[test]
    fn backspacing_closes_only_when_trigger_goes() {
        let session = MentionSession::on_trigger(1);
        assert!(matches!(current_query("@a", 2, session, '@'), QueryState::Active(_)));
        assert!(matches!(current_query("@", 1, session, '@'), QueryState::Active(_)));
        assert!(matches!(current_query("", 0, session, '@'), QueryState::Closed(_)));
    }

    #[test]
    fn detects_typed_trigger() {
        assert_eq!(typed_trigger("hi @", 4, '@'), Some(MentionSession::on_trigger(4)));
        assert_eq!(typed_trigger("hi @x", 5, '@'), None);
        assert_eq!(typed_trigger("", 0, '@'), None);
        assert_eq!(typed_trigger("é@", 3, '@').map(MentionSession::anchor), Some(3));
    }

    #[test]
    fn multibyte_query_is_sliced_on_boundaries() {
        let session = MentionSession::on_trigger(1);
        assert_eq!(
            current_query("@zoë", 5, session, '@'),
            QueryState::Active("zoë".to_string())
        );
    }
}
