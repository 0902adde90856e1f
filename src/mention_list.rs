use crate::editor_core::{
    replace_selection, CaretPolicy, CoreError, Selection, TextBuffer, TextChange, Transaction,
};
use crate::error::ComposerError;
use crate::lookup::{Candidate, LookupRequest, LookupSequencer, LookupTicket};
use crate::mention::{self, CloseReason, MentionSession, QueryState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Tab,
    Enter,
    Escape,
    Backspace,
    Other,
}

impl Key {
    /// Maps `KeyboardEvent.key` values, including the legacy short names.
    pub fn from_key_name(name: &str) -> Self {
        match name {
            "ArrowUp" | "Up" => Self::ArrowUp,
            "ArrowDown" | "Down" => Self::ArrowDown,
            "Tab" => Self::Tab,
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            "Backspace" => Self::Backspace,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The caller should `preventDefault` the event.
    Handled,
    PassThrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Insert,
    Delete,
    Other,
}

impl InputKind {
    /// Maps `InputEvent.inputType`.
    pub fn from_input_type(input_type: &str) -> Self {
        if input_type.starts_with("insert") {
            Self::Insert
        } else if input_type.starts_with("delete") {
            Self::Delete
        } else {
            Self::Other
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OpenList {
    session: MentionSession,
    query: String,
    candidates: Vec<Candidate>,
    highlighted: Option<usize>,
    error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ListState {
    Closed,
    Open(OpenList),
}

/// What the popup should currently show.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct MentionPopup {
    pub open: bool,
    pub candidates: Vec<Candidate>,
    pub highlighted: Option<usize>,
    pub error: Option<String>,
}

/// Owns the mention session and candidate list. Transitions that want fresh
/// candidates hand back a [`LookupRequest`]; the result comes back through
/// [`MentionListController::apply_lookup`].
#[derive(Clone, Debug)]
pub struct MentionListController {
    trigger: char,
    state: ListState,
    sequencer: LookupSequencer,
}

impl Default for MentionListController {
    fn default() -> Self {
        Self::new(mention::DEFAULT_TRIGGER)
    }
}

impl MentionListController {
    pub fn new(trigger: char) -> Self {
        Self {
            trigger,
            state: ListState::Closed,
            sequencer: LookupSequencer::default(),
        }
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ListState::Open(_))
    }

    pub fn session(&self) -> Option<MentionSession> {
        match &self.state {
            ListState::Open(open) => Some(open.session),
            ListState::Closed => None,
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        match &self.state {
            ListState::Open(open) => &open.candidates,
            ListState::Closed => &[],
        }
    }

    pub fn highlighted(&self) -> Option<usize> {
        match &self.state {
            ListState::Open(open) => open.highlighted,
            ListState::Closed => None,
        }
    }

    pub fn popup(&self) -> MentionPopup {
        match &self.state {
            ListState::Open(open) => MentionPopup {
                open: true,
                candidates: open.candidates.clone(),
                highlighted: open.highlighted,
                error: open.error.clone(),
            },
            ListState::Closed => MentionPopup::default(),
        }
    }

    /// Whether a debounced or in-flight lookup should still go ahead.
    pub fn is_current(&self, ticket: LookupTicket) -> bool {
        self.is_open() && self.sequencer.is_current(ticket)
    }

    /// Starts a fresh session anchored at `caret`, dropping any previous one.
    pub fn open_at(&mut self, caret: usize) -> LookupRequest {
        self.sequencer.cancel();
        tracing::debug!(anchor = caret, "mention session opened");
        self.state = ListState::Open(OpenList {
            session: MentionSession::on_trigger(caret),
            query: String::new(),
            candidates: Vec::new(),
            highlighted: None,
            error: None,
        });
        self.sequencer.issue(None)
    }

    pub fn close(&mut self, reason: CloseReason) {
        if let ListState::Open(open) = &self.state {
            tracing::debug!(anchor = open.session.anchor(), %reason, "mention session closed");
        }
        self.state = ListState::Closed;
        self.sequencer.cancel();
    }

    /// The `@` toolbar action: closes an open popup, otherwise inserts the
    /// trigger at the caret and opens a session right after it.
    pub fn toggle_from_button<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &mut B,
    ) -> Result<Option<LookupRequest>, CoreError> {
        if self.is_open() {
            self.close(CloseReason::Cancelled);
            return Ok(None);
        }
        let mut utf8 = [0u8; 4];
        let trigger = self.trigger.encode_utf8(&mut utf8);
        replace_selection(buffer, trigger, CaretPolicy::AfterInsert, "mention-trigger")?;
        Ok(Some(self.open_at(buffer.selection().end)))
    }

    /// Called after the browser has applied a native edit.
    pub fn on_input<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &B,
        kind: InputKind,
    ) -> Option<LookupRequest> {
        if self.is_open() {
            return self.refresh(buffer);
        }
        if kind != InputKind::Insert {
            return None;
        }
        let selection = buffer.selection();
        if !selection.is_cursor() {
            return None;
        }
        let session = mention::typed_trigger(&buffer.text(), selection.end, self.trigger)?;
        Some(self.open_at(session.anchor()))
    }

    pub fn on_selection_change<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &B,
    ) -> Option<LookupRequest> {
        if self.is_open() {
            self.refresh(buffer)
        } else {
            None
        }
    }

    pub fn on_blur(&mut self) {
        self.close(CloseReason::FocusLost);
    }

    fn evaluate(&self, text: &str, selection: Selection, session: MentionSession) -> QueryState {
        if selection.start < session.anchor() {
            return QueryState::Closed(CloseReason::CaretBeforeAnchor);
        }
        mention::current_query(text, selection.end, session, self.trigger)
    }

    fn refresh<B: TextBuffer + ?Sized>(&mut self, buffer: &B) -> Option<LookupRequest> {
        let ListState::Open(open) = &self.state else {
            return None;
        };
        let text = buffer.text();
        match self.evaluate(&text, buffer.selection(), open.session) {
            QueryState::Closed(reason) => {
                self.close(reason);
                None
            }
            QueryState::Active(query) if query == open.query => None,
            QueryState::Active(query) => {
                let prefix = (!query.is_empty()).then(|| query.clone());
                if let ListState::Open(open) = &mut self.state {
                    open.query = query;
                }
                Some(self.sequencer.issue(prefix))
            }
        }
    }

    /// Applies a lookup result. Returns `false` when the ticket was superseded
    /// or the session has ended.
    pub fn apply_lookup(
        &mut self,
        ticket: LookupTicket,
        result: Result<Vec<Candidate>, ComposerError>,
    ) -> bool {
        if !self.sequencer.is_current(ticket) {
            tracing::debug!(?ticket, "dropping superseded lookup response");
            return false;
        }
        let ListState::Open(open) = &mut self.state else {
            return false;
        };
        match result {
            Ok(candidates) => {
                open.highlighted = if candidates.is_empty() { None } else { Some(0) };
                open.candidates = candidates;
                open.error = None;
            }
            Err(err) => {
                tracing::warn!(%err, "mention lookup failed");
                open.candidates.clear();
                open.highlighted = None;
                open.error = Some(err.to_string());
            }
        }
        true
    }

    /// Hover support: makes `index` the highlighted candidate.
    pub fn highlight(&mut self, index: usize) {
        if let ListState::Open(open) = &mut self.state {
            if index < open.candidates.len() {
                open.highlighted = Some(index);
            }
        }
    }

    pub fn on_key<B: TextBuffer + ?Sized>(&mut self, key: Key, buffer: &mut B) -> KeyOutcome {
        let ListState::Open(open) = &mut self.state else {
            return KeyOutcome::PassThrough;
        };
        match key {
            Key::Escape => {
                self.close(CloseReason::Cancelled);
                KeyOutcome::Handled
            }
            Key::ArrowUp | Key::ArrowDown => {
                let count = open.candidates.len();
                if count == 0 {
                    return KeyOutcome::PassThrough;
                }
                let current = open.highlighted.unwrap_or(0);
                open.highlighted = Some(if key == Key::ArrowDown {
                    (current + 1) % count
                } else {
                    (current + count - 1) % count
                });
                KeyOutcome::Handled
            }
            Key::Tab | Key::Enter => {
                let Some(index) = open.highlighted else {
                    return KeyOutcome::PassThrough;
                };
                match self.commit(index, buffer) {
                    Ok(true) => KeyOutcome::Handled,
                    Ok(false) => KeyOutcome::PassThrough,
                    Err(err) => {
                        tracing::warn!(%err, "mention commit rejected");
                        self.close(CloseReason::AnchorOutOfRange);
                        KeyOutcome::PassThrough
                    }
                }
            }
            Key::Backspace | Key::Other => KeyOutcome::PassThrough,
        }
    }

    /// Replaces `[anchor, caret)` with the candidate at `index` and closes
    /// the session. Returns `Ok(false)` without touching the buffer when there
    /// is nothing to commit or the session no longer matches the buffer.
    pub fn commit<B: TextBuffer + ?Sized>(
        &mut self,
        index: usize,
        buffer: &mut B,
    ) -> Result<bool, CoreError> {
        let ListState::Open(open) = &self.state else {
            return Ok(false);
        };
        let Some(candidate) = open.candidates.get(index) else {
            return Ok(false);
        };
        let session = open.session;
        let insert = candidate.display_text.clone();

        let text = buffer.text();
        let selection = buffer.selection();
        if let QueryState::Closed(reason) = self.evaluate(&text, selection, session) {
            self.close(reason);
            return Ok(false);
        }

        let anchor = session.anchor();
        let caret = anchor + insert.len();
        self.close(CloseReason::Committed);
        buffer.apply(&Transaction::single(
            TextChange::new(anchor, selection.end, insert),
            Selection::cursor(caret),
            "mention-commit",
        ))?;
        Ok(true)
    }
}
