use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_cursor(self) -> bool {
        self.start == self.end
    }

    /// Clamps both ends into `[0, text.len()]` and onto char boundaries.
    pub fn clamp_to(self, text: &str) -> Self {
        Self::new(
            floor_char_boundary(text, self.start),
            floor_char_boundary(text, self.end),
        )
    }
}

/// Largest char boundary `<= pos`, never past the end of `text`.
pub fn floor_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub start: usize,
    pub end: usize,
    pub insert: String,
}

impl TextChange {
    pub fn new(start: usize, end: usize, insert: impl Into<String>) -> Self {
        Self {
            start,
            end,
            insert: insert.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub change: TextChange,
    pub selection_after: Selection,
    pub label: &'static str,
}

impl Transaction {
    pub fn single(change: TextChange, selection_after: Selection, label: &'static str) -> Self {
        Self {
            change,
            selection_after,
            label,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub text_changed: bool,
    pub selection_changed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("range {start}..{end} is outside text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

fn validate_range(text: &str, start: usize, end: usize) -> Result<(), CoreError> {
    if start > end || end > text.len() {
        return Err(CoreError::InvalidRange {
            start,
            end,
            len: text.len(),
        });
    }
    for offset in [start, end] {
        if !text.is_char_boundary(offset) {
            return Err(CoreError::NotCharBoundary { offset });
        }
    }
    Ok(())
}

/// Read/write access to the editable field. The page owns the field; the
/// composer only goes through this trait.
pub trait TextBuffer {
    fn text(&self) -> String;

    fn selection(&self) -> Selection;

    /// Raw splice of `insert` over `start..end`. Callers validate the range.
    fn splice(&mut self, start: usize, end: usize, insert: &str);

    /// Clamps both offsets to `[0, len]`.
    fn set_selection_range(&mut self, start: usize, end: usize);

    fn focus(&mut self) {}

    fn apply(&mut self, transaction: &Transaction) -> Result<ApplyOutcome, CoreError> {
        let text = self.text();
        let change = &transaction.change;
        validate_range(&text, change.start, change.end)?;

        let before = self.selection();
        let text_changed = text[change.start..change.end] != *change.insert;
        if text_changed {
            self.splice(change.start, change.end, &change.insert);
        }
        let after = transaction.selection_after;
        self.set_selection_range(after.start, after.end);
        self.focus();

        tracing::trace!(label = transaction.label, text_changed, "applied transaction");
        Ok(ApplyOutcome {
            text_changed,
            selection_changed: self.selection() != before,
        })
    }
}

/// In-memory field, used wherever no DOM node backs the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorSnapshot {
    pub text: String,
    pub selection: Selection,
}

impl EditorSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.len();
        Self {
            text,
            selection: Selection::cursor(len),
        }
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp_to(&self.text);
    }

    /// Mirrors a native edit made by the browser outside any transaction.
    pub fn replace_from_input(&mut self, new_text: impl Into<String>, selection: Selection) {
        self.text = new_text.into();
        self.selection = selection.clamp_to(&self.text);
    }
}

impl TextBuffer for EditorSnapshot {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn splice(&mut self, start: usize, end: usize, insert: &str) {
        self.text.replace_range(start..end, insert);
    }

    fn set_selection_range(&mut self, start: usize, end: usize) {
        self.set_selection(Selection::new(start, end));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedText {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

pub fn selected_text<B: TextBuffer + ?Sized>(buffer: &B) -> SelectedText {
    let text = buffer.text();
    let selection = buffer.selection().clamp_to(&text);
    SelectedText {
        start: selection.start,
        end: selection.end,
        text: text[selection.start..selection.end].to_string(),
    }
}

/// Where the caret lands after text is spliced over the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaretPolicy {
    AfterInsert,
    /// Like `AfterInsert`, but one position back when the insert ends in `)`,
    /// leaving the caret inside an empty `(...)` of a link or image.
    InsideTrailingParen,
}

pub fn caret_after_insert(start: usize, insert: &str, policy: CaretPolicy) -> usize {
    let end = start + insert.len();
    match policy {
        CaretPolicy::InsideTrailingParen if insert.ends_with(')') => end - 1,
        _ => end,
    }
}

pub fn replace_selection<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    insert: &str,
    policy: CaretPolicy,
    label: &'static str,
) -> Result<ApplyOutcome, CoreError> {
    let text = buffer.text();
    let selection = buffer.selection().clamp_to(&text);
    let caret = caret_after_insert(selection.start, insert, policy);
    buffer.apply(&Transaction::single(
        TextChange::new(selection.start, selection.end, insert),
        Selection::cursor(caret),
        label,
    ))
}

/// Replaces the whole field, caret at the end.
pub fn prefill<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    text: &str,
) -> Result<ApplyOutcome, CoreError> {
    let len = buffer.text().len();
    buffer.apply(&Transaction::single(
        TextChange::new(0, len, text),
        Selection::cursor(text.len()),
        "prefill",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_transaction_and_places_selection() {
        let mut snapshot = EditorSnapshot::new("hello world");
        let outcome = snapshot
            .apply(&Transaction::single(
                TextChange::new(5, 5, ","),
                Selection::cursor(6),
                "comma",
            ))
            .unwrap();
        assert!(outcome.text_changed);
        assert!(outcome.selection_changed);
        assert_eq!(snapshot.text, "hello, world");
        assert_eq!(snapshot.selection, Selection::cursor(6));
    }

    #[test]
    fn rejects_out_of_range_change() {
        let mut snapshot = EditorSnapshot::new("abc");
        let result = snapshot.apply(&Transaction::single(
            TextChange::new(2, 9, "x"),
            Selection::cursor(0),
            "bad",
        ));
        assert_eq!(
            result,
            Err(CoreError::InvalidRange {
                start: 2,
                end: 9,
                len: 3
            })
        );
        assert_eq!(snapshot.text, "abc");
    }

    #[test]
    fn rejects_offsets_inside_a_char() {
        let mut snapshot = EditorSnapshot::new("héllo");
        let result = snapshot.apply(&Transaction::single(
            TextChange::new(2, 2, "x"),
            Selection::cursor(0),
            "bad",
        ));
        assert_eq!(result, Err(CoreError::NotCharBoundary { offset: 2 }));
    }

    #[test]
    fn set_selection_range_clamps() {
        let mut snapshot = EditorSnapshot::new("héllo");
        snapshot.set_selection_range(2, 40);
        assert_eq!(snapshot.selection, Selection::new(1, 6));
    }

    #[test]
    fn selected_text_reads_current_range() {
        let mut snapshot = EditorSnapshot::new("say hello");
        snapshot.set_selection(Selection::new(4, 9));
        let selected = selected_text(&snapshot);
        assert_eq!((selected.start, selected.end), (4, 9));
        assert_eq!(selected.text, "hello");
    }

    #[test]
    fn replace_selection_lands_inside_trailing_paren() {
        let mut snapshot = EditorSnapshot::new("see ");
        replace_selection(
            &mut snapshot,
            "[title](https://)",
            CaretPolicy::InsideTrailingParen,
            "link",
        )
        .unwrap();
        assert_eq!(snapshot.text, "see [title](https://)");
        assert_eq!(snapshot.selection, Selection::cursor(snapshot.text.len() - 1));
    }

    #[test]
    fn replace_selection_after_insert_ignores_paren() {
        let mut snapshot = EditorSnapshot::new("");
        replace_selection(&mut snapshot, "(x)", CaretPolicy::AfterInsert, "raw").unwrap();
        assert_eq!(snapshot.selection, Selection::cursor(3));
    }

    #[test]
    fn replace_selection_overwrites_range() {
        let mut snapshot = EditorSnapshot::new("one two three");
        snapshot.set_selection(Selection::new(4, 7));
        replace_selection(&mut snapshot, "2", CaretPolicy::AfterInsert, "raw").unwrap();
        assert_eq!(snapshot.text, "one 2 three");
        assert_eq!(snapshot.selection, Selection::cursor(5));
    }

    #[test]
    fn prefill_replaces_everything() {
        let mut snapshot = EditorSnapshot::new("draft");
        snapshot.set_selection(Selection::cursor(0));
        prefill(&mut snapshot, "@<bob https://example.com/bob.txt> ").unwrap();
        assert_eq!(snapshot.text, "@<bob https://example.com/bob.txt> ");
        assert_eq!(snapshot.selection, Selection::cursor(snapshot.text.len()));
    }
}
