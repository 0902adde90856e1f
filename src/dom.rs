use web_sys::HtmlTextAreaElement;

use crate::editor_core::{Selection, TextBuffer};

// selectionStart/End are in UTF-16 code units; the core works in UTF-8 bytes.
pub fn utf16_to_byte_idx(s: &str, pos_utf16: u32) -> usize {
    if pos_utf16 == 0 {
        return 0;
    }
    let mut acc: u32 = 0;
    for (i, ch) in s.char_indices() {
        let w = ch.len_utf16() as u32;
        if acc + w > pos_utf16 {
            return i;
        }
        acc += w;
        if acc == pos_utf16 {
            return i + ch.len_utf8();
        }
    }
    s.len()
}

pub fn byte_idx_to_utf16(s: &str, byte_idx: usize) -> u32 {
    s[..byte_idx.min(s.len())].encode_utf16().count() as u32
}

/// [`TextBuffer`] over the composer's `<textarea>`.
pub struct TextAreaBuffer {
    element: HtmlTextAreaElement,
}

impl TextAreaBuffer {
    pub fn new(element: HtmlTextAreaElement) -> Self {
        Self { element }
    }
}

impl TextBuffer for TextAreaBuffer {
    fn text(&self) -> String {
        self.element.value()
    }

    /// Without a usable selection API this degrades to a caret at the end.
    fn selection(&self) -> Selection {
        let text = self.element.value();
        let start = self.element.selection_start().ok().flatten();
        let end = self.element.selection_end().ok().flatten();
        match (start, end) {
            (Some(start), Some(end)) => Selection::new(
                utf16_to_byte_idx(&text, start),
                utf16_to_byte_idx(&text, end),
            ),
            _ => Selection::cursor(text.len()),
        }
    }

    fn splice(&mut self, start: usize, end: usize, insert: &str) {
        let mut text = self.element.value();
        text.replace_range(start..end, insert);
        self.element.set_value(&text);
    }

    fn set_selection_range(&mut self, start: usize, end: usize) {
        let text = self.element.value();
        let selection = Selection::new(start, end).clamp_to(&text);
        let _ = self.element.set_selection_range(
            byte_idx_to_utf16(&text, selection.start),
            byte_idx_to_utf16(&text, selection.end),
        );
    }

    fn focus(&mut self) {
        let _ = self.element.focus();
    }
}
