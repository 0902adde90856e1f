use crate::editor_core::{
    replace_selection, ApplyOutcome, CaretPolicy, CoreError, Selection, TextBuffer, TextChange,
    Transaction,
};

pub const LINK_TEMPLATE: &str = "[title](https://)";
pub const IMAGE_TEMPLATE: &str = "![](https://)";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatCommand {
    Wrap {
        delimiter: &'static str,
        label: &'static str,
    },
    Template {
        snippet: &'static str,
        label: &'static str,
    },
}

impl FormatCommand {
    pub const BOLD: Self = Self::Wrap {
        delimiter: "**",
        label: "bold",
    };
    pub const ITALIC: Self = Self::Wrap {
        delimiter: "*",
        label: "italic",
    };
    pub const STRIKE: Self = Self::Wrap {
        delimiter: "~~",
        label: "strike",
    };
    pub const CODE: Self = Self::Wrap {
        delimiter: "`",
        label: "code",
    };
    pub const LINK: Self = Self::Template {
        snippet: LINK_TEMPLATE,
        label: "link",
    };
    pub const IMAGE: Self = Self::Template {
        snippet: IMAGE_TEMPLATE,
        label: "image",
    };

    pub fn label(self) -> &'static str {
        match self {
            Self::Wrap { label, .. } | Self::Template { label, .. } => label,
        }
    }
}

pub fn apply_format_command<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    command: FormatCommand,
) -> Result<ApplyOutcome, CoreError> {
    match command {
        FormatCommand::Wrap { delimiter, label } => wrap_selection(buffer, delimiter, label),
        FormatCommand::Template { snippet, label } => insert_template(buffer, snippet, label),
    }
}

/// Surrounds the selection with `delimiter` on both sides. An empty selection
/// gets a delimiter pair with the caret between them; otherwise the caret
/// ends up after the closing delimiter. Delimiters already inside the
/// selection are left as they are.
pub fn wrap_selection<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    delimiter: &str,
    label: &'static str,
) -> Result<ApplyOutcome, CoreError> {
    let text = buffer.text();
    buffer.apply(&wrap_transaction(&text, buffer.selection(), delimiter, label))
}

fn wrap_transaction(
    text: &str,
    selection: Selection,
    delimiter: &str,
    label: &'static str,
) -> Transaction {
    let selection = selection.clamp_to(text);
    let mut insert = String::with_capacity(selection.end - selection.start + 2 * delimiter.len());
    insert.push_str(delimiter);
    insert.push_str(&text[selection.start..selection.end]);
    insert.push_str(delimiter);
    let caret = if selection.is_cursor() {
        selection.start + delimiter.len()
    } else {
        selection.start + insert.len()
    };
    Transaction::single(
        TextChange::new(selection.start, selection.end, insert),
        Selection::cursor(caret),
        label,
    )
}

pub fn insert_template<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    snippet: &str,
    label: &'static str,
) -> Result<ApplyOutcome, CoreError> {
    replace_selection(buffer, snippet, CaretPolicy::InsideTrailingParen, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor_core::EditorSnapshot;

    fn snapshot(text: &str, start: usize, end: usize) -> EditorSnapshot {
        let mut snapshot = EditorSnapshot::new(text);
        snapshot.set_selection(Selection::new(start, end));
        snapshot
    }

    #[test]
    fn wraps_selection_with_bold() {
        let mut buffer = snapshot("twtxt rocks", 6, 11);
        apply_format_command(&mut buffer, FormatCommand::BOLD).unwrap();
        assert_eq!(buffer.text, "twtxt **rocks**");
        assert_eq!(buffer.selection, Selection::cursor(15));
    }

    #[test]
    fn empty_selection_places_caret_between_delimiters() {
        let mut buffer = snapshot("a  b", 2, 2);
        apply_format_command(&mut buffer, FormatCommand::STRIKE).unwrap();
        assert_eq!(buffer.text, "a ~~~~ b");
        assert_eq!(buffer.selection, Selection::cursor(4));
    }

    #[test]
    fn wrapping_empty_buffer_is_total() {
        let mut buffer = EditorSnapshot::new("");
        apply_format_command(&mut buffer, FormatCommand::CODE).unwrap();
        assert_eq!(buffer.text, "``");
        assert_eq!(buffer.selection, Selection::cursor(1));
    }

    #[test]
    fn removing_inserted_pair_restores_original() {
        for (text, caret) in [("", 0), ("hello", 0), ("hello", 3), ("héllo", 3), ("x", 1)] {
            for delimiter in ["**", "*", "~~", "`"] {
                let mut buffer = snapshot(text, caret, caret);
                wrap_selection(&mut buffer, delimiter, "wrap").unwrap();
                let mut restored = buffer.text.clone();
                restored.replace_range(caret..caret + 2 * delimiter.len(), "");
                assert_eq!(restored, text, "delimiter {delimiter:?} at {caret}");
            }
        }
    }

    #[test]
    fn non_empty_wrap_grows_by_two_delimiters() {
        for (text, start, end) in [("hello", 0, 5), ("a b c", 2, 3), ("**x**", 0, 5)] {
            for delimiter in ["**", "*", "~~", "`"] {
                let mut buffer = snapshot(text, start, end);
                wrap_selection(&mut buffer, delimiter, "wrap").unwrap();
                assert_eq!(buffer.text.len(), text.len() + 2 * delimiter.len());
            }
        }
    }

    #[test]
    fn does_not_escape_existing_delimiters() {
        let mut buffer = snapshot("*a*", 0, 3);
        apply_format_command(&mut buffer, FormatCommand::ITALIC).unwrap();
        assert_eq!(buffer.text, "**a**");
    }

    #[test]
    fn link_template_caret_before_final_paren() {
        let mut buffer = snapshot("look ", 5, 5);
        apply_format_command(&mut buffer, FormatCommand::LINK).unwrap();
        assert_eq!(buffer.text, "look [title](https://)");
        assert_eq!(buffer.selection, Selection::cursor(buffer.text.len() - 1));
        assert_eq!(&buffer.text[buffer.selection.start..], ")");
    }

    #[test]
    fn image_template_overwrites_selection() {
        let mut buffer = snapshot("replace me", 0, 10);
        apply_format_command(&mut buffer, FormatCommand::IMAGE).unwrap();
        assert_eq!(buffer.text, "![](https://)");
        assert_eq!(buffer.selection, Selection::cursor(12));
    }
}
