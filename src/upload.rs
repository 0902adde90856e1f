use serde::Deserialize;

use crate::editor_core::{ApplyOutcome, CoreError, Selection, TextBuffer, TextChange, Transaction};

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UploadResponse {
    #[serde(rename = "Path")]
    pub path: String,
}

/// Appends ` ![](path) ` to the end of the field and moves the caret after it.
pub fn append_media_link<B: TextBuffer + ?Sized>(
    buffer: &mut B,
    path: &str,
) -> Result<ApplyOutcome, CoreError> {
    let len = buffer.text().len();
    let insert = format!(" ![]({path}) ");
    let caret = len + insert.len();
    buffer.apply(&Transaction::single(
        TextChange::new(len, len, insert),
        Selection::cursor(caret),
        "media-upload",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor_core::EditorSnapshot;

    #[test]
    fn decodes_upload_response() {
        let response: UploadResponse =
            serde_json::from_str(r#"{"Path": "/media/abc.png"}"#).unwrap();
        assert_eq!(response.path, "/media/abc.png");
    }

    #[test]
    fn appends_link_regardless_of_caret() {
        let mut buffer = EditorSnapshot::new("look at this");
        buffer.set_selection(Selection::new(0, 4));
        append_media_link(&mut buffer, "/media/abc.png").unwrap();
        assert_eq!(buffer.text, "look at this ![](/media/abc.png) ");
        assert_eq!(buffer.selection, Selection::cursor(buffer.text.len()));
    }
}
