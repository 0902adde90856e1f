use thiserror::Error;

use crate::editor_core::CoreError;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid composer configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("browser API unavailable: {0}")]
    Dom(String),
}

impl ComposerError {
    /// Wraps a rejected JS promise or a thrown DOM exception.
    pub fn network(url: &str, err: &wasm_bindgen::JsValue) -> Self {
        Self::Network {
            url: url.to_string(),
            message: describe_js_error(err),
        }
    }
}

pub fn describe_js_error(err: &wasm_bindgen::JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(err, &wasm_bindgen::JsValue::from_str("message"))
                .ok()
                .and_then(|message| message.as_string())
        })
        .unwrap_or_else(|| format!("{err:?}"))
}
