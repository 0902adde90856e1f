use serde::Deserialize;

use crate::error::ComposerError;

pub const CONFIG_ELEMENT_ID: &str = "composer-config";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ComposerConfig {
    pub lookup_url: String,
    pub upload_url: String,
    pub post_url: String,
    pub debounce_ms: u32,
    pub trigger: char,
    pub log_filter: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            lookup_url: "/lookup".to_string(),
            upload_url: "/upload".to_string(),
            post_url: "/post".to_string(),
            debounce_ms: 300,
            trigger: '@',
            log_filter: "info".to_string(),
        }
    }
}

impl ComposerConfig {
    pub fn from_json(json: &str) -> Result<Self, ComposerError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Falls back to the defaults when `raw` is missing or broken. The parse
    /// error is handed back so it can be logged once logging is up.
    pub fn from_page_block(raw: Option<&str>) -> (Self, Option<ComposerError>) {
        match raw.map(Self::from_json) {
            None => (Self::default(), None),
            Some(Ok(config)) => (config, None),
            Some(Err(err)) => (Self::default(), Some(err)),
        }
    }

    /// Reads the page's `#composer-config` JSON block.
    pub fn load() -> (Self, Option<ComposerError>) {
        let raw = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(CONFIG_ELEMENT_ID))
            .and_then(|element| element.text_content());
        Self::from_page_block(raw.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(
            ComposerConfig::from_json("{}").unwrap(),
            ComposerConfig::default()
        );
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config =
            ComposerConfig::from_json(r#"{"debounce_ms": 150, "lookup_url": "/api/lookup", "extra": 1}"#)
                .unwrap();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.lookup_url, "/api/lookup");
        assert_eq!(config.trigger, '@');
        assert_eq!(config.upload_url, "/upload");
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            ComposerConfig::from_json(r#"{"debounce_ms": "soon"}"#),
            Err(ComposerError::Config(_))
        ));
        assert!(ComposerConfig::from_json(r#"{"trigger": "ab"}"#).is_err());
    }

    #[test]
    fn broken_page_block_returns_defaults_and_the_error() {
        let (config, err) = ComposerConfig::from_page_block(Some("{ not json"));
        assert_eq!(config, ComposerConfig::default());
        assert!(matches!(err, Some(ComposerError::Config(_))));

        let (config, err) = ComposerConfig::from_page_block(None);
        assert_eq!(config, ComposerConfig::default());
        assert!(err.is_none());

        let (config, err) = ComposerConfig::from_page_block(Some(r#"{"debounce_ms": 50}"#));
        assert_eq!(config.debounce_ms, 50);
        assert!(err.is_none());
    }
}
