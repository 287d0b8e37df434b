//! Watched source definition.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Strategy used to reduce a fetched page to a signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureKind {
    /// Hash of the visible text
    #[default]
    PageHash,

    /// Hash of the first matching link target
    #[serde(alias = "warzone_link_hash")]
    LinkHash,

    /// Hash of the raw body; also used for unrecognised kinds
    #[serde(other)]
    RawHash,
}

/// A configured watch target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Display label used in alerts
    pub name: String,

    /// Page URL, also the key into persisted state
    pub url: String,

    #[serde(default)]
    pub kind: SignatureKind,

    /// Substrings that must all appear in a link's href (case-insensitive)
    /// for `link_hash` to select it
    #[serde(default = "default_link_keywords")]
    pub link_keywords: Vec<String>,
}

fn default_link_keywords() -> Vec<String> {
    vec!["warzone".into(), "patchnotes".into()]
}

impl Source {
    /// Create a source with the default link keywords.
    pub fn new(name: impl Into<String>, url: impl Into<String>, kind: SignatureKind) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind,
            link_keywords: default_link_keywords(),
        }
    }

    /// Check that the source can be fetched and keyed.
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.url)
            .map_err(|e| AppError::validation(format!("Source '{}': {}", self.name, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "Source '{}' must use http or https: {}",
                self.name, self.url
            )));
        }
        if self.kind == SignatureKind::LinkHash && self.link_keywords.is_empty() {
            return Err(AppError::validation(format!(
                "Source '{}' uses link_hash without link_keywords",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults_to_page_hash() {
        let source: Source =
            serde_yaml::from_str("name: Docs\nurl: https://example.com/").unwrap();
        assert_eq!(source.kind, SignatureKind::PageHash);
        assert_eq!(source.link_keywords, vec!["warzone", "patchnotes"]);
    }

    #[test]
    fn test_unknown_kind_falls_back_to_raw() {
        let source: Source =
            serde_yaml::from_str("name: Feed\nurl: https://example.com/\nkind: full_text")
                .unwrap();
        assert_eq!(source.kind, SignatureKind::RawHash);
    }

    #[test]
    fn test_validate_rejects_non_http() {
        let source = Source::new("Local", "file:///etc/hosts", SignatureKind::RawHash);
        assert!(source.validate().is_err());

        let source = Source::new("Bad", "not a url", SignatureKind::PageHash);
        assert!(source.validate().is_err());
    }
}
