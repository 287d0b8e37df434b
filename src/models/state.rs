//! Persisted signature state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Last-seen signature per source url.
///
/// Serialized as `{"sources": {"<url>": "<signature>"}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub sources: BTreeMap<String, String>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously stored signature for `url`, if any.
    pub fn get(&self, url: &str) -> Option<&str> {
        self.sources.get(url).map(String::as_str)
    }

    /// Store `signature` as the newest value for `url`.
    pub fn insert(&mut self, url: impl Into<String>, signature: impl Into<String>) {
        self.sources.insert(url.into(), signature.into());
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
