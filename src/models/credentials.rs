//! SMS provider credentials loaded from the environment.

use crate::error::{AppError, Result};

const USERNAME_VAR: &str = "ELKS_USERNAME";
const PASSWORD_VAR: &str = "ELKS_PASSWORD";
const FROM_VAR: &str = "SMS_FROM";
const RECIPIENTS_VAR: &str = "SMS_TO";

/// Account credentials and the broadcast list.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    /// Sender identifier shown to recipients
    pub from: String,
    /// Recipients in configured order
    pub recipients: Vec<String>,
}

impl Credentials {
    /// Read credentials from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary key lookup.
    ///
    /// Every value must be non-blank and the recipient list must contain at
    /// least one entry after splitting on commas.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let username = required(USERNAME_VAR);
        let password = required(PASSWORD_VAR);
        let from = required(FROM_VAR);
        let recipients = parse_recipients(&lookup(RECIPIENTS_VAR).unwrap_or_default());

        match (username, password, from) {
            (Some(username), Some(password), Some(from)) if !recipients.is_empty() => Ok(Self {
                username,
                password,
                from,
                recipients,
            }),
            _ => Err(AppError::config(format!(
                "Missing {USERNAME_VAR}/{PASSWORD_VAR}/{FROM_VAR} or {RECIPIENTS_VAR}"
            ))),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("recipients", &self.recipients)
            .finish()
    }
}

/// Split a comma-separated recipient list, dropping blank entries.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_complete_environment() {
        let vars = env(&[
            ("ELKS_USERNAME", "u123"),
            ("ELKS_PASSWORD", "secret"),
            ("SMS_FROM", "Watcher"),
            ("SMS_TO", "+46700000001, +46700000002,"),
        ]);
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.recipients, vec!["+46700000001", "+46700000002"]);
        assert_eq!(creds.from, "Watcher");
        assert!(!format!("{creds:?}").contains("secret"));
    }

    #[test]
    fn test_blank_value_is_rejected() {
        let vars = env(&[
            ("ELKS_USERNAME", "u123"),
            ("ELKS_PASSWORD", "   "),
            ("SMS_FROM", "Watcher"),
            ("SMS_TO", "+46700000001"),
        ]);
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_empty_recipient_list_is_rejected() {
        let vars = env(&[
            ("ELKS_USERNAME", "u123"),
            ("ELKS_PASSWORD", "secret"),
            ("SMS_FROM", "Watcher"),
            ("SMS_TO", " , ,"),
        ]);
        assert!(Credentials::from_lookup(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_parse_recipients_keeps_order() {
        assert_eq!(parse_recipients("b,a, c"), vec!["b", "a", "c"]);
        assert!(parse_recipients("").is_empty());
    }
}
