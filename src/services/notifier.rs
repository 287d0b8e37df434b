// src/services/notifier.rs

//! Alert composition and SMS dispatch.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Credentials, SmsConfig};
use crate::utils::http::create_sms_client;

/// Maximum message length in characters.
pub const MAX_MESSAGE_CHARS: usize = 300;

const TRUNCATION_MARKER: &str = "...";

/// Delivers a single message to a single recipient.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, message: &str) -> Result<()>;
}

/// 46elks SMS API sender.
pub struct ElksSender {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    from: String,
}

impl ElksSender {
    pub fn new(config: &SmsConfig, credentials: &Credentials) -> Result<Self> {
        Ok(Self {
            client: create_sms_client(config)?,
            endpoint: config.endpoint.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
            from: credentials.from.clone(),
        })
    }
}

#[async_trait]
impl SmsSender for ElksSender {
    async fn send(&self, to: &str, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .form(&[("from", self.from.as_str()), ("to", to), ("message", message)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::dispatch(to, format!("{} {}", status, body.trim())));
        }
        Ok(())
    }
}

/// Sender that only logs, used for dry runs.
pub struct LogSender;

#[async_trait]
impl SmsSender for LogSender {
    async fn send(&self, to: &str, message: &str) -> Result<()> {
        log::info!("[dry-run] SMS to {}: {}", to, message.replace('\n', " | "));
        Ok(())
    }
}

/// Composes alerts and broadcasts them to every recipient.
pub struct Notifier {
    prefix: String,
    recipients: Vec<String>,
    sender: Box<dyn SmsSender>,
}

impl Notifier {
    pub fn new(
        prefix: impl Into<String>,
        recipients: Vec<String>,
        sender: Box<dyn SmsSender>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            recipients,
            sender,
        }
    }

    /// Send a change alert for `title` / `url` to every recipient.
    ///
    /// Every recipient is attempted in list order even if an earlier one
    /// fails. Returns an error if at least one delivery failed.
    pub async fn notify(&self, title: &str, url: &str) -> Result<()> {
        let message = compose_message(&self.prefix, title, url, Local::now());

        let mut failed = Vec::new();
        for to in &self.recipients {
            match self.sender.send(to, &message).await {
                Ok(()) => log::debug!("SMS delivered to {}", to),
                Err(e) => {
                    log::error!("SMS to {} failed: {}", to, e);
                    failed.push(to.as_str());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(AppError::dispatch(
                failed.join(","),
                format!("{}/{} recipients failed", failed.len(), self.recipients.len()),
            ))
        }
    }
}

/// Build `"<prefix>: <title>\n<url>\n<YYYY-MM-DD HH:MM>"`, truncated to
/// [`MAX_MESSAGE_CHARS`].
pub fn compose_message(prefix: &str, title: &str, url: &str, timestamp: DateTime<Local>) -> String {
    let message = format!(
        "{}: {}\n{}\n{}",
        prefix,
        title,
        url,
        timestamp.format("%Y-%m-%d %H:%M")
    );
    truncate(message, MAX_MESSAGE_CHARS)
}

/// Cut `message` from the end so that, including the marker, it is exactly
/// `limit` characters. Shorter messages are returned unchanged.
fn truncate(message: String, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message;
    }
    let keep = limit.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut truncated: String = message.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}
