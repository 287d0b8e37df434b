// src/pipeline/detect.rs

//! Per-source change detection.

use std::fmt;

use crate::models::{Source, State};
use crate::services::fetcher::{Fetcher, RetryPolicy, fetch_with_retry};
use crate::services::notifier::Notifier;
use crate::services::signature;

/// Result of checking one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No prior signature; stored without alerting
    FirstObservation,
    /// Signature matches the stored one
    Unchanged,
    /// Signature differs; stored, alert attempted
    Changed { notified: bool },
    /// Page could not be fetched; state untouched
    FetchFailed,
    /// Source is misconfigured or shadowed by an earlier one; skipped
    Invalid,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::FirstObservation => write!(f, "first observation"),
            Outcome::Unchanged => write!(f, "unchanged"),
            Outcome::Changed { notified: true } => write!(f, "changed"),
            Outcome::Changed { notified: false } => write!(f, "changed (alert failed)"),
            Outcome::FetchFailed => write!(f, "fetch failed"),
            Outcome::Invalid => write!(f, "invalid source"),
        }
    }
}

/// Fetches sources, compares signatures and triggers alerts.
pub struct ChangeDetector {
    fetcher: Box<dyn Fetcher>,
    notifier: Notifier,
    retry: RetryPolicy,
}

impl ChangeDetector {
    pub fn new(fetcher: Box<dyn Fetcher>, notifier: Notifier, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            notifier,
            retry,
        }
    }

    /// Check a single source, updating `state` in place.
    pub async fn check(&self, source: &Source, state: &mut State) -> Outcome {
        log::info!("Checking: {} - {}", source.name, source.url);

        if let Err(e) = source.validate() {
            log::warn!("Skipping {}: {}", source.name, e);
            return Outcome::Invalid;
        }

        let page = match fetch_with_retry(self.fetcher.as_ref(), &source.url, &self.retry).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Could not fetch {}: {}", source.url, e);
                return Outcome::FetchFailed;
            }
        };

        let current = signature::extract(source, &page);

        let outcome = match state.get(&source.url) {
            None => {
                log::info!("First observation of {}, storing signature", source.name);
                Outcome::FirstObservation
            }
            Some(previous) if previous == current => {
                log::info!("No change for {}", source.name);
                return Outcome::Unchanged;
            }
            Some(_) => {
                log::info!("Change detected for {}, sending alert", source.name);
                let notified = match self.notifier.notify(&source.name, &source.url).await {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("Alert for {} failed: {}", source.name, e);
                        false
                    }
                };
                Outcome::Changed { notified }
            }
        };

        state.insert(source.url.clone(), current);
        outcome
    }
}
