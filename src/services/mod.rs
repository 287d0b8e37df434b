//! Service layer for the watcher.
//!
//! This module contains the collaborators used by the pipeline:
//! - Page fetching with timeout retry (`HttpFetcher`, `fetch_with_retry`)
//! - Signature extraction (`signature::extract`)
//! - Alert dispatch (`Notifier`, `ElksSender`)

pub mod fetcher;
pub mod notifier;
pub mod signature;

pub use fetcher::{FetchedPage, Fetcher, HttpFetcher, RetryPolicy};
pub use notifier::{ElksSender, LogSender, Notifier, SmsSender};
