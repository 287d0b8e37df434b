// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains the data structures shared across the application,
//! organized by their primary purpose.

mod config;
mod credentials;
mod source;
mod state;

// Re-export all public types
pub use config::{Config, FetchConfig, SmsConfig};
pub use credentials::{Credentials, parse_recipients};
pub use source::{SignatureKind, Source};
pub use state::State;
