//! Storage abstractions for signature state.
//!
//! State is a single JSON document rewritten in full at the end of each run:
//!
//! ```text
//! {
//!   "sources": {
//!     "https://example.com/changelog": "9f86d08...",
//!     "https://example.com/patchnotes": ""
//!   }
//! }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::State;

// Re-export for convenience
pub use local::JsonStateStore;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state.
    ///
    /// Never fails: a missing or unreadable document yields empty state.
    async fn load(&self) -> State;

    /// Replace the persisted state with `state`.
    ///
    /// Readers observe either the previous document or the new one, never a
    /// partial write.
    async fn save(&self, state: &State) -> Result<()>;
}
