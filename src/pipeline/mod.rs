//! Pipeline entry points for watcher operations.
//!
//! - `ChangeDetector`: fetch, sign and compare a single source
//! - `run_check`: process every configured source and persist state

pub mod detect;
pub mod run;

pub use detect::{ChangeDetector, Outcome};
pub use run::{RunReport, RunStats, run, run_check};
