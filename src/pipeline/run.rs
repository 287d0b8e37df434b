// src/pipeline/run.rs

//! Run driver: one sequential pass over every configured source.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Source, State};
use crate::pipeline::detect::{ChangeDetector, Outcome};
use crate::storage::StateStore;

/// Outcome counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub first_observations: usize,
    pub unchanged: usize,
    pub changed: usize,
    pub alert_failures: usize,
    pub fetch_failures: usize,
    pub invalid: usize,
}

impl RunStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::FirstObservation => self.first_observations += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Changed { notified } => {
                self.changed += 1;
                if !notified {
                    self.alert_failures += 1;
                }
            }
            Outcome::FetchFailed => self.fetch_failures += 1,
            Outcome::Invalid => self.invalid += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.first_observations + self.unchanged + self.changed + self.fetch_failures + self.invalid
    }
}

/// Final state and statistics of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: State,
    pub stats: RunStats,
}

/// Process `sources` in order, one at a time, starting from `state`.
///
/// Failures are confined to the source that produced them. A source whose
/// url repeats an earlier one is skipped as invalid.
pub async fn run(detector: &ChangeDetector, sources: &[Source], mut state: State) -> RunReport {
    let mut stats = RunStats::default();
    let mut seen = HashSet::new();

    for source in sources {
        let outcome = if seen.insert(source.url.as_str()) {
            detector.check(source, &mut state).await
        } else {
            log::warn!(
                "Skipping {}: url {} already watched by an earlier source",
                source.name,
                source.url
            );
            Outcome::Invalid
        };
        log::debug!("{}: {}", source.name, outcome);
        stats.record(outcome);
    }

    RunReport { state, stats }
}

/// Load state, run every source, and persist the result.
///
/// With `dry_run` set the final state is discarded instead of saved.
pub async fn run_check(
    store: &dyn StateStore,
    detector: &ChangeDetector,
    sources: &[Source],
    dry_run: bool,
) -> Result<RunStats> {
    let state = store.load().await;
    log::info!(
        "Checking {} sources ({} known signatures)",
        sources.len(),
        state.len()
    );

    let report = run(detector, sources, state).await;

    if dry_run {
        log::info!("Dry run: state not saved");
    } else {
        store.save(&report.state).await?;
    }

    let stats = report.stats;
    log::info!(
        "Done: {} changed, {} unchanged, {} new, {} fetch failures, {} alert failures, {} invalid",
        stats.changed,
        stats.unchanged,
        stats.first_observations,
        stats.fetch_failures,
        stats.alert_failures,
        stats.invalid
    );
    Ok(stats)
}
