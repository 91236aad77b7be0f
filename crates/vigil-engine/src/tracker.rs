//! Consecutive-failure tracking.
//!
//! One counter per target URL. Counters drive the recovery gate:
//! a target must be down for `max_failures_before_recovery` consecutive
//! cycles before remediation is attempted.

use std::collections::HashMap;

use tracing::{debug, info};

use vigil_core::{ProbeResult, ProbeStatus, TargetUrl};

/// Per-target consecutive-failure counters.
///
/// Owned by the orchestrator; mutated only through [`update`].
///
/// [`update`]: FailureTracker::update
#[derive(Debug, Default)]
pub struct FailureTracker {
    counts: HashMap<TargetUrl, u32>,
}

impl FailureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cycle's results into the counters.
    ///
    /// Down increments by exactly 1; up and slow reset to 0; degraded
    /// and unknown leave the counter untouched.
    pub fn update(&mut self, results: &[ProbeResult]) {
        for result in results {
            match result.status {
                ProbeStatus::Down => {
                    let count = self.counts.entry(result.url.clone()).or_insert(0);
                    *count += 1;
                    debug!(url = %result.url, failures = *count, "failure count incremented");
                }
                ProbeStatus::Up | ProbeStatus::Slow => {
                    if let Some(count) = self.counts.get_mut(&result.url) {
                        if *count > 0 {
                            info!(url = %result.url, status = %result.status, "resetting failure count");
                        }
                        *count = 0;
                    }
                }
                ProbeStatus::Degraded | ProbeStatus::Unknown => {}
            }
        }
    }

    /// Current consecutive-failure count for a target.
    pub fn count(&self, url: &str) -> u32 {
        self.counts.get(url).copied().unwrap_or(0)
    }

    /// Snapshot of all nonzero-or-seen counters.
    pub fn counts(&self) -> &HashMap<TargetUrl, u32> {
        &self.counts
    }
}
