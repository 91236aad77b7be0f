//! Notification and recovery gating.
//!
//! Both gates are evaluated fresh every cycle from the annotated batch.
//! The notification gate is stateless; the configured cooldown is
//! tracked by the orchestrator but deliberately not consulted here, so
//! every cycle with a down or degraded target alerts.

use tracing::debug;

use vigil_core::{ProbeResult, ProbeStatus};

use crate::tracker::FailureTracker;

/// Whether this cycle's results warrant an alert.
///
/// True when anything is down, anything recovered (up now after down,
/// slow or degraded), or anything is slow or degraded.
pub fn should_notify(results: &[ProbeResult], enabled: bool) -> bool {
    if !enabled {
        return false;
    }

    if results.iter().any(|r| r.status == ProbeStatus::Down) {
        return true;
    }

    if results.iter().any(|r| r.is_recovery()) {
        return true;
    }

    results
        .iter()
        .any(|r| matches!(r.status, ProbeStatus::Slow | ProbeStatus::Degraded))
}

/// Whether this cycle's results warrant remediation.
///
/// True iff recovery is enabled and some target is down with a
/// consecutive-failure count at or above `threshold`. A target at
/// exactly `threshold` triggers; `threshold - 1` does not.
pub fn should_recover(
    results: &[ProbeResult],
    tracker: &FailureTracker,
    threshold: u32,
    enabled: bool,
) -> bool {
    if !enabled {
        return false;
    }

    for result in results {
        if result.status == ProbeStatus::Down {
            let failures = tracker.count(&result.url);
            debug!(url = %result.url, failures, threshold, "recovery gate check");
            if failures >= threshold {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, status: ProbeStatus) -> ProbeResult {
        let mut r = ProbeResult::new(url);
        r.status = status;
        r
    }

    fn annotated(url: &str, status: ProbeStatus, previous: ProbeStatus) -> ProbeResult {
        let mut r = result(url, status);
        r.previous_status = Some(previous);
        r
    }

    #[test]
    fn down_site_notifies() {
        assert!(should_notify(&[result("a", ProbeStatus::Down)], true));
    }

    #[test]
    fn recovered_site_notifies() {
        let results = [annotated("a", ProbeStatus::Up, ProbeStatus::Down)];
        assert!(should_notify(&results, true));
    }

    #[test]
    fn stable_up_site_does_not_notify() {
        let results = [annotated("a", ProbeStatus::Up, ProbeStatus::Up)];
        assert!(!should_notify(&results, true));
    }

    #[test]
    fn slow_and_degraded_notify() {
        assert!(should_notify(&[result("a", ProbeStatus::Slow)], true));
        assert!(should_notify(&[result("a", ProbeStatus::Degraded)], true));
    }

    #[test]
    fn unknown_alone_does_not_notify() {
        assert!(!should_notify(&[result("a", ProbeStatus::Unknown)], true));
    }

    #[test]
    fn disabled_gate_never_notifies() {
        assert!(!should_notify(&[result("a", ProbeStatus::Down)], false));
    }

    #[test]
    fn recovery_triggers_at_exact_threshold() {
        let mut tracker = FailureTracker::new();
        let down = [result("a", ProbeStatus::Down)];

        // Two consecutive down cycles: under threshold 3.
        tracker.update(&down);
        tracker.update(&down);
        assert!(!should_recover(&down, &tracker, 3, true));

        // Third: at threshold.
        tracker.update(&down);
        assert!(should_recover(&down, &tracker, 3, true));
    }

    #[test]
    fn recovery_requires_current_down_status() {
        let mut tracker = FailureTracker::new();
        let down = [result("a", ProbeStatus::Down)];
        tracker.update(&down);
        tracker.update(&down);
        tracker.update(&down);

        // Counter is at threshold but the current batch shows degraded.
        let degraded = [result("a", ProbeStatus::Degraded)];
        assert!(!should_recover(&degraded, &tracker, 3, true));
    }

    #[test]
    fn disabled_recovery_never_triggers() {
        let mut tracker = FailureTracker::new();
        let down = [result("a", ProbeStatus::Down)];
        for _ in 0..5 {
            tracker.update(&down);
        }
        assert!(!should_recover(&down, &tracker, 3, false));
    }

    #[test]
    fn one_target_over_threshold_is_enough() {
        let mut tracker = FailureTracker::new();
        let batch = [
            result("a", ProbeStatus::Down),
            result("b", ProbeStatus::Up),
        ];
        for _ in 0..3 {
            tracker.update(&batch);
        }
        assert!(should_recover(&batch, &tracker, 3, true));
    }
}
