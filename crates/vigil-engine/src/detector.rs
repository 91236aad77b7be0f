//! State-change detection between consecutive cycles.
//!
//! Compares the current batch against the previous cycle's snapshot,
//! annotates each result with its prior status, and rebuilds the
//! snapshot from the current batch. The old snapshot is read in full
//! before the new one is built, so every comparison sees the previous
//! cycle's state and never a partially updated one.

use std::collections::HashMap;

use tracing::info;

use vigil_core::{ProbeResult, StateChange, TargetUrl, epoch_secs};

/// Snapshot of the previous cycle's results, keyed by target URL.
pub type Snapshot = HashMap<TargetUrl, ProbeResult>;

/// Compare `results` against `snapshot`, annotate `previous_status`,
/// and return the detected changes plus the replacement snapshot.
///
/// Targets absent from the current batch are dropped from the new
/// snapshot; targets unseen before get no `previous_status`.
pub fn detect_state_changes(
    results: &mut [ProbeResult],
    snapshot: &Snapshot,
) -> (Vec<StateChange>, Snapshot) {
    let mut changes = Vec::new();

    for result in results.iter_mut() {
        if let Some(previous) = snapshot.get(&result.url) {
            if previous.status != result.status {
                info!(
                    url = %result.url,
                    previous = %previous.status,
                    current = %result.status,
                    "state change detected"
                );
                changes.push(StateChange {
                    url: result.url.clone(),
                    previous_status: previous.status,
                    current_status: result.status,
                    timestamp: epoch_secs(),
                });
            }
            result.previous_status = Some(previous.status);
        }
    }

    let new_snapshot = results
        .iter()
        .map(|r| (r.url.clone(), r.clone()))
        .collect();

    (changes, new_snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::ProbeStatus;

    fn result(url: &str, status: ProbeStatus) -> ProbeResult {
        let mut r = ProbeResult::new(url);
        r.status = status;
        r
    }

    fn snapshot_of(results: &[ProbeResult]) -> Snapshot {
        results.iter().map(|r| (r.url.clone(), r.clone())).collect()
    }

    #[test]
    fn first_cycle_has_no_changes_and_no_previous_status() {
        let mut results = vec![result("a", ProbeStatus::Down)];
        let (changes, snapshot) = detect_state_changes(&mut results, &Snapshot::new());

        assert!(changes.is_empty());
        assert!(results[0].previous_status.is_none());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn stable_status_emits_no_change_but_annotates() {
        let previous = snapshot_of(&[result("a", ProbeStatus::Up)]);
        let mut results = vec![result("a", ProbeStatus::Up)];

        let (changes, _) = detect_state_changes(&mut results, &previous);

        assert!(changes.is_empty());
        assert_eq!(results[0].previous_status, Some(ProbeStatus::Up));
    }

    #[test]
    fn differing_status_emits_change() {
        let previous = snapshot_of(&[result("a", ProbeStatus::Down)]);
        let mut results = vec![result("a", ProbeStatus::Up)];

        let (changes, _) = detect_state_changes(&mut results, &previous);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].url, "a");
        assert_eq!(changes[0].previous_status, ProbeStatus::Down);
        assert_eq!(changes[0].current_status, ProbeStatus::Up);
        assert_eq!(results[0].previous_status, Some(ProbeStatus::Down));
    }

    #[test]
    fn stability_is_idempotent_across_cycles() {
        // Identical status for N cycles → zero changes after cycle 1.
        let mut snapshot = Snapshot::new();
        for cycle in 0..5 {
            let mut results = vec![result("a", ProbeStatus::Up)];
            let (changes, new_snapshot) = detect_state_changes(&mut results, &snapshot);
            if cycle > 0 {
                assert!(changes.is_empty(), "cycle {cycle} produced changes");
            }
            snapshot = new_snapshot;
        }
    }

    #[test]
    fn previous_status_is_immediately_preceding_not_older() {
        let mut snapshot = Snapshot::new();

        // Cycle 1: down.
        let mut results = vec![result("a", ProbeStatus::Down)];
        (_, snapshot) = detect_state_changes(&mut results, &snapshot);

        // Cycle 2: slow.
        let mut results = vec![result("a", ProbeStatus::Slow)];
        (_, snapshot) = detect_state_changes(&mut results, &snapshot);

        // Cycle 3: up — previous must be slow, not down.
        let mut results = vec![result("a", ProbeStatus::Up)];
        let (changes, _) = detect_state_changes(&mut results, &snapshot);
        assert_eq!(results[0].previous_status, Some(ProbeStatus::Slow));
        assert_eq!(changes[0].previous_status, ProbeStatus::Slow);
    }

    #[test]
    fn removed_targets_are_dropped_from_snapshot() {
        let previous = snapshot_of(&[
            result("a", ProbeStatus::Up),
            result("b", ProbeStatus::Down),
        ]);
        let mut results = vec![result("a", ProbeStatus::Up)];

        let (_, snapshot) = detect_state_changes(&mut results, &previous);

        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("a"));
        assert!(!snapshot.contains_key("b"));
    }

    #[test]
    fn multiple_targets_compared_against_old_snapshot_only() {
        // Both targets flip; each comparison must use the old snapshot.
        let previous = snapshot_of(&[
            result("a", ProbeStatus::Up),
            result("b", ProbeStatus::Down),
        ]);
        let mut results = vec![
            result("a", ProbeStatus::Down),
            result("b", ProbeStatus::Up),
        ];

        let (changes, _) = detect_state_changes(&mut results, &previous);

        assert_eq!(changes.len(), 2);
        assert_eq!(results[0].previous_status, Some(ProbeStatus::Up));
        assert_eq!(results[1].previous_status, Some(ProbeStatus::Down));
    }
}
