//! Cycle orchestration and the daemon loop.
//!
//! The `Orchestrator` owns all cross-cycle state (failure counters,
//! previous-results snapshot, last-notification timestamps) and runs
//! one full cycle: probe → track → detect → gate → notify/recover →
//! record. Collaborators are injected as callbacks so the engine can be
//! driven in tests without any network or shell access.
//!
//! Every stage after probing is best-effort: a failure is appended to
//! the cycle record's error list and later stages still run. Only an
//! empty target list aborts a cycle early.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{error, info, warn};

use vigil_core::{
    ActionRecord, Config, CycleRecord, PortResult, ProbeResult, ProbeStatus, RecoveryAction,
    RecoveryReport, Target, TargetUrl, epoch_secs,
};

use crate::detector::{Snapshot, detect_state_changes};
use crate::gate::{should_notify, should_recover};
use crate::records::save_cycle_record;
use crate::tracker::FailureTracker;

type BoxFuture<T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send>>;

/// Probes one target (with per-target retries) and checks its
/// configured ports.
pub type ProbeFn =
    Arc<dyn Fn(Target) -> BoxFuture<(ProbeResult, Vec<PortResult>)> + Send + Sync>;

/// Sends an alert for a batch of annotated results. Returns whether
/// the transport accepted the alert.
pub type NotifyFn = Arc<dyn Fn(Vec<ProbeResult>) -> BoxFuture<bool> + Send + Sync>;

/// Executes one recovery action for one down target.
pub type RecoverFn = Arc<dyn Fn(RecoveryAction, TargetUrl) -> BoxFuture<bool> + Send + Sync>;

/// Long-lived cross-cycle state, owned by one orchestrator instance.
#[derive(Default)]
pub struct OrchestratorState {
    pub tracker: FailureTracker,
    pub previous: Snapshot,
    /// Unix timestamp of the last successful alert per target.
    /// Tracked for the declared cooldown; not consulted by the gate.
    pub last_notified: HashMap<TargetUrl, u64>,
}

/// Runs monitoring cycles and the daemon loop.
pub struct Orchestrator {
    config: Config,
    state: OrchestratorState,
    probe_fn: ProbeFn,
    notify_fn: Option<NotifyFn>,
    recover_fn: Option<RecoverFn>,
    enable_notifications: bool,
    enable_recovery: bool,
}

impl Orchestrator {
    pub fn new(config: Config, probe_fn: ProbeFn) -> Self {
        let enable_notifications = config.orchestration.enable_notifications;
        let enable_recovery = config.orchestration.enable_recovery;
        Self {
            config,
            state: OrchestratorState::default(),
            probe_fn,
            notify_fn: None,
            recover_fn: None,
            enable_notifications,
            enable_recovery,
        }
    }

    /// Set the alert transport.
    pub fn with_notifier(mut self, notify_fn: NotifyFn) -> Self {
        self.notify_fn = Some(notify_fn);
        self
    }

    /// Set the recovery action executor.
    pub fn with_executor(mut self, recover_fn: RecoverFn) -> Self {
        self.recover_fn = Some(recover_fn);
        self
    }

    /// Force-disable notifications (CLI `--no-notifications`, `--dry-run`).
    pub fn disable_notifications(&mut self) {
        self.enable_notifications = false;
        info!("notifications disabled");
    }

    /// Force-disable recovery (CLI `--no-recovery`, `--dry-run`).
    pub fn disable_recovery(&mut self) {
        self.enable_recovery = false;
        info!("recovery disabled");
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Run one full monitoring cycle.
    pub async fn run_cycle(&mut self) -> CycleRecord {
        let started = Instant::now();
        let mut record = CycleRecord::new();
        info!("starting monitoring cycle");

        // ── Probe ──────────────────────────────────────────────────
        let targets = self.config.targets.clone();
        if targets.is_empty() {
            let msg = "no targets configured for monitoring".to_string();
            error!("{msg}");
            record.errors.push(msg);
            record.duration_ms = started.elapsed().as_millis() as u64;
            return record;
        }

        info!(count = targets.len(), "probing targets");
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            let (result, ports) = (self.probe_fn)(target).await;
            results.push(result);
            record.port_results.extend(ports);
        }

        // ── Track ──────────────────────────────────────────────────
        self.state.tracker.update(&results);

        // ── Detect ─────────────────────────────────────────────────
        let (changes, snapshot) = detect_state_changes(&mut results, &self.state.previous);
        self.state.previous = snapshot;
        record.state_changes = changes;

        let mut status_counts: HashMap<String, usize> = HashMap::new();
        for result in &results {
            *status_counts.entry(result.status.to_string()).or_insert(0) += 1;
        }
        info!(?status_counts, "cycle results");

        // ── Notify ─────────────────────────────────────────────────
        if should_notify(&results, self.enable_notifications) {
            match &self.notify_fn {
                Some(notify_fn) => {
                    let sent = notify_fn(results.clone()).await;
                    record.notifications_sent = sent;
                    if sent {
                        info!("notification sent");
                        let now = epoch_secs();
                        for result in &results {
                            self.state.last_notified.insert(result.url.clone(), now);
                        }
                    } else {
                        let msg = "failed to send notification".to_string();
                        error!("{msg}");
                        record.errors.push(msg);
                    }
                }
                None => warn!("alert warranted but no notifier configured"),
            }
        }

        // ── Recover ────────────────────────────────────────────────
        let threshold = self.config.orchestration.max_failures_before_recovery;
        if should_recover(&results, &self.state.tracker, threshold, self.enable_recovery) {
            match &self.recover_fn {
                Some(recover_fn) => {
                    let recover_fn = recover_fn.clone();
                    record.recovery_attempted = true;
                    let report = self.run_recovery(&results, recover_fn).await;
                    info!(
                        successful = report.successful_actions,
                        failed = report.failed_actions,
                        "recovery completed"
                    );
                    record.recovery_results = Some(report);
                }
                None => {
                    let msg = "recovery warranted but no executor configured".to_string();
                    warn!("{msg}");
                    record.errors.push(msg);
                }
            }
        }

        record.monitoring_results = results;
        record.duration_ms = started.elapsed().as_millis() as u64;
        info!(duration_ms = record.duration_ms, "monitoring cycle completed");
        record
    }

    /// Run the configured action sequence for every down target.
    ///
    /// Best-effort and exhaustive: a failed action never stops the
    /// sequence. A stabilization delay follows each successful action.
    async fn run_recovery(
        &self,
        results: &[ProbeResult],
        recover_fn: RecoverFn,
    ) -> RecoveryReport {
        let mut report = RecoveryReport::new(true);
        let actions = self.config.recovery_actions();
        let delay = Duration::from_secs(self.config.recovery.delay_secs);

        let down: Vec<&ProbeResult> = results
            .iter()
            .filter(|r| r.status == ProbeStatus::Down)
            .collect();
        info!(count = down.len(), "initiating recovery for down targets");

        for site in down {
            for action in &actions {
                let success = recover_fn(action.clone(), site.url.clone()).await;
                if success {
                    info!(action = action.kind(), url = %site.url, "recovery action succeeded");
                } else {
                    error!(action = action.kind(), url = %site.url, "recovery action failed");
                }
                report.record(ActionRecord {
                    action_type: action.kind().to_string(),
                    target: action.target().map(str::to_string),
                    url: site.url.clone(),
                    timestamp: epoch_secs(),
                    success,
                    error: None,
                });
                if success && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        report
    }

    /// One cycle plus optional persistence (CLI `--single`, daemon tick).
    pub async fn run_single_cycle(&mut self) -> CycleRecord {
        let record = self.run_cycle().await;

        if self.config.orchestration.save_results {
            let dir = std::path::PathBuf::from(&self.config.orchestration.results_dir);
            if let Err(e) = save_cycle_record(&record, &dir) {
                error!(error = %e, "failed to persist cycle record");
            }
        }

        record
    }

    /// Run cycles on a fixed interval until shutdown.
    ///
    /// The first cycle runs immediately. Shutdown is cooperative: an
    /// in-flight cycle always completes and the signal is only observed
    /// at tick boundaries.
    pub async fn run_daemon(&mut self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "monitoring daemon started");

        self.run_single_cycle().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.run_single_cycle().await;
                }
                _ = shutdown.changed() => {
                    info!("monitoring daemon shutting down");
                    break;
                }
            }
        }
    }
}
