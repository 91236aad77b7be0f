//! Domain types for the Vigil monitoring engine.
//!
//! These types flow through every stage of a monitoring cycle: probe
//! results, state-change records, recovery actions and the per-cycle
//! record that is optionally persisted. All types are serializable
//! to/from JSON.

use serde::{Deserialize, Serialize};

/// Unique identifier for a monitored target (its URL).
pub type TargetUrl = String;

// ── Target ─────────────────────────────────────────────────────────

/// A monitored endpoint plus its success criteria.
///
/// Loaded from configuration once per cycle; never mutated by the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Target {
    pub url: TargetUrl,
    /// HTTP status codes accepted as healthy.
    #[serde(default = "default_expected_status")]
    pub expected_status: Vec<u16>,
    /// Substring that must appear in the response body.
    #[serde(default)]
    pub expected_content: Option<String>,
    /// Additional TCP ports to check on the target's host.
    #[serde(default)]
    pub ports: Vec<u16>,
}

fn default_expected_status() -> Vec<u16> {
    vec![200, 301, 302]
}

impl Target {
    /// Target with default success criteria (2xx/redirect accepted).
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            expected_status: default_expected_status(),
            expected_content: None,
            ports: Vec::new(),
        }
    }
}

// ── Probe results ──────────────────────────────────────────────────

/// Health status of a target as determined by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Up,
    Down,
    /// Reachable but response time exceeded the configured threshold.
    Slow,
    /// Reachable but the expected content was missing.
    Degraded,
    Unknown,
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProbeStatus::Up => "up",
            ProbeStatus::Down => "down",
            ProbeStatus::Slow => "slow",
            ProbeStatus::Degraded => "degraded",
            ProbeStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Outcome of the expected-content check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCheck {
    Pass,
    Fail,
}

/// Result of one probe of one target.
///
/// Created fresh each cycle. The only field written after creation is
/// `previous_status`, annotated by the state-change detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProbeResult {
    pub url: TargetUrl,
    /// Unix timestamp (seconds) when the probe ran.
    pub timestamp: u64,
    pub status: ProbeStatus,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    /// TLS handshake outcome; `None` for plain-HTTP targets.
    pub ssl_valid: Option<bool>,
    pub content_check: Option<ContentCheck>,
    /// Status in the immediately preceding cycle; absent for targets
    /// unseen before.
    #[serde(default)]
    pub previous_status: Option<ProbeStatus>,
}

impl ProbeResult {
    /// A fresh result in the `Unknown` state, timestamped now.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timestamp: epoch_secs(),
            status: ProbeStatus::Unknown,
            response_time_ms: None,
            status_code: None,
            error: None,
            ssl_valid: None,
            content_check: None,
            previous_status: None,
        }
    }

    /// Whether the target recovered this cycle (up now, not up before).
    pub fn is_recovery(&self) -> bool {
        self.status == ProbeStatus::Up
            && matches!(
                self.previous_status,
                Some(ProbeStatus::Down) | Some(ProbeStatus::Slow) | Some(ProbeStatus::Degraded)
            )
    }
}

/// Result of a single TCP port check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortResult {
    pub host: String,
    pub port: u16,
    /// Unix timestamp (seconds) when the check ran.
    pub timestamp: u64,
    pub open: bool,
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
}

// ── State changes ──────────────────────────────────────────────────

/// A target's status differing between consecutive cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateChange {
    pub url: TargetUrl,
    pub previous_status: ProbeStatus,
    pub current_status: ProbeStatus,
    pub timestamp: u64,
}

// ── Recovery ───────────────────────────────────────────────────────

/// A configured remediation step.
///
/// Declared in configuration as either a bare action name or a table
/// with a target; normalized into this enum at config-load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoveryAction {
    RestartService { target: String },
    RestartContainer { target: String },
    RestartProcess { target: String },
    RestartNginx,
    RestartApache,
    RebootServer,
    RebootLinode,
    CustomScript { command: String },
}

impl RecoveryAction {
    /// Action name as it appears in configuration and audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            RecoveryAction::RestartService { .. } => "restart_service",
            RecoveryAction::RestartContainer { .. } => "restart_container",
            RecoveryAction::RestartProcess { .. } => "restart_process",
            RecoveryAction::RestartNginx => "restart_nginx",
            RecoveryAction::RestartApache => "restart_apache",
            RecoveryAction::RebootServer => "reboot_server",
            RecoveryAction::RebootLinode => "reboot_linode",
            RecoveryAction::CustomScript { .. } => "custom_script",
        }
    }

    /// The action's target, for kinds that act on a named object.
    pub fn target(&self) -> Option<&str> {
        match self {
            RecoveryAction::RestartService { target }
            | RecoveryAction::RestartContainer { target }
            | RecoveryAction::RestartProcess { target } => Some(target),
            RecoveryAction::CustomScript { command } => Some(command),
            _ => None,
        }
    }
}

/// Audit record for one executed recovery action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRecord {
    pub action_type: String,
    pub target: Option<String>,
    /// URL of the down target this action was run for.
    pub url: TargetUrl,
    pub timestamp: u64,
    pub success: bool,
    pub error: Option<String>,
}

/// Summary of one cycle's recovery pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecoveryReport {
    pub enabled: bool,
    pub timestamp: u64,
    pub actions_performed: Vec<ActionRecord>,
    pub successful_actions: u32,
    pub failed_actions: u32,
}

impl RecoveryReport {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timestamp: epoch_secs(),
            actions_performed: Vec::new(),
            successful_actions: 0,
            failed_actions: 0,
        }
    }

    /// Append an action outcome, updating the success/failure tallies.
    pub fn record(&mut self, record: ActionRecord) {
        if record.success {
            self.successful_actions += 1;
        } else {
            self.failed_actions += 1;
        }
        self.actions_performed.push(record);
    }
}

// ── Cycle record ───────────────────────────────────────────────────

/// Everything that happened in one monitoring cycle.
///
/// Immutable after assembly; optionally persisted as one JSON object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub timestamp: u64,
    pub monitoring_results: Vec<ProbeResult>,
    pub port_results: Vec<PortResult>,
    pub state_changes: Vec<StateChange>,
    pub notifications_sent: bool,
    pub recovery_attempted: bool,
    pub recovery_results: Option<RecoveryReport>,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl CycleRecord {
    /// An empty record timestamped now.
    pub fn new() -> Self {
        Self {
            timestamp: epoch_secs(),
            monitoring_results: Vec::new(),
            port_results: Vec::new(),
            state_changes: Vec::new(),
            notifications_sent: false,
            recovery_attempted: false,
            recovery_results: None,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }
}

impl Default for CycleRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Current unix time in whole seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
