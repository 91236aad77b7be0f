//! vigil.toml configuration parser.
//!
//! A missing or malformed file is never fatal: `load_or_default` falls
//! back to built-in defaults so the daemon can always start.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::ConfigError;
use crate::types::{RecoveryAction, Target};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Probe-side settings.
///
/// Every field defaults individually, so a partial `[monitoring]`
/// section fills in the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Per-probe timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Attempts per target per cycle.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Delay between attempts in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Response time above which an up target is reported slow.
    #[serde(default = "default_response_time_threshold_ms")]
    pub response_time_threshold_ms: u64,
    /// Timeout for TCP port checks in seconds.
    #[serde(default = "default_port_timeout_secs")]
    pub port_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}
fn default_retry_count() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_response_time_threshold_ms() -> u64 {
    5000
}
fn default_port_timeout_secs() -> u64 {
    5
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
            response_time_threshold_ms: default_response_time_threshold_ms(),
            port_timeout_secs: default_port_timeout_secs(),
        }
    }
}

/// Cycle-level orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Seconds between cycles in daemon mode.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Consecutive down cycles before recovery triggers.
    #[serde(default = "default_max_failures")]
    pub max_failures_before_recovery: u32,
    /// Declared minimum spacing between alerts. Tracked per target but
    /// not consulted by the notification gate; see DESIGN.md.
    #[serde(default = "default_notification_cooldown_secs")]
    pub notification_cooldown_secs: u64,
    #[serde(default = "default_true")]
    pub enable_recovery: bool,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    /// Persist each CycleRecord as a timestamped JSON file.
    #[serde(default)]
    pub save_results: bool,
    #[serde(default = "default_results_dir")]
    pub results_dir: String,
}

fn default_check_interval_secs() -> u64 {
    300
}
fn default_max_failures() -> u32 {
    3
}
fn default_notification_cooldown_secs() -> u64 {
    1800
}
fn default_true() -> bool {
    true
}
fn default_results_dir() -> String {
    "results".to_string()
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            max_failures_before_recovery: default_max_failures(),
            notification_cooldown_secs: default_notification_cooldown_secs(),
            enable_recovery: true,
            enable_notifications: true,
            save_results: false,
            results_dir: default_results_dir(),
        }
    }
}

/// Recovery execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Stabilization delay after each successful action, in seconds.
    #[serde(default = "default_recovery_delay_secs")]
    pub delay_secs: u64,
    /// Ordered action sequence, run for every down target.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    /// Instance to reboot for the `reboot_linode` action.
    #[serde(default)]
    pub linode_instance_id: Option<u64>,
}

fn default_recovery_delay_secs() -> u64 {
    30
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_recovery_delay_secs(),
            actions: Vec::new(),
            linode_instance_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotificationConfig {
    /// Webhook endpoint alerts are POSTed to. When absent, alerts are
    /// only logged.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// A recovery action as written in configuration: either a bare name
/// (`"restart_nginx"`) or a full table (`{ type = "restart_service",
/// target = "myapp" }`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ActionSpec {
    Name(String),
    Full(RecoveryAction),
}

impl ActionSpec {
    /// Resolve to a concrete action.
    ///
    /// Bare names are only valid for kinds that need no target; a bare
    /// name of a targeted kind resolves to `None`.
    pub fn normalize(&self) -> Option<RecoveryAction> {
        match self {
            ActionSpec::Full(action) => Some(action.clone()),
            ActionSpec::Name(name) => match name.as_str() {
                "restart_nginx" => Some(RecoveryAction::RestartNginx),
                "restart_apache" => Some(RecoveryAction::RestartApache),
                "reboot_server" => Some(RecoveryAction::RebootServer),
                "reboot_linode" => Some(RecoveryAction::RebootLinode),
                _ => None,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default configuration");
                Config::default()
            }
        }
    }

    /// The configured action sequence with invalid entries dropped.
    pub fn recovery_actions(&self) -> Vec<RecoveryAction> {
        self.recovery
            .actions
            .iter()
            .filter_map(|spec| {
                let action = spec.normalize();
                if action.is_none() {
                    warn!(?spec, "ignoring invalid recovery action");
                }
                action
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_values() {
        let config = Config::default();
        assert_eq!(config.orchestration.check_interval_secs, 300);
        assert_eq!(config.orchestration.max_failures_before_recovery, 3);
        assert_eq!(config.orchestration.notification_cooldown_secs, 1800);
        assert!(config.orchestration.enable_recovery);
        assert!(config.orchestration.enable_notifications);
        assert_eq!(config.monitoring.retry_count, 3);
        assert_eq!(config.recovery.delay_secs, 30);
        assert!(config.targets.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/vigil.toml"));
        assert_eq!(config.orchestration.check_interval_secs, 300);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not [valid toml").unwrap();
        let config = Config::load_or_default(file.path());
        assert_eq!(config.monitoring.timeout_secs, 10);
    }

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
[monitoring]
timeout_secs = 5
retry_count = 2
retry_delay_secs = 1
response_time_threshold_ms = 2000
port_timeout_secs = 3

[orchestration]
check_interval_secs = 60
max_failures_before_recovery = 2
notification_cooldown_secs = 600
enable_recovery = false
enable_notifications = true
save_results = true
results_dir = "out"

[recovery]
delay_secs = 0
actions = ["restart_nginx", { type = "restart_service", target = "myapp" }]

[notifications]
webhook_url = "https://hooks.example.com/alerts"

[[targets]]
url = "https://example.com"
expected_status = [200]
expected_content = "Welcome"
ports = [80, 443]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.orchestration.check_interval_secs, 60);
        assert!(!config.orchestration.enable_recovery);
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].ports, vec![80, 443]);

        let actions = config.recovery_actions();
        assert_eq!(
            actions,
            vec![
                RecoveryAction::RestartNginx,
                RecoveryAction::RestartService {
                    target: "myapp".to_string()
                },
            ]
        );
    }

    #[test]
    fn partial_sections_fill_remaining_defaults() {
        // Setting one field of a section must not reject the file (and
        // with it the target list).
        let toml_str = r#"
[monitoring]
timeout_secs = 5

[orchestration]
check_interval_secs = 60

[[targets]]
url = "https://example.com"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.monitoring.timeout_secs, 5);
        assert_eq!(config.monitoring.retry_count, 3);
        assert_eq!(config.monitoring.response_time_threshold_ms, 5000);
        assert_eq!(config.orchestration.check_interval_secs, 60);
        assert!(config.orchestration.enable_recovery);
        assert_eq!(config.orchestration.results_dir, "results");
        assert_eq!(config.recovery.delay_secs, 30);
        assert_eq!(config.targets.len(), 1);
    }

    #[test]
    fn bare_name_of_targeted_kind_is_dropped() {
        let toml_str = r#"
[recovery]
delay_secs = 0
actions = ["restart_service", "reboot_server"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        // restart_service needs a target; only reboot_server survives.
        assert_eq!(
            config.recovery_actions(),
            vec![RecoveryAction::RebootServer]
        );
    }

    #[test]
    fn unknown_bare_name_is_dropped() {
        let spec = ActionSpec::Name("do_magic".to_string());
        assert!(spec.normalize().is_none());
    }
}
