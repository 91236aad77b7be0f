//! vigil-core — domain types and configuration for Vigil.
//!
//! Shared by every other crate in the workspace:
//!
//! - **`types`** — Target, ProbeResult, StateChange, RecoveryAction,
//!   CycleRecord and friends
//! - **`config`** — vigil.toml parsing with default fallback
//! - **`error`** — configuration error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    ActionSpec, Config, MonitoringConfig, NotificationConfig, OrchestrationConfig, RecoveryConfig,
};
pub use error::ConfigError;
pub use types::{
    ActionRecord, ContentCheck, CycleRecord, PortResult, ProbeResult, ProbeStatus, RecoveryAction,
    RecoveryReport, StateChange, Target, TargetUrl, epoch_secs,
};
