//! vigil-recover — remediation execution for Vigil.
//!
//! Implements the recovery-executor collaborator: systemd, docker and
//! process restarts, web-server restart fallback chains, host reboot
//! scheduling, provider-API instance reboot and custom scripts. Every
//! action resolves to a bool; nothing here raises into the engine.

pub mod actions;
pub mod exec;

pub use actions::RecoveryExecutor;
pub use exec::{CommandOutput, run_command};
