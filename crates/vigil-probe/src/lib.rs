//! vigil-probe — HTTP and TCP probing for Vigil.
//!
//! Implements the prober collaborator: per-target HTTP health checks
//! with bounded retries (status-code acceptance, content checks,
//! response-time thresholds, TLS validity) and TCP port checks. All
//! probe failures are values in the returned results; nothing here
//! raises an error into the orchestrator.

pub mod checker;
pub mod ports;

pub use checker::Prober;
pub use ports::check_port;
