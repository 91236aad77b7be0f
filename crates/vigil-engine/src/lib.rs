//! vigil-engine — the stateful orchestration core of Vigil.
//!
//! Turns a batch of per-target probe results into failure counters,
//! state-change records, notification decisions and recovery decisions,
//! cycle after cycle, tolerating partial failures in any stage.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator (owns OrchestratorState)
//!   ├── ProbeFn        → ProbeResult per target (injected)
//!   ├── FailureTracker → consecutive-down counters
//!   ├── detector       → StateChange records + snapshot rewrite
//!   ├── gate           → should_notify / should_recover
//!   ├── NotifyFn       → alert transport (injected)
//!   ├── RecoverFn      → action executor (injected)
//!   └── records        → CycleRecord persistence
//! ```
//!
//! Collaborators are callback seams so tests drive full cycles with
//! closures and no network or shell access.

pub mod detector;
pub mod gate;
pub mod orchestrator;
pub mod records;
pub mod tracker;

pub use detector::{Snapshot, detect_state_changes};
pub use gate::{should_notify, should_recover};
pub use orchestrator::{NotifyFn, Orchestrator, OrchestratorState, ProbeFn, RecoverFn};
pub use records::{save_cycle_record, save_cycle_record_to};
pub use tracker::FailureTracker;
