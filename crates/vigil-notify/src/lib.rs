//! vigil-notify — alert composition and delivery for Vigil.
//!
//! - **`alert`** — severity selection and subject/body composition
//! - **`webhook`** — JSON webhook delivery plus a log-only fallback

pub mod alert;
pub mod webhook;

pub use alert::{Alert, AlertLevel, alert_level, compose_alert};
pub use webhook::{WebhookNotifier, log_alert};
