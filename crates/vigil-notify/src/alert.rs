//! Alert composition.
//!
//! Builds a subject line and plain-text body from a cycle's annotated
//! results. The exact transport format is the notifier's concern; this
//! module only decides severity and wording.

use serde::{Deserialize, Serialize};

use vigil_core::{ProbeResult, ProbeStatus};

/// Severity of an alert, highest condition wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    /// At least one target is down.
    Critical,
    /// Something is slow or degraded.
    Warning,
    /// Targets recovered and nothing is wrong.
    Recovery,
    Info,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertLevel::Critical => "CRITICAL",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Recovery => "RECOVERY",
            AlertLevel::Info => "INFO",
        };
        f.write_str(s)
    }
}

/// A composed alert, ready for any transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub subject: String,
    pub body: String,
}

/// Pick the severity for a batch of results.
pub fn alert_level(results: &[ProbeResult]) -> AlertLevel {
    if results.iter().any(|r| r.status == ProbeStatus::Down) {
        AlertLevel::Critical
    } else if results
        .iter()
        .any(|r| matches!(r.status, ProbeStatus::Slow | ProbeStatus::Degraded))
    {
        AlertLevel::Warning
    } else if results.iter().any(|r| r.is_recovery()) {
        AlertLevel::Recovery
    } else {
        AlertLevel::Info
    }
}

/// Compose subject and body for a batch of results.
pub fn compose_alert(results: &[ProbeResult]) -> Alert {
    let level = alert_level(results);
    let subject = format!("{level} - Website Monitoring Alert");

    let mut body = String::new();

    let down: Vec<&ProbeResult> = results
        .iter()
        .filter(|r| r.status == ProbeStatus::Down)
        .collect();
    if !down.is_empty() {
        body.push_str("DOWN:\n");
        for r in &down {
            let error = r.error.as_deref().unwrap_or("no error detail");
            body.push_str(&format!("  - {} ({error})\n", r.url));
        }
        body.push('\n');
    }

    let degraded: Vec<&ProbeResult> = results
        .iter()
        .filter(|r| matches!(r.status, ProbeStatus::Slow | ProbeStatus::Degraded))
        .collect();
    if !degraded.is_empty() {
        body.push_str("DEGRADED:\n");
        for r in &degraded {
            let time = r
                .response_time_ms
                .map(|ms| format!("{ms}ms"))
                .unwrap_or_else(|| "n/a".to_string());
            body.push_str(&format!("  - {} [{}] response time {time}\n", r.url, r.status));
        }
        body.push('\n');
    }

    let recovered: Vec<&ProbeResult> = results.iter().filter(|r| r.is_recovery()).collect();
    if !recovered.is_empty() {
        body.push_str("RECOVERED:\n");
        for r in &recovered {
            body.push_str(&format!("  - {}\n", r.url));
        }
        body.push('\n');
    }

    let up_count = results
        .iter()
        .filter(|r| r.status == ProbeStatus::Up)
        .count();
    body.push_str(&format!(
        "Summary: {up_count} up, {} down, {} degraded of {} targets\n",
        down.len(),
        degraded.len(),
        results.len()
    ));

    Alert {
        level,
        subject,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, status: ProbeStatus) -> ProbeResult {
        let mut r = ProbeResult::new(url);
        r.status = status;
        r
    }

    #[test]
    fn down_site_is_critical() {
        let results = [
            result("https://a", ProbeStatus::Down),
            result("https://b", ProbeStatus::Slow),
        ];
        assert_eq!(alert_level(&results), AlertLevel::Critical);
    }

    #[test]
    fn degraded_without_down_is_warning() {
        let results = [result("https://a", ProbeStatus::Degraded)];
        assert_eq!(alert_level(&results), AlertLevel::Warning);
    }

    #[test]
    fn recovery_without_problems_is_recovery() {
        let mut r = result("https://a", ProbeStatus::Up);
        r.previous_status = Some(ProbeStatus::Down);
        assert_eq!(alert_level(&[r]), AlertLevel::Recovery);
    }

    #[test]
    fn all_quiet_is_info() {
        let results = [result("https://a", ProbeStatus::Up)];
        assert_eq!(alert_level(&results), AlertLevel::Info);
    }

    #[test]
    fn body_lists_down_sites_with_errors() {
        let mut r = result("https://a", ProbeStatus::Down);
        r.error = Some("request timeout after 10s".to_string());

        let alert = compose_alert(&[r]);
        assert!(alert.subject.starts_with("CRITICAL"));
        assert!(alert.body.contains("DOWN:"));
        assert!(alert.body.contains("https://a"));
        assert!(alert.body.contains("request timeout"));
    }

    #[test]
    fn body_includes_summary_counts() {
        let results = [
            result("https://a", ProbeStatus::Up),
            result("https://b", ProbeStatus::Down),
            result("https://c", ProbeStatus::Slow),
        ];
        let alert = compose_alert(&results);
        assert!(alert.body.contains("1 up, 1 down, 1 degraded of 3 targets"));
    }
}
