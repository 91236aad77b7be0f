//! HTTP health probing.
//!
//! Every network failure is represented as a `ProbeResult` with
//! `status = down` and an error string — probing never returns an
//! `Err` to the orchestrator.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use vigil_core::{ContentCheck, MonitoringConfig, PortResult, ProbeResult, ProbeStatus, Target};

use crate::ports::check_port;

/// Probes targets over HTTP(S) and TCP.
pub struct Prober {
    client: reqwest::Client,
    config: MonitoringConfig,
}

impl Prober {
    pub fn new(config: MonitoringConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("vigil-monitor/0.1")
            .build()?;
        Ok(Self { client, config })
    }

    /// One probe attempt against a target's URL.
    ///
    /// Status decision, in order: unexpected status code → down;
    /// expected-content mismatch → degraded; response time above the
    /// configured threshold → slow; otherwise up.
    pub async fn check_url(&self, target: &Target) -> ProbeResult {
        let mut result = ProbeResult::new(&target.url);
        let started = Instant::now();

        let response = match self.client.get(&target.url).send().await {
            Ok(response) => response,
            Err(e) => {
                classify_request_error(&mut result, &e, self.config.timeout_secs);
                return result;
            }
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        result.response_time_ms = Some(elapsed_ms);
        let code = response.status().as_u16();
        result.status_code = Some(code);
        if target.url.starts_with("https://") {
            // The client verified the certificate during the handshake.
            result.ssl_valid = Some(true);
        }

        if target.expected_status.contains(&code) {
            result.status = ProbeStatus::Up;
            info!(url = %target.url, code, elapsed_ms, "target is up");
        } else {
            result.status = ProbeStatus::Down;
            result.error = Some(format!("unexpected status code: {code}"));
            warn!(url = %target.url, code, "unexpected status code");
        }

        if result.status == ProbeStatus::Up
            && let Some(expected) = &target.expected_content
        {
            match response.text().await {
                Ok(body) if body.contains(expected) => {
                    result.content_check = Some(ContentCheck::Pass);
                }
                Ok(_) => {
                    result.content_check = Some(ContentCheck::Fail);
                    result.status = ProbeStatus::Degraded;
                    result.error = Some("expected content not found".to_string());
                    warn!(url = %target.url, "content check failed");
                }
                Err(e) => {
                    result.content_check = Some(ContentCheck::Fail);
                    result.status = ProbeStatus::Down;
                    result.error = Some(format!("failed to read response body: {e}"));
                }
            }
        }

        if result.status == ProbeStatus::Up && elapsed_ms > self.config.response_time_threshold_ms
        {
            warn!(
                url = %target.url,
                elapsed_ms,
                threshold_ms = self.config.response_time_threshold_ms,
                "response time exceeds threshold"
            );
            result.status = ProbeStatus::Slow;
        }

        result
    }

    /// Probe with the configured bounded retry loop.
    ///
    /// Retries stop as soon as an attempt reports up or slow; a delay
    /// separates attempts.
    pub async fn probe_target(&self, target: &Target) -> ProbeResult {
        let attempts = self.config.retry_count.max(1);
        let delay = Duration::from_secs(self.config.retry_delay_secs);

        let mut attempt = 1;
        loop {
            let result = self.check_url(target).await;
            if matches!(result.status, ProbeStatus::Up | ProbeStatus::Slow) || attempt >= attempts
            {
                return result;
            }
            info!(
                url = %target.url,
                attempt,
                attempts,
                "probe attempt failed, retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    /// Check the target's configured TCP ports.
    pub async fn check_ports(&self, target: &Target) -> Vec<PortResult> {
        if target.ports.is_empty() {
            return Vec::new();
        }

        let host = match reqwest::Url::parse(&target.url) {
            Ok(url) => match url.host_str() {
                Some(host) => host.to_string(),
                None => {
                    warn!(url = %target.url, "no host in target url, skipping port checks");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!(url = %target.url, error = %e, "unparsable target url, skipping port checks");
                return Vec::new();
            }
        };

        let timeout = Duration::from_secs(self.config.port_timeout_secs);
        let mut results = Vec::with_capacity(target.ports.len());
        for &port in &target.ports {
            results.push(check_port(&host, port, timeout).await);
        }
        results
    }

    /// Full probe of one target: retried URL check plus port checks.
    pub async fn probe(&self, target: &Target) -> (ProbeResult, Vec<PortResult>) {
        let result = self.probe_target(target).await;
        let ports = self.check_ports(target).await;
        (result, ports)
    }
}

/// Map a transport error onto the result, never surfacing an `Err`.
fn classify_request_error(result: &mut ProbeResult, e: &reqwest::Error, timeout_secs: u64) {
    result.status = ProbeStatus::Down;

    if e.is_timeout() {
        result.error = Some(format!("request timeout after {timeout_secs}s"));
        result.response_time_ms = Some(timeout_secs * 1000);
        warn!(url = %result.url, timeout_secs, "probe timed out");
        return;
    }

    let chain = error_chain(e);
    let lowered = chain.to_lowercase();
    if lowered.contains("certificate") || lowered.contains("tls") || lowered.contains("ssl") {
        result.ssl_valid = Some(false);
        result.error = Some(format!("ssl error: {chain}"));
        warn!(url = %result.url, error = %chain, "ssl error");
    } else if e.is_connect() {
        result.error = Some(format!("connection error: {chain}"));
        warn!(url = %result.url, error = %chain, "connection failed");
    } else {
        result.error = Some(format!("request error: {chain}"));
        warn!(url = %result.url, error = %chain, "probe failed");
    }
}

/// Flatten an error and its sources into one string.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut parts = vec![e.to_string()];
    let mut source = e.source();
    while let Some(s) = source {
        parts.push(s.to_string());
        source = s.source();
    }
    parts.join(": ")
}
