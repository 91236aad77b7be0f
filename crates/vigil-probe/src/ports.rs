//! TCP port checks.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use vigil_core::{PortResult, epoch_secs};

/// Check whether `host:port` accepts a TCP connection within `timeout`.
///
/// Failures (refused, unreachable, DNS, timeout) are reported in the
/// result, never as an `Err`.
pub async fn check_port(host: &str, port: u16, timeout: Duration) -> PortResult {
    let mut result = PortResult {
        host: host.to_string(),
        port,
        timestamp: epoch_secs(),
        open: false,
        response_time_ms: None,
        error: None,
    };

    let addr = format!("{host}:{port}");
    let started = Instant::now();

    match tokio::time::timeout(timeout, tokio::net::TcpStream::connect(&addr)).await {
        Ok(Ok(_stream)) => {
            result.open = true;
            result.response_time_ms = Some(started.elapsed().as_millis() as u64);
            info!(host, port, "port is open");
        }
        Ok(Err(e)) => {
            result.response_time_ms = Some(started.elapsed().as_millis() as u64);
            result.error = Some(format!("connection failed: {e}"));
            warn!(host, port, error = %e, "port is closed");
        }
        Err(_) => {
            result.error = Some(format!("connection timed out after {}s", timeout.as_secs()));
            warn!(host, port, "port check timed out");
        }
    }

    result
}
