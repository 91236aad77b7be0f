//! Webhook alert delivery.
//!
//! POSTs the composed alert plus the raw results as JSON. A delivery
//! failure is logged and reported as `false`, never retried within the
//! cycle and never raised.

use std::time::Duration;

use tracing::{error, info};

use vigil_core::ProbeResult;

use crate::alert::compose_alert;

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("vigil-notify/0.1")
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Send an alert for the batch. True when the endpoint accepted it.
    pub async fn send_alert(&self, results: &[ProbeResult]) -> bool {
        let alert = compose_alert(results);
        let payload = serde_json::json!({
            "level": alert.level,
            "subject": alert.subject,
            "body": alert.body,
            "results": results,
        });

        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(url = %self.url, level = %alert.level, "alert delivered");
                true
            }
            Ok(response) => {
                error!(
                    url = %self.url,
                    status = %response.status(),
                    "webhook rejected alert"
                );
                false
            }
            Err(e) => {
                error!(url = %self.url, error = %e, "failed to deliver alert");
                false
            }
        }
    }
}

/// Log-only notifier used when no webhook is configured.
///
/// Always reports success: the alert reached its (local) transport.
pub async fn log_alert(results: &[ProbeResult]) -> bool {
    let alert = compose_alert(results);
    info!(level = %alert.level, subject = %alert.subject, "\n{}", alert.body);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use vigil_core::ProbeStatus;

    fn down_result() -> ProbeResult {
        let mut r = ProbeResult::new("https://a");
        r.status = ProbeStatus::Down;
        r
    }

    async fn spawn_endpoint(status_line: &'static str) -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        port
    }

    #[tokio::test]
    async fn accepted_delivery_returns_true() {
        let port = spawn_endpoint("200 OK").await;
        let notifier = WebhookNotifier::new(&format!("http://127.0.0.1:{port}/alerts")).unwrap();

        assert!(notifier.send_alert(&[down_result()]).await);
    }

    #[tokio::test]
    async fn rejected_delivery_returns_false() {
        let port = spawn_endpoint("500 Internal Server Error").await;
        let notifier = WebhookNotifier::new(&format!("http://127.0.0.1:{port}/alerts")).unwrap();

        assert!(!notifier.send_alert(&[down_result()]).await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_returns_false() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:1/alerts").unwrap();
        assert!(!notifier.send_alert(&[down_result()]).await);
    }

    #[tokio::test]
    async fn log_notifier_always_accepts() {
        assert!(log_alert(&[down_result()]).await);
    }
}
