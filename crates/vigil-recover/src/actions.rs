//! Recovery action execution.
//!
//! Dispatches `RecoveryAction` kinds to shell commands or the cloud
//! provider API. Every action resolves to a plain bool: remediation is
//! best-effort and an action failure must never abort the cycle.

use std::time::Duration;

use tracing::{error, info, warn};

use vigil_core::{RecoveryAction, RecoveryConfig};

use crate::exec::run_command;

/// Per-command timeout.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
/// Pause between stopping and starting a unit.
const STOP_START_PAUSE: Duration = Duration::from_secs(2);
/// Settle time before verifying a restarted unit.
const VERIFY_PAUSE: Duration = Duration::from_secs(5);

/// Executes recovery actions against the local host or provider API.
pub struct RecoveryExecutor {
    linode_token: Option<String>,
    linode_instance_id: Option<u64>,
    client: reqwest::Client,
}

impl RecoveryExecutor {
    pub fn new(config: &RecoveryConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("vigil-recover/0.1")
            .build()?;
        Ok(Self {
            linode_token: std::env::var("LINODE_API_TOKEN").ok(),
            linode_instance_id: config.linode_instance_id,
            client,
        })
    }

    /// Override provider credentials (tests, non-env deployments).
    pub fn with_linode(mut self, token: Option<String>, instance_id: Option<u64>) -> Self {
        self.linode_token = token;
        self.linode_instance_id = instance_id;
        self
    }

    /// Execute one action. True on success; failures are logged.
    pub async fn perform(&self, action: &RecoveryAction) -> bool {
        info!(action = action.kind(), target = ?action.target(), "performing recovery action");
        match action {
            RecoveryAction::RestartService { target } => self.restart_service(target).await,
            RecoveryAction::RestartContainer { target } => self.restart_container(target).await,
            RecoveryAction::RestartProcess { target } => self.restart_process(target).await,
            RecoveryAction::RestartNginx => self.restart_nginx().await,
            RecoveryAction::RestartApache => self.restart_apache().await,
            RecoveryAction::RebootServer => self.reboot_server().await,
            RecoveryAction::RebootLinode => self.reboot_linode().await,
            RecoveryAction::CustomScript { command } => {
                run_command(command, COMMAND_TIMEOUT).await.success
            }
        }
    }

    /// Stop, start and verify a systemd unit.
    async fn restart_service(&self, name: &str) -> bool {
        let stop = run_command(&format!("sudo systemctl stop {name}"), COMMAND_TIMEOUT).await;
        if !stop.success {
            warn!(service = name, "failed to stop service, continuing anyway");
        }
        tokio::time::sleep(STOP_START_PAUSE).await;

        let start = run_command(&format!("sudo systemctl start {name}"), COMMAND_TIMEOUT).await;
        if !start.success {
            error!(service = name, "failed to start service");
            return false;
        }

        tokio::time::sleep(VERIFY_PAUSE).await;
        let active = run_command(&format!("systemctl is-active {name}"), COMMAND_TIMEOUT).await;
        if active.success && active.stdout.contains("active") {
            info!(service = name, "service restarted");
            true
        } else {
            error!(service = name, state = %active.stdout, "service not active after restart");
            false
        }
    }

    /// Stop, start and verify a docker container.
    async fn restart_container(&self, name: &str) -> bool {
        let stop = run_command(&format!("docker stop --time 30 {name}"), COMMAND_TIMEOUT).await;
        if !stop.success {
            error!(container = name, "failed to stop container (missing?)");
            return false;
        }
        tokio::time::sleep(STOP_START_PAUSE).await;

        let start = run_command(&format!("docker start {name}"), COMMAND_TIMEOUT).await;
        if !start.success {
            error!(container = name, "failed to start container");
            return false;
        }

        tokio::time::sleep(VERIFY_PAUSE).await;
        let state = run_command(
            &format!("docker inspect -f '{{{{.State.Running}}}}' {name}"),
            COMMAND_TIMEOUT,
        )
        .await;
        if state.success && state.stdout == "true" {
            info!(container = name, "container restarted");
            true
        } else {
            error!(container = name, state = %state.stdout, "container not running after restart");
            false
        }
    }

    /// Terminate matching processes, escalating to SIGKILL.
    async fn restart_process(&self, name: &str) -> bool {
        let terminate = run_command(&format!("pkill -f {name}"), COMMAND_TIMEOUT).await;
        if !terminate.success {
            warn!(process = name, "no matching processes found");
            return false;
        }

        tokio::time::sleep(VERIFY_PAUSE).await;
        // Anything still alive gets SIGKILL; pkill failing here just
        // means everything already exited.
        let _ = run_command(&format!("pkill -9 -f {name}"), COMMAND_TIMEOUT).await;
        info!(process = name, "process restart completed");
        true
    }

    /// Restart nginx via systemd, the service wrapper, or a reload.
    async fn restart_nginx(&self) -> bool {
        if run_command("which systemctl", COMMAND_TIMEOUT).await.success {
            return self.restart_service("nginx").await;
        }
        if run_command("which service", COMMAND_TIMEOUT).await.success {
            return run_command("sudo service nginx restart", COMMAND_TIMEOUT)
                .await
                .success;
        }
        run_command("sudo nginx -s reload", COMMAND_TIMEOUT)
            .await
            .success
    }

    /// Restart apache, trying both common unit names.
    async fn restart_apache(&self) -> bool {
        for name in ["apache2", "httpd"] {
            let listed = run_command(
                &format!("systemctl list-unit-files | grep {name}"),
                COMMAND_TIMEOUT,
            )
            .await;
            if listed.success {
                return self.restart_service(name).await;
            }
        }
        for name in ["apache2", "httpd"] {
            if run_command(&format!("sudo service {name} restart"), COMMAND_TIMEOUT)
                .await
                .success
            {
                return true;
            }
        }
        false
    }

    /// Schedule a host reboot one minute out, leaving time to flush logs.
    async fn reboot_server(&self) -> bool {
        warn!("initiating server reboot");
        let scheduled = run_command(
            "sudo shutdown -r +1 'vigil automated recovery reboot'",
            COMMAND_TIMEOUT,
        )
        .await;
        if scheduled.success {
            info!("server reboot scheduled in 1 minute");
            true
        } else {
            error!("failed to schedule server reboot");
            false
        }
    }

    /// Reboot the configured instance through the provider API.
    async fn reboot_linode(&self) -> bool {
        let Some(token) = &self.linode_token else {
            error!("linode API token not configured");
            return false;
        };
        let Some(instance_id) = self.linode_instance_id else {
            error!("linode instance id not configured");
            return false;
        };

        let url = format!("https://api.linode.com/v4/linode/instances/{instance_id}/reboot");
        match self.client.post(&url).bearer_auth(token).send().await {
            Ok(response) if response.status().is_success() => {
                info!(instance_id, "linode reboot initiated");
                true
            }
            Ok(response) => {
                error!(instance_id, status = %response.status(), "linode reboot rejected");
                false
            }
            Err(e) => {
                error!(instance_id, error = %e, "linode reboot request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> RecoveryExecutor {
        RecoveryExecutor::new(&RecoveryConfig::default())
            .unwrap()
            .with_linode(None, None)
    }

    #[tokio::test]
    async fn custom_script_success() {
        let action = RecoveryAction::CustomScript {
            command: "true".to_string(),
        };
        assert!(executor().perform(&action).await);
    }

    #[tokio::test]
    async fn custom_script_failure() {
        let action = RecoveryAction::CustomScript {
            command: "false".to_string(),
        };
        assert!(!executor().perform(&action).await);
    }

    #[tokio::test]
    async fn linode_reboot_without_token_fails_cleanly() {
        assert!(!executor().perform(&RecoveryAction::RebootLinode).await);
    }

    #[tokio::test]
    async fn linode_reboot_without_instance_id_fails_cleanly() {
        let executor = executor().with_linode(Some("token".to_string()), None);
        assert!(!executor.perform(&RecoveryAction::RebootLinode).await);
    }
}
