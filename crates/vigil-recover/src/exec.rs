//! Shell command execution with a timeout.

use std::time::Duration;

use tracing::{debug, error, info};

/// Captured outcome of one shell command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` through `sh -c`, capturing output.
///
/// A timeout or spawn failure is reported as an unsuccessful output,
/// never as an `Err`.
pub async fn run_command(command: &str, timeout: Duration) -> CommandOutput {
    info!(%command, "executing command");

    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, output).await {
        Ok(Ok(output)) => {
            let success = output.status.success();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if success {
                debug!(%command, "command succeeded");
            } else {
                error!(%command, code = ?output.status.code(), %stderr, "command failed");
            }
            CommandOutput {
                success,
                stdout,
                stderr,
            }
        }
        Ok(Err(e)) => {
            error!(%command, error = %e, "failed to spawn command");
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: e.to_string(),
            }
        }
        Err(_) => {
            error!(%command, timeout_secs = timeout.as_secs(), "command timed out");
            CommandOutput {
                success: false,
                stdout: String::new(),
                stderr: format!("command timed out after {}s", timeout.as_secs()),
            }
        }
    }
}
