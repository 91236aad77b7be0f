//! vigild — the Vigil monitoring daemon.
//!
//! Single binary that assembles the Vigil subsystems:
//! - Prober (HTTP/TCP checks with retries)
//! - Orchestration engine (tracking, detection, gating)
//! - Webhook/log notifier
//! - Recovery executor
//!
//! # Usage
//!
//! ```text
//! vigild --config vigil.toml --daemon
//! vigild --single --output cycle.json
//! vigild --action restart_service --target myapp
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use vigil_core::{Config, ProbeResult, RecoveryAction, Target};
use vigil_engine::{NotifyFn, Orchestrator, ProbeFn, RecoverFn};
use vigil_notify::WebhookNotifier;
use vigil_probe::Prober;
use vigil_recover::RecoveryExecutor;

#[derive(Parser)]
#[command(name = "vigild", about = "Website monitoring and auto-recovery daemon")]
struct Cli {
    /// Configuration file path.
    #[arg(long, default_value = "vigil.toml")]
    config: PathBuf,

    /// Run a single monitoring cycle and print the cycle record.
    #[arg(long)]
    single: bool,

    /// Run as a continuous daemon on the configured interval.
    #[arg(long)]
    daemon: bool,

    /// Run as a daemon with a minute-based interval.
    #[arg(long)]
    scheduled: bool,

    /// Interval in minutes for --scheduled.
    #[arg(long, default_value = "5")]
    interval_mins: u64,

    /// Probe and track only; force-disable notifications and recovery.
    #[arg(long)]
    dry_run: bool,

    /// Disable recovery actions.
    #[arg(long)]
    no_recovery: bool,

    /// Disable notifications.
    #[arg(long)]
    no_notifications: bool,

    /// Write the cycle record to this path instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Perform a single recovery action and exit.
    #[arg(long)]
    action: Option<String>,

    /// Target for --action (service, container, process or script).
    #[arg(long)]
    target: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vigild=debug,vigil=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    if let Some(action_name) = &cli.action {
        return run_manual_action(&config, action_name, cli.target.as_deref(), cli.dry_run).await;
    }

    let mut orchestrator = build_orchestrator(&config)?;

    if cli.dry_run {
        info!("dry run: notifications and recovery disabled");
        orchestrator.disable_notifications();
        orchestrator.disable_recovery();
    }
    if cli.no_recovery {
        orchestrator.disable_recovery();
    }
    if cli.no_notifications {
        orchestrator.disable_notifications();
    }

    if cli.daemon || cli.scheduled {
        let interval = if cli.scheduled {
            Duration::from_secs(cli.interval_mins * 60)
        } else {
            Duration::from_secs(config.orchestration.check_interval_secs)
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        });

        orchestrator.run_daemon(interval, shutdown_rx).await;
        info!("vigild stopped");
        return Ok(());
    }

    // Default (and --single): one cycle.
    let record = orchestrator.run_single_cycle().await;
    match &cli.output {
        Some(path) => {
            vigil_engine::save_cycle_record_to(&record, path)?;
            info!(path = %path.display(), "cycle record written");
        }
        None => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}

/// Wire the prober, notifier and executor callbacks into an engine.
fn build_orchestrator(config: &Config) -> anyhow::Result<Orchestrator> {
    let prober = Arc::new(Prober::new(config.monitoring.clone())?);
    let probe_fn: ProbeFn = {
        let prober = prober.clone();
        Arc::new(move |target: Target| {
            let prober = prober.clone();
            Box::pin(async move { prober.probe(&target).await })
        })
    };

    let notify_fn: NotifyFn = match &config.notifications.webhook_url {
        Some(url) => {
            let notifier = Arc::new(WebhookNotifier::new(url)?);
            Arc::new(move |results: Vec<ProbeResult>| {
                let notifier = notifier.clone();
                Box::pin(async move { notifier.send_alert(&results).await })
            })
        }
        None => Arc::new(|results: Vec<ProbeResult>| {
            Box::pin(async move { vigil_notify::log_alert(&results).await })
        }),
    };

    let executor = Arc::new(RecoveryExecutor::new(&config.recovery)?);
    let recover_fn: RecoverFn = {
        let executor = executor.clone();
        Arc::new(move |action: RecoveryAction, url: String| {
            let executor = executor.clone();
            Box::pin(async move {
                info!(action = action.kind(), %url, "running recovery action");
                executor.perform(&action).await
            })
        })
    };

    Ok(Orchestrator::new(config.clone(), probe_fn)
        .with_notifier(notify_fn)
        .with_executor(recover_fn))
}

/// One-shot manual recovery action (`--action`), exiting nonzero on
/// failure.
async fn run_manual_action(
    config: &Config,
    name: &str,
    target: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let Some(action) = parse_action(name, target) else {
        bail!("unknown recovery action '{name}' (or missing --target)");
    };

    if dry_run {
        info!(action = action.kind(), target = ?action.target(), "would perform action");
        return Ok(());
    }

    let executor = RecoveryExecutor::new(&config.recovery)?;
    if executor.perform(&action).await {
        println!("recovery action '{name}' completed successfully");
        Ok(())
    } else {
        bail!("recovery action '{name}' failed");
    }
}

/// Build an action from a CLI name plus optional target.
fn parse_action(name: &str, target: Option<&str>) -> Option<RecoveryAction> {
    match (name, target) {
        ("restart_service", Some(t)) => Some(RecoveryAction::RestartService {
            target: t.to_string(),
        }),
        ("restart_container", Some(t)) => Some(RecoveryAction::RestartContainer {
            target: t.to_string(),
        }),
        ("restart_process", Some(t)) => Some(RecoveryAction::RestartProcess {
            target: t.to_string(),
        }),
        ("custom_script", Some(t)) => Some(RecoveryAction::CustomScript {
            command: t.to_string(),
        }),
        ("restart_nginx", _) => Some(RecoveryAction::RestartNginx),
        ("restart_apache", _) => Some(RecoveryAction::RestartApache),
        ("reboot_server", _) => Some(RecoveryAction::RebootServer),
        ("reboot_linode", _) => Some(RecoveryAction::RebootLinode),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_action_with_target() {
        assert_eq!(
            parse_action("restart_service", Some("myapp")),
            Some(RecoveryAction::RestartService {
                target: "myapp".to_string()
            })
        );
    }

    #[test]
    fn parse_action_missing_required_target() {
        assert!(parse_action("restart_service", None).is_none());
        assert!(parse_action("custom_script", None).is_none());
    }

    #[test]
    fn parse_action_global_kinds_ignore_target() {
        assert_eq!(
            parse_action("reboot_server", Some("ignored")),
            Some(RecoveryAction::RebootServer)
        );
    }

    #[test]
    fn parse_action_unknown_name() {
        assert!(parse_action("do_magic", None).is_none());
    }

    #[test]
    fn build_orchestrator_from_default_config() {
        assert!(build_orchestrator(&Config::default()).is_ok());
    }
}
