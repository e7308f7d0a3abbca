//! `fleet`: run the selected action on every host and watch it happen.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::app::AppContext;
use crate::application::services::{Fleet, FleetPlan};
use crate::application::SessionConnector;
use crate::domain::{Action, Variant};
use crate::infra::{OpenSshConnector, TokioCommandRunner, logging};
use crate::output::monitor::{self, MonitorCommand, MonitorExit};
use crate::output::progress;

/// Exit status after Ctrl-C, as a shell would report SIGINT.
const INTERRUPTED_EXIT: i32 = 130;

/// Options resolved from the command line.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub config: Option<PathBuf>,
    pub user: Option<String>,
    pub action: Action,
    pub variant: Variant,
    /// Show the interactive monitor while workers run.
    pub monitor: bool,
}

/// Run `fleet` with the selected action.
///
/// # Errors
///
/// Returns an error if the fleet file is invalid, credentials cannot be read,
/// or the terminal cannot be driven.
pub async fn run(app: &AppContext, opts: DeployOptions) -> Result<()> {
    let fleet = super::load_fleet(opts.config, opts.variant)?;
    let log_path = logging::init(&fleet.config.artifacts_dir)?;
    tracing::info!(
        config = %fleet.path.display(),
        action = ?opts.action,
        variant = ?opts.variant,
        "starting run"
    );
    let credentials = app.credentials(opts.user)?;

    let timing = fleet.config.timing;
    let connector = OpenSshConnector::new(
        TokioCommandRunner::new(None),
        timing.connect_timeout_secs,
    );
    let plan = FleetPlan {
        topology: fleet.topology,
        config: fleet.config,
        variant: opts.variant,
        credentials,
    };
    let mut fleet = Fleet::new(plan, connector);
    fleet.launch(opts.action);

    let refresh = Duration::from_millis(timing.refresh_ms);
    if opts.monitor {
        watch(&mut fleet, refresh).await?;
        if !fleet.is_idle() {
            app.output.info("Monitor closed; waiting for remaining hosts (Ctrl-C to abort)");
        }
        wait_or_interrupt(&mut fleet).await;
    } else {
        wait_headless(app, &mut fleet, refresh).await;
    }

    app.output.summary(&fleet.registry().snapshot_all());
    app.output.kv("log", &log_path.display().to_string());
    Ok(())
}

/// Drive the monitor, forwarding its requests to the launcher.
async fn watch<C: SessionConnector>(fleet: &mut Fleet<C>, refresh: Duration) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let screen = monitor::run(fleet.registry(), refresh, tx);
    tokio::pin!(screen);

    loop {
        tokio::select! {
            exit = &mut screen => {
                return match exit? {
                    MonitorExit::Interrupted => interrupted_now(),
                    MonitorExit::Quit | MonitorExit::InputClosed => Ok(()),
                };
            }
            Some(command) = rx.recv() => match command {
                MonitorCommand::CollectLogs => fleet.collect_logs(),
            },
        }
    }
}

/// Wait for workers with a progress line instead of the monitor.
async fn wait_headless<C: SessionConnector>(
    app: &AppContext,
    fleet: &mut Fleet<C>,
    refresh: Duration,
) {
    let registry = fleet.registry();
    let spinner = app
        .output
        .is_tty
        .then(|| progress::spinner(&progress::fleet_summary(&registry.snapshot_all())));
    let mut ticker = tokio::time::interval(refresh);

    loop {
        tokio::select! {
            () = fleet.wait() => break,
            _ = ticker.tick() => {
                if let Some(pb) = &spinner {
                    pb.set_message(progress::fleet_summary(&registry.snapshot_all()));
                }
            }
            _ = tokio::signal::ctrl_c() => interrupted_now(),
        }
    }
    if let Some(pb) = &spinner {
        progress::finish(pb, &progress::fleet_summary(&registry.snapshot_all()));
    }
}

async fn wait_or_interrupt<C: SessionConnector>(fleet: &mut Fleet<C>) {
    tokio::select! {
        () = fleet.wait() => {}
        _ = tokio::signal::ctrl_c() => interrupted_now(),
    }
}

/// Workers are not cancelled cooperatively; the process just ends.
fn interrupted_now() -> ! {
    tracing::warn!("interrupted; exiting without waiting for hosts");
    std::process::exit(INTERRUPTED_EXIT)
}
