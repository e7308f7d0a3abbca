//! Application service: tier-specific start sequence.
//!
//! Leaves start immediately and publish a token. Relays wait for every leaf
//! in the fleet, roots wait for every leaf and relay. The root publishes
//! nothing because nobody waits on it.

use std::time::Duration;

use crate::application::ports::RemoteSession;
use crate::application::services::context::{HostContext, Shell, shell_quote};
use crate::domain::{Phase, Tier, WorkflowError};

/// Start this host's processes for its tier and mark it `Online`.
///
/// # Errors
///
/// Fails when a start command fails or the transport drops.
pub async fn start<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    match ctx.tier {
        Some(Tier::Leaf) => {
            let scripts = ctx.profile().leaf_scripts.clone();
            start_capture(ctx, shell).await?;
            run_scripts(ctx, shell, &scripts).await?;
            publish(ctx);
        }
        Some(Tier::Relay) => {
            let scripts = ctx.profile().relay_scripts.clone();
            wait_for_peers(ctx).await;
            start_capture(ctx, shell).await?;
            run_scripts(ctx, shell, &scripts).await?;
            publish(ctx);
        }
        Some(Tier::Root) => {
            wait_for_peers(ctx).await;
            start_capture(ctx, shell).await?;
            start_controller(ctx, shell).await?;
        }
        None => {
            tracing::info!(host = ctx.host.name(), "host has no role in this variant");
            return Ok(());
        }
    }
    ctx.phase(Phase::Online, "");
    Ok(())
}

async fn wait_for_peers(ctx: &HostContext) {
    let Some(min) = ctx.topology().barrier_threshold(ctx.host.name(), ctx.variant()) else {
        return;
    };
    let observed = ctx.barrier.await_count(min, &ctx.status).await;
    tracing::info!(host = ctx.host.name(), observed, min, "peers ready");
}

fn publish(ctx: &HostContext) {
    if let Some(token) = ctx.topology().token_for(ctx.host.name(), ctx.variant()) {
        ctx.barrier.publish(token);
    }
}

async fn start_capture<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    ctx.phase(Phase::Starting, "Starting packet capture");
    let remote = ctx.remote();
    let capture = format!(
        "{} -i {} -U -w {}",
        remote.capture_process,
        remote.capture_interface,
        remote.capture_path(ctx.host.short_name())
    );
    let command = format!("tmux new-session -d -s capture {}", shell_quote(&capture));
    shell.require(&command, true, "start packet capture").await?;
    Ok(())
}

/// Run each script in its own detached tmux session, settling after each.
async fn run_scripts<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
    scripts: &[String],
) -> Result<(), WorkflowError> {
    let package = ctx.package_path();
    let settle = Duration::from_secs(ctx.timing().settle_secs);

    for (i, script) in scripts.iter().enumerate() {
        ctx.phase(Phase::Starting, &format!("Starting {script}"));
        let inner = format!("bash {package}/{script}");
        let command = format!(
            "tmux new-session -d -s server{} {}",
            i + 1,
            shell_quote(&inner)
        );
        shell
            .require(&command, false, &format!("start {script}"))
            .await?;
        ctx.phase(Phase::Settling, &format!("Started {script}"));
        tokio::time::sleep(settle).await;
    }
    Ok(())
}

async fn start_controller<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    ctx.phase(Phase::Starting, "Starting controller");
    let package = ctx.package_path();
    let entry = &ctx.profile().root_entry;
    let inner = format!(
        "node {package}/dist/esm/{entry} -- --storage-clear 2>&1 | tee {package}/root.log"
    );
    let command = format!("tmux new-session -d -s server {}", shell_quote(&inner));
    shell.require(&command, false, "start controller").await?;
    ctx.output(&inner);
    Ok(())
}
