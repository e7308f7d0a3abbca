//! Application service: stop everything a previous run left behind.
//!
//! Teardown is best effort and idempotent: each failed command shows
//! `Failed to <step>` and the sequence continues. Only a transport failure
//! ends it early.

use crate::application::ports::RemoteSession;
use crate::application::services::context::{HostContext, Shell};
use crate::domain::{LaunchProfile, Phase, SessionError};

/// Kill application, capture and tmux processes and clear cached state and logs.
///
/// Ends in `Stopped` even when individual steps failed.
///
/// # Errors
///
/// Returns `SessionError` when the transport fails.
pub async fn teardown<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), SessionError> {
    ctx.phase(Phase::Stopping, "");
    let remote = ctx.remote();

    let kill_app = format!("killall {}", remote.process_name);
    if !shell.run(&kill_app, true).await?.succeeded {
        shell.attempt(&kill_app, true, "stop application").await?;
    }

    shell
        .attempt(&format!("rm -rf {}", remote.cache_dir), false, "clear application cache")
        .await?;

    // killall exits non-zero when nothing is running.
    let kill_capture = format!("killall {}", remote.capture_process);
    if !shell.run(&kill_capture, true).await?.succeeded {
        tracing::debug!(host = ctx.host.name(), "no capture process running");
    }

    for elevated in [true, false] {
        if !shell.run("tmux kill-server", elevated).await?.succeeded {
            tracing::debug!(host = ctx.host.name(), elevated, "no tmux server running");
        }
    }

    let launch = &ctx.plan.config.launch;
    for profile in [&launch.flat, &launch.hierarchical] {
        let logs = format!("rm -rf {}/*.log", package_dir(ctx, profile));
        shell.attempt(&logs, true, "remove application logs").await?;
    }

    ctx.phase(Phase::Stopped, "");
    Ok(())
}

fn package_dir(ctx: &HostContext, profile: &LaunchProfile) -> String {
    ctx.remote().package_path(&profile.package)
}
