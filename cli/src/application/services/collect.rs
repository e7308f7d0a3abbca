//! Application service: stop a host and pull its captures and logs.
//!
//! Files land in `<artifacts_dir>/<short name>/<file name>`.

use std::path::PathBuf;

use crate::application::ports::{RemoteSession, SessionConnector};
use crate::application::services::context::{HostContext, Shell};
use crate::application::services::teardown;
use crate::domain::{Phase, SessionError, StepFailure, WorkflowError};

/// Collect every capture and log file from one host.
pub async fn collect_host<C: SessionConnector>(connector: &C, ctx: &HostContext) {
    ctx.phase(Phase::CollectingLogs, "");
    let session = match connector.open(&ctx.host, &ctx.plan.credentials).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(host = ctx.host.name(), "connect for collection failed: {e}");
            ctx.phase(Phase::Error, &WorkflowError::Session(e).to_string());
            return;
        }
    };

    let result = {
        let shell = Shell::new(&session, &ctx.status);
        collect(ctx, &shell).await
    };
    match result {
        Ok(count) => ctx.phase(Phase::Collected, &format!("Collected {count} files")),
        Err(e) => {
            tracing::error!(host = ctx.host.name(), "collection stopped: {e}");
            let phase = match e {
                WorkflowError::Step(_) => Phase::Failed,
                WorkflowError::Session(_) => Phase::Error,
            };
            ctx.phase(phase, &e.to_string());
        }
    }
    session.close().await;
}

async fn collect<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<usize, WorkflowError> {
    let remote = ctx.remote();
    let captures = shell
        .run(&format!("ls {}/*.pcap", remote.checkout_dir), false)
        .await?;

    // Captures only flush once tcpdump exits.
    teardown::teardown(ctx, shell).await?;

    if !captures.succeeded {
        return Err(StepFailure("list captures".to_string()).into());
    }

    let local_dir = ctx
        .plan
        .config
        .artifacts_dir
        .join(ctx.host.short_name());
    let mut count = download_all(ctx, shell, &captures.stdout, &local_dir).await?;

    let logs = shell
        .run(&format!("ls {}/*.log", ctx.package_path()), false)
        .await?;
    if logs.succeeded {
        count += download_all(ctx, shell, &logs.stdout, &local_dir).await?;
    } else {
        tracing::info!(host = ctx.host.name(), "no application logs to collect");
    }
    Ok(count)
}

async fn download_all<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
    listing: &str,
    local_dir: &std::path::Path,
) -> Result<usize, SessionError> {
    let mut count = 0;
    for remote_path in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(file_name) = remote_path.rsplit('/').next() else {
            continue;
        };
        ctx.phase(Phase::Downloading, &format!("Downloading {remote_path}"));
        let local: PathBuf = local_dir.join(file_name);
        match shell.session().download(remote_path, &local).await {
            Ok(()) => count += 1,
            Err(SessionError::Transfer { message, .. }) => {
                tracing::warn!(host = ctx.host.name(), remote_path, message, "download failed");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(count)
}
