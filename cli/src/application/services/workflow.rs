//! Application service: the per-host worker.
//!
//! One call drives one host from `Connecting` to a terminal phase. Errors
//! never escape: they become the host's final status, and the session is
//! closed on every path once it was opened.

use crate::application::ports::{RemoteSession, SessionConnector};
use crate::application::services::context::{HostContext, Shell};
use crate::application::services::{setup, startup, teardown};
use crate::domain::{Action, Phase, WorkflowError};

/// Run `action` against one host.
pub async fn run_host<C: SessionConnector>(connector: &C, ctx: &HostContext, action: Action) {
    ctx.phase(Phase::Connecting, "");
    let session = match connector.open(&ctx.host, &ctx.plan.credentials).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(host = ctx.host.name(), "connect failed: {e}");
            record_failure(ctx, &WorkflowError::Session(e));
            return;
        }
    };

    let result = {
        let shell = Shell::new(&session, &ctx.status);
        match action {
            Action::Deploy => deploy(ctx, &shell).await,
            Action::Restart => restart(ctx, &shell).await,
            Action::Stop => teardown::teardown(ctx, &shell).await.map_err(Into::into),
        }
    };
    if let Err(e) = result {
        tracing::error!(host = ctx.host.name(), ?action, "workflow stopped: {e}");
        record_failure(ctx, &e);
    }
    session.close().await;
}

/// Full sequence: sync, build, configure and start.
async fn deploy<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    setup::initialize(ctx, shell).await?;
    setup::provision(ctx, shell).await?;
    teardown::teardown(ctx, shell).await?;
    setup::update(ctx, shell).await?;
    setup::build(ctx, shell).await?;
    setup::configure(ctx, shell).await?;
    startup::start(ctx, shell).await
}

/// Tear down and start again from the existing build.
async fn restart<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    setup::initialize(ctx, shell).await?;
    setup::provision(ctx, shell).await?;
    teardown::teardown(ctx, shell).await?;
    setup::configure(ctx, shell).await?;
    startup::start(ctx, shell).await
}

fn record_failure(ctx: &HostContext, error: &WorkflowError) {
    let phase = match error {
        WorkflowError::Step(_) => Phase::Failed,
        WorkflowError::Session(_) => Phase::Error,
    };
    ctx.phase(phase, &error.to_string());
}
