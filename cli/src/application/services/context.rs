//! Per-run plan and per-host context shared by the workflow services.

use std::sync::Arc;

use crate::application::barrier::ReadinessBarrier;
use crate::application::ports::{CommandOutcome, Credentials, ProgressReporter, RemoteSession};
use crate::application::registry::HostStatusHandle;
use crate::domain::{
    FleetConfig, Host, LaunchProfile, Phase, RemoteLayout, SessionError, StepFailure, Tier,
    Timing, Topology, Variant, WorkflowError,
};

/// Everything fixed for the whole run.
#[derive(Debug)]
pub struct FleetPlan {
    pub topology: Topology,
    pub config: FleetConfig,
    pub variant: Variant,
    pub credentials: Credentials,
}

impl FleetPlan {
    /// Package directory of the active launch profile.
    #[must_use]
    pub fn package_path(&self) -> String {
        self.config
            .remote
            .package_path(&self.config.profile(self.variant).package)
    }
}

/// What a single worker knows about its host.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub host: Host,
    /// `None` when the host plays no part in the active variant.
    pub tier: Option<Tier>,
    pub plan: Arc<FleetPlan>,
    pub barrier: Arc<ReadinessBarrier>,
    pub status: HostStatusHandle,
}

impl HostContext {
    #[must_use]
    pub fn remote(&self) -> &RemoteLayout {
        &self.plan.config.remote
    }

    #[must_use]
    pub fn profile(&self) -> &LaunchProfile {
        self.plan.config.profile(self.plan.variant)
    }

    #[must_use]
    pub fn timing(&self) -> &Timing {
        &self.plan.config.timing
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.plan.topology
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        self.plan.variant
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.plan.credentials.username
    }

    /// Package directory of the active launch profile.
    #[must_use]
    pub fn package_path(&self) -> String {
        self.plan.package_path()
    }

    pub fn phase(&self, phase: Phase, detail: &str) {
        self.status.phase(phase, detail);
    }

    pub fn output(&self, text: &str) {
        self.status.output(text);
    }
}

/// Runs remote commands for one host and mirrors their output into its
/// status entry.
pub struct Shell<'a, S: RemoteSession> {
    session: &'a S,
    status: &'a HostStatusHandle,
}

impl<'a, S: RemoteSession> Shell<'a, S> {
    pub fn new(session: &'a S, status: &'a HostStatusHandle) -> Self {
        Self { session, status }
    }

    #[must_use]
    pub fn session(&self) -> &S {
        self.session
    }

    /// Run a command and publish its output. Non-zero exit is not an error.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the transport fails.
    pub async fn run(&self, command: &str, elevated: bool) -> Result<CommandOutcome, SessionError> {
        tracing::debug!(host = self.status.host(), command, elevated, "remote command");
        let outcome = self.session.run(command, elevated).await?;
        self.status.output(&outcome.combined());
        if !outcome.succeeded {
            tracing::debug!(host = self.status.host(), command, "remote command exited non-zero");
        }
        Ok(outcome)
    }

    /// Run a command that must succeed for the workflow to continue.
    ///
    /// # Errors
    ///
    /// `WorkflowError::Step` naming `step` when the command fails,
    /// `WorkflowError::Session` when the transport fails.
    pub async fn require(
        &self,
        command: &str,
        elevated: bool,
        step: &str,
    ) -> Result<CommandOutcome, WorkflowError> {
        let outcome = self.run(command, elevated).await?;
        if outcome.succeeded {
            Ok(outcome)
        } else {
            Err(StepFailure(step.to_string()).into())
        }
    }

    /// Best-effort command: a failure is shown as `Failed to <step>` and the
    /// caller carries on. Returns whether the command succeeded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the transport fails.
    pub async fn attempt(
        &self,
        command: &str,
        elevated: bool,
        step: &str,
    ) -> Result<bool, SessionError> {
        let outcome = self.run(command, elevated).await?;
        if !outcome.succeeded {
            tracing::warn!(host = self.status.host(), step, "best-effort step failed");
            self.status.phase(Phase::Failed, &format!("Failed to {step}"));
        }
        Ok(outcome.succeeded)
    }
}

/// Single-quote `raw` for a POSIX shell.
#[must_use]
pub fn shell_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', r"'\''"))
}
