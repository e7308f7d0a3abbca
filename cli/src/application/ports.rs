//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.
//!
//! Every returned future is `Send` so workflows can run on their own tokio
//! task per host.

use std::future::Future;
use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::domain::{FleetConfig, Host, Phase, SessionError};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Login used for every host in the fleet.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    /// `None` means key-based login and passwordless `sudo`.
    pub password: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Result of one remote command that actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Remote exit status was zero.
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so infrastructure can be swapped or mocked.
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output.
    fn run(&self, program: &str, args: &[&str]) -> impl Future<Output = Result<Output>> + Send;

    /// Run a program with stdin piped from `input`.
    fn run_with_stdin(
        &self,
        program: &str,
        args: &[&str],
        input: &[u8],
    ) -> impl Future<Output = Result<Output>> + Send;

    /// Run a program with extra environment variables.
    fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> impl Future<Output = Result<Output>> + Send;
}

// ── Remote Session Ports ──────────────────────────────────────────────────────

/// One authenticated remote-execution channel to one host.
///
/// `run` returns `Err` only when the channel itself fails; a command that
/// exits non-zero yields `Ok` with `succeeded == false`.
pub trait RemoteSession: Send + Sync {
    /// Run `command` through the remote shell, under `sudo` when `elevated`.
    fn run(
        &self,
        command: &str,
        elevated: bool,
    ) -> impl Future<Output = Result<CommandOutcome, SessionError>> + Send;

    /// Copy a local file to `remote`.
    fn upload(
        &self,
        local: &Path,
        remote: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Write `contents` to `remote`.
    fn upload_bytes(
        &self,
        contents: &[u8],
        remote: &str,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Copy `remote` to `local`, creating parent directories as needed.
    fn download(
        &self,
        remote: &str,
        local: &Path,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Release the connection. Consumes the session so it runs at most once.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Opens sessions. Shared by every worker for the whole run.
pub trait SessionConnector: Send + Sync + 'static {
    type Session: RemoteSession + 'static;

    /// Authenticate to `host`.
    ///
    /// # Errors
    ///
    /// `SessionError::Auth` for rejected credentials, `SessionError::Connect`
    /// when the host cannot be reached.
    fn open(
        &self,
        host: &Host,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Self::Session, SessionError>> + Send;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Per-host progress sink. Sync trait; no async needed.
///
/// Implementations are bound to a single host, so a worker can only ever
/// write its own entry.
pub trait ProgressReporter: Send + Sync {
    /// Enter `phase`, with optional display text (empty for none).
    fn phase(&self, phase: Phase, detail: &str);
    /// Replace the captured output shown under the status line.
    fn output(&self, text: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading of the fleet file.
pub trait ConfigStore {
    /// Load and parse the fleet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    fn load(&self) -> Result<FleetConfig>;

    /// Path the store reads from.
    fn path(&self) -> &Path;
}
