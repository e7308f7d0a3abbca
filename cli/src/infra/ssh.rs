//! OpenSSH implementation of the `SessionConnector` and `RemoteSession` ports.
//!
//! `open` starts a ControlMaster connection on a private socket; every later
//! `ssh`/`scp` call multiplexes over it, so authentication happens once per
//! host. Passwords reach `sshpass` through the `SSHPASS` environment variable
//! and `sudo` through stdin, never through argv.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

use tempfile::TempDir;

use crate::application::ports::{
    CommandOutcome, CommandRunner, Credentials, RemoteSession, SessionConnector,
};
use crate::application::services::context::shell_quote;
use crate::domain::{Host, SessionError};

/// ssh exit code for connection-level failures.
const SSH_TRANSPORT_FAILURE: i32 = 255;
/// sshpass exit code for a rejected password.
const SSHPASS_BAD_PASSWORD: i32 = 5;

/// Opens one ControlMaster connection per host.
#[derive(Debug)]
pub struct OpenSshConnector<R: CommandRunner> {
    runner: Arc<R>,
    connect_timeout_secs: u64,
}

impl<R: CommandRunner> OpenSshConnector<R> {
    #[must_use]
    pub fn new(runner: R, connect_timeout_secs: u64) -> Self {
        Self {
            runner: Arc::new(runner),
            connect_timeout_secs,
        }
    }
}

impl<R: CommandRunner + 'static> SessionConnector for OpenSshConnector<R> {
    type Session = OpenSshSession<R>;

    async fn open(
        &self,
        host: &Host,
        credentials: &Credentials,
    ) -> Result<OpenSshSession<R>, SessionError> {
        let connect_err = |message: String| SessionError::Connect {
            host: host.name().to_string(),
            message,
        };
        let control_dir = tempfile::Builder::new()
            .prefix("fleet-ssh-")
            .tempdir()
            .map_err(|e| connect_err(format!("cannot create control socket directory: {e}")))?;

        let session = OpenSshSession {
            runner: Arc::clone(&self.runner),
            host: host.name().to_string(),
            user: credentials.username.clone(),
            password: credentials.password.clone(),
            socket: control_dir.path().join("ctl"),
            _control_dir: control_dir,
        };

        let mut args = session.common_options();
        args.extend([
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
        ]);
        if session.password.is_none() {
            args.extend(["-o".to_string(), "BatchMode=yes".to_string()]);
        }
        args.extend([
            "-M".to_string(),
            "-N".to_string(),
            "-f".to_string(),
            session.host.clone(),
        ]);

        tracing::debug!(host = %session.host, user = %session.user, "opening control connection");
        let output = session
            .authenticated("ssh", &args)
            .await
            .map_err(|e| connect_err(format!("{e:#}")))?;
        if output.status.success() {
            return Ok(session);
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_auth_failure(&output, &stderr) {
            Err(SessionError::Auth {
                host: session.host.clone(),
                user: session.user.clone(),
            })
        } else {
            Err(connect_err(stderr))
        }
    }
}

fn is_auth_failure(output: &Output, stderr: &str) -> bool {
    match output.status.code() {
        Some(SSHPASS_BAD_PASSWORD) => true,
        Some(SSH_TRANSPORT_FAILURE) => stderr.contains("Permission denied"),
        _ => false,
    }
}

/// A live ControlMaster connection to one host.
///
/// The control socket lives in a private temporary directory removed when
/// the session is dropped.
#[derive(Debug)]
pub struct OpenSshSession<R: CommandRunner> {
    runner: Arc<R>,
    host: String,
    user: String,
    password: Option<String>,
    socket: PathBuf,
    _control_dir: TempDir,
}

impl<R: CommandRunner> OpenSshSession<R> {
    /// Options shared by every ssh and scp invocation.
    fn common_options(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("ControlPath={}", self.socket.display()),
            "-o".to_string(),
            format!("User={}", self.user),
        ]
    }

    /// Options for calls that ride on the master. Once the master is gone
    /// they exit 255 instead of opening a new connection that could prompt.
    fn multiplexed_options(&self) -> Vec<String> {
        let mut args = self.common_options();
        args.extend([
            "-o".to_string(),
            "ControlMaster=no".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ]);
        args
    }

    /// Run `program`, through `sshpass` when a password is set.
    async fn authenticated(&self, program: &str, args: &[String]) -> anyhow::Result<Output> {
        match &self.password {
            Some(password) => {
                let mut wrapped: Vec<&str> = vec!["-e", program];
                wrapped.extend(args.iter().map(String::as_str));
                self.runner
                    .run_with_env("sshpass", &wrapped, &[("SSHPASS", password.as_str())])
                    .await
            }
            None => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                self.runner.run(program, &args).await
            }
        }
    }

    /// Remote shell text for `command`, wrapped in `sudo` when elevated.
    fn remote_command(&self, command: &str, elevated: bool) -> String {
        match (elevated, self.password.is_some()) {
            (false, _) => command.to_string(),
            (true, true) => format!("sudo -S -p '' sh -c {}", shell_quote(command)),
            (true, false) => format!("sudo -n sh -c {}", shell_quote(command)),
        }
    }

    fn transport_err(&self, message: impl Into<String>) -> SessionError {
        SessionError::Transport {
            host: self.host.clone(),
            message: message.into(),
        }
    }

    async fn scp(&self, from: &str, to: &str) -> Result<(), SessionError> {
        let transfer_err = |message: String| SessionError::Transfer {
            from: from.to_string(),
            to: to.to_string(),
            message,
        };
        let mut args = self.multiplexed_options();
        args.extend(["-q".to_string(), from.to_string(), to.to_string()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run("scp", &args)
            .await
            .map_err(|e| transfer_err(format!("{e:#}")))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(transfer_err(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    fn remote_target(&self, path: &str) -> String {
        format!("{}:{path}", self.host)
    }
}

impl<R: CommandRunner + 'static> RemoteSession for OpenSshSession<R> {
    async fn run(&self, command: &str, elevated: bool) -> Result<CommandOutcome, SessionError> {
        let remote = self.remote_command(command, elevated);
        let mut args = self.multiplexed_options();
        args.extend([self.host.clone(), "--".to_string(), remote]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = match (&self.password, elevated) {
            (Some(password), true) => {
                let input = format!("{password}\n");
                self.runner
                    .run_with_stdin("ssh", &args, input.as_bytes())
                    .await
            }
            _ => self.runner.run("ssh", &args).await,
        }
        .map_err(|e| self.transport_err(format!("{e:#}")))?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if output.status.code() == Some(SSH_TRANSPORT_FAILURE) {
            return Err(self.transport_err(stderr.trim()));
        }
        Ok(CommandOutcome {
            succeeded: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
        })
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<(), SessionError> {
        let from = local.display().to_string();
        self.scp(&from, &self.remote_target(remote)).await
    }

    async fn upload_bytes(&self, contents: &[u8], remote: &str) -> Result<(), SessionError> {
        let transfer_err = |message: String| SessionError::Transfer {
            from: "<generated>".to_string(),
            to: remote.to_string(),
            message,
        };
        let staged = tempfile::NamedTempFile::new()
            .map_err(|e| transfer_err(format!("cannot stage file: {e}")))?;
        std::fs::write(staged.path(), contents)
            .map_err(|e| transfer_err(format!("cannot stage file: {e}")))?;
        self.upload(staged.path(), remote).await
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<(), SessionError> {
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Transfer {
                from: remote.to_string(),
                to: local.display().to_string(),
                message: format!("cannot create {}: {e}", parent.display()),
            })?;
        }
        self.scp(&self.remote_target(remote), &local.display().to_string())
            .await
    }

    async fn close(self) {
        let mut args = self.multiplexed_options();
        args.extend(["-O".to_string(), "exit".to_string(), self.host.clone()]);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match self.runner.run("ssh", &args).await {
            Ok(output) if output.status.success() => {
                tracing::debug!(host = %self.host, "control connection closed");
            }
            Ok(output) => tracing::warn!(
                host = %self.host,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "closing control connection failed"
            ),
            Err(e) => tracing::warn!(host = %self.host, "closing control connection failed: {e:#}"),
        }
    }
}
