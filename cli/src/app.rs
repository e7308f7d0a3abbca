//! Application context: unified state passed to every command handler.
//!
//! Holds terminal output and the credential prompts, so commands never talk
//! to the terminal directly.

use anyhow::{Context, Result};

use crate::application::Credentials;
use crate::output::OutputContext;

/// Environment variable holding the login password.
pub const PASSWORD_ENV: &str = "FLEET_PASSWORD";

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, tty detection).
    pub output: OutputContext,
    /// When `true`, never prompt; missing credentials are an error.
    ///
    /// Set when stdin is not a terminal or the `CI` environment variable is
    /// present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let non_interactive =
            std::env::var_os("CI").is_some() || !console::Term::stdout().is_term();
        Self {
            output: OutputContext::new(flags.no_color),
            non_interactive,
        }
    }

    /// Resolve the fleet login: `user` (from `-u` or `FLEET_USER`) or a
    /// prompt, and the password from `FLEET_PASSWORD` or a hidden prompt.
    ///
    /// An empty password means key-based login and passwordless `sudo`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is missing and prompting is not possible.
    pub fn credentials(&self, user: Option<String>) -> Result<Credentials> {
        let username = match user.filter(|u| !u.trim().is_empty()) {
            Some(user) => user,
            None if self.non_interactive => {
                anyhow::bail!("no username given; pass -u or set FLEET_USER")
            }
            None => dialoguer::Input::<String>::new()
                .with_prompt("Username")
                .interact_text()
                .context("cannot read username")?,
        };

        let password = match std::env::var(PASSWORD_ENV) {
            Ok(password) => password,
            Err(_) if self.non_interactive => String::new(),
            Err(_) => dialoguer::Password::new()
                .with_prompt(format!("Password for {username}"))
                .allow_empty_password(true)
                .interact()
                .context("cannot read password")?,
        };

        Ok(Credentials {
            username,
            password: (!password.is_empty()).then_some(password),
        })
    }
}
