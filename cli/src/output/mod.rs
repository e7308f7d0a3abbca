//! Output formatting module

pub mod monitor;
pub mod progress;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use styles::Styles;

use crate::domain::{HostStatus, Tone};

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let styles = if use_colors {
            Styles::colored()
        } else {
            Styles::default()
        };

        Self { styles, is_tty }
    }

    /// Whether the interactive monitor can take over the terminal.
    #[must_use]
    pub fn can_monitor(&self) -> bool {
        self.is_tty
    }

    /// Print a success message prefixed with `✓`.
    pub fn success(&self, msg: &str) {
        println!("  {} {msg}", "✓".style(self.styles.success));
    }

    /// Print a warning message prefixed with `⚠`.
    pub fn warn(&self, msg: &str) {
        println!("  {} {msg}", "⚠".style(self.styles.warning));
    }

    /// Print an error message prefixed with `✗` to stderr.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`.
    pub fn info(&self, msg: &str) {
        println!("  {} {msg}", "ℹ".style(self.styles.info));
    }

    /// Print a section header.
    pub fn header(&self, msg: &str) {
        println!("  {}", msg.style(self.styles.header));
    }

    /// Print a key-value pair with the key dimmed.
    pub fn kv(&self, key: &str, value: &str) {
        println!("  {}  {value}", key.style(self.styles.dim));
    }

    /// Print the last known state of every host, in roster order.
    pub fn summary(&self, snapshot: &[(String, HostStatus)]) {
        println!();
        self.header("Final status of all hosts:");
        for (host, status) in snapshot {
            println!("  {}", self.summary_row(host, status));
        }
    }

    /// Summary line prefixed with an icon in the colour of its tone.
    #[must_use]
    pub fn summary_row(&self, host: &str, status: &HostStatus) -> String {
        let tone = status.phase.tone();
        let icon = match tone {
            Tone::Success => "✓",
            Tone::Failure => "✗",
            Tone::Pending => "⚠",
        };
        format!("{} {}", icon.style(self.styles.tone(tone)), summary_line(host, status))
    }
}

/// `host: label` as printed in the final summary.
#[must_use]
pub fn summary_line(host: &str, status: &HostStatus) -> String {
    format!("{host}: {}", status.label())
}
