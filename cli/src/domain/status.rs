//! Per-host status: the closed set of workflow phases and display helpers.
//!
//! Control logic and the monitor switch on `Phase`; `detail` is display text
//! only and is never parsed.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Lines of captured output retained per host.
pub const OUTPUT_TAIL_LINES: usize = 3;

/// Stage of a host's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Waiting,
    Connecting,
    Initializing,
    Provisioning,
    Stopping,
    Stopped,
    Updating,
    InstallingDependencies,
    Building,
    Configuring,
    AwaitingPeers,
    Starting,
    Settling,
    Online,
    CollectingLogs,
    Downloading,
    Collected,
    Failed,
    Error,
}

/// Display category of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
    Pending,
}

impl Phase {
    #[must_use]
    pub fn tone(self) -> Tone {
        match self {
            Self::Online | Self::Stopped | Self::Collected => Tone::Success,
            Self::Failed | Self::Error => Tone::Failure,
            _ => Tone::Pending,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Connecting => "Connecting",
            Self::Initializing => "Initializing",
            Self::Provisioning => "Provisioning",
            Self::Stopping => "Stopping",
            Self::Stopped => "Stopped",
            Self::Updating => "Updating",
            Self::InstallingDependencies => "Installing dependencies",
            Self::Building => "Building",
            Self::Configuring => "Configuring",
            Self::AwaitingPeers => "Waiting for peers",
            Self::Starting => "Starting",
            Self::Settling => "Settling",
            Self::Online => "Online",
            Self::CollectingLogs => "Collecting logs",
            Self::Downloading => "Downloading",
            Self::Collected => "Collected",
            Self::Failed => "Failed",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Latest known state of one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStatus {
    pub phase: Phase,
    /// Free text shown instead of the bare phase label when non-empty.
    pub detail: String,
    /// Tail of the most recent command output, control sequences removed.
    pub output: String,
}

impl Default for HostStatus {
    fn default() -> Self {
        Self {
            phase: Phase::Waiting,
            detail: String::new(),
            output: String::new(),
        }
    }
}

impl HostStatus {
    /// Text shown on the status line.
    #[must_use]
    pub fn label(&self) -> String {
        if self.detail.is_empty() {
            self.phase.label().to_string()
        } else {
            self.detail.clone()
        }
    }
}

static CONTROL_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // Pattern is a compile-time constant
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("valid pattern")
});

/// Remove ANSI escape and terminal control sequences.
#[must_use]
pub fn strip_control_sequences(raw: &str) -> String {
    CONTROL_SEQUENCE.replace_all(raw, "").replace('\r', "")
}

/// Last `n` non-blank lines of `text`, joined with `\n`.
#[must_use]
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Prepare raw command output for the status registry.
#[must_use]
pub fn clean_output(raw: &str) -> String {
    tail_lines(&strip_control_sequences(raw), OUTPUT_TAIL_LINES)
}
