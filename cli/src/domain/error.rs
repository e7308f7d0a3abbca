//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Topology errors ───────────────────────────────────────────────────────────

/// Errors raised while loading and validating the static fleet topology.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Fleet roster is empty.")]
    EmptyRoster,

    #[error("Host '{0}' appears more than once in the roster.")]
    DuplicateHost(String),

    #[error("{role} '{name}' is not in the roster.")]
    UnknownHost { role: &'static str, name: String },

    #[error("Host '{0}' is assigned more than one tier.")]
    MultipleRoles(String),

    #[error("Host '{0}' has no tier: it is neither the root, a relay, nor a leaf owned by a relay.")]
    Unassigned(String),

    #[error("Port {port} is assigned to both {first} and {second}.")]
    PortCollision {
        port: u16,
        first: String,
        second: String,
    },

    #[error("Port {port} computed for {host} does not fit in 16 bits.")]
    PortOutOfRange { host: String, port: u32 },

    #[error("The hierarchical variant needs at least one relay in the fleet file.")]
    NoRelays,
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Failures of the remote-execution channel itself.
///
/// A remote command that runs and exits non-zero is NOT a session error; it is
/// reported through `CommandOutcome::succeeded`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("authentication failed for {user}@{host}")]
    Auth { host: String, user: String },

    #[error("cannot connect to {host}: {message}")]
    Connect { host: String, message: String },

    #[error("connection to {host} lost: {message}")]
    Transport { host: String, message: String },

    #[error("transfer {from} -> {to} failed: {message}")]
    Transfer {
        from: String,
        to: String,
        message: String,
    },
}

// ── Workflow errors ───────────────────────────────────────────────────────────

/// A remote step whose failure ends the host's workflow.
///
/// The display text is the status label shown to the operator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to {0}")]
pub struct StepFailure(pub String);

/// Why a host workflow stopped before reaching its terminal phase.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Step(#[from] StepFailure),

    #[error("Error: {0}")]
    Session(#[from] SessionError),
}
