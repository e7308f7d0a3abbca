//! Domain layer: pure fleet logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod peers;
pub mod status;
pub mod topology;

pub use config::{FleetConfig, HostEntry, LaunchProfile, RelayEntry, RemoteLayout, Timing};
pub use error::{SessionError, StepFailure, TopologyError, WorkflowError};
pub use status::{HostStatus, Phase, Tone};
pub use topology::{Host, ReadinessToken, Tier, Topology, Variant};

/// What a run does to every host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Sync, build, configure and start (default).
    Deploy,
    /// Tear down and start again without syncing or building.
    Restart,
    /// Tear down only.
    Stop,
}
