//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod barrier;
pub mod ports;
pub mod registry;
pub mod services;

pub use barrier::ReadinessBarrier;
pub use ports::{
    CommandOutcome, CommandRunner, ConfigStore, Credentials, ProgressReporter, RemoteSession,
    SessionConnector,
};
pub use registry::{HostStatusHandle, StatusRegistry};
