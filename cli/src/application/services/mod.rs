//! Application services: use-case orchestration.
//!
//! Each service module implements one part of the per-host workflow by
//! composing domain logic with port trait calls. Services import only from
//! `crate::domain` and `crate::application`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod collect;
pub mod context;
pub mod fleet;
pub mod setup;
pub mod startup;
pub mod teardown;
pub mod workflow;

pub use context::{FleetPlan, HostContext, Shell};
pub use fleet::Fleet;
