//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, remote
//! sessions over OpenSSH, fleet file loading and log setup.
//!
//! Imports from `crate::domain` and `crate::application` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod logging;
pub mod ssh;

pub use command_runner::TokioCommandRunner;
pub use config::YamlConfigStore;
pub use ssh::{OpenSshConnector, OpenSshSession};
