//! Shared per-host status, written by host workers and read by the monitor.
//!
//! A single mutex guards every entry. Critical sections are short and never
//! cross an `.await`, so a plain `std::sync::Mutex` is enough.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::ports::ProgressReporter;
use crate::domain::status::clean_output;
use crate::domain::{HostStatus, Phase};

/// Status of every host in the fleet, keyed by hostname.
#[derive(Debug)]
pub struct StatusRegistry {
    roster: Vec<String>,
    entries: Mutex<HashMap<String, HostStatus>>,
}

impl StatusRegistry {
    /// Registry with one `Waiting` entry per roster host.
    #[must_use]
    pub fn new<I, S>(roster: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roster: Vec<String> = roster.into_iter().map(Into::into).collect();
        let entries = roster
            .iter()
            .map(|host| (host.clone(), HostStatus::default()))
            .collect();
        Self {
            roster,
            entries: Mutex::new(entries),
        }
    }

    /// Overwrite the phase and detail of `host`.
    pub fn set_phase(&self, host: &str, phase: Phase, detail: &str) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(host) else {
            tracing::warn!(host, %phase, "status update for host outside the roster");
            return;
        };
        entry.phase = phase;
        entry.detail = detail.to_string();
        tracing::debug!(host, %phase, detail, "phase");
    }

    /// Replace the captured output of `host` with the tail of `text`.
    pub fn set_output(&self, host: &str, text: &str) {
        let cleaned = clean_output(text);
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(host) {
            entry.output = cleaned;
        }
    }

    /// Current status of one host.
    #[must_use]
    pub fn get(&self, host: &str) -> Option<HostStatus> {
        self.lock().get(host).cloned()
    }

    /// Consistent copy of every entry, in roster order.
    #[must_use]
    pub fn snapshot_all(&self) -> Vec<(String, HostStatus)> {
        let entries = self.lock();
        self.roster
            .iter()
            .filter_map(|host| entries.get(host).map(|s| (host.clone(), s.clone())))
            .collect()
    }

    /// Roster order used by snapshots.
    #[must_use]
    pub fn roster(&self) -> &[String] {
        &self.roster
    }

    /// Write handle bound to `host`.
    #[must_use]
    pub fn handle(self: &Arc<Self>, host: &str) -> HostStatusHandle {
        HostStatusHandle {
            registry: Arc::clone(self),
            host: host.to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, HostStatus>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The only way a worker writes status: every call targets its own host.
#[derive(Debug, Clone)]
pub struct HostStatusHandle {
    registry: Arc<StatusRegistry>,
    host: String,
}

impl HostStatusHandle {
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl ProgressReporter for HostStatusHandle {
    fn phase(&self, phase: Phase, detail: &str) {
        self.registry.set_phase(&self.host, phase, detail);
    }

    fn output(&self, text: &str) {
        self.registry.set_output(&self.host, text);
    }
}
