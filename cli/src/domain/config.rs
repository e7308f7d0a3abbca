//! Domain types for the fleet file.
//!
//! Pure data only, no I/O. Loading lives in
//! `crate::infra::config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::topology::{PortPlan, Variant};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level fleet file, usually `./fleet.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Full ordered roster. Order drives the monitor and the summary.
    pub hosts: Vec<HostEntry>,
    /// Hostname of the root controller.
    pub root: String,
    /// Mid-tier relays and the leaves each one owns.
    #[serde(default)]
    pub relays: Vec<RelayEntry>,
    /// Port offsets and strides for generated peer files.
    #[serde(default)]
    pub ports: PortPlan,
    /// Remote checkout layout and commands.
    pub remote: RemoteLayout,
    /// Per-variant startup scripts and entry points.
    #[serde(default)]
    pub launch: LaunchProfiles,
    /// Settle delay, barrier poll interval and monitor refresh.
    #[serde(default)]
    pub timing: Timing,
    /// Local directory receiving collected captures, logs and `fleet.log`.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
}

impl FleetConfig {
    /// Launch profile for the given variant.
    #[must_use]
    pub fn profile(&self, variant: Variant) -> &LaunchProfile {
        match variant {
            Variant::Flat => &self.launch.flat,
            Variant::Hierarchical => &self.launch.hierarchical,
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HostEntry {
    /// SSH hostname, e.g. `sp25-cs525-2501.cs.illinois.edu`.
    pub name: String,
    /// Address peers use to reach this host; written into peer files.
    pub address: String,
}

/// A relay and its owned leaves, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RelayEntry {
    pub host: String,
    #[serde(default)]
    pub leaves: Vec<String>,
}

/// Where things live on every host and which commands build them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteLayout {
    /// Shared parent directory, created and group-owned on first deploy.
    #[serde(default = "default_deploy_root")]
    pub deploy_root: String,
    /// Git checkout of the application repository.
    #[serde(default = "default_checkout_dir")]
    pub checkout_dir: String,
    /// Repository cloned into `checkout_dir`.
    pub repository: String,
    /// Unix group given write access to `deploy_root`.
    #[serde(default = "default_group")]
    pub group: String,
    /// Application directory inside the checkout.
    #[serde(default = "default_app_dir")]
    pub app_dir: String,
    #[serde(default = "default_prerequisites")]
    pub prerequisites: String,
    #[serde(default = "default_install_command")]
    pub install_command: String,
    #[serde(default = "default_build_command")]
    pub build_command: String,
    /// Process killed during teardown.
    #[serde(default = "default_process_name")]
    pub process_name: String,
    /// Application state cleared during teardown.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    #[serde(default = "default_capture_process")]
    pub capture_process: String,
    #[serde(default = "default_capture_interface")]
    pub capture_interface: String,
}

impl RemoteLayout {
    /// `<checkout>/<app_dir>`.
    #[must_use]
    pub fn app_path(&self) -> String {
        format!("{}/{}", self.checkout_dir, self.app_dir)
    }

    /// `<checkout>/<app_dir>/packages/<package>`.
    #[must_use]
    pub fn package_path(&self, package: &str) -> String {
        format!("{}/packages/{package}", self.app_path())
    }

    /// Remote path of the capture file for a host short name.
    #[must_use]
    pub fn capture_path(&self, short_name: &str) -> String {
        format!("{}/tcpdump_{short_name}.pcap", self.checkout_dir)
    }
}

/// Startup settings for both topology variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaunchProfiles {
    #[serde(default = "LaunchProfile::flat")]
    pub flat: LaunchProfile,
    #[serde(default = "LaunchProfile::hierarchical")]
    pub hierarchical: LaunchProfile,
}

impl Default for LaunchProfiles {
    fn default() -> Self {
        Self {
            flat: LaunchProfile::flat(),
            hierarchical: LaunchProfile::hierarchical(),
        }
    }
}

/// What each tier starts for one variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LaunchProfile {
    /// Package directory under `<app_dir>/packages`.
    pub package: String,
    /// Controller script under `<package>/dist/esm`.
    pub root_entry: String,
    #[serde(default)]
    pub relay_scripts: Vec<String>,
    #[serde(default)]
    pub leaf_scripts: Vec<String>,
}

impl LaunchProfile {
    fn flat() -> Self {
        Self {
            package: "cs525-baseline".to_string(),
            root_entry: "ControllerNode.js".to_string(),
            relay_scripts: Vec::new(),
            leaf_scripts: vec!["startup.sh".to_string()],
        }
    }

    fn hierarchical() -> Self {
        Self {
            package: "cs525".to_string(),
            root_entry: "RootControllerNode.js".to_string(),
            relay_scripts: vec!["startup_level1_vmb.sh".to_string()],
            leaf_scripts: vec![
                "startup_endnodes.sh".to_string(),
                "startup_level2_vmb.sh".to_string(),
            ],
        }
    }
}

/// Delays and cadences, all in milliseconds except `settle_secs`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Timing {
    /// Pause after each startup script before moving on.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Readiness barrier poll interval.
    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,
    /// Monitor redraw cadence.
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
    /// Bound on establishing each ssh connection. Remote commands are unbounded.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_secs: default_settle_secs(),
            poll_interval_ms: default_poll_ms(),
            refresh_ms: default_refresh_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_deploy_root() -> String {
    "/opt/matter".to_string()
}

fn default_checkout_dir() -> String {
    "/opt/matter/cs525-G25".to_string()
}

fn default_group() -> String {
    "csvm525-stu".to_string()
}

fn default_app_dir() -> String {
    "matter.js".to_string()
}

fn default_prerequisites() -> String {
    "dnf install -y tmux".to_string()
}

fn default_install_command() -> String {
    "npm ci".to_string()
}

fn default_build_command() -> String {
    "npm run build".to_string()
}

fn default_process_name() -> String {
    "node".to_string()
}

fn default_cache_dir() -> String {
    "~/.matter".to_string()
}

fn default_capture_process() -> String {
    "tcpdump".to_string()
}

fn default_capture_interface() -> String {
    "any".to_string()
}

fn default_settle_secs() -> u64 {
    10
}

fn default_poll_ms() -> u64 {
    1000
}

fn default_refresh_ms() -> u64 {
    1000
}

fn default_connect_timeout_secs() -> u64 {
    10
}
