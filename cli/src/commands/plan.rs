//! `fleet --dry-run`: show tiers, barrier thresholds and ports without
//! connecting anywhere.

use std::path::PathBuf;

use anyhow::Result;

use crate::app::AppContext;
use crate::domain::peers::peer_files;
use crate::domain::topology::PortAssignment;
use crate::domain::{Tier, Topology, Variant};

/// Run `fleet --dry-run`.
///
/// # Errors
///
/// Returns an error if the fleet file is missing or invalid.
pub fn run(app: &AppContext, config: Option<PathBuf>, variant: Variant) -> Result<()> {
    let fleet = super::load_fleet(config, variant)?;
    let out = &app.output;
    let topology = &fleet.topology;

    out.header("Fleet plan");
    out.kv("fleet file", &fleet.path.display().to_string());
    out.kv("variant", &format!("{variant:?}").to_lowercase());
    out.kv("package", &fleet.config.profile(variant).package);
    println!();
    for line in host_lines(topology, variant) {
        println!("  {line}");
    }
    Ok(())
}

/// One line per host: tier, wait threshold, peer files and ports.
#[must_use]
pub fn host_lines(topology: &Topology, variant: Variant) -> Vec<String> {
    topology
        .roster()
        .iter()
        .map(|host| {
            let tier = topology
                .tier_of(host.name(), variant)
                .map_or_else(|| "idle".to_string(), |t| t.to_string());
            let mut line = format!("{:<40} {tier:<6}", host.name());
            if let Some(min) = topology.barrier_threshold(host.name(), variant) {
                line.push_str(&format!(" waits for {min}"));
            }
            if let Some(Tier::Relay) = topology.tier_of(host.name(), variant) {
                let owned = topology.leaves_of(host.name()).len();
                line.push_str(&format!(" owns {owned}"));
            }
            if let Some(relay) = topology
                .owner_of(host.name())
                .filter(|_| variant == Variant::Hierarchical)
            {
                line.push_str(&format!(" under {}", relay.name()));
            }
            let files: Vec<String> = peer_files(topology, host.name(), variant)
                .into_iter()
                .map(|f| f.file_name)
                .collect();
            if !files.is_empty() {
                line.push_str(&format!(" files [{}]", files.join(", ")));
            }
            let ports = ports_of(topology.port_assignments(), host.name());
            if variant == Variant::Hierarchical && !ports.is_empty() {
                line.push_str(&format!(" ports {ports}"));
            }
            line
        })
        .collect()
}

/// Port range of `host`, e.g. `3200-3201` or `3100`.
fn ports_of(assignments: &[PortAssignment], host: &str) -> String {
    let mut ports: Vec<u16> = assignments
        .iter()
        .filter(|a| a.host == host)
        .map(|a| a.port)
        .collect();
    ports.sort_unstable();
    match (ports.first(), ports.last()) {
        (Some(first), Some(last)) if first == last => first.to_string(),
        (Some(first), Some(last)) => format!("{first}-{last}"),
        _ => String::new(),
    }
}
