//! Generated peer files: the JSON each host reads to find its north (upstream)
//! and south (downstream) peers.
//!
//! Tier is taken from `Topology::tier_of`, the same function the workflow
//! uses, so a host never receives a file for a role it does not play.

use serde::{Deserialize, Serialize};

use crate::domain::topology::{PortSlot, Tier, Topology, Variant};

/// Address a host listens on for its upstream peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NorthPeer {
    pub ip: String,
    pub port: u16,
}

/// One downstream peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SouthPeer {
    pub name: String,
    pub ip: String,
    pub port: u16,
}

/// Document written to `<package>/<file_name>` on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north: Option<NorthPeer>,
    pub south: Vec<SouthPeer>,
}

/// A peer file together with its remote file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPeerFile {
    pub file_name: String,
    pub contents: PeerFile,
}

impl NamedPeerFile {
    /// Pretty JSON with four-space indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.contents.serialize(&mut ser)?;
        Ok(buf)
    }
}

/// Peer files to install on `name` before it starts.
///
/// * root: one `south` entry per relay (none in the flat variant);
/// * relay: its own north port and two `south` entries per owned leaf;
/// * leaf (hierarchical only): one file per slot listing that slot's endpoints.
#[must_use]
pub fn peer_files(topology: &Topology, name: &str, variant: Variant) -> Vec<NamedPeerFile> {
    match topology.tier_of(name, variant) {
        Some(Tier::Root) => root_files(topology, variant),
        Some(Tier::Relay) => relay_files(topology, name),
        Some(Tier::Leaf) if variant == Variant::Hierarchical => leaf_files(topology, name),
        _ => Vec::new(),
    }
}

fn root_files(topology: &Topology, variant: Variant) -> Vec<NamedPeerFile> {
    let south: Vec<SouthPeer> = topology
        .relays(variant)
        .into_iter()
        .filter_map(|relay| {
            let port = topology.port_for(relay.name(), PortSlot::RelayNorth)?;
            Some(SouthPeer {
                name: format!("level_1_vmb_{}", relay.name()),
                ip: relay.address().to_string(),
                port,
            })
        })
        .collect();
    if south.is_empty() {
        return Vec::new();
    }
    vec![NamedPeerFile {
        file_name: "root_config.json".to_string(),
        contents: PeerFile { north: None, south },
    }]
}

fn relay_files(topology: &Topology, name: &str) -> Vec<NamedPeerFile> {
    let Some(relay) = topology.host(name) else {
        return Vec::new();
    };
    let slots = topology.port_plan().slots_per_leaf;
    let north = topology
        .port_for(name, PortSlot::RelayNorth)
        .map(|port| NorthPeer {
            ip: relay.address().to_string(),
            port,
        });
    let mut south = Vec::new();
    for leaf in topology.leaves_of(name) {
        for slot in 0..slots {
            if let Some(port) = topology.port_for(leaf.name(), PortSlot::LeafSlot { slot }) {
                south.push(SouthPeer {
                    name: format!("level_2_vmb_{}_{}", leaf.name(), slot + 1),
                    ip: leaf.address().to_string(),
                    port,
                });
            }
        }
    }
    vec![NamedPeerFile {
        file_name: "vmb_level_1_config.json".to_string(),
        contents: PeerFile { north, south },
    }]
}

fn leaf_files(topology: &Topology, name: &str) -> Vec<NamedPeerFile> {
    let Some(leaf) = topology.host(name) else {
        return Vec::new();
    };
    let plan = topology.port_plan();
    (0..plan.slots_per_leaf)
        .map(|slot| {
            let north = topology
                .port_for(name, PortSlot::LeafSlot { slot })
                .map(|port| NorthPeer {
                    ip: leaf.address().to_string(),
                    port,
                });
            let south = (0..plan.endpoints_per_slot)
                .filter_map(|endpoint| {
                    let port = topology.port_for(name, PortSlot::Endpoint { slot, endpoint })?;
                    Some(SouthPeer {
                        name: format!("endpoint_{}_{}_{endpoint}", leaf.name(), slot + 1),
                        ip: leaf.address().to_string(),
                        port,
                    })
                })
                .collect();
            NamedPeerFile {
                file_name: format!("vmb_level_2_config_{}.json", slot + 1),
                contents: PeerFile { north, south },
            }
        })
        .collect()
}
