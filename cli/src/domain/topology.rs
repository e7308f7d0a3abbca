//! Static fleet topology: roster, tier roles, readiness tokens and the port plan.
//!
//! Everything here is computed once from the fleet file and never changes
//! during a run. Tier derivation lives in exactly one place
//! (`Topology::tier_of`) so the workflow and peer-file generation cannot drift.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::config::FleetConfig;
use crate::domain::error::TopologyError;

// ── Tiers and variants ────────────────────────────────────────────────────────

/// Role of a host in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Root,
    Relay,
    Leaf,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Root => "root",
            Self::Relay => "relay",
            Self::Leaf => "leaf",
        })
    }
}

/// Which topology the run deploys.
///
/// `Flat` is the baseline: the root plus every other host as a leaf.
/// `Hierarchical` inserts the relay tier between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Flat,
    Hierarchical,
}

/// Marker published by a host once its processes are up.
///
/// `index` is the host's roster position, so two hosts never share a token
/// whatever their names look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadinessToken {
    pub tier: Tier,
    pub index: u32,
}

impl fmt::Display for ReadinessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tier, self.index)
    }
}

// ── Hosts ─────────────────────────────────────────────────────────────────────

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    name: String,
    address: String,
}

impl Host {
    #[must_use]
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// First DNS label, e.g. `sp25-cs525-2501`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

/// First DNS label of a hostname.
#[must_use]
pub fn short_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

// ── Port plan ─────────────────────────────────────────────────────────────────

/// Fixed offsets and strides used to derive every listening port.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct PortPlan {
    /// Relay `r` listens for the root on `relay_base + r`.
    pub relay_base: u32,
    /// First port of the leaf-slot range.
    pub leaf_slot_base: u32,
    /// Ports reserved per relay in the leaf-slot range.
    pub relay_stride: u32,
    /// Listening slots per leaf.
    pub slots_per_leaf: u32,
    /// First port of the endpoint range.
    pub endpoint_base: u32,
    /// Endpoints behind each leaf slot.
    pub endpoints_per_slot: u32,
}

impl Default for PortPlan {
    fn default() -> Self {
        Self {
            relay_base: 3100,
            leaf_slot_base: 3200,
            relay_stride: 8,
            slots_per_leaf: 2,
            endpoint_base: 3300,
            endpoints_per_slot: 10,
        }
    }
}

impl PortPlan {
    #[must_use]
    pub fn relay_north(&self, relay: u32) -> u32 {
        self.relay_base.saturating_add(relay)
    }

    #[must_use]
    pub fn leaf_slot(&self, relay: u32, leaf: u32, slot: u32) -> u32 {
        self.leaf_slot_base
            .saturating_add(relay.saturating_mul(self.relay_stride))
            .saturating_add(leaf.saturating_mul(self.slots_per_leaf))
            .saturating_add(slot)
    }

    #[must_use]
    pub fn endpoint(&self, fleet_leaf: u32, slot: u32, endpoint: u32) -> u32 {
        let per_leaf = self.slots_per_leaf.saturating_mul(self.endpoints_per_slot);
        self.endpoint_base
            .saturating_add(fleet_leaf.saturating_mul(per_leaf))
            .saturating_add(slot.saturating_mul(self.endpoints_per_slot))
            .saturating_add(endpoint)
    }
}

/// What a port is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSlot {
    /// Relay listening for the root.
    RelayNorth,
    /// Leaf slot listening for its relay.
    LeafSlot { slot: u32 },
    /// Endpoint behind a leaf slot.
    Endpoint { slot: u32, endpoint: u32 },
}

/// One concrete `(host, slot) -> port` assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortAssignment {
    pub host: String,
    pub slot: PortSlot,
    pub port: u16,
}

// ── Topology ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Relay {
    host: usize,
    leaves: Vec<usize>,
}

/// Validated, immutable fleet topology.
#[derive(Debug, Clone)]
pub struct Topology {
    hosts: Vec<Host>,
    root: usize,
    relays: Vec<Relay>,
    ports: PortPlan,
    assignments: Vec<PortAssignment>,
}

impl Topology {
    /// Build and validate the topology described by a fleet file.
    ///
    /// # Errors
    ///
    /// Returns a `TopologyError` if any membership or port invariant fails.
    pub fn from_config(cfg: &FleetConfig) -> Result<Self, TopologyError> {
        if cfg.hosts.is_empty() {
            return Err(TopologyError::EmptyRoster);
        }

        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut hosts = Vec::with_capacity(cfg.hosts.len());
        for (pos, entry) in cfg.hosts.iter().enumerate() {
            if positions.insert(entry.name.as_str(), pos).is_some() {
                return Err(TopologyError::DuplicateHost(entry.name.clone()));
            }
            hosts.push(Host::new(&entry.name, &entry.address));
        }

        let lookup = |role: &'static str, name: &str| {
            positions
                .get(name)
                .copied()
                .ok_or_else(|| TopologyError::UnknownHost {
                    role,
                    name: name.to_string(),
                })
        };

        let root = lookup("Root", &cfg.root)?;
        let mut roles: HashMap<usize, Tier> = HashMap::from([(root, Tier::Root)]);
        let mut relays = Vec::with_capacity(cfg.relays.len());
        for entry in &cfg.relays {
            let host = lookup("Relay", &entry.host)?;
            claim(&mut roles, &hosts, host, Tier::Relay)?;
            let mut leaves = Vec::with_capacity(entry.leaves.len());
            for leaf in &entry.leaves {
                let pos = lookup("Leaf", leaf)?;
                claim(&mut roles, &hosts, pos, Tier::Leaf)?;
                leaves.push(pos);
            }
            relays.push(Relay { host, leaves });
        }

        if !relays.is_empty() {
            if let Some(host) = (0..hosts.len()).find(|pos| !roles.contains_key(pos)) {
                return Err(TopologyError::Unassigned(hosts[host].name.clone()));
            }
        }

        let mut topology = Self {
            hosts,
            root,
            relays,
            ports: cfg.ports,
            assignments: Vec::new(),
        };
        topology.assignments = topology.assign_ports()?;
        Ok(topology)
    }

    /// Reject variants the fleet file cannot express.
    ///
    /// # Errors
    ///
    /// Returns `TopologyError::NoRelays` for `Hierarchical` without relays.
    pub fn supports(&self, variant: Variant) -> Result<(), TopologyError> {
        if variant == Variant::Hierarchical && self.relays.is_empty() {
            return Err(TopologyError::NoRelays);
        }
        Ok(())
    }

    /// Full roster in fleet-file order.
    #[must_use]
    pub fn roster(&self) -> &[Host] {
        &self.hosts
    }

    #[must_use]
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.position(name).map(|pos| &self.hosts[pos])
    }

    #[must_use]
    pub fn root(&self) -> &Host {
        &self.hosts[self.root]
    }

    /// Tier of `name` under `variant`, or `None` for hosts outside the roster.
    #[must_use]
    pub fn tier_of(&self, name: &str, variant: Variant) -> Option<Tier> {
        let pos = self.position(name)?;
        if pos == self.root {
            return Some(Tier::Root);
        }
        match variant {
            Variant::Flat => Some(Tier::Leaf),
            Variant::Hierarchical => {
                if self.relays.iter().any(|r| r.host == pos) {
                    Some(Tier::Relay)
                } else if self.relays.iter().any(|r| r.leaves.contains(&pos)) {
                    Some(Tier::Leaf)
                } else {
                    None
                }
            }
        }
    }

    /// Relays in fleet-file order; empty for `Flat`.
    #[must_use]
    pub fn relays(&self, variant: Variant) -> Vec<&Host> {
        match variant {
            Variant::Flat => Vec::new(),
            Variant::Hierarchical => self.relays.iter().map(|r| &self.hosts[r.host]).collect(),
        }
    }

    /// Leaves in fleet order (relay order, then each relay's leaf order).
    #[must_use]
    pub fn leaves(&self, variant: Variant) -> Vec<&Host> {
        match variant {
            Variant::Flat => self
                .hosts
                .iter()
                .enumerate()
                .filter(|(pos, _)| *pos != self.root)
                .map(|(_, host)| host)
                .collect(),
            Variant::Hierarchical => self
                .relays
                .iter()
                .flat_map(|r| r.leaves.iter().map(|&pos| &self.hosts[pos]))
                .collect(),
        }
    }

    /// Leaves owned by the relay `name`, in order.
    #[must_use]
    pub fn leaves_of(&self, name: &str) -> Vec<&Host> {
        let Some(pos) = self.position(name) else {
            return Vec::new();
        };
        self.relays
            .iter()
            .find(|r| r.host == pos)
            .map(|r| r.leaves.iter().map(|&l| &self.hosts[l]).collect())
            .unwrap_or_default()
    }

    /// Relay that owns the leaf `name`.
    #[must_use]
    pub fn owner_of(&self, name: &str) -> Option<&Host> {
        let pos = self.position(name)?;
        self.relays
            .iter()
            .find(|r| r.leaves.contains(&pos))
            .map(|r| &self.hosts[r.host])
    }

    /// Number of readiness tokens `name` must observe before starting.
    ///
    /// The root waits for every leaf and relay, a relay for every leaf in the
    /// fleet, and a leaf for nothing.
    #[must_use]
    pub fn barrier_threshold(&self, name: &str, variant: Variant) -> Option<usize> {
        match self.tier_of(name, variant)? {
            Tier::Root => Some(self.leaves(variant).len() + self.relays(variant).len()),
            Tier::Relay => Some(self.leaves(variant).len()),
            Tier::Leaf => None,
        }
    }

    /// Token published by `name` once started.
    #[must_use]
    pub fn token_for(&self, name: &str, variant: Variant) -> Option<ReadinessToken> {
        let tier = self.tier_of(name, variant)?;
        let index = u32::try_from(self.position(name)?).ok()?;
        Some(ReadinessToken { tier, index })
    }

    #[must_use]
    pub fn port_plan(&self) -> &PortPlan {
        &self.ports
    }

    /// Every `(host, slot) -> port` assignment of the hierarchical layout.
    #[must_use]
    pub fn port_assignments(&self) -> &[PortAssignment] {
        &self.assignments
    }

    /// Port assigned to `slot` on `name`.
    #[must_use]
    pub fn port_for(&self, name: &str, slot: PortSlot) -> Option<u16> {
        self.assignments
            .iter()
            .find(|a| a.host == name && a.slot == slot)
            .map(|a| a.port)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.hosts.iter().position(|h| h.name == name)
    }

    fn assign_ports(&self) -> Result<Vec<PortAssignment>, TopologyError> {
        let plan = &self.ports;
        let mut wanted: Vec<(usize, PortSlot, u32)> = Vec::new();
        let mut fleet_leaf = 0_u32;
        for (r, relay) in (0_u32..).zip(&self.relays) {
            wanted.push((relay.host, PortSlot::RelayNorth, plan.relay_north(r)));
            for (l, &leaf) in (0_u32..).zip(&relay.leaves) {
                for slot in 0..plan.slots_per_leaf {
                    wanted.push((leaf, PortSlot::LeafSlot { slot }, plan.leaf_slot(r, l, slot)));
                    for endpoint in 0..plan.endpoints_per_slot {
                        wanted.push((
                            leaf,
                            PortSlot::Endpoint { slot, endpoint },
                            plan.endpoint(fleet_leaf, slot, endpoint),
                        ));
                    }
                }
                fleet_leaf += 1;
            }
        }

        let mut seen: HashMap<u16, String> = HashMap::new();
        let mut out = Vec::with_capacity(wanted.len());
        for (pos, slot, raw) in wanted {
            let host = self.hosts[pos].name.clone();
            let port = u16::try_from(raw).map_err(|_| TopologyError::PortOutOfRange {
                host: host.clone(),
                port: raw,
            })?;
            let label = format!("{host} {slot:?}");
            if let Some(first) = seen.insert(port, label.clone()) {
                return Err(TopologyError::PortCollision {
                    port,
                    first,
                    second: label,
                });
            }
            out.push(PortAssignment { host, slot, port });
        }
        Ok(out)
    }
}

fn claim(
    roles: &mut HashMap<usize, Tier>,
    hosts: &[Host],
    pos: usize,
    tier: Tier,
) -> Result<(), TopologyError> {
    if roles.insert(pos, tier).is_some() {
        return Err(TopologyError::MultipleRoles(hosts[pos].name.clone()));
    }
    Ok(())
}
