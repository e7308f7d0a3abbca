//! Property-based tests for topology invariants.
//!
//! Uses `proptest` to generate random fleets and check that tiers, ports and
//! peer files stay consistent.

#![allow(clippy::expect_used)]

use std::collections::HashSet;

use proptest::prelude::*;

use fleet_cli::domain::error::TopologyError;
use fleet_cli::domain::peers::peer_files;
use fleet_cli::domain::{Tier, Topology, Variant};

use crate::helpers::{config, fleet_yaml, host};

/// Relay layout: leaves per relay, hosts numbered from 2 upward.
fn layout(leaf_counts: &[u32]) -> Vec<(u32, Vec<u32>)> {
    let mut next = 2;
    leaf_counts
        .iter()
        .map(|&count| {
            let relay = next;
            let leaves: Vec<u32> = (relay + 1..=relay + count).collect();
            next = relay + count + 1;
            (relay, leaves)
        })
        .collect()
}

fn topology(leaf_counts: &[u32]) -> Result<Topology, TopologyError> {
    Topology::from_config(&config(&fleet_yaml(1, &layout(leaf_counts), "")))
}

proptest! {
    /// With at most four leaves per relay the default plan never collides,
    /// and every assigned port is distinct.
    #[test]
    fn prop_port_assignment_is_injective(counts in prop::collection::vec(0u32..=4, 1..8)) {
        let topo = topology(&counts).expect("fits default plan");
        let ports: Vec<u16> = topo.port_assignments().iter().map(|a| a.port).collect();
        let unique: HashSet<u16> = ports.iter().copied().collect();
        prop_assert_eq!(unique.len(), ports.len());
    }

    /// Larger fleets either validate with distinct ports or are rejected
    /// with a collision; never accepted with a duplicate.
    #[test]
    fn prop_collisions_are_rejected(counts in prop::collection::vec(0u32..=8, 1..6)) {
        match topology(&counts) {
            Ok(topo) => {
                let ports: Vec<u16> = topo.port_assignments().iter().map(|a| a.port).collect();
                let unique: HashSet<u16> = ports.iter().copied().collect();
                prop_assert_eq!(unique.len(), ports.len());
            }
            Err(e) => prop_assert!(matches!(e, TopologyError::PortCollision { .. }), "{e}"),
        }
    }

    /// Every host has exactly one tier; counts match the fleet file.
    #[test]
    fn prop_tiers_partition_the_roster(counts in prop::collection::vec(0u32..=4, 1..8)) {
        let topo = topology(&counts).expect("valid");
        let tiers: Vec<Tier> = topo
            .roster()
            .iter()
            .map(|h| topo.tier_of(h.name(), Variant::Hierarchical).expect("has tier"))
            .collect();
        let leaves = tiers.iter().filter(|t| **t == Tier::Leaf).count();
        let relays = tiers.iter().filter(|t| **t == Tier::Relay).count();
        prop_assert_eq!(tiers.iter().filter(|t| **t == Tier::Root).count(), 1);
        prop_assert_eq!(relays, counts.len());
        prop_assert_eq!(leaves, counts.iter().sum::<u32>() as usize);
        prop_assert_eq!(
            topo.barrier_threshold(&host(1), Variant::Hierarchical),
            Some(leaves + relays)
        );
    }

    /// Each relay's south entries match the north of its leaves' slot files.
    #[test]
    fn prop_relay_and_leaf_files_agree(counts in prop::collection::vec(1u32..=4, 1..5)) {
        let topo = topology(&counts).expect("valid");
        for relay in topo.relays(Variant::Hierarchical) {
            let files = peer_files(&topo, relay.name(), Variant::Hierarchical);
            let south = &files[0].contents.south;
            for leaf in topo.leaves_of(relay.name()) {
                for slot_file in peer_files(&topo, leaf.name(), Variant::Hierarchical) {
                    let north = slot_file.contents.north.expect("leaf north");
                    prop_assert!(
                        south.iter().any(|p| p.ip == north.ip && p.port == north.port),
                        "{} missing {}:{}", relay.name(), north.ip, north.port
                    );
                }
            }
        }
    }
}
