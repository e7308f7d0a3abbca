//! End-to-end workflow scenarios against fake sessions.
//!
//! Time is paused, so settle delays and barrier polls cost nothing. Runs
//! that can never finish (a missing peer) are observed after a long sleep
//! instead of awaited.

#![allow(clippy::expect_used)]

use std::time::Duration;

use fleet_cli::application::services::Fleet;
use fleet_cli::domain::peers::PeerFile;
use fleet_cli::domain::{Action, HostStatus, Phase, Variant};

use crate::helpers::{fleet_yaml, host, plan, small_hierarchy};
use crate::mocks::{FakeConnector, Script};

/// Long enough for every unblocked worker to finish several times over.
const SETTLE_ALL: Duration = Duration::from_secs(600);

fn status(fleet: &Fleet<FakeConnector>, n: u32) -> HostStatus {
    fleet.registry().get(&host(n)).expect("host in roster")
}

#[tokio::test(start_paused = true)]
async fn test_hierarchy_of_seven_reaches_online_in_tier_order() {
    let connector = FakeConnector::new();
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&small_hierarchy(), Variant::Hierarchical), connector);

    fleet.launch(Action::Deploy);
    fleet.wait().await;

    for n in 1..=7 {
        assert_eq!(status(&fleet, n).phase, Phase::Online, "{}", host(n));
    }
    assert_eq!(fleet.barrier().len(), 6, "four leaves and two relays publish");

    let controller = journal
        .position(&host(1), "--storage-clear")
        .expect("root started controller");
    for relay in [2, 3] {
        let relay_start = journal
            .position(&host(relay), "startup_level1_vmb.sh")
            .expect("relay started");
        assert!(relay_start < controller);
        for leaf in [4, 5, 6, 7] {
            let leaf_start = journal
                .position(&host(leaf), "startup_level2_vmb.sh")
                .expect("leaf started");
            assert!(leaf_start < relay_start, "relay started before leaf {leaf}");
        }
    }

    assert!(status(&fleet, 1).output.contains("RootControllerNode.js"));
    assert_eq!(journal.closed().len(), 7, "every session closed");
}

#[tokio::test(start_paused = true)]
async fn test_root_waits_for_sixth_token() {
    // Relay h03 loses its connection while starting, so only 5 of 6 publish.
    let connector = FakeConnector::new().script(
        &host(3),
        Script::default().broken("startup_level1_vmb.sh"),
    );
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&small_hierarchy(), Variant::Hierarchical), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    let relay = status(&fleet, 3);
    assert_eq!(relay.phase, Phase::Error);
    assert!(relay.detail.starts_with("Error: connection to h03.lab lost"));

    let root = status(&fleet, 1);
    assert_eq!(root.phase, Phase::AwaitingPeers);
    assert_eq!(root.detail, "5/6 started (4 leaf, 1 relay)");
    assert!(journal.position(&host(1), "--storage-clear").is_none());
    assert!(journal.closed().contains(&host(3)), "failed host still closes");
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_leaf_strands_upstream_tiers() {
    let connector = FakeConnector::new().unreachable(&host(7));
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&small_hierarchy(), Variant::Hierarchical), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    let leaf = status(&fleet, 7);
    assert_eq!(leaf.phase, Phase::Error);
    assert_eq!(leaf.detail, "Error: cannot connect to h07.lab: No route to host");
    for n in [4, 5, 6] {
        assert_eq!(status(&fleet, n).phase, Phase::Online, "{}", host(n));
    }
    for n in [2, 3] {
        let relay = status(&fleet, n);
        assert_eq!(relay.phase, Phase::AwaitingPeers);
        assert_eq!(relay.detail, "3/4 started");
    }
    assert_eq!(status(&fleet, 1).phase, Phase::AwaitingPeers);
    assert!(journal.position(&host(1), "--storage-clear").is_none());
    assert!(!fleet.is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_login_is_an_error_for_that_host_only() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let connector = FakeConnector::new().rejecting(&host(2));
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Stop);
    fleet.wait().await;

    assert_eq!(
        status(&fleet, 2).detail,
        "Error: authentication failed for tester@h02.lab"
    );
    assert_eq!(status(&fleet, 1).phase, Phase::Stopped);
    assert_eq!(status(&fleet, 3).phase, Phase::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_failed_build_stops_that_host() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let connector = FakeConnector::new().script(&host(3), Script::default().failing("npm run build"));
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    let leaf = status(&fleet, 3);
    assert_eq!(leaf.phase, Phase::Failed);
    assert_eq!(leaf.detail, "Failed to build application");
    assert_eq!(leaf.output, "command failed");
    assert!(journal.position(&host(3), "tmux new-session").is_none());
    assert!(journal.closed().contains(&host(3)));
    assert_eq!(status(&fleet, 2).phase, Phase::Online);
    assert_eq!(status(&fleet, 1).detail, "1/2 started");
}

#[tokio::test(start_paused = true)]
async fn test_flat_deploy_uses_baseline_profile() {
    let yaml = fleet_yaml(1, &[(2, vec![3, 4])], "");
    let connector = FakeConnector::new();
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Deploy);
    fleet.wait().await;

    for n in 1..=4 {
        assert_eq!(status(&fleet, n).phase, Phase::Online);
        assert!(journal.uploads_to(&host(n)).is_empty(), "flat installs no peer files");
    }
    let leaf = journal.commands_on(&host(2));
    assert!(leaf.iter().any(|c| c.contains("packages/cs525-baseline/startup.sh")));
    assert!(leaf.iter().any(|c| c.contains("tcpdump -i any -U -w /opt/matter/cs525-G25/tcpdump_h02.pcap")));
    let root = journal.commands_on(&host(1));
    assert!(root.iter().any(|c| c.contains("cs525-baseline/dist/esm/ControllerNode.js")));
}

#[tokio::test(start_paused = true)]
async fn test_hierarchical_configure_installs_peer_files() {
    let connector = FakeConnector::new();
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&small_hierarchy(), Variant::Hierarchical), connector);

    fleet.launch(Action::Deploy);
    fleet.wait().await;

    let package = "/opt/matter/cs525-G25/matter.js/packages/cs525";
    let root = journal.uploads_to(&host(1));
    assert_eq!(root.len(), 1);
    assert_eq!(root[0].0, format!("{package}/root_config.json"));
    let root_file: PeerFile = serde_json::from_slice(&root[0].1).expect("json");
    assert_eq!(root_file.south.len(), 2);

    let relay = journal.uploads_to(&host(3));
    assert_eq!(relay[0].0, format!("{package}/vmb_level_1_config.json"));
    let relay_file: PeerFile = serde_json::from_slice(&relay[0].1).expect("json");
    assert_eq!(relay_file.north.expect("north").port, root_file.south[1].port);

    let leaf: Vec<String> = journal.uploads_to(&host(6)).into_iter().map(|(p, _)| p).collect();
    assert_eq!(
        leaf,
        vec![
            format!("{package}/vmb_level_2_config_1.json"),
            format!("{package}/vmb_level_2_config_2.json"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_restart_skips_update_and_build() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let connector = FakeConnector::new();
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Restart);
    fleet.wait().await;

    for n in 1..=3 {
        assert_eq!(status(&fleet, n).phase, Phase::Online);
        let commands = journal.commands_on(&host(n));
        assert!(commands.iter().all(|c| !c.contains("git pull") && !c.contains("npm")));
        assert!(commands.iter().any(|c| c.contains("killall node")));
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_checkout_is_cloned_then_rechecked() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    // The probe keeps failing after the clone, so the re-check ends the run.
    let connector = FakeConnector::new().script(
        &host(3),
        Script::default().failing("test -d /opt/matter/cs525-G25/.git"),
    );
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    let commands = journal.commands_on(&host(3));
    assert!(commands.iter().any(|c| c
        == "rm -rf /opt/matter/cs525-G25 && git clone https://example.org/app.git /opt/matter/cs525-G25"));
    assert!(commands.iter().all(|c| !c.contains("git pull")));
    let leaf = status(&fleet, 3);
    assert_eq!(leaf.phase, Phase::Failed);
    assert_eq!(leaf.detail, "Failed to create checkout directory");
}

#[tokio::test(start_paused = true)]
async fn test_missing_deploy_root_is_provisioned_with_group_acls() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let connector = FakeConnector::new().script(&host(2), Script::default().failing("test -d /opt/matter"));
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    let provisioning: Vec<_> = journal
        .commands()
        .into_iter()
        .filter(|c| c.host == host(2) && c.elevated)
        .map(|c| c.command)
        .filter(|c| c.contains("/opt/matter") && !c.contains("*.log") && !c.contains("tcpdump"))
        .collect();
    assert_eq!(
        provisioning,
        vec![
            "mkdir -p /opt/matter",
            "chown root:csvm525-stu /opt/matter",
            "chmod 2775 /opt/matter",
            "setfacl -d -m g:csvm525-stu:rwx /opt/matter",
            "setfacl -d -m o::0 /opt/matter",
        ]
    );
    // Hosts whose deploy root exists skip provisioning.
    assert!(journal.position(&host(3), "mkdir -p").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_acl_step_ends_provisioning() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let connector = FakeConnector::new().script(
        &host(2),
        Script::default()
            .failing("test -d /opt/matter")
            .failing("setfacl -d -m g:"),
    );
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    let relay = status(&fleet, 2);
    assert_eq!(relay.phase, Phase::Failed);
    assert_eq!(relay.detail, "Failed to set default group ACL");
    assert!(journal.position(&host(2), "setfacl -d -m o::0").is_none());
    assert!(journal.position(&host(2), "killall").is_none(), "teardown never ran");
}

#[tokio::test(start_paused = true)]
async fn test_login_mismatch_is_not_fatal() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let mut plan = plan(&yaml, Variant::Flat);
    plan.credentials.username = "someone-else".to_string();
    let mut fleet = Fleet::new(plan, FakeConnector::new());

    fleet.launch(Action::Deploy);
    fleet.wait().await;

    for n in 1..=3 {
        assert_eq!(status(&fleet, n).phase, Phase::Online);
    }
}

#[tokio::test(start_paused = true)]
async fn test_hosts_with_equal_name_suffixes_publish_distinct_tokens() {
    let yaml = "hosts:
  - { name: ctl, address: 'fe80::1' }
  - { name: web1.east, address: 'fe80::2' }
  - { name: web1.west, address: 'fe80::3' }
root: ctl
remote: { repository: 'https://example.org/app.git' }
";
    let connector = FakeConnector::new();
    let mut fleet = Fleet::new(plan(yaml, Variant::Flat), connector);

    fleet.launch(Action::Deploy);
    tokio::time::sleep(SETTLE_ALL).await;

    for name in ["ctl", "web1.east", "web1.west"] {
        let status = fleet.registry().get(name).expect("host in roster");
        assert_eq!(status.phase, Phase::Online, "{name}: {}", status.label());
    }
    assert_eq!(fleet.barrier().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_only_capture_runs_elevated_during_startup() {
    let yaml = fleet_yaml(1, &[(2, vec![3])], "");
    let connector = FakeConnector::new();
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml, Variant::Flat), connector);

    fleet.launch(Action::Restart);
    fleet.wait().await;

    let elevation = |n: u32, needle: &str| {
        journal
            .commands()
            .into_iter()
            .find(|c| c.host == host(n) && c.command.contains(needle))
            .map(|c| c.elevated)
    };
    assert_eq!(elevation(2, "startup.sh"), Some(false));
    assert_eq!(elevation(2, "tcpdump -i any"), Some(true));
    assert_eq!(elevation(1, "ControllerNode.js"), Some(false));
}
