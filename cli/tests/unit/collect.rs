//! Log collection: stop, list, download.

#![allow(clippy::expect_used)]

use fleet_cli::application::services::Fleet;
use fleet_cli::domain::{Phase, Variant};

use crate::helpers::{fleet_yaml, host, plan};
use crate::mocks::{FakeConnector, Script};

const CAPTURES: &str = "ls /opt/matter/cs525-G25/*.pcap";
const LOGS: &str = "ls /opt/matter/cs525-G25/matter.js/packages/cs525-baseline/*.log";

fn yaml_with_artifacts(dir: &std::path::Path) -> String {
    fleet_yaml(
        1,
        &[(2, vec![3])],
        &format!("artifacts_dir: '{}'\n", dir.display()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_collect_downloads_captures_and_logs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new().script(
        &host(2),
        Script::default()
            .printing(CAPTURES, "/opt/matter/cs525-G25/tcpdump_h02.pcap\n")
            .printing(
                LOGS,
                "/opt/matter/cs525-G25/matter.js/packages/cs525-baseline/node.log\n",
            ),
    );
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml_with_artifacts(dir.path()), Variant::Flat), connector);

    fleet.collect_logs();
    fleet.wait().await;

    let status = fleet.registry().get(&host(2)).expect("h02");
    assert_eq!(status.phase, Phase::Collected);
    assert_eq!(status.detail, "Collected 2 files");
    assert!(dir.path().join("h02/tcpdump_h02.pcap").is_file());
    assert!(dir.path().join("h02/node.log").is_file());

    let listed = journal.position(&host(2), CAPTURES).expect("listed");
    let stopped = journal.position(&host(2), "killall tcpdump").expect("stopped");
    assert!(listed < stopped, "captures listed before the capture is stopped");

    let other = fleet.registry().get(&host(3)).expect("h03");
    assert_eq!(other.detail, "Collected 0 files");
}

#[tokio::test(start_paused = true)]
async fn test_collect_fails_when_captures_cannot_be_listed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let connector =
        FakeConnector::new().script(&host(3), Script::default().failing(CAPTURES));
    let journal = connector.journal();
    let mut fleet = Fleet::new(plan(&yaml_with_artifacts(dir.path()), Variant::Flat), connector);

    fleet.collect_logs();
    fleet.wait().await;

    let status = fleet.registry().get(&host(3)).expect("h03");
    assert_eq!(status.phase, Phase::Failed);
    assert_eq!(status.detail, "Failed to list captures");
    assert!(journal.position(&host(3), "killall node").is_some(), "host still stopped");
    assert!(journal.position(&host(3), LOGS).is_none());
    assert!(journal.closed().contains(&host(3)));
}

#[tokio::test(start_paused = true)]
async fn test_collect_on_unreachable_host_reports_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let connector = FakeConnector::new().unreachable(&host(1));
    let mut fleet = Fleet::new(plan(&yaml_with_artifacts(dir.path()), Variant::Flat), connector);

    fleet.collect_logs();
    fleet.wait().await;

    let status = fleet.registry().get(&host(1)).expect("h01");
    assert_eq!(status.phase, Phase::Error);
    assert_eq!(status.detail, "Error: cannot connect to h01.lab: No route to host");
}
