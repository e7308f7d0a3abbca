//! `fleet --dry-run` against temporary fleet files.

#![allow(clippy::expect_used)]

use predicates::prelude::*;

use crate::cli_tests::fleet;

const FLEET: &str = "\
hosts:
  - { name: n01.lab, address: 'fe80::1' }
  - { name: n02.lab, address: 'fe80::2' }
  - { name: n03.lab, address: 'fe80::3' }
  - { name: n04.lab, address: 'fe80::4' }
root: n01.lab
relays:
  - { host: n02.lab, leaves: [n03.lab, n04.lab] }
remote: { repository: 'https://example.org/app.git' }
";

fn write_fleet(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fleet.yaml");
    std::fs::write(&path, contents).expect("write");
    (dir, path)
}

#[test]
fn test_dry_run_flat_lists_every_host() {
    let (_dir, path) = write_fleet(FLEET);
    fleet()
        .arg("--config")
        .arg(&path)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet plan"))
        .stdout(predicate::str::contains("cs525-baseline"))
        .stdout(predicate::str::contains("waits for 3"))
        .stdout(predicate::str::contains("n04.lab"));
}

#[test]
fn test_dry_run_hierarchical_shows_tiers_and_ports() {
    let (_dir, path) = write_fleet(FLEET);
    fleet()
        .arg("--config")
        .arg(&path)
        .args(["--dry-run", "--vmb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hierarchical"))
        .stdout(predicate::str::contains("relay"))
        .stdout(predicate::str::contains("root_config.json"))
        .stdout(predicate::str::contains("vmb_level_2_config_1.json"))
        .stdout(predicate::str::contains("ports "));
}

#[test]
fn test_dry_run_hierarchical_without_relays_fails() {
    let flat_only = "\
hosts:
  - { name: n01.lab, address: 'fe80::1' }
  - { name: n02.lab, address: 'fe80::2' }
root: n01.lab
remote: { repository: 'https://example.org/app.git' }
";
    let (_dir, path) = write_fleet(flat_only);
    fleet()
        .arg("--config")
        .arg(&path)
        .args(["--dry-run", "-v"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("needs at least one relay"));
}

#[test]
fn test_example_fleet_file_validates_in_both_variants() {
    let example = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../fleet.example.yaml");
    for extra in [None, Some("--vmb")] {
        let mut cmd = fleet();
        cmd.arg("--config").arg(&example).arg("--dry-run");
        if let Some(flag) = extra {
            cmd.arg(flag);
        }
        cmd.assert()
            .success()
            .stdout(predicate::str::contains("sp25-cs525-2520.cs.illinois.edu"));
    }
}
