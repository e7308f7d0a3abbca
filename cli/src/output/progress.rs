//! Headless progress line using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::{HostStatus, Tone};

/// Create a spinner for indeterminate progress.
///
/// # Panics
///
/// Panics if the spinner template string is invalid (it is a compile-time constant and will not panic).
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed}] {msg}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// One-line count of hosts by tone, e.g. `3 done, 1 failed, 12 in progress`.
#[must_use]
pub fn fleet_summary(snapshot: &[(String, HostStatus)]) -> String {
    let count = |tone| {
        snapshot
            .iter()
            .filter(|(_, s)| s.phase.tone() == tone)
            .count()
    };
    format!(
        "{} done, {} failed, {} in progress",
        count(Tone::Success),
        count(Tone::Failure),
        count(Tone::Pending)
    )
}

/// Finish a spinner, leaving `msg` on screen.
pub fn finish(pb: &ProgressBar, msg: &str) {
    pb.finish_with_message(msg.to_string());
}
