mod common;

use std::time::Duration;

use procvisor::{Config, Supervisor};

/// A command that cannot be executed ends supervision with one notice
/// naming it, instead of entering the restart ladder.
#[tokio::test]
async fn unusable_command_stops_supervision() {
    let capture = common::Capture::default();
    let _guard = capture.install();

    let mut cfg = Config::new(vec!["/no/such/bin".into()]);
    cfg.daemonize = false;

    let mut supervisor = Supervisor::new(cfg).unwrap();
    tokio::time::timeout(Duration::from_secs(5), supervisor.run())
        .await
        .expect("supervisor should stop instead of rescheduling")
        .unwrap();

    let lines = capture.lines();
    assert!(lines.iter().any(|line| line.contains("/no/such/bin")));
    assert!(!lines.iter().any(|line| line.contains("restarting in")));
}
