mod common;

use std::time::Duration;

use procvisor::{Config, Supervisor};

/// Exit code 127 from the child asks the supervisor to stop; the exit is
/// logged and no restart is scheduled.
#[tokio::test]
async fn exit_127_ends_supervision() {
    let capture = common::Capture::default();
    let _guard = capture.install();

    let mut cfg = Config::new(vec!["sh".into(), "-c".into(), "exit 127".into()]);
    cfg.daemonize = false;

    let mut supervisor = Supervisor::new(cfg).unwrap();
    tokio::time::timeout(Duration::from_secs(10), supervisor.run())
        .await
        .expect("supervisor should stop after the sentinel exit")
        .unwrap();

    let lines = capture.lines();
    assert!(lines.iter().any(|line| line.contains("child exited 127")));
    assert!(!lines.iter().any(|line| line.contains("restarting in")));
}
