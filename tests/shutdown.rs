mod common;

use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::getpid;
use procvisor::{Config, Supervisor};

/// SIGTERM is forwarded to the child's process group and the supervisor
/// exits once the child has been reaped. The 30 second sleep never runs
/// out, so a prompt return proves the forward; the child's death by the
/// forwarded signal must not be reported.
#[tokio::test]
async fn terminate_forwards_and_exits() {
    let capture = common::Capture::default();
    let _guard = capture.install();

    let mut cfg = Config::new(vec!["sleep".into(), "30".into()]);
    cfg.daemonize = false;

    let mut supervisor = Supervisor::new(cfg).unwrap();
    let killer = tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        kill(getpid(), Signal::SIGTERM).unwrap();
    });

    let started = Instant::now();
    tokio::time::timeout(Duration::from_secs(10), supervisor.run())
        .await
        .expect("supervisor should exit after forwarding SIGTERM")
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
    killer.await.unwrap();

    let lines = capture.lines();
    assert!(lines.iter().any(|line| line.contains("started")));
    assert!(!lines.iter().any(|line| line.contains("child got signal")));
}
