//! # Child lifecycle: spawn, forward, reap.
//!
//! The child runs in its own process group (pgid == pid) so that forwarded
//! signals reach the whole service tree, with its stdout and stderr replaced
//! by duplicates of the supervisor's pipe write ends. Reaping goes through
//! `waitpid` on our SIGCHLD path rather than an async child handle, which
//! keeps exactly one reap per drained child-exited flag.

use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::error;

/// How a reaped child went away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ExitKind {
    Exited(i32),
    Signaled(Signal),
}

/// The currently supervised child process.
#[derive(Debug)]
pub(crate) struct ChildProcess {
    pid: Pid,
    started_at: Instant,
}

impl ChildProcess {
    /// Forks and executes `command` with the given pipe write ends as its
    /// fds 1 and 2. The write ends are duplicated, so the supervisor's own
    /// copies stay open across restarts. Exec failure is reported here as a
    /// spawn error rather than by a short-lived child.
    pub(crate) fn spawn(
        command: &[String],
        stdout: &OwnedFd,
        stderr: &OwnedFd,
    ) -> io::Result<Self> {
        let (exe, args) = command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
        let child = Command::new(exe)
            .args(args)
            .process_group(0)
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?))
            .spawn()?;
        Ok(Self {
            pid: Pid::from_raw(child.id() as i32),
            started_at: Instant::now(),
        })
    }

    pub(crate) fn pid(&self) -> Pid {
        self.pid
    }

    pub(crate) fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Delivers `sig` to the child's process group so descendants see it
    /// too. A group that is already gone is not worth reporting.
    pub(crate) fn forward(&self, sig: Signal) {
        if let Err(e) = killpg(self.pid, sig) {
            if e != Errno::ESRCH {
                error!("killpg: {e}");
            }
        }
    }
}

/// Collects at most one terminated child. Returns `None` when nothing is
/// ready; stopped/continued reports and an empty child table are not events
/// the supervisor cares about.
pub(crate) fn reap_one() -> Result<Option<(Pid, ExitKind)>, Errno> {
    match waitpid(None, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(pid, code)) => Ok(Some((pid, ExitKind::Exited(code)))),
        Ok(WaitStatus::Signaled(pid, sig, _)) => Ok(Some((pid, ExitKind::Signaled(sig)))),
        Ok(_) => Ok(None),
        Err(Errno::ECHILD) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::fcntl::OFlag;
    use nix::unistd::pipe2;
    use std::fs::File;
    use std::io::Read;

    fn pipes() -> ((OwnedFd, OwnedFd), (OwnedFd, OwnedFd)) {
        (
            pipe2(OFlag::O_CLOEXEC).unwrap(),
            pipe2(OFlag::O_CLOEXEC).unwrap(),
        )
    }

    #[test]
    fn spawn_wires_stdout_into_the_pipe() {
        let ((out_r, out_w), (_err_r, err_w)) = pipes();
        let child =
            ChildProcess::spawn(&["echo".into(), "hello".into()], &out_w, &err_w).unwrap();

        let status = waitpid(child.pid(), None).unwrap();
        assert!(matches!(status, WaitStatus::Exited(_, 0)));

        drop(out_w);
        drop(err_w);
        let mut output = String::new();
        File::from(out_r).read_to_string(&mut output).unwrap();
        assert_eq!(output, "hello\n");
    }

    #[test]
    fn forward_reaches_the_process_group() {
        let ((_out_r, out_w), (_err_r, err_w)) = pipes();
        let child = ChildProcess::spawn(&["sleep".into(), "30".into()], &out_w, &err_w).unwrap();

        child.forward(Signal::SIGTERM);
        let status = waitpid(child.pid(), None).unwrap();
        assert!(matches!(status, WaitStatus::Signaled(_, Signal::SIGTERM, _)));
    }

    #[test]
    fn missing_executable_fails_to_spawn() {
        let ((_out_r, out_w), (_err_r, err_w)) = pipes();
        let err = ChildProcess::spawn(&["/no/such/bin".into()], &out_w, &err_w).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
