//! The supervision event loop.

use std::io;
use std::os::fd::OwnedFd;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::Signal;
use nix::unistd::pipe2;
use tracing::{debug, error, info, warn};

use crate::{
    backoff::BackoffPolicy,
    child::{self, ChildProcess, ExitKind},
    config::Config,
    error::SetupError,
    interval::Interval,
    relay::{Channel, LogPipe},
    signals::SignalInbox,
};

/// Child exit code that asks the supervisor to stop. Doubles as the shell's
/// command-not-found status, which an exec failure also reports.
const STOP_SENTINEL: i32 = 127;

/// Runs one command as a supervised child: relays its output, restarts it
/// with exponential backoff and forwards signals to its process group.
///
/// `run` returns `Ok` on a normal shutdown (terminate/interrupt, or the
/// child used the stop sentinel) and `Err` only on a fork-level spawn
/// failure.
pub struct Supervisor {
    cfg: Config,
    inbox: SignalInbox,
    stdout_pipe: LogPipe,
    stderr_pipe: LogPipe,
    stdout_w: OwnedFd,
    stderr_w: OwnedFd,
    child: Option<ChildProcess>,
    backoff: BackoffPolicy,
    deadline: Option<Instant>,
    stop: bool,
    forwarded: Option<Signal>,
}

impl Supervisor {
    /// Creates the pipe pairs and signal streams. Must be called from within
    /// the runtime the loop will execute on.
    pub fn new(cfg: Config) -> Result<Self, SetupError> {
        let (stdout_r, stdout_w) = pipe()?;
        let (stderr_r, stderr_w) = pipe()?;
        let stdout_pipe = LogPipe::new(stdout_r, Channel::Stdout).map_err(SetupError::Pipe)?;
        let stderr_pipe = LogPipe::new(stderr_r, Channel::Stderr).map_err(SetupError::Pipe)?;
        let inbox = SignalInbox::new().map_err(SetupError::Signals)?;
        let backoff = BackoffPolicy::new(
            cfg.restart.duration(),
            cfg.cooloff.duration(),
            cfg.maximum.duration(),
        );
        Ok(Self {
            cfg,
            inbox,
            stdout_pipe,
            stderr_pipe,
            stdout_w,
            stderr_w,
            child: None,
            backoff,
            deadline: None,
            stop: false,
            forwarded: None,
        })
    }

    pub async fn run(&mut self) -> Result<(), SetupError> {
        loop {
            let pending = self.inbox.drain();

            if pending.info {
                self.report();
            }
            if pending.hangup {
                self.forward(Signal::SIGHUP);
            }
            if pending.usr1 {
                self.forward(Signal::SIGUSR1);
            }
            if pending.usr2 {
                self.forward(Signal::SIGUSR2);
            }
            if pending.interrupt || pending.terminate {
                self.stop = true;
                let sig = if pending.interrupt {
                    Signal::SIGINT
                } else {
                    Signal::SIGTERM
                };
                match &self.child {
                    Some(child) => {
                        child.forward(sig);
                        self.forwarded = Some(sig);
                    }
                    None => break,
                }
            }
            if pending.child {
                if let Some(uptime) = self.reap() {
                    if self.stop {
                        break;
                    }
                    self.schedule_restart(uptime);
                }
            }

            self.wait().await;

            if self.child.is_none() && self.due() {
                if !self.spawn()? {
                    break;
                }
            }
        }

        // Collect whatever the child wrote between its last relay and its
        // exit, including an unterminated final line.
        self.stdout_pipe.drain();
        self.stderr_pipe.drain();
        Ok(())
    }

    /// The loop's single suspension point: any watched signal, either pipe
    /// becoming readable, or the restart deadline. The deadline only ticks
    /// while no child exists.
    async fn wait(&mut self) {
        let timeout = if self.child.is_some() {
            None
        } else {
            Some(match self.deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => Duration::ZERO,
            })
        };
        let Self {
            inbox,
            stdout_pipe,
            stderr_pipe,
            ..
        } = self;
        tokio::select! {
            _ = inbox.recv() => {}
            _ = stdout_pipe.pour() => {}
            _ = stderr_pipe.pour() => {}
            _ = deadline_wait(timeout) => {}
        }
    }

    fn due(&self) -> bool {
        match self.deadline {
            Some(deadline) => deadline <= Instant::now(),
            None => true,
        }
    }

    /// Status report for the info signal.
    fn report(&self) {
        match &self.child {
            Some(child) => {
                info!("child {} up {}", child.pid(), Interval::from(child.uptime()));
            }
            None => {
                let left = self
                    .deadline
                    .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                    .unwrap_or_default();
                info!("restarting in {}", Interval::from(left));
            }
        }
    }

    fn forward(&self, sig: Signal) {
        if let Some(child) = &self.child {
            child.forward(sig);
        }
    }

    /// Reaps one child. Returns its uptime when it was the tracked child;
    /// a stray pid is reported and ignored.
    fn reap(&mut self) -> Option<Duration> {
        let (pid, exit) = match child::reap_one() {
            Ok(Some(reaped)) => reaped,
            Ok(None) => return None,
            Err(e) => {
                error!("wait: {e}");
                return None;
            }
        };
        if !matches!(&self.child, Some(current) if current.pid() == pid) {
            warn!("unknown child {pid}");
            return None;
        }
        let current = self.child.take()?;
        self.record_exit(exit);
        Some(current.uptime())
    }

    /// Applies a reaped status: exit notices, the stop sentinel and the
    /// shutdown suppression.
    fn record_exit(&mut self, exit: ExitKind) {
        match exit {
            ExitKind::Exited(0) => {}
            ExitKind::Exited(code) => {
                if code == STOP_SENTINEL {
                    self.stop = true;
                }
                warn!("child exited {code}");
            }
            ExitKind::Signaled(sig) => {
                // The death we asked for during shutdown is not news.
                if self.forwarded != Some(sig) {
                    warn!("child got signal {sig}");
                }
            }
        }
    }

    fn schedule_restart(&mut self, uptime: Duration) {
        let delay = self.backoff.next(uptime);
        info!("restarting in {}", Interval::from(delay));
        self.deadline = Some(Instant::now() + delay);
    }

    /// Spawns the configured command. `Ok(false)` means the executable is
    /// unusable, which ends supervision the same way the stop sentinel does.
    fn spawn(&mut self) -> Result<bool, SetupError> {
        match ChildProcess::spawn(&self.cfg.command, &self.stdout_w, &self.stderr_w) {
            Ok(child) => {
                debug!("child {} started", child.pid());
                self.deadline = None;
                self.child = Some(child);
                Ok(true)
            }
            Err(e) if resource_exhausted(&e) => {
                error!("spawn: {e}");
                Err(SetupError::Spawn(e))
            }
            // Every other spawn error is the exec failing inside the child
            // (missing, broken or unreadable executable), the same condition
            // the stop sentinel reports.
            Err(e) => {
                warn!("{}: {e}", self.cfg.command[0]);
                self.stop = true;
                Ok(false)
            }
        }
    }
}

/// Fork-level resource exhaustion. Exec failures come back through the
/// spawn machinery carrying the errno of the failed execvp; running out of
/// pids, memory or descriptors happens before the child exists.
fn resource_exhausted(e: &io::Error) -> bool {
    matches!(
        e.raw_os_error().map(Errno::from_raw),
        Some(Errno::EAGAIN | Errno::ENOMEM | Errno::EMFILE | Errno::ENFILE)
    )
}

fn pipe() -> Result<(OwnedFd, OwnedFd), SetupError> {
    pipe2(OFlag::O_CLOEXEC).map_err(|e| SetupError::Pipe(e.into()))
}

async fn deadline_wait(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending::<()>().await,
    }
}
