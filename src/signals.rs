//! # Signal inbox.
//!
//! One pending flag per signal of interest, in the spirit of a
//! `sig_atomic_t` flag array: the handlers installed by [`tokio::signal`]
//! only mark readiness, and every action happens on the loop task between
//! waits. [`SignalInbox::recv`] completes when any watched signal arrives;
//! [`SignalInbox::drain`] folds in whatever else is queued and hands the
//! whole set to the loop, so repeated deliveries of one signal collapse
//! into a single event.
//!
//! The info signal exists only where the platform defines `SIGINFO`
//! (the BSDs and macOS); elsewhere that slot stays empty.

use std::io;

use futures::FutureExt;
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Flags drained by the supervisor loop, one per watched signal.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Pending {
    pub info: bool,
    pub hangup: bool,
    pub usr1: bool,
    pub usr2: bool,
    pub interrupt: bool,
    pub terminate: bool,
    pub child: bool,
}

/// Watches the signals the supervisor reacts to.
pub(crate) struct SignalInbox {
    hangup: Signal,
    interrupt: Signal,
    terminate: Signal,
    usr1: Signal,
    usr2: Signal,
    child: Signal,
    info: Option<Signal>,
    pending: Pending,
}

impl SignalInbox {
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Self {
            hangup: signal(SignalKind::hangup())?,
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            usr1: signal(SignalKind::user_defined1())?,
            usr2: signal(SignalKind::user_defined2())?,
            child: signal(SignalKind::child())?,
            info: info_stream()?,
            pending: Pending::default(),
        })
    }

    /// Completes when any watched signal arrives and records it as pending.
    pub(crate) async fn recv(&mut self) {
        tokio::select! {
            _ = self.child.recv() => self.pending.child = true,
            _ = self.terminate.recv() => self.pending.terminate = true,
            _ = self.interrupt.recv() => self.pending.interrupt = true,
            _ = self.hangup.recv() => self.pending.hangup = true,
            _ = self.usr1.recv() => self.pending.usr1 = true,
            _ = self.usr2.recv() => self.pending.usr2 = true,
            _ = recv_opt(&mut self.info) => self.pending.info = true,
        }
    }

    /// Returns and clears the pending set, merging in any notifications
    /// that queued up since the last wake.
    pub(crate) fn drain(&mut self) -> Pending {
        self.pending.child |= ready(&mut self.child);
        self.pending.terminate |= ready(&mut self.terminate);
        self.pending.interrupt |= ready(&mut self.interrupt);
        self.pending.hangup |= ready(&mut self.hangup);
        self.pending.usr1 |= ready(&mut self.usr1);
        self.pending.usr2 |= ready(&mut self.usr2);
        if let Some(info) = self.info.as_mut() {
            self.pending.info |= ready(info);
        }
        std::mem::take(&mut self.pending)
    }
}

fn ready(stream: &mut Signal) -> bool {
    stream.recv().now_or_never().flatten().is_some()
}

async fn recv_opt(stream: &mut Option<Signal>) {
    match stream {
        Some(stream) => {
            stream.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(any(
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn info_stream() -> io::Result<Option<Signal>> {
    Ok(Some(signal(SignalKind::info())?))
}

#[cfg(not(any(
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "macos",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn info_stream() -> io::Result<Option<Signal>> {
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::{kill, Signal as Sig};
    use nix::unistd::getpid;

    #[tokio::test]
    async fn repeated_deliveries_collapse_into_one_flag() {
        let mut inbox = SignalInbox::new().unwrap();
        kill(getpid(), Sig::SIGUSR1).unwrap();
        kill(getpid(), Sig::SIGUSR1).unwrap();

        inbox.recv().await;
        let pending = inbox.drain();
        assert!(pending.usr1);
        assert!(!pending.usr2);
        assert!(!pending.terminate);

        // Already drained; nothing remains pending.
        let pending = inbox.drain();
        assert!(!pending.usr1);
    }
}
