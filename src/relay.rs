//! Child output relay.
//!
//! Each of the child's output streams feeds a supervisor-owned pipe. The
//! read end is non-blocking; [`LineBuffer`] accumulates whatever a single
//! read returns and [`LogPipe`] turns complete lines into log records, info
//! for stdout and notice for stderr.

use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{error, info, warn};

const CAPACITY: usize = 1024;

/// Fixed-size accumulator for one output stream.
///
/// Holds at most `CAPACITY - 1` bytes of unflushed data. After every flush
/// the buffer contains only the bytes following the last emitted newline.
pub(crate) struct LineBuffer {
    data: [u8; CAPACITY],
    len: usize,
}

impl LineBuffer {
    pub(crate) fn new() -> Self {
        Self {
            data: [0; CAPACITY],
            len: 0,
        }
    }

    /// Reads once into the tail and returns the number of bytes added. A
    /// would-block read surfaces as `ErrorKind::WouldBlock`; on any error
    /// the buffer is left unchanged.
    pub(crate) fn fill(&mut self, mut source: impl io::Read) -> io::Result<usize> {
        let spare = &mut self.data[self.len..CAPACITY - 1];
        if spare.is_empty() {
            return Ok(0);
        }
        let n = source.read(spare)?;
        self.len += n;
        Ok(n)
    }

    /// Emits every newline-terminated prefix as one record, dropping the
    /// newline, and compacts the remainder to the front. A full buffer with
    /// no newline is emitted whole so a pathological line cannot wedge the
    /// relay.
    pub(crate) fn flush(&mut self, mut emit: impl FnMut(&str)) {
        let mut start = 0;
        while let Some(nl) = self.data[start..self.len].iter().position(|&b| b == b'\n') {
            emit(&String::from_utf8_lossy(&self.data[start..start + nl]));
            start += nl + 1;
        }
        if start > 0 {
            self.data.copy_within(start..self.len, 0);
            self.len -= start;
        } else if self.len == CAPACITY - 1 {
            emit(&String::from_utf8_lossy(&self.data[..self.len]));
            self.len = 0;
        }
    }

    /// Exit-path flush: like [`LineBuffer::flush`], then emits any
    /// unterminated tail as a final record.
    pub(crate) fn flush_all(&mut self, mut emit: impl FnMut(&str)) {
        self.flush(&mut emit);
        if self.len > 0 {
            emit(&String::from_utf8_lossy(&self.data[..self.len]));
            self.len = 0;
        }
    }
}

/// Which child stream a pipe carries; decides the record priority.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Channel {
    Stdout,
    Stderr,
}

impl Channel {
    fn emit(self, line: &str) {
        match self {
            Channel::Stdout => info!("{line}"),
            Channel::Stderr => warn!("{line}"),
        }
    }
}

/// The supervisor's read end of one child output pipe.
pub(crate) struct LogPipe {
    fd: AsyncFd<File>,
    buf: LineBuffer,
    channel: Channel,
}

impl LogPipe {
    /// Takes ownership of the pipe read end and makes it non-blocking. The
    /// matching write end stays blocking for the child.
    pub(crate) fn new(read_end: OwnedFd, channel: Channel) -> io::Result<Self> {
        fcntl(read_end.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))?;
        let fd = AsyncFd::with_interest(File::from(read_end), Interest::READABLE)?;
        Ok(Self {
            fd,
            buf: LineBuffer::new(),
            channel,
        })
    }

    /// Waits until the pipe has data, then fills and flushes once. Read
    /// errors other than would-block produce one error record each and the
    /// loop carries on.
    pub(crate) async fn pour(&mut self) {
        let Self { fd, buf, channel } = self;
        let mut guard = match fd.readable().await {
            Ok(guard) => guard,
            Err(e) => {
                error!("poll: {e}");
                return;
            }
        };
        match guard.try_io(|inner| buf.fill(inner.get_ref())) {
            Ok(Ok(_)) => buf.flush(|line| channel.emit(line)),
            Ok(Err(e)) => error!("read: {e}"),
            Err(_would_block) => {}
        }
    }

    /// Final drain at loop exit: one non-blocking fill, then a flush that
    /// also emits an unterminated last line.
    pub(crate) fn drain(&mut self) {
        let Self { fd, buf, channel } = self;
        match buf.fill(fd.get_ref()) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
            Err(e) => error!("read: {e}"),
        }
        buf.flush_all(|line| channel.emit(line));
    }
}
