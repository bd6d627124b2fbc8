//! # Error types used by the supervisor.
//!
//! Two enums cover the fatal cases:
//!
//! - [`IntervalError`] rejected interval syntax on the command line.
//! - [`SetupError`] failures while bringing the supervisor up.
//!
//! Runtime faults (read errors, reap errors, signal delivery errors) are not
//! represented here: the loop reports them to the log and keeps running.

use std::io;

use thiserror::Error;

/// Errors produced while parsing an interval argument.
///
/// All of these are configuration errors: they surface as a diagnostic on
/// stderr and exit code 1 before the supervisor starts.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntervalError {
    /// The argument was empty.
    #[error("empty interval")]
    Empty,

    /// The argument did not start with a decimal number.
    #[error("interval must start with a number: {0:?}")]
    MissingNumber(String),

    /// The numeric part did not fit the supported range.
    #[error("interval out of range: {0:?}")]
    OutOfRange(String),

    /// The unit byte was not one of `s`, `m`, `h`, `d`.
    #[error("unknown interval unit {0:?} (expected s, m, h or d)")]
    UnknownUnit(char),

    /// Bytes followed the unit.
    #[error("trailing characters after interval unit: {0:?}")]
    Trailing(String),
}

/// Errors that abort supervisor startup.
///
/// Everything here maps to exit code 1. Once the loop is running, the only
/// fatal condition left is a fork-level [`SetupError::Spawn`] failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SetupError {
    /// Creating one of the stdout/stderr pipe pairs failed.
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),

    /// Registering a signal stream failed.
    #[error("signal setup: {0}")]
    Signals(#[source] io::Error),

    /// Forking the child failed for a reason other than a bad executable.
    #[error("spawn: {0}")]
    Spawn(#[source] io::Error),

    /// Detaching from the terminal failed.
    #[error("daemonize: {0}")]
    Daemonize(#[source] io::Error),

    /// The syslog transport could not be opened.
    #[error("syslog: {0}")]
    Syslog(String),
}
