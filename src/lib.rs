//! # procvisor
//!
//! **Procvisor** is a single-child process supervisor daemon.
//!
//! It launches one command as a child in its own process group, relays the
//! child's stdout and stderr to syslog line by line, and restarts the child
//! with exponential backoff whenever it exits. Terminating signals are
//! forwarded to the child's process group before the supervisor leaves;
//! application signals pass through without affecting supervision.
//!
//! | Area          | Description                                              | Key types                  |
//! |---------------|----------------------------------------------------------|----------------------------|
//! | **Loop**      | Signals, pipe relaying and restart scheduling in one place. | [`Supervisor`]           |
//! | **Backoff**   | Doubling delays with a recovery threshold and a cap.     | [`BackoffPolicy`]          |
//! | **Intervals** | Operator-facing durations (`500`, `2s`, `15m`, `1h`).    | [`Interval`]               |
//! | **Config**    | Immutable startup settings.                              | [`Config`]                 |
//! | **Errors**    | Typed startup and configuration failures.                | [`SetupError`], [`IntervalError`] |
//!
//! ```no_run
//! use procvisor::{Config, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::new(vec!["ping".into(), "localhost".into()]);
//!     cfg.daemonize = false;
//!
//!     let mut supervisor = Supervisor::new(cfg)?;
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

mod backoff;
mod child;
mod config;
mod error;
mod interval;
pub mod logging;
mod relay;
mod signals;
mod supervisor;

pub use backoff::BackoffPolicy;
pub use config::Config;
pub use error::{IntervalError, SetupError};
pub use interval::Interval;
pub use supervisor::Supervisor;
