//! # Supervisor configuration.
//!
//! [`Config`] is assembled once from the command line and never changes
//! afterwards. It names the child command, the syslog identity and the three
//! intervals that drive restart scheduling.
//!
//! # Example
//! ```
//! use procvisor::Config;
//!
//! let cfg = Config::new(vec!["/usr/local/bin/ircd".into(), "-f".into()]);
//! assert_eq!(cfg.name, "ircd");
//! assert_eq!(cfg.restart.to_string(), "1s");
//! assert_eq!(cfg.cooloff.to_string(), "15m 0s");
//! ```

use std::path::Path;
use std::time::Duration;

use crate::interval::Interval;

/// Immutable runtime configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Syslog identity. Defaults to the basename of the command.
    pub name: String,
    /// Argument vector of the supervised command; element zero is the
    /// executable.
    pub command: Vec<String>,
    /// Detach from the terminal. When false, log records are also echoed to
    /// stderr.
    pub daemonize: bool,
    /// Initial restart delay.
    pub restart: Interval,
    /// Uptime after which the restart delay resets to `restart`.
    pub cooloff: Interval,
    /// Upper bound on the restart delay.
    pub maximum: Interval,
}

impl Config {
    /// Builds a configuration for `command` with the defaults:
    /// - `daemonize = true`
    /// - `restart = 1s`
    /// - `cooloff = 15m`
    /// - `maximum = 1h`
    /// - `name` derived from the command basename
    pub fn new(command: Vec<String>) -> Self {
        debug_assert!(!command.is_empty());
        let name = command.first().map(|c| basename(c)).unwrap_or_default();
        Self {
            name,
            command,
            daemonize: true,
            restart: Interval::from(Duration::from_secs(1)),
            cooloff: Interval::from(Duration::from_secs(15 * 60)),
            maximum: Interval::from(Duration::from_secs(60 * 60)),
        }
    }
}

fn basename(command: &str) -> String {
    Path::new(command)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| command.to_owned())
}
