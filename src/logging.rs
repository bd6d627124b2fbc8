//! # Log pipeline setup.
//!
//! Everything the supervisor says, including relayed child output, goes
//! through [`tracing`] into syslog under the configured identity. Levels
//! map onto syslog priorities: ERROR to err, WARN to notice, INFO to info,
//! anything finer to debug.
//!
//! In the foreground (`-d`) a second layer echoes records to stderr, the
//! way LOG_PERROR does for syslog(3). `RUST_LOG` filters both layers; the
//! default is `info`.

use std::fmt::Write as _;
use std::sync::Mutex;

use syslog::{Facility, Formatter3164, Logger, LoggerBackend};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::SetupError;

/// Connects to syslogd and installs the subscriber. Call once, before the
/// runtime starts and before daemonizing, so the transport survives the
/// background fork.
pub fn init(name: &str, daemonize: bool) -> Result<(), SetupError> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: name.to_owned(),
        pid: std::process::id(),
    };
    let logger = syslog::unix(formatter).map_err(|e| SetupError::Syslog(e.to_string()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(SyslogLayer::new(logger));

    if daemonize {
        registry.init();
    } else {
        let echo = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);
        registry.with(echo).init();
    }
    Ok(())
}

struct SyslogLayer {
    logger: Mutex<Logger<LoggerBackend, Formatter3164>>,
}

impl SyslogLayer {
    fn new(logger: Logger<LoggerBackend, Formatter3164>) -> Self {
        Self {
            logger: Mutex::new(logger),
        }
    }
}

impl<S: Subscriber> Layer<S> for SyslogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageVisitor(String::new());
        event.record(&mut message);
        if message.0.is_empty() {
            return;
        }
        let Ok(mut logger) = self.logger.lock() else {
            return;
        };
        let level = *event.metadata().level();
        let _ = if level == Level::ERROR {
            logger.err(message.0)
        } else if level == Level::WARN {
            logger.notice(message.0)
        } else if level == Level::INFO {
            logger.info(message.0)
        } else {
            logger.debug(message.0)
        };
    }
}

/// Pulls the `message` field out of an event; other fields are not part of
/// the record text.
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.0.push_str(value);
        }
    }
}
