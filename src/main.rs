use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::error;

use procvisor::{logging, Config, Interval, SetupError, Supervisor};

/// Run one command under supervision: relay its output to syslog and
/// restart it with exponential backoff when it exits.
#[derive(Parser, Debug)]
#[command(name = "procvisor", version, about)]
struct Cli {
    /// Stay in the foreground and echo log records to stderr.
    #[arg(short = 'd')]
    foreground: bool,

    /// Uptime after which the restart delay resets to its initial value.
    #[arg(short = 'c', value_name = "interval", default_value = "15m")]
    cooloff: Interval,

    /// Upper bound on the restart delay.
    #[arg(short = 'm', value_name = "interval", default_value = "1h")]
    maximum: Interval,

    /// Syslog identity; defaults to the basename of the command.
    #[arg(short = 'n', value_name = "name")]
    name: Option<String>,

    /// Initial restart delay.
    #[arg(short = 't', value_name = "interval", default_value = "1s")]
    restart: Interval,

    /// Command to supervise, with its arguments.
    #[arg(
        value_name = "command",
        required = true,
        num_args = 1..,
        trailing_var_arg = true
    )]
    command: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut cfg = Config::new(self.command);
        if let Some(name) = self.name {
            cfg.name = name;
        }
        cfg.daemonize = !self.foreground;
        cfg.restart = self.restart;
        cfg.cooloff = self.cooloff;
        cfg.maximum = self.maximum;
        cfg
    }
}

/// Detach from the terminal, chdir to `/` and point stdio at /dev/null.
fn daemonize() -> Result<(), SetupError> {
    nix::unistd::daemon(false, false).map_err(|e| SetupError::Daemonize(e.into()))
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    let cfg = cli.into_config();

    if let Err(e) = logging::init(&cfg.name, cfg.daemonize) {
        eprintln!("procvisor: {e}");
        return ExitCode::FAILURE;
    }
    if cfg.daemonize {
        if let Err(e) = daemonize() {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(async {
        let mut supervisor = Supervisor::new(cfg)?;
        supervisor.run().await
    });
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parses_flags_and_command() {
        let cli = Cli::try_parse_from([
            "procvisor", "-d", "-n", "web", "-t", "500", "-c", "10m", "-m", "2h", "nginx", "-g",
            "daemon off;",
        ])
        .unwrap();
        let cfg = cli.into_config();
        assert!(!cfg.daemonize);
        assert_eq!(cfg.name, "web");
        assert_eq!(cfg.restart.duration(), Duration::from_millis(500));
        assert_eq!(cfg.cooloff.duration(), Duration::from_secs(600));
        assert_eq!(cfg.maximum.duration(), Duration::from_secs(7200));
        assert_eq!(cfg.command, ["nginx", "-g", "daemon off;"]);
    }

    #[test]
    fn command_is_required() {
        assert!(Cli::try_parse_from(["procvisor", "-d"]).is_err());
    }

    #[test]
    fn bad_interval_is_a_usage_error() {
        assert!(Cli::try_parse_from(["procvisor", "-t", "10x", "true"]).is_err());
    }

    #[test]
    fn name_defaults_to_command_basename() {
        let cli = Cli::try_parse_from(["procvisor", "/usr/sbin/sshd"]).unwrap();
        assert_eq!(cli.into_config().name, "sshd");
    }
}
