//! Command-line interface for session-registry.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Inactivity sweep period, in seconds.
    pub inactivity_sweep_secs: Option<u64>,
    /// Full flush period, in seconds.
    pub full_flush_secs: Option<u64>,
    /// Disable the full flush.
    pub no_full_flush: bool,
    /// Daily flush time, `HH:MM`.
    pub daily_flush_at: Option<String>,
    /// Disable the daily flush.
    pub no_daily_flush: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('i') | Long("inactivity-sweep") => {
                result.inactivity_sweep_secs = Some(seconds(&mut parser, "inactivity-sweep")?);
            }
            Short('f') | Long("full-flush") => {
                result.full_flush_secs = Some(seconds(&mut parser, "full-flush")?);
            }
            Long("no-full-flush") => {
                result.no_full_flush = true;
            }
            Short('d') | Long("daily-flush-at") => {
                let value: String = parser.value()?.parse()?;
                NaiveTime::parse_from_str(&value, "%H:%M")
                    .map_err(|_| ArgsError::InvalidValue("daily-flush-at", value.clone()))?;
                result.daily_flush_at = Some(value);
            }
            Long("no-daily-flush") => {
                result.no_daily_flush = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

fn seconds(parser: &mut lexopt::Parser, name: &'static str) -> Result<u64, ArgsError> {
    use lexopt::ValueExt;

    let value: String = parser.value()?.parse()?;
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ArgsError::InvalidValue(name, value)),
    }
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-registry {version}
In-memory HTTP session registry with scheduled eviction

USAGE:
    session-registry [OPTIONS]

OPTIONS:
    -c, --config <FILE>            Path to configuration file (JSON)
    -i, --inactivity-sweep <SECS>  Inactivity sweep period [default: 3600]
    -f, --full-flush <SECS>        Full flush period [default: 60]
        --no-full-flush            Disable the full flush
    -d, --daily-flush-at <HH:MM>   Daily flush time, local [default: 05:00]
        --no-daily-flush           Disable the daily flush
    -l, --log-level <LVL>          Log level (error, warn, info, debug, trace)
    -h, --help                     Print help
    -V, --version                  Print version

ENVIRONMENT VARIABLES:
    SESSION_REGISTRY_INACTIVITY_SWEEP_SECS  Inactivity sweep period (overrides config)
    SESSION_REGISTRY_FULL_FLUSH_SECS        Full flush period (overrides config)
    SESSION_REGISTRY_DAILY_FLUSH_AT         Daily flush time (overrides config)
    SESSION_REGISTRY_LOG_LEVEL              Log level (overrides config)
    RUST_LOG                                Alternative log level setting

EXAMPLES:
    # Start with defaults
    session-registry

    # Only expire idle sessions, checking every 5 minutes
    session-registry --no-full-flush --no-daily-flush -i 300

    # Start with config file
    session-registry -c /etc/session-registry/config.json
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-registry {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// Lexopt parsing error.
    #[error("{0}")]
    Lexopt(#[from] lexopt::Error),
    /// Invalid argument value.
    #[error("invalid value for --{0}: '{1}'")]
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    #[error("unexpected argument: '{0}'")]
    UnexpectedArgument(String),
}
