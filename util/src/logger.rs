//! Logging backend for teleoperation executables
//!
//! Log lines are stamped with the seconds elapsed since the session epoch.
//! The terminal gets coloured level tags, the session log file gets plain
//! ones so that it stays greppable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info, Record};
use std::{env, fmt, str::FromStr};
use thiserror::Error;

// Internal imports
use crate::session::{self, Session};

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable which, if set to a level name (e.g. `trace`),
/// overrides the level passed to [`logger_init`].
pub const LOG_LEVEL_ENV_VAR: &str = "TELEOP_LOG";

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Could not parse TELEOP_LOG value `{0}` as a log level")]
    InvalidEnvLogLevel(String),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must let `INFO` through, since session lifecycle messages are
/// logged at that level. It is replaced by the level in `$TELEOP_LOG` if that
/// is set.
///
/// Must only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &Session
) -> Result<(), LoggerInitError> {

    let level = match env::var(LOG_LEVEL_ENV_VAR) {
        Ok(s) => LevelFilter::from_str(&s)
            .map_err(|_| LoggerInitError::InvalidEnvLogLevel(s))?,
        Err(_) => min_level
    };

    if level < LevelFilter::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let term = fern::Dispatch::new()
        .format(|out, message, record| {
            let tag = level_tag(record.level());
            out.finish(format_args!("{}", format_line(record, tag, message)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            let tag = plain_tag(record.level());
            out.finish(format_args!("{}", format_line(record, tag, message)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(level)
        .chain(term)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Build one log line. Targets are only shown for debug and trace records.
fn format_line<T: fmt::Display>(
    record: &Record,
    tag: T,
    message: &fmt::Arguments
) -> String {
    if record.level() > log::Level::Info {
        format!(
            "[{:10.6} {}] {}: {}",
            session::get_elapsed_seconds(),
            tag,
            record.target(),
            message
        )
    }
    else {
        format!("[{:10.6} {}] {}", session::get_elapsed_seconds(), tag, message)
    }
}

/// Plain tag for a log level
fn plain_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info  => "INF",
        log::Level::Warn  => "WRN",
        log::Level::Error => "ERR"
    }
}

/// Coloured tag for a log level
fn level_tag(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}
