//! # Utility library for the teleoperation software
//!
//! Everything an executable needs around the control core: sessions, logging,
//! parameter files, CSV archives, input scripts and some maths.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod archive;
pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod session;
pub mod script_interpreter;
pub mod time;

// ---------------------------------------------------------------------------
// REEXPORTS
// ---------------------------------------------------------------------------

pub use teleop_if;

// ---------------------------------------------------------------------------
// MACROS
// ---------------------------------------------------------------------------

/// Log an error and panic.
///
/// Only for broken invariants which leave no way to continue. Anything the
/// caller could handle shall be returned as a `Result` instead.
#[macro_export]
macro_rules! raise_error {
    () => ({
        log::error!("Unrecoverable error raised");
        std::panic!("Unrecoverable error");
    });
    ($msg:expr) => ({
        log::error!("{}", $msg);
        std::panic!("{}", $msg);
    });
    ($fmt:expr, $($arg:tt)+) => ({
        let msg = std::format!($fmt, $($arg)+);
        log::error!("{}", msg);
        std::panic!("{}", msg);
    });
}
