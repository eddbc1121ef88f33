//! Logging facade.
//!
//! All switchyard log output funnels through a single **backend** function
//! pointer. Until the integrator registers one, logging is a cheap no-op;
//! once registered, every line goes through the backend with its level.
//!
//! # Backend contract
//!
//! The backend receives the level and the pre-formatted arguments for a
//! **single log line** and is responsible for:
//!
//! 1. Writing the formatted text atomically (no interleaving from other
//!    threads).
//! 2. Appending a trailing newline after the text.
//!
//! # Registration
//!
//! ```ignore
//! switchyard_lib::logging::log_register_backend(my_backend_fn);
//! switchyard_lib::logging::log_set_level(LogLevel::Debug);
//! ```

use core::fmt;
use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

/// Severity of a log line. Lower values are more severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Unexpected failure.
    Error = 0,
    /// Degraded but recoverable situation.
    Warn = 1,
    /// Lifecycle events.
    Info = 2,
    /// Per-operation detail.
    Debug = 3,
    /// Everything.
    Trace = 4,
}

impl LogLevel {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Fixed-width tag for backends that prefix lines.
    pub const fn tag(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn ",
            LogLevel::Info => "info ",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Signature of a log backend.
pub type LogBackend = fn(level: LogLevel, args: fmt::Arguments<'_>);

/// Stored as a raw pointer; `null` means "no backend, drop the line".
static BACKEND: AtomicPtr<()> = AtomicPtr::new(core::ptr::null_mut());

/// Register the backend that receives all log lines at or above the current
/// level. Replaces any previously registered backend.
pub fn log_register_backend(backend: LogBackend) {
    BACKEND.store(backend as *mut (), Ordering::Release);
}

/// Set the maximum level that gets dispatched.
pub fn log_set_level(level: LogLevel) {
    CURRENT_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// The current maximum dispatched level.
pub fn log_get_level() -> LogLevel {
    LogLevel::from_raw(CURRENT_LEVEL.load(Ordering::Relaxed))
}

/// True when a line at `level` would reach the backend.
#[inline]
pub fn log_is_enabled(level: LogLevel) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

/// Dispatch one formatted line. Used by the `log_*` macros; not meant to be
/// called directly.
#[doc(hidden)]
pub fn log_dispatch(level: LogLevel, args: fmt::Arguments<'_>) {
    if !log_is_enabled(level) {
        return;
    }
    let raw = BACKEND.load(Ordering::Acquire);
    if raw.is_null() {
        return;
    }
    // SAFETY: the only non-null value ever stored is a `LogBackend` cast to
    // `*mut ()` in log_register_backend, so the transmute restores the
    // original function pointer.
    let backend: LogBackend = unsafe { core::mem::transmute(raw) };
    backend(level, args);
}

/// Log at error level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log_dispatch($crate::logging::LogLevel::Error, format_args!($($arg)*))
    };
}

/// Log at warn level.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::log_dispatch($crate::logging::LogLevel::Warn, format_args!($($arg)*))
    };
}

/// Log at info level.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log_dispatch($crate::logging::LogLevel::Info, format_args!($($arg)*))
    };
}

/// Log at debug level.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log_dispatch($crate::logging::LogLevel::Debug, format_args!($($arg)*))
    };
}

/// Log at trace level.
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        $crate::logging::log_dispatch($crate::logging::LogLevel::Trace, format_args!($($arg)*))
    };
}
