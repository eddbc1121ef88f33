//! Result and error taxonomy shared by every switchyard subsystem.
//!
//! Every public operation reports failure through [`Error`]; there is no
//! unwinding across the API surface. Capability implementations return the
//! same type, and the broker passes their results through without
//! interpreting them.

/// Result type for switchyard operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can be reported by the broker, the persistent registry, and
/// capability implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// End of an iteration. Not a failure: queries report it when a
    /// continuation has no more entries to return.
    Eof,
    /// A component was used before its `init` completed.
    NotInitialized,
    /// `init` was called twice without an intervening `deinit`.
    AlreadyInitialized,
    /// The resource is in use right now; retry later (or with a wait).
    Busy,
    /// No interface, capability, handle target, or key matched.
    NotFound,
    /// An element with the same identity already exists.
    Duplicate,
    /// A capacity limit was hit (table slots, interface instances).
    NoSpace,
    /// A storage reservation did not fit in the backing region.
    OutOfMemory,
    /// A state precondition was violated (e.g. releasing a handle whose
    /// reference was already returned). Usually indicates a caller bug.
    Precondition,
    /// An argument violated the documented contract.
    InvalidArgument,
    /// The operation is not supported by this build or this capability.
    NotSupported,
    /// Unrecoverable error reported by a lower layer.
    System,
    /// A lower layer timed out.
    Timeout,
}

impl Error {
    /// Short stable name, convenient for log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Error::Eof => "eof",
            Error::NotInitialized => "not-initialized",
            Error::AlreadyInitialized => "already-initialized",
            Error::Busy => "busy",
            Error::NotFound => "not-found",
            Error::Duplicate => "duplicate",
            Error::NoSpace => "no-space",
            Error::OutOfMemory => "out-of-memory",
            Error::Precondition => "precondition",
            Error::InvalidArgument => "invalid-argument",
            Error::NotSupported => "not-supported",
            Error::System => "system",
            Error::Timeout => "timeout",
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
