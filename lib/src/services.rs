//! Platform service table.
//!
//! The switchboard runs on whatever OS or RTOS the device uses; everything
//! it needs from the platform is collected in one table of function pointers
//! that the integrator registers once during bring-up, before any component
//! is initialized. On hosted targets the test harness installs std-backed
//! services.
//!
//! Locking and atomics are deliberately not part of this table: the
//! workspace brings its own ticket mutex and uses `core::sync::atomic`
//! directly.
//!
//! # Registration
//!
//! ```ignore
//! switchyard_lib::services::register_platform(PlatformServices {
//!     sleep_ms: my_rtos_sleep,
//!     monotonic_ms: my_rtos_clock,
//!     thread_spawn: my_rtos_spawn,
//!     thread_join: my_rtos_join,
//! });
//! ```
//!
//! Registration is one-time; later calls are ignored. Accessors panic if no
//! table was registered, which is a bring-up ordering bug, not a runtime
//! condition.

use spin::Once;
use switchyard_abi::Result;

/// Opaque platform thread handle.
pub type ThreadHandle = usize;

/// Thread entry function. Returns the thread's exit code.
pub type ThreadEntry = fn(arg: usize) -> i32;

/// The functions the platform must provide.
pub struct PlatformServices {
    /// Block the calling thread for at least `ms` milliseconds.
    pub sleep_ms: fn(ms: u32),
    /// Monotonic milliseconds since some fixed point.
    pub monotonic_ms: fn() -> u64,
    /// Start a thread running `entry(arg)`.
    ///
    /// Fails with `OutOfMemory` when the platform cannot allocate the
    /// thread, or `System` for any other platform failure.
    pub thread_spawn: fn(entry: ThreadEntry, arg: usize) -> Result<ThreadHandle>,
    /// Wait for a thread to finish and return its exit code.
    pub thread_join: fn(handle: ThreadHandle) -> Result<i32>,
}

static PLATFORM: Once<PlatformServices> = Once::new();

/// Install the platform table. The first call wins; later calls are no-ops.
pub fn register_platform(services: PlatformServices) {
    PLATFORM.call_once(|| services);
}

/// True once a table was registered.
pub fn platform_registered() -> bool {
    PLATFORM.get().is_some()
}

#[inline]
fn platform() -> &'static PlatformServices {
    PLATFORM
        .get()
        .expect("platform services not registered; register_platform must run during bring-up")
}

/// Block the calling thread for at least `ms` milliseconds.
#[inline]
pub fn sleep_ms(ms: u32) {
    (platform().sleep_ms)(ms)
}

/// Monotonic milliseconds since some fixed point.
#[inline]
pub fn monotonic_ms() -> u64 {
    (platform().monotonic_ms)()
}

/// Start a platform thread.
#[inline]
pub fn thread_spawn(entry: ThreadEntry, arg: usize) -> Result<ThreadHandle> {
    (platform().thread_spawn)(entry, arg)
}

/// Join a platform thread.
#[inline]
pub fn thread_join(handle: ThreadHandle) -> Result<i32> {
    (platform().thread_join)(handle)
}
