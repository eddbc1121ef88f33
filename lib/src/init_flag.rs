//! Lifecycle flag for singleton components.
//!
//! The broker and the registry follow an explicit init/deinit protocol: a
//! second `init` without a `deinit` in between must fail, and every other
//! operation must fail until `init` completed. [`InitFlag`] carries that
//! state as a three-value atomic so the checks are wait-free.

use core::sync::atomic::{AtomicU8, Ordering};

const STATE_UNINIT: u8 = 0;
const STATE_INITIALIZING: u8 = 1;
const STATE_READY: u8 = 2;

/// Tracks whether a component is uninitialized, mid-init, or ready.
pub struct InitFlag {
    /// 0 = uninitialized, 1 = init in progress, 2 = ready.
    state: AtomicU8,
}

impl InitFlag {
    /// New flag in the uninitialized state.
    #[inline]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_UNINIT),
        }
    }

    /// Claim the right to initialize.
    ///
    /// Returns `true` for exactly one caller per lifecycle; every other
    /// caller gets `false` until [`reset`] runs.
    ///
    /// [`reset`]: InitFlag::reset
    #[inline]
    pub fn begin_init(&self) -> bool {
        self.state
            .compare_exchange(
                STATE_UNINIT,
                STATE_INITIALIZING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Mark initialization complete. Only the caller that won
    /// [`begin_init`] may call this.
    ///
    /// [`begin_init`]: InitFlag::begin_init
    #[inline]
    pub fn complete_init(&self) {
        self.state.store(STATE_READY, Ordering::Release);
    }

    /// Roll back a failed initialization, or tear down after deinit.
    #[inline]
    pub fn reset(&self) {
        self.state.store(STATE_UNINIT, Ordering::Release);
    }

    /// True once initialization completed and no reset happened since.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_READY
    }
}

impl Default for InitFlag {
    fn default() -> Self {
        Self::new()
    }
}
