//! Mutual exclusion for the switchboard tables.
//!
//! Uses a **ticket lock**: each acquirer takes a monotonically-increasing
//! ticket and spins until `now_serving` matches. This guarantees that
//! threads acquire the lock in the order they requested it, eliminating
//! starvation when several cores contend for the broker or registry table.
//!
//! Critical sections under this lock are short (table scans and counter
//! updates); nothing user-supplied ever runs while it is held, so spinning
//! is the right trade on every target this library runs on.

use core::cell::UnsafeCell;
use core::hint::spin_loop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU16, Ordering};

/// FIFO-fair spinning mutex.
pub struct TicketMutex<T> {
    /// Monotonically-increasing ticket counter. Each `lock()` call takes the
    /// next ticket via `fetch_add(1)`. Wraps at `u16::MAX`; equality checks
    /// handle wrap-around correctly.
    next_ticket: AtomicU16,
    /// The ticket currently being served. Incremented by `fetch_add(1)` on
    /// unlock. A waiter spins until `now_serving == my_ticket`.
    now_serving: AtomicU16,
    data: UnsafeCell<T>,
}

// SAFETY: TicketMutex provides exclusive access through ticket-lock
// acquisition, so sharing it between threads is safe whenever the protected
// data may be sent between threads.
unsafe impl<T: Send> Send for TicketMutex<T> {}
unsafe impl<T: Send> Sync for TicketMutex<T> {}

/// Guard providing access to the data protected by a [`TicketMutex`].
pub struct TicketMutexGuard<'a, T> {
    mutex: &'a TicketMutex<T>,
}

impl<T> TicketMutex<T> {
    /// Create a new unlocked mutex protecting `data`.
    #[inline]
    pub const fn new(data: T) -> Self {
        Self {
            next_ticket: AtomicU16::new(0),
            now_serving: AtomicU16::new(0),
            data: UnsafeCell::new(data),
        }
    }

    /// Check if the lock is currently held (or has waiters).
    #[inline]
    pub fn is_locked(&self) -> bool {
        let next = self.next_ticket.load(Ordering::Relaxed);
        let serving = self.now_serving.load(Ordering::Relaxed);
        next != serving
    }

    /// Acquire the lock, spinning until it is available.
    #[inline]
    pub fn lock(&self) -> TicketMutexGuard<'_, T> {
        // Take a ticket. fetch_add wraps at u16::MAX -> 0; equality checks
        // are wrap-safe so this is correct for any number of acquisitions.
        let my_ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        // Spin until our ticket is being served. The read of `now_serving`
        // is Acquire so that all writes made by the previous holder are
        // visible once we observe our ticket being served.
        //
        // Proportional backoff: the further away our ticket is from
        // now_serving, the more PAUSE iterations we issue per check. This
        // reduces cache-line traffic when multiple cores are queued.
        loop {
            let serving = self.now_serving.load(Ordering::Acquire);
            if serving == my_ticket {
                break;
            }
            let distance = my_ticket.wrapping_sub(serving) as u32;
            for _ in 0..distance.min(64) {
                spin_loop();
            }
        }

        TicketMutexGuard { mutex: self }
    }

    /// Try to acquire the lock without waiting.
    ///
    /// Succeeds only if the lock is currently free (no holder and no queued
    /// waiters).
    #[inline]
    pub fn try_lock(&self) -> Option<TicketMutexGuard<'_, T>> {
        let current = self.now_serving.load(Ordering::Relaxed);
        // CAS next_ticket forward by 1; if someone else grabbed a ticket in
        // the meantime the CAS fails and we bail out without waiting.
        if self
            .next_ticket
            .compare_exchange(
                current,
                current.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Some(TicketMutexGuard { mutex: self })
        } else {
            None
        }
    }

    /// Get mutable access to the data without locking.
    ///
    /// Safe because the exclusive borrow proves no other reference exists.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<'a, T> Deref for TicketMutexGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<'a, T> DerefMut for TicketMutexGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard proves exclusive ownership of the lock.
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<'a, T> Drop for TicketMutexGuard<'a, T> {
    #[inline]
    fn drop(&mut self) {
        // Advance now_serving to hand the lock to the next waiter in FIFO
        // order. Release ordering makes our writes visible to that waiter.
        self.mutex.now_serving.fetch_add(1, Ordering::Release);
    }
}
