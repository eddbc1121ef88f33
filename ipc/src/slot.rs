//! Interface slot records.
//!
//! Each slot bundles the descriptor pointer with the counters and flags that
//! track its live state. All fields are atomics: `ref_count` and `flags`
//! are only ever mutated with the table lock held, while `running` and the
//! descriptor pointer participate in the lock-free call protocol, so the
//! whole record must be shareable without the lock.
//!
//! Ordering discipline:
//! - descriptor attach/detach and `running` use SeqCst: the call path's
//!   increment-then-load and the unpublish path's detach-then-load form a
//!   store-buffering pattern that weaker orderings would not exclude;
//! - `generation` is written before the descriptor attaches (Release) and
//!   becomes visible through the descriptor load (Acquire);
//! - everything else is Relaxed under the table lock, which provides the
//!   happens-before edges between writers.

use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU8, AtomicU32, Ordering};

use bitflags::bitflags;
use switchyard_abi::InterfaceDescriptor;

bitflags! {
    /// Per-slot policy flags, mutated under the table lock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct SlotFlags: u8 {
        /// Preferred among several published versions of the same name.
        const DEFAULT = 1 << 0;
        /// New handle acquisition is refused while the producer updates.
        const ON_HOLD = 1 << 1;
    }
}

/// One entry of the broker's interface table.
pub(crate) struct Slot {
    /// Published descriptor, or null while unoccupied.
    descriptor: AtomicPtr<InterfaceDescriptor>,
    /// Stamp of the publish that created the current occupancy.
    generation: AtomicU32,
    /// Outstanding handles.
    ref_count: AtomicU32,
    /// In-flight calls currently executing inside this slot's capabilities.
    running: AtomicU32,
    /// [`SlotFlags`] bits.
    flags: AtomicU8,
}

impl Slot {
    pub(crate) const fn new() -> Self {
        Self {
            descriptor: AtomicPtr::new(ptr::null_mut()),
            generation: AtomicU32::new(0),
            ref_count: AtomicU32::new(0),
            running: AtomicU32::new(0),
            flags: AtomicU8::new(0),
        }
    }

    /// Reset to the pristine state. Only during broker init.
    pub(crate) fn clear(&self) {
        self.descriptor.store(ptr::null_mut(), Ordering::SeqCst);
        self.generation.store(0, Ordering::Relaxed);
        self.ref_count.store(0, Ordering::Relaxed);
        self.running.store(0, Ordering::Relaxed);
        self.flags.store(0, Ordering::Relaxed);
    }

    /// A slot is free for a new publish only when nothing references it:
    /// no descriptor, no outstanding handles, no in-flight calls.
    pub(crate) fn is_free(&self) -> bool {
        self.descriptor_raw().is_null() && self.ref_count() == 0 && self.running() == 0
    }

    pub(crate) fn is_occupied(&self) -> bool {
        !self.descriptor_raw().is_null()
    }

    /// Raw descriptor pointer, for identity comparison.
    pub(crate) fn descriptor_raw(&self) -> *mut InterfaceDescriptor {
        self.descriptor.load(Ordering::SeqCst)
    }

    /// The current descriptor, if the slot is occupied.
    pub(crate) fn load_descriptor(&self) -> Option<&'static InterfaceDescriptor> {
        let raw = self.descriptor.load(Ordering::SeqCst);
        if raw.is_null() {
            None
        } else {
            // SAFETY: every pointer stored in `descriptor` originates from a
            // `&'static InterfaceDescriptor` passed to publish, so it is
            // valid for the whole program.
            Some(unsafe { &*raw })
        }
    }

    /// Make `descriptor` the slot's occupant. Last step of publish and of a
    /// failed-unpublish restore; always under the table lock.
    pub(crate) fn attach(&self, descriptor: &'static InterfaceDescriptor) {
        self.descriptor.store(
            descriptor as *const InterfaceDescriptor as *mut InterfaceDescriptor,
            Ordering::SeqCst,
        );
    }

    /// Detach the descriptor. After this store no call can pass validation,
    /// so once `running` reads zero it stays zero apart from transient
    /// failed-validation blips.
    pub(crate) fn detach(&self) {
        self.descriptor.store(ptr::null_mut(), Ordering::SeqCst);
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stamp a new generation. Before attach, under the table lock.
    pub(crate) fn set_generation(&self, generation: u32) {
        self.generation.store(generation, Ordering::Release);
    }

    pub(crate) fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Relaxed)
    }

    pub(crate) fn ref_count_add(&self, n: u32) {
        self.ref_count.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn ref_count_sub(&self, n: u32) {
        self.ref_count.fetch_sub(n, Ordering::Relaxed);
    }

    pub(crate) fn reset_counters(&self) {
        self.ref_count.store(0, Ordering::Relaxed);
        self.flags.store(0, Ordering::Relaxed);
    }

    pub(crate) fn running(&self) -> u32 {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn running_add(&self) {
        self.running.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn running_sub(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn flags(&self) -> SlotFlags {
        SlotFlags::from_bits_truncate(self.flags.load(Ordering::Relaxed))
    }

    pub(crate) fn insert_flags(&self, flags: SlotFlags) {
        self.flags.fetch_or(flags.bits(), Ordering::Relaxed);
    }

    pub(crate) fn remove_flags(&self, flags: SlotFlags) {
        self.flags.fetch_and(!flags.bits(), Ordering::Relaxed);
    }
}
