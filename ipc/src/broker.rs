//! Broker lifecycle and the producer-side table operations.
//!
//! The [`Ipc`] control block is `const`-constructible so a device places it
//! in a `static` and initializes it once during bring-up. Producers publish
//! and unpublish interface descriptors; the consumer-side operations live in
//! the handle, call, and query modules.

use core::sync::atomic::{AtomicU32, Ordering};

use switchyard_abi::{Error, InterfaceDescriptor, Result, Version};
use switchyard_lib::{InitFlag, TicketMutex, TicketMutexGuard, log_debug, log_info};

use crate::config::MAX_INTERFACES;
use crate::contract::contract_require;
use crate::slot::{Slot, SlotFlags};

#[cfg(feature = "unpublish")]
use switchyard_abi::{NO_WAIT, WAIT_FOREVER};
#[cfg(feature = "unpublish")]
use switchyard_lib::services;

/// The switchboard control block.
///
/// All operations take `&self`; the table lock and the per-slot atomics
/// provide the synchronization. The block itself carries no heap state and
/// can live in a `static`:
///
/// ```ignore
/// static IPC: Ipc = Ipc::new();
///
/// fn bring_up() {
///     IPC.init().expect("double init");
/// }
/// ```
pub struct Ipc {
    state: InitFlag,
    /// Serializes table mutation. Never held while capability code runs.
    lock: TicketMutex<()>,
    slots: [Slot; MAX_INTERFACES],
    /// Source of slot generations. Advanced only under the lock; never
    /// reused, so a handle can always tell a recycled slot from the
    /// occupancy it was issued for.
    publish_count: AtomicU32,
}

impl Ipc {
    /// New, uninitialized broker.
    pub const fn new() -> Self {
        Self {
            state: InitFlag::new(),
            lock: TicketMutex::new(()),
            slots: [const { Slot::new() }; MAX_INTERFACES],
            publish_count: AtomicU32::new(0),
        }
    }

    /// One-time initialization. Not thread-safe: no other broker operation
    /// may run concurrently with it.
    pub fn init(&self) -> Result<()> {
        if !self.state.begin_init() {
            return Err(Error::AlreadyInitialized);
        }
        for slot in &self.slots {
            slot.clear();
        }
        self.publish_count.store(0, Ordering::Relaxed);
        self.state.complete_init();
        log_info!("ipc: ready, {} interface slots", MAX_INTERFACES);
        Ok(())
    }

    /// Tear the broker down so `init` may run again.
    ///
    /// Fails `Busy` unless every interface was unpublished, every handle
    /// released, and every call returned.
    pub fn deinit(&self) -> Result<()> {
        self.ensure_ready()?;
        let _guard = self.lock.lock();
        for slot in &self.slots {
            if slot.is_occupied() || slot.ref_count() != 0 || slot.running() != 0 {
                return Err(Error::Busy);
            }
        }
        self.state.reset();
        log_info!("ipc: shut down");
        Ok(())
    }

    /// Publish an interface.
    ///
    /// The descriptor is the identity of the publication: unpublish takes
    /// the same reference. Fails `Duplicate` when an interface with the
    /// same name and version is already published, `NoSpace` when the
    /// table is full.
    pub fn publish(&self, descriptor: &'static InterfaceDescriptor) -> Result<()> {
        self.ensure_ready()?;
        contract_require!(!descriptor.name.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        if self.find_exact(descriptor.name, descriptor.version).is_some() {
            return Err(Error::Duplicate);
        }
        let Some(index) = self.slots.iter().position(Slot::is_free) else {
            return Err(Error::NoSpace);
        };
        let generation = self.publish_count.fetch_add(1, Ordering::Relaxed) + 1;
        let slot = &self.slots[index];
        slot.reset_counters();
        slot.set_generation(generation);
        slot.attach(descriptor);
        log_debug!(
            "ipc: published {}.{} (slot {}, generation {})",
            descriptor.name,
            descriptor.version,
            index,
            generation
        );
        Ok(())
    }

    /// Withdraw a published interface.
    ///
    /// `wait_ms` bounds how long to wait for in-flight calls to drain:
    /// [`NO_WAIT`] fails `Busy` immediately, [`WAIT_FOREVER`] waits without
    /// a deadline. On success the interface is gone: later calls through
    /// old handles fail `NotFound`, and the outstanding references die
    /// silently when their holders release them.
    #[cfg(feature = "unpublish")]
    pub fn unpublish(
        &self,
        descriptor: &'static InterfaceDescriptor,
        wait_ms: u32,
    ) -> Result<()> {
        self.ensure_ready()?;

        let (index, generation) = {
            let _guard = self.lock.lock();
            let raw = descriptor as *const InterfaceDescriptor as *mut InterfaceDescriptor;
            let Some(index) = self
                .slots
                .iter()
                .position(|slot| core::ptr::eq(slot.descriptor_raw(), raw))
            else {
                return Err(Error::NotFound);
            };
            let slot = &self.slots[index];
            // Detach before looking at the running count: once the pointer
            // is null no new call can pass validation, so a zero count is
            // final rather than a snapshot.
            slot.detach();
            if slot.running() == 0 {
                log_debug!("ipc: unpublished {}.{}", descriptor.name, descriptor.version);
                return Ok(());
            }
            if wait_ms == NO_WAIT {
                slot.attach(descriptor);
                return Err(Error::Busy);
            }
            (index, slot.generation())
        };

        // Drain outside the lock so the running calls can re-enter the
        // broker. The slot cannot be recycled while its counters are
        // nonzero, and the generation only moves on a recycle, so it
        // doubles as a drain-completed witness.
        let slot = &self.slots[index];
        let deadline = if wait_ms == WAIT_FOREVER {
            None
        } else {
            Some(services::monotonic_ms().saturating_add(wait_ms as u64))
        };
        loop {
            if slot.running() == 0 {
                log_debug!("ipc: unpublished {}.{} after drain", descriptor.name, descriptor.version);
                return Ok(());
            }
            if let Some(deadline) = deadline {
                if services::monotonic_ms() >= deadline {
                    let _guard = self.lock.lock();
                    if slot.generation() != generation {
                        // Recycled while we slept: the drain finished.
                        return Ok(());
                    }
                    if slot.running() == 0 {
                        return Ok(());
                    }
                    slot.attach(descriptor);
                    return Err(Error::Busy);
                }
            }
            services::sleep_ms(crate::config::UNPUBLISH_POLL_MS);
        }
    }

    /// Mark `(name, version)` as the preferred occupant among all published
    /// versions of `name`. Handle acquisition picks it over earlier table
    /// entries when several versions satisfy the caller's criteria.
    pub fn set_default(&self, name: &str, version: Version) -> Result<()> {
        self.ensure_ready()?;
        contract_require!(!name.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        let Some(target) = self.find_exact(name, version) else {
            return Err(Error::NotFound);
        };
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(descriptor) = slot.load_descriptor() else {
                continue;
            };
            if descriptor.name != name {
                continue;
            }
            if index == target {
                slot.insert_flags(SlotFlags::DEFAULT);
            } else {
                slot.remove_flags(SlotFlags::DEFAULT);
            }
        }
        Ok(())
    }

    /// Refuse new handle acquisition for `(name, version)` until
    /// [`resume`](Ipc::resume). Existing handles keep working.
    pub fn hold(&self, name: &str, version: Version) -> Result<()> {
        self.ensure_ready()?;
        contract_require!(!name.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        let Some(index) = self.find_exact(name, version) else {
            return Err(Error::NotFound);
        };
        self.slots[index].insert_flags(SlotFlags::ON_HOLD);
        Ok(())
    }

    /// Allow handle acquisition again after [`hold`](Ipc::hold).
    pub fn resume(&self, name: &str, version: Version) -> Result<()> {
        self.ensure_ready()?;
        contract_require!(!name.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        let Some(index) = self.find_exact(name, version) else {
            return Err(Error::NotFound);
        };
        self.slots[index].remove_flags(SlotFlags::ON_HOLD);
        Ok(())
    }

    #[inline]
    pub(crate) fn ensure_ready(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    pub(crate) fn slots(&self) -> &[Slot; MAX_INTERFACES] {
        &self.slots
    }

    /// Acquire the table lock.
    pub(crate) fn lock_table(&self) -> TicketMutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Index of the occupied slot matching `(name, version)` exactly.
    /// Caller holds the table lock.
    pub(crate) fn find_exact(&self, name: &str, version: Version) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.load_descriptor()
                .is_some_and(|descriptor| descriptor.name == name && descriptor.version == version)
        })
    }
}

impl Default for Ipc {
    fn default() -> Self {
        Self::new()
    }
}
