//! Interface handles and the consumer-side lifecycle.
//!
//! A handle is a slot index plus the generation the slot carried when the
//! handle was issued. Generations never repeat, so a handle from a previous
//! occupancy can be detected forever; stale handles fail `NotFound` and
//! never touch the slot's current occupant.

use switchyard_abi::{CapabilityIndex, Error, MatchCriteria, Result, Version, version_matches};

use crate::broker::Ipc;
use crate::config::MAX_INSTANCES_PER_INTERFACE;
use crate::contract::contract_require;
use crate::slot::SlotFlags;

/// Reference to a published interface.
///
/// Obtained from [`Ipc::try_get`] or [`Ipc::get`] and returned with
/// [`Ipc::release`]. Copying the value does not copy the reference it
/// represents: each acquisition must be released exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceHandle {
    pub(crate) slot: usize,
    pub(crate) generation: u32,
}

impl Ipc {
    /// Acquire a handle to an interface by name and version criteria.
    ///
    /// When several published versions satisfy the criteria, a
    /// [`set_default`](Ipc::set_default) marked slot wins; otherwise the
    /// first match in table order does. Fails `NotFound` when nothing
    /// matches, `Busy` when the match is held, `NoSpace` when the interface
    /// is at its instance cap.
    pub fn try_get(
        &self,
        name: &str,
        version: Version,
        criteria: MatchCriteria,
    ) -> Result<InterfaceHandle> {
        self.ensure_ready()?;
        contract_require!(!name.is_empty(), Error::InvalidArgument);

        let _guard = self.lock_table();
        let mut chosen = None;
        for (index, slot) in self.slots().iter().enumerate() {
            let Some(descriptor) = slot.load_descriptor() else {
                continue;
            };
            if descriptor.name != name
                || !version_matches(descriptor.version, version, criteria)
            {
                continue;
            }
            if slot.flags().contains(SlotFlags::DEFAULT) {
                chosen = Some(index);
                break;
            }
            if chosen.is_none() {
                chosen = Some(index);
            }
        }
        let Some(index) = chosen else {
            return Err(Error::NotFound);
        };
        self.acquire_slot(index)
    }

    /// Acquire another handle to the interface behind an existing handle.
    ///
    /// Fails `NotFound` once the interface was unpublished or the slot
    /// recycled.
    pub fn get(&self, original: InterfaceHandle) -> Result<InterfaceHandle> {
        self.ensure_ready()?;

        let _guard = self.lock_table();
        let slot = self
            .slots()
            .get(original.slot)
            .ok_or(Error::InvalidArgument)?;
        if !slot.is_occupied() || slot.generation() != original.generation {
            return Err(Error::NotFound);
        }
        self.acquire_slot(original.slot)
    }

    /// Return a handle.
    ///
    /// Releasing a stale handle is a successful no-op: the reference it
    /// represented already died when its slot was recycled. Releasing more
    /// handles than were acquired fails `Precondition`.
    pub fn release(&self, handle: InterfaceHandle) -> Result<()> {
        self.ensure_ready()?;

        let _guard = self.lock_table();
        let slot = self.slots().get(handle.slot).ok_or(Error::InvalidArgument)?;
        if slot.generation() != handle.generation {
            return Ok(());
        }
        if slot.ref_count() == 0 {
            return Err(Error::Precondition);
        }
        slot.ref_count_sub(1);
        Ok(())
    }

    /// Find a capability index by name in the interface behind `handle`.
    pub fn try_get_capability(
        &self,
        handle: InterfaceHandle,
        name: &str,
    ) -> Result<CapabilityIndex> {
        self.ensure_ready()?;
        contract_require!(!name.is_empty(), Error::InvalidArgument);

        let _guard = self.lock_table();
        let slot = self.slots().get(handle.slot).ok_or(Error::InvalidArgument)?;
        if slot.generation() != handle.generation {
            return Err(Error::NotFound);
        }
        let descriptor = slot.load_descriptor().ok_or(Error::NotFound)?;
        descriptor.find_capability(name).ok_or(Error::NotFound)
    }

    /// Bump the reference count of an occupied slot and mint a handle.
    /// Caller holds the table lock and has resolved `index` to a match.
    fn acquire_slot(&self, index: usize) -> Result<InterfaceHandle> {
        let slot = &self.slots()[index];
        if slot.flags().contains(SlotFlags::ON_HOLD) {
            return Err(Error::Busy);
        }
        if slot.ref_count() >= MAX_INSTANCES_PER_INTERFACE {
            return Err(Error::NoSpace);
        }
        slot.ref_count_add(1);
        Ok(InterfaceHandle {
            slot: index,
            generation: slot.generation(),
        })
    }
}
