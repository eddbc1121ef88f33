//! Capability invocation.
//!
//! The only hot path in the broker. A call pins its slot with the lock-free
//! running counter, validates the handle, and executes the capability with
//! no broker lock held, so capability code may call back into the broker
//! without deadlocking. Unpublish drains the running counter before it
//! completes, which gives a validated call the right to finish against the
//! descriptor it validated.

use core::any::Any;

use switchyard_abi::{CapabilityIndex, Error, InterfaceDescriptor, Result};

use crate::broker::Ipc;
use crate::contract::contract_require;
use crate::handle::InterfaceHandle;

impl Ipc {
    /// Invoke a capability by index with typed models.
    ///
    /// The broker validates the handle and resolves the capability's
    /// primary entry; everything about the models and the returned error is
    /// between the caller and the capability. Kinds without a primary entry
    /// (telemetry, setter-only properties) fail `NotFound`, as does a stale
    /// or unpublished target.
    pub fn call(
        &self,
        handle: InterfaceHandle,
        index: CapabilityIndex,
        model_in: &dyn Any,
        model_out: &mut dyn Any,
    ) -> Result<()> {
        self.ensure_ready()?;
        self.with_live_descriptor(handle, |descriptor| {
            let capability = descriptor.capability(index).ok_or(Error::NotFound)?;
            let entry = capability.primary().ok_or(Error::NotFound)?;
            entry(model_in, model_out)
        })
    }

    /// Invoke a command's span entry by capability name.
    ///
    /// For callers that only hold marshalled bytes. Resolves the capability
    /// by name and requires it to be a command with a span entry; returns
    /// the number of bytes the capability wrote into `output`.
    pub fn call_with_span(
        &self,
        handle: InterfaceHandle,
        capability_name: &str,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize> {
        self.ensure_ready()?;
        contract_require!(!capability_name.is_empty(), Error::InvalidArgument);
        self.with_live_descriptor(handle, |descriptor| {
            let index = descriptor
                .find_capability(capability_name)
                .ok_or(Error::NotFound)?;
            let entry = descriptor.capabilities[index as usize]
                .span_entry()
                .ok_or(Error::NotFound)?;
            entry(input, output)
        })
    }

    /// Run `body` against the descriptor behind `handle` while holding the
    /// slot's running count, without taking the table lock.
    ///
    /// The increment goes first: unpublish detaches the descriptor and then
    /// reads the counter, so whichever of the two races ahead, either the
    /// load below sees the detach or the unpublish sees our increment.
    /// Both operations are SeqCst because the pair forms a store-buffering
    /// pattern that acquire/release alone would not exclude.
    fn with_live_descriptor<R>(
        &self,
        handle: InterfaceHandle,
        body: impl FnOnce(&InterfaceDescriptor) -> Result<R>,
    ) -> Result<R> {
        let slot = self.slots().get(handle.slot).ok_or(Error::InvalidArgument)?;

        slot.running_add();
        let result = match slot.load_descriptor() {
            Some(descriptor) if slot.generation() == handle.generation => body(descriptor),
            _ => Err(Error::NotFound),
        };
        slot.running_sub();
        result
    }
}
