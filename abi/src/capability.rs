//! Capability model: the callable entries of an interface.
//!
//! A capability is one named operation inside an interface. The kind of the
//! capability decides which entry points it carries:
//!
//! - a **property** has an optional getter and an optional setter;
//! - a **command** runs synchronously in the caller's stack, optionally with
//!   a span-based entry for callers that only hold marshalled bytes;
//! - an **async command** has a start entry and an optional cancellation
//!   entry (the switchboard conveys the cancel entry, it never schedules it);
//! - a **telemetry** stream has no directly callable entry at all; it is
//!   addressed through subscription commands defined by the producer.
//!
//! Typed entries exchange models as [`core::any::Any`] references; the
//! switchboard performs no validation on them, the capability itself
//! downcasts and checks. Span entries exchange raw bytes in whatever format
//! the interface defines.

use core::any::Any;

use crate::error::Result;

/// Index of a capability inside its interface descriptor.
pub type CapabilityIndex = u16;

/// Typed capability entry point.
///
/// `model_in` carries the input model and `model_out` the memory for the
/// output model. Either may be a unit value when the capability takes or
/// produces nothing. The returned error is defined by the interface and
/// passes through the switchboard unchanged.
pub type CapabilityFn = fn(model_in: &dyn Any, model_out: &mut dyn Any) -> Result<()>;

/// Span capability entry point.
///
/// Consumes marshalled input bytes and writes marshalled output into
/// `output`, returning the number of bytes written.
pub type SpanCapabilityFn = fn(input: &[u8], output: &mut [u8]) -> Result<usize>;

/// The kind of a capability together with its entry points.
///
/// The kind tag and the pointers it may legally carry are fused into one
/// enum, so a telemetry entry with a dangling command pointer is simply not
/// representable.
#[derive(Clone, Copy)]
pub enum CapabilityKind {
    /// Readable and/or writable state. The getter is the primary entry.
    Property {
        /// Reads the property into `model_out`.
        get: Option<CapabilityFn>,
        /// Writes the property from `model_in`.
        set: Option<CapabilityFn>,
    },
    /// Synchronous operation.
    Command {
        /// Typed entry, the primary.
        sync: CapabilityFn,
        /// Optional entry taking marshalled byte spans.
        span: Option<SpanCapabilityFn>,
    },
    /// Asynchronous operation. The start entry is the primary.
    CommandAsync {
        /// Starts the operation.
        start: CapabilityFn,
        /// Requests cancellation of a started operation.
        cancel: Option<CapabilityFn>,
    },
    /// Data stream; not directly callable.
    Telemetry,
}

/// A single named capability of an interface.
#[derive(Clone, Copy)]
pub struct Capability {
    /// Capability name, unique within its interface.
    pub name: &'static str,
    /// Kind and entry points.
    pub kind: CapabilityKind,
}

impl Capability {
    /// Property capability. Either accessor may be absent.
    pub const fn property(
        name: &'static str,
        get: Option<CapabilityFn>,
        set: Option<CapabilityFn>,
    ) -> Self {
        Self {
            name,
            kind: CapabilityKind::Property { get, set },
        }
    }

    /// Synchronous command capability.
    pub const fn command(name: &'static str, sync: CapabilityFn) -> Self {
        Self {
            name,
            kind: CapabilityKind::Command { sync, span: None },
        }
    }

    /// Synchronous command capability with a span-based entry.
    pub const fn command_with_span(
        name: &'static str,
        sync: CapabilityFn,
        span: SpanCapabilityFn,
    ) -> Self {
        Self {
            name,
            kind: CapabilityKind::Command {
                sync,
                span: Some(span),
            },
        }
    }

    /// Asynchronous command capability.
    pub const fn command_async(
        name: &'static str,
        start: CapabilityFn,
        cancel: Option<CapabilityFn>,
    ) -> Self {
        Self {
            name,
            kind: CapabilityKind::CommandAsync { start, cancel },
        }
    }

    /// Telemetry capability.
    pub const fn telemetry(name: &'static str) -> Self {
        Self {
            name,
            kind: CapabilityKind::Telemetry,
        }
    }

    /// The entry invoked by a typed call, if the kind has one.
    pub const fn primary(&self) -> Option<CapabilityFn> {
        match self.kind {
            CapabilityKind::Property { get, .. } => get,
            CapabilityKind::Command { sync, .. } => Some(sync),
            CapabilityKind::CommandAsync { start, .. } => Some(start),
            CapabilityKind::Telemetry => None,
        }
    }

    /// The span entry, if the kind has one.
    pub const fn span_entry(&self) -> Option<SpanCapabilityFn> {
        match self.kind {
            CapabilityKind::Command { span, .. } => span,
            _ => None,
        }
    }

    /// The property setter, if present.
    pub const fn setter(&self) -> Option<CapabilityFn> {
        match self.kind {
            CapabilityKind::Property { set, .. } => set,
            _ => None,
        }
    }

    /// The cancellation entry of an async command, if present.
    pub const fn cancel_entry(&self) -> Option<CapabilityFn> {
        match self.kind {
            CapabilityKind::CommandAsync { cancel, .. } => cancel,
            _ => None,
        }
    }
}
