//! Interface descriptors.
//!
//! A descriptor is the immutable record a producer hands to the switchboard
//! when publishing: the interface name and version plus the ordered list of
//! capabilities. Descriptors are built in static context with the `const`
//! constructors here, so the whole record lives in read-only memory and no
//! component ever needs to copy it.
//!
//! The `&'static` requirement is the lifetime contract of publishing: the
//! storage outlives every handle and every in-flight call by construction.

use core::fmt;

use crate::capability::{Capability, CapabilityIndex};
use crate::version::Version;

/// Immutable description of a published interface.
#[derive(Clone, Copy)]
pub struct InterfaceDescriptor {
    /// Interface name. Non-empty UTF-8.
    pub name: &'static str,
    /// Interface version.
    pub version: Version,
    /// Ordered capability list.
    pub capabilities: &'static [Capability],
}

impl InterfaceDescriptor {
    /// Create a descriptor.
    ///
    /// ```ignore
    /// static CAPS: [Capability; 1] = [Capability::command("sum", sum)];
    /// static MATH: InterfaceDescriptor = InterfaceDescriptor::new("math", 1, &CAPS);
    /// ```
    pub const fn new(
        name: &'static str,
        version: Version,
        capabilities: &'static [Capability],
    ) -> Self {
        Self {
            name,
            version,
            capabilities,
        }
    }

    /// The capability at `index`, if in range.
    pub fn capability(&self, index: CapabilityIndex) -> Option<&Capability> {
        self.capabilities.get(index as usize)
    }

    /// Index of the first capability whose name matches exactly.
    pub fn find_capability(&self, name: &str) -> Option<CapabilityIndex> {
        self.capabilities
            .iter()
            .position(|capability| capability.name == name)
            .map(|index| index as CapabilityIndex)
    }

    /// Write the interface identifier (`name.version`) into `writer`.
    pub fn write_id<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "{}.{}", self.name, self.version)
    }
}
