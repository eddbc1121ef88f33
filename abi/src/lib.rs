//! Switchyard shared ABI types.
//!
//! This crate provides the canonical definitions for everything that crosses
//! the boundary between interface producers, interface consumers, and the
//! switchboard itself. Having a single source of truth eliminates:
//! - Duplicate type definitions between producers and the broker
//! - Mismatched error taxonomies across subsystems
//! - Descriptor layouts the broker cannot validate
//!
//! Everything here is plain data: no locks, no statics, no allocation. The
//! broker and the persistent registry build on these types but never extend
//! them.

#![no_std]
#![forbid(unsafe_code)]

pub mod capability;
pub mod descriptor;
pub mod error;
pub mod version;

pub use capability::{Capability, CapabilityFn, CapabilityIndex, CapabilityKind, SpanCapabilityFn};
pub use descriptor::InterfaceDescriptor;
pub use error::{Error, Result};
pub use version::{MatchCriteria, NO_WAIT, Version, WAIT_FOREVER, version_matches};
