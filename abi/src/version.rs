//! Interface versions and the version match predicate.
//!
//! Interfaces are identified by `(name, version)`. Consumers acquire handles
//! with a [`MatchCriteria`] flag set describing which versions they accept
//! relative to a requested one, so a consumer built against `v1` can opt into
//! newer compatible revisions without naming them.

use bitflags::bitflags;

/// Interface version number.
pub type Version = u32;

/// Do not wait for a busy resource; fail immediately.
pub const NO_WAIT: u32 = 0x0000_0000;

/// Wait without a deadline for a busy resource.
pub const WAIT_FOREVER: u32 = 0xFFFF_FFFF;

bitflags! {
    /// Version acceptance criteria for handle acquisition.
    ///
    /// Flags combine: `EQUALS | LOWER_THAN` accepts the requested version
    /// and anything older. [`MatchCriteria::ANY`] accepts every version of
    /// a matching name.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MatchCriteria: u8 {
        /// Accept a version equal to the requested one.
        const EQUALS = 1 << 0;
        /// Accept versions newer than the requested one.
        const GREATER_THAN = 1 << 1;
        /// Accept versions older than the requested one.
        const LOWER_THAN = 1 << 2;
        /// Accept any version.
        const ANY = Self::EQUALS.bits() | Self::GREATER_THAN.bits() | Self::LOWER_THAN.bits();
    }
}

/// Returns true when `published` satisfies `criteria` relative to
/// `requested`.
pub fn version_matches(published: Version, requested: Version, criteria: MatchCriteria) -> bool {
    (criteria.contains(MatchCriteria::EQUALS) && published == requested)
        || (criteria.contains(MatchCriteria::GREATER_THAN) && published > requested)
        || (criteria.contains(MatchCriteria::LOWER_THAN) && published < requested)
}
