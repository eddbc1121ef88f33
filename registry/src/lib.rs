//! Flash-backed key/value registry.
//!
//! Persists small configuration records across power cycles using nothing
//! but the two operations NOR flash actually offers: programming a 64-bit
//! word once (clearing bits) and bulk-erasing pages back to all-ones.
//!
//! The flash region is split into a **node directory** (fixed array of
//! 48-byte records) and an append-only **data region**. A record becomes
//! visible by programming its `ready` word last, and invisible again by
//! programming its `delete` word; both are single-word writes, so a crash
//! at any instant leaves every record either absent or complete.
//!
//! Space held by deleted records is only reclaimed by
//! [`Registry::clean_all`]; there is no compaction.

#![no_std]

#[cfg(test)]
extern crate std;

mod contract;
mod registry;
mod writer;

pub mod flash;
pub mod mem;

pub use flash::{FlashError, FlashResult, FlashStore};
pub use mem::MemFlash;
pub use registry::{NODE_WORDS, Registry, RegistryInfo, RegistryLayout};
pub use writer::FlashWriter;
