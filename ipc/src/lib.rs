//! The switchyard broker: an in-process IPC switchboard.
//!
//! Producers publish versioned interfaces of callable capabilities;
//! consumers discover them by name and version criteria, acquire handles,
//! invoke capabilities through them, and release them. The broker keeps a
//! fixed table of interface slots and guarantees that a capability that
//! started executing keeps a live descriptor until it returns, even while
//! the producer is unpublishing.
//!
//! # Locking model
//!
//! One ticket mutex serializes every table mutation (publish, unpublish,
//! handle acquisition and release, flag changes, queries). The call path
//! never takes it: it pins the slot with a lock-free running counter so
//! capability code can re-enter the broker freely without self-deadlock.
//!
//! # Handle staleness
//!
//! Every publish stamps the slot with a fresh generation from a table-wide
//! counter. Handles carry the generation they were issued with; once the
//! slot is recycled, every operation on an old handle fails `NotFound`
//! instead of touching the new occupant.

#![no_std]

#[cfg(test)]
extern crate std;

mod broker;
mod call;
mod contract;
mod handle;
mod query;
mod slot;

pub mod config;

pub use broker::Ipc;
pub use handle::InterfaceHandle;
