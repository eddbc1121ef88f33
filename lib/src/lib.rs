//! Switchyard support primitives.
//!
//! Shared infrastructure under the broker and the persistent registry:
//! locking, one-time lifecycle flags, the logging facade, the platform
//! service table, and byte-buffer formatting helpers. None of it allocates;
//! everything is usable from a `static`.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod init_flag;
pub mod logging;
pub mod services;
pub mod string;
pub mod sync;

pub use init_flag::InitFlag;
pub use logging::{LogBackend, LogLevel, log_get_level, log_register_backend, log_set_level};
pub use string::ByteWriter;
pub use sync::{TicketMutex, TicketMutexGuard};
