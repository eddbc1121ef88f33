//! Query facility: enumerating interfaces and their capabilities.
//!
//! Results are comma-separated lists written into caller-provided byte
//! buffers; a 32-bit continuation token resumes an iteration that did not
//! fit. The token encodes where to pick up (phase, slot index, capability
//! index), so iterations hold no broker state and survive concurrent table
//! changes on a best-effort basis: visited slots are never revisited,
//! interfaces published mid-iteration may be skipped, and output is always
//! well-formed.

use core::fmt::Write;

use switchyard_abi::{Error, Result};
use switchyard_lib::ByteWriter;
use switchyard_lib::string::{decimal_width, parse_u32};

use crate::broker::Ipc;
use crate::config::MAX_INTERFACES;
use crate::contract::contract_require;

/// Iterating the table of published interfaces.
const PHASE_INTERFACES: u8 = 1;
/// Iterating the capability list of one interface.
const PHASE_CAPABILITIES: u8 = 2;

/// Token layout: bits 31-24 phase, 23-16 slot index, 15-0 capability index.
/// Zero is reserved for end-of-stream.
fn pack_token(phase: u8, slot: usize, capability: u16) -> u32 {
    ((phase as u32) << 24) | (((slot as u32) & 0xFF) << 16) | capability as u32
}

fn unpack_token(token: u32) -> (u8, usize, u16) {
    (
        (token >> 24) as u8,
        ((token >> 16) & 0xFF) as usize,
        (token & 0xFFFF) as u16,
    )
}

impl Ipc {
    /// Start a query.
    ///
    /// An empty `query` enumerates every published interface as
    /// `name.version` identifiers. A non-empty `query` is itself an
    /// interface identifier whose capabilities get enumerated; an unknown
    /// identifier fails `NotFound`.
    ///
    /// Returns the number of bytes written and the continuation token for
    /// [`query_next`](Ipc::query_next); a zero token means the iteration is
    /// complete. Fails `Eof` when there is nothing at all to return and
    /// `NoSpace` when `result` cannot hold even one entry.
    pub fn query(&self, query: &str, result: &mut [u8]) -> Result<(usize, u32)> {
        self.ensure_ready()?;
        contract_require!(!result.is_empty(), Error::InvalidArgument);

        if query.is_empty() {
            return self.fill_interfaces(0, result);
        }

        let (name, version_text) = query.rsplit_once('.').ok_or(Error::InvalidArgument)?;
        let version = parse_u32(version_text).ok_or(Error::InvalidArgument)?;
        let index = {
            let _guard = self.lock_table();
            self.find_exact(name, version).ok_or(Error::NotFound)?
        };
        self.fill_capabilities(index, 0, result)
    }

    /// Continue a query from a token returned by a previous call.
    ///
    /// A zero token (end-of-stream) and an exhausted iteration both fail
    /// `Eof`.
    pub fn query_next(&self, token: u32, result: &mut [u8]) -> Result<(usize, u32)> {
        self.ensure_ready()?;
        contract_require!(!result.is_empty(), Error::InvalidArgument);

        if token == 0 {
            return Err(Error::Eof);
        }
        let (phase, slot, capability) = unpack_token(token);
        match phase {
            PHASE_INTERFACES => self.fill_interfaces(slot, result),
            PHASE_CAPABILITIES => self.fill_capabilities(slot, capability, result),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// Write `name.version` entries for occupied slots starting at `start`.
    fn fill_interfaces(&self, start: usize, result: &mut [u8]) -> Result<(usize, u32)> {
        let _guard = self.lock_table();
        let mut writer = ByteWriter::new(result);
        let mut next_token = 0;
        for index in start..MAX_INTERFACES {
            let Some(descriptor) = self.slots()[index].load_descriptor() else {
                continue;
            };
            let separator = usize::from(writer.written() != 0);
            let needed =
                separator + descriptor.name.len() + 1 + decimal_width(descriptor.version);
            if needed > writer.remaining() {
                next_token = pack_token(PHASE_INTERFACES, index, 0);
                break;
            }
            // Sized above; the writes cannot fail.
            if separator != 0 {
                let _ = writer.write_str(",");
            }
            let _ = descriptor.write_id(&mut writer);
        }
        finish(&writer, next_token)
    }

    /// Write capability-name entries for slot `slot_index` starting at
    /// capability `start`.
    fn fill_capabilities(
        &self,
        slot_index: usize,
        start: u16,
        result: &mut [u8],
    ) -> Result<(usize, u32)> {
        let _guard = self.lock_table();
        let slot = self.slots().get(slot_index).ok_or(Error::InvalidArgument)?;
        let Some(descriptor) = slot.load_descriptor() else {
            // The interface disappeared between continuations.
            return Err(Error::Eof);
        };
        let mut writer = ByteWriter::new(result);
        let mut next_token = 0;
        let capabilities = descriptor.capabilities;
        for index in (start as usize)..capabilities.len() {
            let name = capabilities[index].name;
            let separator = usize::from(writer.written() != 0);
            if separator + name.len() > writer.remaining() {
                next_token = pack_token(PHASE_CAPABILITIES, slot_index, index as u16);
                break;
            }
            if separator != 0 {
                let _ = writer.write_str(",");
            }
            let _ = writer.write_str(name);
        }
        finish(&writer, next_token)
    }
}

fn finish(writer: &ByteWriter<'_>, next_token: u32) -> Result<(usize, u32)> {
    if writer.written() == 0 {
        if next_token == 0 {
            Err(Error::Eof)
        } else {
            // The buffer cannot hold even one whole entry; continuing would
            // spin on the same token forever.
            Err(Error::NoSpace)
        }
    } else {
        Ok((writer.written(), next_token))
    }
}
