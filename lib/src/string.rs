//! Byte-buffer text helpers.
//!
//! The query surface formats identifier lists into caller-provided byte
//! buffers without allocating. [`ByteWriter`] adapts such a buffer to
//! `core::fmt::Write` and keeps track of how much was written and how much
//! room remains.

use core::fmt;

/// `fmt::Write` sink over a caller-provided byte buffer.
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> ByteWriter<'a> {
    /// Wrap `buf`; writing starts at the beginning.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Number of bytes written so far.
    pub fn written(&self) -> usize {
        self.len
    }

    /// Number of bytes still available.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// The written prefix.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl fmt::Write for ByteWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        if bytes.len() > self.remaining() {
            return Err(fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

/// Parse an unsigned decimal number. Rejects empty input, junk characters,
/// and overflow.
pub fn parse_u32(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    for byte in text.bytes() {
        if !byte.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add((byte - b'0') as u32)?;
    }
    Some(value)
}

/// Number of decimal digits needed to print `value`.
pub fn decimal_width(value: u32) -> usize {
    match value {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1_000..=9_999 => 4,
        10_000..=99_999 => 5,
        100_000..=999_999 => 6,
        1_000_000..=9_999_999 => 7,
        10_000_000..=99_999_999 => 8,
        100_000_000..=999_999_999 => 9,
        _ => 10,
    }
}
