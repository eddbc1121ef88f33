//! Buffered byte-stream writer over word-programmable flash.
//!
//! Callers hand in arbitrary byte slices; the writer packs them
//! little-endian into 64-bit words and programs each word exactly once.
//! `close` pads the final partial word, so consecutive streams must start
//! on fresh word boundaries.

use crate::flash::{FlashResult, FlashStore, WORD_BYTES};

/// In-progress byte stream into flash.
pub struct FlashWriter<'a> {
    store: &'a dyn FlashStore,
    /// Next word to program.
    word_index: usize,
    /// Partial-word accumulation buffer.
    buffer: [u8; WORD_BYTES],
    /// Number of buffered bytes not yet programmed.
    pending: usize,
}

impl<'a> FlashWriter<'a> {
    /// Start writing at `word_index`. The destination words must be erased.
    pub fn open(store: &'a dyn FlashStore, word_index: usize) -> Self {
        Self {
            store,
            word_index,
            buffer: [0; WORD_BYTES],
            pending: 0,
        }
    }

    /// Append `data` to the stream, programming every completed word.
    pub fn write(&mut self, data: &[u8]) -> FlashResult<()> {
        for &byte in data {
            self.buffer[self.pending] = byte;
            self.pending += 1;
            if self.pending == WORD_BYTES {
                self.flush_word()?;
            }
        }
        Ok(())
    }

    /// Finish the stream, padding a trailing partial word with `pad`.
    pub fn close(mut self, pad: u8) -> FlashResult<()> {
        if self.pending != 0 {
            for byte in self.buffer[self.pending..].iter_mut() {
                *byte = pad;
            }
            self.pending = WORD_BYTES;
            self.flush_word()?;
        }
        Ok(())
    }

    fn flush_word(&mut self) -> FlashResult<()> {
        let value = u64::from_le_bytes(self.buffer);
        self.store.write_word(self.word_index, value)?;
        self.word_index += 1;
        self.pending = 0;
        Ok(())
    }
}
