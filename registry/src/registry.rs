//! The persistent key/value registry proper.
//!
//! # Directory nodes
//!
//! Each directory node is six words (48 bytes, little-endian):
//!
//! ```text
//! word 0: ready flag    0x00…00 = committed,  0xFF…FF = not yet
//! word 1: delete flag   0x00…00 = tombstoned, 0xFF…FF = live
//! word 2: key offset    device byte offset of the key bytes
//! word 3: key length    in bytes
//! word 4: value offset  device byte offset of the value bytes
//! word 5: value length  in bytes
//! ```
//!
//! A node moves strictly forward: erased, then pending (spans programmed),
//! then live (ready programmed), then tombstoned (delete programmed). Only
//! live nodes are visible to lookups; a crash between any two programs
//! leaves a pending or tombstoned node that readers skip.
//!
//! # Iteration rule
//!
//! Lookup scans stop at the first node whose entire footprint is erased,
//! treating it as the logical end of the directory. Any node with any
//! programmed bit is skipped over, never stopped at, so tombstones and
//! crash debris in the middle do not hide later entries, and allocation
//! keeps appending at the directory tail.

use switchyard_abi::{Error, Result};
use switchyard_lib::{InitFlag, TicketMutex, log_debug, log_info};

use crate::contract::contract_require;
use crate::flash::{ERASED_WORD, FlashStore, WORD_BYTES, bytes_equal, read_bytes};
use crate::writer::FlashWriter;

/// Words per directory node.
pub const NODE_WORDS: usize = 6;

const WORD_READY: usize = 0;
const WORD_DELETE: usize = 1;
const WORD_KEY_OFFSET: usize = 2;
const WORD_KEY_LEN: usize = 3;
const WORD_VALUE_OFFSET: usize = 4;
const WORD_VALUE_LEN: usize = 5;

/// Value programmed into a flag word to set it.
const FLAG_SET: u64 = 0;

/// Placement of the registry inside a flash device, in word indices.
#[derive(Debug, Clone, Copy)]
pub struct RegistryLayout {
    /// First word of the node directory.
    pub node_start: usize,
    /// Number of directory nodes.
    pub node_count: usize,
    /// First word of the data region.
    pub data_start: usize,
    /// Size of the data region in words.
    pub data_words: usize,
}

impl RegistryLayout {
    pub const fn new(
        node_start: usize,
        node_count: usize,
        data_start: usize,
        data_words: usize,
    ) -> Self {
        Self {
            node_start,
            node_count,
            data_start,
            data_words,
        }
    }

    fn node_base(&self, index: usize) -> usize {
        self.node_start + index * NODE_WORDS
    }

    fn node_region_words(&self) -> usize {
        self.node_count * NODE_WORDS
    }

    fn data_end(&self) -> usize {
        self.data_start + self.data_words
    }

    fn validate(&self, store: &dyn FlashStore) -> Result<()> {
        let node_end = self.node_start + self.node_region_words();
        if self.node_count == 0 || self.data_words == 0 {
            return Err(Error::InvalidArgument);
        }
        if node_end > store.len_words() || self.data_end() > store.len_words() {
            return Err(Error::InvalidArgument);
        }
        let disjoint = node_end <= self.data_start || self.data_end() <= self.node_start;
        if !disjoint {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }
}

/// Observable state of a directory node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// Entire footprint erased; logical end of the directory.
    Erased,
    /// Committed and not deleted; visible to lookups.
    Live,
    /// Anything else: pending, tombstoned, or crash debris. Skipped.
    Dead,
}

/// Decoded directory node.
#[derive(Debug, Clone, Copy)]
struct Node {
    state: NodeState,
    key_offset: u64,
    key_len: u64,
    value_offset: u64,
    value_len: u64,
}

/// Usage report, see [`Registry::get_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryInfo {
    /// Directory capacity in nodes.
    pub total_nodes: usize,
    /// Fully erased nodes, available for new entries.
    pub free_nodes: usize,
    /// Live nodes.
    pub in_use_nodes: usize,
    /// Data region capacity in bytes.
    pub total_data_bytes: usize,
    /// Bytes past the append point.
    pub free_data_bytes: usize,
    /// Bytes referenced by live nodes (word-padded).
    pub in_use_data_bytes: usize,
}

/// Flash-backed key/value store.
///
/// `const`-constructible over any [`FlashStore`]; state is entirely in the
/// flash, so building a new `Registry` over the same device after a power
/// cycle restores every committed record.
pub struct Registry<'a> {
    state: InitFlag,
    /// Serializes all flash mutation and the scans that feed it.
    lock: TicketMutex<()>,
    store: &'a dyn FlashStore,
    layout: RegistryLayout,
}

impl<'a> Registry<'a> {
    /// New, uninitialized registry over `store`.
    pub const fn new(store: &'a dyn FlashStore, layout: RegistryLayout) -> Self {
        Self {
            state: InitFlag::new(),
            lock: TicketMutex::new(()),
            store,
            layout,
        }
    }

    /// One-time initialization; validates the layout against the device.
    pub fn init(&self) -> Result<()> {
        if !self.state.begin_init() {
            return Err(Error::AlreadyInitialized);
        }
        if let Err(err) = self.layout.validate(self.store) {
            self.state.reset();
            return Err(err);
        }
        self.state.complete_init();
        log_info!(
            "registry: ready, {} nodes, {} data bytes",
            self.layout.node_count,
            self.layout.data_words * WORD_BYTES
        );
        Ok(())
    }

    /// Tear down so `init` may run again (e.g. against a re-flashed
    /// device). Never touches the flash.
    pub fn deinit(&self) -> Result<()> {
        self.ensure_ready()?;
        self.state.reset();
        Ok(())
    }

    /// Store a new key/value record.
    ///
    /// Fails `Duplicate` if the key is live, `OutOfMemory` when the data
    /// region cannot hold the padded bytes, `NoSpace` when the directory
    /// has no erased node left.
    pub fn add(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        contract_require!(!key.is_empty(), Error::InvalidArgument);
        contract_require!(!value.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        if self.find_live(key).is_some() {
            return Err(Error::Duplicate);
        }

        let key_words = key.len().div_ceil(WORD_BYTES);
        let value_words = value.len().div_ceil(WORD_BYTES);
        let key_start = self.data_free_start();
        let value_start = key_start + key_words;
        if value_start + value_words > self.layout.data_end() {
            return Err(Error::OutOfMemory);
        }
        let Some(node_index) = self.first_erased_node() else {
            return Err(Error::NoSpace);
        };

        // Data bytes first, then the span words, then the ready flag. A
        // crash at any point leaves the node invisible; only the final
        // single-word program makes it live.
        let mut writer = FlashWriter::open(self.store, key_start);
        writer.write(key)?;
        writer.close(0x00)?;
        let mut writer = FlashWriter::open(self.store, value_start);
        writer.write(value)?;
        writer.close(0x00)?;

        let base = self.layout.node_base(node_index);
        self.store
            .write_word(base + WORD_KEY_OFFSET, (key_start * WORD_BYTES) as u64)?;
        self.store.write_word(base + WORD_KEY_LEN, key.len() as u64)?;
        self.store
            .write_word(base + WORD_VALUE_OFFSET, (value_start * WORD_BYTES) as u64)?;
        self.store
            .write_word(base + WORD_VALUE_LEN, value.len() as u64)?;
        self.store.write_word(base + WORD_READY, FLAG_SET)?;

        log_debug!(
            "registry: added node {} ({} key bytes, {} value bytes)",
            node_index,
            key.len(),
            value.len()
        );
        Ok(())
    }

    /// Tombstone the live record for `key`.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.ensure_ready()?;
        contract_require!(!key.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        let Some((node_index, _)) = self.find_live(key) else {
            return Err(Error::NotFound);
        };
        self.store
            .write_word(self.layout.node_base(node_index) + WORD_DELETE, FLAG_SET)?;
        log_debug!("registry: deleted node {}", node_index);
        Ok(())
    }

    /// Copy the live value for `key` into `out`.
    ///
    /// Returns the stored length. Fails `NoSpace` when `out` is too small
    /// for the value.
    pub fn try_get_value(&self, key: &[u8], out: &mut [u8]) -> Result<usize> {
        self.ensure_ready()?;
        contract_require!(!key.is_empty(), Error::InvalidArgument);

        let _guard = self.lock.lock();
        let Some((_, node)) = self.find_live(key) else {
            return Err(Error::NotFound);
        };
        let len = node.value_len as usize;
        if out.len() < len {
            return Err(Error::NoSpace);
        }
        read_bytes(self.store, node.value_offset as usize, &mut out[..len]);
        Ok(len)
    }

    /// Bulk-erase the directory and the data region.
    pub fn clean_all(&self) -> Result<()> {
        self.ensure_ready()?;

        let _guard = self.lock.lock();
        self.store
            .erase(self.layout.node_start, self.layout.node_region_words())?;
        self.store.erase(self.layout.data_start, self.layout.data_words)?;
        log_info!("registry: cleaned");
        Ok(())
    }

    /// Report node and data usage.
    ///
    /// Unlike lookups, this walks the whole directory, so free nodes past
    /// the logical end are counted too.
    pub fn get_info(&self) -> Result<RegistryInfo> {
        self.ensure_ready()?;

        let _guard = self.lock.lock();
        let mut info = RegistryInfo {
            total_nodes: self.layout.node_count,
            free_nodes: 0,
            in_use_nodes: 0,
            total_data_bytes: self.layout.data_words * WORD_BYTES,
            free_data_bytes: (self.layout.data_end() - self.data_free_start()) * WORD_BYTES,
            in_use_data_bytes: 0,
        };
        for index in 0..self.layout.node_count {
            let node = self.load_node(index);
            match node.state {
                NodeState::Erased => info.free_nodes += 1,
                NodeState::Live => {
                    info.in_use_nodes += 1;
                    let padded_value = (node.value_len as usize).div_ceil(WORD_BYTES) * WORD_BYTES;
                    info.in_use_data_bytes +=
                        node.value_offset as usize + padded_value - node.key_offset as usize;
                }
                NodeState::Dead => {}
            }
        }
        Ok(info)
    }

    #[inline]
    fn ensure_ready(&self) -> Result<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn load_node(&self, index: usize) -> Node {
        let base = self.layout.node_base(index);
        let ready = self.store.read_word(base + WORD_READY);
        let delete = self.store.read_word(base + WORD_DELETE);
        let key_offset = self.store.read_word(base + WORD_KEY_OFFSET);
        let key_len = self.store.read_word(base + WORD_KEY_LEN);
        let value_offset = self.store.read_word(base + WORD_VALUE_OFFSET);
        let value_len = self.store.read_word(base + WORD_VALUE_LEN);

        let erased = ready == ERASED_WORD
            && delete == ERASED_WORD
            && key_offset == ERASED_WORD
            && key_len == ERASED_WORD
            && value_offset == ERASED_WORD
            && value_len == ERASED_WORD;
        let state = if erased {
            NodeState::Erased
        } else if ready == FLAG_SET && delete == ERASED_WORD {
            NodeState::Live
        } else {
            NodeState::Dead
        };
        Node {
            state,
            key_offset,
            key_len,
            value_offset,
            value_len,
        }
    }

    /// First live node holding `key`, scanning up to the logical end of the
    /// directory. Caller holds the lock.
    fn find_live(&self, key: &[u8]) -> Option<(usize, Node)> {
        for index in 0..self.layout.node_count {
            let node = self.load_node(index);
            match node.state {
                NodeState::Erased => return None,
                NodeState::Live => {
                    if node.key_len as usize == key.len()
                        && bytes_equal(self.store, node.key_offset as usize, key)
                    {
                        return Some((index, node));
                    }
                }
                NodeState::Dead => {}
            }
        }
        None
    }

    /// First fully erased directory node.
    fn first_erased_node(&self) -> Option<usize> {
        (0..self.layout.node_count).find(|&index| self.load_node(index).state == NodeState::Erased)
    }

    /// One word past the highest programmed word of the data region; the
    /// append point for new records.
    fn data_free_start(&self) -> usize {
        let mut index = self.layout.data_end();
        while index > self.layout.data_start {
            if self.store.read_word(index - 1) != ERASED_WORD {
                return index;
            }
            index -= 1;
        }
        self.layout.data_start
    }
}
