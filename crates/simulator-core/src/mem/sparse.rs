use std::collections::HashMap;

/// Sparse byte-addressable memory backed by a word-granular table.
///
/// Storage is keyed by [`word_address`] and holds 4-byte little-endian
/// words. Absent keys read as zero, and any store that reduces a backing
/// word to zero removes its entry, so the footprint stays proportional to
/// non-zero content.
///
/// All accessors are infallible primitives: alignment and segment policy are
/// enforced by the simulator's validated entry points, never here. Unaligned
/// accesses are composed recursively (word from two halves, half from two
/// bytes), which keeps the little-endian byte order correct for arbitrary
/// addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    words: HashMap<u32, u32>,
}

/// Converts a byte address into the backing table's word key.
#[must_use]
pub const fn word_address(addr: u32) -> u32 {
    addr >> 2
}

/// Bit offset of the addressed byte within its backing word.
#[must_use]
pub const fn byte_shift(addr: u32) -> u32 {
    8 * (addr & 0b11)
}

/// Mask selecting the addressed byte within its backing word.
#[must_use]
pub const fn byte_mask(addr: u32) -> u32 {
    0xFF << byte_shift(addr)
}

impl Memory {
    /// Creates an empty memory; every load reads zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backing words currently materialized.
    #[must_use]
    pub fn word_footprint(&self) -> usize {
        self.words.len()
    }

    /// Raw backing word entry, if materialized.
    #[must_use]
    pub fn backing_word(&self, addr: u32) -> Option<u32> {
        self.words.get(&word_address(addr)).copied()
    }

    /// Loads one byte.
    #[must_use]
    pub fn load_byte(&self, addr: u32) -> u32 {
        let word = self.words.get(&word_address(addr)).copied().unwrap_or(0);
        (word & byte_mask(addr)) >> byte_shift(addr)
    }

    /// Loads a 16-bit halfword, composed from two bytes.
    #[must_use]
    pub fn load_half(&self, addr: u32) -> u32 {
        (self.load_byte(addr.wrapping_add(1)) << 8) | self.load_byte(addr)
    }

    /// Loads a 32-bit word; aligned addresses read the backing word
    /// directly, others compose two halfwords.
    #[must_use]
    pub fn load_word(&self, addr: u32) -> u32 {
        if addr % 4 == 0 {
            self.words.get(&word_address(addr)).copied().unwrap_or(0)
        } else {
            (self.load_half(addr.wrapping_add(2)) << 16) | self.load_half(addr)
        }
    }

    /// Loads a 64-bit long composed from two words, low word first.
    #[must_use]
    pub fn load_long(&self, addr: u32) -> u64 {
        (u64::from(self.load_word(addr.wrapping_add(4))) << 32)
            | u64::from(self.load_word(addr))
    }

    /// Stores the low byte of `value`.
    pub fn store_byte(&mut self, addr: u32, value: u32) {
        let key = word_address(addr);
        let word = self.words.get(&key).copied().unwrap_or(0);
        let next = (word & !byte_mask(addr)) | ((value & 0xFF) << byte_shift(addr));
        self.put_word(key, next);
    }

    /// Stores the low 16 bits of `value`, low byte first.
    pub fn store_half(&mut self, addr: u32, value: u32) {
        self.store_byte(addr, value & 0xFF);
        self.store_byte(addr.wrapping_add(1), (value >> 8) & 0xFF);
    }

    /// Stores a 32-bit word; aligned addresses write the backing word
    /// directly, others compose two halfword stores.
    pub fn store_word(&mut self, addr: u32, value: u32) {
        if addr % 4 == 0 {
            self.put_word(word_address(addr), value);
        } else {
            self.store_half(addr, value & 0xFFFF);
            self.store_half(addr.wrapping_add(2), value >> 16);
        }
    }

    /// Stores a 64-bit long as two word stores, low word first.
    pub fn store_long(&mut self, addr: u32, value: u64) {
        let low = u32::try_from(value & 0xFFFF_FFFF).unwrap_or(0);
        let high = u32::try_from(value >> 32).unwrap_or(0);
        self.store_word(addr, low);
        self.store_word(addr.wrapping_add(4), high);
    }

    /// Clears the addressed byte, dropping the backing entry when the word
    /// becomes zero.
    pub fn remove_byte(&mut self, addr: u32) {
        let key = word_address(addr);
        let word = self.words.get(&key).copied().unwrap_or(0);
        self.put_word(key, word & !byte_mask(addr));
    }

    fn put_word(&mut self, key: u32, value: u32) {
        if value == 0 {
            self.words.remove(&key);
        } else {
            self.words.insert(key, value);
        }
    }
}
