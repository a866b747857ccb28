//! Cache geometry and policy configuration.
//!
//! A [`CacheConfig`] fully determines how an address splits into
//! tag/line/block, how many ways each line has, and how misses are resolved.
//! Every field is a `log2` of a power-of-two count (blocks per line, lines
//! per way, ways), matching the original simulator's shift-based address
//! decomposition instead of storing raw counts and recomputing masks.

use ripes_support::AInt;

/// How a dirty line hit by a write is eventually propagated to memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WritePolicy {
    /// A written line is marked dirty; memory sees the write only when the
    /// line is evicted.
    WriteBack,
    /// Every write is immediately considered propagated to memory; lines are
    /// never marked dirty and no write ever triggers a writeback on eviction.
    WriteThrough,
}

/// Whether a write that misses allocates a line, the way a read miss always
/// does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteAllocPolicy {
    /// A write miss allocates a line and proceeds like a read miss.
    WriteAllocate,
    /// A write miss leaves the cache untouched.
    NoWriteAllocate,
}

/// The victim-selection policy used when a miss must allocate a line and no
/// way in the target set is currently invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReplacementPolicy {
    /// Evict the way whose LRU rank is `ways - 1` (least recently touched).
    Lru,
    /// Evict a uniformly chosen way.
    Random,
}

/// A complete cache geometry and policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    /// log2 of the number of 4-byte words per block (the cache line's
    /// transfer unit).
    pub blocks_log2: u32,
    /// log2 of the number of lines (sets) per way.
    pub lines_log2: u32,
    /// log2 of the associativity (ways per line).
    pub ways_log2: u32,
    /// Write-hit policy.
    pub write_policy: WritePolicy,
    /// Write-miss policy.
    pub write_alloc: WriteAllocPolicy,
    /// Miss victim-selection policy.
    pub repl_policy: ReplacementPolicy,
}

impl Default for CacheConfig {
    /// A single 1-way, 1-line, 1-block cache: the smallest configuration
    /// that still behaves like a cache (every access maps to the one line).
    fn default() -> Self {
        Self {
            blocks_log2: 0,
            lines_log2: 0,
            ways_log2: 0,
            write_policy: WritePolicy::WriteBack,
            write_alloc: WriteAllocPolicy::WriteAllocate,
            repl_policy: ReplacementPolicy::Lru,
        }
    }
}

impl CacheConfig {
    /// Associativity: `2^ways_log2` ways per line.
    #[must_use]
    pub fn ways(&self) -> usize {
        1usize << self.ways_log2
    }

    /// `2^lines_log2` lines (sets) per way.
    #[must_use]
    pub fn lines(&self) -> usize {
        1usize << self.lines_log2
    }

    /// `2^blocks_log2` words (4 bytes each) per block.
    #[must_use]
    pub fn blocks(&self) -> usize {
        1usize << self.blocks_log2
    }

    /// Splits a byte address into `(tag, line, block)`. The low 2 bits
    /// (word alignment) are always discarded, then `blocks_log2` bits select
    /// the block within a line, `lines_log2` bits select the line, and
    /// everything above is the tag.
    #[must_use]
    pub fn decompose(&self, address: AInt) -> (u64, usize, usize) {
        let block_bits = self.blocks_log2;
        let line_bits = self.lines_log2;
        let block_mask = (self.blocks() - 1) as u64;
        let line_mask = (self.lines() - 1) as u64;

        let block = (address >> 2) & block_mask;
        let line = (address >> (2 + block_bits)) & line_mask;
        let tag = address >> (2 + block_bits + line_bits);
        (tag, line as usize, block as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decompose_splits_word_aligned_address_into_tag_line_block() {
        // 1 block/line (blocks_log2=0), 2 lines (lines_log2=1): bit 2
        // selects the line, everything from bit 3 up is the tag.
        let config = CacheConfig {
            blocks_log2: 0,
            lines_log2: 1,
            ways_log2: 1,
            ..CacheConfig::default()
        };
        assert_eq!(config.decompose(0x00), (0, 0, 0));
        assert_eq!(config.decompose(0x10), (2, 0, 0));
        assert_eq!(config.decompose(0x20), (4, 0, 0));
        assert_eq!(config.decompose(0x04), (0, 1, 0));
    }

    #[test]
    fn decompose_selects_block_within_a_multi_word_line() {
        let config = CacheConfig {
            blocks_log2: 2, // 4 words per block
            lines_log2: 0,
            ways_log2: 0,
            ..CacheConfig::default()
        };
        assert_eq!(config.decompose(0x00), (0, 0, 0));
        assert_eq!(config.decompose(0x04), (0, 0, 1));
        assert_eq!(config.decompose(0x08), (0, 0, 2));
        assert_eq!(config.decompose(0x10), (1, 0, 0));
    }

    #[test]
    fn ways_lines_blocks_are_powers_of_two() {
        let config = CacheConfig {
            blocks_log2: 3,
            lines_log2: 2,
            ways_log2: 1,
            ..CacheConfig::default()
        };
        assert_eq!(config.blocks(), 8);
        assert_eq!(config.lines(), 4);
        assert_eq!(config.ways(), 2);
    }
}
