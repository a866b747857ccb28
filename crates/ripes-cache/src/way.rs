//! A single way's replacement and dirty-tracking state.

use std::collections::BTreeSet;

/// One way of one cache line: its tag, validity, dirtiness, and LRU rank.
///
/// `dirty_blocks` tracks which blocks within this line have been written
/// since the line was filled, so a writeback can report exactly which
/// blocks need propagating rather than the whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheWay {
    /// Whether this way currently holds a live line.
    pub valid: bool,
    /// Whether this way has been written since it was filled.
    pub dirty: bool,
    /// The tag of the address currently held, meaningless when `!valid`.
    pub tag: u64,
    /// This way's position in its line's LRU order: `0` is most recently
    /// used, `ways - 1` is least recently used (or never used).
    pub lru_rank: usize,
    /// Blocks within this line written since the line was filled.
    pub dirty_blocks: BTreeSet<usize>,
}

impl CacheWay {
    /// An invalid way at a given initial LRU rank. Freshly reset caches seed
    /// every way at rank `ways - 1`, matching the convention that an unused
    /// way is the most eligible LRU victim.
    #[must_use]
    pub fn invalid_at_rank(lru_rank: usize) -> Self {
        Self {
            valid: false,
            dirty: false,
            tag: 0,
            lru_rank,
            dirty_blocks: BTreeSet::new(),
        }
    }
}
