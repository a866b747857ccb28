//! A single cache access, recorded as a transaction.

use ripes_support::AInt;

/// Whether an access reads or writes memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessType {
    /// A load.
    Read,
    /// A store.
    Write,
}

/// The complete record of one [`crate::Cache::access`] call: which line and
/// way it touched (if any), whether it hit, and what state transition the
/// touched way underwent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheTransaction {
    /// The accessed byte address.
    pub address: AInt,
    /// The set (line index) the address mapped to.
    pub line: usize,
    /// The way touched by this access. `None` only for a write miss under
    /// [`crate::config::WriteAllocPolicy::NoWriteAllocate`], where no way is
    /// ever allocated.
    pub way: Option<usize>,
    /// The block within the line the address mapped to.
    pub block: usize,
    /// Whether the access hit.
    pub is_hit: bool,
    /// Whether this was a write.
    pub is_write: bool,
    /// Whether resolving this access required writing back a dirty evicted
    /// line.
    pub is_writeback: bool,
    /// Whether the touched way was invalid before this access (a first-time
    /// fill rather than an eviction of a previously live line).
    pub trans_to_valid: bool,
    /// Whether the touched way held a different tag before this access (a
    /// genuine eviction, as opposed to a first-time fill).
    pub tag_changed: bool,
    /// The simulator cycle this access was recorded at.
    pub cycle: u64,
}
