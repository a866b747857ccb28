//! The cache engine itself: [`Cache`], wiring together a [`CacheConfig`],
//! the per-line [`CacheWay`] state, an [`AccessTrace`], and a [`TraceStack`]
//! undo log.
//!
//! Grounded in the original simulator's `CacheSim::access`/`CacheSim::undo`,
//! reworked into the seven-step algorithm spec.md §4.9 lays out: locate the
//! set, select a victim on miss, fold counters into the trace, mark
//! dirtiness, rotate LRU ranks, push an undo entry, and notify observers.

use std::collections::BTreeSet;

use rand::Rng;
use ripes_support::AInt;

use crate::config::{CacheConfig, ReplacementPolicy, WriteAllocPolicy, WritePolicy};
use crate::events::CacheEvent;
use crate::trace::{AccessCounters, AccessTrace, TraceStack, TraceStackEntry};
use crate::transaction::{AccessType, CacheTransaction};
use crate::way::CacheWay;

/// How many undo entries a freshly constructed [`Cache`] retains by default.
pub const DEFAULT_TRACE_STACK_DEPTH: usize = 1024;

fn fresh_line(ways: usize) -> Vec<CacheWay> {
    let max_rank = ways.saturating_sub(1);
    (0..ways).map(|_| CacheWay::invalid_at_rank(max_rank)).collect()
}

/// A configurable set-associative cache with a bidirectional access trace.
///
/// Every [`Cache::access`] is undoable: [`Cache::undo`] pops the most recent
/// access and restores exactly the state it changed, bounded by the undo
/// log's configured depth.
#[derive(Debug, Clone)]
pub struct Cache {
    config: CacheConfig,
    sets: Vec<Vec<CacheWay>>,
    trace: AccessTrace,
    trace_stack: TraceStack,
    cycle: u64,
    events: Vec<CacheEvent>,
}

impl Cache {
    /// A new cache with the given configuration and undo-log depth.
    #[must_use]
    pub fn new(config: CacheConfig, trace_stack_depth: usize) -> Self {
        let sets = (0..config.lines()).map(|_| fresh_line(config.ways())).collect();
        Self {
            config,
            sets,
            trace: AccessTrace::new(),
            trace_stack: TraceStack::new(trace_stack_depth),
            cycle: 0,
            events: Vec::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The ways of line `index`, if `index` is in range.
    #[must_use]
    pub fn get_line(&self, index: usize) -> Option<&[CacheWay]> {
        self.sets.get(index).map(Vec::as_slice)
    }

    /// The current simulated cycle (the number of accesses since the last
    /// reset or reconfiguration).
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// The running hit/miss/writeback counters.
    #[must_use]
    pub fn counters(&self) -> AccessCounters {
        self.trace.latest()
    }

    /// The full access trace, for plotting hit rate over time.
    #[must_use]
    pub fn access_trace(&self) -> &AccessTrace {
        &self.trace
    }

    /// Number of accesses currently undoable.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.trace_stack.len()
    }

    /// Drains and returns every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<CacheEvent> {
        std::mem::take(&mut self.events)
    }

    /// Performs one access, updating cache state and the access trace, and
    /// returns the resulting transaction. Never fails: spec.md's cache has
    /// no failure modes of its own.
    pub fn access(&mut self, address: AInt, access_type: AccessType) -> CacheTransaction {
        let (tag, line, block) = self.config.decompose(address);
        let is_write = matches!(access_type, AccessType::Write);

        let hit_way = self.sets[line].iter().position(|w| w.valid && w.tag == tag);
        let no_alloc_miss =
            hit_way.is_none() && is_write && self.config.write_alloc == WriteAllocPolicy::NoWriteAllocate;

        let (transaction, undo_entry) = if let Some(way) = hit_way {
            let old = self.sets[line][way].clone();
            let marks_dirty = is_write && self.config.write_policy == WritePolicy::WriteBack;
            if marks_dirty {
                let slot = &mut self.sets[line][way];
                slot.dirty = true;
                slot.dirty_blocks.insert(block);
            }
            self.touch_lru(line, way, old.lru_rank);

            let transaction = CacheTransaction {
                address,
                line,
                way: Some(way),
                block,
                is_hit: true,
                is_write,
                // A hit never evicts anything, so it is never a writeback:
                // only a dirty *eviction* (the miss branch below) is.
                is_writeback: false,
                trans_to_valid: false,
                tag_changed: false,
                cycle: self.cycle,
            };
            (
                transaction.clone(),
                Some(TraceStackEntry { transaction, old_way: Some(old) }),
            )
        } else if no_alloc_miss {
            let transaction = CacheTransaction {
                address,
                line,
                way: None,
                block,
                is_hit: false,
                is_write,
                is_writeback: false,
                trans_to_valid: false,
                tag_changed: false,
                cycle: self.cycle,
            };
            // No way is touched, but every processor cycle must still be
            // undoable (spec.md §5's cycle-for-cycle reversibility), so a
            // restoring no-op entry is pushed the same as a touching access.
            (
                transaction.clone(),
                Some(TraceStackEntry { transaction, old_way: None }),
            )
        } else {
            let victim = self.select_victim(line);
            let old = self.sets[line][victim].clone();
            let was_valid = old.valid;
            let evicted_dirty = was_valid && old.dirty;
            let is_writeback = evicted_dirty && self.config.write_policy == WritePolicy::WriteBack;

            self.sets[line][victim] = CacheWay {
                valid: true,
                dirty: false,
                tag,
                lru_rank: old.lru_rank,
                dirty_blocks: BTreeSet::new(),
            };
            if is_write && self.config.write_policy == WritePolicy::WriteBack {
                let slot = &mut self.sets[line][victim];
                slot.dirty = true;
                slot.dirty_blocks.insert(block);
            }
            self.touch_lru(line, victim, old.lru_rank);

            let transaction = CacheTransaction {
                address,
                line,
                way: Some(victim),
                block,
                is_hit: false,
                is_write,
                is_writeback,
                trans_to_valid: !was_valid,
                tag_changed: was_valid && old.tag != tag,
                cycle: self.cycle,
            };
            (
                transaction.clone(),
                Some(TraceStackEntry { transaction, old_way: Some(old) }),
            )
        };

        self.trace
            .record(self.cycle, transaction.is_hit, transaction.is_write, transaction.is_writeback);
        if let Some(entry) = undo_entry {
            self.trace_stack.push(entry);
        }
        self.events.push(CacheEvent::DataChanged(transaction.clone()));
        self.cycle += 1;
        transaction
    }

    /// Undoes the most recent access, if any is still in the undo log.
    /// Returns `false` if the log is empty.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.trace_stack.pop() else {
            return false;
        };
        let transaction = &entry.transaction;
        if let Some(way) = transaction.way {
            if transaction.is_hit {
                if let Some(old) = &entry.old_way {
                    self.revert_lru(transaction.line, way, old.lru_rank);
                }
            } else if let Some(old) = entry.old_way {
                self.sets[transaction.line][way] = old;
            }
        }
        self.cycle = self.cycle.saturating_sub(1);
        self.trace.truncate_from(self.cycle);
        true
    }

    /// Clears all lines, the access trace, and the undo log, keeping the
    /// current configuration. Equivalent to a cold-start reset.
    pub fn reset(&mut self) {
        self.sets = (0..self.config.lines()).map(|_| fresh_line(self.config.ways())).collect();
        self.trace.clear();
        self.trace_stack.clear();
        self.cycle = 0;
        self.events.push(CacheEvent::ConfigurationChanged);
    }

    /// Sets the block-offset bit width, clearing all state.
    pub fn set_blocks(&mut self, blocks_log2: u32) {
        self.config.blocks_log2 = blocks_log2;
        self.reconfigure();
    }

    /// Sets the line-index bit width, clearing all state.
    pub fn set_lines(&mut self, lines_log2: u32) {
        self.config.lines_log2 = lines_log2;
        self.reconfigure();
    }

    /// Sets the associativity, clearing all state.
    pub fn set_ways(&mut self, ways_log2: u32) {
        self.config.ways_log2 = ways_log2;
        self.reconfigure();
    }

    /// Sets the write-hit policy, clearing all state.
    pub fn set_write_policy(&mut self, policy: WritePolicy) {
        self.config.write_policy = policy;
        self.reconfigure();
    }

    /// Sets the write-miss policy, clearing all state.
    pub fn set_write_alloc_policy(&mut self, policy: WriteAllocPolicy) {
        self.config.write_alloc = policy;
        self.reconfigure();
    }

    /// Sets the victim-selection policy, clearing all state.
    pub fn set_replacement_policy(&mut self, policy: ReplacementPolicy) {
        self.config.repl_policy = policy;
        self.reconfigure();
    }

    /// Replaces the entire configuration at once, clearing all state.
    pub fn set_preset(&mut self, config: CacheConfig) {
        self.config = config;
        self.reconfigure();
    }

    /// Changes the undo log's bound, trimming from the oldest entry if over
    /// the new depth.
    pub fn set_trace_stack_depth(&mut self, depth: usize) {
        self.trace_stack.set_depth(depth);
    }

    fn reconfigure(&mut self) {
        self.sets = (0..self.config.lines()).map(|_| fresh_line(self.config.ways())).collect();
        self.trace.clear();
        self.trace_stack.clear();
        self.cycle = 0;
        self.events.push(CacheEvent::ConfigurationChanged);
    }

    fn select_victim(&mut self, line: usize) -> usize {
        match self.config.repl_policy {
            ReplacementPolicy::Lru => {
                let ways = &self.sets[line];
                if let Some(idx) = ways.iter().position(|w| !w.valid) {
                    idx
                } else {
                    let max_rank = ways.len().saturating_sub(1);
                    ways.iter().position(|w| w.lru_rank == max_rank).unwrap_or(0)
                }
            }
            ReplacementPolicy::Random => {
                let ways = self.sets[line].len();
                rand::thread_rng().gen_range(0..ways)
            }
        }
    }

    /// Forward LRU update (spec.md §4.9 step 5): every way whose rank was
    /// strictly below the touched way's pre-access rank `pre_rank` moves
    /// down one (ages), and the touched way becomes most-recently-used.
    fn touch_lru(&mut self, line: usize, touched: usize, pre_rank: usize) {
        for (i, way) in self.sets[line].iter_mut().enumerate() {
            if i != touched && way.lru_rank < pre_rank {
                way.lru_rank += 1;
            }
        }
        self.sets[line][touched].lru_rank = 0;
    }

    /// Inverse of [`Cache::touch_lru`]: restores the ranks `touch_lru` would
    /// have aged, given the touched way's rank before the forward update.
    fn revert_lru(&mut self, line: usize, touched: usize, old_rank: usize) {
        for (i, way) in self.sets[line].iter_mut().enumerate() {
            if i != touched && way.lru_rank <= old_rank {
                way.lru_rank -= 1;
            }
        }
        self.sets[line][touched].lru_rank = old_rank;
    }
}
