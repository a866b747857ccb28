//! The single saturating-counter predictor.
//!
//! Grounded in `counter_predictor.h`: one `s`-bit counter, no history, no
//! addressing — every conditional branch in the program shares the same
//! counter, starting at `0` (`resetPredictorState` zeroes the array, as for
//! every predictor in this suite).

use ripes_support::bits::bitmask;
use ripes_support::AInt;

use crate::counters::AccuracyCounters;
use crate::history::HistoryArray;
use crate::predictor::Predictor;

/// A predictor backed by a single `s`-bit saturating counter shared by
/// every conditional branch (spec.md §4.10's "Counter" row: `lht` size 1,
/// `pht` size 1, `s` bits).
#[derive(Debug, Clone)]
pub struct CounterPredictor {
    counter_bits: u32,
    lht: HistoryArray,
    pht: HistoryArray,
    counters: AccuracyCounters,
    reverse_stack_depth: usize,
}

impl CounterPredictor {
    /// A fresh predictor with a `counter_bits`-wide saturating counter,
    /// starting at `0`, retaining `reverse_stack_depth` snapshots.
    #[must_use]
    pub fn new(counter_bits: u32, reverse_stack_depth: usize) -> Self {
        Self {
            counter_bits,
            lht: HistoryArray::new(1, 1, reverse_stack_depth),
            pht: HistoryArray::new(1, counter_bits, reverse_stack_depth),
            counters: AccuracyCounters::default(),
            reverse_stack_depth,
        }
    }

    /// The counter's current raw value (`0..2^counter_bits`).
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.pht.get(0)
    }

    /// Forces the counter to an explicit state, for tests and for hosts
    /// seeding a predictor into a specific state.
    pub fn set_counter(&mut self, value: u32) {
        self.pht.set(0, value);
    }
}

impl Default for CounterPredictor {
    fn default() -> Self {
        Self::new(2, 1024)
    }
}

/// `true` iff the counter's value occupies the upper half of its range
/// (spec.md §4.10: "`pht[0] >> (s-1)`").
fn upper_half(value: u32, width: u32) -> bool {
    (value >> (width - 1)) != 0
}

impl Predictor for CounterPredictor {
    fn predict(&mut self, _addr: AInt, _is_branch: bool, _is_conditional: bool) -> bool {
        upper_half(self.counter(), self.counter_bits)
    }

    fn update(
        &mut self,
        _addr: AInt,
        predicted_taken: bool,
        was_miss: bool,
        _is_branch: bool,
        is_conditional: bool,
    ) {
        self.counters.record(is_conditional, was_miss);
        if !is_conditional {
            return;
        }
        let actual_taken = predicted_taken != was_miss;
        let max = bitmask(self.counter_bits) as u32;
        let current = self.counter();
        let updated = if actual_taken {
            current.saturating_add(1).min(max)
        } else {
            current.saturating_sub(1)
        };
        self.pht.set(0, updated);
    }

    fn save_state(&mut self) {
        self.lht.save();
        self.pht.save();
    }

    fn restore_state(&mut self) {
        self.lht.restore();
        self.pht.restore();
    }

    fn reset_state(&mut self) {
        self.lht.reset();
        self.pht.reset();
    }

    fn reset_counters(&mut self) {
        self.counters.reset();
    }

    fn set_reverse_stack_depth(&mut self, depth: usize) {
        self.reverse_stack_depth = depth;
        self.lht.set_max_snapshots(depth);
        self.pht.set_max_snapshots(depth);
    }

    fn counters(&self) -> AccuracyCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_two_bit_counter_weakly_not_taken_becomes_weakly_taken_on_a_miss() {
        // spec.md S6: a 2-bit counter in state `01` (weakly not-taken); an
        // update(..., was_miss=true) on a taken branch moves it to `10`
        // (weakly taken), and the next predict returns true.
        let mut p = CounterPredictor::new(2, 4);
        p.set_counter(0b01);
        assert!(!p.predict(0, true, true));
        p.update(0, false, true, true, true);
        assert_eq!(p.counter(), 0b10);
        assert!(p.predict(0, true, true));
    }

    #[test]
    fn fresh_predictor_starts_at_zero() {
        let p = CounterPredictor::new(2, 4);
        assert_eq!(p.counter(), 0);
    }

    #[test]
    fn counter_saturates_at_bounds() {
        let mut p = CounterPredictor::new(2, 4);
        for _ in 0..10 {
            let predicted = p.predict(0, true, true);
            p.update(0, predicted, false, true, true);
            p.update(0, true, true, true, true);
        }
        assert!(p.counter() <= 0b11);
    }

    #[test]
    fn unconditional_branches_do_not_move_the_counter() {
        let mut p = CounterPredictor::default();
        let before = p.counter();
        p.update(0, true, false, true, false);
        assert_eq!(p.counter(), before);
    }
}
