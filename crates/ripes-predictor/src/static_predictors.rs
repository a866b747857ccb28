//! `AlwaysTaken` and `AlwaysNotTaken`: the two static predictors.
//!
//! Grounded in `always_taken_predictor.h`. `AlwaysNotTaken` has no standalone
//! type in the original GUI (only `AlwaysTaken`/`Counter`/`Global`/`Local` are
//! exposed there) but is spec.md §4.10's explicit fifth table row, built as
//! the structural mirror of `AlwaysTakenPredictor`.

use ripes_support::AInt;

use crate::counters::AccuracyCounters;
use crate::history::HistoryArray;
use crate::predictor::Predictor;

/// Predicts every branch taken, unconditionally.
#[derive(Debug, Clone)]
pub struct AlwaysTaken {
    counters: AccuracyCounters,
    // lht/pht are unused for prediction (spec.md §4.10: both size 1) but
    // kept so save_state/restore_state round-trip like every other
    // predictor's.
    lht: HistoryArray,
    pht: HistoryArray,
    reverse_stack_depth: usize,
}

impl AlwaysTaken {
    /// A fresh predictor retaining `reverse_stack_depth` snapshots.
    #[must_use]
    pub fn new(reverse_stack_depth: usize) -> Self {
        Self {
            counters: AccuracyCounters::default(),
            lht: HistoryArray::new(1, 1, reverse_stack_depth),
            pht: HistoryArray::new(1, 1, reverse_stack_depth),
            reverse_stack_depth,
        }
    }
}

impl Default for AlwaysTaken {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Predictor for AlwaysTaken {
    fn predict(&mut self, _addr: AInt, _is_branch: bool, _is_conditional: bool) -> bool {
        true
    }

    fn update(
        &mut self,
        _addr: AInt,
        _predicted_taken: bool,
        was_miss: bool,
        _is_branch: bool,
        is_conditional: bool,
    ) {
        self.counters.record(is_conditional, was_miss);
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

/// Predicts conditional branches not taken and unconditional branches taken
/// (an unconditional branch, by definition, is always "taken" — there is no
/// fall-through to mispredict against).
#[derive(Debug, Clone)]
pub struct AlwaysNotTaken {
    counters: AccuracyCounters,
    lht: HistoryArray,
    pht: HistoryArray,
    reverse_stack_depth: usize,
}

impl AlwaysNotTaken {
    /// A fresh predictor retaining `reverse_stack_depth` snapshots.
    #[must_use]
    pub fn new(reverse_stack_depth: usize) -> Self {
        Self {
            counters: AccuracyCounters::default(),
            lht: HistoryArray::new(1, 1, reverse_stack_depth),
            pht: HistoryArray::new(1, 1, reverse_stack_depth),
            reverse_stack_depth,
        }
    }
}

impl Default for AlwaysNotTaken {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Predictor for AlwaysNotTaken {
    fn predict(&mut self, _addr: AInt, _is_branch: bool, is_conditional: bool) -> bool {
        !is_conditional
    }

    fn update(
        &mut self,
        _addr: AInt,
        _predicted_taken: bool,
        was_miss: bool,
        _is_branch: bool,
        is_conditional: bool,
    ) {
        self.counters.record(is_conditional, was_miss);
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
    fn always_taken_predicts_everything_taken() {
        let mut p = AlwaysTaken::default();
        assert!(p.predict(0x1000, true, true));
        assert!(p.predict(0x1000, true, false));
    }

    #[test]
    fn always_not_taken_only_takes_unconditional_branches() {
        let mut p = AlwaysNotTaken::default();
        assert!(!p.predict(0x1000, true, true));
        assert!(p.predict(0x1000, true, false));
    }
}
