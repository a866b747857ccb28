//! The common interface every predictor implements (spec.md §4.10).

use ripes_support::AInt;

use crate::counters::AccuracyCounters;

/// A dynamic (or static) branch predictor.
///
/// `predict` must always precede the matching `update` for the same
/// instruction by exactly one pipeline stage (spec.md §5's ordering
/// guarantee) — the predictor itself does not enforce this, the embedder
/// does, by construction of its pipeline.
pub trait Predictor {
    /// Predicts whether the branch at `addr` is taken. Unconditional
    /// branches are always predicted taken by every concrete predictor
    /// here; `is_branch`/`is_conditional` are passed through so a predictor
    /// can special-case non-branch fetches if it ever needs to (none of the
    /// five concrete predictors do).
    fn predict(&mut self, addr: AInt, is_branch: bool, is_conditional: bool) -> bool;

    /// Folds the actual outcome back into the predictor's state.
    /// Unconditional branches update only the shared accuracy counters and
    /// never touch `lht`/`pht` (spec.md §4.10: "unconditional branches pass
    /// through untouched").
    fn update(
        &mut self,
        addr: AInt,
        predicted_taken: bool,
        was_miss: bool,
        is_branch: bool,
        is_conditional: bool,
    );

    /// Pushes the current `lht`/`pht` contents onto this predictor's undo
    /// log. Called once per processor clock by the embedder.
    fn save_state(&mut self);

    /// Pops the most recent `lht`/`pht` snapshot and restores it. A no-op
    /// if the log is empty.
    fn restore_state(&mut self);

    /// Zeroes `lht`/`pht` and discards the undo log, leaving the accuracy
    /// counters untouched.
    fn reset_state(&mut self);

    /// Resets the accuracy counters to zero, leaving `lht`/`pht` untouched.
    fn reset_counters(&mut self);

    /// Changes how many per-cycle snapshots are retained for reversal.
    fn set_reverse_stack_depth(&mut self, depth: usize);

    /// The shared accuracy counters.
    fn counters(&self) -> AccuracyCounters;

    /// Fraction of conditional branches predicted correctly.
    fn conditional_accuracy(&self) -> f64 {
        self.counters().conditional_accuracy()
    }

    /// Fraction of unconditional branches predicted correctly.
    fn unconditional_accuracy(&self) -> f64 {
        self.counters().unconditional_accuracy()
    }

    /// Fraction of all branches predicted correctly.
    fn total_accuracy(&self) -> f64 {
        self.counters().total_accuracy()
    }
}
