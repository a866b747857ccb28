//! The `(unconditional, conditional, miss)` counters every predictor shares
//! (spec.md §4.10), grounded in `ripesbranchpredictor.h`'s accuracy
//! bookkeeping.

/// Running totals of branch outcomes fed to a predictor, independent of
/// which concrete prediction scheme is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccuracyCounters {
    /// Unconditional branches seen.
    pub unconditional: u64,
    /// Conditional branches seen.
    pub conditional: u64,
    /// Mispredicted unconditional branches.
    pub unconditional_miss: u64,
    /// Mispredicted conditional branches.
    pub conditional_miss: u64,
}

impl AccuracyCounters {
    /// Folds one `update` call's outcome into the running totals.
    pub fn record(&mut self, is_conditional: bool, was_miss: bool) {
        if is_conditional {
            self.conditional += 1;
            if was_miss {
                self.conditional_miss += 1;
            }
        } else {
            self.unconditional += 1;
            if was_miss {
                self.unconditional_miss += 1;
            }
        }
    }

    /// Total mispredictions across both kinds, matching the `miss` counter
    /// spec.md §4.10 names directly.
    #[must_use]
    pub fn miss(&self) -> u64 {
        self.unconditional_miss + self.conditional_miss
    }

    /// Fraction of conditional branches predicted correctly, `1.0` if none
    /// have been seen yet.
    #[must_use]
    pub fn conditional_accuracy(&self) -> f64 {
        accuracy(self.conditional, self.conditional_miss)
    }

    /// Fraction of unconditional branches predicted correctly, `1.0` if
    /// none have been seen yet.
    #[must_use]
    pub fn unconditional_accuracy(&self) -> f64 {
        accuracy(self.unconditional, self.unconditional_miss)
    }

    /// Fraction of all branches (conditional and unconditional) predicted
    /// correctly, `1.0` if none have been seen yet.
    #[must_use]
    pub fn total_accuracy(&self) -> f64 {
        accuracy(self.unconditional + self.conditional, self.miss())
    }

    /// Resets every counter to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn accuracy(total: u64, miss: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        1.0 - (miss as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_with_no_branches_is_perfect_by_convention() {
        let c = AccuracyCounters::default();
        assert_eq!(c.total_accuracy(), 1.0);
        assert_eq!(c.conditional_accuracy(), 1.0);
        assert_eq!(c.unconditional_accuracy(), 1.0);
    }

    #[test]
    fn record_splits_conditional_and_unconditional() {
        let mut c = AccuracyCounters::default();
        c.record(true, false);
        c.record(true, true);
        c.record(false, false);
        assert_eq!(c.conditional, 2);
        assert_eq!(c.unconditional, 1);
        assert_eq!(c.miss(), 1);
        assert!((c.conditional_accuracy() - 0.5).abs() < f64::EPSILON);
        assert_eq!(c.unconditional_accuracy(), 1.0);
    }
}
