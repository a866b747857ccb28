//! The branch-predictor framework: five pluggable dynamic/static predictors
//! sharing a common interface, each with per-cycle state snapshots enabling
//! reverse execution (spec.md §4.10).
//!
//! Every predictor is a plain struct implementing [`Predictor`]; there is no
//! predictor registry or dynamic dispatch requirement here — an embedder
//! picks a concrete type (or boxes one behind `dyn Predictor` if it wants
//! runtime selection, the way a GUI's predictor-choice dropdown would).

#![warn(missing_docs)]

pub mod counter;
pub mod counters;
pub mod global;
pub mod history;
pub mod local;
pub mod predictor;
pub mod static_predictors;

pub use counter::CounterPredictor;
pub use counters::AccuracyCounters;
pub use global::GlobalPredictor;
pub use history::HistoryArray;
pub use local::LocalPredictor;
pub use predictor::Predictor;
pub use static_predictors::{AlwaysNotTaken, AlwaysTaken};

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use crate::{AlwaysNotTaken, AlwaysTaken, CounterPredictor, GlobalPredictor, LocalPredictor, Predictor};

    /// `save; update; restore` is the identity on `(lht, pht)` for every
    /// concrete predictor (spec.md §8 property 7).
    fn assert_save_update_restore_is_identity(
        mut p: impl Predictor,
        addr: u64,
        predicted_taken: bool,
        was_miss: bool,
    ) -> Result<(), TestCaseError> {
        p.save_state();
        let before = p.predict(addr, true, true);
        p.update(addr, predicted_taken, was_miss, true, true);
        p.restore_state();
        let after = p.predict(addr, true, true);
        prop_assert_eq!(before, after);
        Ok(())
    }

    proptest! {
        #[test]
        fn always_taken_is_reversible(addr in any::<u64>(), predicted in any::<bool>(), miss in any::<bool>()) {
            assert_save_update_restore_is_identity(AlwaysTaken::new(8), addr, predicted, miss)?;
        }

        #[test]
        fn always_not_taken_is_reversible(addr in any::<u64>(), predicted in any::<bool>(), miss in any::<bool>()) {
            assert_save_update_restore_is_identity(AlwaysNotTaken::new(8), addr, predicted, miss)?;
        }

        #[test]
        fn counter_predictor_is_reversible(addr in any::<u64>(), predicted in any::<bool>(), miss in any::<bool>()) {
            assert_save_update_restore_is_identity(CounterPredictor::new(2, 8), addr, predicted, miss)?;
        }

        #[test]
        fn global_predictor_is_reversible(addr in any::<u64>(), predicted in any::<bool>(), miss in any::<bool>()) {
            assert_save_update_restore_is_identity(GlobalPredictor::new(4, 2, 8), addr, predicted, miss)?;
        }

        #[test]
        fn local_predictor_is_reversible(addr in any::<u64>(), predicted in any::<bool>(), miss in any::<bool>()) {
            assert_save_update_restore_is_identity(LocalPredictor::new(4, 4, 2, 8), addr, predicted, miss)?;
        }
    }
}
