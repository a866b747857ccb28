//! Change notifications emitted by a [`crate::Cache`].
//!
//! The original simulator signals the UI through Qt signals
//! (`dataChanged`/`configurationChanged`/`hitrateChanged`). There is no Qt
//! here, so a [`Cache`](crate::Cache) instead buffers [`CacheEvent`]s as they
//! occur and a caller drains them with [`crate::Cache::drain_events`] on
//! whatever cadence suits it (after a batch of accesses, once per
//! simulated cycle, etc).

use crate::transaction::CacheTransaction;

/// A state change a [`crate::Cache`] wants to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// An access completed and changed (or confirmed) a line's contents.
    DataChanged(CacheTransaction),
    /// The cache's geometry or policy was reconfigured; all prior state
    /// (lines, access trace, undo log) was cleared.
    ConfigurationChanged,
}
