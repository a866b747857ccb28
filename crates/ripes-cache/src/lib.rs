//! A configurable set-associative cache simulator with a bidirectional
//! (undo-capable) access trace.
//!
//! [`Cache`] is the entry point: construct one from a [`CacheConfig`], drive
//! it with [`Cache::access`], and step backward through history with
//! [`Cache::undo`]. Reconfiguring (`set_blocks`/`set_lines`/`set_ways`/the
//! policy setters/`set_preset`) clears all state, matching the original
//! simulator's "changing the geometry starts the cache over" behavior.

#![warn(missing_docs)]

pub mod cache;
pub mod config;
pub mod events;
pub mod trace;
pub mod transaction;
pub mod way;

pub use cache::{Cache, DEFAULT_TRACE_STACK_DEPTH};
pub use config::{CacheConfig, ReplacementPolicy, WriteAllocPolicy, WritePolicy};
pub use events::CacheEvent;
pub use trace::{AccessCounters, AccessTrace, TraceStack, TraceStackEntry};
pub use transaction::{AccessType, CacheTransaction};
pub use way::CacheWay;
