//! Ripes core — the assembler/disassembler pipeline, cache simulator, and
//! branch-predictor suite that back a RISC-style pedagogical processor
//! simulator, composed behind one crate.
//!
//! This crate does not itself simulate a processor pipeline, render a GUI,
//! parse CLI arguments, or load ELF/DWARF files — spec.md §1 treats all of
//! those as external collaborators. What it provides is the three
//! engineering cores a processor/GUI host composes around:
//!
//! - [`ripes_assembler`] / [`ripes_isa`] (wrapped here as [`Toolchain`]):
//!   turn assembly source into machine code and back.
//! - [`ripes_cache::Cache`]: models one level of a memory hierarchy, with a
//!   reversible access trace.
//! - [`ripes_predictor`]: five pluggable branch predictors, each reversible.
//!
//! # Integration shape
//!
//! Each component is owned by exactly one caller (spec.md §5: "no global
//! mutable state"). A processor/GUI host typically owns one [`Toolchain`]
//! (to assemble programs and label disassembly), one [`ripes_cache::Cache`]
//! per simulated cache level, and one predictor per simulated branch
//! predictor choice, coordinating them without itself holding their
//! internal state:
//!
//! ```
//! use ripes_cache::{AccessType, Cache, CacheConfig};
//! use ripes_core::Toolchain;
//! use ripes_predictor::{AlwaysTaken, Predictor};
//!
//! let toolchain = Toolchain::rv32im();
//! let result = toolchain.assemble(".text\nA: nop\nB: jal A\n", None, None);
//! assert!(result.errors.is_empty());
//!
//! let mut cache = Cache::new(CacheConfig::default(), 64);
//! let mut predictor = AlwaysTaken::new(64);
//!
//! // A processor's fetch/execute loop (external to this crate) would, per
//! // instruction: ask `predictor.predict(..)` before the branch resolves,
//! // `predictor.update(..)` one stage later, and `cache.access(..)` for
//! // every load/store — each call independently reversible via
//! // `cache.undo()` / `predictor.restore_state()` for time-travel
//! // debugging.
//! cache.access(0x1000, AccessType::Read);
//! predictor.predict(0x1000, true, true);
//! ```
//!
//! While a processor run executes on a worker thread, the host should
//! suppress per-access redraws and instead redraw from scratch once after
//! the run rejoins (spec.md §5) — [`ripes_cache::Cache::drain_events`]
//! naturally supports this: accumulate events during the run, drain and
//! discard them, then issue one application-level "invalidate everything"
//! signal of the host's own.

#![warn(missing_docs)]

mod toolchain;

pub use toolchain::Toolchain;

pub use ripes_assembler::{self, AssembleResult, Program, Section};
pub use ripes_cache::{self, Cache};
pub use ripes_isa::{self, Isa};
pub use ripes_predictor::{self, Predictor};
pub use ripes_support::{self, AInt, VInt};

/// Crate version, matching the workspace version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
