//! A thin convenience wrapper binding an [`Isa`] to the assembler/
//! disassembler entry points, so a host only has to carry one value instead
//! of threading an `&Isa` through every call.

use std::collections::BTreeMap;

use ripes_assembler::{assemble, disassemble_one, disassemble_program, AssembleResult, SingleInstructionResult};
use ripes_isa::Isa;
use ripes_support::{AInt, SymbolMap};

/// Binds an [`Isa`] to the assembler/disassembler, the way a GUI session
/// owns exactly one ISA choice for its lifetime.
///
/// `Toolchain` owns nothing mutable across calls — each `assemble`/
/// `disassemble*` call is independent, matching spec.md §5's "no global
/// mutable state" rule and the assembler's own "`Program` is exclusively
/// owned during a call to `assemble`, returned in `AssembleResult`"
/// contract.
#[derive(Debug, Clone)]
pub struct Toolchain {
    isa: Isa,
}

impl Toolchain {
    /// Binds a toolchain to `isa`.
    #[must_use]
    pub fn new(isa: Isa) -> Self {
        Self { isa }
    }

    /// The default RV32IM instantiation used throughout this workspace's
    /// own tests and fixtures.
    #[must_use]
    pub fn rv32im() -> Self {
        Self::new(Isa::rv32im())
    }

    /// The bound ISA.
    #[must_use]
    pub fn isa(&self) -> &Isa {
        &self.isa
    }

    /// Assembles `source`, optionally seeded with a pre-populated symbol
    /// map (e.g. linker-provided constants) and a source hash for
    /// cache-invalidation purposes on the host side.
    #[must_use]
    pub fn assemble(
        &self,
        source: &str,
        pre_populated: Option<SymbolMap>,
        source_hash: Option<String>,
    ) -> AssembleResult {
        assemble(source, &self.isa, pre_populated, source_hash)
    }

    /// Renders every instruction in a [`Program`](ripes_assembler::Program)'s
    /// `TEXT` section back to text, with symbol labels.
    #[must_use]
    pub fn disassemble(&self, program: &ripes_assembler::Program) -> Vec<String> {
        disassemble_program(program, &self.isa)
    }

    /// Decodes a single instruction word at `address`, optionally resolving
    /// the implied target address against `reverse_symbols` to append a
    /// `<name>` suffix.
    #[must_use]
    pub fn disassemble_one(
        &self,
        word: u32,
        address: AInt,
        reverse_symbols: Option<&BTreeMap<AInt, String>>,
    ) -> SingleInstructionResult {
        disassemble_one(word, address, &self.isa, reverse_symbols)
    }
}
