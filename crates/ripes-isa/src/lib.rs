//! The ISA descriptor scheme: bit-range/field/opcode composition, concrete
//! instruction records, pseudo-instruction expansion, and register-name
//! resolution (spec.md §4.5).
//!
//! Ported from `instruction.h`'s template-composed `Instruction<InstrImpl>`
//! (see the design note in `instruction.rs`): instructions here are plain
//! data (an [`Opcode`] plus a `Vec<fields::FieldKind>`) built once per ISA
//! and interpreted by [`Instruction::assemble`]/[`Instruction::disassemble`]
//! rather than monomorphized per opcode.

#![warn(missing_docs)]

pub mod bitrange;
pub mod compressed;
pub mod fields;
pub mod instruction;
pub mod isa;
pub mod opcode;
pub mod pseudo;
pub mod registers;
pub mod rv32i;
pub mod rv32m;

pub use bitrange::BitRange;
pub use fields::{FieldError, FieldErrorKind, FieldKind, ImmPart, Repr, SymbolType};
pub use instruction::{Instruction, InstructionSize};
pub use isa::Isa;
pub use opcode::{OpPart, Opcode};
pub use pseudo::{ExpandedLine, PseudoError, PseudoErrorKind, PseudoInstruction};
pub use registers::{register_name, register_number};
