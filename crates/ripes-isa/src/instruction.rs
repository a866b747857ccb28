//! A single encodable/decodable instruction.
//!
//! Ported from `Instruction<InstrImpl>` in `instruction.h`, whose `assemble`
//! applies `Opcode::Impl` then `Fields::Impl` to a zero word. Here the same
//! two steps operate over the runtime `Opcode`/`Vec<FieldKind>` data instead
//! of a chain of `InstrImpl::Opcode`/`InstrImpl::Fields` associated types.

use ripes_support::{Location, SymbolTable, Token};

use crate::fields::{FieldError, FieldKind};
use crate::opcode::Opcode;

/// The size, in bytes, of an encoded instruction.
///
/// RV32I/M instructions are always 4 bytes; the `C` (compressed) extension
/// introduces 2-byte encodings. [`InstructionSize::Compressed`] exists so
/// the assembler's address bookkeeping and the disassembler's word-reading
/// both already handle variable-width instructions, even though no
/// compressed opcode is populated in [`crate::rv32i`] yet (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstructionSize {
    /// A standard 4-byte RV32I/M/F/D instruction.
    Standard,
    /// A 2-byte `C`-extension instruction.
    Compressed,
}

impl InstructionSize {
    /// The size in bytes.
    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            InstructionSize::Standard => 4,
            InstructionSize::Compressed => 2,
        }
    }
}

/// A single machine instruction: a mnemonic, the constant bits that
/// identify it, and the operand fields that vary per use.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    /// The assembly mnemonic, e.g. `"addi"`.
    pub mnemonic: String,
    /// The constant bit pattern identifying this instruction.
    pub opcode: Opcode,
    /// The operand fields, in the order they're read from source tokens
    /// (not necessarily the order they appear in the instruction word).
    pub fields: Vec<FieldKind>,
    /// Encoded instruction width.
    pub size: InstructionSize,
}

impl Instruction {
    /// Assembles `tokens` (the mnemonic followed by its operands) into an
    /// instruction word.
    ///
    /// `symbols`, if given, resolves immediate operands that name a symbol
    /// rather than a literal value. `instruction_addr` is the program
    /// address this instruction is emitted at; PC-relative ([`crate::fields::SymbolType::Relative`])
    /// fields subtract it from the resolved symbol value before range-checking.
    pub fn assemble(
        &self,
        tokens: &[Token],
        symbols: Option<&SymbolTable>,
        instruction_addr: u32,
        location: Location,
    ) -> Result<u32, FieldError> {
        let mut word = 0u64;
        self.opcode.apply(&mut word);
        for field in &self.fields {
            field.apply(tokens, &mut word, symbols, instruction_addr, location)?;
        }
        Ok(word as u32)
    }

    /// Returns `true` if `word` matches this instruction's opcode.
    #[must_use]
    pub fn matches(&self, word: u32) -> bool {
        self.opcode.matches(u64::from(word))
    }

    /// Renders `word` as `mnemonic operand, operand, ...`, assuming it has
    /// already been matched against this instruction's opcode.
    #[must_use]
    pub fn disassemble(&self, word: u32) -> String {
        let mut operands: Vec<(usize, String)> = self
            .fields
            .iter()
            .map(|f| (f.token_index(), f.decode(u64::from(word))))
            .collect();
        operands.sort_by_key(|(idx, _)| *idx);
        let rendered: Vec<String> = operands.into_iter().map(|(_, s)| s).collect();
        if rendered.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, rendered.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitrange::BitRange;
    use crate::fields::{Repr, SymbolType};
    use crate::opcode::OpPart;
    use ripes_support::Token;

    fn addi() -> Instruction {
        Instruction {
            mnemonic: "addi".to_string(),
            opcode: Opcode::new(vec![
                OpPart::new(0b0010011, BitRange::new(0, 6)),
                OpPart::new(0b000, BitRange::new(12, 14)),
            ]),
            fields: vec![
                FieldKind::Reg {
                    token_index: 0,
                    bit_range: BitRange::new(7, 11),
                },
                FieldKind::Reg {
                    token_index: 1,
                    bit_range: BitRange::new(15, 19),
                },
                FieldKind::Imm {
                    token_index: 2,
                    width: 12,
                    repr: Repr::Signed,
                    parts: vec![crate::fields::ImmPart::new(0, BitRange::new(20, 31))],
                    symbol_type: SymbolType::None,
                },
            ],
            size: InstructionSize::Standard,
        }
    }

    #[test]
    fn assembles_addi() {
        let instr = addi();
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("5")];
        let word = instr.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert_eq!(word & 0x7F, 0b0010011);
        assert_eq!((word >> 7) & 0x1F, 10);
        assert_eq!((word >> 15) & 0x1F, 11);
        assert_eq!((word >> 20) & 0xFFF, 5);
    }

    #[test]
    fn matches_only_its_own_opcode() {
        let instr = addi();
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("5")];
        let word = instr.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert!(instr.matches(word));
        assert!(!instr.matches(word | 0b0110011));
    }

    #[test]
    fn disassembles_back_to_readable_operands() {
        let instr = addi();
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("5")];
        let word = instr.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert_eq!(instr.disassemble(word), "addi x10, x11, 5");
    }
}
