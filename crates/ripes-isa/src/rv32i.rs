//! The RV32I base integer instruction set.
//!
//! Grounded in `rv_i_ext.h`/`rv_i_ext.cpp`: each `Instr*TypeBase` template
//! there becomes a small builder function here (`r_type`, `i_type`, ...)
//! that returns an [`Instruction`] value instead of instantiating a
//! template. Operand token order follows the RISC-V assembly syntax; load
//! and store instructions assume the `offset(base)` operand has already
//! been split into two separate tokens by the tokenizer (see
//! `ripes-assembler`'s `tokenizer` module), matching how `joinParentheses`
//! isolates parenthesized content before field application runs in the
//! original.

use crate::bitrange::BitRange;
use crate::fields::{FieldKind, ImmPart, Repr, SymbolType};
use crate::instruction::{Instruction, InstructionSize};
use crate::opcode::{OpPart, Opcode};

fn opcode7(value: u64) -> OpPart {
    OpPart::new(value, BitRange::new(0, 6))
}

fn funct3(value: u64) -> OpPart {
    OpPart::new(value, BitRange::new(12, 14))
}

fn funct7(value: u64) -> OpPart {
    OpPart::new(value, BitRange::new(25, 31))
}

fn reg(token_index: usize, bit_range: BitRange) -> FieldKind {
    FieldKind::Reg {
        token_index,
        bit_range,
    }
}

fn rd() -> FieldKind {
    reg(0, BitRange::new(7, 11))
}

fn imm12_signed(token_index: usize, symbol_type: SymbolType) -> FieldKind {
    FieldKind::Imm {
        token_index,
        width: 12,
        repr: Repr::Signed,
        parts: vec![ImmPart::new(0, BitRange::new(20, 31))],
        symbol_type,
    }
}

/// `rd, rs1, rs2` — the RV32I/M register-register format.
pub(crate) fn r_type(mnemonic: &str, funct7_value: u64, funct3_value: u64) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![
            opcode7(0b011_0011),
            funct3(funct3_value),
            funct7(funct7_value),
        ]),
        fields: vec![rd(), reg(1, BitRange::new(15, 19)), reg(2, BitRange::new(20, 24))],
        size: InstructionSize::Standard,
    }
}

/// `rd, rs1, imm12` — RV32I's register-immediate arithmetic format.
fn i_type_arith(mnemonic: &str, funct3_value: u64) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![opcode7(0b001_0011), funct3(funct3_value)]),
        fields: vec![rd(), reg(1, BitRange::new(15, 19)), imm12_signed(2, SymbolType::None)],
        size: InstructionSize::Standard,
    }
}

/// `rd, rs1, shamt5` — the shift-immediate format, which reuses the I-type
/// opcode but fixes a 7-bit discriminator over the top of what would
/// otherwise be the immediate field.
fn shift_type(mnemonic: &str, funct3_value: u64, funct7_value: u64) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![
            opcode7(0b001_0011),
            funct3(funct3_value),
            funct7(funct7_value),
        ]),
        fields: vec![
            rd(),
            reg(1, BitRange::new(15, 19)),
            FieldKind::Imm {
                token_index: 2,
                width: 5,
                repr: Repr::Unsigned,
                parts: vec![ImmPart::new(0, BitRange::new(20, 24))],
                symbol_type: SymbolType::None,
            },
        ],
        size: InstructionSize::Standard,
    }
}

/// `rd, offset, rs1` — a memory load. Tokens are the already-split
/// `offset(base)` form: destination register, then offset, then base
/// register.
fn load_type(mnemonic: &str, funct3_value: u64) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![opcode7(0b000_0011), funct3(funct3_value)]),
        fields: vec![
            rd(),
            imm12_signed(1, SymbolType::None),
            reg(2, BitRange::new(15, 19)),
        ],
        size: InstructionSize::Standard,
    }
}

/// `rs2, offset, rs1` — a memory store, whose 12-bit immediate is split
/// across two disjoint instruction-word ranges.
fn store_type(mnemonic: &str, funct3_value: u64) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![opcode7(0b010_0011), funct3(funct3_value)]),
        fields: vec![
            reg(0, BitRange::new(20, 24)),
            FieldKind::Imm {
                token_index: 1,
                width: 12,
                repr: Repr::Signed,
                parts: vec![
                    ImmPart::new(5, BitRange::new(25, 31)),
                    ImmPart::new(0, BitRange::new(7, 11)),
                ],
                symbol_type: SymbolType::None,
            },
            reg(2, BitRange::new(15, 19)),
        ],
        size: InstructionSize::Standard,
    }
}

/// `rs1, rs2, offset` — a conditional branch, whose 13-bit (1 implicit
/// zero low bit) PC-relative offset is split across four ranges.
fn branch_type(mnemonic: &str, funct3_value: u64) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![opcode7(0b110_0011), funct3(funct3_value)]),
        fields: vec![
            reg(0, BitRange::new(15, 19)),
            reg(1, BitRange::new(20, 24)),
            FieldKind::Imm {
                token_index: 2,
                width: 13,
                repr: Repr::Signed,
                parts: vec![
                    ImmPart::new(12, BitRange::new(31, 31)),
                    ImmPart::new(11, BitRange::new(7, 7)),
                    ImmPart::new(5, BitRange::new(25, 30)),
                    ImmPart::new(1, BitRange::new(8, 11)),
                ],
                symbol_type: SymbolType::Relative,
            },
        ],
        size: InstructionSize::Standard,
    }
}

fn jal() -> Instruction {
    Instruction {
        mnemonic: "jal".to_string(),
        opcode: Opcode::new(vec![opcode7(0b110_1111)]),
        fields: vec![
            rd(),
            FieldKind::Imm {
                token_index: 1,
                width: 21,
                repr: Repr::Signed,
                parts: vec![
                    ImmPart::new(20, BitRange::new(31, 31)),
                    ImmPart::new(12, BitRange::new(12, 19)),
                    ImmPart::new(11, BitRange::new(20, 20)),
                    ImmPart::new(1, BitRange::new(21, 30)),
                ],
                symbol_type: SymbolType::Relative,
            },
        ],
        size: InstructionSize::Standard,
    }
}

fn jalr() -> Instruction {
    Instruction {
        mnemonic: "jalr".to_string(),
        opcode: Opcode::new(vec![opcode7(0b110_0111), funct3(0b000)]),
        fields: vec![
            rd(),
            reg(1, BitRange::new(15, 19)),
            imm12_signed(2, SymbolType::None),
        ],
        size: InstructionSize::Standard,
    }
}

/// `rd, imm20` — `lui`/`auipc`'s upper-immediate format. `auipc`'s operand
/// may additionally name a symbol (consumed via `%hi` by [`crate::pseudo`]'s
/// `la` expansion), `lui`'s never does.
fn upper_type(mnemonic: &str, opcode_value: u64, symbol_type: SymbolType) -> Instruction {
    Instruction {
        mnemonic: mnemonic.to_string(),
        opcode: Opcode::new(vec![opcode7(opcode_value)]),
        fields: vec![
            rd(),
            FieldKind::Imm {
                token_index: 1,
                width: 20,
                repr: Repr::Unsigned,
                parts: vec![ImmPart::new(0, BitRange::new(12, 31))],
                symbol_type,
            },
        ],
        size: InstructionSize::Standard,
    }
}

/// Funct3 values shared by the I-type arithmetic/shift and the
/// branch/load/store families, named after the original's `Funct3ID` enums
/// in `rv_i_ext.h`.
mod funct3_id {
    pub const ADDI: u64 = 0b000;
    pub const SLTI: u64 = 0b010;
    pub const SLTIU: u64 = 0b011;
    pub const XORI: u64 = 0b100;
    pub const ORI: u64 = 0b110;
    pub const ANDI: u64 = 0b111;
    pub const SLLI: u64 = 0b001;
    pub const SRXI: u64 = 0b101; // shared by SRLI/SRAI, distinguished by funct7

    pub const LB: u64 = 0b000;
    pub const LH: u64 = 0b001;
    pub const LW: u64 = 0b010;
    pub const LBU: u64 = 0b100;
    pub const LHU: u64 = 0b101;

    pub const BEQ: u64 = 0b000;
    pub const BNE: u64 = 0b001;
    pub const BLT: u64 = 0b100;
    pub const BGE: u64 = 0b101;
    pub const BLTU: u64 = 0b110;
    pub const BGEU: u64 = 0b111;
}

/// Builds every RV32I base-instruction definition.
#[must_use]
pub fn rv32i_instructions() -> Vec<Instruction> {
    use funct3_id::*;
    vec![
        r_type("add", 0b0000000, 0b000),
        r_type("sub", 0b0100000, 0b000),
        r_type("sll", 0b0000000, 0b001),
        r_type("slt", 0b0000000, 0b010),
        r_type("sltu", 0b0000000, 0b011),
        r_type("xor", 0b0000000, 0b100),
        r_type("srl", 0b0000000, 0b101),
        r_type("sra", 0b0100000, 0b101),
        r_type("or", 0b0000000, 0b110),
        r_type("and", 0b0000000, 0b111),
        i_type_arith("addi", ADDI),
        i_type_arith("slti", SLTI),
        i_type_arith("sltiu", SLTIU),
        i_type_arith("xori", XORI),
        i_type_arith("ori", ORI),
        i_type_arith("andi", ANDI),
        shift_type("slli", SLLI, 0b0000000),
        shift_type("srli", SRXI, 0b0000000),
        shift_type("srai", SRXI, 0b0100000),
        load_type("lb", LB),
        load_type("lh", LH),
        load_type("lw", LW),
        load_type("lbu", LBU),
        load_type("lhu", LHU),
        store_type("sb", 0b000),
        store_type("sh", 0b001),
        store_type("sw", 0b010),
        branch_type("beq", BEQ),
        branch_type("bne", BNE),
        branch_type("blt", BLT),
        branch_type("bge", BGE),
        branch_type("bltu", BLTU),
        branch_type("bgeu", BGEU),
        jal(),
        jalr(),
        upper_type("lui", 0b011_0111, SymbolType::None),
        upper_type("auipc", 0b001_0111, SymbolType::Relative),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripes_support::{Location, Token};

    fn find<'a>(instrs: &'a [Instruction], mnemonic: &str) -> &'a Instruction {
        instrs.iter().find(|i| i.mnemonic == mnemonic).unwrap()
    }

    #[test]
    fn every_mnemonic_is_unique() {
        let instrs = rv32i_instructions();
        let mut seen = std::collections::HashSet::new();
        for instr in &instrs {
            assert!(seen.insert(instr.mnemonic.clone()), "duplicate mnemonic {}", instr.mnemonic);
        }
    }

    #[test]
    fn add_and_sub_differ_only_in_funct7() {
        let instrs = rv32i_instructions();
        let add = find(&instrs, "add");
        let sub = find(&instrs, "sub");
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("a2")];
        let add_word = add.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        let sub_word = sub.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert_ne!(add_word, sub_word);
        assert!(add.matches(add_word));
        assert!(!sub.matches(add_word));
    }

    #[test]
    fn branch_immediate_round_trips_through_scattered_bits() {
        let instrs = rv32i_instructions();
        let beq = find(&instrs, "beq");
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("4094")];
        let word = beq.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert!(beq.matches(word));
        assert!(beq.disassemble(word).contains("4094"));
    }

    #[test]
    fn jal_immediate_round_trips_through_scattered_bits() {
        let instrs = rv32i_instructions();
        let jal_instr = find(&instrs, "jal");
        let tokens = vec![Token::new("ra"), Token::new("1048574")];
        let word = jal_instr.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert!(jal_instr.matches(word));
        assert!(jal_instr.disassemble(word).contains("1048574"));
    }

    #[test]
    fn store_splits_immediate_across_two_ranges() {
        let instrs = rv32i_instructions();
        let sw = find(&instrs, "sw");
        let tokens = vec![Token::new("a0"), Token::new("-4"), Token::new("sp")];
        let word = sw.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert!(sw.matches(word));
    }

    #[test]
    fn slli_and_srli_share_funct3_but_differ_in_funct7() {
        let instrs = rv32i_instructions();
        let slli = find(&instrs, "slli");
        let srai = find(&instrs, "srai");
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("3")];
        let slli_word = slli.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        let srai_word = srai.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        assert!(slli.matches(slli_word));
        assert!(!srai.matches(slli_word));
        assert_ne!(slli_word, srai_word);
    }
}
