//! The RV32M standard integer-multiplication extension.
//!
//! Grounded in `rv_m_ext.h`: all eight instructions share RV32I's
//! register-register opcode and `0000001` funct7, distinguished only by
//! funct3 — so this module is a single funct3 table rather than eight
//! separate builder calls worth of duplication.

use crate::instruction::Instruction;
use crate::rv32i::r_type;

const FUNCT7_MULDIV: u64 = 0b0000001;

/// Builds every RV32M instruction definition.
#[must_use]
pub fn rv32m_instructions() -> Vec<Instruction> {
    [
        ("mul", 0b000),
        ("mulh", 0b001),
        ("mulhsu", 0b010),
        ("mulhu", 0b011),
        ("div", 0b100),
        ("divu", 0b101),
        ("rem", 0b110),
        ("remu", 0b111),
    ]
    .into_iter()
    .map(|(mnemonic, funct3)| r_type(mnemonic, FUNCT7_MULDIV, funct3))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripes_support::{Location, Token};

    #[test]
    fn all_eight_share_opcode_and_funct7_but_not_funct3() {
        let instrs = rv32m_instructions();
        assert_eq!(instrs.len(), 8);
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("a2")];
        let words: Vec<u32> = instrs
            .iter()
            .map(|i| i.assemble(&tokens, None, 0, Location::line(1)).unwrap())
            .collect();
        let unique: std::collections::HashSet<_> = words.iter().collect();
        assert_eq!(unique.len(), 8, "every RV32M instruction must encode distinctly");
    }

    #[test]
    fn mul_does_not_match_add() {
        let muldiv = rv32m_instructions();
        let mul = muldiv.iter().find(|i| i.mnemonic == "mul").unwrap();
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("a2")];
        let add_like_word = {
            // ADD's encoding: same rd/rs1/rs2, opcode 0110011, funct3 000, funct7 0000000.
            let add = crate::rv32i::rv32i_instructions();
            let add = add.iter().find(|i| i.mnemonic == "add").unwrap();
            add.assemble(&tokens, None, 0, Location::line(1)).unwrap()
        };
        assert!(!mul.matches(add_like_word));
    }
}
