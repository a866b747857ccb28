//! The full instruction-set descriptor: every real instruction and
//! pseudo-instruction mnemonic the assembler understands, plus lookup.

use crate::instruction::Instruction;
use crate::pseudo::PseudoInstruction;
use crate::rv32i::rv32i_instructions;
use crate::rv32m::rv32m_instructions;

/// The complete set of instructions and pseudo-instructions making up an
/// ISA, with lookup by mnemonic.
pub struct Isa {
    /// Real, directly-encodable instructions.
    pub instructions: Vec<Instruction>,
    /// Pseudo-instructions, expanded to real instructions before assembly.
    pub pseudo_instructions: Vec<PseudoInstruction>,
}

impl Isa {
    /// The RV32IM instruction set: the RV32I base integer ISA plus the
    /// RV32M multiply/divide extension and their common pseudo-instructions.
    #[must_use]
    pub fn rv32im() -> Self {
        let mut instructions = rv32i_instructions();
        instructions.extend(rv32m_instructions());
        Self {
            instructions,
            pseudo_instructions: crate::pseudo::rv32i_pseudo_instructions(),
        }
    }

    /// Looks up a real instruction by its mnemonic.
    #[must_use]
    pub fn instruction(&self, mnemonic: &str) -> Option<&Instruction> {
        self.instructions
            .iter()
            .find(|i| i.mnemonic.eq_ignore_ascii_case(mnemonic))
    }

    /// Looks up a pseudo-instruction by its mnemonic.
    #[must_use]
    pub fn pseudo_instruction(&self, mnemonic: &str) -> Option<&PseudoInstruction> {
        self.pseudo_instructions
            .iter()
            .find(|p| p.mnemonic.eq_ignore_ascii_case(mnemonic))
    }

    /// Finds the instruction whose opcode matches `word`, trying the most
    /// bit-constrained (most specific) opcodes first so that, e.g., a
    /// `funct7`-discriminated instruction is preferred over one that only
    /// checks the major opcode.
    #[must_use]
    pub fn decode(&self, word: u32) -> Option<&Instruction> {
        let mut candidates: Vec<&Instruction> =
            self.instructions.iter().filter(|i| i.matches(word)).collect();
        candidates.sort_by_key(|i| std::cmp::Reverse(i.opcode.specificity()));
        candidates.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripes_support::{Location, Token};

    #[test]
    fn rv32im_contains_expected_mnemonics() {
        let isa = Isa::rv32im();
        assert!(isa.instruction("addi").is_some());
        assert!(isa.instruction("mul").is_some());
        assert!(isa.instruction("jal").is_some());
        assert!(isa.pseudo_instruction("li").is_some());
        assert!(isa.instruction("not_a_real_mnemonic").is_none());
    }

    #[test]
    fn decode_prefers_more_specific_opcode() {
        let isa = Isa::rv32im();
        let add = isa.instruction("add").unwrap();
        let tokens = vec![Token::new("a0"), Token::new("a1"), Token::new("a2")];
        let word = add.assemble(&tokens, None, 0, Location::line(1)).unwrap();
        let decoded = isa.decode(word).unwrap();
        assert_eq!(decoded.mnemonic, "add");
    }
}
