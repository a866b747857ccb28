//! Pseudo-instructions: mnemonics that expand to one or more real
//! instructions before assembly proper begins.
//!
//! Grounded in `pseudoinstruction.h` and `rv_i_ext.h`'s `PseudoInstrLoad`
//! (the `lb`/`lh`/`lw` pseudo-ops that expand a `lw rd, symbol` into an
//! `auipc`+load pair). Each pseudo-instruction here is a plain function
//! pointer rather than a virtual `expand()` override, continuing the
//! tagged-data approach used for [`crate::instruction::Instruction`].

use ripes_support::imm::parse_int_sext32;
use ripes_support::{bits::is_signed_fit, Located, Location, Token};
use thiserror::Error;

/// What went wrong expanding a pseudo-instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PseudoErrorKind {
    /// Fewer operand tokens were given than the pseudo-instruction expects.
    #[error("'{mnemonic}' expects {expected} operands, got {got}")]
    WrongOperandCount {
        /// The pseudo-instruction's mnemonic.
        mnemonic: String,
        /// How many operands were expected.
        expected: usize,
        /// How many were given.
        got: usize,
    },
}

/// A pseudo-expansion error, tied to the source [`Location`] of the
/// pseudo-instruction line.
pub type PseudoError = Located<PseudoErrorKind>;

/// A single expanded line: a mnemonic followed by its operand tokens.
pub type ExpandedLine = Vec<Token>;

/// A pseudo-instruction: a mnemonic and the function that rewrites its
/// operand tokens into one or more real instruction lines.
#[derive(Clone)]
pub struct PseudoInstruction {
    /// The pseudo-instruction's mnemonic, e.g. `"li"`.
    pub mnemonic: String,
    /// Rewrites `(mnemonic-stripped operand tokens, location)` into the
    /// real instruction lines to assemble in its place.
    pub expand: fn(&[Token], Location) -> Result<Vec<ExpandedLine>, PseudoError>,
}

fn require_operands(
    mnemonic: &str,
    operands: &[Token],
    expected: usize,
    location: Location,
) -> Result<(), PseudoError> {
    if operands.len() != expected {
        return Err(Located::new(
            location,
            PseudoErrorKind::WrongOperandCount {
                mnemonic: mnemonic.to_string(),
                expected,
                got: operands.len(),
            },
        ));
    }
    Ok(())
}

fn line(tokens: &[&str]) -> ExpandedLine {
    tokens.iter().map(|t| Token::new(*t)).collect()
}

fn expand_nop(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("nop", operands, 0, location)?;
    Ok(vec![line(&["addi", "zero", "zero", "0"])])
}

fn expand_mv(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("mv", operands, 2, location)?;
    Ok(vec![line(&[
        "addi",
        operands[0].text(),
        operands[1].text(),
        "0",
    ])])
}

fn expand_not(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("not", operands, 2, location)?;
    Ok(vec![line(&[
        "xori",
        operands[0].text(),
        operands[1].text(),
        "-1",
    ])])
}

fn expand_neg(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("neg", operands, 2, location)?;
    Ok(vec![line(&[
        "sub",
        operands[0].text(),
        "zero",
        operands[1].text(),
    ])])
}

fn expand_j(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("j", operands, 1, location)?;
    Ok(vec![line(&["jal", "zero", operands[0].text()])])
}

fn expand_jr(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("jr", operands, 1, location)?;
    Ok(vec![line(&["jalr", "zero", operands[0].text(), "0"])])
}

fn expand_ret(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("ret", operands, 0, location)?;
    Ok(vec![line(&["jalr", "zero", "ra", "0"])])
}

fn expand_beqz(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("beqz", operands, 2, location)?;
    Ok(vec![line(&[
        "beq",
        operands[0].text(),
        "zero",
        operands[1].text(),
    ])])
}

fn expand_bnez(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("bnez", operands, 2, location)?;
    Ok(vec![line(&[
        "bne",
        operands[0].text(),
        "zero",
        operands[1].text(),
    ])])
}

/// Splits a 32-bit value into its `lui` upper-20 and `addi` lower-12 halves,
/// rounding the upper half up when the lower half's sign bit would
/// otherwise flip the value (since `addi`'s immediate is sign-extended).
fn hi_lo_split(value: i64) -> (i64, i64) {
    let value = value as i32 as i64;
    let lo = ((value & 0xFFF) << 52) >> 52; // sign-extend low 12 bits
    let hi = (value - lo) >> 12;
    (hi, lo)
}

fn expand_li(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("li", operands, 2, location)?;
    let rd = operands[0].text();
    let imm_token = &operands[1];
    if let Ok(parsed) = parse_int_sext32(imm_token.text()) {
        if is_signed_fit(parsed.value, 12) {
            return Ok(vec![line(&["addi", rd, "zero", imm_token.text()])]);
        }
        let (hi, lo) = hi_lo_split(parsed.value);
        return Ok(vec![
            line(&["lui", rd, &hi.to_string()]),
            line(&["addi", rd, rd, &lo.to_string()]),
        ]);
    }
    // Unresolved at expansion time (e.g. the operand names a symbol to be
    // resolved in pass 2): conservatively expand to the two-instruction
    // form via %hi/%lo relocation tokens, since a symbol's address may not
    // fit in 12 bits.
    Ok(vec![
        vec![
            Token::new("lui"),
            Token::new(rd),
            Token::with_relocation(imm_token.text(), "hi"),
        ],
        vec![
            Token::new("addi"),
            Token::new(rd),
            Token::new(rd),
            Token::with_relocation(imm_token.text(), "lo"),
        ],
    ])
}

fn expand_la(operands: &[Token], location: Location) -> Result<Vec<ExpandedLine>, PseudoError> {
    require_operands("la", operands, 2, location)?;
    let rd = operands[0].text();
    let symbol = &operands[1];
    Ok(vec![
        vec![
            Token::new("auipc"),
            Token::new(rd),
            Token::with_relocation(symbol.text(), "hi"),
        ],
        vec![
            Token::new("addi"),
            Token::new(rd),
            Token::new(rd),
            Token::with_relocation(symbol.text(), "lo"),
        ],
    ])
}

/// The pseudo-instructions enabled by the RV32I base set, matching the
/// commonly-supported subset from `rv_i_ext.h`/GNU-as convention: `nop`,
/// `mv`, `not`, `neg`, `j`, `jr`, `ret`, `beqz`, `bnez`, `li`, `la`.
#[must_use]
pub fn rv32i_pseudo_instructions() -> Vec<PseudoInstruction> {
    vec![
        PseudoInstruction {
            mnemonic: "nop".to_string(),
            expand: expand_nop,
        },
        PseudoInstruction {
            mnemonic: "mv".to_string(),
            expand: expand_mv,
        },
        PseudoInstruction {
            mnemonic: "not".to_string(),
            expand: expand_not,
        },
        PseudoInstruction {
            mnemonic: "neg".to_string(),
            expand: expand_neg,
        },
        PseudoInstruction {
            mnemonic: "j".to_string(),
            expand: expand_j,
        },
        PseudoInstruction {
            mnemonic: "jr".to_string(),
            expand: expand_jr,
        },
        PseudoInstruction {
            mnemonic: "ret".to_string(),
            expand: expand_ret,
        },
        PseudoInstruction {
            mnemonic: "beqz".to_string(),
            expand: expand_beqz,
        },
        PseudoInstruction {
            mnemonic: "bnez".to_string(),
            expand: expand_bnez,
        },
        PseudoInstruction {
            mnemonic: "li".to_string(),
            expand: expand_li,
        },
        PseudoInstruction {
            mnemonic: "la".to_string(),
            expand: expand_la,
        },
    ]
}
