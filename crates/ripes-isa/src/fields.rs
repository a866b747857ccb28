//! Operand fields: the parts of an instruction that vary per assembly line.
//!
//! Ported from `Field`/`Reg`/`ImmBase` in `instruction.h`. The original
//! expresses a register or immediate operand as a template parameterized by
//! its token index, bit ranges, and (for immediates) width/representation;
//! here the same information is carried as plain enum data interpreted by
//! [`crate::instruction::Instruction::assemble`].

use ripes_support::bits::{is_signed_fit, is_unsigned_fit};
use ripes_support::imm::{parse_int, parse_int_sext32, Radix};
use ripes_support::{Located, Location, SymbolTable, Token};
use thiserror::Error;

use crate::bitrange::BitRange;
use crate::registers::register_number;

/// How an immediate's textual value should be interpreted and range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Repr {
    /// Checked as an unsigned `width`-bit quantity.
    Unsigned,
    /// Checked as a two's-complement signed `width`-bit quantity, with the
    /// bitwise (hex/binary) literal leniency `isa_defines.h` applies.
    Signed,
    /// Checked as an unsigned `width`-bit quantity, same as [`Repr::Unsigned`],
    /// but disassembled as a `0x`-prefixed hex literal rather than a decimal
    /// one.
    Hex,
}

/// What kind of reference an immediate field carries, used by the assembler
/// to decide how to resolve an unparseable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolType {
    /// The operand is always a literal; no symbol is ever expected.
    None,
    /// The operand may be a symbol naming an absolute address.
    Absolute,
    /// The operand may be a symbol naming a PC-relative offset.
    Relative,
}

/// One (possibly non-contiguous) slice of an immediate's bit pattern.
///
/// `offset` is the number of low-order bits of the immediate's *value* that
/// this part skips before taking its slice — this is what lets RISC-V's
/// B-type and J-type formats scatter a single immediate across several
/// disjoint instruction-word ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImmPart {
    /// Low-order bits of the value skipped before slicing.
    pub offset: u32,
    /// Where the sliced bits land in the instruction word.
    pub bit_range: BitRange,
}

impl ImmPart {
    /// Constructs an immediate part.
    #[must_use]
    pub const fn new(offset: u32, bit_range: BitRange) -> Self {
        Self { offset, bit_range }
    }

    fn apply(&self, value: u64, word: &mut u64) {
        *word |= self.bit_range.apply(value >> self.offset);
    }

    fn decode(&self, word: u64) -> u64 {
        self.bit_range.decode(word) << self.offset
    }
}

/// One operand slot of an instruction: either a register or an immediate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldKind {
    /// A register operand.
    Reg {
        /// Index of the operand's token within the tokenized source line.
        token_index: usize,
        /// Where the register index is placed in the instruction word.
        bit_range: BitRange,
    },
    /// An immediate operand, possibly scattered over several [`ImmPart`]s.
    Imm {
        /// Index of the operand's token within the tokenized source line.
        token_index: usize,
        /// Bit width used for range-checking (not necessarily the sum of
        /// the parts' widths: B/J-type immediates have an implicit zero low
        /// bit that widens the checked range by one).
        width: u32,
        /// How the value is interpreted and range-checked.
        repr: Repr,
        /// The (possibly scattered) bit slices making up the field.
        parts: Vec<ImmPart>,
        /// Whether this immediate may instead name a symbol.
        symbol_type: SymbolType,
    },
}

/// What went wrong applying an operand field during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    /// A register token did not name a known register.
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    /// An immediate token was neither a valid literal nor a known symbol.
    #[error("'{0}' is not a valid immediate or known symbol")]
    UnresolvedImmediate(String),
    /// An immediate's value does not fit in its field width.
    #[error("immediate value {value} does not fit in {width} bits")]
    DoesNotFit {
        /// The out-of-range value.
        value: i64,
        /// The field's bit width.
        width: u32,
    },
    /// Fewer tokens were given than the instruction's fields require.
    #[error("missing operand at token index {0}")]
    MissingOperand(usize),
}

/// A field-application error, tied to the source [`Location`] of the
/// instruction being assembled.
pub type FieldError = Located<FieldErrorKind>;

fn fits(value: i64, width: u32, repr: Repr, radix: Radix) -> bool {
    match repr {
        Repr::Unsigned | Repr::Hex => is_unsigned_fit(value as u64, width),
        Repr::Signed => {
            let is_bitwise = matches!(radix, Radix::Hex | Radix::Binary);
            if is_bitwise {
                is_unsigned_fit(value as u64, width) || is_signed_fit(value, width)
            } else {
                is_signed_fit(value, width)
            }
        }
    }
}

impl FieldKind {
    /// Applies this field's operand (read from `tokens`) into `word`.
    ///
    /// `symbols`, if given, is consulted when an immediate token fails to
    /// parse directly as a literal.
    pub fn apply(
        &self,
        tokens: &[Token],
        word: &mut u64,
        symbols: Option<&SymbolTable>,
        instruction_addr: u32,
        location: Location,
    ) -> Result<(), FieldError> {
        match self {
            FieldKind::Reg {
                token_index,
                bit_range,
            } => {
                let token = tokens
                    .get(*token_index)
                    .ok_or(Located::new(location, FieldErrorKind::MissingOperand(*token_index)))?;
                let index = register_number(token.text()).ok_or_else(|| {
                    Located::new(
                        location,
                        FieldErrorKind::UnknownRegister(token.text().to_string()),
                    )
                })?;
                *word |= bit_range.apply(u64::from(index));
                Ok(())
            }
            FieldKind::Imm {
                token_index,
                width,
                repr,
                parts,
                symbol_type,
            } => {
                let token = tokens
                    .get(*token_index)
                    .ok_or(Located::new(location, FieldErrorKind::MissingOperand(*token_index)))?;
                let resolved = resolve_immediate(token, *repr, *symbol_type, symbols)
                    .ok_or_else(|| {
                        Located::new(
                            location,
                            FieldErrorKind::UnresolvedImmediate(token.text().to_string()),
                        )
                    })?;
                let mut value = resolved.value;
                let radix = resolved.radix;
                if *symbol_type == SymbolType::Relative && resolved.from_symbol {
                    value = value.wrapping_sub(i64::from(instruction_addr));
                }
                if !fits(value, *width, *repr, radix) {
                    return Err(Located::new(
                        location,
                        FieldErrorKind::DoesNotFit { value, width: *width },
                    ));
                }
                for part in parts {
                    part.apply(value as u64, word);
                }
                Ok(())
            }
        }
    }

    /// Decodes this field's operand out of `word` into a display string.
    #[must_use]
    pub fn decode(&self, word: u64) -> String {
        match self {
            FieldKind::Reg { bit_range, .. } => {
                let index = bit_range.decode(word) as u32;
                format!("x{index}")
            }
            FieldKind::Imm { parts, width, repr, .. } => {
                let mut value = 0u64;
                for part in parts {
                    value |= part.decode(word);
                }
                match repr {
                    Repr::Signed => {
                        let signed = ripes_support::bits::sign_extend(value, *width);
                        format!("{}", signed as i64)
                    }
                    Repr::Unsigned => format!("{value}"),
                    Repr::Hex => format!("{value:#x}"),
                }
            }
        }
    }

    /// The token index this field reads its operand from.
    #[must_use]
    pub fn token_index(&self) -> usize {
        match self {
            FieldKind::Reg { token_index, .. } | FieldKind::Imm { token_index, .. } => {
                *token_index
            }
        }
    }
}

/// The outcome of resolving an immediate token, tagged with whether it came
/// from a literal or a symbol lookup — the latter is what `apply` subtracts
/// `instruction_addr` from for [`SymbolType::Relative`] fields; a literal
/// offset (e.g. a branch's already-relative displacement written by hand)
/// is used as-is.
struct ResolvedImmediate {
    value: i64,
    radix: Radix,
    from_symbol: bool,
}

fn resolve_immediate(
    token: &Token,
    repr: Repr,
    symbol_type: SymbolType,
    symbols: Option<&SymbolTable>,
) -> Option<ResolvedImmediate> {
    let parsed = match repr {
        Repr::Signed => parse_int_sext32(token.text()),
        Repr::Unsigned | Repr::Hex => parse_int(token.text()),
    };
    if let Ok(parsed) = parsed {
        return Some(ResolvedImmediate {
            value: parsed.value,
            radix: parsed.info.radix,
            from_symbol: false,
        });
    }
    if symbol_type == SymbolType::None {
        return None;
    }
    let table = symbols?;
    let value = *table.get(token.text())?;
    Some(ResolvedImmediate {
        value: value as i64,
        radix: Radix::Signed,
        from_symbol: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripes_support::Token;

    #[test]
    fn reg_field_encodes_register_index() {
        let field = FieldKind::Reg {
            token_index: 1,
            bit_range: BitRange::new(7, 11),
        };
        let tokens = vec![Token::new("addi"), Token::new("a0")];
        let mut word = 0u64;
        field
            .apply(&tokens, &mut word, None, 0, Location::line(1))
            .unwrap();
        assert_eq!((word >> 7) & 0x1F, 10);
    }

    #[test]
    fn unknown_register_is_an_error() {
        let field = FieldKind::Reg {
            token_index: 1,
            bit_range: BitRange::new(7, 11),
        };
        let tokens = vec![Token::new("addi"), Token::new("notareg")];
        let mut word = 0u64;
        let err = field
            .apply(&tokens, &mut word, None, 0, Location::line(1))
            .unwrap_err();
        assert_eq!(
            err.kind,
            FieldErrorKind::UnknownRegister("notareg".to_string())
        );
    }

    #[test]
    fn imm_field_rejects_oversized_value() {
        let field = FieldKind::Imm {
            token_index: 2,
            width: 12,
            repr: Repr::Signed,
            parts: vec![ImmPart::new(0, BitRange::new(20, 31))],
            symbol_type: SymbolType::None,
        };
        let tokens = vec![Token::new("addi"), Token::new("a0"), Token::new("4096")];
        let mut word = 0u64;
        let err = field
            .apply(&tokens, &mut word, None, 0, Location::line(1))
            .unwrap_err();
        assert!(matches!(err.kind, FieldErrorKind::DoesNotFit { .. }));
    }

    #[test]
    fn imm_field_falls_back_to_symbol_table() {
        let field = FieldKind::Imm {
            token_index: 0,
            width: 12,
            repr: Repr::Signed,
            parts: vec![ImmPart::new(0, BitRange::new(20, 31))],
            symbol_type: SymbolType::Absolute,
        };
        let mut table = SymbolTable::new();
        table.insert("target".to_string(), 100);
        let tokens = vec![Token::new("target")];
        let mut word = 0u64;
        field
            .apply(&tokens, &mut word, Some(&table), 0, Location::line(1))
            .unwrap();
        assert_eq!((word >> 20) & 0xFFF, 100);
    }

    #[test]
    fn unsigned_field_decodes_msb_set_value_as_positive() {
        // A 5-bit shamt of 16 (0b10000) has its field MSB set; an Unsigned
        // field must decode it as 16, not as a sign-extended negative.
        let field = FieldKind::Imm {
            token_index: 2,
            width: 5,
            repr: Repr::Unsigned,
            parts: vec![ImmPart::new(0, BitRange::new(20, 24))],
            symbol_type: SymbolType::None,
        };
        let word = 16u64 << 20;
        assert_eq!(field.decode(word), "16");
    }

    #[test]
    fn unsigned_field_rejects_value_that_fails_signed_fit_but_fits_unsigned() {
        let field = FieldKind::Imm {
            token_index: 2,
            width: 5,
            repr: Repr::Unsigned,
            parts: vec![ImmPart::new(0, BitRange::new(20, 24))],
            symbol_type: SymbolType::None,
        };
        let tokens = vec![Token::new("slli"), Token::new("a0"), Token::new("16")];
        let mut word = 0u64;
        field
            .apply(&tokens, &mut word, None, 0, Location::line(1))
            .unwrap();
        assert_eq!((word >> 20) & 0x1F, 16);
    }

    #[test]
    fn hex_field_decodes_as_hex_literal_and_accepts_msb_set_values() {
        let field = FieldKind::Imm {
            token_index: 2,
            width: 20,
            repr: Repr::Hex,
            parts: vec![ImmPart::new(0, BitRange::new(12, 31))],
            symbol_type: SymbolType::None,
        };
        let tokens = vec![Token::new("lui"), Token::new("a0"), Token::new("0x80000")];
        let mut word = 0u64;
        field
            .apply(&tokens, &mut word, None, 0, Location::line(1))
            .unwrap();
        assert_eq!(field.decode(word), "0x80000");
    }
}
