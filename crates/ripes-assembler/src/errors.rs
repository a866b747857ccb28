//! The assembler's unified error vocabulary (spec.md §7).
//!
//! Every fallible stage — tokenizing, directive dispatch, pseudo-expansion,
//! field encoding, expression evaluation, symbol registration — reports into
//! this one [`AssemblerErrorKind`] rather than each layer inventing its own
//! error type that the next layer has to wrap. `ripes-isa` and
//! `ripes-support` keep their own narrower error enums (they are usable
//! without an assembler on top); the `From` impls below are the seam where
//! those get folded in.

use ripes_support::Located;
use thiserror::Error;

/// Every way a line of source can fail to tokenize, decompose, or assemble,
/// per spec.md §7.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerErrorKind {
    /// No opcode or pseudo-instruction matched the line's first token.
    #[error("unknown instruction '{0}'")]
    UnknownInstruction(String),
    /// A `.`-prefixed token did not name a directive this engine knows.
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
    /// The operand count disagreed with what the instruction/directive/pseudo
    /// expects.
    #[error("'{mnemonic}' expects {expected} operands, got {got}")]
    WrongArgumentCount {
        /// The instruction, pseudo-instruction, or directive mnemonic.
        mnemonic: String,
        /// How many operands it expects.
        expected: usize,
        /// How many were given.
        got: usize,
    },
    /// A register operand did not resolve via the ISA's register map.
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    /// A computed immediate did not fit its field's width.
    #[error("immediate value {value} does not fit in {width} bits")]
    ImmediateOutOfRange {
        /// The out-of-range value.
        value: i64,
        /// The field's bit width.
        width: u32,
    },
    /// An expression referenced a name bound to nothing.
    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),
    /// An immediate token was neither a literal nor a known symbol.
    #[error("'{0}' is not a valid immediate or known symbol")]
    UnresolvedImmediate(String),
    /// A `(`/`[` was never closed, or a `)`/`]` had no opener.
    #[error("unmatched parenthesis")]
    UnmatchedParenthesis,
    /// A `"` was opened but the line ended before it closed.
    #[error("missing terminating quote")]
    MissingTerminatingQuote,
    /// A `:` appeared on an empty or otherwise invalid symbol name.
    #[error("stray ':'")]
    StrayColon,
    /// A second `.`-prefixed token appeared where only one directive is
    /// permitted (see [`AssemblerErrorKind::IllegalMultipleDirectives`] for
    /// the specific "two real directives" case; this covers a bare stray
    /// `.` with nothing recognizable attached).
    #[error("stray '.'")]
    StrayDot,
    /// A symbol name was empty or contained an expression operator.
    #[error("'{0}' is not a valid symbol name")]
    InvalidSymbol(String),
    /// A symbol (absolute, or `.equ` constant) was already bound elsewhere.
    #[error("symbol '{0}' is already defined")]
    MultipleDefinition(String),
    /// More than one `.`-prefixed token appeared on a single line.
    #[error("a line may carry at most one directive")]
    IllegalMultipleDirectives,
    /// `/` or `%` with a zero right-hand operand.
    #[error("division by zero")]
    DivisionByZero,
}

/// An [`AssemblerErrorKind`] tied to the source line that produced it.
pub type AssemblerError = Located<AssemblerErrorKind>;

impl From<ripes_isa::fields::FieldErrorKind> for AssemblerErrorKind {
    fn from(kind: ripes_isa::fields::FieldErrorKind) -> Self {
        use ripes_isa::fields::FieldErrorKind as F;
        match kind {
            F::UnknownRegister(r) => Self::UnknownRegister(r),
            F::UnresolvedImmediate(t) => Self::UnresolvedImmediate(t),
            F::DoesNotFit { value, width } => Self::ImmediateOutOfRange { value, width },
            F::MissingOperand(idx) => Self::WrongArgumentCount {
                mnemonic: String::new(),
                expected: idx + 1,
                got: idx,
            },
        }
    }
}

impl From<ripes_isa::pseudo::PseudoErrorKind> for AssemblerErrorKind {
    fn from(kind: ripes_isa::pseudo::PseudoErrorKind) -> Self {
        use ripes_isa::pseudo::PseudoErrorKind as P;
        match kind {
            P::WrongOperandCount {
                mnemonic,
                expected,
                got,
            } => Self::WrongArgumentCount {
                mnemonic,
                expected,
                got,
            },
        }
    }
}

impl From<ripes_support::EvalErrorKind> for AssemblerErrorKind {
    fn from(kind: ripes_support::EvalErrorKind) -> Self {
        use ripes_support::EvalErrorKind as E;
        match kind {
            E::UnmatchedParenthesis => Self::UnmatchedParenthesis,
            E::InvalidOperator(_) | E::NotAValue(_) => {
                Self::UnresolvedImmediate(kind.to_string())
            }
            E::UnknownSymbol(s) => Self::UnknownSymbol(s),
            E::DivisionByZero => Self::DivisionByZero,
        }
    }
}

impl From<ripes_support::SymbolErrorKind> for AssemblerErrorKind {
    fn from(kind: ripes_support::SymbolErrorKind) -> Self {
        use ripes_support::SymbolErrorKind as S;
        match kind {
            S::Redefined(name) => Self::MultipleDefinition(name),
            S::RelativeRedefined(number) => Self::MultipleDefinition(number.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_error_translates_to_assembler_vocabulary() {
        let kind: AssemblerErrorKind =
            ripes_isa::fields::FieldErrorKind::UnknownRegister("q9".to_string()).into();
        assert_eq!(kind, AssemblerErrorKind::UnknownRegister("q9".to_string()));
    }
}
