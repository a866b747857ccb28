//! The directive engine (spec.md §4.7): data emission, section switching,
//! and `.equ` constant definition.
//!
//! Grounded in the original assembler's `directives.h`/`directives.cpp`
//! (`TextDirective`/`DataDirective`/`AscizDirective`/...), one small struct
//! per directive there; here the whole table is one [`Directive`] enum
//! interpreted by [`Directive::emit`], following the same tagged-data
//! approach `ripes-isa` uses for instructions.
//!
//! `.align N` is the one addition beyond spec.md's directive table: it pads
//! the current section up to a `2^N`-byte boundary, generalizing the
//! "round up to 4 bytes after every data emission" rule spec.md already
//! mandates into an explicit, caller-invoked form. Because the pad count
//! depends on the section's current size, it is computed directly in
//! [`crate::assembler::run_pass1`] rather than through
//! [`Directive::dry_run_len`]/[`Directive::emit`].

use ripes_support::{evaluate, Location, SymbolTable};

use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::tokenizer::unquote;

/// One recognized directive, with the element width data directives emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `.text` — switch the current section to `TEXT`.
    Text,
    /// `.data` — switch the current section to `DATA`.
    Data,
    /// `.byte`, one-byte-per-value.
    Byte,
    /// `.half`/`.2byte`/`.short`, two-bytes-per-value.
    Half,
    /// `.word`/`.4byte`/`.long`, four-bytes-per-value.
    Word,
    /// `.zero N` — N zero bytes.
    Zero,
    /// `.string`/`.asciz` — a NUL-terminated byte string.
    Str,
    /// `.equ NAME, VALUE` — an early-evaluated absolute constant.
    Equ,
    /// `.align N` — pad the current section up to a `2^N`-byte boundary
    /// with NUL bytes. Handled outside [`Directive::dry_run_len`]/
    /// [`Directive::emit`] (the assembler's pass 1 computes the pad count
    /// directly, since it alone knows the section's current size).
    Align,
}

impl Directive {
    /// Resolves a directive token's text (including its leading `.`) to a
    /// [`Directive`], or `None` if unrecognized.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            ".text" => Self::Text,
            ".data" => Self::Data,
            ".byte" => Self::Byte,
            ".half" | ".2byte" | ".short" => Self::Half,
            ".word" | ".4byte" | ".long" => Self::Word,
            ".zero" => Self::Zero,
            ".string" | ".asciz" => Self::Str,
            ".equ" => Self::Equ,
            ".align" => Self::Align,
            _ => return None,
        })
    }

    /// `true` for directives spec.md §4.8 requires to run during pass 1
    /// (symbol discovery) rather than pass 2 (emission). Only `.equ`
    /// qualifies: everything else either switches a section (pure
    /// bookkeeping, safe in either pass, done in pass 1 for address
    /// computation to see it) or emits bytes whose contents may reference
    /// symbols not yet defined.
    #[must_use]
    pub fn is_early(self) -> bool {
        matches!(self, Self::Equ)
    }

    /// `true` if this directive only switches the current section and
    /// never itself emits bytes.
    #[must_use]
    pub fn is_section_switch(self) -> bool {
        matches!(self, Self::Text | Self::Data)
    }

    /// `true` for `.align`, which the assembler handles directly in pass 1
    /// (it needs the section's current size to compute a pad count, unlike
    /// every other directive here).
    #[must_use]
    pub fn is_align(self) -> bool {
        matches!(self, Self::Align)
    }

    fn element_width(self) -> Option<usize> {
        match self {
            Self::Byte => Some(1),
            Self::Half => Some(2),
            Self::Word => Some(4),
            _ => None,
        }
    }

    /// Computes how many bytes this directive will emit, without actually
    /// evaluating operand expressions (a dry run, for pass 1's address
    /// bookkeeping) — except `.zero`'s count and `.string`'s content length,
    /// which must be known to size the emission at all.
    pub fn dry_run_len(
        self,
        args: &[ripes_support::Token],
        symbols: Option<&SymbolTable>,
        location: Location,
    ) -> Result<usize, AssemblerError> {
        match self {
            Self::Text | Self::Data | Self::Equ | Self::Align => Ok(0),
            Self::Byte | Self::Half | Self::Word => {
                Ok(args.len() * self.element_width().unwrap())
            }
            Self::Zero => {
                let n = eval_arg(args, 0, symbols, location)?;
                Ok(n.max(0) as usize)
            }
            Self::Str => Ok(string_bytes(args).len() + 1),
        }
    }

    /// Emits this directive's bytes, evaluating operand expressions against
    /// `symbols` (the relative-label snapshot taken at this line, per
    /// spec.md §4.8).
    pub fn emit(
        self,
        args: &[ripes_support::Token],
        symbols: Option<&SymbolTable>,
        location: Location,
    ) -> Result<Vec<u8>, AssemblerError> {
        match self {
            Self::Text | Self::Data | Self::Equ | Self::Align => Ok(Vec::new()),
            Self::Byte | Self::Half | Self::Word => {
                let width = self.element_width().unwrap();
                let mut bytes = Vec::with_capacity(args.len() * width);
                for i in 0..args.len() {
                    let value = eval_arg(args, i, symbols, location)?;
                    let le = (value as u64).to_le_bytes();
                    bytes.extend_from_slice(&le[..width]);
                }
                Ok(bytes)
            }
            Self::Zero => {
                let n = eval_arg(args, 0, symbols, location)?;
                Ok(vec![0u8; n.max(0) as usize])
            }
            Self::Str => {
                let mut bytes = string_bytes(args).into_bytes();
                bytes.push(0);
                Ok(bytes)
            }
        }
    }

    /// Parses a `.equ NAME, VALUE` line's arguments into the symbol name and
    /// its evaluated value. `symbols` is the program's absolute-symbol
    /// snapshot so far (no relative-label context applies to `.equ`, which
    /// runs in pass 1 before any line has a meaningful reference point).
    pub fn parse_equ(
        args: &[ripes_support::Token],
        symbols: Option<&SymbolTable>,
        location: Location,
    ) -> Result<(String, i64), AssemblerError> {
        if args.len() < 2 {
            return Err(AssemblerError::new(
                location,
                AssemblerErrorKind::WrongArgumentCount {
                    mnemonic: ".equ".to_string(),
                    expected: 2,
                    got: args.len(),
                },
            ));
        }
        let name = args[0].text().to_string();
        let expr = join_tokens(&args[1..]);
        let value = evaluate(location, &expr, symbols)
            .map_err(|e| AssemblerError::new(location, e.kind.into()))?;
        Ok((name, value))
    }
}

/// Joins directive-argument tokens with no separator for evaluation — the
/// tokenizer may have split an expression like `1 + 2` on its internal
/// spaces; [`evaluate`] strips whitespace on its own, so rejoining without
/// one is equivalent to what it would have seen had the spaces never been
/// there.
fn join_tokens(tokens: &[ripes_support::Token]) -> String {
    tokens.iter().map(ripes_support::Token::text).collect()
}

fn eval_arg(
    args: &[ripes_support::Token],
    index: usize,
    symbols: Option<&SymbolTable>,
    location: Location,
) -> Result<i64, AssemblerError> {
    let token = args
        .get(index)
        .ok_or_else(|| AssemblerError::new(location, AssemblerErrorKind::UnresolvedImmediate(String::new())))?;
    evaluate(location, token.text(), symbols).map_err(|e| AssemblerError::new(location, e.kind.into()))
}

/// Joins `.string`/`.asciz`'s arguments (already comma-split by the
/// tokenizer) back with a space, unquoting any that were written as a
/// quoted string literal, matching spec.md §4.7's "UTF-8 bytes of the
/// joined, unquoted arguments".
fn string_bytes(args: &[ripes_support::Token]) -> String {
    args.iter()
        .map(|t| {
            if t.text().starts_with('"') {
                unquote(t.text())
            } else {
                t.text().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
