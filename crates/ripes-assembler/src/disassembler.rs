//! Disassembly (spec.md §4.8/§6): bulk rendering of a program's `TEXT`
//! section, and single-instruction decoding for pipeline-stage display.
//!
//! Grounded in the original assembler's `Disassembler::execute`, which
//! walks a section in ISA-width windows, matching each word against the
//! ISA's opcode table (most-specific wins, already implemented by
//! [`Isa::decode`]) and printing a `<name>:` header wherever a label falls.

use std::collections::BTreeMap;

use ripes_isa::{FieldKind, Instruction, Isa, SymbolType};
use ripes_support::AInt;

use crate::program::{Program, TEXT};

/// The default instruction window walked when nothing in a word matches
/// any known opcode (spec.md §4.8: "consume the default instruction width").
const DEFAULT_INSTRUCTION_WIDTH: u32 = 4;

/// The outcome of decoding a single instruction word (spec.md §6's
/// single-instruction disassembler boundary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleInstructionResult {
    /// The rendered `mnemonic operand, operand, ...` text, or `"invalid"`.
    pub text: String,
    /// How many bytes this decode consumed.
    pub bytes_consumed: u32,
    /// Set when no instruction matched `word`.
    pub error: Option<String>,
}

fn symbol_suffix(
    instr: &Instruction,
    word: u32,
    address: AInt,
    reverse_symbols: Option<&BTreeMap<AInt, String>>,
) -> Option<String> {
    let reverse_symbols = reverse_symbols?;
    for field in &instr.fields {
        let FieldKind::Imm { symbol_type, .. } = field else {
            continue;
        };
        if *symbol_type == SymbolType::None {
            continue;
        }
        let signed: i64 = field.decode(u64::from(word)).parse().ok()?;
        let target = match symbol_type {
            SymbolType::Relative => (address as i64).wrapping_add(signed),
            _ => signed,
        };
        if let Some(name) = reverse_symbols.get(&(target as u64)) {
            return Some(name.clone());
        }
    }
    None
}

/// Disassembles a single instruction word at `address`.
///
/// `reverse_symbols`, if given, annotates any symbol-capable immediate
/// operand whose resolved target address names a known symbol, per
/// spec.md §4.5's `disassemble` contract.
#[must_use]
pub fn disassemble_one(
    word: u32,
    address: AInt,
    isa: &Isa,
    reverse_symbols: Option<&BTreeMap<AInt, String>>,
) -> SingleInstructionResult {
    match isa.decode(word) {
        Some(instr) => {
            let mut text = instr.disassemble(word);
            if let Some(name) = symbol_suffix(instr, word, address, reverse_symbols) {
                text.push_str(&format!(" <{name}>"));
            }
            SingleInstructionResult {
                text,
                bytes_consumed: instr.size.bytes(),
                error: None,
            }
        }
        None => SingleInstructionResult {
            text: "invalid".to_string(),
            bytes_consumed: DEFAULT_INSTRUCTION_WIDTH,
            error: Some(format!("no instruction matches word {word:#010x}")),
        },
    }
}

/// Disassembles the `TEXT` section of `program` in full, one rendered line
/// per instruction, with `<name>:` header lines wherever a symbol's address
/// falls within the section.
#[must_use]
pub fn disassemble_program(program: &Program, isa: &Isa) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(text) = program.section(TEXT) else {
        return lines;
    };

    let mut offset = 0usize;
    while offset < text.bytes.len() {
        let address = text.base_address + offset as AInt;
        if let Some(name) = program.symbols.get(&address) {
            lines.push(format!("{name}:"));
        }

        let remaining = text.bytes.len() - offset;
        if remaining < DEFAULT_INSTRUCTION_WIDTH as usize {
            lines.push(format!("{address:#010x}: <truncated>"));
            break;
        }
        let word =
            u32::from_le_bytes(text.bytes[offset..offset + 4].try_into().expect("checked above"));
        let result = disassemble_one(word, address, isa, Some(&program.symbols));
        lines.push(format!("{address:#010x}: {word:#010x}  {}", result.text));
        offset += result.bytes_consumed as usize;
    }

    lines
}
