//! The two-pass assembler core (spec.md §4.8).
//!
//! Grounded in the original assembler's `Assembler::assemble`, which walks
//! the source twice: pass 1 tokenizes, expands pseudo-instructions, and
//! assigns every line a program address while building the symbol table;
//! pass 2 re-walks the same lines, resolving symbol references and emitting
//! bytes. Errors accumulate rather than abort (spec.md §7/§9): a line that
//! fails still consumes the byte width pass 1 already committed it to, so
//! every later line's address stays correct.

use std::collections::BTreeMap;

use ripes_isa::Isa;
use ripes_support::{evaluate, Location, SymbolMap, SymbolType as SupportSymbolType, Token};

use crate::directives::Directive;
use crate::errors::{AssemblerError, AssemblerErrorKind};
use crate::program::{AssembleResult, Program, Section, DATA, DATA_BASE, TEXT, TEXT_BASE};
use crate::tokenizer::{decompose, tokenize, DEFAULT_COMMENT_CHAR};

enum PlannedContent {
    Instruction { tokens: Vec<Token> },
    Directive { directive: Directive, args: Vec<Token> },
    Skip,
}

struct PlannedLine {
    location: Location,
    section: String,
    address: u64,
    size: u64,
    content: PlannedContent,
}

fn round_up_to_4(value: u64) -> u64 {
    (value + 3) & !3
}

fn is_numeric_local(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_digit())
}

/// Splits a 32-bit value into a `%hi`/`%lo` pair such that
/// `(hi << 12) + sign_extend(lo, 12) == value` modulo `2^32`, with `hi`
/// always in `0..2^20` so it fits `lui`/`auipc`'s unsigned 20-bit field
/// regardless of `value`'s sign.
fn split_hi_lo(value: i64) -> (u32, i32) {
    let hi_raw = value.wrapping_add(0x800) >> 12;
    let lo = (value - (hi_raw << 12)) as i32;
    let hi = (hi_raw as u32) & 0xF_FFFF;
    (hi, lo)
}

/// Evaluates `.align N`'s single operand against the relative-label
/// snapshot at `reference_line`, the same context ordinary data directives
/// resolve their operands against.
fn eval_align_arg(
    args: &[Token],
    symbols: &SymbolMap,
    reference_line: u32,
    location: Location,
) -> Result<u32, AssemblerError> {
    let token = args.first().ok_or_else(|| {
        AssemblerError::new(
            location,
            AssemblerErrorKind::WrongArgumentCount {
                mnemonic: ".align".to_string(),
                expected: 1,
                got: 0,
            },
        )
    })?;
    let value = evaluate(location, token.text(), Some(&symbols.copy_relative_to(reference_line)))
        .map_err(|e| AssemblerError::new(e.location, e.kind.into()))?;
    Ok(value.max(0) as u32)
}

fn register_symbol(
    symbols: &mut SymbolMap,
    name: &str,
    address: u64,
    location: Location,
    errors: &mut Vec<AssemblerError>,
) {
    if is_numeric_local(name) {
        let number: u32 = name.parse().unwrap_or(0);
        if let Err(e) = symbols.add_relative(number, address, location) {
            errors.push(AssemblerError::new(e.location, e.kind.into()));
        }
    } else if let Err(e) = symbols.add_absolute(name, address, location, SupportSymbolType::Address) {
        errors.push(AssemblerError::new(e.location, e.kind.into()));
    }
}

struct Pass1Output {
    planned: Vec<PlannedLine>,
    symbols: SymbolMap,
    errors: Vec<AssemblerError>,
}

fn run_pass1(source: &str, isa: &Isa, pre_populated: Option<SymbolMap>) -> Pass1Output {
    let mut symbols = pre_populated.unwrap_or_default();
    let mut errors = Vec::new();
    let mut planned = Vec::new();

    let mut current_section = TEXT.to_string();
    let mut section_size: BTreeMap<String, u64> = BTreeMap::new();
    section_size.insert(TEXT.to_string(), 0);
    section_size.insert(DATA.to_string(), 0);
    let section_base: BTreeMap<String, u64> =
        BTreeMap::from([(TEXT.to_string(), TEXT_BASE), (DATA.to_string(), DATA_BASE)]);

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let location = Location::line(line_no);

        let tokens = match tokenize(raw_line, location) {
            Ok(t) => t,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        let decomposed = match decompose(tokens, DEFAULT_COMMENT_CHAR, location) {
            Ok(d) => d,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        let base = *section_base.get(&current_section).unwrap_or(&TEXT_BASE);
        let size_so_far = *section_size.get(&current_section).unwrap_or(&0);
        let address = base + size_so_far;

        for name in &decomposed.symbols {
            register_symbol(&mut symbols, name, address, location, &mut errors);
        }

        if let Some(directive_token) = &decomposed.directive {
            let Some(directive) = Directive::parse(directive_token.text()) else {
                errors.push(AssemblerError::new(
                    location,
                    AssemblerErrorKind::UnknownDirective(directive_token.text().to_string()),
                ));
                planned.push(PlannedLine {
                    location,
                    section: current_section.clone(),
                    address,
                    size: 0,
                    content: PlannedContent::Skip,
                });
                continue;
            };

            if directive.is_early() {
                match Directive::parse_equ(&decomposed.rest, Some(&symbols.snapshot()), location) {
                    Ok((name, value)) => {
                        if let Err(e) = symbols.add_absolute(
                            name,
                            value as u64,
                            location,
                            SupportSymbolType::Constant,
                        ) {
                            errors.push(AssemblerError::new(e.location, e.kind.into()));
                        }
                    }
                    Err(e) => errors.push(e),
                }
                planned.push(PlannedLine {
                    location,
                    section: current_section.clone(),
                    address,
                    size: 0,
                    content: PlannedContent::Skip,
                });
                continue;
            }

            if directive.is_section_switch() {
                current_section = if matches!(directive, Directive::Data) {
                    DATA.to_string()
                } else {
                    TEXT.to_string()
                };
                planned.push(PlannedLine {
                    location,
                    section: current_section.clone(),
                    address,
                    size: 0,
                    content: PlannedContent::Skip,
                });
                continue;
            }

            let reference_line = location.source_line().unwrap_or(0);

            if directive.is_align() {
                let n = match eval_align_arg(&decomposed.rest, &symbols, reference_line, location) {
                    Ok(n) => n,
                    Err(e) => {
                        errors.push(e);
                        planned.push(PlannedLine {
                            location,
                            section: current_section.clone(),
                            address,
                            size: 0,
                            content: PlannedContent::Skip,
                        });
                        continue;
                    }
                };
                let alignment = 1u64 << n;
                let padded = size_so_far.div_ceil(alignment) * alignment;
                let pad = padded - size_so_far;
                section_size.insert(current_section.clone(), padded);
                planned.push(PlannedLine {
                    location,
                    section: current_section.clone(),
                    address,
                    size: pad,
                    content: PlannedContent::Skip,
                });
                continue;
            }
            let raw_len = match directive.dry_run_len(
                &decomposed.rest,
                Some(&symbols.copy_relative_to(reference_line)),
                location,
            ) {
                Ok(len) => len as u64,
                Err(e) => {
                    errors.push(e);
                    0
                }
            };
            let after_raw = size_so_far + raw_len;
            let after_padded = round_up_to_4(after_raw);
            let total_size = after_padded - size_so_far;
            section_size.insert(current_section.clone(), after_padded);

            planned.push(PlannedLine {
                location,
                section: current_section.clone(),
                address,
                size: total_size,
                content: PlannedContent::Directive {
                    directive,
                    args: decomposed.rest,
                },
            });
            continue;
        }

        if decomposed.rest.is_empty() {
            continue;
        }

        let mnemonic = decomposed.rest[0].text().to_string();
        let operands = &decomposed.rest[1..];

        if let Some(pseudo) = isa.pseudo_instruction(&mnemonic) {
            match (pseudo.expand)(operands, location) {
                Ok(expanded) => {
                    let mut offset = 0u64;
                    for line_tokens in expanded {
                        let line_mnemonic = line_tokens[0].text();
                        let width = isa
                            .instruction(line_mnemonic)
                            .map_or(4, |i| u64::from(i.size.bytes()));
                        planned.push(PlannedLine {
                            location,
                            section: current_section.clone(),
                            address: address + offset,
                            size: width,
                            content: PlannedContent::Instruction { tokens: line_tokens },
                        });
                        offset += width;
                    }
                    section_size.insert(current_section.clone(), size_so_far + offset);
                }
                Err(e) => {
                    errors.push(AssemblerError::new(e.location, e.kind.into()));
                    section_size.insert(current_section.clone(), size_so_far + 4);
                    planned.push(PlannedLine {
                        location,
                        section: current_section.clone(),
                        address,
                        size: 4,
                        content: PlannedContent::Skip,
                    });
                }
            }
            continue;
        }

        if let Some(instr) = isa.instruction(&mnemonic) {
            let width = u64::from(instr.size.bytes());
            section_size.insert(current_section.clone(), size_so_far + width);
            planned.push(PlannedLine {
                location,
                section: current_section.clone(),
                address,
                size: width,
                content: PlannedContent::Instruction { tokens: decomposed.rest },
            });
        } else {
            errors.push(AssemblerError::new(
                location,
                AssemblerErrorKind::UnknownInstruction(mnemonic),
            ));
            section_size.insert(current_section.clone(), size_so_far + 4);
            planned.push(PlannedLine {
                location,
                section: current_section.clone(),
                address,
                size: 4,
                content: PlannedContent::Skip,
            });
        }
    }

    Pass1Output {
        planned,
        symbols,
        errors,
    }
}

fn convert_field_error(err: ripes_isa::FieldError, mnemonic: &str) -> AssemblerError {
    let kind = match err.kind {
        ripes_isa::FieldErrorKind::MissingOperand(idx) => AssemblerErrorKind::WrongArgumentCount {
            mnemonic: mnemonic.to_string(),
            expected: idx + 1,
            got: idx,
        },
        other => other.into(),
    };
    AssemblerError::new(err.location, kind)
}

/// Assembles `source` against `isa`, returning the accumulated errors and
/// the resulting [`Program`] (valid iff [`AssembleResult::is_ok`]).
///
/// `pre_populated`, if given, seeds the symbol map before assembly begins
/// (e.g. linker-provided constants); `source_hash` is carried through
/// unchanged into the resulting [`Program`].
#[must_use]
pub fn assemble(
    source: &str,
    isa: &Isa,
    pre_populated: Option<SymbolMap>,
    source_hash: Option<String>,
) -> AssembleResult {
    let Pass1Output {
        planned,
        symbols,
        mut errors,
    } = run_pass1(source, isa, pre_populated);

    let mut sections = vec![Section::new(TEXT, TEXT_BASE), Section::new(DATA, DATA_BASE)];
    let mut source_mapping: BTreeMap<u64, std::collections::BTreeSet<u32>> = BTreeMap::new();
    let mut pending_lo: Option<i32> = None;

    for planned_line in &planned {
        let line_no = planned_line.location.source_line().unwrap_or(0);
        source_mapping
            .entry(planned_line.address)
            .or_default()
            .insert(line_no);

        let section = sections
            .iter_mut()
            .find(|s| s.name == planned_line.section)
            .expect("pass 1 only assigns known section names");

        match &planned_line.content {
            PlannedContent::Skip => {
                section.bytes.extend(std::iter::repeat(0u8).take(planned_line.size as usize));
            }
            PlannedContent::Directive { directive, args } => {
                let snapshot = symbols.copy_relative_to(line_no);
                match directive.emit(args, Some(&snapshot), planned_line.location) {
                    Ok(bytes) => {
                        section.bytes.extend_from_slice(&bytes);
                        let padding = planned_line.size as usize - bytes.len();
                        section.bytes.extend(std::iter::repeat(0u8).take(padding));
                    }
                    Err(e) => {
                        errors.push(e);
                        section
                            .bytes
                            .extend(std::iter::repeat(0u8).take(planned_line.size as usize));
                    }
                }
            }
            PlannedContent::Instruction { tokens } => {
                let mnemonic = tokens[0].text().to_string();
                let operands = &tokens[1..];
                let Some(instr) = isa.instruction(&mnemonic) else {
                    section
                        .bytes
                        .extend(std::iter::repeat(0u8).take(planned_line.size as usize));
                    continue;
                };

                let snapshot = symbols.copy_relative_to(line_no);
                let mut resolved: Vec<Token> = std::iter::once(Token::new(mnemonic.clone()))
                    .chain(operands.iter().cloned())
                    .collect();

                let mut relocation_failed = false;
                for i in 1..resolved.len() {
                    let Some(relocation) = resolved[i].relocation().map(str::to_string) else {
                        continue;
                    };
                    match relocation.as_str() {
                        "hi" => {
                            match evaluate(planned_line.location, resolved[i].text(), Some(&snapshot)) {
                                Ok(symbol_value) => {
                                    let is_pc_relative = mnemonic.eq_ignore_ascii_case("auipc");
                                    let offset = if is_pc_relative {
                                        symbol_value - planned_line.address as i64
                                    } else {
                                        symbol_value
                                    };
                                    let (hi, lo) = split_hi_lo(offset);
                                    pending_lo = Some(lo);
                                    resolved[i] = Token::new(hi.to_string());
                                }
                                Err(e) => {
                                    errors.push(AssemblerError::new(e.location, e.kind.into()));
                                    pending_lo = None;
                                    relocation_failed = true;
                                }
                            }
                        }
                        "lo" => {
                            if let Some(lo) = pending_lo.take() {
                                resolved[i] = Token::new(lo.to_string());
                            }
                        }
                        _ => {}
                    }
                }

                if relocation_failed {
                    section
                        .bytes
                        .extend(std::iter::repeat(0u8).take(planned_line.size as usize));
                    continue;
                }

                match instr.assemble(
                    &resolved,
                    Some(&snapshot),
                    planned_line.address as u32,
                    planned_line.location,
                ) {
                    Ok(word) => section.bytes.extend_from_slice(&word.to_le_bytes()),
                    Err(e) => {
                        errors.push(convert_field_error(e, &mnemonic));
                        section
                            .bytes
                            .extend(std::iter::repeat(0u8).take(planned_line.size as usize));
                    }
                }
            }
        }
    }

    let mut program_symbols = BTreeMap::new();
    for (name, value) in symbols.address_symbols() {
        program_symbols.entry(value).or_insert_with(|| name.to_string());
    }

    let entry_point = symbols
        .get_absolute("main")
        .or_else(|| symbols.get_absolute("_start"))
        .map_or(TEXT_BASE, |sym| sym.value);

    let program = Program {
        sections,
        symbols: program_symbols,
        source_mapping,
        entry_point,
        source_hash,
    };

    AssembleResult { errors, program }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isa() -> Isa {
        Isa::rv32im()
    }

    #[test]
    fn s1_directive_only_program_emits_words() {
        let result = assemble(".data\n.word 1,2,3,4\n", &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let data = result.program.section(DATA).unwrap();
        assert_eq!(
            data.bytes,
            vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0]
        );
    }

    #[test]
    fn s2_absolute_symbol_encodes_pc_relative_offset() {
        let result = assemble(".text\nA: nop\nB: jal A\n", &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let text = result.program.section(TEXT).unwrap();
        let word = u32::from_le_bytes(text.bytes[4..8].try_into().unwrap());
        let jal = isa().instruction("jal").unwrap().clone();
        assert!(jal.matches(word));
        assert_eq!(result.program.symbols.get(&TEXT_BASE), Some(&"A".to_string()));
        assert_eq!(
            result.program.symbols.get(&(TEXT_BASE + 4)),
            Some(&"B".to_string())
        );
    }

    #[test]
    fn s3_local_labels_resolve_to_nearest_definition() {
        let result = assemble("1: nop\n  j 1b\n1: nop\n  j 1b\n", &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let text = result.program.section(TEXT).unwrap();
        // word[1] (first "j 1b", expanded to "jal zero 1b") targets word[0];
        // word[3] (second "j 1b") targets word[2]. Both are a PC-relative
        // offset of -4, so the two instruction words are identical; what
        // must differ is the *resolved target address*, not the raw word.
        let jal = isa().instruction("jal").unwrap().clone();
        let imm_field = &jal.fields[1];
        let first_jump = u32::from_le_bytes(text.bytes[4..8].try_into().unwrap());
        let second_jump = u32::from_le_bytes(text.bytes[12..16].try_into().unwrap());
        assert!(jal.matches(first_jump));
        assert!(jal.matches(second_jump));
        let first_offset: i64 = imm_field.decode(u64::from(first_jump)).parse().unwrap();
        let second_offset: i64 = imm_field.decode(u64::from(second_jump)).parse().unwrap();
        let first_target = TEXT_BASE as i64 + 4 + first_offset;
        let second_target = TEXT_BASE as i64 + 12 + second_offset;
        assert_eq!(first_target, TEXT_BASE as i64);
        assert_eq!(second_target, TEXT_BASE as i64 + 8);
        assert_ne!(first_target, second_target);
    }

    #[test]
    fn unknown_instruction_is_reported_but_does_not_stop_assembly() {
        let result = assemble("frobnicate a0\nnop\n", &isa(), None, None);
        assert!(!result.is_ok());
        assert!(matches!(
            result.errors[0].kind,
            AssemblerErrorKind::UnknownInstruction(_)
        ));
        let text = result.program.section(TEXT).unwrap();
        assert_eq!(text.bytes.len(), 8);
    }

    #[test]
    fn li_with_large_symbol_value_splits_into_lui_addi_pair() {
        let src = ".text\nla a0, target\n.data\ntarget: .word 0\n";
        let result = assemble(src, &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let text = result.program.section(TEXT).unwrap();
        assert_eq!(text.bytes.len(), 8);
    }

    #[test]
    fn equ_defines_a_constant_usable_by_later_lines() {
        let src = ".equ N, 5\naddi a0, zero, N\n";
        let result = assemble(src, &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let text = result.program.section(TEXT).unwrap();
        let word = u32::from_le_bytes(text.bytes[0..4].try_into().unwrap());
        assert_eq!((word >> 20) & 0xFFF, 5);
    }

    #[test]
    fn align_pads_section_to_a_power_of_two_boundary() {
        let result = assemble(".data\n.byte 1\n.align 3\n.byte 2\n", &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let data = result.program.section(DATA).unwrap();
        // `.byte 1` leaves the section 1 byte long; `.align 3` pads to the
        // next 8-byte boundary (7 zero bytes) before `.byte 2` is emitted.
        assert_eq!(
            data.bytes,
            vec![1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0]
        );
    }

    #[test]
    fn align_to_an_already_aligned_boundary_is_a_no_op() {
        let result = assemble(".data\n.word 1\n.align 2\n.word 2\n", &isa(), None, None);
        assert!(result.is_ok(), "{:?}", result.errors);
        let data = result.program.section(DATA).unwrap();
        assert_eq!(data.bytes, vec![1, 0, 0, 0, 2, 0, 0, 0]);
    }

    #[test]
    fn duplicate_local_label_on_one_line_is_reported() {
        let result = assemble("1: 1: nop\n", &isa(), None, None);
        assert!(!result.is_ok());
        assert!(matches!(
            result.errors[0].kind,
            AssemblerErrorKind::MultipleDefinition(_)
        ));
    }
}
