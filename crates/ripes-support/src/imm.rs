//! Integer-literal parsing, matching the original assembler's lenient
//! decimal/hex/binary literal convention (`isa_defines.h`'s `getImmediate`/
//! `getImmediateSext32`).

use thiserror::Error;

/// The radix an integer literal was written in, as recovered by
/// [`parse_int`]. Used by the immediate-field width check (`ripes-isa`) to
/// decide whether a "bitwise-lenient" signed/unsigned either-fit rule
/// applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    /// `0x...` literal.
    Hex,
    /// `0b...` literal.
    Binary,
    /// Plain decimal literal (optionally signed).
    Signed,
}

/// Metadata about how an integer literal was written, alongside its parsed
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmConvInfo {
    /// `true` for `0x...`/`0b...` literals (digits only, sign applied
    /// separately); `false` for plain decimal.
    pub is_unsigned_literal: bool,
    /// `true` if a hex literal has at most 8 hex digits, or a binary literal
    /// has at most 32 bits — i.e. the literal's magnitude fits in 32 bits as
    /// written.
    pub is_32bit_literal: bool,
    /// The radix the literal was written in.
    pub radix: Radix,
}

/// The result of parsing an integer literal: its value (as a 64-bit signed
/// quantity, to preserve bit patterns of negative/wrapped values) and the
/// conversion metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInt {
    /// The parsed value.
    pub value: i64,
    /// Conversion metadata.
    pub info: ImmConvInfo,
}

/// Error parsing an integer literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseIntError {
    /// The text is not a valid decimal, `0x` hex, or `0b` binary literal.
    #[error("'{0}' is not a valid integer literal")]
    NotAnInteger(String),
}

/// Parses an integer literal following the convention described in
/// spec.md §4.2:
///
/// 1. Trim and uppercase.
/// 2. Optional leading `+`/`-` sign.
/// 3. `0X` prefix → base 16, unsigned-literal, 32-bit iff ≤ 8 hex digits.
/// 4. `0B` prefix → base 2, unsigned-literal, 32-bit iff ≤ 32 digits.
/// 5. Otherwise → base 10, signed.
pub fn parse_int(text: &str) -> Result<ParsedInt, ParseIntError> {
    let trimmed = text.trim().to_ascii_uppercase();

    // Base-10 attempt first, mirroring `toLongLong(&canConvert, 10)` which
    // accepts an optional sign itself.
    if let Ok(value) = trimmed.parse::<i64>() {
        return Ok(ParsedInt {
            value,
            info: ImmConvInfo {
                is_unsigned_literal: false,
                is_32bit_literal: false,
                radix: Radix::Signed,
            },
        });
    }

    let (sign, rest): (i64, &str) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed.as_str()),
    };

    if let Some(digits) = rest.strip_prefix("0X") {
        let magnitude = u64::from_str_radix(digits, 16)
            .map_err(|_| ParseIntError::NotAnInteger(text.to_string()))?;
        let value = if sign < 0 {
            (magnitude as i64).wrapping_neg()
        } else {
            magnitude as i64
        };
        return Ok(ParsedInt {
            value,
            info: ImmConvInfo {
                is_unsigned_literal: true,
                is_32bit_literal: digits.len() <= 8,
                radix: Radix::Hex,
            },
        });
    }

    if let Some(digits) = rest.strip_prefix("0B") {
        let magnitude = u64::from_str_radix(digits, 2)
            .map_err(|_| ParseIntError::NotAnInteger(text.to_string()))?;
        let value = if sign < 0 {
            (magnitude as i64).wrapping_neg()
        } else {
            magnitude as i64
        };
        return Ok(ParsedInt {
            value,
            info: ImmConvInfo {
                is_unsigned_literal: true,
                is_32bit_literal: digits.len() <= 32,
                radix: Radix::Binary,
            },
        });
    }

    Err(ParseIntError::NotAnInteger(text.to_string()))
}

/// Parses an integer literal as [`parse_int`] does, then applies the
/// "32-bit truncate-then-sign-extend" convention described in spec.md §4.2
/// and §9's Open Question: if the literal's magnitude fits in the low 32
/// bits and was written as a bitwise (hex/binary) literal of 32-bit-or-fewer
/// digits, truncate to 32 bits and sign-extend back to 64.
///
/// This is what makes `0xFFFFFFFF` acceptable as `-1` in a signed 12-bit
/// immediate field: the literal is first normalized to the 64-bit value
/// `-1` here, which then separately passes the signed-12-bit width check.
pub fn parse_int_sext32(text: &str) -> Result<ParsedInt, ParseIntError> {
    let mut parsed = parse_int(text)?;
    let upper_32_zero = (parsed.value as u64) >> 32 == 0;
    if parsed.info.is_32bit_literal && upper_32_zero {
        parsed.value = i64::from(parsed.value as i32);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_decimal() {
        let p = parse_int("42").unwrap();
        assert_eq!(p.value, 42);
        assert_eq!(p.info.radix, Radix::Signed);
        assert!(!p.info.is_unsigned_literal);
    }

    #[test]
    fn parses_negative_decimal() {
        let p = parse_int("-7").unwrap();
        assert_eq!(p.value, -7);
    }

    #[test]
    fn parses_hex_literal() {
        let p = parse_int("0xFF").unwrap();
        assert_eq!(p.value, 0xFF);
        assert_eq!(p.info.radix, Radix::Hex);
        assert!(p.info.is_32bit_literal);
    }

    #[test]
    fn parses_hex_literal_over_8_digits_is_not_32bit() {
        let p = parse_int("0x1_2345_6789".replace('_', "").as_str()).unwrap();
        assert!(!p.info.is_32bit_literal);
    }

    #[test]
    fn parses_binary_literal() {
        let p = parse_int("0b1010").unwrap();
        assert_eq!(p.value, 0b1010);
        assert_eq!(p.info.radix, Radix::Binary);
    }

    #[test]
    fn parses_signed_hex_literal() {
        let p = parse_int("-0x10").unwrap();
        assert_eq!(p.value, -16);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_int("not_a_number").is_err());
    }

    #[test]
    fn sext32_treats_0xffffffff_as_minus_one() {
        // The Open Question in spec.md §9: 0xFFFFFFFF must normalize to -1
        // so that it later fits a signed-12-bit field.
        let p = parse_int_sext32("0xFFFFFFFF").unwrap();
        assert_eq!(p.value, -1);
    }

    #[test]
    fn sext32_does_not_apply_to_64_bit_hex_literals() {
        let p = parse_int_sext32("0xFFFFFFFFFFFFFFFF").unwrap();
        assert_eq!(p.value, -1i64); // plain 64-bit all-ones is already -1
        let p2 = parse_int_sext32("0x1FFFFFFFF").unwrap(); // 9 hex digits, not 32-bit
        assert!(!p2.info.is_32bit_literal);
        assert_eq!(p2.value, 0x1_FFFF_FFFF);
    }

    #[test]
    fn sext32_does_not_apply_to_decimal_literals() {
        // Decimal literals never set is_32bit_literal, so a large decimal
        // value is never reinterpreted via the truncate-then-sext rule.
        let p = parse_int_sext32("4294967295").unwrap();
        assert_eq!(p.value, 4_294_967_295);
    }
}
