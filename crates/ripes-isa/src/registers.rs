//! RISC-V integer register name resolution.
//!
//! Ported from `RVISA::regNumber` (`instruction.h`/`rv_i_ext.cpp`), which
//! accepts both the ABI mnemonic (`a0`, `sp`, `ra`, ...) and the raw `x`
//! index (`x10`).

const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Resolves a register token (`"a0"`, `"x10"`, `"fp"`, ...) to its numeric
/// index `0..=31`.
///
/// `fp` is accepted as an alias of `s0` (the conventional frame pointer),
/// matching GNU-as convention.
#[must_use]
pub fn register_number(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.eq_ignore_ascii_case("fp") {
        return Some(8);
    }
    if let Some(digits) = token
        .strip_prefix('x')
        .or_else(|| token.strip_prefix('X'))
    {
        return digits.parse::<u32>().ok().filter(|&n| n < 32);
    }
    ABI_NAMES
        .iter()
        .position(|&name| name.eq_ignore_ascii_case(token))
        .map(|i| i as u32)
}

/// The canonical ABI name for register index `n` (`0..=31`).
#[must_use]
pub fn register_name(n: u32) -> Option<&'static str> {
    ABI_NAMES.get(n as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_abi_names() {
        assert_eq!(register_number("a0"), Some(10));
        assert_eq!(register_number("zero"), Some(0));
        assert_eq!(register_number("ra"), Some(1));
    }

    #[test]
    fn resolves_raw_x_index() {
        assert_eq!(register_number("x10"), Some(10));
        assert_eq!(register_number("x31"), Some(31));
        assert_eq!(register_number("x32"), None);
    }

    #[test]
    fn resolves_fp_alias() {
        assert_eq!(register_number("fp"), Some(8));
        assert_eq!(register_number("s0"), Some(8));
    }

    #[test]
    fn rejects_unknown_token() {
        assert_eq!(register_number("not_a_reg"), None);
    }

    #[test]
    fn name_round_trips_with_number() {
        for n in 0..32 {
            let name = register_name(n).unwrap();
            assert_eq!(register_number(name), Some(n));
        }
    }
}
