//! Absolute and relative (numeric-local) symbol tracking.
//!
//! Grounded in the original assembler's `symbolmap.h`/`symbolmap.cpp`. Two
//! kinds of symbol live here:
//!
//! - Absolute symbols: ordinary labels and `.equ` constants, one value per
//!   name, global for the whole program.
//! - Relative (numeric-local) symbols: labels like `1:`, `2:` that may be
//!   defined many times in the same file; a reference to `1f`/`1b` resolves
//!   to the nearest definition of `1` strictly after/before the referencing
//!   line, per GNU-as numeric-local-label convention.
//!
//! [`SymbolMap::copy_relative_to`] is the `snapshot`/`copyRelativeTo`
//! equivalent: it produces a flat table (suitable for [`crate::expr::evaluate`])
//! by resolving every relative symbol's `Nf`/`Nb` forms against a specific
//! reference line, alongside all absolute symbols unchanged.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::expr::SymbolTable;
use crate::loc::{Located, Location, VInt};

/// What kind of thing a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolType {
    /// A label marking an address (an instruction or a data position).
    Address,
    /// A constant bound by `.equ` or similar, with no address semantics.
    Constant,
}

/// A single symbol definition: its value, where it was defined, and what
/// kind of thing it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// The symbol's value (an address for [`SymbolType::Address`], an
    /// arbitrary constant for [`SymbolType::Constant`]).
    pub value: VInt,
    /// Where the symbol was defined.
    pub location: Location,
    /// What kind of thing this symbol names.
    pub symbol_type: SymbolType,
}

/// What went wrong updating a [`SymbolMap`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolErrorKind {
    /// An absolute symbol was defined more than once.
    #[error("symbol '{0}' is already defined")]
    Redefined(String),
    /// A numeric-local label was defined twice on the same source line.
    #[error("local symbol '{0}' is already defined on this line")]
    RelativeRedefined(u32),
}

/// A symbol-map error, tied to the [`Location`] of the redefinition.
pub type SymbolError = Located<SymbolErrorKind>;

/// The absolute and relative symbols collected while assembling a program.
#[derive(Debug, Clone, Default)]
pub struct SymbolMap {
    abs: BTreeMap<String, Symbol>,
    // numeric-local label -> (defining source line -> symbol)
    rel: BTreeMap<u32, BTreeMap<u32, Symbol>>,
}

impl SymbolMap {
    /// Creates an empty symbol map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines an absolute (ordinary, globally-unique) symbol.
    ///
    /// Fails if `name` is already bound; redefinition is never allowed for
    /// absolute symbols, matching the original assembler's `add_absolute`.
    pub fn add_absolute(
        &mut self,
        name: impl Into<String>,
        value: VInt,
        location: Location,
        symbol_type: SymbolType,
    ) -> Result<(), SymbolError> {
        let name = name.into();
        if self.abs.contains_key(&name) {
            return Err(Located::new(location, SymbolErrorKind::Redefined(name)));
        }
        self.abs.insert(
            name,
            Symbol {
                value,
                location,
                symbol_type,
            },
        );
        Ok(())
    }

    /// Defines a relative (numeric-local) symbol, e.g. the label `1` in a
    /// `1:` definition. Unlike absolute symbols, the same number may be
    /// defined on any number of distinct source lines, but not twice on the
    /// same line.
    pub fn add_relative(
        &mut self,
        number: u32,
        value: VInt,
        location: Location,
    ) -> Result<(), SymbolError> {
        let line = location.source_line().unwrap_or(0);
        let by_line = self.rel.entry(number).or_default();
        if by_line.contains_key(&line) {
            return Err(Located::new(location, SymbolErrorKind::RelativeRedefined(number)));
        }
        by_line.insert(
            line,
            Symbol {
                value,
                location,
                symbol_type: SymbolType::Address,
            },
        );
        Ok(())
    }

    /// Looks up an absolute symbol by name.
    #[must_use]
    pub fn get_absolute(&self, name: &str) -> Option<&Symbol> {
        self.abs.get(name)
    }

    /// Returns `true` if an absolute symbol named `name` is defined.
    #[must_use]
    pub fn contains_absolute(&self, name: &str) -> bool {
        self.abs.contains_key(name)
    }

    /// Resolves the nearest definition of numeric-local label `number`
    /// strictly after `reference_line` (the `Nf` form).
    #[must_use]
    pub fn resolve_forward(&self, number: u32, reference_line: u32) -> Option<VInt> {
        self.rel
            .get(&number)?
            .range((reference_line + 1)..)
            .next()
            .map(|(_, sym)| sym.value)
    }

    /// Resolves the nearest definition of numeric-local label `number` at or
    /// before `reference_line` (the `Nb` form).
    #[must_use]
    pub fn resolve_backward(&self, number: u32, reference_line: u32) -> Option<VInt> {
        self.rel
            .get(&number)?
            .range(..=reference_line)
            .next_back()
            .map(|(_, sym)| sym.value)
    }

    /// Flattens this map into a [`SymbolTable`] suitable for
    /// [`crate::expr::evaluate`], resolving every relative symbol's `Nf`/`Nb`
    /// forms (as keys `"Nf"`/`"Nb"`) against `reference_line`.
    ///
    /// Absolute symbols are carried through unchanged under their own name.
    #[must_use]
    pub fn copy_relative_to(&self, reference_line: u32) -> SymbolTable {
        let mut table = SymbolTable::new();
        for (name, sym) in &self.abs {
            table.insert(name.clone(), sym.value);
        }
        for (&number, _) in &self.rel {
            if let Some(value) = self.resolve_forward(number, reference_line) {
                table.insert(format!("{number}f"), value);
            }
            if let Some(value) = self.resolve_backward(number, reference_line) {
                table.insert(format!("{number}b"), value);
            }
        }
        table
    }

    /// Returns a flat snapshot of just the absolute symbols, with no
    /// relative-label resolution. Useful for contexts (e.g. `.equ`
    /// right-hand sides processed in pass 1) with no meaningful reference
    /// line yet.
    #[must_use]
    pub fn snapshot(&self) -> SymbolTable {
        self.abs.iter().map(|(k, v)| (k.clone(), v.value)).collect()
    }

    /// Iterates every absolute symbol of [`SymbolType::Address`] (labels,
    /// not `.equ` constants), for building a program's address-keyed symbol
    /// table.
    pub fn address_symbols(&self) -> impl Iterator<Item = (&str, VInt)> {
        self.abs
            .iter()
            .filter(|(_, sym)| sym.symbol_type == SymbolType::Address)
            .map(|(name, sym)| (name.as_str(), sym.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_symbol_round_trips() {
        let mut map = SymbolMap::new();
        map.add_absolute("start", 0x1000, Location::line(1), SymbolType::Address)
            .unwrap();
        assert_eq!(map.get_absolute("start").unwrap().value, 0x1000);
    }

    #[test]
    fn absolute_redefinition_is_an_error() {
        let mut map = SymbolMap::new();
        map.add_absolute("start", 0x1000, Location::line(1), SymbolType::Address)
            .unwrap();
        let err = map
            .add_absolute("start", 0x2000, Location::line(5), SymbolType::Address)
            .unwrap_err();
        assert_eq!(err.kind, SymbolErrorKind::Redefined("start".to_string()));
    }

    #[test]
    fn relative_label_resolves_nearest_forward_and_backward() {
        let mut map = SymbolMap::new();
        map.add_relative(1, 0x100, Location::line(5)).unwrap();
        map.add_relative(1, 0x200, Location::line(15)).unwrap();
        assert_eq!(map.resolve_forward(1, 10), Some(0x200));
        assert_eq!(map.resolve_backward(1, 10), Some(0x100));
        assert_eq!(map.resolve_forward(1, 20), None);
        assert_eq!(map.resolve_backward(1, 4), None);
    }

    #[test]
    fn copy_relative_to_exposes_f_and_b_suffixed_keys() {
        let mut map = SymbolMap::new();
        map.add_absolute("base", 64, Location::line(1), SymbolType::Constant)
            .unwrap();
        map.add_relative(2, 0x40, Location::line(3)).unwrap();
        map.add_relative(2, 0x80, Location::line(9)).unwrap();
        let table = map.copy_relative_to(5);
        assert_eq!(table.get("base"), Some(&64));
        assert_eq!(table.get("2f"), Some(&0x80));
        assert_eq!(table.get("2b"), Some(&0x40));
    }

    #[test]
    fn address_symbols_excludes_constants() {
        let mut map = SymbolMap::new();
        map.add_absolute("start", 0x1000, Location::line(1), SymbolType::Address)
            .unwrap();
        map.add_absolute("N", 8, Location::line(2), SymbolType::Constant)
            .unwrap();
        let addrs: Vec<_> = map.address_symbols().collect();
        assert_eq!(addrs, vec![("start", 0x1000)]);
    }

    #[test]
    fn relative_labels_defined_twice_on_the_same_line_are_an_error() {
        let mut map = SymbolMap::new();
        map.add_relative(1, 0x10, Location::line(1)).unwrap();
        let err = map.add_relative(1, 0x20, Location::line(1)).unwrap_err();
        assert_eq!(err.kind, SymbolErrorKind::RelativeRedefined(1));
    }
}
