//! Source-location and token types shared across the workspace.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A 64-bit memory address, as used for section base addresses and program
/// counters.
pub type AInt = u64;

/// A 64-bit register/immediate value.
pub type VInt = u64;

/// A one-based source line index, or the "unknown" sentinel used for lines
/// synthesized during pseudo-instruction expansion.
///
/// This mirrors `Location`/`Location::unknown()` in the original assembler:
/// diagnostics attached to synthetic lines still need *some* location to
/// report, so callers that have no real source line to point at use
/// [`Location::unknown`] rather than an `Option<Location>` at every call
/// site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location(Option<u32>);

impl Location {
    /// Constructs a location pointing at a concrete, one-based source line.
    #[must_use]
    pub const fn line(source_line: u32) -> Self {
        Self(Some(source_line))
    }

    /// Constructs the "unknown" sentinel location, used for synthetic lines
    /// that do not correspond 1:1 to a line the user wrote.
    #[must_use]
    pub const fn unknown() -> Self {
        Self(None)
    }

    /// Returns the one-based source line, if this location is not the
    /// unknown sentinel.
    #[must_use]
    pub const fn source_line(&self) -> Option<u32> {
        self.0
    }

    /// Returns `true` if this location refers to a real source line.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.0.is_some()
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(line) => write!(f, "{line}"),
            None => write!(f, "<unknown>"),
        }
    }
}

/// A single assembly-source token, carrying the optional relocation tag
/// recognized during tokenization (e.g. `%hi(...)`/`%lo(...)`-style
/// annotations some ISAs attach to symbol references).
///
/// The relocation tag is preserved verbatim from tokenization through to
/// assembly so that a [`crate::expr::evaluate`]d symbol value can be
/// transformed according to it before being scattered into an instruction
/// word.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    text: String,
    relocation: Option<String>,
}

impl Token {
    /// Creates a token with no relocation tag.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            relocation: None,
        }
    }

    /// Creates a token carrying an explicit relocation tag.
    #[must_use]
    pub fn with_relocation(text: impl Into<String>, relocation: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            relocation: Some(relocation.into()),
        }
    }

    /// The token's text, with any relocation syntax already stripped.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The relocation tag attached to this token, if any.
    #[must_use]
    pub fn relocation(&self) -> Option<&str> {
        self.relocation.as_deref()
    }

    /// Returns `true` if a relocation tag is attached.
    #[must_use]
    pub fn has_relocation(&self) -> bool {
        self.relocation.is_some()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// An error tied to the source [`Location`] that produced it.
///
/// Every fallible operation in this workspace returns a sum of `(value |
/// Error{location, message})` per spec.md §9 ("errors are data, not
/// exceptions"); `Located<E>` is the common shape for that pairing so each
/// crate's error enum only needs to describe *what* went wrong, not *where*.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {location}: {kind}")]
pub struct Located<E>
where
    E: std::fmt::Display + std::fmt::Debug + Clone + PartialEq + Eq,
{
    /// Where the error occurred.
    pub location: Location,
    /// What went wrong.
    pub kind: E,
}

impl<E> Located<E>
where
    E: std::fmt::Display + std::fmt::Debug + Clone + PartialEq + Eq,
{
    /// Pairs an error kind with the location that produced it.
    pub fn new(location: Location, kind: E) -> Self {
        Self { location, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_has_no_line() {
        let loc = Location::unknown();
        assert!(!loc.is_known());
        assert_eq!(loc.source_line(), None);
    }

    #[test]
    fn known_location_round_trips() {
        let loc = Location::line(42);
        assert!(loc.is_known());
        assert_eq!(loc.source_line(), Some(42));
    }

    #[test]
    fn token_without_relocation() {
        let tok = Token::new("addi");
        assert_eq!(tok.text(), "addi");
        assert!(!tok.has_relocation());
    }

    #[test]
    fn token_with_relocation_preserves_both() {
        let tok = Token::with_relocation("symbol", "hi");
        assert_eq!(tok.text(), "symbol");
        assert_eq!(tok.relocation(), Some("hi"));
    }
}
