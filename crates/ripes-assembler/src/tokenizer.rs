//! Line tokenization (spec.md §4.6): a quote-aware split into raw words,
//! then a parenthesis-join pass, then decomposition into a line's defined
//! symbols, directive, and operand tokens with comments stripped.
//!
//! Grounded in the original assembler's `AssemblerTokenizer` (`tokenizer.h`),
//! whose two-stage `tokenize`/`joinParentheses` pipeline this follows
//! directly; `splitSymbolsFromLine`/`splitCommentFromLine` become
//! [`decompose`] here.

use ripes_support::{Location, Token};

use crate::errors::{AssemblerError, AssemblerErrorKind};

/// The default line-comment delimiter: everything from a bare `#` to the
/// end of the line is discarded before a line's symbols/directive/operands
/// are split out.
pub const DEFAULT_COMMENT_CHAR: char = '#';

fn err(location: Location, kind: AssemblerErrorKind) -> AssemblerError {
    AssemblerError::new(location, kind)
}

/// Stage 1: splits `line` on whitespace/comma outside double quotes,
/// preserving quoted spans (including escaped `\"`) as single tokens with
/// their surrounding quotes intact — [`unquote`] strips them later, once a
/// consumer (the `.string`/`.asciz` directive) actually needs the content.
fn quote_aware_split(line: &str, location: Location) -> Result<Vec<String>, AssemblerError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    let mut has_current = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            current.push(c);
            has_current = true;
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                }
                '"' => {
                    in_quotes = false;
                }
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                current.push(c);
                has_current = true;
            }
            ' ' | '\t' | ',' => {
                if has_current {
                    tokens.push(std::mem::take(&mut current));
                    has_current = false;
                }
            }
            _ => {
                current.push(c);
                has_current = true;
            }
        }
    }
    if in_quotes {
        return Err(err(location, AssemblerErrorKind::MissingTerminatingQuote));
    }
    if has_current {
        tokens.push(current);
    }
    Ok(tokens)
}

fn is_quoted(text: &str) -> bool {
    text.starts_with('"')
}

/// Stage 2: merges runs of tokens that open a `(`/`[` but do not close it
/// within the same raw token, so that e.g. `offset(a0)` — split by stage 1
/// only if it contained internal whitespace — and `-4(sp)` both survive as
/// one token when they were written with embedded spaces (`- 4 ( sp )`
/// would not be reassembled; that case is not in scope, matching
/// `joinParentheses`'s own "same bracket kind" restriction). Quoted tokens
/// are passed through untouched.
fn paren_join(tokens: Vec<String>, location: Location) -> Result<Vec<Token>, AssemblerError> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if is_quoted(tok) {
            out.push(Token::new(tok.clone()));
            i += 1;
            continue;
        }
        let (open, close) = if tok.contains('(') && !tok.contains(')') {
            ('(', ')')
        } else if tok.contains('[') && !tok.contains(']') {
            ('[', ']')
        } else {
            out.push(Token::new(tok.clone()));
            i += 1;
            continue;
        };
        let mut joined = tok.clone();
        let mut j = i + 1;
        let mut closed = false;
        while j < tokens.len() {
            joined.push(' ');
            joined.push_str(&tokens[j]);
            if tokens[j].contains(close) {
                closed = true;
                j += 1;
                break;
            }
            j += 1;
        }
        if !closed {
            return Err(err(location, AssemblerErrorKind::UnmatchedParenthesis));
        }
        out.push(Token::new(joined.replace(' ', "")));
        i = j;
    }
    // A token containing only a stray closing bracket (no opener seen)
    // would have fallen through unflagged above; check for it explicitly.
    for t in &out {
        let text = t.text();
        if !is_quoted(text) {
            let opens = text.matches('(').count() + text.matches('[').count();
            let closes = text.matches(')').count() + text.matches(']').count();
            if closes > opens {
                return Err(err(location, AssemblerErrorKind::UnmatchedParenthesis));
            }
        }
    }
    Ok(out)
}

/// Runs both tokenization stages over one source line.
pub fn tokenize(line: &str, location: Location) -> Result<Vec<Token>, AssemblerError> {
    let raw = quote_aware_split(line, location)?;
    paren_join(raw, location)
}

/// Removes the surrounding double quotes and resolves the one supported
/// escape (`\n`) from a quoted token's text, per spec.md §4.7's `.string`/
/// `.asciz` directive.
#[must_use]
pub fn unquote(text: &str) -> String {
    let inner = text.strip_prefix('"').unwrap_or(text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

const OPERATOR_CHARS: &[char] = &['+', '-', '*', '/', '%', '&', '|', '(', ')', '[', ']'];

fn is_valid_symbol_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| OPERATOR_CHARS.contains(&c))
}

/// The result of decomposing one tokenized line into its defined symbols,
/// at most one directive, and the remaining operand/mnemonic tokens (with
/// the comment, if any, already stripped).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecomposedLine {
    /// Symbol names this line defines (from tokens ending in `:`), in the
    /// order they appeared.
    pub symbols: Vec<String>,
    /// The line's directive token (text includes the leading `.`), if any.
    pub directive: Option<Token>,
    /// Every remaining token: for an instruction line, the mnemonic
    /// followed by its operands; for a directive line, just its operands.
    pub rest: Vec<Token>,
}

/// Strips everything from (and including) the first token that begins with
/// `comment_char`.
fn strip_comment(tokens: Vec<Token>, comment_char: char) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if !is_quoted(tok.text()) && tok.text().starts_with(comment_char) {
            break;
        }
        out.push(tok);
    }
    out
}

/// Splits `tokens` into defined symbols, an optional directive, and the
/// remaining tokens, per spec.md §4.6's post-tokenization decomposition.
pub fn decompose(
    tokens: Vec<Token>,
    comment_char: char,
    location: Location,
) -> Result<DecomposedLine, AssemblerError> {
    let tokens = strip_comment(tokens, comment_char);

    let mut symbols = Vec::new();
    let mut idx = 0;
    while idx < tokens.len() {
        let text = tokens[idx].text();
        if is_quoted(text) || !text.ends_with(':') {
            break;
        }
        let name = &text[..text.len() - 1];
        if name.is_empty() {
            return Err(err(location, AssemblerErrorKind::StrayColon));
        }
        if !is_valid_symbol_name(name) {
            return Err(err(
                location,
                AssemblerErrorKind::InvalidSymbol(name.to_string()),
            ));
        }
        symbols.push(name.to_string());
        idx += 1;
    }

    let mut directive = None;
    let mut rest = Vec::new();
    for tok in &tokens[idx..] {
        let text = tok.text();
        if !is_quoted(text) && text.starts_with('.') {
            if text.len() == 1 {
                return Err(err(location, AssemblerErrorKind::StrayDot));
            }
            if directive.is_some() {
                return Err(err(location, AssemblerErrorKind::IllegalMultipleDirectives));
            }
            directive = Some(tok.clone());
        } else {
            rest.push(tok.clone());
        }
    }

    Ok(DecomposedLine {
        symbols,
        directive,
        rest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Location {
        Location::line(1)
    }

    fn tok_texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(Token::text).collect()
    }

    #[test]
    fn splits_on_space_tab_and_comma() {
        let tokens = tokenize("addi a0, a1,\ta2", loc()).unwrap();
        assert_eq!(tok_texts(&tokens), vec!["addi", "a0", "a1", "a2"]);
    }

    #[test]
    fn preserves_quoted_whitespace_and_commas() {
        let tokens = tokenize(r#".string "hi, there""#, loc()).unwrap();
        assert_eq!(tok_texts(&tokens), vec![".string", r#""hi, there""#]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = tokenize(r#".string "unterminated"#, loc()).unwrap_err();
        assert_eq!(err.kind, AssemblerErrorKind::MissingTerminatingQuote);
    }

    #[test]
    fn joins_parenthesized_offset_base_form() {
        let tokens = tokenize("lw a0, -4 ( sp )", loc()).unwrap();
        assert_eq!(tok_texts(&tokens), vec!["lw", "a0", "-4(sp)"]);
    }

    #[test]
    fn unquote_resolves_newline_escape() {
        assert_eq!(unquote(r#""line1\nline2""#), "line1\nline2");
    }

    #[test]
    fn decompose_splits_label_directive_and_operands() {
        let tokens = tokenize("A: .word 1, 2, 3", loc()).unwrap();
        let d = decompose(tokens, DEFAULT_COMMENT_CHAR, loc()).unwrap();
        assert_eq!(d.symbols, vec!["A".to_string()]);
        assert_eq!(d.directive.unwrap().text(), ".word");
        assert_eq!(tok_texts(&d.rest), vec!["1", "2", "3"]);
    }

    #[test]
    fn decompose_strips_trailing_comment() {
        let tokens = tokenize("addi a0, a0, 1 # increment", loc()).unwrap();
        let d = decompose(tokens, DEFAULT_COMMENT_CHAR, loc()).unwrap();
        assert_eq!(tok_texts(&d.rest), vec!["addi", "a0", "a0", "1"]);
    }

    #[test]
    fn decompose_rejects_second_directive_token() {
        let tokens = tokenize(".word .byte", loc()).unwrap();
        let err = decompose(tokens, DEFAULT_COMMENT_CHAR, loc()).unwrap_err();
        assert_eq!(err.kind, AssemblerErrorKind::IllegalMultipleDirectives);
    }

    #[test]
    fn decompose_rejects_invalid_symbol_name() {
        let tokens = tokenize("1+2: nop", loc()).unwrap();
        let err = decompose(tokens, DEFAULT_COMMENT_CHAR, loc()).unwrap_err();
        assert!(matches!(err.kind, AssemblerErrorKind::InvalidSymbol(_)));
    }

    #[test]
    fn multiple_symbols_on_one_line_are_all_collected() {
        let tokens = tokenize("A: B: nop", loc()).unwrap();
        let d = decompose(tokens, DEFAULT_COMMENT_CHAR, loc()).unwrap();
        assert_eq!(d.symbols, vec!["A".to_string(), "B".to_string()]);
    }
}
