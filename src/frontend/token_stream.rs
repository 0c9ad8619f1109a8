//! Adapter over the scanner's textual output. One token per line:
//!
//! ```text
//! line: 3 token: x        lexical unit: VARNAME
//! token: :=       lexical unit: ASSIGN
//! ```
//!
//! The `line:` prefix is optional.

use std::path::Path;

use itertools::Itertools;
use tracing::{trace, warn};

use super::{
    errors::TokenStreamError,
    lexical_unit::LexicalUnit,
    symbol::{SourceLine, Symbol},
};
use crate::CompileError;

const LINE_PREFIX: &str = "line:";
const TOKEN_PREFIX: &str = "token:";
const UNIT_PREFIX: &str = "lexical unit:";

/// What to do with a token whose lexical unit this grammar does not know
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownUnitPolicy {
    /// Fail the decode
    #[default]
    Reject,
    /// Drop the token and report it as a warning
    Skip,
}

/// The ordered symbol sequence consumed by the parser
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TokenStream {
    symbols: Vec<Symbol>,
}

impl TokenStream {
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self { symbols }
    }

    pub fn read(path: &Path, policy: UnknownUnitPolicy) -> Result<Self, CompileError> {
        let contents = std::fs::read_to_string(path)?;

        Ok(Self::decode(&contents, policy)?)
    }

    pub fn decode(text: &str, policy: UnknownUnitPolicy) -> Result<Self, TokenStreamError> {
        let mut symbols = Vec::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;

            if raw_line.trim().is_empty() {
                continue;
            }

            let Some((kind, value, line)) = split_token_line(raw_line) else {
                return Err(TokenStreamError::Malformed {
                    line_number,
                    content: raw_line.to_owned(),
                });
            };

            match kind.parse::<LexicalUnit>() {
                Ok(kind) => {
                    trace!(%kind, value, "decoded token");
                    symbols.push(Symbol::new(kind, value, line));
                }
                Err(_) => match policy {
                    UnknownUnitPolicy::Reject => {
                        return Err(TokenStreamError::UnknownLexicalUnit {
                            kind: kind.to_owned(),
                            line_number,
                        });
                    }
                    UnknownUnitPolicy::Skip => {
                        warn!(kind, value, line_number, "skipping unknown lexical unit");
                    }
                },
            }
        }

        Ok(Self { symbols })
    }

    /// Renders the stream back into the scanner's line format
    pub fn encode(&self) -> String {
        self.symbols
            .iter()
            .map(|symbol| {
                let prefix = match symbol.line.0 {
                    Some(line) => format!("{LINE_PREFIX} {line} "),
                    None => String::new(),
                };

                format!(
                    "{prefix}{TOKEN_PREFIX} {:<8}\t{UNIT_PREFIX} {}",
                    symbol.value, symbol.kind
                )
            })
            .join("\n")
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Splits a line into (kind, raw text, source line)
fn split_token_line(raw_line: &str) -> Option<(&str, &str, SourceLine)> {
    let mut rest = raw_line.trim();
    let mut line = SourceLine::UNKNOWN;

    if let Some(after) = rest.strip_prefix(LINE_PREFIX) {
        let after = after.trim_start();
        let digits = after
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after.len());

        line = SourceLine::known(after[..digits].parse().ok()?);
        rest = after[digits..].trim_start();
    }

    let rest = rest.strip_prefix(TOKEN_PREFIX)?;

    // The raw text may itself contain the unit marker, so split on the last one
    let unit_position = rest.rfind(UNIT_PREFIX)?;
    let value = rest[..unit_position].trim();
    let kind = rest[unit_position + UNIT_PREFIX.len()..]
        .split_whitespace()
        .next()?;

    Some((kind, value, line))
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn decodes_lines_with_and_without_positions() {
        let stream = TokenStream::decode(
            indoc! {"
                line: 1 token: Prog\tlexical unit: PROG
                token: Euclid\tlexical unit: PROGNAME

                line: 2 token: :=\tlexical unit: ASSIGN
            "},
            UnknownUnitPolicy::Reject,
        )
        .unwrap();

        assert_eq!(
            stream.symbols(),
            &[
                Symbol::new(LexicalUnit::Prog, "Prog", SourceLine::known(1)),
                Symbol::new(LexicalUnit::ProgName, "Euclid", SourceLine::UNKNOWN),
                Symbol::new(LexicalUnit::Assign, ":=", SourceLine::known(2)),
            ]
        );
    }

    #[test]
    fn unknown_units_are_fatal_by_default() {
        let error = TokenStream::decode(
            "token: x\tlexical unit: VARNAME\ntoken: ,\tlexical unit: COMMA",
            UnknownUnitPolicy::default(),
        )
        .unwrap_err();

        assert_eq!(
            error,
            TokenStreamError::UnknownLexicalUnit {
                kind: "COMMA".into(),
                line_number: 2
            }
        );
    }

    #[test]
    fn lenient_policy_drops_unknown_units() {
        let stream = TokenStream::decode(
            "token: ,\tlexical unit: COMMA\ntoken: x\tlexical unit: VARNAME",
            UnknownUnitPolicy::Skip,
        )
        .unwrap();

        assert_eq!(stream.len(), 1);
        assert_eq!(stream.symbols()[0].kind, LexicalUnit::VarName);
    }

    #[test]
    fn blank_lines_carry_no_tokens() {
        let stream = TokenStream::decode("\n   \n\t\n", UnknownUnitPolicy::Reject).unwrap();

        assert!(stream.is_empty());
        assert!(stream.into_symbols().is_empty());

        let stream = TokenStream::decode("token: End lexical unit: END", UnknownUnitPolicy::Reject)
            .unwrap();

        assert!(!stream.is_empty());
        assert_eq!(
            stream.into_symbols(),
            [Symbol::new(LexicalUnit::End, "End", SourceLine::UNKNOWN)]
        );
    }

    #[test]
    fn rejects_lines_without_markers() {
        let error = TokenStream::decode("Prog PROG", UnknownUnitPolicy::Reject).unwrap_err();

        assert!(matches!(error, TokenStreamError::Malformed { line_number: 1, .. }));
    }

    #[test]
    fn encode_is_accepted_by_decode() {
        let stream = TokenStream::new(vec![
            Symbol::new(LexicalUnit::Print, "Print", SourceLine::known(7)),
            Symbol::new(LexicalUnit::LParen, "(", SourceLine::UNKNOWN),
        ]);

        let decoded = TokenStream::decode(&stream.encode(), UnknownUnitPolicy::Reject).unwrap();

        assert_eq!(decoded, stream);
    }
}
