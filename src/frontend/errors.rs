use itertools::Itertools;
use thiserror::Error;

use super::{lexical_unit::LexicalUnit, parse_tree::NonTerminal, symbol::SourceLine};

/// Errors raised while decoding the scanner's output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenStreamError {
    #[error("unknown lexical unit `{kind}` on token stream line {line_number}")]
    UnknownLexicalUnit { kind: String, line_number: usize },

    #[error("malformed token on token stream line {line_number}: `{content}`")]
    Malformed { line_number: usize, content: String },
}

/// A syntax error. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Expected {expected} but found {found} `{value}` at line {line}")]
    UnexpectedToken {
        expected: LexicalUnit,
        found: LexicalUnit,
        value: String,
        line: SourceLine,
    },

    #[error(
        "Unexpected {found} `{value}` in <{rule}> at line {line}, expected one of: {}",
        .expected.iter().join(", ")
    )]
    NoProduction {
        rule: NonTerminal,
        expected: Vec<LexicalUnit>,
        found: LexicalUnit,
        value: String,
        line: SourceLine,
    },
}

impl ParseError {
    pub fn found(&self) -> LexicalUnit {
        match self {
            ParseError::UnexpectedToken { found, .. } | ParseError::NoProduction { found, .. } => {
                *found
            }
        }
    }

    pub fn line(&self) -> SourceLine {
        match self {
            ParseError::UnexpectedToken { line, .. } | ParseError::NoProduction { line, .. } => {
                *line
            }
        }
    }
}
