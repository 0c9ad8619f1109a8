use super::lexical_unit::LexicalUnit;

/// A terminal occurrence read from the token stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub kind: LexicalUnit,
    /// Raw text of the token (identifier name, numeral, keyword spelling)
    pub value: String,
    pub line: SourceLine,
}

impl Symbol {
    pub fn new(kind: LexicalUnit, value: impl Into<String>, line: SourceLine) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
        }
    }

    /// Two symbols are interchangeable for the grammar when their kinds match
    pub fn is(&self, kind: LexicalUnit) -> bool {
        self.kind == kind
    }
}

/// Line in the yaLcc source program, when the scanner recorded one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLine(pub Option<usize>);

impl SourceLine {
    pub const UNKNOWN: Self = Self(None);

    pub fn known(line: usize) -> Self {
        Self(Some(line))
    }
}

impl core::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(line) => write!(f, "{line}"),
            None => f.write_str("unknown"),
        }
    }
}
