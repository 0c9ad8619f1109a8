use strum::{Display, EnumString};

/// The closed set of terminal kinds produced by the scanner. The textual form
/// (`VARNAME`, `SMALEQ`, ...) is the one written in the scanner's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LexicalUnit {
    /* Keywords */
    Prog,  // Prog
    Is,    // Is
    End,   // End
    If,    // If
    Then,  // Then
    Else,  // Else
    While, // While
    Do,    // Do
    Print, // Print
    Input, // Input

    /* Punctuation */
    Semi,    // ;
    Assign,  // :=
    LParen,  // (
    RParen,  // )
    LBrack,  // [
    RBrack,  // ]
    Pipe,    // |
    Implies, // ->

    /* Operators */
    Plus,    // +
    Minus,   // -
    Times,   // *
    Divide,  // /
    Equal,   // ==
    SmalEq,  // <=
    Smaller, // <

    /* Literals */
    VarName,  // x
    Number,   // 42
    ProgName, // Euclid

    /// End of stream
    Eos,
}

impl LexicalUnit {
    /// Tokens that may start an `<Instruction>`
    pub const INSTRUCTION_START: &'static [LexicalUnit] = &[
        LexicalUnit::VarName,
        LexicalUnit::If,
        LexicalUnit::While,
        LexicalUnit::Print,
        LexicalUnit::Input,
    ];

    /// Tokens that close a `<Code>` block
    pub const CODE_FOLLOW: &'static [LexicalUnit] = &[LexicalUnit::End, LexicalUnit::Else];

    /// Tokens that may follow an arithmetic expression
    pub const EXPRESSION_FOLLOW: &'static [LexicalUnit] = &[
        LexicalUnit::Semi,
        LexicalUnit::Equal,
        LexicalUnit::SmalEq,
        LexicalUnit::Smaller,
        LexicalUnit::Implies,
        LexicalUnit::Pipe,
        LexicalUnit::RParen,
        LexicalUnit::RBrack,
    ];

    pub fn is_term_operator(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }

    pub fn is_factor_operator(&self) -> bool {
        matches!(self, Self::Times | Self::Divide)
    }

    pub fn is_comparison_operator(&self) -> bool {
        matches!(self, Self::Equal | Self::SmalEq | Self::Smaller)
    }

    /// `<Prod'>` also closes before a term operator
    pub fn follows_product(&self) -> bool {
        self.is_term_operator() || Self::EXPRESSION_FOLLOW.contains(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanner_spelling_round_trips() {
        assert_eq!("SMALEQ".parse::<LexicalUnit>(), Ok(LexicalUnit::SmalEq));
        assert_eq!("VARNAME".parse::<LexicalUnit>(), Ok(LexicalUnit::VarName));
        assert_eq!(LexicalUnit::ProgName.to_string(), "PROGNAME");
        assert_eq!(LexicalUnit::LBrack.to_string(), "LBRACK");
        assert!("COMMA".parse::<LexicalUnit>().is_err());
    }

    #[test]
    fn product_follow_includes_term_operators() {
        assert!(LexicalUnit::Plus.follows_product());
        assert!(LexicalUnit::RBrack.follows_product());
        assert!(!LexicalUnit::Times.follows_product());
        assert!(!LexicalUnit::Plus.is_factor_operator());
    }
}
