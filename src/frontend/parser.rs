use tracing::trace;

use super::{
    errors::ParseError,
    lexical_unit::LexicalUnit,
    parse_tree::{NonTerminal, ParseTree},
    symbol::{SourceLine, Symbol},
};

/// LL(1) recursive descent parser. One method per grammar variable, each
/// deciding its production from a single token of lookahead.
#[derive(Debug)]
pub struct Parser<'tokens> {
    tokens: &'tokens [Symbol],
    position: usize,
}

impl<'tokens> Parser<'tokens> {
    pub fn new(tokens: &'tokens [Symbol]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parses a whole program and requires the stream to end right after it
    pub fn parse_program(tokens: &'tokens [Symbol]) -> Result<ParseTree, ParseError> {
        Self::new(tokens).start_parsing()
    }

    pub fn start_parsing(mut self) -> Result<ParseTree, ParseError> {
        let program = self.parse_program_rule()?;

        if self.peek() != LexicalUnit::Eos {
            return Err(self.unexpected(LexicalUnit::Eos));
        }

        // An explicit end marker must be the last token
        if self.current().is_some() {
            self.position += 1;

            if self.position < self.tokens.len() {
                return Err(self.unexpected(LexicalUnit::Eos));
            }
        }

        Ok(program)
    }

    /// Kind of the token under the cursor, `Eos` past the end
    fn peek(&self) -> LexicalUnit {
        self.current().map(|symbol| symbol.kind).unwrap_or(LexicalUnit::Eos)
    }

    fn current(&self) -> Option<&'tokens Symbol> {
        self.tokens.get(self.position)
    }

    /// Best known source line for the token under the cursor
    fn current_line(&self) -> SourceLine {
        match self.current() {
            Some(symbol) if symbol.line.0.is_some() => symbol.line,
            // Past the end (or on an unpositioned token) fall back to the last
            // token that recorded a line
            _ => self.tokens[..self.position.min(self.tokens.len())]
                .iter()
                .rev()
                .map(|symbol| symbol.line)
                .find(|line| line.0.is_some())
                .unwrap_or(SourceLine::UNKNOWN),
        }
    }

    fn current_value(&self) -> String {
        self.current()
            .map(|symbol| symbol.value.clone())
            .unwrap_or_default()
    }

    fn expect(&mut self, kind: LexicalUnit) -> Result<ParseTree, ParseError> {
        if self.peek() != kind {
            return Err(self.unexpected(kind));
        }

        // `peek` only reports `Eos` past the end, so a match has a token
        let Some(symbol) = self.current().cloned() else {
            return Err(self.unexpected(kind));
        };

        trace!(%kind, value = symbol.value.as_str(), "matched");

        self.position += 1;

        Ok(ParseTree::leaf(symbol))
    }

    fn unexpected(&self, expected: LexicalUnit) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            found: self.peek(),
            value: self.current_value(),
            line: self.current_line(),
        }
    }

    fn no_production(&self, rule: NonTerminal, expected: &[LexicalUnit]) -> ParseError {
        ParseError::NoProduction {
            rule,
            expected: expected.to_vec(),
            found: self.peek(),
            value: self.current_value(),
            line: self.current_line(),
        }
    }

    /// Prog [ProgName] Is <Code> End
    fn parse_program_rule(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Program>");

        let prog = self.expect(LexicalUnit::Prog)?;
        let name = self.expect(LexicalUnit::ProgName)?;
        let is = self.expect(LexicalUnit::Is)?;
        let code = self.parse_code()?;
        let end = self.expect(LexicalUnit::End)?;

        Ok(ParseTree::node(
            NonTerminal::Program,
            vec![prog, name, is, code, end],
        ))
    }

    /// <Instruction> ; <Code>
    ///     | ε
    fn parse_code(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Code>");

        let mut statements = Vec::new();

        while LexicalUnit::INSTRUCTION_START.contains(&self.peek()) {
            let instruction = self.parse_instruction()?;
            let semi = self.expect(LexicalUnit::Semi)?;

            statements.push((instruction, semi));
        }

        if !LexicalUnit::CODE_FOLLOW.contains(&self.peek()) {
            return Err(self.no_production(
                NonTerminal::Code,
                &[LexicalUnit::INSTRUCTION_START, LexicalUnit::CODE_FOLLOW].concat(),
            ));
        }

        // Statements are collected in a loop and nested right to left, so
        // program length never turns into recursion depth
        let code = statements.into_iter().rev().fold(
            ParseTree::epsilon(NonTerminal::Code),
            |rest, (instruction, semi)| {
                ParseTree::node(NonTerminal::Code, vec![instruction, semi, rest])
            },
        );

        Ok(code)
    }

    fn parse_instruction(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Instruction>");

        let instruction = match self.peek() {
            LexicalUnit::VarName => self.parse_assign()?,
            LexicalUnit::If => self.parse_if()?,
            LexicalUnit::While => self.parse_while()?,
            LexicalUnit::Print => self.parse_output()?,
            LexicalUnit::Input => self.parse_input()?,
            _ => {
                return Err(
                    self.no_production(NonTerminal::Instruction, LexicalUnit::INSTRUCTION_START)
                );
            }
        };

        Ok(ParseTree::node(NonTerminal::Instruction, vec![instruction]))
    }

    /// [VarName] := <ExprArith>
    fn parse_assign(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Assign>");

        let name = self.expect(LexicalUnit::VarName)?;
        let assign = self.expect(LexicalUnit::Assign)?;
        let expression = self.parse_expr_arith()?;

        Ok(ParseTree::node(
            NonTerminal::Assign,
            vec![name, assign, expression],
        ))
    }

    /// expr_arith       -> prod expr_arith'
    /// expr_arith'      -> ( "+" | "-" ) prod expr_arith' | ε
    /// prod             -> atom prod'
    /// prod'            -> ( "*" | "/" ) atom | ε
    /// atom             -> VARNAME | NUMBER | "-" atom | "(" expr_arith ")"
    fn parse_expr_arith(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <ExprArith>");

        let prod = self.parse_prod()?;
        let rest = self.parse_expr_arith_prime()?;

        Ok(ParseTree::node(NonTerminal::ExprArith, vec![prod, rest]))
    }

    fn parse_expr_arith_prime(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <ExprArith'>");

        let peeked = self.peek();

        if peeked.is_term_operator() {
            let operator = self.expect(peeked)?;
            let prod = self.parse_prod()?;
            let rest = self.parse_expr_arith_prime()?;

            return Ok(ParseTree::node(
                NonTerminal::ExprArithPrime,
                vec![operator, prod, rest],
            ));
        }

        if LexicalUnit::EXPRESSION_FOLLOW.contains(&peeked) {
            return Ok(ParseTree::epsilon(NonTerminal::ExprArithPrime));
        }

        Err(self.no_production(
            NonTerminal::ExprArithPrime,
            &[
                &[LexicalUnit::Plus, LexicalUnit::Minus][..],
                LexicalUnit::EXPRESSION_FOLLOW,
            ]
            .concat(),
        ))
    }

    fn parse_prod(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Prod>");

        let atom = self.parse_atom()?;
        let rest = self.parse_prod_prime()?;

        Ok(ParseTree::node(NonTerminal::Prod, vec![atom, rest]))
    }

    // A factor operator takes a single atom: `a * b * c` is rejected by the
    // grammar while `a + b + c` is accepted.
    fn parse_prod_prime(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Prod'>");

        let peeked = self.peek();

        if peeked.is_factor_operator() {
            let operator = self.expect(peeked)?;
            let atom = self.parse_atom()?;

            return Ok(ParseTree::node(
                NonTerminal::ProdPrime,
                vec![operator, atom],
            ));
        }

        if peeked.follows_product() {
            return Ok(ParseTree::epsilon(NonTerminal::ProdPrime));
        }

        Err(self.no_production(
            NonTerminal::ProdPrime,
            &[
                &[
                    LexicalUnit::Times,
                    LexicalUnit::Divide,
                    LexicalUnit::Plus,
                    LexicalUnit::Minus,
                ][..],
                LexicalUnit::EXPRESSION_FOLLOW,
            ]
            .concat(),
        ))
    }

    fn parse_atom(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Atom>");

        let children = match self.peek() {
            LexicalUnit::VarName => vec![self.expect(LexicalUnit::VarName)?],
            LexicalUnit::Number => vec![self.expect(LexicalUnit::Number)?],
            LexicalUnit::Minus => {
                let minus = self.expect(LexicalUnit::Minus)?;
                let atom = self.parse_atom()?;

                vec![minus, atom]
            }
            LexicalUnit::LParen => {
                let open_paren = self.expect(LexicalUnit::LParen)?;
                let expression = self.parse_expr_arith()?;
                let close_paren = self.expect(LexicalUnit::RParen)?;

                vec![open_paren, expression, close_paren]
            }
            _ => {
                return Err(self.no_production(
                    NonTerminal::Atom,
                    &[
                        LexicalUnit::VarName,
                        LexicalUnit::Number,
                        LexicalUnit::Minus,
                        LexicalUnit::LParen,
                    ],
                ));
            }
        };

        Ok(ParseTree::node(NonTerminal::Atom, children))
    }

    /// If [ <Cond> ] Then <Code> <C>
    fn parse_if(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <If>");

        let if_keyword = self.expect(LexicalUnit::If)?;
        let open_bracket = self.expect(LexicalUnit::LBrack)?;
        let condition = self.parse_cond()?;
        let close_bracket = self.expect(LexicalUnit::RBrack)?;
        let then_keyword = self.expect(LexicalUnit::Then)?;
        let positive = self.parse_code()?;
        let tail = self.parse_if_tail()?;

        Ok(ParseTree::node(
            NonTerminal::If,
            vec![
                if_keyword,
                open_bracket,
                condition,
                close_bracket,
                then_keyword,
                positive,
                tail,
            ],
        ))
    }

    /// End | Else <Code> End
    fn parse_if_tail(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <C>");

        let children = match self.peek() {
            LexicalUnit::End => vec![self.expect(LexicalUnit::End)?],
            LexicalUnit::Else => {
                let else_keyword = self.expect(LexicalUnit::Else)?;
                let negative = self.parse_code()?;
                let end = self.expect(LexicalUnit::End)?;

                vec![else_keyword, negative, end]
            }
            _ => {
                return Err(
                    self.no_production(NonTerminal::C, &[LexicalUnit::End, LexicalUnit::Else])
                );
            }
        };

        Ok(ParseTree::node(NonTerminal::C, children))
    }

    /// While [ <Cond> ] Do <Code> End
    fn parse_while(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <While>");

        let while_keyword = self.expect(LexicalUnit::While)?;
        let open_bracket = self.expect(LexicalUnit::LBrack)?;
        let condition = self.parse_cond()?;
        let close_bracket = self.expect(LexicalUnit::RBrack)?;
        let do_keyword = self.expect(LexicalUnit::Do)?;
        let body = self.parse_code()?;
        let end = self.expect(LexicalUnit::End)?;

        Ok(ParseTree::node(
            NonTerminal::While,
            vec![
                while_keyword,
                open_bracket,
                condition,
                close_bracket,
                do_keyword,
                body,
                end,
            ],
        ))
    }

    fn parse_cond(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Cond>");

        let condition = self.parse_cond_a()?;

        Ok(ParseTree::node(NonTerminal::Cond, vec![condition]))
    }

    /// | <Cond> |  (negation)
    ///     | <ExprArith> <D>
    fn parse_cond_a(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <CondA>");

        if self.peek() == LexicalUnit::Pipe {
            let open_pipe = self.expect(LexicalUnit::Pipe)?;
            let condition = self.parse_cond()?;
            let close_pipe = self.expect(LexicalUnit::Pipe)?;

            return Ok(ParseTree::node(
                NonTerminal::CondA,
                vec![open_pipe, condition, close_pipe],
            ));
        }

        let lhs = self.parse_expr_arith()?;
        let comparison = self.parse_comparison()?;

        Ok(ParseTree::node(NonTerminal::CondA, vec![lhs, comparison]))
    }

    /// ( == | <= | < ) <ExprArith>
    fn parse_comparison(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <D>");

        let peeked = self.peek();

        if !peeked.is_comparison_operator() {
            return Err(self.no_production(
                NonTerminal::D,
                &[LexicalUnit::Equal, LexicalUnit::SmalEq, LexicalUnit::Smaller],
            ));
        }

        let operator = self.expect(peeked)?;
        let rhs = self.parse_expr_arith()?;

        Ok(ParseTree::node(NonTerminal::D, vec![operator, rhs]))
    }

    /// Print ( [VarName] )
    fn parse_output(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Output>");

        let children = self.parse_io_call(LexicalUnit::Print)?;

        Ok(ParseTree::node(NonTerminal::Output, children))
    }

    /// Input ( [VarName] )
    fn parse_input(&mut self) -> Result<ParseTree, ParseError> {
        trace!("parsing <Input>");

        let children = self.parse_io_call(LexicalUnit::Input)?;

        Ok(ParseTree::node(NonTerminal::Input, children))
    }

    fn parse_io_call(&mut self, keyword: LexicalUnit) -> Result<Vec<ParseTree>, ParseError> {
        Ok(vec![
            self.expect(keyword)?,
            self.expect(LexicalUnit::LParen)?,
            self.expect(LexicalUnit::VarName)?,
            self.expect(LexicalUnit::RParen)?,
        ])
    }
}
