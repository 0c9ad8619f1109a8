//! Lowering of the parse tree to IR.
//!
//! The tree is walked once in grammar order. Expressions are evaluated
//! children first and leave their result in a fresh register (or a literal
//! operand); control structures allocate their labels up front and emit the
//! block scaffolding around their bodies.

use tracing::debug;

use super::{
    errors::InvariantViolation,
    ir::{
        self, ArithmeticOperator, Comparison, FormatString, Instruction, LabelId, Operand,
        RegisterId, StorageSlot,
    },
    variables::VariableTable,
};
use crate::{
    frontend::{
        lexical_unit::LexicalUnit,
        parse_tree::{NonTerminal, ParseTree},
        symbol::Symbol,
    },
    index::Index,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodegenOptions {
    /// Precede each instruction's code with a `; line N` comment
    pub annotate_source_lines: bool,
}

#[derive(Debug, Default)]
pub struct CodeGenerator {
    options: CodegenOptions,
}

impl CodeGenerator {
    pub fn new(options: CodegenOptions) -> Self {
        Self { options }
    }

    /// Lowers a `<Program>` tree and renders the IR text
    pub fn generate(&self, tree: &ParseTree) -> Result<String, InvariantViolation> {
        Ok(self.lower(tree)?.to_string())
    }

    pub fn lower(&self, tree: &ParseTree) -> Result<ir::Module, InvariantViolation> {
        let mut context = LoweringContext::new(self.options);

        context.lower_program(tree)?;

        Ok(context.into_output())
    }
}

/// Lowers with default options
pub fn generate(tree: &ParseTree) -> Result<String, InvariantViolation> {
    CodeGenerator::default().generate(tree)
}

/// State of one generation run
struct LoweringContext {
    options: CodegenOptions,
    next_register: RegisterId,
    next_label: LabelId,
    variables: VariableTable,
    instructions: Vec<Instruction>,
}

impl LoweringContext {
    fn new(options: CodegenOptions) -> Self {
        Self {
            options,
            next_register: RegisterId::FIRST,
            next_label: LabelId::ZERO,
            variables: VariableTable::new(),
            instructions: Vec::new(),
        }
    }

    fn create_register(&mut self) -> RegisterId {
        let prev = self.next_register;
        self.next_register.increment_by(1);
        prev
    }

    fn create_label(&mut self) -> LabelId {
        let prev = self.next_label;
        self.next_label.increment_by(1);
        prev
    }

    fn push_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    fn into_output(mut self) -> ir::Module {
        self.push_instruction(Instruction::Return {
            value: Operand::Constant("0".into()),
        });

        ir::Module {
            main: ir::FunctionDefinition {
                symbol_name: "main".into(),
                instructions: self.instructions,
            },
        }
    }

    /// Slot of a variable, allocated on its first reference
    fn variable_slot(&mut self, name: &str) -> StorageSlot {
        if let Some(slot) = self.variables.get(name) {
            return slot;
        }

        let slot = StorageSlot(self.create_register());
        self.push_instruction(Instruction::Alloca { slot });
        self.variables.insert(name, slot);

        debug!(name, slot = %slot.0, "allocated variable");

        slot
    }

    /* Tree shape checks */

    fn children<'tree>(
        tree: &'tree ParseTree,
        rule: NonTerminal,
    ) -> Result<&'tree [ParseTree], InvariantViolation> {
        match tree {
            ParseTree::Node {
                rule: found,
                children,
            } if *found == rule => Ok(children),
            _ => Err(InvariantViolation::UnexpectedNode {
                expected: format!("<{rule}>"),
                found: tree.label().to_string(),
            }),
        }
    }

    fn fixed_children<'tree, const N: usize>(
        tree: &'tree ParseTree,
        rule: NonTerminal,
    ) -> Result<&'tree [ParseTree; N], InvariantViolation> {
        let children = Self::children(tree, rule)?;

        children
            .try_into()
            .map_err(|_| InvariantViolation::UnexpectedArity {
                rule,
                arity: children.len(),
            })
    }

    fn terminal(tree: &ParseTree, kind: LexicalUnit) -> Result<&Symbol, InvariantViolation> {
        match tree.symbol() {
            Some(symbol) if symbol.is(kind) => Ok(symbol),
            _ => Err(InvariantViolation::UnexpectedNode {
                expected: kind.to_string(),
                found: tree.label().to_string(),
            }),
        }
    }

    /* Instructions */

    fn lower_program(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [_, _, _, code, _] = Self::fixed_children(tree, NonTerminal::Program)?;

        self.lower_code(code)
    }

    /// Walks the `<Code>` chain one statement at a time
    fn lower_code(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let mut code = tree;

        while let [instruction, _, rest] = Self::children(code, NonTerminal::Code)? {
            self.lower_instruction(instruction)?;
            code = rest;
        }

        match Self::children(code, NonTerminal::Code)? {
            [] => Ok(()),
            children => Err(InvariantViolation::UnexpectedArity {
                rule: NonTerminal::Code,
                arity: children.len(),
            }),
        }
    }

    fn lower_instruction(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [instruction] = Self::fixed_children(tree, NonTerminal::Instruction)?;

        if self.options.annotate_source_lines {
            if let Some(line) = instruction.first_line() {
                self.push_instruction(Instruction::Comment(format!("line {line}")));
            }
        }

        let Some(rule) = instruction.rule() else {
            return Err(InvariantViolation::UnexpectedNode {
                expected: "an instruction".into(),
                found: instruction.label().to_string(),
            });
        };

        match rule {
            NonTerminal::Assign => self.lower_assign(instruction),
            NonTerminal::If => self.lower_if(instruction),
            NonTerminal::While => self.lower_while(instruction),
            NonTerminal::Output => self.lower_output(instruction),
            NonTerminal::Input => self.lower_input(instruction),
            NonTerminal::Program
            | NonTerminal::Code
            | NonTerminal::Instruction
            | NonTerminal::Call
            | NonTerminal::ExprArith
            | NonTerminal::Prod
            | NonTerminal::ExprArithPrime
            | NonTerminal::ProdPrime
            | NonTerminal::Atom
            | NonTerminal::Cond
            | NonTerminal::C
            | NonTerminal::CondA
            | NonTerminal::CondB
            | NonTerminal::D => Err(InvariantViolation::UnexpectedNode {
                expected: "an instruction".into(),
                found: format!("<{rule}>"),
            }),
        }
    }

    fn lower_assign(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [name, _, expression] = Self::fixed_children(tree, NonTerminal::Assign)?;
        let name = Self::terminal(name, LexicalUnit::VarName)?;

        let slot = self.variable_slot(&name.value);
        let value = self.lower_expr_arith(expression)?;

        self.push_instruction(Instruction::Store { value, slot });

        Ok(())
    }

    // .labelN (then):
    //     ...
    //     br .end
    // .labelN+1 (else):
    //     ...
    //     br .end
    // .labelN+2 (end):
    fn lower_if(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [_, _, condition, _, _, positive, tail] = Self::fixed_children(tree, NonTerminal::If)?;

        let positive_label = self.create_label();
        let negative_label = self.create_label();
        let end_label = self.create_label();

        debug!(%positive_label, %negative_label, %end_label, "lowering if");

        let condition = self.lower_cond(condition)?;
        self.push_instruction(Instruction::Branch {
            condition,
            positive: positive_label,
            negative: negative_label,
        });

        self.push_instruction(Instruction::Label(positive_label));
        self.lower_code(positive)?;
        self.push_instruction(Instruction::Jump {
            destination: end_label,
        });

        // Without an else branch the block is still emitted, empty
        self.push_instruction(Instruction::Label(negative_label));
        match Self::children(tail, NonTerminal::C)? {
            [end] => {
                Self::terminal(end, LexicalUnit::End)?;
            }
            [else_keyword, negative, _] => {
                Self::terminal(else_keyword, LexicalUnit::Else)?;
                self.lower_code(negative)?;
            }
            children => {
                return Err(InvariantViolation::UnexpectedArity {
                    rule: NonTerminal::C,
                    arity: children.len(),
                });
            }
        }
        self.push_instruction(Instruction::Jump {
            destination: end_label,
        });

        self.push_instruction(Instruction::Label(end_label));

        Ok(())
    }

    // br .cond
    // .cond:
    //     %c = ...
    //     br %c .body .end
    // .body:
    //     ...
    //     br .cond
    // .end:
    fn lower_while(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [_, _, condition, _, _, body, _] = Self::fixed_children(tree, NonTerminal::While)?;

        let condition_label = self.create_label();
        let body_label = self.create_label();
        let end_label = self.create_label();

        debug!(%condition_label, %body_label, %end_label, "lowering while");

        self.push_instruction(Instruction::Jump {
            destination: condition_label,
        });

        self.push_instruction(Instruction::Label(condition_label));
        let condition = self.lower_cond(condition)?;
        self.push_instruction(Instruction::Branch {
            condition,
            positive: body_label,
            negative: end_label,
        });

        self.push_instruction(Instruction::Label(body_label));
        self.lower_code(body)?;
        self.push_instruction(Instruction::Jump {
            destination: condition_label,
        });

        self.push_instruction(Instruction::Label(end_label));

        Ok(())
    }

    fn lower_output(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [_, _, name, _] = Self::fixed_children(tree, NonTerminal::Output)?;
        let name = Self::terminal(name, LexicalUnit::VarName)?;

        let slot = self.variable_slot(&name.value);

        let value = self.create_register();
        self.push_instruction(Instruction::Load {
            destination: value,
            slot,
        });

        let format = self.create_register();
        self.push_instruction(Instruction::FormatPointer {
            destination: format,
            format: FormatString::PrintInteger,
        });

        let destination = self.create_register();
        self.push_instruction(Instruction::Print {
            destination,
            format,
            value,
        });

        Ok(())
    }

    // scanf writes straight into the variable's slot
    fn lower_input(&mut self, tree: &ParseTree) -> Result<(), InvariantViolation> {
        let [_, _, name, _] = Self::fixed_children(tree, NonTerminal::Input)?;
        let name = Self::terminal(name, LexicalUnit::VarName)?;

        let slot = self.variable_slot(&name.value);

        let format = self.create_register();
        self.push_instruction(Instruction::FormatPointer {
            destination: format,
            format: FormatString::ReadInteger,
        });

        let destination = self.create_register();
        self.push_instruction(Instruction::Read {
            destination,
            format,
            slot,
        });

        Ok(())
    }

    /* Expressions */

    fn lower_expr_arith(&mut self, tree: &ParseTree) -> Result<Operand, InvariantViolation> {
        let [prod, rest] = Self::fixed_children(tree, NonTerminal::ExprArith)?;

        let lhs = self.lower_prod(prod)?;
        self.lower_expr_arith_prime(rest, lhs)
    }

    /// Folds `+`/`-` left to right onto the running result
    fn lower_expr_arith_prime(
        &mut self,
        tree: &ParseTree,
        lhs: Operand,
    ) -> Result<Operand, InvariantViolation> {
        match Self::children(tree, NonTerminal::ExprArithPrime)? {
            [] => Ok(lhs),
            [operator, prod, rest] => {
                let operator = match operator.symbol().map(|symbol| symbol.kind) {
                    Some(LexicalUnit::Plus) => ArithmeticOperator::Add,
                    Some(LexicalUnit::Minus) => ArithmeticOperator::Subtract,
                    _ => {
                        return Err(InvariantViolation::UnexpectedNode {
                            expected: "PLUS or MINUS".into(),
                            found: operator.label().to_string(),
                        });
                    }
                };

                let rhs = self.lower_prod(prod)?;
                let destination = self.create_register();

                self.push_instruction(Instruction::Arithmetic {
                    operator,
                    destination,
                    lhs,
                    rhs,
                });

                self.lower_expr_arith_prime(rest, Operand::Register(destination))
            }
            children => Err(InvariantViolation::UnexpectedArity {
                rule: NonTerminal::ExprArithPrime,
                arity: children.len(),
            }),
        }
    }

    fn lower_prod(&mut self, tree: &ParseTree) -> Result<Operand, InvariantViolation> {
        let [atom, rest] = Self::fixed_children(tree, NonTerminal::Prod)?;

        let lhs = self.lower_atom(atom)?;
        self.lower_prod_prime(rest, lhs)
    }

    fn lower_prod_prime(
        &mut self,
        tree: &ParseTree,
        lhs: Operand,
    ) -> Result<Operand, InvariantViolation> {
        match Self::children(tree, NonTerminal::ProdPrime)? {
            [] => Ok(lhs),
            [operator, atom] => {
                let operator = match operator.symbol().map(|symbol| symbol.kind) {
                    Some(LexicalUnit::Times) => ArithmeticOperator::Multiply,
                    Some(LexicalUnit::Divide) => ArithmeticOperator::Divide,
                    _ => {
                        return Err(InvariantViolation::UnexpectedNode {
                            expected: "TIMES or DIVIDE".into(),
                            found: operator.label().to_string(),
                        });
                    }
                };

                let rhs = self.lower_atom(atom)?;
                let destination = self.create_register();

                self.push_instruction(Instruction::Arithmetic {
                    operator,
                    destination,
                    lhs,
                    rhs,
                });

                Ok(Operand::Register(destination))
            }
            children => Err(InvariantViolation::UnexpectedArity {
                rule: NonTerminal::ProdPrime,
                arity: children.len(),
            }),
        }
    }

    fn lower_atom(&mut self, tree: &ParseTree) -> Result<Operand, InvariantViolation> {
        match Self::children(tree, NonTerminal::Atom)? {
            [ParseTree::Leaf(symbol)] if symbol.is(LexicalUnit::VarName) => {
                let slot = self.variable_slot(&symbol.value);
                let destination = self.create_register();

                self.push_instruction(Instruction::Load { destination, slot });

                Ok(Operand::Register(destination))
            }
            [ParseTree::Leaf(symbol)] if symbol.is(LexicalUnit::Number) => {
                Ok(Operand::Constant(symbol.value.clone()))
            }
            [minus, operand] if minus.is_terminal(LexicalUnit::Minus) => {
                let operand = self.lower_atom(operand)?;
                let destination = self.create_register();

                self.push_instruction(Instruction::Negate {
                    destination,
                    operand,
                });

                Ok(Operand::Register(destination))
            }
            [open_paren, expression, close_paren]
                if open_paren.is_terminal(LexicalUnit::LParen)
                    && close_paren.is_terminal(LexicalUnit::RParen) =>
            {
                self.lower_expr_arith(expression)
            }
            [first, ..] => Err(InvariantViolation::UnexpectedNode {
                expected: "VARNAME, NUMBER, MINUS or LPAREN".into(),
                found: first.label().to_string(),
            }),
            [] => Err(InvariantViolation::UnexpectedArity {
                rule: NonTerminal::Atom,
                arity: 0,
            }),
        }
    }

    /* Conditions */

    fn lower_cond(&mut self, tree: &ParseTree) -> Result<RegisterId, InvariantViolation> {
        let [condition] = Self::fixed_children(tree, NonTerminal::Cond)?;

        self.lower_cond_a(condition)
    }

    fn lower_cond_a(&mut self, tree: &ParseTree) -> Result<RegisterId, InvariantViolation> {
        match Self::children(tree, NonTerminal::CondA)? {
            [open_pipe, condition, close_pipe]
                if open_pipe.is_terminal(LexicalUnit::Pipe)
                    && close_pipe.is_terminal(LexicalUnit::Pipe) =>
            {
                let operand = self.lower_cond(condition)?;
                let destination = self.create_register();

                self.push_instruction(Instruction::Not {
                    destination,
                    operand,
                });

                Ok(destination)
            }
            [expression, comparison] => {
                let lhs = self.lower_expr_arith(expression)?;
                self.lower_comparison(comparison, lhs)
            }
            children => Err(InvariantViolation::UnexpectedArity {
                rule: NonTerminal::CondA,
                arity: children.len(),
            }),
        }
    }

    fn lower_comparison(
        &mut self,
        tree: &ParseTree,
        lhs: Operand,
    ) -> Result<RegisterId, InvariantViolation> {
        let [operator, expression] = Self::fixed_children(tree, NonTerminal::D)?;

        let comparison = match operator.symbol().map(|symbol| symbol.kind) {
            Some(LexicalUnit::Equal) => Comparison::Equal,
            Some(LexicalUnit::SmalEq) => Comparison::LessOrEqual,
            Some(LexicalUnit::Smaller) => Comparison::Less,
            _ => {
                return Err(InvariantViolation::UnexpectedNode {
                    expected: "EQUAL, SMALEQ or SMALLER".into(),
                    found: operator.label().to_string(),
                });
            }
        };

        let rhs = self.lower_expr_arith(expression)?;
        let destination = self.create_register();

        self.push_instruction(Instruction::Compare {
            comparison,
            destination,
            lhs,
            rhs,
        });

        Ok(destination)
    }
}
