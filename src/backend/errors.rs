use thiserror::Error;

use crate::frontend::parse_tree::NonTerminal;

/// The tree handed to the generator has a shape the parser never produces
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("malformed parse tree: expected {expected} but found {found}")]
    UnexpectedNode { expected: String, found: String },

    #[error("malformed parse tree: <{rule}> node with {arity} children matches no production")]
    UnexpectedArity { rule: NonTerminal, arity: usize },
}
