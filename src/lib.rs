//! yaLcc compiler: parses the scanner's token stream under the LL(1) grammar
//! and lowers the resulting parse tree to LLVM-like IR.

use thiserror::Error;

pub mod backend;
pub mod frontend;
pub(crate) mod index;

use backend::{
    codegen::{CodeGenerator, CodegenOptions},
    errors::InvariantViolation,
};
use frontend::{
    errors::{ParseError, TokenStreamError},
    parser::Parser,
    symbol::Symbol,
};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TokenStream(#[from] TokenStreamError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Codegen(#[from] InvariantViolation),
}

/// Parses `tokens` and renders the IR of the whole program
pub fn compile(tokens: &[Symbol], options: CodegenOptions) -> Result<String, CompileError> {
    let tree = Parser::parse_program(tokens)?;

    Ok(CodeGenerator::new(options).generate(&tree)?)
}
