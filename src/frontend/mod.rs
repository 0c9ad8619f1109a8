//! The frontend turns the scanner's token stream into a concrete parse tree.

pub mod errors;
pub mod lexical_unit;
pub mod parse_tree;
pub mod parser;
pub mod symbol;
pub mod token_stream;
