//! The backend lowers the parse tree to IR. In this form, loops and
//! conditionals are simplified to labels and branches, expression trees are
//! flattened into ordered register operations, and every variable lives in a
//! stack slot allocated on its first reference.

pub mod codegen;
pub mod errors;
pub mod ir;
pub mod variables;
