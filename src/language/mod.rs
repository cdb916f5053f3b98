//! The constraint and domain micro-language: an immutable expression AST and
//! the parser that produces it.

pub mod ast;
pub mod parser;
