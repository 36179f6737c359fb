//! Front-end: source text to `Program`.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
