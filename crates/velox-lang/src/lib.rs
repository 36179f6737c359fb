pub mod config;
pub mod error;
pub mod extension;
pub mod memory;
pub mod namespaces;
pub mod runtime;
pub mod syntax;
pub mod types;

pub use config::InterpreterConfig;
pub use error::{Error, ErrorCode, ErrorKind, InterpreterError, RuntimeError, SetupError, SyntaxError};
pub use extension::{function0, function1, function2, function3, ExtensionBuilder, FromItem, IntoItem};
pub use memory::{Heap, MemoryStats};
pub use runtime::context::Context;
pub use runtime::function::{CallFrame, InterpreterFunction, NativeFunction};
pub use runtime::interpreter::Interpreter;
pub use runtime::item::Item;
pub use runtime::object_type::ObjectType;
pub use syntax::ast::Program;
pub use syntax::token::{Token, TokenKind};
pub use types::TypeTag;

// ─── Public API ───────────────────────────────────────────────────────────────

/// Lex and parse source text. Every syntax error found is reported, not
/// just the first.
pub fn compile(source: &str) -> Result<Program, Vec<SyntaxError>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    syntax::parser::Parser::new(tokens).parse()
}
