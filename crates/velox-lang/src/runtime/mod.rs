//! Execution: values, scopes, calls, object types and the evaluator.

pub mod context;
pub mod eval;
pub mod function;
pub mod interpreter;
pub mod item;
pub mod members;
pub mod object_type;
pub mod operators;
pub mod scope;
pub mod state;
