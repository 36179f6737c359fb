//! Operator evaluation: table dispatch, then member overloads.

use crate::error::{ErrorKind, InterpreterError};
use crate::runtime::context::Context;
use crate::runtime::item::Item;
use crate::syntax::ast::{BinOp, UnOp};
use crate::types::vector2::{self, Vec2};
use crate::types::TypeTag;

impl Context {
    /// Evaluate `lhs op rhs` on already-evaluated operands.
    ///
    /// Pairs without a table entry fall back to a member named
    /// `operator<sym>` on the left operand, called with the right one.
    /// `and`/`or` short-circuit in the evaluator and have no entry here.
    pub fn binary(&mut self, op: BinOp, lhs: &Item, rhs: &Item, line: usize) -> Result<Item, InterpreterError> {
        let (lhs, rhs) = (lhs.target(), rhs.target());
        let (lt, rt) = (lhs.type_tag(), rhs.type_tag());

        if let Some(f) = self.operators().lookup(op, lt, rt) {
            return f(&lhs, &rhs, line);
        }

        if op.is_ordering() && (lt == TypeTag::Undefined || rt == TypeTag::Undefined) && self.config().legacy_undefined_compare {
            return Ok(Item::boolean(self.heap(), true));
        }

        let overload = format!("operator{}", op.symbol());
        if let Some(method) = lhs.find_item(&overload) {
            return method.call_as_function(self, &[rhs], line);
        }

        Err(InterpreterError::new(line, ErrorKind::UnsupportedOperator {
            op: op.symbol(),
            lhs: lt.name(),
            rhs: rt.name(),
        }))
    }

    pub fn unary(&mut self, op: UnOp, operand: &Item, line: usize) -> Result<Item, InterpreterError> {
        let operand = operand.target();
        let tag = operand.type_tag();
        let heap = self.heap();
        match (op, tag) {
            (UnOp::Not, _) => Ok(Item::boolean(heap, !operand.boolean_value(line)?)),
            (UnOp::Neg, TypeTag::Integer) => {
                let n = operand.integer_value(line)?;
                let negated = n.checked_neg().ok_or(InterpreterError::new(line, ErrorKind::IntegerOverflow))?;
                Ok(Item::integer(heap, negated))
            }
            (UnOp::Neg, TypeTag::Real) => Ok(Item::real(heap, -operand.real_value(line)?)),
            (UnOp::Neg, TypeTag::Vector2) => {
                let v = vector2::read(&operand, line)?;
                Ok(Vec2::new(-v.x, -v.y).into_item(heap))
            }
            (UnOp::Neg, _) => Err(InterpreterError::new(line, ErrorKind::UnsupportedUnary {
                op: op.symbol(),
                operand: tag.name(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterConfig;

    #[test]
    fn undefined_ordering_is_an_error_by_default() {
        let mut ctx = Context::new(InterpreterConfig::default());
        let u = Item::undefined(ctx.heap());
        let one = Item::integer(ctx.heap(), 1);
        let err = ctx.binary(BinOp::Lt, &u, &one, 3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperator { op: "<", lhs: "undefined", rhs: "integer" });
    }

    #[test]
    fn legacy_undefined_ordering_is_true() {
        let mut ctx = Context::new(InterpreterConfig::default().with_legacy_undefined_compare(true));
        let u = Item::undefined(ctx.heap());
        let one = Item::integer(ctx.heap(), 1);
        assert!(ctx.binary(BinOp::Gt, &one, &u, 1).unwrap().boolean_value(1).unwrap());
        assert!(ctx.binary(BinOp::Lt, &one, &u, 1).unwrap().boolean_value(1).unwrap());
    }

    #[test]
    fn operands_are_dereferenced() {
        let mut ctx = Context::new(InterpreterConfig::default());
        let list = Item::list(ctx.heap(), Vec::new());
        let alias = Item::reference(ctx.heap(), &list);
        let err = ctx.binary(BinOp::Add, &alias, &Item::integer(ctx.heap(), 1), 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperator { op: "+", lhs: "list", rhs: "integer" });
    }

    #[test]
    fn logical_operators_are_not_dispatched() {
        let mut ctx = Context::new(InterpreterConfig::default());
        let t = Item::boolean(ctx.heap(), true);
        let err = ctx.binary(BinOp::And, &t, &t, 4).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperator { op: "and", lhs: "boolean", rhs: "boolean" });
    }

    #[test]
    fn unary_minus() {
        let mut ctx = Context::new(InterpreterConfig::default());
        let v = Item::vector2(ctx.heap(), 1.0, -2.0);
        let neg = ctx.unary(UnOp::Neg, &v, 1).unwrap();
        assert_eq!(vector2::read(&neg, 1).unwrap(), Vec2::new(-1.0, 2.0));
        let s = Item::string(ctx.heap(), "a");
        assert!(ctx.unary(UnOp::Neg, &s, 1).is_err());
        let min = Item::integer(ctx.heap(), i64::MIN);
        assert_eq!(ctx.unary(UnOp::Neg, &min, 1).unwrap_err().kind, ErrorKind::IntegerOverflow);
    }
}
