//! Operator table: maps (BinOp, lhs tag, rhs tag) to an implementation.
//!
//! Adding operators for a built-in type = calling `register()` here.
//! Script and host types overload through `operator<sym>` members instead.

use rustc_hash::FxHashMap;

use crate::error::{ErrorKind, InterpreterError};
use crate::runtime::item::Item;
use crate::syntax::ast::BinOp;
use crate::types::color::{self, Rgba};
use crate::types::vector2::{self, Vec2};
use crate::types::TypeTag;

// ─── Function pointer ─────────────────────────────────────────────────────────

/// Operands arrive dereferenced and match the tags they were registered for.
pub type BinopFn = fn(&Item, &Item, usize) -> Result<Item, InterpreterError>;

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct BinopRegistry {
    ops: FxHashMap<(BinOp, TypeTag, TypeTag), BinopFn>,
}

impl BinopRegistry {
    pub fn new() -> Self {
        Self { ops: FxHashMap::default() }
    }

    pub fn register(&mut self, op: BinOp, lhs: TypeTag, rhs: TypeTag, f: BinopFn) {
        self.ops.insert((op, lhs, rhs), f);
    }

    pub fn lookup(&self, op: BinOp, lhs: TypeTag, rhs: TypeTag) -> Option<BinopFn> {
        self.ops.get(&(op, lhs, rhs)).copied()
    }

    pub fn supports(&self, op: BinOp, lhs: TypeTag, rhs: TypeTag) -> bool {
        self.ops.contains_key(&(op, lhs, rhs))
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for BinopRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        register_integer(&mut r);
        register_real(&mut r);
        register_string(&mut r);
        register_boolean(&mut r);
        register_color(&mut r);
        register_vector2(&mut r);
        register_undefined(&mut r);
        r
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn boolean(l: &Item, value: bool) -> Result<Item, InterpreterError> {
    Ok(Item::boolean(l.heap(), value))
}

fn reals(l: &Item, r: &Item, line: usize) -> Result<(f64, f64), InterpreterError> {
    Ok((l.real_value(line)?, r.real_value(line)?))
}

fn ints(l: &Item, r: &Item, line: usize) -> Result<(i64, i64), InterpreterError> {
    Ok((l.integer_value(line)?, r.integer_value(line)?))
}

fn overflow(line: usize) -> InterpreterError {
    InterpreterError::new(line, ErrorKind::IntegerOverflow)
}

fn div_zero(line: usize) -> InterpreterError {
    InterpreterError::new(line, ErrorKind::DivisionByZero)
}

fn nonzero(divisor: f64, line: usize) -> Result<f64, InterpreterError> {
    if divisor == 0.0 { Err(div_zero(line)) } else { Ok(divisor) }
}

// ─── integer ──────────────────────────────────────────────────────────────────

fn register_integer(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::Integer;
    r.register(Add, Integer, Integer, |l, r, line| {
        let (a, b) = ints(l, r, line)?;
        Ok(Item::integer(l.heap(), a.checked_add(b).ok_or_else(|| overflow(line))?))
    });
    r.register(Sub, Integer, Integer, |l, r, line| {
        let (a, b) = ints(l, r, line)?;
        Ok(Item::integer(l.heap(), a.checked_sub(b).ok_or_else(|| overflow(line))?))
    });
    r.register(Mul, Integer, Integer, |l, r, line| {
        let (a, b) = ints(l, r, line)?;
        Ok(Item::integer(l.heap(), a.checked_mul(b).ok_or_else(|| overflow(line))?))
    });
    r.register(Div, Integer, Integer, |l, r, line| {
        let (a, b) = ints(l, r, line)?;
        if b == 0 { return Err(div_zero(line)); }
        Ok(Item::integer(l.heap(), a.checked_div(b).ok_or_else(|| overflow(line))?))
    });
    r.register(Mod, Integer, Integer, |l, r, line| {
        let (a, b) = ints(l, r, line)?;
        if b == 0 { return Err(div_zero(line)); }
        Ok(Item::integer(l.heap(), a.checked_rem(b).ok_or_else(|| overflow(line))?))
    });
    r.register(Lt,    Integer, Integer, |l, r, line| { let (a, b) = ints(l, r, line)?; boolean(l, a <  b) });
    r.register(LtEq,  Integer, Integer, |l, r, line| { let (a, b) = ints(l, r, line)?; boolean(l, a <= b) });
    r.register(Gt,    Integer, Integer, |l, r, line| { let (a, b) = ints(l, r, line)?; boolean(l, a >  b) });
    r.register(GtEq,  Integer, Integer, |l, r, line| { let (a, b) = ints(l, r, line)?; boolean(l, a >= b) });
    r.register(Eq,    Integer, Integer, |l, r, line| { let (a, b) = ints(l, r, line)?; boolean(l, a == b) });
    r.register(NotEq, Integer, Integer, |l, r, line| { let (a, b) = ints(l, r, line)?; boolean(l, a != b) });
}

// ─── real (and mixed integer/real) ────────────────────────────────────────────

fn register_real(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::{Integer, Real};
    for (lhs, rhs) in [(Real, Real), (Integer, Real), (Real, Integer)] {
        r.register(Add, lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; Ok(Item::real(l.heap(), a + b)) });
        r.register(Sub, lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; Ok(Item::real(l.heap(), a - b)) });
        r.register(Mul, lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; Ok(Item::real(l.heap(), a * b)) });
        r.register(Div, lhs, rhs, |l, r, line| {
            let (a, b) = reals(l, r, line)?;
            Ok(Item::real(l.heap(), a / nonzero(b, line)?))
        });
        r.register(Mod, lhs, rhs, |l, r, line| {
            let (a, b) = reals(l, r, line)?;
            Ok(Item::real(l.heap(), a % nonzero(b, line)?))
        });
        r.register(Lt,    lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; boolean(l, a <  b) });
        r.register(LtEq,  lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; boolean(l, a <= b) });
        r.register(Gt,    lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; boolean(l, a >  b) });
        r.register(GtEq,  lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; boolean(l, a >= b) });
        r.register(Eq,    lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; boolean(l, a == b) });
        r.register(NotEq, lhs, rhs, |l, r, line| { let (a, b) = reals(l, r, line)?; boolean(l, a != b) });
    }
}

// ─── string ───────────────────────────────────────────────────────────────────

fn register_string(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::String;
    // `+` with a string on either side concatenates string forms.
    for other in TypeTag::ALL {
        r.register(Add, String, other, |l, r, _| {
            Ok(Item::string(l.heap(), format!("{}{}", l.string_value(), r.string_value())))
        });
        r.register(Add, other, String, |l, r, _| {
            Ok(Item::string(l.heap(), format!("{}{}", l.string_value(), r.string_value())))
        });
    }
    r.register(Lt,    String, String, |l, r, _| boolean(l, l.string_value() <  r.string_value()));
    r.register(LtEq,  String, String, |l, r, _| boolean(l, l.string_value() <= r.string_value()));
    r.register(Gt,    String, String, |l, r, _| boolean(l, l.string_value() >  r.string_value()));
    r.register(GtEq,  String, String, |l, r, _| boolean(l, l.string_value() >= r.string_value()));
    r.register(Eq,    String, String, |l, r, _| boolean(l, l.string_value() == r.string_value()));
    r.register(NotEq, String, String, |l, r, _| boolean(l, l.string_value() != r.string_value()));
}

// ─── boolean ──────────────────────────────────────────────────────────────────

fn register_boolean(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::Boolean;
    r.register(Eq, Boolean, Boolean, |l, r, line| {
        boolean(l, l.boolean_value(line)? == r.boolean_value(line)?)
    });
    r.register(NotEq, Boolean, Boolean, |l, r, line| {
        boolean(l, l.boolean_value(line)? != r.boolean_value(line)?)
    });
}

// ─── color ────────────────────────────────────────────────────────────────────

fn register_color(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::{Color, Integer, Real};

    fn pair(l: &Item, r: &Item, line: usize) -> Result<(Rgba, Rgba), InterpreterError> {
        Ok((color::read(l, line)?, color::read(r, line)?))
    }
    fn scaled(l: &Item, r: &Item, line: usize) -> Result<(Rgba, f64), InterpreterError> {
        Ok((color::read(l, line)?, r.real_value(line)?))
    }

    r.register(Add, Color, Color, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(a.zip(b, |x, y| x + y).into_item(l.heap()))
    });
    r.register(Sub, Color, Color, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(a.zip(b, |x, y| x - y).into_item(l.heap()))
    });
    r.register(Mul, Color, Color, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(a.zip(b, |x, y| x * y).into_item(l.heap()))
    });
    r.register(Div, Color, Color, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        for divisor in [b.red, b.green, b.blue, b.alpha] {
            nonzero(divisor, line)?;
        }
        Ok(a.zip(b, |x, y| x / y).into_item(l.heap()))
    });
    for scalar in [Real, Integer] {
        r.register(Mul, Color, scalar, |l, r, line| {
            let (c, s) = scaled(l, r, line)?;
            Ok(c.map(|x| x * s).into_item(l.heap()))
        });
        r.register(Div, Color, scalar, |l, r, line| {
            let (c, s) = scaled(l, r, line)?;
            let s = nonzero(s, line)?;
            Ok(c.map(|x| x / s).into_item(l.heap()))
        });
    }
    r.register(Eq, Color, Color, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        boolean(l, a == b)
    });
    r.register(NotEq, Color, Color, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        boolean(l, a != b)
    });
}

// ─── vector2 ──────────────────────────────────────────────────────────────────

fn register_vector2(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::{Integer, Real, Vector2};

    fn pair(l: &Item, r: &Item, line: usize) -> Result<(Vec2, Vec2), InterpreterError> {
        Ok((vector2::read(l, line)?, vector2::read(r, line)?))
    }

    r.register(Add, Vector2, Vector2, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(Vec2::new(a.x + b.x, a.y + b.y).into_item(l.heap()))
    });
    r.register(Sub, Vector2, Vector2, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(Vec2::new(a.x - b.x, a.y - b.y).into_item(l.heap()))
    });
    r.register(Mul, Vector2, Vector2, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(Vec2::new(a.x * b.x, a.y * b.y).into_item(l.heap()))
    });
    r.register(Div, Vector2, Vector2, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        Ok(Vec2::new(a.x / nonzero(b.x, line)?, a.y / nonzero(b.y, line)?).into_item(l.heap()))
    });
    for scalar in [Real, Integer] {
        r.register(Mul, Vector2, scalar, |l, r, line| {
            let (v, s) = (vector2::read(l, line)?, r.real_value(line)?);
            Ok(Vec2::new(v.x * s, v.y * s).into_item(l.heap()))
        });
        r.register(Mul, scalar, Vector2, |l, r, line| {
            let (s, v) = (l.real_value(line)?, vector2::read(r, line)?);
            Ok(Vec2::new(v.x * s, v.y * s).into_item(l.heap()))
        });
        r.register(Div, Vector2, scalar, |l, r, line| {
            let (v, s) = (vector2::read(l, line)?, r.real_value(line)?);
            let s = nonzero(s, line)?;
            Ok(Vec2::new(v.x / s, v.y / s).into_item(l.heap()))
        });
    }
    r.register(Eq, Vector2, Vector2, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        boolean(l, a == b)
    });
    r.register(NotEq, Vector2, Vector2, |l, r, line| {
        let (a, b) = pair(l, r, line)?;
        boolean(l, a != b)
    });
}

// ─── undefined ────────────────────────────────────────────────────────────────

fn register_undefined(r: &mut BinopRegistry) {
    use BinOp::*;
    use TypeTag::Undefined;
    // Undefined equals only undefined, whatever the other side is.
    for other in TypeTag::ALL {
        r.register(Eq, Undefined, other, |l, r, _| boolean(l, r.is_undefined()));
        r.register(Eq, other, Undefined, |l, _r, _| boolean(l, l.is_undefined()));
        r.register(NotEq, Undefined, other, |l, r, _| boolean(l, !r.is_undefined()));
        r.register(NotEq, other, Undefined, |l, _r, _| boolean(l, !l.is_undefined()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Heap;

    fn eval(reg: &BinopRegistry, op: BinOp, l: &Item, r: &Item) -> Result<Item, InterpreterError> {
        let f = reg.lookup(op, l.type_tag(), r.type_tag()).expect("operator registered");
        f(l, r, 1)
    }

    #[test]
    fn integer_division_truncates() {
        let heap = Heap::new(1 << 16, true);
        let reg = BinopRegistry::default();
        let q = eval(&reg, BinOp::Div, &Item::integer(&heap, -7), &Item::integer(&heap, 2)).unwrap();
        assert_eq!(q.integer_value(1).unwrap(), -3);
        let m = eval(&reg, BinOp::Mod, &Item::integer(&heap, -7), &Item::integer(&heap, 2)).unwrap();
        assert_eq!(m.integer_value(1).unwrap(), -1);
    }

    #[test]
    fn integer_faults() {
        let heap = Heap::new(1 << 16, true);
        let reg = BinopRegistry::default();
        let zero = Item::integer(&heap, 0);
        let err = eval(&reg, BinOp::Mod, &Item::integer(&heap, 1), &zero).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        let err = eval(&reg, BinOp::Add, &Item::integer(&heap, i64::MAX), &Item::integer(&heap, 1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IntegerOverflow);
    }

    #[test]
    fn mixed_numeric_promotes_to_real() {
        let heap = Heap::new(1 << 16, true);
        let reg = BinopRegistry::default();
        let sum = eval(&reg, BinOp::Add, &Item::integer(&heap, 3), &Item::real(&heap, 2.5)).unwrap();
        assert_eq!(sum.type_tag(), TypeTag::Real);
        assert_eq!(sum.real_value(1).unwrap(), 5.5);
        let m = eval(&reg, BinOp::Mod, &Item::real(&heap, 5.5), &Item::integer(&heap, 2)).unwrap();
        assert_eq!(m.real_value(1).unwrap(), 1.5);
    }

    #[test]
    fn string_absorbs_plus() {
        let heap = Heap::new(1 << 16, true);
        let reg = BinopRegistry::default();
        let s = eval(&reg, BinOp::Add, &Item::string(&heap, "x="), &Item::integer(&heap, 5)).unwrap();
        assert_eq!(s.string_value(), "x=5");
        let s = eval(&reg, BinOp::Add, &Item::boolean(&heap, true), &Item::string(&heap, "!")).unwrap();
        assert_eq!(s.string_value(), "true!");
    }

    #[test]
    fn color_scaling_is_per_channel() {
        let heap = Heap::new(1 << 16, true);
        let reg = BinopRegistry::default();
        let c = Item::color(&heap, 0.4, 0.6, 0.1, 0.5);
        let doubled = eval(&reg, BinOp::Mul, &c, &Item::real(&heap, 2.0)).unwrap();
        assert_eq!(color::read(&doubled, 1).unwrap(), Rgba::new(0.8, 1.2, 0.2, 1.0));
        let halved = eval(&reg, BinOp::Div, &doubled, &Item::integer(&heap, 2)).unwrap();
        assert_eq!(color::read(&halved, 1).unwrap(), Rgba::new(0.4, 0.6, 0.1, 0.5));
    }

    #[test]
    fn undefined_equality() {
        let heap = Heap::new(1 << 16, true);
        let reg = BinopRegistry::default();
        let u = Item::undefined(&heap);
        let t = eval(&reg, BinOp::Eq, &u, &Item::undefined(&heap)).unwrap();
        assert!(t.boolean_value(1).unwrap());
        let f = eval(&reg, BinOp::Eq, &Item::integer(&heap, 0), &u).unwrap();
        assert!(!f.boolean_value(1).unwrap());
        assert!(!reg.supports(BinOp::Lt, TypeTag::Undefined, TypeTag::Integer));
    }
}
