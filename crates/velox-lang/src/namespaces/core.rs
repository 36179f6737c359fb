//! Always-available built-ins: math, value constructors, conversions,
//! `print`, and the PI/TAU constants.

use crate::error::{ErrorKind, InterpreterError};
use crate::memory::Heap;
use crate::runtime::function::NativeFunction;
use crate::runtime::item::Item;
use crate::types::color::Rgba;
use crate::types::vector2::Vec2;
use crate::types::TypeTag;

use super::{Export, Namespace};

pub struct CoreNamespace;

impl Namespace for CoreNamespace {
    fn name(&self) -> &'static str {
        "core"
    }

    fn exports(&self, heap: &Heap) -> Vec<Export> {
        let mut out: Vec<Export> = UNARY_MATH
            .iter()
            .map(|&(name, f)| {
                Export::Function(NativeFunction::arity1(name, move |ctx, frame, x| {
                    Ok(Item::real(ctx.heap(), f(x.real_value(frame.line)?)))
                }))
            })
            .collect();

        out.extend(math().into_iter().map(Export::Function));
        out.extend(constructors().into_iter().map(Export::Function));
        out.extend(conversions().into_iter().map(Export::Function));

        out.push(Export::Constant("PI", Item::real(heap, std::f64::consts::PI)));
        out.push(Export::Constant("TAU", Item::real(heap, std::f64::consts::TAU)));
        out
    }
}

// ─── Math ─────────────────────────────────────────────────────────────────────

const UNARY_MATH: [(&str, fn(f64) -> f64); 12] = [
    ("sin",   f64::sin),
    ("cos",   f64::cos),
    ("tan",   f64::tan),
    ("asin",  f64::asin),
    ("acos",  f64::acos),
    ("atan",  f64::atan),
    ("sqrt",  f64::sqrt),
    ("floor", f64::floor),
    ("ceil",  f64::ceil),
    ("round", f64::round),
    ("sign",  f64::signum),
    ("fract", fract),
];

fn fract(x: f64) -> f64 {
    x - x.floor()
}

/// Integer when every operand is an integer, real otherwise.
fn numeric2(
    heap: &Heap,
    a: &Item,
    b: &Item,
    line: usize,
    int: fn(i64, i64) -> i64,
    real: fn(f64, f64) -> f64,
) -> Result<Item, InterpreterError> {
    if a.target().type_tag() == TypeTag::Integer && b.target().type_tag() == TypeTag::Integer {
        Ok(Item::integer(heap, int(a.integer_value(line)?, b.integer_value(line)?)))
    } else {
        Ok(Item::real(heap, real(a.real_value(line)?, b.real_value(line)?)))
    }
}

fn math() -> Vec<NativeFunction> {
    vec![
        NativeFunction::arity1("abs", |ctx, frame, x| match x.target().type_tag() {
            TypeTag::Integer => {
                let n = x.integer_value(frame.line)?;
                let abs = n.checked_abs().ok_or(InterpreterError::new(frame.line, ErrorKind::IntegerOverflow))?;
                Ok(Item::integer(ctx.heap(), abs))
            }
            _ => Ok(Item::real(ctx.heap(), x.real_value(frame.line)?.abs())),
        }),
        NativeFunction::arity2("min", |ctx, frame, a, b| numeric2(ctx.heap(), a, b, frame.line, i64::min, f64::min)),
        NativeFunction::arity2("max", |ctx, frame, a, b| numeric2(ctx.heap(), a, b, frame.line, i64::max, f64::max)),
        NativeFunction::arity2("atan2", |ctx, frame, y, x| {
            Ok(Item::real(ctx.heap(), y.real_value(frame.line)?.atan2(x.real_value(frame.line)?)))
        }),
        NativeFunction::arity2("pow", |ctx, frame, base, exp| {
            Ok(Item::real(ctx.heap(), base.real_value(frame.line)?.powf(exp.real_value(frame.line)?)))
        }),
        NativeFunction::arity3("clamp", |ctx, frame, x, lo, hi| {
            let line = frame.line;
            let all_int = [x, lo, hi].iter().all(|i| i.target().type_tag() == TypeTag::Integer);
            if all_int {
                let (x, lo, hi) = (x.integer_value(line)?, lo.integer_value(line)?, hi.integer_value(line)?);
                Ok(Item::integer(ctx.heap(), x.max(lo).min(hi)))
            } else {
                let (x, lo, hi) = (x.real_value(line)?, lo.real_value(line)?, hi.real_value(line)?);
                Ok(Item::real(ctx.heap(), x.max(lo).min(hi)))
            }
        }),
        NativeFunction::arity3("lerp", |ctx, frame, a, b, t| {
            let line = frame.line;
            let (a, b, t) = (a.real_value(line)?, b.real_value(line)?, t.real_value(line)?);
            Ok(Item::real(ctx.heap(), a + (b - a) * t))
        }),
    ]
}

// ─── Constructors ─────────────────────────────────────────────────────────────

fn constructors() -> Vec<NativeFunction> {
    vec![
        // `alpha` may be omitted.
        NativeFunction::new("Color", &["red", "green", "blue", "alpha"], |ctx, frame| {
            let line = frame.line;
            let channel = |i: usize| frame.args[i].real_value(line);
            let alpha = if frame.args[3].is_undefined() { 1.0 } else { channel(3)? };
            let c = Rgba::new(channel(0)?, channel(1)?, channel(2)?, alpha).clamped();
            Ok(Some(c.into_item(ctx.heap())))
        }),
        NativeFunction::arity2("Vector2", |ctx, frame, x, y| {
            Ok(Vec2::new(x.real_value(frame.line)?, y.real_value(frame.line)?).into_item(ctx.heap()))
        }),
    ]
}

// ─── Conversions / output ─────────────────────────────────────────────────────

fn conversions() -> Vec<NativeFunction> {
    vec![
        NativeFunction::arity1("print", |ctx, _, value| {
            ctx.emit(value.string_value());
            Ok(Item::undefined(ctx.heap()))
        }),
        NativeFunction::arity1("ToString", |ctx, _, value| Ok(Item::string(ctx.heap(), value.string_value()))),
        NativeFunction::arity1("ToInteger", |ctx, frame, value| {
            let n = match value.target().type_tag() {
                TypeTag::String => parse_number(&value.string_value(), frame.line)?.trunc() as i64,
                _ => value.integer_value(frame.line)?,
            };
            Ok(Item::integer(ctx.heap(), n))
        }),
        NativeFunction::arity1("ToReal", |ctx, frame, value| {
            let r = match value.target().type_tag() {
                TypeTag::String => parse_number(&value.string_value(), frame.line)?,
                _ => value.real_value(frame.line)?,
            };
            Ok(Item::real(ctx.heap(), r))
        }),
        NativeFunction::arity1("TypeOf", |ctx, _, value| Ok(Item::string(ctx.heap(), value.type_name()))),
        NativeFunction::arity1("Copy", |_, _, value| Ok(value.target().copy())),
    ]
}

fn parse_number(text: &str, line: usize) -> Result<f64, InterpreterError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| InterpreterError::host(line, format!("`{text}` is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_are_unique() {
        let heap = Heap::new(1 << 20, true);
        let exports = CoreNamespace.exports(&heap);
        let mut names: Vec<&str> = exports.iter().map(Export::name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
        assert!(names.contains(&"print"));
        assert!(names.contains(&"PI"));
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number(" 2.5 ", 1).unwrap(), 2.5);
        assert!(parse_number("abc", 1).is_err());
    }
}
