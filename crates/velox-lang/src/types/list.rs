//! List values: an ordered element vector plus the built-in list methods.

use std::rc::Rc;

use crate::error::{ErrorKind, InterpreterError};
use crate::memory::Heap;
use crate::runtime::context::Context;
use crate::runtime::function::{InterpreterFunction, NativeFunction};
use crate::runtime::item::Item;
use crate::runtime::members::Members;
use crate::syntax::ast::BinOp;

/// Fresh element slot holding `value` with assignment semantics: primitives
/// are copied, objects and lists are referenced.
pub fn slot(heap: &Heap, value: &Item) -> Item {
    let element = Item::undefined(heap);
    element.assign(value);
    element
}

/// Bounds-check `index` against `len`.
pub fn check_index(index: i64, len: usize, line: usize) -> Result<usize, InterpreterError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| InterpreterError::new(line, ErrorKind::IndexOutOfRange { index, len }))
}

/// Element `index` of a list value, as the shared slot Item.
pub fn element(list: &Item, index: i64, line: usize) -> Result<Item, InterpreterError> {
    list.with_elements(line, |elements| {
        let i = check_index(index, elements.len(), line)?;
        Ok(elements[i].clone())
    })
}

/// Position of the first element equal to `needle`; elements of types that
/// do not compare with it are skipped.
pub fn index_of(ctx: &mut Context, list: &Item, needle: &Item, line: usize) -> Result<i64, InterpreterError> {
    let elements = list.elements().unwrap_or_default();
    for (i, element) in elements.iter().enumerate() {
        let Ok(equal) = ctx.binary(BinOp::Eq, element, needle, line) else { continue };
        if equal.boolean_value(line)? {
            return Ok(i as i64);
        }
    }
    Ok(-1)
}

pub fn members(heap: &Heap) -> Members {
    let methods = [
        NativeFunction::arity1("Add", |ctx, frame, value| {
            let element = slot(ctx.heap(), value);
            frame.this()?.with_elements(frame.line, |elements| {
                elements.push(element);
                Ok(())
            })?;
            Ok(Item::undefined(ctx.heap()))
        }),
        NativeFunction::arity2("Insert", |ctx, frame, index, value| {
            let index = index.integer_value(frame.line)?;
            let element = slot(ctx.heap(), value);
            frame.this()?.with_elements(frame.line, |elements| {
                // Inserting at the end is allowed.
                let i = check_index(index, elements.len() + 1, frame.line)?;
                elements.insert(i, element);
                Ok(())
            })?;
            Ok(Item::undefined(ctx.heap()))
        }),
        NativeFunction::arity1("RemoveAt", |ctx, frame, index| {
            let index = index.integer_value(frame.line)?;
            let removed = frame.this()?.with_elements(frame.line, |elements| {
                let i = check_index(index, elements.len(), frame.line)?;
                Ok(elements.remove(i))
            })?;
            drop(removed);
            Ok(Item::undefined(ctx.heap()))
        }),
        NativeFunction::arity0("Count", |ctx, frame| {
            let len = frame.this()?.with_elements(frame.line, |elements| Ok(elements.len()))?;
            Ok(Item::integer(ctx.heap(), len as i64))
        }),
        NativeFunction::arity0("Clear", |ctx, frame| {
            let removed = frame.this()?.with_elements(frame.line, |elements| Ok(std::mem::take(elements)))?;
            drop(removed);
            Ok(Item::undefined(ctx.heap()))
        }),
        NativeFunction::arity1("IndexOf", |ctx, frame, needle| {
            let this = frame.this()?.clone();
            let index = index_of(ctx, &this, needle, frame.line)?;
            Ok(Item::integer(ctx.heap(), index))
        }),
    ];

    let mut m = Members::new();
    for method in methods {
        let name = method.name().to_string();
        m.set(name, Item::function(heap, Rc::new(method)));
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_bounds() {
        assert_eq!(check_index(0, 1, 1), Ok(0));
        assert!(check_index(1, 1, 1).is_err());
        assert_eq!(
            check_index(-1, 3, 9),
            Err(InterpreterError::new(9, ErrorKind::IndexOutOfRange { index: -1, len: 3 }))
        );
    }

    #[test]
    fn slot_copies_primitives() {
        let heap = Heap::new(1 << 16, true);
        let n = Item::integer(&heap, 3);
        let s = slot(&heap, &n);
        n.assign(&Item::integer(&heap, 4));
        assert_eq!(s.integer_value(1).unwrap(), 3);
    }

    #[test]
    fn element_access() {
        let heap = Heap::new(1 << 16, true);
        let list = Item::list(&heap, vec![Item::integer(&heap, 10), Item::integer(&heap, 20)]);
        assert_eq!(element(&list, 1, 1).unwrap().integer_value(1).unwrap(), 20);
        assert!(element(&list, 2, 1).is_err());
        assert!(element(&Item::integer(&heap, 0), 0, 1).is_err());
    }
}
