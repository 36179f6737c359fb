//! Vector2 values: mutable `x`/`y` fields plus geometric methods.

use std::rc::Rc;

use crate::error::InterpreterError;
use crate::memory::Heap;
use crate::runtime::function::{InterpreterFunction, NativeFunction};
use crate::runtime::item::Item;
use crate::runtime::members::Members;
use crate::types::TypeTag;

pub const AXES: [&str; 2] = ["x", "y"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len == 0.0 { self } else { Self::new(self.x / len, self.y / len) }
    }

    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(self, other: Vec2) -> f64 {
        Self::new(other.x - self.x, other.y - self.y).length()
    }

    pub fn lerp(self, other: Vec2, t: f64) -> Self {
        Self::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn into_item(self, heap: &Heap) -> Item {
        Item::vector2(heap, self.x, self.y)
    }
}

pub fn read(item: &Item, line: usize) -> Result<Vec2, InterpreterError> {
    let tag = item.target().type_tag();
    if tag != TypeTag::Vector2 {
        return Err(InterpreterError::type_error(line, "vector2", tag.name()));
    }
    let axis = |name: &str| -> Result<f64, InterpreterError> {
        match item.find_item(name) {
            Some(a) => a.real_value(line),
            None => Err(InterpreterError::type_error(line, "vector2", tag.name())),
        }
    };
    Ok(Vec2::new(axis("x")?, axis("y")?))
}

pub fn members(heap: &Heap, x: f64, y: f64) -> Members {
    let mut m = Members::new();
    m.set("x", Item::real(heap, x));
    m.set("y", Item::real(heap, y));

    let methods = [
        NativeFunction::arity0("Length", |ctx, frame| {
            let v = read(frame.this()?, frame.line)?;
            Ok(Item::real(ctx.heap(), v.length()))
        }),
        NativeFunction::arity0("Normalize", |ctx, frame| {
            let v = read(frame.this()?, frame.line)?;
            Ok(v.normalized().into_item(ctx.heap()))
        }),
        NativeFunction::arity1("Dot", |ctx, frame, other| {
            let v = read(frame.this()?, frame.line)?;
            Ok(Item::real(ctx.heap(), v.dot(read(other, frame.line)?)))
        }),
        NativeFunction::arity1("Distance", |ctx, frame, other| {
            let v = read(frame.this()?, frame.line)?;
            Ok(Item::real(ctx.heap(), v.distance(read(other, frame.line)?)))
        }),
        NativeFunction::arity2("Lerp", |ctx, frame, other, t| {
            let v = read(frame.this()?, frame.line)?;
            let other = read(other, frame.line)?;
            Ok(v.lerp(other, t.real_value(frame.line)?).into_item(ctx.heap()))
        }),
    ];
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
    fn geometry() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.normalized(), Vec2::new(0.6, 0.8));
        assert_eq!(Vec2::new(0.0, 0.0).normalized(), Vec2::new(0.0, 0.0));
        assert_eq!(v.dot(Vec2::new(1.0, 2.0)), 11.0);
        assert_eq!(Vec2::new(1.0, 1.0).distance(Vec2::new(4.0, 5.0)), 5.0);
        assert_eq!(Vec2::new(0.0, 0.0).lerp(Vec2::new(2.0, 4.0), 0.5), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn members_are_adopted() {
        let heap = Heap::new(1 << 16, true);
        let v = Item::vector2(&heap, 1.0, 2.0);
        let x = v.find_item("x").unwrap();
        assert!(x.parent().unwrap().ptr_eq(&v));
        assert!(v.has_item("Normalize"));
        assert_eq!(read(&v, 1).unwrap(), Vec2::new(1.0, 2.0));
    }
}
