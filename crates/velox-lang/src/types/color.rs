//! Color values: four mutable real channels plus `Lerp` and `Blend`.

use std::rc::Rc;

use crate::error::InterpreterError;
use crate::memory::Heap;
use crate::runtime::function::NativeFunction;
use crate::runtime::item::Item;
use crate::runtime::members::Members;
use crate::types::TypeTag;

pub const CHANNELS: [&str; 4] = ["red", "green", "blue", "alpha"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self { red, green, blue, alpha }
    }

    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.red), f(self.green), f(self.blue), f(self.alpha))
    }

    pub fn zip(self, other: Rgba, f: impl Fn(f64, f64) -> f64) -> Self {
        Self::new(
            f(self.red, other.red),
            f(self.green, other.green),
            f(self.blue, other.blue),
            f(self.alpha, other.alpha),
        )
    }

    pub fn clamped(self) -> Self {
        self.map(|c| c.clamp(0.0, 1.0))
    }

    pub fn lerp(self, other: Rgba, t: f64) -> Self {
        self.zip(other, |a, b| a + (b - a) * t).clamped()
    }

    /// `source` composited over `self` (source-over).
    pub fn blend(self, source: Rgba) -> Self {
        let alpha = source.alpha + self.alpha * (1.0 - source.alpha);
        if alpha <= 0.0 {
            return Self::new(0.0, 0.0, 0.0, 0.0);
        }
        let channel = |s: f64, d: f64| (s * source.alpha + d * self.alpha * (1.0 - source.alpha)) / alpha;
        Self::new(
            channel(source.red, self.red),
            channel(source.green, self.green),
            channel(source.blue, self.blue),
            alpha,
        )
        .clamped()
    }

    pub fn into_item(self, heap: &Heap) -> Item {
        Item::color(heap, self.red, self.green, self.blue, self.alpha)
    }
}

/// Parse the digits of a `#rrggbb` or `#rrggbbaa` literal.
pub fn parse_hex(digits: &str) -> Option<Rgba> {
    if digits.len() != 6 && digits.len() != 8 {
        return None;
    }
    let byte = |i: usize| -> Option<f64> {
        let s = digits.get(i..i + 2)?;
        u8::from_str_radix(s, 16).ok().map(|b| f64::from(b) / 255.0)
    };
    let alpha = if digits.len() == 8 { byte(6)? } else { 1.0 };
    Some(Rgba::new(byte(0)?, byte(2)?, byte(4)?, alpha))
}

/// Read the channels of a Color item.
pub fn read(item: &Item, line: usize) -> Result<Rgba, InterpreterError> {
    let tag = item.target().type_tag();
    if tag != TypeTag::Color {
        return Err(InterpreterError::type_error(line, "color", tag.name()));
    }
    let channel = |name: &str| -> Result<f64, InterpreterError> {
        match item.find_item(name) {
            Some(c) => c.real_value(line),
            None => Err(InterpreterError::type_error(line, "color", tag.name())),
        }
    };
    Ok(Rgba::new(channel("red")?, channel("green")?, channel("blue")?, channel("alpha")?))
}

pub fn members(heap: &Heap, red: f64, green: f64, blue: f64, alpha: f64) -> Members {
    let mut m = Members::new();
    for (name, value) in CHANNELS.iter().zip([red, green, blue, alpha]) {
        m.set(*name, Item::real(heap, value));
    }

    let lerp = NativeFunction::arity2("Lerp", |ctx, frame, other, t| {
        let this = read(frame.this()?, frame.line)?;
        let other = read(other, frame.line)?;
        let t = t.real_value(frame.line)?;
        Ok(this.lerp(other, t).into_item(ctx.heap()))
    });
    let blend = NativeFunction::arity1("Blend", |ctx, frame, source| {
        let this = read(frame.this()?, frame.line)?;
        let source = read(source, frame.line)?;
        Ok(this.blend(source).into_item(ctx.heap()))
    });
    m.set("Lerp", Item::function(heap, Rc::new(lerp)));
    m.set("Blend", Item::function(heap, Rc::new(blend)));
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("ff0000"), Some(Rgba::new(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(parse_hex("00000000"), Some(Rgba::new(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(parse_hex("fff"), None);
        assert_eq!(parse_hex("gg0000"), None);
    }

    #[test]
    fn lerp_is_clamped() {
        let black = Rgba::new(0.0, 0.0, 0.0, 1.0);
        let white = Rgba::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(black.lerp(white, 0.5), Rgba::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(black.lerp(white, 2.0), white);
    }

    #[test]
    fn blend_opaque_source_wins() {
        let dst = Rgba::new(0.0, 0.0, 1.0, 1.0);
        let src = Rgba::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(dst.blend(src), src);
    }

    #[test]
    fn blend_half_transparent() {
        let dst = Rgba::new(0.0, 0.0, 0.0, 1.0);
        let src = Rgba::new(1.0, 1.0, 1.0, 0.5);
        assert_eq!(dst.blend(src), Rgba::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn read_rejects_other_types() {
        let heap = Heap::new(1 << 16, true);
        let err = read(&Item::integer(&heap, 1), 3).unwrap_err();
        assert_eq!(err.line, 3);
    }
}
