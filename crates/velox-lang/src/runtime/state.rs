//! Per-type representation of an Item. The closed `State` enum decides the
//! dynamic type, the coercions, in-place assignment and value copying.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::InterpreterError;
use crate::runtime::function::InterpreterFunction;
use crate::runtime::item::Item;
use crate::runtime::members::Members;
use crate::types::TypeTag;

pub struct ListState {
    pub elements: Vec<Item>,
    pub members: Members,
}

pub struct ObjectState {
    pub type_name: Rc<str>,
    pub members: Members,
}

/// Opaque host data attached to a script value.
pub struct HostState {
    pub type_name: Rc<str>,
    pub data: Rc<RefCell<dyn Any>>,
    pub members: Members,
}

pub enum State {
    Undefined,
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
    List(ListState),
    Object(ObjectState),
    Function(Rc<dyn InterpreterFunction>),
    Reference(Item),
    /// `red/green/blue/alpha` fields plus methods.
    Color(Members),
    /// `x/y` fields plus methods.
    Vector2(Members),
    Host(HostState),
}

impl State {
    pub fn tag(&self) -> TypeTag {
        match self {
            State::Undefined    => TypeTag::Undefined,
            State::Integer(_)   => TypeTag::Integer,
            State::Real(_)      => TypeTag::Real,
            State::Boolean(_)   => TypeTag::Boolean,
            State::String(_)    => TypeTag::String,
            State::List(_)      => TypeTag::List,
            State::Object(_)    => TypeTag::Object,
            State::Function(_)  => TypeTag::Function,
            State::Reference(_) => TypeTag::Reference,
            State::Color(_)     => TypeTag::Color,
            State::Vector2(_)   => TypeTag::Vector2,
            State::Host(_)      => TypeTag::Host,
        }
    }

    /// Sub-item map of composite variants.
    pub fn members(&self) -> Option<&Members> {
        match self {
            State::List(l) => Some(&l.members),
            State::Object(o) => Some(&o.members),
            State::Host(h) => Some(&h.members),
            State::Color(m) | State::Vector2(m) => Some(m),
            _ => None,
        }
    }

    pub fn members_mut(&mut self) -> Option<&mut Members> {
        match self {
            State::List(l) => Some(&mut l.members),
            State::Object(o) => Some(&mut o.members),
            State::Host(h) => Some(&mut h.members),
            State::Color(m) | State::Vector2(m) => Some(m),
            _ => None,
        }
    }

    /// Bytes charged to the arena for this state.
    pub fn footprint(&self) -> usize {
        let extra = match self {
            State::String(s) => s.len(),
            State::List(l) => l.elements.capacity() * std::mem::size_of::<Item>(),
            _ => 0,
        };
        std::mem::size_of::<State>() + extra
    }

    // ─── Coercions ────────────────────────────────────────────────────────────

    pub fn real_value(&self, line: usize) -> Result<f64, InterpreterError> {
        match self {
            State::Integer(n) => Ok(*n as f64),
            State::Real(r) => Ok(*r),
            State::Reference(target) => target.real_value(line),
            other => Err(InterpreterError::type_error(line, "real", other.tag().name())),
        }
    }

    pub fn integer_value(&self, line: usize) -> Result<i64, InterpreterError> {
        match self {
            State::Integer(n) => Ok(*n),
            State::Real(r) => Ok(r.trunc() as i64),
            State::Reference(target) => target.integer_value(line),
            other => Err(InterpreterError::type_error(line, "integer", other.tag().name())),
        }
    }

    pub fn boolean_value(&self, line: usize) -> Result<bool, InterpreterError> {
        match self {
            State::Boolean(b) => Ok(*b),
            State::Integer(n) => Ok(*n != 0),
            State::Real(r) => Ok(*r != 0.0),
            State::Undefined => Ok(false),
            State::Reference(target) => target.boolean_value(line),
            other => Err(InterpreterError::type_error(line, "boolean", other.tag().name())),
        }
    }

    /// Every variant has a string form.
    pub fn string_value(&self) -> String {
        self.render(&mut Vec::new())
    }

    /// String form with `open` holding the lists already being rendered
    /// further out.
    pub(crate) fn render(&self, open: &mut Vec<Item>) -> String {
        match self {
            State::Undefined => "undefined".to_string(),
            State::Integer(n) => n.to_string(),
            State::Real(r) => r.to_string(),
            State::Boolean(b) => b.to_string(),
            State::String(s) => s.clone(),
            State::List(l) => {
                let parts: Vec<String> = l.elements.iter().map(|e| e.render(open)).collect();
                format!("[{}]", parts.join(", "))
            }
            State::Object(o) => format!("<{}>", o.type_name),
            State::Host(h) => format!("<{}>", h.type_name),
            State::Function(f) => format!("<function {}>", f.name()),
            State::Reference(target) => target.render(open),
            State::Color(m) => format!(
                "Color({}, {}, {}, {})",
                field_string(m, "red", open),
                field_string(m, "green", open),
                field_string(m, "blue", open),
                field_string(m, "alpha", open),
            ),
            State::Vector2(m) => format!("Vector2({}, {})", field_string(m, "x", open), field_string(m, "y", open)),
        }
    }

    // ─── Assignment / copy ────────────────────────────────────────────────────

    /// In-place assignment. Returns false when `rhs` is not compatible with
    /// the current variant; the caller then replaces the whole state.
    pub fn try_assign(&mut self, rhs: &State) -> bool {
        match (self, rhs) {
            (State::Integer(a), State::Integer(b)) => *a = *b,
            (State::Real(a), State::Real(b)) => *a = *b,
            (State::Real(a), State::Integer(b)) => *a = *b as f64,
            (State::Boolean(a), State::Boolean(b)) => *a = *b,
            (State::String(a), State::String(b)) => a.clone_from(b),
            (State::Color(a), State::Color(b)) => assign_fields(a, b, &crate::types::color::CHANNELS),
            (State::Vector2(a), State::Vector2(b)) => assign_fields(a, b, &crate::types::vector2::AXES),
            _ => return false,
        }
        true
    }

    /// Independent value copy. Functions and references are shared.
    pub fn copy(&self) -> State {
        match self {
            State::Undefined => State::Undefined,
            State::Integer(n) => State::Integer(*n),
            State::Real(r) => State::Real(*r),
            State::Boolean(b) => State::Boolean(*b),
            State::String(s) => State::String(s.clone()),
            State::List(l) => State::List(ListState {
                elements: l.elements.iter().map(Item::copy).collect(),
                members: l.members.deep_copy(),
            }),
            State::Object(o) => State::Object(ObjectState {
                type_name: o.type_name.clone(),
                members: o.members.deep_copy(),
            }),
            State::Host(h) => State::Host(HostState {
                type_name: h.type_name.clone(),
                data: h.data.clone(),
                members: h.members.deep_copy(),
            }),
            State::Function(f) => State::Function(f.clone()),
            State::Reference(target) => State::Reference(target.clone()),
            State::Color(m) => State::Color(m.deep_copy()),
            State::Vector2(m) => State::Vector2(m.deep_copy()),
        }
    }
}

fn assign_fields(dst: &Members, src: &Members, names: &[&str]) {
    for name in names {
        if let (Some(d), Some(s)) = (dst.get(name), src.get(name)) {
            d.assign(s);
        }
    }
}

fn field_string(members: &Members, name: &str, open: &mut Vec<Item>) -> String {
    members.get(name).map(|field| field.render(open)).unwrap_or_default()
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Undefined => f.write_str("Undefined"),
            State::Integer(n) => write!(f, "Integer({n})"),
            State::Real(r) => write!(f, "Real({r})"),
            State::Boolean(b) => write!(f, "Boolean({b})"),
            State::String(s) => write!(f, "String({s:?})"),
            State::List(l) => f.debug_tuple("List").field(&l.elements).finish(),
            State::Object(o) => f.debug_tuple("Object").field(&o.type_name).field(&o.members).finish(),
            State::Host(h) => f.debug_tuple("Host").field(&h.type_name).finish(),
            State::Function(func) => write!(f, "Function({})", func.name()),
            // Targets may point back at their owner.
            State::Reference(target) => write!(f, "Reference({})", target.type_tag()),
            State::Color(_) | State::Vector2(_) => f.write_str(&self.string_value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_accepts_integer_only() {
        let mut s = State::Integer(1);
        assert!(s.try_assign(&State::Integer(7)));
        assert!(matches!(s, State::Integer(7)));
        assert!(!s.try_assign(&State::Real(1.5)));
        assert!(!s.try_assign(&State::Boolean(true)));
        assert!(!s.try_assign(&State::String("x".into())));
    }

    #[test]
    fn real_widens_integer() {
        let mut s = State::Real(0.5);
        assert!(s.try_assign(&State::Integer(3)));
        assert!(matches!(s, State::Real(r) if r == 3.0));
    }

    #[test]
    fn coercions() {
        assert_eq!(State::Real(2.9).integer_value(1).unwrap(), 2);
        assert_eq!(State::Real(-2.9).integer_value(1).unwrap(), -2);
        assert_eq!(State::Integer(4).real_value(1).unwrap(), 4.0);
        assert!(!State::Undefined.boolean_value(1).unwrap());
        assert!(State::Real(0.1).boolean_value(1).unwrap());
        assert_eq!(State::Real(5.0).string_value(), "5");
        assert_eq!(State::Real(5.5).string_value(), "5.5");
    }

    #[test]
    fn coercion_failure_carries_line() {
        let err = State::String("a".into()).real_value(12).unwrap_err();
        assert_eq!(err.line, 12);
        assert_eq!(
            err.kind,
            crate::error::ErrorKind::TypeError { expected: "real", found: "string" }
        );
    }
}
