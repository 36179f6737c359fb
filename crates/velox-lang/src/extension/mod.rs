//! Extension bridge: typed adapters that expose host functions and host
//! types to scripts.
//!
//! ```ignore
//! struct Counter { n: i64 }
//!
//! ExtensionBuilder::<Counter>::new("Counter")
//!     .constructor1(|start: i64| Counter { n: start })
//!     .method0("Next", |c: &mut Counter| { c.n += 1; c.n })
//!     .build(&mut interpreter)?;
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::{ErrorKind, InterpreterError, SetupError};
use crate::memory::Heap;
use crate::runtime::context::Context;
use crate::runtime::function::{CallFrame, InterpreterFunction, NativeFunction};
use crate::runtime::interpreter::Interpreter;
use crate::runtime::item::Item;
use crate::runtime::object_type::{HostFactory, ObjectType};

// ─── Conversions ──────────────────────────────────────────────────────────────

/// Read a host value out of a script Item.
pub trait FromItem: Sized {
    fn from_item(item: &Item, line: usize) -> Result<Self, InterpreterError>;
}

/// Turn a host value into a fresh script Item.
pub trait IntoItem {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError>;
}

impl FromItem for i64 {
    fn from_item(item: &Item, line: usize) -> Result<Self, InterpreterError> {
        item.integer_value(line)
    }
}

impl FromItem for i32 {
    fn from_item(item: &Item, line: usize) -> Result<Self, InterpreterError> {
        i32::try_from(item.integer_value(line)?).map_err(|_| InterpreterError::new(line, ErrorKind::IntegerOverflow))
    }
}

impl FromItem for f64 {
    fn from_item(item: &Item, line: usize) -> Result<Self, InterpreterError> {
        item.real_value(line)
    }
}

impl FromItem for bool {
    fn from_item(item: &Item, line: usize) -> Result<Self, InterpreterError> {
        item.boolean_value(line)
    }
}

impl FromItem for String {
    fn from_item(item: &Item, _line: usize) -> Result<Self, InterpreterError> {
        Ok(item.string_value())
    }
}

impl FromItem for Item {
    fn from_item(item: &Item, _line: usize) -> Result<Self, InterpreterError> {
        Ok(item.clone())
    }
}

impl IntoItem for i64 {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::integer(heap, self))
    }
}

impl IntoItem for i32 {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::integer(heap, i64::from(self)))
    }
}

impl IntoItem for f64 {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::real(heap, self))
    }
}

impl IntoItem for bool {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::boolean(heap, self))
    }
}

impl IntoItem for String {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::string(heap, self))
    }
}

impl IntoItem for &str {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::string(heap, self))
    }
}

impl IntoItem for Item {
    fn into_item(self, _heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(self)
    }
}

impl IntoItem for () {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        Ok(Item::undefined(heap))
    }
}

impl<T: IntoItem> IntoItem for Result<T, InterpreterError> {
    fn into_item(self, heap: &Heap) -> Result<Item, InterpreterError> {
        self?.into_item(heap)
    }
}

// ─── Free functions ───────────────────────────────────────────────────────────

const PARAMS: [&str; 3] = ["a", "b", "c"];

fn arg<A: FromItem>(frame: &CallFrame, index: usize) -> Result<A, InterpreterError> {
    match frame.arg(index) {
        Some(item) => A::from_item(item, frame.line),
        None => Err(InterpreterError::host(frame.line, format!("missing argument {}", index + 1))),
    }
}

pub fn function0<R, F>(name: &str, f: F) -> NativeFunction
where
    R: IntoItem,
    F: Fn() -> R + 'static,
{
    NativeFunction::new(name, &[], move |ctx, _| f().into_item(ctx.heap()).map(Some))
}

pub fn function1<A, R, F>(name: &str, f: F) -> NativeFunction
where
    A: FromItem,
    R: IntoItem,
    F: Fn(A) -> R + 'static,
{
    NativeFunction::new(name, &PARAMS[..1], move |ctx, frame| {
        f(arg(frame, 0)?).into_item(ctx.heap()).map(Some)
    })
}

pub fn function2<A, B, R, F>(name: &str, f: F) -> NativeFunction
where
    A: FromItem,
    B: FromItem,
    R: IntoItem,
    F: Fn(A, B) -> R + 'static,
{
    NativeFunction::new(name, &PARAMS[..2], move |ctx, frame| {
        f(arg(frame, 0)?, arg(frame, 1)?).into_item(ctx.heap()).map(Some)
    })
}

pub fn function3<A, B, C, R, F>(name: &str, f: F) -> NativeFunction
where
    A: FromItem,
    B: FromItem,
    C: FromItem,
    R: IntoItem,
    F: Fn(A, B, C) -> R + 'static,
{
    NativeFunction::new(name, &PARAMS[..3], move |ctx, frame| {
        f(arg(frame, 0)?, arg(frame, 1)?, arg(frame, 2)?).into_item(ctx.heap()).map(Some)
    })
}

// ─── Host types ───────────────────────────────────────────────────────────────

/// Builds an `ObjectType` whose instances carry a `T`.
pub struct ExtensionBuilder<T> {
    name: Rc<str>,
    factory: Option<Rc<HostFactory>>,
    methods: Vec<NativeFunction>,
    _data: PhantomData<fn() -> T>,
}

impl<T: Any> ExtensionBuilder<T> {
    pub fn new(name: &str) -> Self {
        Self { name: name.into(), factory: None, methods: Vec::new(), _data: PhantomData }
    }

    fn with_factory(
        mut self,
        arity: usize,
        build: impl Fn(&[Item], usize) -> Result<T, InterpreterError> + 'static,
    ) -> Self {
        let name = self.name.clone();
        self.factory = Some(host_factory(move |_ctx, args, line| {
            if args.len() > arity {
                return Err(InterpreterError::new(line, ErrorKind::ArityMismatch {
                    function: name.to_string(),
                    expected: arity,
                    got: args.len(),
                }));
            }
            let data: Rc<RefCell<dyn Any>> = Rc::new(RefCell::new(build(args, line)?));
            Ok(data)
        }));
        self
    }

    pub fn constructor0(self, f: impl Fn() -> T + 'static) -> Self {
        self.with_factory(0, move |_, _| Ok(f()))
    }

    pub fn constructor1<A: FromItem>(self, f: impl Fn(A) -> T + 'static) -> Self {
        self.with_factory(1, move |args, line| Ok(f(ctor_arg(args, 0, line)?)))
    }

    pub fn constructor2<A: FromItem, B: FromItem>(self, f: impl Fn(A, B) -> T + 'static) -> Self {
        self.with_factory(2, move |args, line| Ok(f(ctor_arg(args, 0, line)?, ctor_arg(args, 1, line)?)))
    }

    pub fn constructor3<A: FromItem, B: FromItem, C: FromItem>(self, f: impl Fn(A, B, C) -> T + 'static) -> Self {
        self.with_factory(3, move |args, line| {
            Ok(f(ctor_arg(args, 0, line)?, ctor_arg(args, 1, line)?, ctor_arg(args, 2, line)?))
        })
    }

    fn with_method(
        mut self,
        name: &str,
        params: &[&str],
        call: impl Fn(&mut T, &CallFrame) -> Result<Result<Item, InterpreterError>, InterpreterError> + 'static,
    ) -> Self {
        let type_name = self.name.clone();
        let method_name = name.to_string();
        let method = NativeFunction::new(name, params, move |_ctx, frame| {
            let this = frame.this()?;
            let result = this.with_host(|data: &mut T| call(data, frame)).ok_or_else(|| {
                InterpreterError::host(
                    frame.line,
                    format!("`{type_name}.{method_name}` called on `{}`", this.type_name()),
                )
            })?;
            result?.map(Some)
        });
        self.methods.push(method);
        self
    }

    pub fn method0<R: IntoItem>(self, name: &str, f: impl Fn(&mut T) -> R + 'static) -> Self {
        self.with_method(name, &[], move |data, frame| {
            Ok(f(data).into_item(frame_heap(frame)?))
        })
    }

    pub fn method1<A: FromItem, R: IntoItem>(self, name: &str, f: impl Fn(&mut T, A) -> R + 'static) -> Self {
        self.with_method(name, &PARAMS[..1], move |data, frame| {
            let a = arg(frame, 0)?;
            Ok(f(data, a).into_item(frame_heap(frame)?))
        })
    }

    pub fn method2<A: FromItem, B: FromItem, R: IntoItem>(
        self,
        name: &str,
        f: impl Fn(&mut T, A, B) -> R + 'static,
    ) -> Self {
        self.with_method(name, &PARAMS[..2], move |data, frame| {
            let (a, b) = (arg(frame, 0)?, arg(frame, 1)?);
            Ok(f(data, a, b).into_item(frame_heap(frame)?))
        })
    }

    pub fn method3<A: FromItem, B: FromItem, C: FromItem, R: IntoItem>(
        self,
        name: &str,
        f: impl Fn(&mut T, A, B, C) -> R + 'static,
    ) -> Self {
        self.with_method(name, &PARAMS[..3], move |data, frame| {
            let (a, b, c) = (arg(frame, 0)?, arg(frame, 1)?, arg(frame, 2)?);
            Ok(f(data, a, b, c).into_item(frame_heap(frame)?))
        })
    }

    /// Register the type with `interpreter`.
    pub fn build(self, interpreter: &mut Interpreter) -> Result<(), SetupError> {
        let factory = match self.factory {
            Some(factory) => factory,
            None => {
                let name = self.name.clone();
                host_factory(move |_ctx, _args, line| {
                    Err(InterpreterError::host(line, format!("`{name}` cannot be constructed from scripts")))
                })
            }
        };
        let mut ty = ObjectType::with_host_factory(self.name.clone(), factory);
        for method in self.methods {
            let name = method.name().to_string();
            ty.add_member(name, Item::function(interpreter.heap(), Rc::new(method)))?;
        }
        tracing::debug!(name = %self.name, "build extension type");
        interpreter.add_object_type(ty)
    }
}

fn host_factory(
    f: impl Fn(&mut Context, &[Item], usize) -> Result<Rc<RefCell<dyn Any>>, InterpreterError> + 'static,
) -> Rc<HostFactory> {
    Rc::new(f)
}

fn ctor_arg<A: FromItem>(args: &[Item], index: usize, line: usize) -> Result<A, InterpreterError> {
    match args.get(index) {
        Some(item) => A::from_item(item, line),
        None => Err(InterpreterError::host(line, format!("missing constructor argument {}", index + 1))),
    }
}

/// The receiver's heap; results are allocated where the receiver lives.
fn frame_heap(frame: &CallFrame) -> Result<&Heap, InterpreterError> {
    Ok(frame.this()?.heap())
}
