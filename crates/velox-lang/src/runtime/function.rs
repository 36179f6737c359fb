//! Callable values: the `InterpreterFunction` trait and its native and
//! script-defined implementations.

use std::fmt;
use std::rc::Rc;

use crate::error::{ErrorKind, InterpreterError};
use crate::runtime::context::Context;
use crate::runtime::eval::Flow;
use crate::runtime::item::Item;
use crate::runtime::scope::{Scope, ScopeId, GLOBAL_SCOPE};
use crate::syntax::ast::FnDef;

const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROW_BY: usize = 1024 * 1024;

/// What a function body sees of its invocation.
pub struct CallFrame {
    /// Owner of the called member, if any.
    pub this: Option<Item>,
    /// One Item per formal parameter, padded with Undefined.
    pub args: Vec<Item>,
    pub line: usize,
}

impl CallFrame {
    pub fn arg(&self, index: usize) -> Option<&Item> {
        self.args.get(index)
    }

    pub fn this(&self) -> Result<&Item, InterpreterError> {
        self.this
            .as_ref()
            .ok_or_else(|| InterpreterError::host(self.line, "method called without a receiver"))
    }
}

pub trait InterpreterFunction {
    fn name(&self) -> &str;

    fn formal_params(&self) -> &[String];

    /// Whether calls bind the owner's members by name for the body.
    fn binds_members(&self) -> bool {
        false
    }

    fn do_evaluate(&self, ctx: &mut Context, frame: &CallFrame) -> Result<Option<Item>, InterpreterError>;

    /// Check arity, bind parameters by assignment into a fresh scope whose
    /// lookup parent is `parent`, run the body, and pop the scope again.
    fn evaluate(
        &self,
        ctx: &mut Context,
        this: Option<Item>,
        args: &[Item],
        parent: ScopeId,
        line: usize,
    ) -> Result<Item, InterpreterError> {
        let formals = self.formal_params();
        if args.len() > formals.len() {
            return Err(InterpreterError::new(line, ErrorKind::ArityMismatch {
                function: self.name().to_string(),
                expected: formals.len(),
                got: args.len(),
            }));
        }

        let heap = ctx.heap().clone();
        let mut scope = Scope::new(Some(parent));
        let mut bound = Vec::with_capacity(formals.len());
        for (i, name) in formals.iter().enumerate() {
            let param = Item::undefined(&heap);
            if let Some(arg) = args.get(i) {
                param.assign(arg);
            }
            scope.declare(name, param.clone());
            bound.push(param);
        }

        let depth = ctx.scopes().depth();
        ctx.scopes_mut().push(scope);
        let frame = CallFrame { this, args: bound, line };
        let result = self.do_evaluate(ctx, &frame);
        ctx.scopes_mut().truncate(depth);

        Ok(result?.unwrap_or_else(|| Item::undefined(&heap)))
    }
}

impl fmt::Debug for dyn InterpreterFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

/// Call `function` with `this` as receiver. Methods that bind members get a
/// scope holding `this` and the owner's sub-items; everything else resolves
/// free names against the globals.
#[tracing::instrument(level = "trace", skip(ctx, function, this, args), fields(function = function.name()))]
pub fn invoke(
    ctx: &mut Context,
    function: &Rc<dyn InterpreterFunction>,
    this: Option<Item>,
    args: &[Item],
    line: usize,
) -> Result<Item, InterpreterError> {
    ctx.enter_call(line)?;
    let depth = ctx.scopes().depth();
    let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_BY, || {
        let parent = match (&this, function.binds_members()) {
            (Some(owner), true) => {
                let scope = member_scope(ctx, owner);
                ctx.scopes_mut().push(scope)
            }
            _ => GLOBAL_SCOPE,
        };
        function.evaluate(ctx, this, args, parent, line)
    });
    ctx.scopes_mut().truncate(depth);
    ctx.leave_call();
    result
}

fn member_scope(ctx: &Context, owner: &Item) -> Scope {
    let mut scope = Scope::new(Some(GLOBAL_SCOPE));
    for (name, member) in owner.member_entries() {
        scope.declare(&name, member);
    }
    scope.declare("this", Item::reference(ctx.heap(), owner));
    scope
}

// ─── Native functions ─────────────────────────────────────────────────────────

type NativeBody = dyn Fn(&mut Context, &CallFrame) -> Result<Option<Item>, InterpreterError>;

/// A host closure exposed as a script function.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    params: Vec<String>,
    body: Rc<NativeBody>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<String>,
        params: &[&str],
        body: impl Fn(&mut Context, &CallFrame) -> Result<Option<Item>, InterpreterError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body: Rc::new(body),
        }
    }

    pub fn arity0(
        name: impl Into<String>,
        body: impl Fn(&mut Context, &CallFrame) -> Result<Item, InterpreterError> + 'static,
    ) -> Self {
        Self::new(name, &[], move |ctx, frame| body(ctx, frame).map(Some))
    }

    pub fn arity1(
        name: impl Into<String>,
        body: impl Fn(&mut Context, &CallFrame, &Item) -> Result<Item, InterpreterError> + 'static,
    ) -> Self {
        Self::new(name, &["a"], move |ctx, frame| {
            let a = frame.args[0].clone();
            body(ctx, frame, &a).map(Some)
        })
    }

    pub fn arity2(
        name: impl Into<String>,
        body: impl Fn(&mut Context, &CallFrame, &Item, &Item) -> Result<Item, InterpreterError> + 'static,
    ) -> Self {
        Self::new(name, &["a", "b"], move |ctx, frame| {
            let (a, b) = (frame.args[0].clone(), frame.args[1].clone());
            body(ctx, frame, &a, &b).map(Some)
        })
    }

    pub fn arity3(
        name: impl Into<String>,
        body: impl Fn(&mut Context, &CallFrame, &Item, &Item, &Item) -> Result<Item, InterpreterError> + 'static,
    ) -> Self {
        Self::new(name, &["a", "b", "c"], move |ctx, frame| {
            let (a, b, c) = (frame.args[0].clone(), frame.args[1].clone(), frame.args[2].clone());
            body(ctx, frame, &a, &b, &c).map(Some)
        })
    }

    pub fn into_item(self, ctx: &Context) -> Item {
        Item::function(ctx.heap(), Rc::new(self))
    }
}

impl InterpreterFunction for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn formal_params(&self) -> &[String] {
        &self.params
    }

    fn do_evaluate(&self, ctx: &mut Context, frame: &CallFrame) -> Result<Option<Item>, InterpreterError> {
        (self.body)(ctx, frame)
    }
}

// ─── Script functions ─────────────────────────────────────────────────────────

/// A `function` declared in script source.
pub struct ScriptFunction {
    def: Rc<FnDef>,
    /// Declared inside a class body: calls see the owner's members.
    method: bool,
}

impl ScriptFunction {
    pub fn new(def: Rc<FnDef>) -> Self {
        Self { def, method: false }
    }

    pub fn method(def: Rc<FnDef>) -> Self {
        Self { def, method: true }
    }
}

impl InterpreterFunction for ScriptFunction {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn formal_params(&self) -> &[String] {
        &self.def.params
    }

    fn binds_members(&self) -> bool {
        self.method
    }

    fn do_evaluate(&self, ctx: &mut Context, _frame: &CallFrame) -> Result<Option<Item>, InterpreterError> {
        match ctx.exec_block(&self.def.body)? {
            Flow::Return(item) => Ok(Some(item)),
            _ => Ok(None),
        }
    }
}
