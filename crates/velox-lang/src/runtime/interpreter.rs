//! Embedding facade. One `Interpreter` owns one arena, one global scope and
//! one set of object types; independent instances share nothing.

use std::any::Any;
use std::rc::Rc;

use crate::config::InterpreterConfig;
use crate::error::{Error, ErrorKind, InterpreterError, RuntimeError, SetupError};
use crate::memory::{Heap, MemoryStats};
use crate::namespaces::NamespaceRegistry;
use crate::runtime::context::Context;
use crate::runtime::function::InterpreterFunction;
use crate::runtime::item::Item;
use crate::runtime::object_type::ObjectType;
use crate::syntax::ast::Program;

pub struct Interpreter {
    ctx: Context,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    /// A fresh interpreter with the standard namespaces installed.
    pub fn with_config(config: InterpreterConfig) -> Self {
        let mut ctx = Context::new(config);
        NamespaceRegistry::standard().install(&mut ctx);
        Self { ctx }
    }

    /// A fresh interpreter with no globals at all.
    pub fn bare(config: InterpreterConfig) -> Self {
        Self { ctx: Context::new(config) }
    }

    pub fn config(&self) -> &InterpreterConfig {
        self.ctx.config()
    }

    pub fn heap(&self) -> &Heap {
        self.ctx.heap()
    }

    pub fn context(&mut self) -> &mut Context {
        &mut self.ctx
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    pub fn add_global_function(
        &mut self,
        name: &str,
        function: impl InterpreterFunction + 'static,
    ) -> Result<(), SetupError> {
        let item = Item::function(self.ctx.heap(), Rc::new(function));
        self.add_global(name, item)
    }

    pub fn add_object_type(&mut self, ty: ObjectType) -> Result<(), SetupError> {
        self.ctx.register_object_type(ty)
    }

    pub fn add_global(&mut self, name: &str, item: Item) -> Result<(), SetupError> {
        if self.ctx.scopes().globals().contains(name) {
            return Err(SetupError::DuplicateGlobal(name.to_string()));
        }
        tracing::debug!(name, kind = %item.type_tag(), "add global");
        self.ctx.scopes_mut().declare_global(name, item);
        Ok(())
    }

    pub fn global(&self, name: &str) -> Option<Item> {
        self.ctx.scopes().global(name)
    }

    pub fn object_type(&self, name: &str) -> Option<Rc<ObjectType>> {
        self.ctx.object_type(name)
    }

    /// Wrap host data as an instance of the registered type `type_name`,
    /// carrying that type's members.
    pub fn wrap_host<T: Any>(&self, type_name: &str, data: T) -> Result<Item, InterpreterError> {
        let ty = self
            .ctx
            .object_type(type_name)
            .ok_or_else(|| InterpreterError::new(0, ErrorKind::UnknownObjectType(type_name.to_string())))?;
        Ok(Item::host(self.heap(), type_name, data, ty.members().deep_copy()))
    }

    // ─── Execution ────────────────────────────────────────────────────────────

    /// Run a compiled program against this interpreter's globals.
    pub fn execute(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.ensure_memory()?;
        tracing::debug!(statements = program.statements.len(), "execute");
        let result = self.ctx.exec_program(program);
        self.finish(result)
    }

    /// Compile and execute `source`.
    pub fn run(&mut self, source: &str) -> Result<(), Error> {
        let program = crate::compile(source)?;
        self.execute(&program)?;
        Ok(())
    }

    /// Call the global function `name` from the host.
    pub fn call_function(&mut self, name: &str, args: &[Item]) -> Result<Item, RuntimeError> {
        self.ensure_memory()?;
        let result = match self.ctx.scopes().global(name) {
            Some(function) => function.call_as_function(&mut self.ctx, args, 0),
            None => Err(InterpreterError::new(0, ErrorKind::UnknownIdentifier(name.to_string()))),
        };
        self.finish(result)
    }

    /// Lines written by `print` since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        self.ctx.take_output()
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.ctx.heap().stats()
    }

    pub fn is_poisoned(&self) -> bool {
        self.ctx.heap().is_exhausted()
    }

    fn ensure_memory(&self) -> Result<(), RuntimeError> {
        match self.ctx.heap().failed_request() {
            Some(requested) => Err(RuntimeError::OutOfMemory { requested, budget: self.ctx.heap().budget() }),
            None => Ok(()),
        }
    }

    /// Map a script outcome to the host-facing error. Any failure unwinds
    /// the scope stack; an exhausted arena overrides the script's own error.
    fn finish<T>(&mut self, result: Result<T, InterpreterError>) -> Result<T, RuntimeError> {
        let err = match result {
            Ok(value) => {
                self.ensure_memory()?;
                return Ok(value);
            }
            Err(err) => err,
        };
        self.ctx.reset();
        self.ensure_memory()?;
        if err.kind == ErrorKind::ArenaExhausted {
            return Err(RuntimeError::OutOfMemory { requested: 0, budget: self.ctx.heap().budget() });
        }
        tracing::debug!(line = err.line, error = %err.kind, "script error");
        Err(RuntimeError::Interpreter(err))
    }
}
