//! Script Context: the state an executing script sees. Owns the arena, the
//! scope stack, registered object types and the operator table.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::config::InterpreterConfig;
use crate::error::{ErrorKind, InterpreterError, SetupError};
use crate::memory::Heap;
use crate::runtime::item::Item;
use crate::runtime::object_type::ObjectType;
use crate::runtime::scope::ScopeStack;
use crate::types::binop_registry::BinopRegistry;

pub struct Context {
    heap: Heap,
    config: InterpreterConfig,
    scopes: ScopeStack,
    object_types: FxHashMap<String, Rc<ObjectType>>,
    operators: BinopRegistry,
    output: Vec<String>,
    call_depth: usize,
}

impl Context {
    pub fn new(config: InterpreterConfig) -> Self {
        let heap = Heap::new(config.memory_budget, config.coalesce_free_blocks);
        Self {
            heap,
            config,
            scopes: ScopeStack::new(),
            object_types: FxHashMap::default(),
            operators: BinopRegistry::default(),
            output: Vec::new(),
            call_depth: 0,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }

    pub fn operators(&self) -> &BinopRegistry {
        &self.operators
    }

    // ─── Object types ─────────────────────────────────────────────────────────

    pub fn object_type(&self, name: &str) -> Option<Rc<ObjectType>> {
        self.object_types.get(name).cloned()
    }

    pub fn register_object_type(&mut self, ty: ObjectType) -> Result<(), SetupError> {
        if self.object_types.contains_key(ty.name()) {
            return Err(SetupError::DuplicateObjectType(ty.name().to_string()));
        }
        tracing::debug!(name = ty.name(), members = ty.members().len(), "register object type");
        self.object_types.insert(ty.name().to_string(), Rc::new(ty));
        Ok(())
    }

    /// Instantiate the registered type `name`.
    pub fn instantiate(&mut self, name: &str, args: &[Item], line: usize) -> Result<Item, InterpreterError> {
        let ty = self
            .object_type(name)
            .ok_or_else(|| InterpreterError::new(line, ErrorKind::UnknownObjectType(name.to_string())))?;
        ty.create_object(self, args, line)
    }

    // ─── Calls ────────────────────────────────────────────────────────────────

    pub fn enter_call(&mut self, line: usize) -> Result<(), InterpreterError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(InterpreterError::new(line, ErrorKind::CallDepthExceeded(self.config.max_call_depth)));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    // ─── Names ────────────────────────────────────────────────────────────────

    pub fn lookup(&self, name: &str, line: usize) -> Result<Item, InterpreterError> {
        self.scopes
            .find(name)
            .ok_or_else(|| InterpreterError::new(line, ErrorKind::UnknownIdentifier(name.to_string())))
    }

    /// Resolve a member by name. Fields, methods, operator overloads and
    /// host members are all found here.
    pub fn member(&self, item: &Item, name: &str, line: usize) -> Result<Item, InterpreterError> {
        item.find_item(name).ok_or_else(|| {
            InterpreterError::new(line, ErrorKind::UnknownMember {
                type_name: item.type_name(),
                member: name.to_string(),
            })
        })
    }

    // ─── Output ───────────────────────────────────────────────────────────────

    /// Record one line written by `print`.
    pub fn emit(&mut self, line: String) {
        tracing::trace!(%line, "script output");
        self.output.push(line);
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Unwind to the global scope after a failed run.
    pub fn reset(&mut self) {
        self.scopes.truncate(1);
        self.call_depth = 0;
    }
}
