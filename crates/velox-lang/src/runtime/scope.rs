//! Lexical environments. Scopes live on a stack; each one names its lookup
//! parent by index so a call scope can skip over its caller's locals.

use crate::memory::Heap;
use crate::runtime::item::Item;
use crate::runtime::members::Members;

pub type ScopeId = usize;

pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Default)]
pub struct Scope {
    bindings: Members,
    parent: Option<ScopeId>,
}

impl Scope {
    pub fn new(parent: Option<ScopeId>) -> Self {
        Self { bindings: Members::new(), parent }
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains(name)
    }

    /// Bind `name` in this scope, shadowing any outer binding.
    pub fn declare(&mut self, name: &str, item: Item) {
        self.bindings.set(name, item);
    }

    pub fn bindings(&self) -> &Members {
        &self.bindings
    }
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::new(None)] }
    }

    pub fn top(&self) -> ScopeId {
        self.scopes.len() - 1
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self, scope: Scope) -> ScopeId {
        self.scopes.push(scope);
        tracing::trace!(depth = self.scopes.len(), "push scope");
        self.top()
    }

    /// Push a scope that sees everything the current one sees.
    pub fn push_block(&mut self) -> ScopeId {
        let parent = self.top();
        self.push(Scope::new(Some(parent)))
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            tracing::trace!(depth = self.scopes.len(), "pop scope");
        }
    }

    /// Drop every scope above `depth`. Used to unwind after an error.
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }

    /// Resolve `name` from the innermost scope along the parent chain.
    pub fn find(&self, name: &str) -> Option<Item> {
        let mut id = Some(self.top());
        while let Some(i) = id {
            let scope = &self.scopes[i];
            if let Some(item) = scope.get(name) {
                return Some(item.clone());
            }
            id = scope.parent;
        }
        None
    }

    pub fn declare(&mut self, name: &str, item: Item) {
        let top = self.top();
        self.scopes[top].declare(name, item);
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.scopes[self.top()].contains(name)
    }

    pub fn global(&self, name: &str) -> Option<Item> {
        self.scopes[GLOBAL_SCOPE].get(name).cloned()
    }

    pub fn globals(&self) -> &Scope {
        &self.scopes[GLOBAL_SCOPE]
    }

    pub fn declare_global(&mut self, name: &str, item: Item) {
        self.scopes[GLOBAL_SCOPE].declare(name, item);
    }

    /// `global name`: a name already local to the current scope is returned
    /// as is; otherwise the global binding (created Undefined when missing)
    /// is bound into the current scope under the same name.
    pub fn bind_global(&mut self, heap: &Heap, name: &str) -> Item {
        let top = self.top();
        if top != GLOBAL_SCOPE {
            if let Some(local) = self.scopes[top].get(name) {
                return local.clone();
            }
        }
        let item = match self.global(name) {
            Some(item) => item,
            None => {
                let item = Item::undefined(heap);
                self.declare_global(name, item.clone());
                item
            }
        };
        if top != GLOBAL_SCOPE {
            self.scopes[top].declare(name, item.clone());
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_scope_sees_outer_bindings() {
        let heap = Heap::new(1 << 16, true);
        let mut stack = ScopeStack::new();
        stack.declare("x", Item::integer(&heap, 1));
        stack.push_block();
        assert_eq!(stack.find("x").unwrap().integer_value(1).unwrap(), 1);
        stack.declare("x", Item::integer(&heap, 2));
        assert_eq!(stack.find("x").unwrap().integer_value(1).unwrap(), 2);
        stack.pop();
        assert_eq!(stack.find("x").unwrap().integer_value(1).unwrap(), 1);
    }

    #[test]
    fn call_scope_skips_caller_locals() {
        let heap = Heap::new(1 << 16, true);
        let mut stack = ScopeStack::new();
        stack.push_block();
        stack.declare("local", Item::integer(&heap, 1));
        stack.push(Scope::new(Some(GLOBAL_SCOPE)));
        assert!(stack.find("local").is_none());
    }

    #[test]
    fn bind_global_shares_the_item() {
        let heap = Heap::new(1 << 16, true);
        let mut stack = ScopeStack::new();
        stack.push_block();
        let item = stack.bind_global(&heap, "counter");
        item.assign(&Item::integer(&heap, 5));
        assert_eq!(stack.global("counter").unwrap().integer_value(1).unwrap(), 5);
        assert!(stack.is_local("counter"));
    }

    #[test]
    fn global_scope_is_never_popped() {
        let mut stack = ScopeStack::new();
        stack.pop();
        assert_eq!(stack.depth(), 1);
        stack.push_block();
        stack.push_block();
        stack.truncate(0);
        assert_eq!(stack.depth(), 1);
    }
}
