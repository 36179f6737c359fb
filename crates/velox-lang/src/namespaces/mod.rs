//! Built-in global namespaces. Each namespace exports native functions and
//! constants that the interpreter binds into the global scope at startup.

use crate::memory::Heap;
use crate::runtime::context::Context;
use crate::runtime::function::{InterpreterFunction, NativeFunction};
use crate::runtime::item::Item;

pub mod core;

// ─── Export ───────────────────────────────────────────────────────────────────

pub enum Export {
    Function(NativeFunction),
    Constant(&'static str, Item),
}

impl Export {
    pub fn name(&self) -> &str {
        match self {
            Export::Function(f) => f.name(),
            Export::Constant(name, _) => name,
        }
    }
}

// ─── Namespace interface ──────────────────────────────────────────────────────

pub trait Namespace {
    fn name(&self) -> &'static str;

    /// Everything the namespace binds, allocated on `heap`.
    fn exports(&self, heap: &Heap) -> Vec<Export>;
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct NamespaceRegistry {
    namespaces: Vec<Box<dyn Namespace>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self { namespaces: Vec::new() }
    }

    pub fn register(&mut self, ns: Box<dyn Namespace>) {
        self.namespaces.push(ns);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Namespace> {
        self.namespaces.iter().find(|n| n.name() == name).map(|n| n.as_ref())
    }

    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(Box::new(core::CoreNamespace));
        r
    }

    /// Bind every export as a global. Later namespaces shadow earlier ones.
    pub fn install(&self, ctx: &mut Context) {
        for ns in &self.namespaces {
            let exports = ns.exports(ctx.heap());
            tracing::debug!(namespace = ns.name(), exports = exports.len(), "install namespace");
            for export in exports {
                let (name, item) = match export {
                    Export::Function(f) => (f.name().to_string(), f.into_item(ctx)),
                    Export::Constant(name, item) => (name.to_string(), item),
                };
                ctx.scopes_mut().declare_global(&name, item);
            }
        }
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
