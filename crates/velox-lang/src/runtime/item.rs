//! The script value cell.
//!
//! An `Item` is a shared handle to one mutable `State`. Handles are
//! reference counted; the link to the owning Item is weak and only used to
//! resolve `this` for method calls. Every cell and every state is charged to
//! the interpreter's arena for as long as it lives.

use std::any::Any;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{ErrorKind, InterpreterError, SetupError};
use crate::memory::{self, Allocation, Heap};
use crate::runtime::context::Context;
use crate::runtime::function::{self, InterpreterFunction};
use crate::runtime::members::Members;
use crate::runtime::state::{HostState, ListState, ObjectState, State};
use crate::types::{color, list, vector2, TypeTag};

struct ItemCell {
    state: RefCell<State>,
    state_alloc: RefCell<Allocation>,
    parent: RefCell<Weak<ItemCell>>,
    cell_alloc: Allocation,
}

#[derive(Clone)]
pub struct Item(Rc<ItemCell>);

impl Item {
    pub fn new(heap: &Heap, state: State) -> Self {
        let state_alloc = Allocation::new(heap, state.footprint());
        let item = Item(Rc::new(ItemCell {
            state: RefCell::new(state),
            state_alloc: RefCell::new(state_alloc),
            parent: RefCell::new(Weak::new()),
            cell_alloc: Allocation::new(heap, std::mem::size_of::<ItemCell>()),
        }));
        item.adopt_members();
        item
    }

    // ─── Factories ────────────────────────────────────────────────────────────

    pub fn undefined(heap: &Heap) -> Self {
        Self::new(heap, State::Undefined)
    }

    pub fn integer(heap: &Heap, value: i64) -> Self {
        Self::new(heap, State::Integer(value))
    }

    pub fn real(heap: &Heap, value: f64) -> Self {
        Self::new(heap, State::Real(value))
    }

    pub fn boolean(heap: &Heap, value: bool) -> Self {
        Self::new(heap, State::Boolean(value))
    }

    pub fn string(heap: &Heap, value: impl Into<String>) -> Self {
        Self::new(heap, State::String(value.into()))
    }

    pub fn color(heap: &Heap, red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self::new(heap, State::Color(color::members(heap, red, green, blue, alpha)))
    }

    pub fn vector2(heap: &Heap, x: f64, y: f64) -> Self {
        Self::new(heap, State::Vector2(vector2::members(heap, x, y)))
    }

    /// A list holding `elements` as they are; callers pass fresh Items.
    pub fn list(heap: &Heap, elements: Vec<Item>) -> Self {
        Self::new(heap, State::List(ListState { elements, members: list::members(heap) }))
    }

    pub fn object(heap: &Heap, type_name: impl Into<Rc<str>>, members: Members) -> Self {
        Self::new(heap, State::Object(ObjectState { type_name: type_name.into(), members }))
    }

    pub fn function(heap: &Heap, function: Rc<dyn InterpreterFunction>) -> Self {
        Self::new(heap, State::Function(function))
    }

    /// Alias of `target`; chains collapse to the final target.
    pub fn reference(heap: &Heap, target: &Item) -> Self {
        Self::new(heap, State::Reference(target.target()))
    }

    pub fn host<T: Any>(heap: &Heap, type_name: impl Into<Rc<str>>, data: T, members: Members) -> Self {
        Self::new(heap, State::Host(HostState {
            type_name: type_name.into(),
            data: Rc::new(RefCell::new(data)),
            members,
        }))
    }

    // ─── Identity ─────────────────────────────────────────────────────────────

    pub fn heap(&self) -> &Heap {
        self.0.cell_alloc.heap()
    }

    pub fn ptr_eq(&self, other: &Item) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn state(&self) -> Ref<'_, State> {
        self.0.state.borrow()
    }

    pub fn type_tag(&self) -> TypeTag {
        self.0.state.borrow().tag()
    }

    pub fn is_undefined(&self) -> bool {
        matches!(*self.0.state.borrow(), State::Undefined)
    }

    /// The Item a chain of references ends at; `self` when not a reference.
    pub fn target(&self) -> Item {
        let mut current = self.clone();
        loop {
            let next = match &*current.0.state.borrow() {
                State::Reference(target) => target.clone(),
                _ => break,
            };
            current = next;
        }
        current
    }

    /// Type name used in diagnostics: the object type for objects and host
    /// values, the tag name for everything else.
    pub fn type_name(&self) -> String {
        let target = self.target();
        let state = target.0.state.borrow();
        match &*state {
            State::Object(o) => o.type_name.to_string(),
            State::Host(h) => h.type_name.to_string(),
            other => other.tag().name().to_string(),
        }
    }

    pub fn parent(&self) -> Option<Item> {
        self.0.parent.borrow().upgrade().map(Item)
    }

    fn set_parent(&self, parent: &Item) {
        *self.0.parent.borrow_mut() = Rc::downgrade(&parent.0);
    }

    fn adopt_members(&self) {
        let state = self.0.state.borrow();
        if let Some(members) = state.members() {
            for child in members.items() {
                child.set_parent(self);
            }
        }
    }

    /// Swap in a new state, re-accounting its footprint. The old state is
    /// released after the borrow ends.
    fn replace_state(&self, state: State) {
        let alloc = Allocation::new(self.heap(), state.footprint());
        let old = std::mem::replace(&mut *self.0.state.borrow_mut(), state);
        let old_alloc = std::mem::replace(&mut *self.0.state_alloc.borrow_mut(), alloc);
        self.adopt_members();
        drop(old);
        drop(old_alloc);
    }

    /// Re-account the state after it changed size in place.
    fn recharge(&self) {
        let size = self.0.state.borrow().footprint();
        if memory::round_up(size) == self.0.state_alloc.borrow().size() {
            return;
        }
        let alloc = Allocation::new(self.heap(), size);
        let old_alloc = std::mem::replace(&mut *self.0.state_alloc.borrow_mut(), alloc);
        drop(old_alloc);
    }

    // ─── Assignment / copy ────────────────────────────────────────────────────

    /// Write `rhs` into this cell. Compatible states are updated in place so
    /// existing aliases observe the change; otherwise the state is replaced by
    /// a reference (lists, objects, host values) or a copy of `rhs`.
    pub fn assign(&self, rhs: &Item) {
        let rhs = rhs.target();
        if self.ptr_eq(&rhs) {
            return;
        }
        let accepted = {
            let source = rhs.0.state.borrow();
            self.0.state.borrow_mut().try_assign(&source)
        };
        if accepted {
            self.recharge();
            return;
        }
        let state = if rhs.type_tag().has_reference_semantics() {
            State::Reference(rhs)
        } else {
            rhs.0.state.borrow().copy()
        };
        self.replace_state(state);
    }

    /// Independent Item holding a value copy of this one's state.
    pub fn copy(&self) -> Item {
        let state = self.0.state.borrow().copy();
        Item::new(self.heap(), state)
    }

    // ─── Coercions ────────────────────────────────────────────────────────────

    pub fn real_value(&self, line: usize) -> Result<f64, InterpreterError> {
        self.0.state.borrow().real_value(line)
    }

    pub fn integer_value(&self, line: usize) -> Result<i64, InterpreterError> {
        self.0.state.borrow().integer_value(line)
    }

    pub fn boolean_value(&self, line: usize) -> Result<bool, InterpreterError> {
        self.0.state.borrow().boolean_value(line)
    }

    pub fn string_value(&self) -> String {
        self.render(&mut Vec::new())
    }

    /// A list that is already open further out renders as `[...]`, so a
    /// list holding a reference to itself still has a finite string form.
    pub(crate) fn render(&self, open: &mut Vec<Item>) -> String {
        let target = self.target();
        if target.type_tag() != TypeTag::List {
            return target.0.state.borrow().render(open);
        }
        if open.iter().any(|outer| outer.ptr_eq(&target)) {
            return "[...]".to_string();
        }
        open.push(target.clone());
        let text = target.0.state.borrow().render(open);
        open.pop();
        text
    }

    // ─── Members ──────────────────────────────────────────────────────────────

    /// Sub-item lookup through references. Every member access in the
    /// runtime goes through here: fields, methods, overloads and host members.
    pub fn find_item(&self, name: &str) -> Option<Item> {
        let target = self.target();
        let state = target.0.state.borrow();
        state.members().and_then(|m| m.get(name).cloned())
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.find_item(name).is_some()
    }

    /// Attach a new sub-item. The child's parent becomes this Item's target.
    pub fn add_item(&self, name: &str, item: Item) -> Result<(), SetupError> {
        let target = self.target();
        {
            let mut state = target.0.state.borrow_mut();
            let tag = state.tag();
            let members = state.members_mut().ok_or(SetupError::NotComposite(tag.name()))?;
            members.insert(name, item.clone())?;
        }
        item.set_parent(&target);
        Ok(())
    }

    /// Add a field to an object on first write. Only objects and host values
    /// grow new fields; built-in composites keep their fixed member set.
    pub(crate) fn add_field(&self, name: &str, line: usize) -> Result<Item, InterpreterError> {
        let target = self.target();
        if !matches!(target.type_tag(), TypeTag::Object | TypeTag::Host) {
            return Err(InterpreterError::new(line, ErrorKind::UnknownMember {
                type_name: target.type_name(),
                member: name.to_string(),
            }));
        }
        let field = Item::undefined(self.heap());
        target
            .add_item(name, field.clone())
            .map_err(|e| InterpreterError::host(line, e.to_string()))?;
        Ok(field)
    }

    /// Snapshot of the member map, released from the state borrow.
    pub fn member_entries(&self) -> Vec<(String, Item)> {
        let target = self.target();
        let state = target.0.state.borrow();
        state
            .members()
            .map(|m| m.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
            .unwrap_or_default()
    }

    // ─── Lists ────────────────────────────────────────────────────────────────

    /// Element handles of a list value, or `None` for any other type.
    pub fn elements(&self) -> Option<Vec<Item>> {
        let target = self.target();
        let state = target.0.state.borrow();
        match &*state {
            State::List(l) => Some(l.elements.clone()),
            _ => None,
        }
    }

    /// Run `f` against the element vector of a list value.
    pub fn with_elements<R>(
        &self,
        line: usize,
        f: impl FnOnce(&mut Vec<Item>) -> Result<R, InterpreterError>,
    ) -> Result<R, InterpreterError> {
        let target = self.target();
        let result = {
            let mut state = target.0.state.borrow_mut();
            match &mut *state {
                State::List(l) => f(&mut l.elements),
                other => return Err(InterpreterError::type_error(line, "list", other.tag().name())),
            }
        };
        target.recharge();
        result
    }

    // ─── Host data ────────────────────────────────────────────────────────────

    /// Run `f` against the attached host value if it is a `T`. `None` also
    /// when the value is already borrowed by an outer host call.
    pub fn with_host<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let data = {
            let target = self.target();
            let state = target.0.state.borrow();
            match &*state {
                State::Host(h) => h.data.clone(),
                _ => return None,
            }
        };
        let mut data = data.try_borrow_mut().ok()?;
        data.downcast_mut::<T>().map(f)
    }

    // ─── Calls ────────────────────────────────────────────────────────────────

    /// Invoke this Item as a function. When it is a member of another Item,
    /// that owner becomes `this`.
    pub fn call_as_function(&self, ctx: &mut Context, args: &[Item], line: usize) -> Result<Item, InterpreterError> {
        let target = self.target();
        let callee = match &*target.0.state.borrow() {
            State::Function(f) => f.clone(),
            other => return Err(InterpreterError::new(line, ErrorKind::NotCallable(other.tag().name()))),
        };
        let this = self.parent().or_else(|| target.parent());
        function::invoke(ctx, &callee, this, args, line)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => fmt::Debug::fmt(&*state, f),
            Err(_) => f.write_str("<borrowed>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap() -> Heap {
        Heap::new(1 << 20, true)
    }

    #[test]
    fn in_place_assign_keeps_aliases() {
        let heap = heap();
        let a = Item::integer(&heap, 1);
        let alias = a.clone();
        a.assign(&Item::integer(&heap, 9));
        assert_eq!(alias.integer_value(1).unwrap(), 9);
    }

    #[test]
    fn incompatible_assign_replaces_state() {
        let heap = heap();
        let a = Item::integer(&heap, 1);
        a.assign(&Item::string(&heap, "hello"));
        assert_eq!(a.type_tag(), TypeTag::String);
        a.assign(&Item::boolean(&heap, true));
        assert_eq!(a.type_tag(), TypeTag::Boolean);
    }

    #[test]
    fn lists_are_assigned_by_reference() {
        let heap = heap();
        let list = Item::list(&heap, vec![Item::integer(&heap, 1)]);
        let slot = Item::undefined(&heap);
        slot.assign(&list);
        assert_eq!(slot.type_tag(), TypeTag::Reference);
        assert!(slot.target().ptr_eq(&list));
    }

    #[test]
    fn self_assignment_is_noop() {
        let heap = heap();
        let list = Item::list(&heap, Vec::new());
        let alias = Item::reference(&heap, &list);
        list.assign(&alias);
        assert_eq!(list.type_tag(), TypeTag::List);
    }

    #[test]
    fn color_assign_writes_channels() {
        let heap = heap();
        let c = Item::color(&heap, 0.0, 0.0, 0.0, 1.0);
        let red = c.find_item("red").unwrap();
        c.assign(&Item::color(&heap, 1.0, 0.5, 0.25, 1.0));
        assert_eq!(red.real_value(1).unwrap(), 1.0);
        assert!(red.parent().unwrap().ptr_eq(&c));
    }

    #[test]
    fn copy_is_independent() {
        let heap = heap();
        let v = Item::vector2(&heap, 1.0, 2.0);
        let w = v.copy();
        w.find_item("x").unwrap().assign(&Item::real(&heap, 7.0));
        assert_eq!(v.find_item("x").unwrap().real_value(1).unwrap(), 1.0);
        assert_eq!(w.find_item("x").unwrap().real_value(1).unwrap(), 7.0);
    }

    #[test]
    fn add_item_rejects_duplicates_and_primitives() {
        let heap = heap();
        let obj = Item::object(&heap, "Thing", Members::new());
        obj.add_item("a", Item::integer(&heap, 1)).unwrap();
        assert_eq!(
            obj.add_item("a", Item::integer(&heap, 2)),
            Err(SetupError::DuplicateMember("a".into()))
        );
        let n = Item::integer(&heap, 1);
        assert_eq!(n.add_item("a", Item::undefined(&heap)), Err(SetupError::NotComposite("integer")));
        assert!(obj.find_item("a").unwrap().parent().unwrap().ptr_eq(&obj));
    }

    #[test]
    fn dropping_items_returns_memory() {
        let heap = heap();
        {
            let _list = Item::list(&heap, vec![Item::string(&heap, "abc"), Item::real(&heap, 1.0)]);
            assert!(heap.stats().live_allocations > 0);
        }
        assert_eq!(heap.stats().live_allocations, 0);
        assert_eq!(heap.stats().bytes_in_use, 0);
    }

    #[test]
    fn host_data_round_trip() {
        let heap = heap();
        let item = Item::host(&heap, "Counter", 41_i64, Members::new());
        assert_eq!(item.with_host(|n: &mut i64| { *n += 1; *n }), Some(42));
        assert_eq!(item.with_host(|s: &mut String| s.len()), None);
        assert_eq!(item.type_name(), "Counter");
    }
}
