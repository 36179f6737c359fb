//! Object templates. Script classes and host extensions both end up as an
//! `ObjectType`: a name plus ordered prototype members.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::{ErrorKind, InterpreterError, SetupError};
use crate::runtime::context::Context;
use crate::runtime::item::Item;
use crate::runtime::members::Members;
use crate::runtime::state::{HostState, State};

/// Builds the native data attached to a host object from constructor args.
pub type HostFactory = dyn Fn(&mut Context, &[Item], usize) -> Result<Rc<RefCell<dyn Any>>, InterpreterError>;

pub struct ObjectType {
    name: Rc<str>,
    members: Members,
    host_factory: Option<Rc<HostFactory>>,
}

impl ObjectType {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self { name: name.into(), members: Members::new(), host_factory: None }
    }

    /// A type whose instances carry host data built by `factory`.
    pub fn with_host_factory(name: impl Into<Rc<str>>, factory: Rc<HostFactory>) -> Self {
        Self { name: name.into(), members: Members::new(), host_factory: Some(factory) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn is_host(&self) -> bool {
        self.host_factory.is_some()
    }

    pub fn add_member(&mut self, name: impl Into<String>, prototype: Item) -> Result<(), SetupError> {
        self.members.insert(name, prototype)
    }

    /// Instantiate: deep-copy the prototypes into a fresh item, then run the
    /// member named like the type as constructor. A type without one takes
    /// no arguments.
    pub fn create_object(&self, ctx: &mut Context, args: &[Item], line: usize) -> Result<Item, InterpreterError> {
        let members = self.members.deep_copy();
        let heap = ctx.heap().clone();
        let object = match &self.host_factory {
            Some(factory) => {
                let data = factory(ctx, args, line)?;
                Item::new(&heap, State::Host(HostState { type_name: self.name.clone(), data, members }))
            }
            None => Item::object(&heap, self.name.clone(), members),
        };
        tracing::trace!(type_name = %self.name, args = args.len(), "create object");

        match object.find_item(&self.name) {
            Some(constructor) => {
                constructor.call_as_function(ctx, args, line)?;
            }
            None if self.host_factory.is_none() && !args.is_empty() => {
                return Err(InterpreterError::new(line, ErrorKind::ArityMismatch {
                    function: self.name.to_string(),
                    expected: 0,
                    got: args.len(),
                }));
            }
            None => {}
        }
        Ok(object)
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("members", &self.members.names().collect::<Vec<_>>())
            .field("host", &self.is_host())
            .finish()
    }
}
