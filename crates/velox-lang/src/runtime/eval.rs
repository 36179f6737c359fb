//! Tree-walking evaluator over the syntax tree.

use std::rc::Rc;

use crate::error::{ErrorKind, InterpreterError};
use crate::runtime::context::Context;
use crate::runtime::function::ScriptFunction;
use crate::runtime::item::Item;
use crate::runtime::object_type::ObjectType;
use crate::syntax::ast::*;
use crate::types::{color, list};

/// How a statement finished.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Item),
    Break,
    Continue,
}

/// Where an assignment writes.
enum Place {
    Existing(Item),
    /// An unknown identifier; declared in the innermost scope on write.
    NewLocal(String),
    /// A field the owner does not have yet; added only once the value is known.
    NewField(Item, String),
}

impl Context {
    // ─── Statements ───────────────────────────────────────────────────────────

    /// Run a whole program in the global scope. A top-level `return` stops it.
    pub fn exec_program(&mut self, program: &Program) -> Result<(), InterpreterError> {
        for stmt in &program.statements {
            if let Flow::Return(_) = self.exec_stmt(stmt)? {
                break;
            }
        }
        Ok(())
    }

    /// Run `stmts` in the current scope, stopping at the first non-normal flow.
    pub fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, InterpreterError> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run `stmts` in a fresh block scope. The scope is popped on every path.
    fn exec_scoped(&mut self, stmts: &[Stmt]) -> Result<Flow, InterpreterError> {
        let depth = self.scopes().depth();
        self.scopes_mut().push_block();
        let result = self.exec_block(stmts);
        self.scopes_mut().truncate(depth);
        result
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, InterpreterError> {
        let flow = self.dispatch_stmt(stmt)?;
        if self.heap().is_exhausted() {
            return Err(InterpreterError::new(stmt.line(), ErrorKind::ArenaExhausted));
        }
        Ok(flow)
    }

    fn dispatch_stmt(&mut self, stmt: &Stmt) -> Result<Flow, InterpreterError> {
        match stmt {
            Stmt::Var(decl) => {
                let value = self.eval_optional(decl.initializer.as_ref())?;
                let slot = list::slot(self.heap(), &value);
                self.scopes_mut().declare(&decl.name, slot);
            }

            Stmt::Global(decl) => {
                let value = decl.initializer.as_ref().map(|e| self.eval_expr(e)).transpose()?;
                let heap = self.heap().clone();
                let item = self.scopes_mut().bind_global(&heap, &decl.name);
                if let Some(value) = value {
                    item.assign(&value);
                }
            }

            Stmt::Assign(assign) => self.exec_assign(assign)?,

            Stmt::If(s) => {
                let flow = if self.eval_expr(&s.condition)?.boolean_value(s.span.line)? {
                    self.exec_scoped(&s.then_block)?
                } else if let Some(else_block) = &s.else_block {
                    self.exec_scoped(else_block)?
                } else {
                    Flow::Normal
                };
                return Ok(flow);
            }

            Stmt::While(s) => {
                while self.eval_expr(&s.condition)?.boolean_value(s.span.line)? {
                    match self.exec_scoped(&s.body)? {
                        Flow::Break => break,
                        Flow::Return(item) => return Ok(Flow::Return(item)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }

            Stmt::For(s) => {
                let depth = self.scopes().depth();
                self.scopes_mut().push_block();
                let result = self.exec_for(s);
                self.scopes_mut().truncate(depth);
                return result;
            }

            Stmt::Foreach(s) => {
                let iterable = self.eval_expr(&s.iterable)?;
                let elements = iterable.elements().ok_or_else(|| {
                    InterpreterError::type_error(s.span.line, "list", iterable.target().type_tag().name())
                })?;
                for element in elements {
                    let depth = self.scopes().depth();
                    self.scopes_mut().push_block();
                    let slot = list::slot(self.heap(), &element);
                    self.scopes_mut().declare(&s.var_name, slot);
                    let result = self.exec_block(&s.body);
                    self.scopes_mut().truncate(depth);
                    match result? {
                        Flow::Break => break,
                        Flow::Return(item) => return Ok(Flow::Return(item)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }

            Stmt::Return(value, _) => {
                let value = self.eval_optional(value.as_ref())?;
                return Ok(Flow::Return(value));
            }

            Stmt::Break(_) => return Ok(Flow::Break),
            Stmt::Continue(_) => return Ok(Flow::Continue),
            Stmt::Block(stmts, _) => return self.exec_scoped(stmts),

            Stmt::Function(def) => {
                tracing::debug!(name = %def.name, params = def.params.len(), "define function");
                let item = Item::function(self.heap(), Rc::new(ScriptFunction::new(def.clone())));
                self.scopes_mut().declare_global(&def.name, item);
            }

            Stmt::Class(def) => self.define_class(def)?,

            Stmt::Expr(expr) => {
                self.eval_expr(expr)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, s: &ForStmt) -> Result<Flow, InterpreterError> {
        if let Some(init) = &s.init {
            self.exec_stmt(init)?;
        }
        loop {
            if let Some(condition) = &s.condition {
                if !self.eval_expr(condition)?.boolean_value(s.span.line)? {
                    break;
                }
            }
            match self.exec_scoped(&s.body)? {
                Flow::Break => break,
                Flow::Return(item) => return Ok(Flow::Return(item)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(step) = &s.step {
                self.exec_stmt(step)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_assign(&mut self, assign: &Assign) -> Result<(), InterpreterError> {
        let line = assign.span.line;
        let place = self.resolve_place(&assign.target)?;
        let mut value = self.eval_expr(&assign.value)?;

        if let Some(op) = assign.op {
            let current = match &place {
                Place::Existing(item) => item.clone(),
                Place::NewLocal(name) => return Err(InterpreterError::new(line, ErrorKind::UnknownIdentifier(name.clone()))),
                Place::NewField(owner, name) => {
                    return Err(InterpreterError::new(line, ErrorKind::UnknownMember {
                        type_name: owner.type_name(),
                        member: name.clone(),
                    }));
                }
            };
            value = self.binary(op, &current, &value, line)?;
        }

        match place {
            Place::Existing(item) => item.assign(&value),
            Place::NewField(owner, name) => owner.add_field(&name, line)?.assign(&value),
            Place::NewLocal(name) => {
                let slot = list::slot(self.heap(), &value);
                self.scopes_mut().declare(&name, slot);
            }
        }
        Ok(())
    }

    fn resolve_place(&mut self, target: &Expr) -> Result<Place, InterpreterError> {
        let line = target.span().line;
        match target {
            Expr::Ident(name, _) => Ok(match self.scopes().find(name) {
                Some(item) => Place::Existing(item),
                None => Place::NewLocal(name.clone()),
            }),
            Expr::Member { object, name, .. } => {
                let owner = self.eval_expr(object)?;
                Ok(match owner.find_item(name) {
                    Some(field) => Place::Existing(field),
                    None => Place::NewField(owner, name.clone()),
                })
            }
            Expr::Index { object, index, .. } => {
                let list = self.eval_expr(object)?;
                let index = self.eval_expr(index)?.integer_value(line)?;
                Ok(Place::Existing(list::element(&list, index, line)?))
            }
            _ => Err(InterpreterError::new(line, ErrorKind::InvalidAssignTarget)),
        }
    }

    /// Register a script class. Field defaults are evaluated now and stored
    /// as independent prototypes.
    fn define_class(&mut self, def: &ClassDef) -> Result<(), InterpreterError> {
        let line = def.span.line;
        let setup = |e: crate::error::SetupError| InterpreterError::host(line, e.to_string());

        let mut ty = ObjectType::new(def.name.as_str());
        for field in &def.fields {
            let value = self.eval_optional(field.initializer.as_ref())?;
            ty.add_member(field.name.as_str(), value.target().copy()).map_err(setup)?;
        }
        for method in &def.methods {
            let item = Item::function(self.heap(), Rc::new(ScriptFunction::method(method.clone())));
            ty.add_member(method.name.as_str(), item).map_err(setup)?;
        }
        self.register_object_type(ty).map_err(setup)
    }

    // ─── Expressions ──────────────────────────────────────────────────────────

    fn eval_optional(&mut self, expr: Option<&Expr>) -> Result<Item, InterpreterError> {
        match expr {
            Some(e) => self.eval_expr(e),
            None => Ok(Item::undefined(self.heap())),
        }
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Item, InterpreterError> {
        let heap = self.heap().clone();
        match expr {
            Expr::Integer(n, _) => Ok(Item::integer(&heap, *n)),
            Expr::Real(r, _) => Ok(Item::real(&heap, *r)),
            Expr::Bool(b, _) => Ok(Item::boolean(&heap, *b)),
            Expr::StringLit(s, _) => Ok(Item::string(&heap, s.as_str())),
            Expr::HexColor(digits, span) => color::parse_hex(digits)
                .map(|c| c.into_item(&heap))
                .ok_or_else(|| InterpreterError::host(span.line, format!("invalid color literal `#{digits}`"))),
            Expr::Undefined(_) => Ok(Item::undefined(&heap)),
            Expr::This(span) => self.lookup("this", span.line),
            Expr::Ident(name, span) => self.lookup(name, span.line),

            Expr::Binary { left, op: op @ (BinOp::And | BinOp::Or), right, span } => {
                let lhs = self.eval_expr(left)?.boolean_value(span.line)?;
                let value = match (op, lhs) {
                    (BinOp::And, false) => false,
                    (BinOp::Or, true) => true,
                    _ => self.eval_expr(right)?.boolean_value(span.line)?,
                };
                Ok(Item::boolean(&heap, value))
            }
            Expr::Binary { left, op, right, span } => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                self.binary(*op, &lhs, &rhs, span.line)
            }

            Expr::Unary { op, operand, span } => {
                let operand = self.eval_expr(operand)?;
                self.unary(*op, &operand, span.line)
            }

            Expr::Call { callee, args, span } => {
                let function = self.eval_expr(callee)?;
                let args = self.eval_args(args)?;
                function.call_as_function(self, &args, span.line)
            }

            Expr::Member { object, name, span } => {
                let owner = self.eval_expr(object)?;
                self.member(&owner, name, span.line)
            }

            Expr::Index { object, index, span } => {
                let list = self.eval_expr(object)?;
                let index = self.eval_expr(index)?.integer_value(span.line)?;
                list::element(&list, index, span.line)
            }

            Expr::List(elements, _) => {
                let mut items = Vec::with_capacity(elements.len());
                for e in elements {
                    let value = self.eval_expr(e)?;
                    items.push(list::slot(&heap, &value));
                }
                Ok(Item::list(&heap, items))
            }

            Expr::New { type_name, args, span } => {
                let args = self.eval_args(args)?;
                self.instantiate(type_name, &args, span.line)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Item>, InterpreterError> {
        args.iter().map(|a| self.eval_expr(a)).collect()
    }
}
