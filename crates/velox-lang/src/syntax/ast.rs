use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// ─── Declarations ────────────────────────────────────────────────────────────

/// `function name(a, b) { ... }`
#[derive(Debug)]
pub struct FnDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `class Name { var field = e  function Name(...) { } ... }`
#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
    pub methods: Vec<Rc<FnDef>>,
    pub span: Span,
}

#[derive(Debug)]
pub struct FieldDef {
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `var x` or `var x = e`
    Var(VarDecl),
    /// `global x` or `global x = e`
    Global(VarDecl),
    /// `x = e`, `p.x += e`, `list[i] = e`
    Assign(Assign),
    /// `if ... { } else if ... { } else { }`
    If(IfStmt),
    /// `while cond { }`
    While(WhileStmt),
    /// `for var i = 0; i < n; i += 1 { }`
    For(ForStmt),
    /// `foreach v in list { }`
    Foreach(ForeachStmt),
    /// `return expr` or bare `return`
    Return(Option<Expr>, Span),
    Break(Span),
    Continue(Span),
    /// `{ ... }` on its own.
    Block(Vec<Stmt>, Span),
    Function(Rc<FnDef>),
    Class(Rc<ClassDef>),
    /// A standalone expression used as a statement (e.g. a function call).
    Expr(Expr),
}

impl Stmt {
    pub fn line(&self) -> usize {
        match self {
            Stmt::Var(d) | Stmt::Global(d) => d.span.line,
            Stmt::Assign(a)       => a.span.line,
            Stmt::If(s)           => s.span.line,
            Stmt::While(s)        => s.span.line,
            Stmt::For(s)          => s.span.line,
            Stmt::Foreach(s)      => s.span.line,
            Stmt::Return(_, s)    => s.line,
            Stmt::Break(s)        => s.line,
            Stmt::Continue(s)     => s.line,
            Stmt::Block(_, s)     => s.line,
            Stmt::Function(f)     => f.span.line,
            Stmt::Class(c)        => c.span.line,
            Stmt::Expr(e)         => e.span().line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Assign {
    /// An `Ident`, `Member` or `Index` expression.
    pub target: Expr,
    /// `Some(op)` for compound assignment (`+=` etc.).
    pub op: Option<BinOp>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Vec<Stmt>,
    /// `else if` chains nest as a single `If` statement here.
    pub else_block: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub step: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForeachStmt {
    pub var_name: String,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Integer(i64, Span),
    Real(f64, Span),
    Bool(bool, Span),
    StringLit(String, Span),
    HexColor(String, Span),
    Undefined(Span),
    This(Span),
    Ident(String, Span),

    /// `a + b`, `a == b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `not x`, `-x`
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `callee(args)`; `callee` is any expression, usually an ident or member.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },

    /// `expr.name`
    Member {
        object: Box<Expr>,
        name: String,
        span: Span,
    },

    /// `expr[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `[1, 2, 3]`
    List(Vec<Expr>, Span),

    /// `new Point(1, 2)`
    New {
        type_name: String,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Integer(_, s)      => s,
            Expr::Real(_, s)         => s,
            Expr::Bool(_, s)         => s,
            Expr::StringLit(_, s)    => s,
            Expr::HexColor(_, s)     => s,
            Expr::Undefined(s)       => s,
            Expr::This(s)            => s,
            Expr::Ident(_, s)        => s,
            Expr::Binary { span, .. } => span,
            Expr::Unary { span, .. }  => span,
            Expr::Call { span, .. }   => span,
            Expr::Member { span, .. } => span,
            Expr::Index { span, .. }  => span,
            Expr::List(_, s)         => s,
            Expr::New { span, .. }    => span,
        }
    }

    /// Whether the expression names a storage location.
    pub fn is_place(&self) -> bool {
        matches!(self, Expr::Ident(..) | Expr::Member { .. } | Expr::Index { .. })
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add, Sub, Mul, Div, Mod,
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
    And, Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add   => "+",
            BinOp::Sub   => "-",
            BinOp::Mul   => "*",
            BinOp::Div   => "/",
            BinOp::Mod   => "%",
            BinOp::Eq    => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt    => "<",
            BinOp::LtEq  => "<=",
            BinOp::Gt    => ">",
            BinOp::GtEq  => ">=",
            BinOp::And   => "and",
            BinOp::Or    => "or",
        }
    }

    pub fn is_ordering(self) -> bool {
        matches!(self, BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not",
        }
    }
}
