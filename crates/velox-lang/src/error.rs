use thiserror::Error;

/// Syntax error codes prefixed by phase: L = lexer, P = parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence
    L004, // integer literal out of range

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // `break` / `continue` outside a loop
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::L004 => "L004",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("[{}] {line}:{column}: {message}", .code.as_str())]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─── Script faults ────────────────────────────────────────────────────────────

/// Everything a script can get wrong at runtime. Always recoverable: the
/// interpreter stays usable after one of these reaches the host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("type error: expected {expected}, got `{found}`")]
    TypeError { expected: &'static str, found: &'static str },

    #[error("undefined: `{0}`")]
    UnknownIdentifier(String),

    #[error("`{type_name}` has no member `{member}`")]
    UnknownMember { type_name: String, member: String },

    #[error("`{function}` expects at most {expected} argument(s), got {got}")]
    ArityMismatch { function: String, expected: usize, got: usize },

    #[error("unknown object type `{0}`")]
    UnknownObjectType(String),

    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("operator `{op}` not supported for `{lhs}` and `{rhs}`")]
    UnsupportedOperator { op: &'static str, lhs: &'static str, rhs: &'static str },

    #[error("unary `{op}` not supported on `{operand}`")]
    UnsupportedUnary { op: &'static str, operand: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("`{0}` is not callable")]
    NotCallable(&'static str),

    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),

    #[error("cannot assign to this expression")]
    InvalidAssignTarget,

    #[error("{0}")]
    HostError(String),

    /// Unwinds a script once the arena is poisoned; the interpreter reports
    /// it as `RuntimeError::OutOfMemory`.
    #[error("arena exhausted")]
    ArenaExhausted,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {line}] {kind}")]
pub struct InterpreterError {
    pub line: usize,
    pub kind: ErrorKind,
}

impl InterpreterError {
    pub fn new(line: usize, kind: ErrorKind) -> Self {
        Self { line, kind }
    }

    pub fn type_error(line: usize, expected: &'static str, found: &'static str) -> Self {
        Self::new(line, ErrorKind::TypeError { expected, found })
    }

    pub fn host(line: usize, message: impl Into<String>) -> Self {
        Self::new(line, ErrorKind::HostError(message.into()))
    }
}

// ─── Host setup faults ────────────────────────────────────────────────────────

/// Registration mistakes made by embedding code. Correct extension setup never
/// produces these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("object type `{0}` is already registered")]
    DuplicateObjectType(String),

    #[error("member `{0}` already exists")]
    DuplicateMember(String),

    #[error("global `{0}` already exists")]
    DuplicateGlobal(String),

    #[error("`{0}` is not a composite value and cannot hold members")]
    NotComposite(&'static str),
}

// ─── Execution outcome ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),

    /// The arena budget ran out. Fatal: the interpreter refuses further work.
    #[error("out of memory: {requested} byte(s) requested from a {budget} byte arena")]
    OutOfMemory { requested: usize, budget: usize },
}

impl RuntimeError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// The script fault, if this is one.
    pub fn as_interpreter(&self) -> Option<&InterpreterError> {
        match self {
            Self::Interpreter(e) => Some(e),
            Self::OutOfMemory { .. } => None,
        }
    }
}

/// Umbrella error for `Interpreter::run`, which both compiles and executes.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{} syntax error(s), first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Syntax(Vec<SyntaxError>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl From<Vec<SyntaxError>> for Error {
    fn from(errors: Vec<SyntaxError>) -> Self {
        Self::Syntax(errors)
    }
}

impl From<InterpreterError> for Error {
    fn from(e: InterpreterError) -> Self {
        Self::Runtime(RuntimeError::Interpreter(e))
    }
}
