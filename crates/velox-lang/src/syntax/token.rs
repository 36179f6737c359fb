#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Integer(i64),
    Real(f64),
    Bool(bool),
    Ident(String),
    StringLit(String),
    HexColor(String), // digits only, "ff0000" or "ff0000ff"

    // Keywords
    Var,
    Global,
    Function,
    Class,
    New,
    Return,
    If,
    Else,
    While,
    For,
    Foreach,
    In,
    Break,
    Continue,
    And,
    Or,
    Not,
    This,
    Undefined,

    // Operators
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    PlusEq,     // +=
    MinusEq,    // -=
    StarEq,     // *=
    SlashEq,    // /=
    Eq,         // =
    EqEq,       // ==
    BangEq,     // !=
    Lt,         // <
    LtEq,       // <=
    Gt,         // >
    GtEq,       // >=

    // Punctuation
    Comma,      // ,
    Semicolon,  // ;
    Dot,        // .
    LParen,     // (
    RParen,     // )
    LBrace,     // {
    RBrace,     // }
    LBracket,   // [
    RBracket,   // ]

    Eof,
}

impl TokenKind {
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Integer(_) | Self::Real(_) | Self::Bool(_) | Self::StringLit(_) | Self::HexColor(_)
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus | Self::Star | Self::Slash | Self::Percent)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::EqEq | Self::BangEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Not)
    }

    pub fn is_assign_op(&self) -> bool {
        matches!(self, Self::Eq | Self::PlusEq | Self::MinusEq | Self::StarEq | Self::SlashEq)
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Var | Self::Global | Self::Function | Self::Class | Self::New | Self::Return
            | Self::If | Self::Else | Self::While | Self::For | Self::Foreach | Self::In
            | Self::Break | Self::Continue | Self::And | Self::Or | Self::Not | Self::This
            | Self::Undefined
        )
    }
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "var"       => TokenKind::Var,
        "global"    => TokenKind::Global,
        "function"  => TokenKind::Function,
        "class"     => TokenKind::Class,
        "new"       => TokenKind::New,
        "return"    => TokenKind::Return,
        "if"        => TokenKind::If,
        "else"      => TokenKind::Else,
        "while"     => TokenKind::While,
        "for"       => TokenKind::For,
        "foreach"   => TokenKind::Foreach,
        "in"        => TokenKind::In,
        "break"     => TokenKind::Break,
        "continue"  => TokenKind::Continue,
        "and"       => TokenKind::And,
        "or"        => TokenKind::Or,
        "not"       => TokenKind::Not,
        "this"      => TokenKind::This,
        "undefined" => TokenKind::Undefined,
        "true"      => TokenKind::Bool(true),
        "false"     => TokenKind::Bool(false),
        _           => TokenKind::Ident(s),
    }
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}
