use crate::error::{ErrorCode, SyntaxError};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<SyntaxError>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'+' => {
                if self.peek() == b'=' { self.advance(); TokenKind::PlusEq }
                else { TokenKind::Plus }
            }
            b'-' => {
                if self.peek() == b'=' { self.advance(); TokenKind::MinusEq }
                else { TokenKind::Minus }
            }
            b'*' => {
                if self.peek() == b'=' { self.advance(); TokenKind::StarEq }
                else { TokenKind::Star }
            }
            b'%' => TokenKind::Percent,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,

            b'/' => {
                if self.peek() == b'/' { self.skip_line(); return Ok(None); }
                else if self.peek() == b'*' { self.skip_block_comment(); return Ok(None); }
                else if self.peek() == b'=' { self.advance(); TokenKind::SlashEq }
                else { TokenKind::Slash }
            }
            b'=' => {
                if self.peek() == b'=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            b'!' => {
                if self.peek() == b'=' { self.advance(); TokenKind::BangEq }
                else {
                    return Err(SyntaxError::new(ErrorCode::L001, line, col,
                        "expected `!=`, use `not` for negation"));
                }
            }
            b'<' => {
                if self.peek() == b'=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            b'>' => {
                if self.peek() == b'=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }

            b'#' => {
                if self.is_hex_sequence() { TokenKind::HexColor(self.read_hex_color()) }
                else { self.skip_line(); return Ok(None); }
            }
            b'"' => TokenKind::StringLit(self.read_string(line, col)?),
            b'0'..=b'9' => self.read_number(ch, line, col)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => keyword_or_ident(self.read_ident(ch)),

            other => {
                return Err(SyntaxError::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{}`", other as char)));
            }
        };

        Ok(Some(Token::new(kind, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // consume *
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance(); // *
                self.advance(); // /
                break;
            }
            self.advance();
        }
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    /// Returns true when the next 6 bytes are hex digits not followed by more
    /// identifier characters, so `#ffffff` is a color and `#deadbeefcafe` is
    /// a comment.
    fn is_hex_sequence(&self) -> bool {
        let hex_run = self.source[self.pos..].iter().take_while(|b| b.is_ascii_hexdigit()).count();
        let end = self.pos + hex_run;
        let boundary = end >= self.source.len()
            || !(self.source[end].is_ascii_alphanumeric() || self.source[end] == b'_');
        (hex_run == 6 || hex_run == 8) && boundary
    }

    fn read_hex_color(&mut self) -> String {
        let mut s = String::with_capacity(8);
        while !self.is_at_end() && self.peek().is_ascii_hexdigit() {
            s.push(self.advance() as char);
        }
        s
    }

    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, SyntaxError> {
        let mut s = String::new();
        let mut error: Option<SyntaxError> = None;
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(SyntaxError::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal"));
            }
            let esc_line = self.line;
            let esc_col  = self.column;
            let ch = self.advance();
            if ch == b'"' { break; }
            if ch == b'\\' {
                match self.advance() {
                    b'n'  => s.push('\n'),
                    b't'  => s.push('\t'),
                    b'"'  => s.push('"'),
                    b'\\' => s.push('\\'),
                    other => {
                        // First bad escape is reported; keep consuming to the closing quote.
                        if error.is_none() {
                            error = Some(SyntaxError::new(ErrorCode::L003, esc_line, esc_col,
                                format!("unknown escape sequence `\\{}`", other as char)));
                        }
                    }
                }
            } else {
                // Multi-byte UTF-8 sequences are copied byte by byte.
                let start = self.pos - 1;
                let width = utf8_width(ch);
                for _ in 1..width {
                    if !self.is_at_end() { self.advance(); }
                }
                s.push_str(std::str::from_utf8(&self.source[start..self.pos]).unwrap_or("\u{fffd}"));
            }
        }
        if let Some(e) = error { return Err(e); }
        Ok(s)
    }

    fn read_number(&mut self, first: u8, line: usize, col: usize) -> Result<TokenKind, SyntaxError> {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance() as char);
        }
        // A `.` is only a decimal point when a digit follows, so `list.Count` and
        // `3.x` stay member accesses.
        if !self.is_at_end() && self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance() as char);
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance() as char);
            }
            return s.parse().map(TokenKind::Real).map_err(|_| {
                SyntaxError::new(ErrorCode::L001, line, col, format!("invalid real literal `{s}`"))
            });
        }
        s.parse().map(TokenKind::Integer).map_err(|_| {
            SyntaxError::new(ErrorCode::L004, line, col, format!("integer literal `{s}` out of range"))
        })
    }

    fn read_ident(&mut self, first: u8) -> String {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            s.push(self.advance() as char);
        }
        s
    }
}

fn utf8_width(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn lex_err(src: &str) -> Vec<SyntaxError> {
        Lexer::new(src).tokenize().unwrap_err()
    }

    #[test]
    fn empty() {
        assert_eq!(lex(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn integer_literal() {
        assert_eq!(lex("42"), vec![TokenKind::Integer(42), TokenKind::Eof]);
    }

    #[test]
    fn real_literal() {
        assert_eq!(lex("3.25"), vec![TokenKind::Real(3.25), TokenKind::Eof]);
    }

    #[test]
    fn dot_not_consumed_by_number() {
        assert_eq!(
            lex("s.x"),
            vec![TokenKind::Ident("s".into()), TokenKind::Dot, TokenKind::Ident("x".into()), TokenKind::Eof]
        );
        assert_eq!(
            lex("1.x"),
            vec![TokenKind::Integer(1), TokenKind::Dot, TokenKind::Ident("x".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn integer_overflow_error() {
        let errs = lex_err("99999999999999999999");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L004);
    }

    #[test]
    fn keywords() {
        assert_eq!(lex("var"),       vec![TokenKind::Var,       TokenKind::Eof]);
        assert_eq!(lex("global"),    vec![TokenKind::Global,    TokenKind::Eof]);
        assert_eq!(lex("function"),  vec![TokenKind::Function,  TokenKind::Eof]);
        assert_eq!(lex("class"),     vec![TokenKind::Class,     TokenKind::Eof]);
        assert_eq!(lex("foreach"),   vec![TokenKind::Foreach,   TokenKind::Eof]);
        assert_eq!(lex("undefined"), vec![TokenKind::Undefined, TokenKind::Eof]);
        assert_eq!(lex("this"),      vec![TokenKind::This,      TokenKind::Eof]);
    }

    #[test]
    fn bool_literals() {
        assert_eq!(lex("true"),  vec![TokenKind::Bool(true),  TokenKind::Eof]);
        assert_eq!(lex("false"), vec![TokenKind::Bool(false), TokenKind::Eof]);
    }

    #[test]
    fn compound_assignment_tokens() {
        assert_eq!(
            lex("+= -= *= /="),
            vec![TokenKind::PlusEq, TokenKind::MinusEq, TokenKind::StarEq, TokenKind::SlashEq, TokenKind::Eof]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(lex("=="), vec![TokenKind::EqEq,   TokenKind::Eof]);
        assert_eq!(lex("!="), vec![TokenKind::BangEq, TokenKind::Eof]);
        assert_eq!(lex("<="), vec![TokenKind::LtEq,   TokenKind::Eof]);
        assert_eq!(lex(">="), vec![TokenKind::GtEq,   TokenKind::Eof]);
    }

    #[test]
    fn line_comment_skipped() {
        assert_eq!(lex("// comment\n42"), vec![TokenKind::Integer(42), TokenKind::Eof]);
    }

    #[test]
    fn block_comment_skipped() {
        assert_eq!(lex("/* comment */42"), vec![TokenKind::Integer(42), TokenKind::Eof]);
        assert_eq!(lex("/* a\nb */42"), vec![TokenKind::Integer(42), TokenKind::Eof]);
    }

    #[test]
    fn hash_comment_skipped() {
        assert_eq!(lex("# note: ignore\n42"), vec![TokenKind::Integer(42), TokenKind::Eof]);
        assert_eq!(lex("#deadbeefcafe\n1"), vec![TokenKind::Integer(1), TokenKind::Eof]);
    }

    #[test]
    fn hex_color_6() {
        assert_eq!(lex("#ff0000"), vec![TokenKind::HexColor("ff0000".into()), TokenKind::Eof]);
    }

    #[test]
    fn hex_color_8() {
        assert_eq!(lex("#ff000080"), vec![TokenKind::HexColor("ff000080".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_literal() {
        assert_eq!(lex(r#""hello""#), vec![TokenKind::StringLit("hello".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_keeps_utf8() {
        assert_eq!(lex("\"héllo\""), vec![TokenKind::StringLit("héllo".into()), TokenKind::Eof]);
    }

    #[test]
    fn string_escape_newline() {
        assert_eq!(lex(r#""a\nb""#), vec![TokenKind::StringLit("a\nb".into()), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string_error() {
        let errs = lex_err(r#""oops"#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L002);
    }

    #[test]
    fn invalid_escape_error() {
        let errs = lex_err(r#""\q""#);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L003);
    }

    #[test]
    fn bare_bang_error() {
        let errs = lex_err("!");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].code, ErrorCode::L001);
    }

    #[test]
    fn errors_are_collected() {
        let errs = lex_err("@ $");
        assert_eq!(errs.len(), 2);
        assert_eq!((errs[1].line, errs[1].column), (1, 3));
    }

    #[test]
    fn line_and_column_tracking() {
        let tokens = Lexer::new("a\nb").tokenize().unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 1));
    }

    #[test]
    fn function_signature() {
        assert_eq!(
            lex("function add(a, b)"),
            vec![
                TokenKind::Function,
                TokenKind::Ident("add".into()),
                TokenKind::LParen,
                TokenKind::Ident("a".into()),
                TokenKind::Comma,
                TokenKind::Ident("b".into()),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn token_kind_helpers() {
        assert!(TokenKind::Plus.is_arithmetic());
        assert!(TokenKind::EqEq.is_comparison());
        assert!(TokenKind::And.is_logical());
        assert!(TokenKind::PlusEq.is_assign_op());
        assert!(TokenKind::Integer(1).is_literal());
        assert!(TokenKind::Class.is_keyword());
        assert!(!TokenKind::Ident("x".into()).is_keyword());
    }
}
