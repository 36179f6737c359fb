use std::rc::Rc;

use crate::error::{ErrorCode, SyntaxError};
use crate::syntax::ast::*;
use crate::syntax::token::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Number of enclosing loops within the current function body.
    loop_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, loop_depth: 0 }
    }

    pub fn parse(mut self) -> Result<Program, Vec<SyntaxError>> {
        let mut errors = Vec::new();
        let mut statements = Vec::new();

        while !self.is_at_end() {
            let pos_before = self.pos;

            match self.parse_stmt() {
                Ok(s) => statements.push(s),
                Err(e) => { errors.push(e); self.recover(); }
            }

            // guarantee progress; if nothing was consumed, force-advance
            // to prevent an infinite loop on unrecognised tokens
            if self.pos == pos_before {
                self.advance();
            }
        }

        if errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(errors)
        }
    }

    // ─── Declarations ────────────────────────────────────────────────────────

    fn parse_fn_def(&mut self) -> Result<Rc<FnDef>, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::Function)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;
        let params = self.parse_param_list()?;
        self.expect(TokenKind::RParen)?;

        // Loops do not extend across function boundaries.
        let outer_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_block();
        self.loop_depth = outer_loops;

        Ok(Rc::new(FnDef { name, params, body: body?, span }))
    }

    fn parse_param_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            params.push(self.expect_ident()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(params)
    }

    fn parse_class(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::Class)?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            match self.peek_kind() {
                TokenKind::Var => {
                    let field_span = self.span();
                    self.advance();
                    let field_name = self.expect_ident()?;
                    let initializer = if self.matches(TokenKind::Eq) { Some(self.parse_expr()?) } else { None };
                    fields.push(FieldDef { name: field_name, initializer, span: field_span });
                }
                TokenKind::Function => methods.push(self.parse_fn_def()?),
                TokenKind::Semicolon => { self.advance(); }
                _ => return Err(self.unexpected("`var` or `function` in class body")),
            }
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Class(Rc::new(ClassDef { name, fields, methods, span })))
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(stmts)
    }

    fn parse_loop_body(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        body
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let stmt = match self.peek_kind() {
            TokenKind::Var      => Stmt::Var(self.parse_var_decl(TokenKind::Var)?),
            TokenKind::Global   => Stmt::Global(self.parse_var_decl(TokenKind::Global)?),
            TokenKind::Function => Stmt::Function(self.parse_fn_def()?),
            TokenKind::Class    => self.parse_class()?,
            TokenKind::If       => self.parse_if()?,
            TokenKind::While    => self.parse_while()?,
            TokenKind::For      => self.parse_for()?,
            TokenKind::Foreach  => self.parse_foreach()?,
            TokenKind::Return   => self.parse_return()?,
            TokenKind::Break | TokenKind::Continue => self.parse_loop_control()?,
            TokenKind::LBrace   => {
                let span = self.span();
                Stmt::Block(self.parse_block()?, span)
            }
            _ => self.parse_simple_stmt()?,
        };
        while self.matches(TokenKind::Semicolon) {}
        Ok(stmt)
    }

    /// Assignment or expression statement. Also used for `for` clauses.
    fn parse_simple_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        let expr = self.parse_expr()?;

        let op = match self.peek_kind() {
            TokenKind::Eq      => None,
            TokenKind::PlusEq  => Some(BinOp::Add),
            TokenKind::MinusEq => Some(BinOp::Sub),
            TokenKind::StarEq  => Some(BinOp::Mul),
            TokenKind::SlashEq => Some(BinOp::Div),
            _ => return Ok(Stmt::Expr(expr)),
        };
        if !expr.is_place() {
            return Err(SyntaxError::new(ErrorCode::P001, span.line, span.column,
                "cannot assign to this expression"));
        }
        self.advance();
        let value = self.parse_expr()?;
        Ok(Stmt::Assign(Assign { target: expr, op, value, span }))
    }

    fn parse_var_decl(&mut self, keyword: TokenKind) -> Result<VarDecl, SyntaxError> {
        let span = self.span();
        self.expect(keyword)?;
        let name = self.expect_ident()?;
        let initializer = if self.matches(TokenKind::Eq) { Some(self.parse_expr()?) } else { None };
        Ok(VarDecl { name, initializer, span })
    }

    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let else_block = if self.matches(TokenKind::Else) {
            if self.check(TokenKind::If) {
                Some(vec![self.parse_if()?])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_block, else_block, span }))
    }

    fn parse_while(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::While)?;
        let condition = self.parse_expr()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    fn parse_for(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::For)?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else if self.check(TokenKind::Var) {
            Some(Box::new(Stmt::Var(self.parse_var_decl(TokenKind::Var)?)))
        } else {
            Some(Box::new(self.parse_simple_stmt()?))
        };
        self.expect(TokenKind::Semicolon)?;

        let condition = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expr()?) };
        self.expect(TokenKind::Semicolon)?;

        let step = if self.check(TokenKind::LBrace) { None } else { Some(Box::new(self.parse_simple_stmt()?)) };
        let body = self.parse_loop_body()?;
        Ok(Stmt::For(ForStmt { init, condition, step, body, span }))
    }

    fn parse_foreach(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::Foreach)?;
        let var_name = self.expect_ident()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expr()?;
        let body = self.parse_loop_body()?;
        Ok(Stmt::Foreach(ForeachStmt { var_name, iterable, body, span }))
    }

    fn parse_return(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::Return)?;
        let value = if self.starts_expression() { Some(self.parse_expr()?) } else { None };
        Ok(Stmt::Return(value, span))
    }

    fn parse_loop_control(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        let tok = self.advance();
        if self.loop_depth == 0 {
            let word = if tok.kind == TokenKind::Break { "break" } else { "continue" };
            return Err(SyntaxError::new(ErrorCode::P003, span.line, span.column,
                format!("`{word}` outside of a loop")));
        }
        Ok(if tok.kind == TokenKind::Break { Stmt::Break(span) } else { Stmt::Continue(span) })
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;
        while self.check(TokenKind::Or) {
            let span = *left.span();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary { left: Box::new(left), op: BinOp::Or, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_equality()?;
        while self.check(TokenKind::And) {
            let span = *left.span();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary { left: Box::new(left), op: BinOp::And, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq   => BinOp::Eq,
                TokenKind::BangEq => BinOp::NotEq,
                _ => break,
            };
            let span = *left.span();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_addition()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt   => BinOp::Lt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::Gt   => BinOp::Gt,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            let span = *left.span();
            self.advance();
            let right = self.parse_addition()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_addition(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplication()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus  => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = *left.span();
            self.advance();
            let right = self.parse_multiplication()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_multiplication(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star    => BinOp::Mul,
                TokenKind::Slash   => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let span = *left.span();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), span };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let span = self.span();
        if self.matches(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand), span });
        }
        if self.matches(TokenKind::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnOp::Not, operand: Box::new(operand), span });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek_kind() {
                // member access: expr.name
                TokenKind::Dot => {
                    let span = *expr.span();
                    self.advance();
                    let name = self.expect_ident()?;
                    expr = Expr::Member { object: Box::new(expr), name, span };
                }

                // index: expr[i]
                TokenKind::LBracket => {
                    let span = *expr.span();
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Index { object: Box::new(expr), index: Box::new(index), span };
                }

                // call: expr(args)
                TokenKind::LParen => {
                    let span = *expr.span();
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    expr = Expr::Call { callee: Box::new(expr), args, span };
                }

                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        match tok.kind {
            TokenKind::Integer(v)   => { self.advance(); Ok(Expr::Integer(v, span)) }
            TokenKind::Real(v)      => { self.advance(); Ok(Expr::Real(v, span)) }
            TokenKind::Bool(v)      => { self.advance(); Ok(Expr::Bool(v, span)) }
            TokenKind::StringLit(s) => { self.advance(); Ok(Expr::StringLit(s, span)) }
            TokenKind::HexColor(s)  => { self.advance(); Ok(Expr::HexColor(s, span)) }
            TokenKind::Undefined    => { self.advance(); Ok(Expr::Undefined(span)) }
            TokenKind::This         => { self.advance(); Ok(Expr::This(span)) }
            TokenKind::Ident(name)  => { self.advance(); Ok(Expr::Ident(name, span)) }

            // grouped expression
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }

            // list literal
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                    items.push(self.parse_expr()?);
                    if !self.matches(TokenKind::Comma) { break; }
                }
                self.expect(TokenKind::RBracket)?;
                Ok(Expr::List(items, span))
            }

            // new Type(args); the argument list is optional
            TokenKind::New => {
                self.advance();
                let type_name = self.expect_ident()?;
                let args = if self.matches(TokenKind::LParen) {
                    let args = self.parse_arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    args
                } else {
                    Vec::new()
                };
                Ok(Expr::New { type_name, args, span })
            }

            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expr()?);
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.tokens[self.pos].kind.clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.tokens[self.pos].kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.check(kind.clone()) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(SyntaxError::new(
                ErrorCode::P002,
                tok.line,
                tok.column,
                format!("expected {:?}, found {:?}", kind, tok.kind),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        let tok = self.peek().clone();
        match tok.kind {
            TokenKind::Ident(s) => { self.advance(); Ok(s) }
            _ => Err(self.error_at(&tok, "expected identifier")),
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.tokens[self.pos].kind, TokenKind::Eof)
    }

    /// Whether the current token can begin an expression.
    fn starts_expression(&self) -> bool {
        match &self.tokens[self.pos].kind {
            TokenKind::Minus | TokenKind::Not | TokenKind::LParen | TokenKind::LBracket
            | TokenKind::New | TokenKind::This | TokenKind::Undefined | TokenKind::Ident(_) => true,
            kind => kind.is_literal(),
        }
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let tok = self.peek();
        SyntaxError::new(
            ErrorCode::P001,
            tok.line,
            tok.column,
            format!("expected {}, found {:?}", expected, tok.kind),
        )
    }

    fn error_at(&self, tok: &Token, msg: &str) -> SyntaxError {
        SyntaxError::new(ErrorCode::P001, tok.line, tok.column, msg)
    }

    /// Skip tokens until we find something that looks like a new statement.
    /// Used after a parse error to attempt recovery.
    fn recover(&mut self) {
        self.loop_depth = 0;
        loop {
            match self.peek_kind() {
                TokenKind::Eof
                | TokenKind::Var
                | TokenKind::Global
                | TokenKind::Function
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Foreach
                | TokenKind::Return
                | TokenKind::RBrace => break,
                _ => { self.advance(); }
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_expr_src(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let mut p = Parser::new(tokens);
        p.parse_expr().expect("parse_expr failed")
    }

    fn parse_err(src: &str) -> Vec<SyntaxError> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        Parser::new(tokens).parse().expect_err("expected parse error")
    }

    // ── declarations ─────────────────────────────────────────────────────────

    #[test]
    fn var_decl_with_init() {
        let p = parse("var x = 42");
        let Stmt::Var(d) = &p.statements[0] else { panic!("expected var") };
        assert_eq!(d.name, "x");
        assert!(matches!(d.initializer, Some(Expr::Integer(42, _))));
    }

    #[test]
    fn var_decl_without_init() {
        let p = parse("var x");
        let Stmt::Var(d) = &p.statements[0] else { panic!("expected var") };
        assert!(d.initializer.is_none());
    }

    #[test]
    fn global_decl() {
        let p = parse("global counter = 0");
        let Stmt::Global(d) = &p.statements[0] else { panic!("expected global") };
        assert_eq!(d.name, "counter");
    }

    #[test]
    fn function_def() {
        let p = parse("function add(a, b) { return a + b }");
        let Stmt::Function(f) = &p.statements[0] else { panic!("expected function") };
        assert_eq!(f.name, "add");
        assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(f.body[0], Stmt::Return(Some(Expr::Binary { op: BinOp::Add, .. }), _)));
    }

    #[test]
    fn class_def() {
        let p = parse(
            "class Point {
                var x = 0
                var y
                function Point(ax, ay) { x = ax; y = ay }
                function Length() { return 0 }
            }",
        );
        let Stmt::Class(c) = &p.statements[0] else { panic!("expected class") };
        assert_eq!(c.name, "Point");
        assert_eq!(c.fields.len(), 2);
        assert!(c.fields[1].initializer.is_none());
        let names: Vec<_> = c.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Point", "Length"]);
    }

    #[test]
    fn class_body_rejects_statements() {
        let errs = parse_err("class A { x = 1 }");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    // ── statements ───────────────────────────────────────────────────────────

    #[test]
    fn assignment_targets() {
        let p = parse("x = 1\np.x = 2\nlist[0] = 3");
        assert!(matches!(&p.statements[0], Stmt::Assign(Assign { target: Expr::Ident(..), op: None, .. })));
        assert!(matches!(&p.statements[1], Stmt::Assign(Assign { target: Expr::Member { .. }, .. })));
        assert!(matches!(&p.statements[2], Stmt::Assign(Assign { target: Expr::Index { .. }, .. })));
    }

    #[test]
    fn compound_assignment() {
        let p = parse("x += 2");
        assert!(matches!(&p.statements[0], Stmt::Assign(Assign { op: Some(BinOp::Add), .. })));
    }

    #[test]
    fn assign_to_call_is_error() {
        let errs = parse_err("f() = 1");
        assert_eq!(errs[0].code, ErrorCode::P001);
    }

    #[test]
    fn semicolons_are_optional() {
        let p = parse("var a = 1; var b = 2;; a = b");
        assert_eq!(p.statements.len(), 3);
    }

    #[test]
    fn if_else_if_chain() {
        let p = parse("if a { } else if b { } else { x = 1 }");
        let Stmt::If(s) = &p.statements[0] else { panic!("expected if") };
        let Some(else_block) = &s.else_block else { panic!("expected else") };
        let Stmt::If(inner) = &else_block[0] else { panic!("expected nested if") };
        assert_eq!(inner.else_block.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn while_loop() {
        let p = parse("while i < 10 { i = i + 1 }");
        assert!(matches!(p.statements[0], Stmt::While(_)));
    }

    #[test]
    fn for_loop() {
        let p = parse("for var i = 0; i < 10; i += 1 { }");
        let Stmt::For(f) = &p.statements[0] else { panic!("expected for") };
        assert!(matches!(f.init.as_deref(), Some(Stmt::Var(_))));
        assert!(f.condition.is_some());
        assert!(matches!(f.step.as_deref(), Some(Stmt::Assign(_))));
    }

    #[test]
    fn for_loop_empty_clauses() {
        let p = parse("for ;; { break }");
        let Stmt::For(f) = &p.statements[0] else { panic!("expected for") };
        assert!(f.init.is_none() && f.condition.is_none() && f.step.is_none());
    }

    #[test]
    fn foreach_loop() {
        let p = parse("foreach v in items { print(v) }");
        let Stmt::Foreach(f) = &p.statements[0] else { panic!("expected foreach") };
        assert_eq!(f.var_name, "v");
        assert!(matches!(f.iterable, Expr::Ident(ref n, _) if n == "items"));
    }

    #[test]
    fn break_outside_loop_is_error() {
        let errs = parse_err("break");
        assert_eq!(errs[0].code, ErrorCode::P003);
        let errs = parse_err("while true { function f() { continue } }");
        assert_eq!(errs[0].code, ErrorCode::P003);
    }

    #[test]
    fn break_inside_loop() {
        let p = parse("while true { if x { break } else { continue } }");
        assert_eq!(p.statements.len(), 1);
    }

    #[test]
    fn return_bare() {
        let p = parse("function f() { return }");
        let Stmt::Function(f) = &p.statements[0] else { panic!("expected function") };
        assert!(matches!(f.body[0], Stmt::Return(None, _)));
    }

    #[test]
    fn standalone_block() {
        let p = parse("{ var x = 1 }");
        assert!(matches!(&p.statements[0], Stmt::Block(b, _) if b.len() == 1));
    }

    // ── expressions ──────────────────────────────────────────────────────────

    #[test]
    fn binary_precedence() {
        let e = parse_expr_src("1 + 2 * 3");
        let Expr::Binary { op: BinOp::Add, right, .. } = e else { panic!("expected add") };
        assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn compare_binds_tighter_than_logical() {
        let e = parse_expr_src("a < b and c == d or not e");
        let Expr::Binary { op: BinOp::Or, left, right, .. } = e else { panic!("expected or") };
        assert!(matches!(*left, Expr::Binary { op: BinOp::And, .. }));
        assert!(matches!(*right, Expr::Unary { op: UnOp::Not, .. }));
    }

    #[test]
    fn unary_double_neg() {
        let e = parse_expr_src("--x");
        let Expr::Unary { op: UnOp::Neg, operand, .. } = e else { panic!("expected neg") };
        assert!(matches!(*operand, Expr::Unary { op: UnOp::Neg, .. }));
    }

    #[test]
    fn method_call_chain() {
        let e = parse_expr_src("a.b.Length()");
        let Expr::Call { callee, args, .. } = e else { panic!("expected call") };
        assert!(args.is_empty());
        let Expr::Member { object, name, .. } = *callee else { panic!("expected member") };
        assert_eq!(name, "Length");
        assert!(matches!(*object, Expr::Member { .. }));
    }

    #[test]
    fn index_expr() {
        let e = parse_expr_src("xs[i + 1]");
        assert!(matches!(e, Expr::Index { .. }));
    }

    #[test]
    fn new_expression() {
        let e = parse_expr_src("new Point(3, 4)");
        let Expr::New { type_name, args, .. } = e else { panic!("expected new") };
        assert_eq!(type_name, "Point");
        assert_eq!(args.len(), 2);
        assert!(matches!(parse_expr_src("new Empty"), Expr::New { ref args, .. } if args.is_empty()));
    }

    #[test]
    fn list_literal() {
        let e = parse_expr_src("[1, 2.5, \"s\", []]");
        let Expr::List(items, _) = e else { panic!("expected list") };
        assert_eq!(items.len(), 4);
        assert!(matches!(items[3], Expr::List(ref inner, _) if inner.is_empty()));
    }

    #[test]
    fn literals() {
        assert!(matches!(parse_expr_src("#ff8800"), Expr::HexColor(ref s, _) if s == "ff8800"));
        assert!(matches!(parse_expr_src("undefined"), Expr::Undefined(_)));
        assert!(matches!(parse_expr_src("this"), Expr::This(_)));
        assert!(matches!(parse_expr_src("true"), Expr::Bool(true, _)));
    }

    // ── error recovery ───────────────────────────────────────────────────────

    #[test]
    fn missing_brace_is_error() {
        let errs = parse_err("function f() { ");
        assert!(!errs.is_empty());
    }

    #[test]
    fn multiple_errors_collected() {
        let errs = parse_err("var = 1\nvar y = \nvar z = 3");
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].line, 1);
    }
}
