//! Parser for SmallLang
//!
//! Recursive descent, one function per grammar non-terminal. Precedence
//! is encoded structurally (`Expr` over `SimpleExpr` over `Term` over
//! `Factor`): each level parses one unit of the level below and, when
//! its operator class follows, consumes the operator and recurses into
//! the same level for the right-hand side, producing right-nested
//! chains.
//!
//! Tokens are pulled from the lexer through a lookahead buffer. Two
//! tokens of lookahead are needed in exactly one place: a bare
//! identifier is a function call iff the token after it is `(`.

use std::collections::VecDeque;

use crate::frontend::ast::*;
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// The parser, tied to one pass over one source text.
pub struct Parser {
    lexer: Lexer,
    buffer: VecDeque<Token>,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            buffer: VecDeque::new(),
        }
    }

    // ==================== Token Plumbing ====================

    /// Line for error reporting: the pending token's line if one is
    /// buffered, else the lexer cursor's.
    fn line(&self) -> usize {
        self.buffer
            .front()
            .map(|t| t.line)
            .unwrap_or_else(|| self.lexer.line())
    }

    fn syntax_error(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            line: self.line(),
            message: message.into(),
        }
    }

    /// Ensure `n` tokens are buffered. `EndOfInput` propagates raw; the
    /// callers that must not see end-of-input map it to a syntax error.
    fn fill(&mut self, n: usize) -> Result<()> {
        while self.buffer.len() < n {
            self.buffer.push_back(self.lexer.next_token()?);
        }
        Ok(())
    }

    fn eof_error(&self) -> Error {
        Error::Syntax {
            line: self.lexer.line(),
            message: "unexpected end of input".to_string(),
        }
    }

    /// True once the token stream is spent.
    fn at_eof(&mut self) -> Result<bool> {
        match self.fill(1) {
            Ok(()) => Ok(false),
            Err(Error::EndOfInput) => Ok(true),
            Err(e) => Err(e),
        }
    }

    /// Buffer `k` tokens and return the `k`-th without consuming.
    fn lookahead(&mut self, k: usize) -> Result<&Token> {
        match self.fill(k) {
            Ok(()) => Ok(&self.buffer[k - 1]),
            Err(Error::EndOfInput) => Err(self.eof_error()),
            Err(e) => Err(e),
        }
    }

    fn peek(&mut self) -> Result<&Token> {
        self.lookahead(1)
    }

    /// Whether the next token has the given kind; false at end of input.
    fn is_next(&mut self, kind: TokenKind) -> Result<bool> {
        if self.at_eof()? {
            return Ok(false);
        }
        Ok(self.buffer[0].kind == kind)
    }

    fn next(&mut self) -> Result<Token> {
        if let Some(token) = self.buffer.pop_front() {
            return Ok(token);
        }
        match self.lexer.next_token() {
            Ok(token) => Ok(token),
            Err(Error::EndOfInput) => Err(self.eof_error()),
            Err(e) => Err(e),
        }
    }

    /// Consume the next token, failing with `message` if its kind differs.
    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token> {
        let token = self.next()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.syntax_error(message))
        }
    }

    // ==================== Program and Statements ====================

    /// Parse a complete program: statements until end of input.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        while !self.at_eof()? {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Let => Ok(Stmt::VarDecl(self.parse_var_decl()?)),
            TokenKind::Ident => Ok(Stmt::Assign(self.parse_assign()?)),
            TokenKind::Print => self.parse_print(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::While => self.parse_while(),
            TokenKind::Func => Ok(Stmt::FuncDecl(self.parse_func_decl()?)),
            TokenKind::OpenBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => {
                let lexeme = token.lexeme.clone();
                Err(self.syntax_error(format!(
                    "invalid token \"{}\" found while parsing statement",
                    lexeme
                )))
            }
        }
    }

    /// `{ stmt* }`. Reaching end of input before the closing brace is a
    /// syntax error, never a silent acceptance.
    fn parse_block(&mut self) -> Result<Block> {
        self.expect(TokenKind::OpenBrace, "missing '{' at start of block")?;
        let mut stmts = Vec::new();
        loop {
            if self.at_eof()? {
                return Err(self.syntax_error("unexpected end of input; expected '}' to close block"));
            }
            if self.is_next(TokenKind::CloseBrace)? {
                break;
            }
            stmts.push(self.parse_stmt()?);
        }
        self.next()?; // consume '}'
        Ok(Block { stmts })
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl> {
        self.expect(TokenKind::Let, "missing 'let' in variable declaration")?;
        let id = self.parse_id()?;
        self.expect(TokenKind::Colon, "missing ':' in variable declaration")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::Assign, "missing '=' in variable declaration")?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "missing ';' in variable declaration")?;
        Ok(VarDecl { id, ty, init })
    }

    fn parse_assign(&mut self) -> Result<Assign> {
        let assign = self.parse_assign_no_semi()?;
        self.expect(TokenKind::Semicolon, "missing ';' in variable assignment")?;
        Ok(assign)
    }

    /// Assignment without the trailing semicolon, as it appears in a
    /// for-loop header.
    fn parse_assign_no_semi(&mut self) -> Result<Assign> {
        let id = self.parse_id()?;
        self.expect(TokenKind::Assign, "missing '=' in variable assignment")?;
        let expr = self.parse_expr()?;
        Ok(Assign { id, expr })
    }

    fn parse_print(&mut self) -> Result<Stmt> {
        self.next()?; // consume 'print'
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "missing ';' in print statement")?;
        Ok(Stmt::Print(expr))
    }

    fn parse_return(&mut self) -> Result<Stmt> {
        self.next()?; // consume 'return'
        let expr = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "missing ';' in return statement")?;
        Ok(Stmt::Return(expr))
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        self.next()?; // consume 'if'
        self.expect(TokenKind::OpenParen, "missing '(' in if statement")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::CloseParen, "missing ')' in if statement")?;
        let then_block = self.parse_block()?;

        let else_block = if self.is_next(TokenKind::Else)? {
            self.next()?; // consume 'else'
            Some(self.parse_block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    /// `for ( [var-decl;] cond ; [assignment] ) block`
    fn parse_for(&mut self) -> Result<Stmt> {
        self.next()?; // consume 'for'
        self.expect(TokenKind::OpenParen, "missing '(' in for statement")?;

        // The optional declaration carries its own terminating ';'.
        let init = if self.is_next(TokenKind::Let)? {
            Some(self.parse_var_decl()?)
        } else {
            self.expect(
                TokenKind::Semicolon,
                "missing ';' in for statement after empty declaration",
            )?;
            None
        };

        let cond = self.parse_expr()?;
        self.expect(
            TokenKind::Semicolon,
            "missing ';' in for statement after condition",
        )?;

        let step = if self.is_next(TokenKind::Ident)? {
            Some(self.parse_assign_no_semi()?)
        } else {
            None
        };

        self.expect(TokenKind::CloseParen, "missing ')' in for statement")?;
        let body = self.parse_block()?;

        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt> {
        self.next()?; // consume 'while'
        self.expect(TokenKind::OpenParen, "missing '(' in while statement")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::CloseParen, "missing ')' in while statement")?;
        let body = self.parse_block()?;
        Ok(Stmt::While { cond, body })
    }

    fn parse_formal_param(&mut self) -> Result<FormalParam> {
        let id = self.parse_id()?;
        self.expect(TokenKind::Colon, "missing ':' in formal parameter")?;
        let ty = self.parse_type()?;
        Ok(FormalParam { id, ty })
    }

    fn parse_func_decl(&mut self) -> Result<FuncDecl> {
        self.next()?; // consume 'ff'
        let id = self.parse_id()?;

        self.expect(TokenKind::OpenParen, "missing '(' in function declaration")?;
        let mut params = Vec::new();
        if !self.is_next(TokenKind::CloseParen)? {
            params.push(self.parse_formal_param()?);
            while self.is_next(TokenKind::Comma)? {
                self.next()?;
                params.push(self.parse_formal_param()?);
            }
        }
        self.expect(TokenKind::CloseParen, "missing ')' in function declaration")?;

        self.expect(TokenKind::Colon, "missing ':' in function declaration")?;
        let ret = self.parse_type()?;
        let body = self.parse_block()?;

        Ok(FuncDecl {
            id,
            params,
            ret,
            body,
        })
    }

    // ==================== Expressions ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        let left = self.parse_simple_expr()?;
        if !self.is_next(TokenKind::RelOp)? {
            return Ok(Expr { left, rest: None });
        }

        let op = self.parse_rel_op()?;
        let rest = self.parse_expr()?;

        Ok(Expr {
            left,
            rest: Some((op, Box::new(rest))),
        })
    }

    fn parse_simple_expr(&mut self) -> Result<SimpleExpr> {
        let left = self.parse_term()?;
        if !self.is_next(TokenKind::AddOp)? {
            return Ok(SimpleExpr { left, rest: None });
        }

        let op = self.parse_add_op()?;
        let rest = self.parse_simple_expr()?;

        Ok(SimpleExpr {
            left,
            rest: Some((op, Box::new(rest))),
        })
    }

    fn parse_term(&mut self) -> Result<Term> {
        let left = self.parse_factor()?;
        if !self.is_next(TokenKind::MultOp)? {
            return Ok(Term { left, rest: None });
        }

        let op = self.parse_mult_op()?;
        let rest = self.parse_term()?;

        Ok(Term {
            left,
            rest: Some((op, Box::new(rest))),
        })
    }

    fn parse_factor(&mut self) -> Result<Factor> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::BoolLit => {
                let token = self.next()?;
                Ok(Factor::Lit(Literal::Bool(token.lexeme == "true")))
            }
            TokenKind::IntLit => {
                let token = self.next()?;
                let value = token
                    .lexeme
                    .parse()
                    .map_err(|_| self.syntax_error("integer literal out of range"))?;
                Ok(Factor::Lit(Literal::Int(value)))
            }
            TokenKind::FloatLit => {
                let token = self.next()?;
                let value = token
                    .lexeme
                    .parse()
                    .map_err(|_| self.syntax_error("malformed float literal"))?;
                Ok(Factor::Lit(Literal::Float(value)))
            }
            TokenKind::CharLit => {
                let token = self.next()?;
                // The DFA guarantees exactly 'x'.
                let c = token
                    .lexeme
                    .chars()
                    .nth(1)
                    .ok_or_else(|| self.syntax_error("malformed character literal"))?;
                Ok(Factor::Lit(Literal::Char(c)))
            }
            TokenKind::Ident => {
                // The only two-token lookahead in the grammar: an
                // identifier followed by '(' is a function call.
                if self.lookahead(2)?.kind == TokenKind::OpenParen {
                    self.parse_func_call()
                } else {
                    Ok(Factor::Id(self.parse_id()?))
                }
            }
            TokenKind::OpenParen => {
                self.next()?; // consume '('
                let expr = self.parse_expr()?;
                self.expect(TokenKind::CloseParen, "missing ')' in sub-expression")?;
                Ok(Factor::Sub(Box::new(expr)))
            }
            TokenKind::AddOp => {
                if token.lexeme != "-" {
                    let lexeme = token.lexeme.clone();
                    return Err(
                        self.syntax_error(format!("'{}' is not a valid unary operator", lexeme))
                    );
                }
                self.next()?; // consume '-'
                let expr = self.parse_expr()?;
                Ok(Factor::Unary {
                    op: UnaryOp::Minus,
                    expr: Box::new(expr),
                })
            }
            TokenKind::Not => {
                self.next()?; // consume 'not'
                let expr = self.parse_expr()?;
                Ok(Factor::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(expr),
                })
            }
            _ => {
                let lexeme = token.lexeme.clone();
                Err(self.syntax_error(format!(
                    "invalid token \"{}\" found while parsing factor",
                    lexeme
                )))
            }
        }
    }

    fn parse_func_call(&mut self) -> Result<Factor> {
        let id = self.parse_id()?;
        self.expect(TokenKind::OpenParen, "missing '(' in function call")?;

        let mut args = Vec::new();
        if !self.is_next(TokenKind::CloseParen)? {
            args.push(self.parse_expr()?);
            while self.is_next(TokenKind::Comma)? {
                self.next()?;
                args.push(self.parse_expr()?);
            }
        }
        self.expect(TokenKind::CloseParen, "missing ')' in function call")?;

        Ok(Factor::Call { id, args })
    }

    // ==================== Terminals ====================

    fn parse_id(&mut self) -> Result<String> {
        let token = self.expect(TokenKind::Ident, "expected identifier")?;
        Ok(token.lexeme)
    }

    fn parse_type(&mut self) -> Result<Type> {
        let token = self.next()?;
        match (token.kind, token.lexeme.as_str()) {
            (TokenKind::Auto, _) => Ok(Type::Auto),
            (TokenKind::Type, "bool") => Ok(Type::Bool),
            (TokenKind::Type, "int") => Ok(Type::Int),
            (TokenKind::Type, "float") => Ok(Type::Float),
            (TokenKind::Type, "char") => Ok(Type::Char),
            _ => Err(self.syntax_error("expected type")),
        }
    }

    fn parse_mult_op(&mut self) -> Result<MultOp> {
        let token = self.expect(TokenKind::MultOp, "expected multiplicative operator")?;
        Ok(match token.lexeme.as_str() {
            "*" => MultOp::Mul,
            "/" => MultOp::Div,
            _ => MultOp::And,
        })
    }

    fn parse_add_op(&mut self) -> Result<AddOp> {
        let token = self.expect(TokenKind::AddOp, "expected additive operator")?;
        Ok(match token.lexeme.as_str() {
            "+" => AddOp::Add,
            "-" => AddOp::Sub,
            _ => AddOp::Or,
        })
    }

    fn parse_rel_op(&mut self) -> Result<RelOp> {
        let token = self.expect(TokenKind::RelOp, "expected relational operator")?;
        Ok(match token.lexeme.as_str() {
            "<" => RelOp::Lt,
            "<=" => RelOp::Le,
            "<>" => RelOp::Ne,
            ">" => RelOp::Gt,
            ">=" => RelOp::Ge,
            _ => RelOp::Eq,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(Lexer::new(source)).parse_program()
    }

    #[test]
    fn test_var_decl() {
        let program = parse("let x : int = 5;").unwrap();
        assert_eq!(program.stmts.len(), 1);
        match &program.stmts[0] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.id, "x");
                assert_eq!(decl.ty, Type::Int);
            }
            other => panic!("expected VarDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_is_structural() {
        // 1+2*3: the '*' binds inside the additive tail's term.
        let program = parse("let x : int = 1 + 2 * 3;").unwrap();
        let Stmt::VarDecl(decl) = &program.stmts[0] else {
            panic!("expected VarDecl");
        };
        let simple = &decl.init.left;
        assert_eq!(simple.left.left, Factor::Lit(Literal::Int(1)));
        let Some((AddOp::Add, rest)) = &simple.rest else {
            panic!("expected additive tail");
        };
        let term = &rest.left;
        assert_eq!(term.left, Factor::Lit(Literal::Int(2)));
        let Some((MultOp::Mul, inner)) = &term.rest else {
            panic!("expected multiplicative tail");
        };
        assert_eq!(inner.left, Factor::Lit(Literal::Int(3)));
    }

    #[test]
    fn test_addition_nests_right() {
        let program = parse("let x : int = 1 + 2 + 3;").unwrap();
        let Stmt::VarDecl(decl) = &program.stmts[0] else {
            panic!("expected VarDecl");
        };
        // a + (b + c)
        let Some((AddOp::Add, rest)) = &decl.init.left.rest else {
            panic!("expected additive tail");
        };
        assert!(rest.rest.is_some());
    }

    #[test]
    fn test_call_vs_identifier_lookahead() {
        let program = parse("let a : int = f(1, 2); let b : int = f;").unwrap();
        let Stmt::VarDecl(decl) = &program.stmts[0] else {
            panic!("expected VarDecl");
        };
        match &decl.init.left.left.left {
            Factor::Call { id, args } => {
                assert_eq!(id, "f");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {:?}", other),
        }
        let Stmt::VarDecl(decl) = &program.stmts[1] else {
            panic!("expected VarDecl");
        };
        assert_eq!(decl.init.left.left.left, Factor::Id("f".to_string()));
    }

    #[test]
    fn test_func_decl() {
        let program = parse("ff add(a: int, b: int) : int { return a + b; }").unwrap();
        let Stmt::FuncDecl(func) = &program.stmts[0] else {
            panic!("expected FuncDecl");
        };
        assert_eq!(func.id, "add");
        assert_eq!(func.params.len(), 2);
        assert_eq!(func.ret, Type::Int);
        assert_eq!(func.body.stmts.len(), 1);
    }

    #[test]
    fn test_if_else() {
        let program = parse("if (true) { print 1; } else { print 2; }").unwrap();
        let Stmt::If { else_block, .. } = &program.stmts[0] else {
            panic!("expected If");
        };
        assert!(else_block.is_some());
    }

    #[test]
    fn test_for_header() {
        let program = parse("for (let i : int = 0; i < 5; i = i + 1) { print i; }").unwrap();
        let Stmt::For { init, step, .. } = &program.stmts[0] else {
            panic!("expected For");
        };
        assert!(init.is_some());
        assert!(step.is_some());

        // Both clauses are optional.
        let program = parse("for (; true;) { }").unwrap();
        let Stmt::For { init, step, .. } = &program.stmts[0] else {
            panic!("expected For");
        };
        assert!(init.is_none());
        assert!(step.is_none());
    }

    #[test]
    fn test_unterminated_block_is_syntax_error() {
        let err = parse("while (true) { print 1;").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }), "got {:?}", err);
    }

    #[test]
    fn test_trailing_comma_rejected() {
        assert!(parse("let a : int = f(1,);").is_err());
        assert!(parse("ff f(a: int,) : int { return a; }").is_err());
    }

    #[test]
    fn test_unary_operand_extends_right() {
        // The unary operand is a full expression: -a + b is -(a + b).
        let program = parse("let x : int = -a + b;").unwrap();
        let Stmt::VarDecl(decl) = &program.stmts[0] else {
            panic!("expected VarDecl");
        };
        assert!(decl.init.left.rest.is_none());
        let Factor::Unary { op, expr } = &decl.init.left.left.left else {
            panic!("expected Unary");
        };
        assert_eq!(*op, UnaryOp::Minus);
        assert!(expr.left.rest.is_some());
    }

    #[test]
    fn test_invalid_statement_token() {
        let err = parse("else").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, .. }), "got {:?}", err);
    }
}
