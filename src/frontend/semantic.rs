//! Semantic analyzer for SmallLang
//!
//! A type-propagating walk over the AST. Each grammar level owns a
//! "current type" slot; visiting a child saves the child's slot, resets
//! it to `auto`, lets the child synthesize into it, then restores the
//! saved value. Merging into a slot adopts the first concrete type when
//! the slot holds `auto` and otherwise demands an exact match, which is
//! both how operand chains are forced to agree and how `auto`
//! declarations are resolved.
//!
//! Analysis is single-pass with no recovery: the first error aborts,
//! wrapped with the index of the offending top-level statement.

use crate::frontend::ast::*;
use crate::scope::{Named, ScopeStack};
use crate::utils::{Error, Result};

/// Declared variable signature.
#[derive(Debug, Clone)]
pub struct VarSig {
    pub id: String,
    pub datatype: Type,
}

/// Declared function signature.
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub id: String,
    pub ret: Type,
    pub params: Vec<(String, Type)>,
}

impl Named for VarSig {
    fn name(&self) -> &str {
        &self.id
    }
}

impl Named for FuncSig {
    fn name(&self) -> &str {
        &self.id
    }
}

/// Merge a synthesized type into a slot: `auto` adopts, otherwise the
/// types must match exactly.
fn merge(slot: Type, found: Type, context: &str) -> Result<Type> {
    if slot == Type::Auto || slot == found {
        Ok(found)
    } else {
        Err(Error::TypeMismatch(format!(
            "{}: expected {}, found {}",
            context, slot, found
        )))
    }
}

pub struct Analyzer {
    scopes: ScopeStack<VarSig, FuncSig>,
    /// Declaration/function slot: the type a `let` or `ff` expects.
    curr_type: Type,
    expr_type: Type,
    simple_expr_type: Type,
    term_type: Type,
    factor_type: Type,
    /// A return was seen in the current function body outside any `if`.
    has_return: bool,
    is_in_if: bool,
    is_in_func: bool,
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            curr_type: Type::Auto,
            expr_type: Type::Auto,
            simple_expr_type: Type::Auto,
            term_type: Type::Auto,
            factor_type: Type::Auto,
            has_return: false,
            is_in_if: false,
            is_in_func: false,
        }
    }

    /// Analyze a whole program in one root scope. The first error aborts
    /// analysis, tagged with its top-level statement index.
    pub fn analyze(&mut self, program: &Program) -> Result<()> {
        self.with_scope(|a| {
            for (index, stmt) in program.stmts.iter().enumerate() {
                a.analyze_stmt(stmt).map_err(|e| e.at_statement(index))?;
            }
            Ok(())
        })
    }

    /// Run `f` inside a fresh scope, popping it on every exit path.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push_scope();
        let result = f(self);
        self.scopes.pop_scope();
        result
    }

    fn analyze_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.analyze_block(block),
            Stmt::Assign(assign) => self.analyze_assign(assign),
            Stmt::VarDecl(decl) => self.analyze_var_decl(decl),
            Stmt::Print(expr) => {
                // Any concrete type is printable.
                self.type_of_expr(expr)?;
                Ok(())
            }
            Stmt::Return(expr) => self.analyze_return(expr),
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => self.analyze_if(cond, then_block, else_block.as_ref()),
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.analyze_for(init.as_ref(), cond, step.as_ref(), body),
            Stmt::While { cond, body } => {
                self.check_cond(cond, "while")?;
                self.analyze_block(body)
            }
            Stmt::FuncDecl(func) => self.analyze_func_decl(func),
        }
    }

    fn analyze_block(&mut self, block: &Block) -> Result<()> {
        self.with_scope(|a| {
            for stmt in &block.stmts {
                a.analyze_stmt(stmt)?;
            }
            Ok(())
        })
    }

    fn analyze_var_decl(&mut self, decl: &VarDecl) -> Result<()> {
        if self.scopes.var_in_innermost(&decl.id) {
            return Err(Error::DuplicateDeclaration {
                kind: "variable",
                name: decl.id.clone(),
            });
        }

        let saved = self.curr_type;
        self.curr_type = decl.ty;
        let result = self.type_of_expr(&decl.init).and_then(|found| {
            self.curr_type = merge(
                self.curr_type,
                found,
                &format!("declaration of '{}'", decl.id),
            )?;
            Ok(())
        });
        let resolved = self.curr_type;
        self.curr_type = saved;
        result?;

        self.scopes.declare_var(VarSig {
            id: decl.id.clone(),
            datatype: resolved,
        });
        Ok(())
    }

    fn analyze_assign(&mut self, assign: &Assign) -> Result<()> {
        let declared = self
            .scopes
            .resolve_var(&assign.id)
            .ok_or_else(|| Error::VarNotFound(assign.id.clone()))?
            .datatype;

        let found = self.type_of_expr(&assign.expr)?;
        merge(
            declared,
            found,
            &format!("assignment to '{}'", assign.id),
        )?;
        Ok(())
    }

    fn analyze_return(&mut self, expr: &Expr) -> Result<()> {
        if !self.is_in_func {
            return Err(Error::InvalidReturn);
        }

        let found = self.type_of_expr(expr)?;
        // The function slot adopts the first return's type when the
        // declared return type is auto.
        self.curr_type = merge(self.curr_type, found, "return value")?;
        if !self.is_in_if {
            self.has_return = true;
        }
        Ok(())
    }

    fn analyze_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) -> Result<()> {
        self.check_cond(cond, "if")?;

        let saved = self.is_in_if;
        self.is_in_if = true;
        let result = self.analyze_block(then_block).and_then(|()| {
            if let Some(block) = else_block {
                self.analyze_block(block)?;
            }
            Ok(())
        });
        self.is_in_if = saved;
        result
    }

    fn analyze_for(
        &mut self,
        init: Option<&VarDecl>,
        cond: &Expr,
        step: Option<&Assign>,
        body: &Block,
    ) -> Result<()> {
        // The header declaration lives in its own loop scope.
        self.with_scope(|a| {
            if let Some(decl) = init {
                a.analyze_var_decl(decl)?;
            }
            a.check_cond(cond, "for")?;
            if let Some(assign) = step {
                a.analyze_assign(assign)?;
            }
            a.analyze_block(body)
        })
    }

    fn analyze_func_decl(&mut self, func: &FuncDecl) -> Result<()> {
        if self.scopes.func_in_innermost(&func.id) {
            return Err(Error::DuplicateDeclaration {
                kind: "function",
                name: func.id.clone(),
            });
        }

        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            if param.ty == Type::Auto {
                return Err(Error::TypeMismatch(format!(
                    "parameter '{}' of function '{}' may not be declared auto",
                    param.id, func.id
                )));
            }
            if params.iter().any(|(id, _)| id == &param.id) {
                return Err(Error::DuplicateDeclaration {
                    kind: "variable",
                    name: param.id.clone(),
                });
            }
            params.push((param.id.clone(), param.ty));
        }

        let saved_curr = self.curr_type;
        let saved_has_return = self.has_return;
        let saved_in_if = self.is_in_if;
        let saved_in_func = self.is_in_func;
        self.curr_type = func.ret;
        self.has_return = false;
        self.is_in_if = false;
        self.is_in_func = true;

        let result = self.with_scope(|a| {
            for (id, ty) in &params {
                a.scopes.declare_var(VarSig {
                    id: id.clone(),
                    datatype: *ty,
                });
            }
            a.analyze_block(&func.body)
        });

        let has_return = self.has_return;
        let resolved = self.curr_type;
        self.curr_type = saved_curr;
        self.has_return = saved_has_return;
        self.is_in_if = saved_in_if;
        self.is_in_func = saved_in_func;
        result?;

        if !has_return || resolved == Type::Auto {
            return Err(Error::MissingReturn(func.id.clone()));
        }

        // Registered only after the body checks out, so the body cannot
        // call the function it is declaring.
        self.scopes.declare_func(FuncSig {
            id: func.id.clone(),
            ret: resolved,
            params,
        });
        Ok(())
    }

    fn check_cond(&mut self, cond: &Expr, stmt: &str) -> Result<()> {
        let found = self.type_of_expr(cond)?;
        if found != Type::Bool {
            return Err(Error::TypeMismatch(format!(
                "{} condition must be bool, found {}",
                stmt, found
            )));
        }
        Ok(())
    }

    // ==================== Expression levels ====================

    /// Type an expression in a fresh slot, restoring the caller's.
    fn type_of_expr(&mut self, expr: &Expr) -> Result<Type> {
        let saved = self.expr_type;
        self.expr_type = Type::Auto;
        let result = self.analyze_expr(expr);
        let ty = self.expr_type;
        self.expr_type = saved;
        result?;
        Ok(ty)
    }

    fn analyze_expr(&mut self, expr: &Expr) -> Result<()> {
        let found = self.type_of_simple_expr(&expr.left)?;
        self.expr_type = merge(self.expr_type, found, "comparison operands")?;
        if let Some((_, rest)) = &expr.rest {
            // The right-hand side merges into the same slot, so both
            // sides of the comparison must agree; the comparison itself
            // synthesizes bool.
            self.analyze_expr(rest)?;
            self.expr_type = Type::Bool;
        }
        Ok(())
    }

    fn type_of_simple_expr(&mut self, simple: &SimpleExpr) -> Result<Type> {
        let saved = self.simple_expr_type;
        self.simple_expr_type = Type::Auto;
        let result = self.analyze_simple_expr(simple);
        let ty = self.simple_expr_type;
        self.simple_expr_type = saved;
        result?;
        Ok(ty)
    }

    fn analyze_simple_expr(&mut self, simple: &SimpleExpr) -> Result<()> {
        let found = self.type_of_term(&simple.left)?;
        self.simple_expr_type = merge(self.simple_expr_type, found, "additive operands")?;
        if let Some((op, rest)) = &simple.rest {
            self.check_add_op(*op, self.simple_expr_type)?;
            self.analyze_simple_expr(rest)?;
        }
        Ok(())
    }

    fn type_of_term(&mut self, term: &Term) -> Result<Type> {
        let saved = self.term_type;
        self.term_type = Type::Auto;
        let result = self.analyze_term(term);
        let ty = self.term_type;
        self.term_type = saved;
        result?;
        Ok(ty)
    }

    fn analyze_term(&mut self, term: &Term) -> Result<()> {
        let found = self.type_of_factor(&term.left)?;
        self.term_type = merge(self.term_type, found, "multiplicative operands")?;
        if let Some((op, rest)) = &term.rest {
            self.check_mult_op(*op, self.term_type)?;
            self.analyze_term(rest)?;
        }
        Ok(())
    }

    fn type_of_factor(&mut self, factor: &Factor) -> Result<Type> {
        let saved = self.factor_type;
        self.factor_type = Type::Auto;
        let result = self.analyze_factor(factor);
        let ty = self.factor_type;
        self.factor_type = saved;
        result?;
        Ok(ty)
    }

    fn analyze_factor(&mut self, factor: &Factor) -> Result<()> {
        let found = match factor {
            Factor::Id(id) => {
                self.scopes
                    .resolve_var(id)
                    .ok_or_else(|| Error::VarNotFound(id.clone()))?
                    .datatype
            }
            Factor::Call { id, args } => self.analyze_call(id, args)?,
            Factor::Sub(expr) => self.type_of_expr(expr)?,
            Factor::Unary { op, expr } => {
                let ty = self.type_of_expr(expr)?;
                self.check_unary_op(*op, ty)?;
                ty
            }
            Factor::Lit(lit) => match lit {
                Literal::Bool(_) => Type::Bool,
                Literal::Int(_) => Type::Int,
                Literal::Float(_) => Type::Float,
                Literal::Char(_) => Type::Char,
            },
        };
        self.factor_type = merge(self.factor_type, found, "factor")?;
        Ok(())
    }

    fn analyze_call(&mut self, id: &str, args: &[Expr]) -> Result<Type> {
        let sig = self
            .scopes
            .resolve_func(id)
            .ok_or_else(|| Error::FuncNotFound(id.to_string()))?
            .clone();

        if args.len() != sig.params.len() {
            return Err(Error::Arity {
                name: id.to_string(),
                expected: sig.params.len(),
                got: args.len(),
            });
        }
        for (arg, (param_id, param_ty)) in args.iter().zip(&sig.params) {
            let found = self.type_of_expr(arg)?;
            merge(
                *param_ty,
                found,
                &format!("parameter '{}' of '{}'", param_id, id),
            )?;
        }
        Ok(sig.ret)
    }

    // ==================== Operator constraints ====================

    fn check_mult_op(&self, op: MultOp, ty: Type) -> Result<()> {
        match op {
            MultOp::And if ty != Type::Bool => Err(Error::TypeMismatch(format!(
                "'and' requires bool operands, found {}",
                ty
            ))),
            MultOp::Div if ty != Type::Float => Err(Error::TypeMismatch(format!(
                "'/' requires float operands, found {}",
                ty
            ))),
            MultOp::Mul if !matches!(ty, Type::Int | Type::Float) => Err(Error::TypeMismatch(
                format!("'*' requires numeric operands, found {}", ty),
            )),
            _ => Ok(()),
        }
    }

    fn check_add_op(&self, op: AddOp, ty: Type) -> Result<()> {
        match op {
            AddOp::Or if ty != Type::Bool => Err(Error::TypeMismatch(format!(
                "'or' requires bool operands, found {}",
                ty
            ))),
            AddOp::Add | AddOp::Sub if !matches!(ty, Type::Int | Type::Float) => {
                Err(Error::TypeMismatch(format!(
                    "'{}' requires numeric operands, found {}",
                    op, ty
                )))
            }
            _ => Ok(()),
        }
    }

    fn check_unary_op(&self, op: UnaryOp, ty: Type) -> Result<()> {
        match op {
            UnaryOp::Not if ty != Type::Bool => Err(Error::TypeMismatch(format!(
                "'not' requires a bool operand, found {}",
                ty
            ))),
            UnaryOp::Minus if !matches!(ty, Type::Int | Type::Float) => Err(Error::TypeMismatch(
                format!("unary '-' requires a numeric operand, found {}", ty),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    fn analyze(source: &str) -> Result<()> {
        let program = Parser::new(Lexer::new(source)).parse_program().unwrap();
        Analyzer::new().analyze(&program)
    }

    #[test]
    fn test_auto_inference() {
        assert_eq!(analyze("let x : auto = 3; let y : int = x;"), Ok(()));
        // x resolved to int; a float no longer fits.
        let err = analyze("let x : auto = 3; x = 2.5;").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { index: 1, ref source } if matches!(**source, Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_operand_agreement() {
        assert_eq!(analyze("let x : int = 1 + 2 * 3;"), Ok(()));
        assert!(analyze("let x : float = 1.5 + 2;").is_err());
        assert!(analyze("let x : int = 1 + true;").is_err());
    }

    #[test]
    fn test_division_requires_float() {
        assert!(analyze("let a : int = 3 / 2;").is_err());
        assert_eq!(analyze("let a : float = 3.0 / 2.0;"), Ok(()));
    }

    #[test]
    fn test_logical_ops_require_bool() {
        assert_eq!(analyze("let a : bool = true and false or true;"), Ok(()));
        assert!(analyze("let a : bool = 1 and 2;").is_err());
        assert!(analyze("let a : bool = not 1;").is_err());
    }

    #[test]
    fn test_relational_synthesizes_bool() {
        assert_eq!(analyze("let a : bool = 1 < 2;"), Ok(()));
        assert!(analyze("let a : int = 1 < 2;").is_err());
        // Operands must still agree with each other.
        assert!(analyze("let a : bool = 1 < 2.5;").is_err());
    }

    #[test]
    fn test_redeclaration_and_shadowing() {
        let err = analyze("let x : int = 1; let x : int = 2;").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { index: 1, ref source }
                if matches!(**source, Error::DuplicateDeclaration { kind: "variable", .. })
        ));

        // Shadowing in an inner scope is fine.
        assert_eq!(analyze("let x : int = 1; { let x : float = 2.5; }"), Ok(()));
    }

    #[test]
    fn test_block_scope_ends() {
        let err = analyze("{ let x : int = 1; } print x;").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { index: 1, ref source }
                if matches!(**source, Error::VarNotFound(_))
        ));
    }

    #[test]
    fn test_conditions_must_be_bool() {
        assert_eq!(analyze("if (1 < 2) { print 1; }"), Ok(()));
        assert!(analyze("if (1) { print 1; }").is_err());
        assert!(analyze("while (0) { print 1; }").is_err());
    }

    #[test]
    fn test_return_coverage() {
        // A return only inside an if does not cover the function.
        let err =
            analyze("ff f(a: int) : int { if (a < 0) { return 0; } }").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { ref source, .. } if matches!(**source, Error::MissingReturn(_))
        ));

        assert_eq!(
            analyze("ff f(a: int) : int { if (a < 0) { return 0; } return a; }"),
            Ok(())
        );
    }

    #[test]
    fn test_return_outside_function() {
        let err = analyze("return 1;").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { ref source, .. } if matches!(**source, Error::InvalidReturn)
        ));
    }

    #[test]
    fn test_auto_return_resolution() {
        assert_eq!(analyze("ff f() : auto { return 1.5; } let x : float = f();"), Ok(()));
        // Declared type binds later returns.
        assert!(analyze("ff f() : int { return 1.5; }").is_err());
    }

    #[test]
    fn test_formal_params_not_auto() {
        assert!(analyze("ff f(a: auto) : int { return 1; }").is_err());
    }

    #[test]
    fn test_call_checks() {
        let src = "ff add(a: int, b: int) : int { return a + b; }";
        assert_eq!(analyze(&format!("{} let x : int = add(2, 3);", src)), Ok(()));

        let err = analyze(&format!("{} let x : int = add(2);", src)).unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { ref source, .. }
                if matches!(**source, Error::Arity { expected: 2, got: 1, .. })
        ));

        assert!(analyze(&format!("{} let x : int = add(2, 3.5);", src)).is_err());
        assert!(analyze(&format!("{} let x : float = add(2, 3);", src)).is_err());

        let err = analyze("let x : int = missing(1);").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { ref source, .. } if matches!(**source, Error::FuncNotFound(_))
        ));
    }

    #[test]
    fn test_function_not_visible_to_own_body() {
        // Signatures are registered after the body is analyzed.
        let err = analyze("ff f(a: int) : int { return f(a); }").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { ref source, .. } if matches!(**source, Error::FuncNotFound(_))
        ));
    }

    #[test]
    fn test_for_header_scope() {
        assert_eq!(
            analyze("for (let i : int = 0; i < 5; i = i + 1) { print i; }"),
            Ok(())
        );
        // The header variable dies with the loop.
        let err = analyze("for (let i : int = 0; i < 5; i = i + 1) { } print i;").unwrap_err();
        assert!(matches!(
            err,
            Error::AtStatement { index: 1, ref source }
                if matches!(**source, Error::VarNotFound(_))
        ));
    }
}
