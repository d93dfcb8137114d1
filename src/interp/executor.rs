//! Tree-walking evaluator for SmallLang
//!
//! A stack machine over the AST: expression evaluation pushes values
//! onto an explicit operand stack, statements consume them. Bindings
//! live in a value-bearing scope chain; function bodies are borrowed
//! from the AST, never cloned.
//!
//! `return` pushes its value and raises the `is_return` flag; every
//! statement-sequence runner stops on the flag without clearing it, so
//! it propagates up through nested blocks and loops until the call site
//! pops the result and lowers the flag.
//!
//! The analyzer has already guaranteed type agreement, so binary
//! dispatch only inspects which concrete operand type is present
//! (float, then int, then bool). Mismatched variants can only be
//! reached on an unanalyzed tree and fail with a runtime error rather
//! than undefined results.

use std::io::Write;

use log::debug;

use crate::frontend::ast::*;
use crate::interp::value::Value;
use crate::scope::{Named, ScopeStack};
use crate::utils::{Error, Result};

/// A live variable binding.
#[derive(Debug, Clone)]
pub struct VarVal {
    pub id: String,
    pub datatype: Type,
    pub value: Value,
}

/// A registered function: signature plus borrowed body.
#[derive(Debug, Clone)]
pub struct FuncVal<'a> {
    pub id: String,
    pub ret: Type,
    pub params: Vec<(String, Type)>,
    pub body: &'a Block,
}

impl Named for VarVal {
    fn name(&self) -> &str {
        &self.id
    }
}

impl Named for FuncVal<'_> {
    fn name(&self) -> &str {
        &self.id
    }
}

fn rel<T: PartialOrd>(op: RelOp, a: T, b: T) -> bool {
    match op {
        RelOp::Lt => a < b,
        RelOp::Le => a <= b,
        RelOp::Ne => a != b,
        RelOp::Gt => a > b,
        RelOp::Ge => a >= b,
        RelOp::Eq => a == b,
    }
}

pub struct Executor<'a, W> {
    scopes: ScopeStack<VarVal, FuncVal<'a>>,
    stack: Vec<Value>,
    is_return: bool,
    out: W,
}

impl<'a, W: Write> Executor<'a, W> {
    /// `out` receives one line per `print` statement.
    pub fn new(out: W) -> Self {
        Self {
            scopes: ScopeStack::new(),
            stack: Vec::new(),
            is_return: false,
            out,
        }
    }

    /// Execute a whole program in one root scope. A runtime error is
    /// tagged with its top-level statement index.
    pub fn execute(&mut self, program: &'a Program) -> Result<()> {
        self.scopes.push_scope();
        let result = self.execute_stmts(&program.stmts);
        self.scopes.pop_scope();
        result
    }

    fn execute_stmts(&mut self, stmts: &'a [Stmt]) -> Result<()> {
        for (index, stmt) in stmts.iter().enumerate() {
            if let Err(e) = self.exec_stmt(stmt) {
                debug!("scope at failure: {}", self.scope_dump());
                return Err(e.at_statement(index));
            }
        }
        Ok(())
    }

    /// The innermost scope's bindings, for failure diagnosis.
    fn scope_dump(&self) -> String {
        let vars: Vec<String> = self
            .scopes
            .innermost_vars()
            .map(|v| format!("{}: {} = {}", v.id, v.datatype, v.value))
            .collect();
        format!("{{{}}}", vars.join(", "))
    }

    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scopes.push_scope();
        let result = f(self);
        self.scopes.pop_scope();
        result
    }

    // ==================== Statements ====================

    fn exec_stmt(&mut self, stmt: &'a Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(block) => self.exec_block(block),
            Stmt::Assign(assign) => self.exec_assign(assign),
            Stmt::VarDecl(decl) => {
                let value = self.eval_to_value(&decl.init)?;
                self.scopes.declare_var(VarVal {
                    id: decl.id.clone(),
                    // auto never survives analysis; the binding carries
                    // the concrete type of the value.
                    datatype: value.datatype(),
                    value,
                });
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.eval_to_value(expr)?;
                writeln!(self.out, "{}", value).map_err(|e| Error::Io(e.to_string()))
            }
            Stmt::Return(expr) => {
                // The value stays on the stack until the call site pops
                // it as the call's result.
                self.eval_expr(expr)?;
                self.is_return = true;
                Ok(())
            }
            Stmt::If {
                cond,
                then_block,
                else_block,
            } => {
                if self.eval_cond(cond)? {
                    self.exec_block(then_block)
                } else if let Some(block) = else_block {
                    self.exec_block(block)
                } else {
                    Ok(())
                }
            }
            Stmt::While { cond, body } => {
                while self.eval_cond(cond)? {
                    self.exec_block(body)?;
                    if self.is_return {
                        break;
                    }
                }
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => self.exec_for(init.as_ref(), cond, step.as_ref(), body),
            Stmt::FuncDecl(func) => {
                let func = FuncVal {
                    id: func.id.clone(),
                    ret: func.ret,
                    params: func
                        .params
                        .iter()
                        .map(|p| (p.id.clone(), p.ty))
                        .collect(),
                    body: &func.body,
                };
                debug!("registered function '{}' returning {}", func.id, func.ret);
                self.scopes.declare_func(func);
                Ok(())
            }
        }
    }

    /// Run a block in its own scope, stopping early when a `return` has
    /// fired; the flag is left raised for the enclosing sequence.
    fn exec_block(&mut self, block: &'a Block) -> Result<()> {
        self.with_scope(|ex| {
            for stmt in &block.stmts {
                ex.exec_stmt(stmt)?;
                if ex.is_return {
                    break;
                }
            }
            Ok(())
        })
    }

    fn exec_assign(&mut self, assign: &'a Assign) -> Result<()> {
        let value = self.eval_to_value(&assign.expr)?;
        let var = self
            .scopes
            .resolve_var_mut(&assign.id)
            .ok_or_else(|| Error::VarNotFound(assign.id.clone()))?;
        var.value = value;
        Ok(())
    }

    fn exec_for(
        &mut self,
        init: Option<&'a VarDecl>,
        cond: &'a Expr,
        step: Option<&'a Assign>,
        body: &'a Block,
    ) -> Result<()> {
        // One loop scope for the header declaration, popped exactly
        // once however the loop ends.
        self.with_scope(|ex| {
            if let Some(decl) = init {
                let value = ex.eval_to_value(&decl.init)?;
                ex.scopes.declare_var(VarVal {
                    id: decl.id.clone(),
                    datatype: value.datatype(),
                    value,
                });
            }
            while ex.eval_cond(cond)? {
                ex.exec_block(body)?;
                if ex.is_return {
                    break;
                }
                if let Some(assign) = step {
                    ex.exec_assign(assign)?;
                }
            }
            Ok(())
        })
    }

    // ==================== Expressions ====================

    fn eval_to_value(&mut self, expr: &'a Expr) -> Result<Value> {
        self.eval_expr(expr)?;
        self.pop()
    }

    fn eval_cond(&mut self, cond: &'a Expr) -> Result<bool> {
        match self.eval_to_value(cond)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::TypeMismatch(format!(
                "condition evaluated to {}, not bool",
                other.datatype()
            ))),
        }
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(Error::StackUnderflow)
    }

    fn eval_expr(&mut self, expr: &'a Expr) -> Result<()> {
        self.eval_simple_expr(&expr.left)?;
        if let Some((op, rest)) = &expr.rest {
            self.eval_expr(rest)?;
            self.apply_rel_op(*op)?;
        }
        Ok(())
    }

    fn eval_simple_expr(&mut self, simple: &'a SimpleExpr) -> Result<()> {
        self.eval_term(&simple.left)?;
        if let Some((op, rest)) = &simple.rest {
            self.eval_simple_expr(rest)?;
            self.apply_add_op(*op)?;
        }
        Ok(())
    }

    fn eval_term(&mut self, term: &'a Term) -> Result<()> {
        self.eval_factor(&term.left)?;
        if let Some((op, rest)) = &term.rest {
            self.eval_term(rest)?;
            self.apply_mult_op(*op)?;
        }
        Ok(())
    }

    fn eval_factor(&mut self, factor: &'a Factor) -> Result<()> {
        match factor {
            Factor::Id(id) => {
                let value = self
                    .scopes
                    .resolve_var(id)
                    .ok_or_else(|| Error::VarNotFound(id.clone()))?
                    .value;
                self.stack.push(value);
                Ok(())
            }
            Factor::Call { id, args } => self.eval_call(id, args),
            Factor::Sub(expr) => self.eval_expr(expr),
            Factor::Unary { op, expr } => {
                self.eval_expr(expr)?;
                self.apply_unary_op(*op)
            }
            Factor::Lit(lit) => {
                self.stack.push(match lit {
                    Literal::Bool(b) => Value::Bool(*b),
                    Literal::Int(i) => Value::Int(*i),
                    Literal::Float(x) => Value::Float(*x),
                    Literal::Char(c) => Value::Char(*c),
                });
                Ok(())
            }
        }
    }

    fn eval_call(&mut self, id: &str, args: &'a [Expr]) -> Result<()> {
        let func = self
            .scopes
            .resolve_func(id)
            .ok_or_else(|| Error::FuncNotFound(id.to_string()))?
            .clone();

        if args.len() != func.params.len() {
            return Err(Error::Arity {
                name: id.to_string(),
                expected: func.params.len(),
                got: args.len(),
            });
        }

        // Actuals are evaluated in the caller's scope, then bound
        // positionally in a fresh parameter scope.
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_to_value(arg)?);
        }

        self.with_scope(|ex| {
            for ((param_id, _), value) in func.params.iter().zip(values) {
                ex.scopes.declare_var(VarVal {
                    id: param_id.clone(),
                    datatype: value.datatype(),
                    value,
                });
            }
            ex.exec_block(func.body)
        })?;

        if !self.is_return {
            return Err(Error::MissingReturn(id.to_string()));
        }
        // Consume the return: the value on the stack becomes the call's
        // result and the flag stops propagating here.
        self.is_return = false;
        Ok(())
    }

    // ==================== Operator dispatch ====================

    fn apply_rel_op(&mut self, op: RelOp) -> Result<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = match (left, right) {
            (Value::Float(a), Value::Float(b)) => rel(op, a, b),
            (Value::Int(a), Value::Int(b)) => rel(op, a, b),
            (Value::Bool(a), Value::Bool(b)) => rel(op, a, b),
            (Value::Char(a), Value::Char(b)) => rel(op, a, b),
            (l, r) => return Err(self.operand_error(op, l, r)),
        };
        self.stack.push(Value::Bool(result));
        Ok(())
    }

    fn apply_add_op(&mut self, op: AddOp) -> Result<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = match (op, left, right) {
            (AddOp::Add, Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (AddOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a + b),
            (AddOp::Sub, Value::Float(a), Value::Float(b)) => Value::Float(a - b),
            (AddOp::Sub, Value::Int(a), Value::Int(b)) => Value::Int(a - b),
            (AddOp::Or, Value::Bool(a), Value::Bool(b)) => Value::Bool(a || b),
            (op, l, r) => return Err(self.operand_error(op, l, r)),
        };
        self.stack.push(result);
        Ok(())
    }

    fn apply_mult_op(&mut self, op: MultOp) -> Result<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let result = match (op, left, right) {
            (MultOp::Mul, Value::Float(a), Value::Float(b)) => Value::Float(a * b),
            (MultOp::Mul, Value::Int(a), Value::Int(b)) => Value::Int(a * b),
            // Division is always floating point.
            (MultOp::Div, Value::Float(a), Value::Float(b)) => Value::Float(a / b),
            (MultOp::And, Value::Bool(a), Value::Bool(b)) => Value::Bool(a && b),
            (op, l, r) => return Err(self.operand_error(op, l, r)),
        };
        self.stack.push(result);
        Ok(())
    }

    fn apply_unary_op(&mut self, op: UnaryOp) -> Result<()> {
        let value = self.pop()?;
        let result = match (op, value) {
            (UnaryOp::Minus, Value::Float(x)) => Value::Float(-x),
            (UnaryOp::Minus, Value::Int(i)) => Value::Int(-i),
            (UnaryOp::Not, Value::Bool(b)) => Value::Bool(!b),
            (op, v) => {
                return Err(Error::TypeMismatch(format!(
                    "operator '{}' not applicable to {}",
                    op,
                    v.datatype()
                )))
            }
        };
        self.stack.push(result);
        Ok(())
    }

    fn operand_error(&self, op: impl std::fmt::Display, l: Value, r: Value) -> Error {
        Error::TypeMismatch(format!(
            "operator '{}' not applicable to {} and {}",
            op,
            l.datatype(),
            r.datatype()
        ))
    }
}
