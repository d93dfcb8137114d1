//! Abstract Syntax Tree definitions for SmallLang
//!
//! A strict tree: every node exclusively owns its children and is
//! immutable once the parser has built it. Operator precedence is
//! structural: `Expr` wraps `SimpleExpr` wraps `Term` wraps `Factor`,
//! and each level's optional recursive tail is present exactly when its
//! operator is, so chains parse right-nested.

use std::fmt;

/// A complete program: the top-level statement sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Block),
    Assign(Assign),
    VarDecl(VarDecl),
    Print(Expr),
    Return(Expr),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    For {
        init: Option<VarDecl>,
        cond: Expr,
        step: Option<Assign>,
        body: Block,
    },
    While {
        cond: Expr,
        body: Block,
    },
    FuncDecl(FuncDecl),
}

/// Brace-delimited statement sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

/// `id = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub id: String,
    pub expr: Expr,
}

/// `let id : type = expr;`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub id: String,
    pub ty: Type,
    pub init: Expr,
}

/// `ff id(params) : type { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub id: String,
    pub params: Vec<FormalParam>,
    pub ret: Type,
    pub body: Block,
}

/// `id : type` in a function declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FormalParam {
    pub id: String,
    pub ty: Type,
}

/// `Expr = SimpleExpr (relOp Expr)?`
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub left: SimpleExpr,
    pub rest: Option<(RelOp, Box<Expr>)>,
}

/// `SimpleExpr = Term (addOp SimpleExpr)?`
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleExpr {
    pub left: Term,
    pub rest: Option<(AddOp, Box<SimpleExpr>)>,
}

/// `Term = Factor (multOp Term)?`
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub left: Factor,
    pub rest: Option<(MultOp, Box<Term>)>,
}

/// Factor: the atoms of the expression grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Factor {
    Id(String),
    Call { id: String, args: Vec<Expr> },
    /// Parenthesized sub-expression
    Sub(Box<Expr>),
    Unary { op: UnaryOp, expr: Box<Expr> },
    Lit(Literal),
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
}

/// Multiplicative operators: `*`, `/`, `and`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultOp {
    Mul,
    Div,
    And,
}

/// Additive operators: `+`, `-`, `or`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOp {
    Add,
    Sub,
    Or,
}

/// Relational operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelOp {
    Lt,
    Le,
    Ne,
    Gt,
    Ge,
    Eq,
}

/// Unary operators: `-`, `not`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Not,
}

/// Declared type. `Auto` is only legal pending inference and never
/// reaches the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Float,
    Int,
    Bool,
    Char,
    Auto,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Float => "float",
            Type::Int => "int",
            Type::Bool => "bool",
            Type::Char => "char",
            Type::Auto => "auto",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for MultOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            MultOp::Mul => "*",
            MultOp::Div => "/",
            MultOp::And => "and",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for AddOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            AddOp::Add => "+",
            AddOp::Sub => "-",
            AddOp::Or => "or",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Ne => "<>",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
            RelOp::Eq => "==",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Minus => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
