//! Error handling for SmallLang

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Interpreter error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexer Errors ====================

    #[error("line {line}: no prefix of the remaining input forms a valid lexeme")]
    InvalidLexeme { line: usize },

    #[error("end of input reached")]
    EndOfInput,

    // ==================== Parser Errors ====================

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    // ==================== Semantic / Runtime Errors ====================

    #[error("variable '{0}' not found in scope")]
    VarNotFound(String),

    #[error("function '{0}' not found in scope")]
    FuncNotFound(String),

    #[error("{kind} '{name}' already declared in this scope")]
    DuplicateDeclaration { kind: &'static str, name: String },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("function '{name}' expects {expected} parameter(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("return statement outside a function body")]
    InvalidReturn,

    #[error("function '{0}' has no top-level return statement")]
    MissingReturn(String),

    /// Only reachable if the evaluator runs over an unchecked tree.
    #[error("operand stack underflow")]
    StackUnderflow,

    /// A semantic or runtime error tagged with the index of the
    /// top-level statement it surfaced in.
    #[error("statement {index}: {source}")]
    AtStatement {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    // ==================== I/O ====================

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Attach the top-level statement index, unless one is already recorded.
    pub fn at_statement(self, index: usize) -> Error {
        match self {
            Error::AtStatement { .. } => self,
            other => Error::AtStatement {
                index,
                source: Box::new(other),
            },
        }
    }
}
