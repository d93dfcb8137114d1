//! Token definitions for SmallLang

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// Type keyword: float, int, bool, char
    Type,
    /// auto
    Auto,
    /// not
    Not,
    /// let
    Let,
    /// print
    Print,
    /// return
    Return,
    /// if
    If,
    /// else
    Else,
    /// for
    For,
    /// while
    While,
    /// ff (function declaration keyword)
    Func,

    // ============ Literals and Identifiers ============
    /// true or false
    BoolLit,
    /// Integer literal
    IntLit,
    /// Floating-point literal
    FloatLit,
    /// Character literal in apostrophes
    CharLit,
    /// Identifier (unreserved word)
    Ident,

    // ============ Operator Classes ============
    /// * / and
    MultOp,
    /// + - or
    AddOp,
    /// < > <= >= <> ==
    RelOp,
    /// =
    Assign,

    // ============ Brackets and Separators ============
    /// (
    OpenParen,
    /// )
    CloseParen,
    /// {
    OpenBrace,
    /// }
    CloseBrace,
    /// [
    OpenBracket,
    /// ]
    CloseBracket,
    /// ,
    Comma,
    /// :
    Colon,
    /// ;
    Semicolon,

    // ============ Special ============
    /// Whitespace or comment; consumed by the lexer, never surfaced
    Skip,
}
