//! Lexical DFA tables for SmallLang
//!
//! A character-category classifier and an explicit state-transition
//! table. The lexer drives this table directly; nothing here holds any
//! mutable state.

use crate::frontend::token::TokenKind;

/// DFA states. `Error` is a dead state: the table maps every category
/// out of it back to `Error`, and the lexer stops driving the automaton
/// as soon as it is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Start,
    /// Whitespace run
    Delim,
    /// Line comment body, `//...` before the closing newline
    LineCommentOpen,
    /// Line comment closed by a newline
    LineComment,
    /// Block comment body, `/*...` before any closing `*/`
    BlockCommentOpen,
    /// Block comment body having just seen a `*`
    BlockCommentStar,
    /// Block comment closed by `*/`
    BlockComment,
    /// Integer literal
    Int,
    /// Integer followed by `.`, no fractional digit yet
    FloatOpen,
    /// Float literal
    Float,
    /// Identifier or keyword
    Word,
    /// `+` or `-`
    AddOp,
    /// `/`
    Div,
    /// `*`
    Mult,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `<>`
    NotEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// `=`
    Assign,
    /// `==`
    Equal,
    /// One of `(){}[]`
    Bracket,
    /// One of `,:;`
    Separator,
    /// Opening apostrophe of a character literal
    Apostrophe,
    /// Apostrophe plus one character, not yet closed
    CharOpen,
    /// Closed character literal
    CharLit,
    /// Dead state
    Error,
}

pub const NUM_STATES: usize = State::Error as usize + 1;

/// Character categories feeding the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Newline,
    /// Any other whitespace
    Whitespace,
    Digit,
    Period,
    /// Alphabetic or underscore
    Letter,
    /// `+` or `-`
    AddOp,
    Slash,
    Star,
    Less,
    Greater,
    Equals,
    /// `(){}[]`
    Bracket,
    /// `,:;`
    Separator,
    Apostrophe,
    Other,
}

pub const NUM_CATEGORIES: usize = Category::Other as usize + 1;

/// Classify a single character. Total: every character falls in
/// exactly one category.
pub fn classify(c: char) -> Category {
    match c {
        '\n' => Category::Newline,
        c if c.is_whitespace() => Category::Whitespace,
        c if c.is_ascii_digit() => Category::Digit,
        '.' => Category::Period,
        c if c.is_alphabetic() || c == '_' => Category::Letter,
        '+' | '-' => Category::AddOp,
        '/' => Category::Slash,
        '*' => Category::Star,
        '<' => Category::Less,
        '>' => Category::Greater,
        '=' => Category::Equals,
        '(' | ')' | '{' | '}' | '[' | ']' => Category::Bracket,
        ',' | ':' | ';' => Category::Separator,
        '\'' => Category::Apostrophe,
        _ => Category::Other,
    }
}

/// Accepting states of the automaton.
pub fn is_final(s: State) -> bool {
    matches!(
        s,
        State::Delim
            | State::LineComment
            | State::BlockComment
            | State::Int
            | State::Float
            | State::Word
            | State::AddOp
            | State::Div
            | State::Mult
            | State::Less
            | State::LessEq
            | State::NotEq
            | State::Greater
            | State::GreaterEq
            | State::Assign
            | State::Equal
            | State::Bracket
            | State::Separator
            | State::CharLit
    )
}

use State::*;

// Column order matches the State enum; row order matches Category.
// Short aliases keep the rows readable.
const ER: State = Error;
const LCO: State = LineCommentOpen;
const LC: State = LineComment;
const BCO: State = BlockCommentOpen;
const BCS: State = BlockCommentStar;
const BC: State = BlockComment;
const FO: State = FloatOpen;
const CO: State = CharOpen;
const CL: State = CharLit;

/// The transition table: `TRANSITIONS[category][state]` is the successor
/// state. Total over both enumerations; invalid combinations map to the
/// dead `Error` state.
#[rustfmt::skip]
pub const TRANSITIONS: [[State; NUM_STATES]; NUM_CATEGORIES] = [
    //       Start   Delim  LCO   LC  BCO  BCS  BC  Int    FO   Float Word  AddOp Div   Mult  Less   LessEq NotEq Greater GreaterEq Assign Equal Bracket Separator Apos  CharOpen CharLit Error
    /* \n */ [Delim, Delim, LC,   ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* ws */ [Delim, Delim, LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* 0-9*/ [Int,   ER,    LCO,  ER, BCO, BCO, ER, Int,   Float, Float, Word, ER, ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* .  */ [ER,    ER,    LCO,  ER, BCO, BCO, ER, FO,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* a-z*/ [Word,  ER,    LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   Word, ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* +- */ [AddOp, ER,    LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* /  */ [Div,   ER,    LCO,  ER, BCO, BC,  ER, ER,    ER,  ER,   ER,   ER,   LCO,  ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* *  */ [Mult,  ER,    LCO,  ER, BCS, BCS, ER, ER,    ER,  ER,   ER,   ER,   BCO,  ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* <  */ [Less,  ER,    LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* >  */ [Greater, ER,  LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   NotEq, ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* =  */ [Assign, ER,   LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   LessEq, ER,   ER,   GreaterEq, ER,    Equal, ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* () */ [Bracket, ER,  LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* ,: */ [Separator, ER, LCO, ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
    /* '  */ [Apostrophe, ER, LCO, ER, BCO, BCO, ER, ER,   ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   CL,      ER,     ER],
    /* ?? */ [ER,    ER,    LCO,  ER, BCO, BCO, ER, ER,    ER,  ER,   ER,   ER,   ER,   ER,   ER,    ER,    ER,   ER,     ER,       ER,    ER,   ER,     ER,       CO,   ER,      ER,     ER],
];

/// Successor state for one character.
pub fn transition(state: State, c: char) -> State {
    TRANSITIONS[classify(c) as usize][state as usize]
}

/// Try to reclassify an identifier as a keyword.
pub fn keyword_kind(s: &str) -> Option<TokenKind> {
    match s {
        "float" | "int" | "bool" | "char" => Some(TokenKind::Type),
        "auto" => Some(TokenKind::Auto),
        "true" | "false" => Some(TokenKind::BoolLit),
        "and" => Some(TokenKind::MultOp),
        "or" => Some(TokenKind::AddOp),
        "not" => Some(TokenKind::Not),
        "let" => Some(TokenKind::Let),
        "print" => Some(TokenKind::Print),
        "return" => Some(TokenKind::Return),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "for" => Some(TokenKind::For),
        "while" => Some(TokenKind::While),
        "ff" => Some(TokenKind::Func),
        _ => None,
    }
}

/// Map an accepted lexeme and its ending state to a token kind.
/// Whitespace and comments become `Skip`.
pub fn classify_lexeme(lexeme: &str, state: State) -> TokenKind {
    match state {
        Float => TokenKind::FloatLit,
        Int => TokenKind::IntLit,
        Word => keyword_kind(lexeme).unwrap_or(TokenKind::Ident),
        Mult | Div => TokenKind::MultOp,
        AddOp => TokenKind::AddOp,
        Less | LessEq | NotEq | Greater | GreaterEq | Equal => TokenKind::RelOp,
        Assign => TokenKind::Assign,
        Bracket => match lexeme {
            "(" => TokenKind::OpenParen,
            ")" => TokenKind::CloseParen,
            "{" => TokenKind::OpenBrace,
            "}" => TokenKind::CloseBrace,
            "[" => TokenKind::OpenBracket,
            _ => TokenKind::CloseBracket,
        },
        Separator => match lexeme {
            "," => TokenKind::Comma,
            ":" => TokenKind::Colon,
            _ => TokenKind::Semicolon,
        },
        CharLit => TokenKind::CharLit,
        _ => TokenKind::Skip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_total() {
        // Every (category, state) pair has a successor inside the enum.
        for row in TRANSITIONS.iter() {
            assert_eq!(row.len(), NUM_STATES);
        }
        assert_eq!(TRANSITIONS.len(), NUM_CATEGORIES);
    }

    #[test]
    fn test_error_state_is_dead() {
        for row in TRANSITIONS.iter() {
            assert_eq!(row[State::Error as usize], State::Error);
        }
        assert!(!is_final(State::Error));
    }

    #[test]
    fn test_not_equal_path() {
        // '<' then '>' forms the not-equal operator.
        let s = transition(State::Start, '<');
        assert_eq!(s, State::Less);
        assert_eq!(transition(s, '>'), State::NotEq);
        assert_eq!(classify_lexeme("<>", State::NotEq), TokenKind::RelOp);
    }

    #[test]
    fn test_float_path() {
        let mut s = State::Start;
        for c in "12.5".chars() {
            s = transition(s, c);
        }
        assert_eq!(s, State::Float);
        // A trailing period alone is not accepting.
        assert!(!is_final(transition(State::Int, '.')));
    }

    #[test]
    fn test_block_comment_path() {
        let mut s = State::Start;
        for c in "/* c */".chars() {
            s = transition(s, c);
        }
        assert_eq!(s, State::BlockComment);
        assert_eq!(classify_lexeme("/* c */", s), TokenKind::Skip);
    }

    #[test]
    fn test_char_literal_path() {
        let mut s = State::Start;
        for c in "'a'".chars() {
            s = transition(s, c);
        }
        assert_eq!(s, State::CharLit);
        // 'ab' never reaches an accepting state.
        assert_eq!(transition(State::CharOpen, 'b'), State::Error);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(keyword_kind("ff"), Some(TokenKind::Func));
        assert_eq!(keyword_kind("and"), Some(TokenKind::MultOp));
        assert_eq!(keyword_kind("char"), Some(TokenKind::Type));
        assert_eq!(keyword_kind("main"), None);
    }
}
