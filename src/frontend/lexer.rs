//! Lexer for SmallLang
//!
//! Drives the DFA in `tables` over the source text, one maximal-munch
//! lexeme at a time. Whenever the automaton sits in an accepting state
//! it snapshots the cursor as the best known ending; entering the dead
//! state (or running out of input) rolls the cursor back to that
//! snapshot and classifies the accepted text. Whitespace and comment
//! lexemes are consumed transparently and never surface as tokens.
//!
//! The line counter is incremented eagerly during the forward scan and
//! is not decremented when a newline is rolled back past; each token
//! records the line its lexeme started on.

use crate::frontend::tables::{classify_lexeme, is_final, transition, State};
use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result};

/// The lexer state, tied to one pass over one source text.
pub struct Lexer {
    /// Source text as characters
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Current line, 1-based
    line: usize,
    /// Set once the forward scan has touched end-of-input
    exhausted: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            exhausted: false,
        }
    }

    /// Line number of the scan cursor, for parser diagnostics.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Produce the next token, skipping whitespace and comments.
    ///
    /// Fails with `InvalidLexeme` if no prefix of the remaining input is
    /// accepted by the DFA, and with `EndOfInput` once the source is
    /// spent.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            if let Some(token) = self.scan()? {
                return Ok(token);
            }
        }
    }

    /// Scan one lexeme. `None` means the lexeme was a skip (whitespace
    /// or comment).
    fn scan(&mut self) -> Result<Option<Token>> {
        if self.exhausted {
            return Err(Error::EndOfInput);
        }
        if self.pos >= self.source.len() {
            self.exhausted = true;
            return Err(Error::EndOfInput);
        }

        let start = self.pos;
        let start_line = self.line;
        let mut state = State::Start;
        // Best known ending: accepting state and the position just after
        // its last character.
        let mut best: Option<(State, usize)> = None;

        loop {
            if state == State::Error {
                break;
            }
            if is_final(state) {
                best = Some((state, self.pos));
            }
            match self.source.get(self.pos).copied() {
                // End-of-file pass: finalize whatever the snapshot holds.
                None => {
                    self.exhausted = true;
                    break;
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    state = transition(state, c);
                    self.pos += 1;
                }
            }
        }

        let (end_state, end) = best.ok_or(Error::InvalidLexeme { line: self.line })?;
        // Rollback: restore the cursor to the accepted ending.
        self.pos = end;

        let lexeme: String = self.source[start..end].iter().collect();
        let kind = classify_lexeme(&lexeme, end_state);
        if kind == TokenKind::Skip {
            Ok(None)
        } else {
            Ok(Some(Token::new(kind, lexeme, start_line)))
        }
    }

    /// Collect all remaining tokens (test and diagnostic helper).
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            match self.next_token() {
                Ok(token) => tokens.push(token),
                Err(Error::EndOfInput) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_single_tokens() {
        for (source, kind) in [
            ("<=", TokenKind::RelOp),
            ("<>", TokenKind::RelOp),
            ("==", TokenKind::RelOp),
            ("=", TokenKind::Assign),
            ("3.14", TokenKind::FloatLit),
            ("42", TokenKind::IntLit),
            ("'a'", TokenKind::CharLit),
            ("true", TokenKind::BoolLit),
            ("auto", TokenKind::Auto),
            ("ff", TokenKind::Func),
            ("x_1", TokenKind::Ident),
            (";", TokenKind::Semicolon),
            ("{", TokenKind::OpenBrace),
        ] {
            let tokens = Lexer::new(source).tokenize().unwrap();
            assert_eq!(tokens.len(), 1, "source {:?}", source);
            assert_eq!(tokens[0].kind, kind, "source {:?}", source);
            assert_eq!(tokens[0].lexeme, source);
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        assert!(kinds("// comment\n").is_empty());
        assert!(kinds("/* c */").is_empty());
        assert_eq!(
            kinds("let /* inline */ x"),
            vec![TokenKind::Let, TokenKind::Ident]
        );
    }

    #[test]
    fn test_maximal_munch() {
        // One not-equal token, not '<' then '>'.
        let tokens = Lexer::new("<>").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].lexeme, "<>");

        // One float, not int-period-int.
        let tokens = Lexer::new("12.5").tokenize().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::FloatLit);
    }

    #[test]
    fn test_rollback_splits_trailing_period() {
        // "12." rolls back to the integer; the period is left behind and
        // cannot start a lexeme of its own.
        let mut lexer = Lexer::new("12.x");
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::IntLit);
        assert_eq!(token.lexeme, "12");
        assert_eq!(lexer.next_token(), Err(Error::InvalidLexeme { line: 1 }));
    }

    #[test]
    fn test_statement_stream() {
        assert_eq!(
            kinds("let x : int = 5;"),
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Type,
                TokenKind::Assign,
                TokenKind::IntLit,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let mut lexer = Lexer::new("a\nbb\n\nc");
        assert_eq!(lexer.next_token().unwrap().line, 1);
        assert_eq!(lexer.next_token().unwrap().line, 2);
        assert_eq!(lexer.next_token().unwrap().line, 4);
    }

    #[test]
    fn test_end_of_input() {
        let mut lexer = Lexer::new("x");
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token(), Err(Error::EndOfInput));
        // The lexer stays exhausted.
        assert_eq!(lexer.next_token(), Err(Error::EndOfInput));
    }

    #[test]
    fn test_invalid_lexeme() {
        assert_eq!(
            Lexer::new("?").next_token(),
            Err(Error::InvalidLexeme { line: 1 })
        );
        // Unterminated character literal never reaches an accepting state.
        assert_eq!(
            Lexer::new("'a").next_token(),
            Err(Error::InvalidLexeme { line: 1 })
        );
    }
}
