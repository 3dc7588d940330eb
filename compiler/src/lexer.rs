// Lexer for .src source files.
//
// Tokenizes the reference source language (declarations, statements and
// integer/bool expressions). Uses the `logos` crate for DFA-based lexing.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: unrecognized characters or out-of-range integers produce
//   `LexError`; lexing continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Source token types.
///
/// Keywords and symbols are matched as fixed strings. Integer literals carry
/// their value; identifiers carry no value — use the span to retrieve the
/// text from the source.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+|//[^\n]*")]
pub enum Token {
    // ── Keywords ──
    #[token("fun")]
    Fun,
    #[token("val")]
    Val,
    #[token("let")]
    Let,
    #[token("return")]
    Return,
    #[token("print")]
    Print,
    #[token("pub")]
    Pub,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // ── Symbols ──
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("==")]
    EqEq,
    #[token("=")]
    Equals,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("<")]
    Lt,

    // ── Literals ──
    /// Decimal integer literal. Values outside `i64` are lex errors.
    #[regex(r"[0-9]+", parse_int)]
    Int(i64),

    // ── Identifier ──
    //
    // Keywords win over the identifier regex for the same length, so `fun`
    // lexes as Fun while `funny` is an identifier.
    /// Identifier: `[a-zA-Z_][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Fun => write!(f, "fun"),
            Token::Val => write!(f, "val"),
            Token::Let => write!(f, "let"),
            Token::Return => write!(f, "return"),
            Token::Print => write!(f, "print"),
            Token::Pub => write!(f, "pub"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Semi => write!(f, ";"),
            Token::EqEq => write!(f, "=="),
            Token::Equals => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Lt => write!(f, "<"),
            Token::Int(v) => write!(f, "{v}"),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Callbacks ──

fn parse_int(lex: &mut logos::Lexer<'_, Token>) -> Option<i64> {
    lex.slice().parse().ok()
}

// ── Public API ──

/// Lex a source string into tokens.
///
/// Returns all successfully lexed tokens together with any errors. Lexing is
/// non-fatal: errors are collected and the lexer continues past bad input.
pub fn lex(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                let text = &source[span.start..span.end];
                let message = if text.bytes().all(|b| b.is_ascii_digit()) {
                    format!("integer literal out of range: {}", text)
                } else {
                    format!("unexpected character: {:?}", text)
                };
                errors.push(LexError { span, message });
            }
        }
    }

    LexResult { tokens, errors }
}

// ── Tests ──
