//! Lexical token model for arithmetic expressions.

/// Token category produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Decimal literal, already converted to `f64`.
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    /// Call argument separator.
    Comma,
    /// Function or constant name.
    Identifier(String),
    /// Terminator appended after the last real token.
    End,
}

/// One token and the byte offset where it starts in the source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}
