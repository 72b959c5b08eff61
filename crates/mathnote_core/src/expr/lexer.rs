//! Tokenizer for arithmetic expressions.
//!
//! # Responsibility
//! - Convert raw note text into an ordered token sequence.
//! - Report the first unrecognized character with its byte offset.
//!
//! # Invariants
//! - Output order equals left-to-right scan order of the source.
//! - A successful result always ends with exactly one `TokenKind::End`.
//! - Each loop iteration consumes at least one character.

use super::token::{Token, TokenKind};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::str::CharIndices;

/// Unrecognized character in expression source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset of the offending character.
    pub position: usize,
    pub unexpected: char,
}

impl Display for LexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unexpected character `{}` at position {}",
            self.unexpected, self.position
        )
    }
}

impl Error for LexError {}

/// Splits `source` into tokens, skipping whitespace.
///
/// Blank input yields a single `End` token; the parser decides that this is
/// an empty expression.
///
/// # Errors
/// - Returns `LexError` for any character outside the expression alphabet,
///   including a `.` that does not start or continue a number.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let single = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            chars.next();
            tokens.push(Token::new(kind, offset));
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && next_is_digit(source, offset + 1)) {
            let value = scan_number(source, &mut chars, offset)?;
            tokens.push(Token::new(TokenKind::Number(value), offset));
            continue;
        }

        if c.is_ascii_alphabetic() {
            let name = scan_identifier(source, &mut chars, offset);
            tokens.push(Token::new(TokenKind::Identifier(name), offset));
            continue;
        }

        return Err(LexError {
            position: offset,
            unexpected: c,
        });
    }

    tokens.push(Token::new(TokenKind::End, source.len()));
    Ok(tokens)
}

fn next_is_digit(source: &str, offset: usize) -> bool {
    source
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

fn scan_number(
    source: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
) -> Result<f64, LexError> {
    let mut end = start;
    let mut seen_dot = false;
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = offset + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            end = offset + 1;
        } else {
            break;
        }
        chars.next();
    }

    let literal = &source[start..end];
    literal.parse::<f64>().map_err(|_| LexError {
        position: start,
        unexpected: literal.chars().next().unwrap_or('.'),
    })
}

fn scan_identifier(source: &str, chars: &mut Peekable<CharIndices<'_>>, start: usize) -> String {
    let mut end = start;
    while let Some(&(offset, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            end = offset + 1;
            chars.next();
        } else {
            break;
        }
    }
    source[start..end].to_string()
}
