//! Recursive-descent parser for arithmetic expressions.
//!
//! # Responsibility
//! - Build an `Expr` tree from lexer tokens.
//! - Enforce precedence, left associativity and balanced parentheses.
//!
//! # Grammar
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := '-' factor | primary
//! primary := NUMBER | IDENT '(' args ')' | IDENT | '(' expr ')'
//! args    := expr (',' expr)*
//! ```
//!
//! # Invariants
//! - Unary minus binds tighter than every binary operator.
//! - The height of an accepted tree never exceeds `MAX_TREE_DEPTH`, and
//!   neither does parser recursion, so parsing, evaluation and drop of any
//!   input stay within a bounded stack.
//! - Input that ends inside a `(` group is `UnbalancedParens` at the
//!   innermost unclosed `(`, not `UnexpectedEnd`.

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::token::{Token, TokenKind};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for tree height and for parenthesis/unary nesting.
pub const MAX_TREE_DEPTH: usize = 512;

static END: TokenKind = TokenKind::End;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    UnbalancedParens,
    UnexpectedEnd,
    /// Blank source. Callers treat this as "nothing to evaluate".
    EmptyExpression,
    NestingTooDeep,
}

/// Syntax error with the byte offset of the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: usize,
}

impl ParseError {
    fn new(kind: ParseErrorKind, position: usize) -> Self {
        Self { kind, position }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let position = self.position;
        match self.kind {
            ParseErrorKind::UnexpectedToken => write!(f, "unexpected token at position {position}"),
            ParseErrorKind::UnbalancedParens => {
                write!(f, "unbalanced parenthesis at position {position}")
            }
            ParseErrorKind::UnexpectedEnd => {
                write!(f, "expression ends unexpectedly at position {position}")
            }
            ParseErrorKind::EmptyExpression => write!(f, "expression is empty"),
            ParseErrorKind::NestingTooDeep => write!(
                f,
                "expression nests deeper than {MAX_TREE_DEPTH} levels at position {position}"
            ),
        }
    }
}

impl Error for ParseError {}

/// Parses one complete expression from `tokens`.
///
/// A missing trailing `End` token is tolerated; the parser treats the end of
/// the slice as end of input.
///
/// # Errors
/// - `EmptyExpression` when there is nothing before `End`.
/// - `UnbalancedParens` for an unclosed `(` (at the innermost one) or a
///   stray `)`.
/// - `UnexpectedEnd` when input stops where an operand is required outside
///   any group.
/// - `UnexpectedToken` for any other token out of place.
/// - `NestingTooDeep` when the tree would exceed `MAX_TREE_DEPTH`.
pub fn parse(tokens: &[Token]) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(tokens);
    if parser.at_end() {
        return Err(ParseError::new(
            ParseErrorKind::EmptyExpression,
            parser.offset(),
        ));
    }

    let (expr, _height) = parser.expr()?;
    match parser.peek() {
        TokenKind::End => Ok(expr),
        TokenKind::RParen => Err(ParseError::new(
            ParseErrorKind::UnbalancedParens,
            parser.offset(),
        )),
        _ => Err(ParseError::new(
            ParseErrorKind::UnexpectedToken,
            parser.offset(),
        )),
    }
}

/// Subtree together with its height in nodes.
type Parsed = (Expr, usize);

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    /// Recursion depth of the productions currently on the stack.
    depth: usize,
    /// Offsets of `(` still waiting for their `)`, innermost last.
    open_parens: Vec<usize>,
    end_offset: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let end_offset = tokens.last().map_or(0, |token| token.offset);
        Self {
            tokens,
            pos: 0,
            depth: 0,
            open_parens: Vec::new(),
            end_offset,
        }
    }

    fn peek(&self) -> &'t TokenKind {
        self.tokens.get(self.pos).map_or(&END, |token| &token.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end_offset, |token| token.offset)
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), TokenKind::End)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_TREE_DEPTH {
            return Err(ParseError::new(
                ParseErrorKind::NestingTooDeep,
                self.offset(),
            ));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Height of a new node whose tallest child has `child_height`.
    fn grow(&self, child_height: usize, position: usize) -> Result<usize, ParseError> {
        let height = child_height + 1;
        if height > MAX_TREE_DEPTH {
            return Err(ParseError::new(ParseErrorKind::NestingTooDeep, position));
        }
        Ok(height)
    }

    fn expr(&mut self) -> Result<Parsed, ParseError> {
        let (mut left, mut height) = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let position = self.offset();
            self.advance();
            let (right, right_height) = self.term()?;
            height = self.grow(height.max(right_height), position)?;
            left = Expr::binary(op, left, right);
        }
        Ok((left, height))
    }

    fn term(&mut self) -> Result<Parsed, ParseError> {
        let (mut left, mut height) = self.factor()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            let position = self.offset();
            self.advance();
            let (right, right_height) = self.factor()?;
            height = self.grow(height.max(right_height), position)?;
            left = Expr::binary(op, left, right);
        }
        Ok((left, height))
    }

    fn factor(&mut self) -> Result<Parsed, ParseError> {
        if !matches!(self.peek(), TokenKind::Minus) {
            return self.primary();
        }
        let position = self.offset();
        self.advance();
        self.descend()?;
        let (operand, height) = self.factor()?;
        self.ascend();
        Ok((
            Expr::unary(UnaryOp::Neg, operand),
            self.grow(height, position)?,
        ))
    }

    fn primary(&mut self) -> Result<Parsed, ParseError> {
        let offset = self.offset();
        match self.peek() {
            TokenKind::Number(value) => {
                self.advance();
                Ok((Expr::Literal(*value), 1))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if !matches!(self.peek(), TokenKind::LParen) {
                    let constant = Expr::Call {
                        name: name.clone(),
                        args: Vec::new(),
                    };
                    return Ok((constant, 1));
                }
                let (args, args_height) = self.group(Self::args)?;
                let call = Expr::Call {
                    name: name.clone(),
                    args,
                };
                Ok((call, self.grow(args_height, offset)?))
            }
            TokenKind::LParen => self.group(Self::expr),
            TokenKind::End => Err(self.unexpected_end()),
            _ => Err(ParseError::new(ParseErrorKind::UnexpectedToken, offset)),
        }
    }

    /// Parses `'(' inner ')'` with the cursor on the `(`.
    fn group<T>(
        &mut self,
        inner: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.open_parens.push(self.offset());
        self.advance();
        self.descend()?;
        let parsed = inner(self)?;
        match self.peek() {
            TokenKind::RParen => self.advance(),
            TokenKind::End => return Err(self.unexpected_end()),
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedToken,
                    self.offset(),
                ))
            }
        }
        self.ascend();
        self.open_parens.pop();
        Ok(parsed)
    }

    fn args(&mut self) -> Result<(Vec<Expr>, usize), ParseError> {
        let (first, mut height) = self.expr()?;
        let mut args = vec![first];
        while matches!(self.peek(), TokenKind::Comma) {
            self.advance();
            let (arg, arg_height) = self.expr()?;
            height = height.max(arg_height);
            args.push(arg);
        }
        Ok((args, height))
    }

    /// Input stopped early: inside a group that is an unclosed `(`.
    fn unexpected_end(&self) -> ParseError {
        match self.open_parens.last() {
            Some(&open) => ParseError::new(ParseErrorKind::UnbalancedParens, open),
            None => ParseError::new(ParseErrorKind::UnexpectedEnd, self.offset()),
        }
    }
}
