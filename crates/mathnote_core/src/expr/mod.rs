//! Arithmetic expression pipeline: tokenize, parse, evaluate.
//!
//! # Responsibility
//! - Interpret note text as arithmetic without any dynamic code execution.
//! - Return typed, position-carrying errors for every failure.
//!
//! # Invariants
//! - Only the grammar in `parser` and the names in `eval::builtin_names()`
//!   are accepted.
//! - All stages are pure and safe to call concurrently.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{builtin_names, evaluate, EvalError};
pub use lexer::{tokenize, LexError};
pub use parser::{parse, ParseError, ParseErrorKind, MAX_TREE_DEPTH};
pub use token::{Token, TokenKind};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure from any stage of `evaluate_str`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    Lex(LexError),
    Parse(ParseError),
    Eval(EvalError),
}

impl ExprError {
    /// Whether the source was blank, i.e. there is nothing to evaluate.
    pub fn is_empty_expression(&self) -> bool {
        matches!(
            self,
            Self::Parse(ParseError {
                kind: ParseErrorKind::EmptyExpression,
                ..
            })
        )
    }

    /// Stable machine-readable code for UI mapping and log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lex(_) => "lex_error",
            Self::Parse(err) => match err.kind {
                ParseErrorKind::UnexpectedToken => "unexpected_token",
                ParseErrorKind::UnbalancedParens => "unbalanced_parens",
                ParseErrorKind::UnexpectedEnd => "unexpected_end",
                ParseErrorKind::EmptyExpression => "empty_expression",
                ParseErrorKind::NestingTooDeep => "nesting_too_deep",
            },
            Self::Eval(err) => match err {
                EvalError::DivisionByZero => "division_by_zero",
                EvalError::UnknownIdentifier(_) => "unknown_identifier",
                EvalError::WrongArity { .. } => "wrong_arity",
                EvalError::DomainError(_) => "domain_error",
                EvalError::Overflow => "overflow",
            },
        }
    }
}

impl Display for ExprError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Eval(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExprError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lex(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Eval(err) => Some(err),
        }
    }
}

impl From<LexError> for ExprError {
    fn from(value: LexError) -> Self {
        Self::Lex(value)
    }
}

impl From<ParseError> for ExprError {
    fn from(value: ParseError) -> Self {
        Self::Parse(value)
    }
}

impl From<EvalError> for ExprError {
    fn from(value: EvalError) -> Self {
        Self::Eval(value)
    }
}

/// Runs the full pipeline on `source`.
pub fn evaluate_str(source: &str) -> Result<f64, ExprError> {
    let tokens = tokenize(source)?;
    let expr = parse(&tokens)?;
    Ok(evaluate(&expr)?)
}
