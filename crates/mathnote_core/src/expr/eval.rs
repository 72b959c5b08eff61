//! Closed-world evaluator for parsed expressions.
//!
//! # Responsibility
//! - Reduce an `Expr` tree to one finite `f64`.
//! - Resolve identifiers only against the fixed `BUILTINS` table.
//!
//! # Invariants
//! - Evaluation is pure: no I/O, no shared mutable state, same tree gives the
//!   same result.
//! - Non-finite values never escape; they become typed `EvalError`s.
//! - Names absent from `BUILTINS` are rejected, never resolved dynamically.

use super::ast::{BinaryOp, Expr, UnaryOp};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::error::Error;
use std::f64::consts;
use std::fmt::{Display, Formatter};

/// Evaluation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    DivisionByZero,
    UnknownIdentifier(String),
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Argument outside the mathematical domain of the named function.
    DomainError(String),
    /// Result or intermediate value is not representable as a finite `f64`.
    Overflow,
}

impl Display for EvalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier `{name}`"),
            Self::WrongArity {
                name,
                expected,
                got,
            } => write!(
                f,
                "`{name}` expects {expected} argument(s), got {got}"
            ),
            Self::DomainError(name) => write!(f, "argument out of domain for `{name}`"),
            Self::Overflow => write!(f, "result is too large to represent"),
        }
    }
}

impl Error for EvalError {}

#[derive(Clone, Copy)]
enum Builtin {
    Constant(f64),
    Unary {
        apply: fn(f64) -> f64,
        domain: Option<fn(f64) -> bool>,
    },
    Binary(fn(f64, f64) -> f64),
}

impl Builtin {
    fn arity(self) -> usize {
        match self {
            Self::Constant(_) => 0,
            Self::Unary { .. } => 1,
            Self::Binary(_) => 2,
        }
    }
}

fn unary(apply: fn(f64) -> f64) -> Builtin {
    Builtin::Unary {
        apply,
        domain: None,
    }
}

fn guarded(apply: fn(f64) -> f64, domain: fn(f64) -> bool) -> Builtin {
    Builtin::Unary {
        apply,
        domain: Some(domain),
    }
}

fn non_negative(x: f64) -> bool {
    x >= 0.0
}

fn positive(x: f64) -> bool {
    x > 0.0
}

fn unit_interval(x: f64) -> bool {
    (-1.0..=1.0).contains(&x)
}

fn sign(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

static BUILTINS: Lazy<BTreeMap<&'static str, Builtin>> = Lazy::new(|| {
    BTreeMap::from([
        ("pi", Builtin::Constant(consts::PI)),
        ("e", Builtin::Constant(consts::E)),
        ("tau", Builtin::Constant(consts::TAU)),
        ("sin", unary(f64::sin)),
        ("cos", unary(f64::cos)),
        ("tan", unary(f64::tan)),
        ("asin", guarded(f64::asin, unit_interval)),
        ("acos", guarded(f64::acos, unit_interval)),
        ("atan", unary(f64::atan)),
        ("sinh", unary(f64::sinh)),
        ("cosh", unary(f64::cosh)),
        ("tanh", unary(f64::tanh)),
        ("sqrt", guarded(f64::sqrt, non_negative)),
        ("cbrt", unary(f64::cbrt)),
        ("abs", unary(f64::abs)),
        ("exp", unary(f64::exp)),
        ("ln", guarded(f64::ln, positive)),
        ("log", guarded(f64::ln, positive)),
        ("log10", guarded(f64::log10, positive)),
        ("log2", guarded(f64::log2, positive)),
        ("floor", unary(f64::floor)),
        ("ceil", unary(f64::ceil)),
        ("round", unary(f64::round)),
        ("trunc", unary(f64::trunc)),
        ("sign", unary(sign)),
        ("pow", Builtin::Binary(f64::powf)),
        ("atan2", Builtin::Binary(f64::atan2)),
        ("hypot", Builtin::Binary(f64::hypot)),
        ("min", Builtin::Binary(f64::min)),
        ("max", Builtin::Binary(f64::max)),
        ("mod", Builtin::Binary(|x, y| x % y)),
    ])
});

/// Returns the names accepted by the evaluator, sorted.
pub fn builtin_names() -> Vec<&'static str> {
    BUILTINS.keys().copied().collect()
}

/// Evaluates `expr` to a finite number.
///
/// Negative zero is normalized to `0.0`.
///
/// # Errors
/// - `DivisionByZero` for `x / 0` and `mod(x, 0)`.
/// - `UnknownIdentifier` / `WrongArity` for calls outside the builtin table.
/// - `DomainError` for out-of-domain function arguments.
/// - `Overflow` for any non-finite literal or intermediate value.
pub fn evaluate(expr: &Expr) -> Result<f64, EvalError> {
    let value = eval_node(expr)?;
    Ok(if value == 0.0 { 0.0 } else { value })
}

fn eval_node(expr: &Expr) -> Result<f64, EvalError> {
    let value = match expr {
        Expr::Literal(value) => *value,
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => -eval_node(operand)?,
        Expr::Binary { op, left, right } => {
            let left = eval_node(left)?;
            let right = eval_node(right)?;
            match op {
                BinaryOp::Add => left + right,
                BinaryOp::Sub => left - right,
                BinaryOp::Mul => left * right,
                BinaryOp::Div if right == 0.0 => return Err(EvalError::DivisionByZero),
                BinaryOp::Div => left / right,
            }
        }
        Expr::Call { name, args } => call(name, args)?,
    };
    finite(value)
}

fn call(name: &str, args: &[Expr]) -> Result<f64, EvalError> {
    let builtin = *BUILTINS
        .get(name)
        .ok_or_else(|| EvalError::UnknownIdentifier(name.to_string()))?;
    if args.len() != builtin.arity() {
        return Err(EvalError::WrongArity {
            name: name.to_string(),
            expected: builtin.arity(),
            got: args.len(),
        });
    }

    let values = args.iter().map(eval_node).collect::<Result<Vec<_>, _>>()?;
    let result = match (builtin, values.as_slice()) {
        (Builtin::Constant(value), []) => value,
        (Builtin::Unary { apply, domain }, [x]) => {
            if domain.is_some_and(|in_domain| !in_domain(*x)) {
                return Err(EvalError::DomainError(name.to_string()));
            }
            apply(*x)
        }
        (Builtin::Binary(apply), [x, y]) => {
            if name == "mod" && *y == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            apply(*x, *y)
        }
        _ => {
            return Err(EvalError::WrongArity {
                name: name.to_string(),
                expected: builtin.arity(),
                got: values.len(),
            })
        }
    };

    if result.is_nan() {
        return Err(EvalError::DomainError(name.to_string()));
    }
    Ok(result)
}

fn finite(value: f64) -> Result<f64, EvalError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::Overflow)
    }
}
