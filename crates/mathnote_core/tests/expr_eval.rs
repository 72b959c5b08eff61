use mathnote_core::{
    evaluate, evaluate_str, parse, tokenize, EvalError, ExprError, ParseError, ParseErrorKind,
};

fn eval(source: &str) -> f64 {
    evaluate_str(source).unwrap_or_else(|err| panic!("`{source}` failed: {err}"))
}

fn eval_err(source: &str) -> EvalError {
    match evaluate_str(source).unwrap_err() {
        ExprError::Eval(err) => err,
        other => panic!("`{source}` failed outside evaluation: {other}"),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn documented_examples_evaluate() {
    assert_eq!(eval("2 + 3 * 4"), 14.0);
    assert_eq!(eval("(2 + 3) * 4"), 20.0);
    assert_eq!(eval("-3 + 4"), 1.0);
    assert_eq!(eval("sqrt(16)"), 4.0);
}

#[test]
fn division_by_zero_is_typed_error() {
    assert_eq!(eval_err("1/0"), EvalError::DivisionByZero);
    assert_eq!(eval_err("5 / (2 - 2)"), EvalError::DivisionByZero);
    assert_eq!(eval_err("mod(5, 0)"), EvalError::DivisionByZero);
}

#[test]
fn blank_source_is_empty_expression_not_a_crash() {
    let err = evaluate_str("   ").unwrap_err();
    assert!(err.is_empty_expression());
    assert_eq!(err.code(), "empty_expression");

    assert_eq!(
        parse(&tokenize("").unwrap()).unwrap_err().kind,
        ParseErrorKind::EmptyExpression
    );
    assert_eq!(parse(&[]).unwrap_err().kind, ParseErrorKind::EmptyExpression);
}

#[test]
fn unclosed_paren_is_unbalanced() {
    assert_eq!(
        evaluate_str("(1 + 2").unwrap_err(),
        ExprError::Parse(ParseError {
            kind: ParseErrorKind::UnbalancedParens,
            position: 0,
        })
    );
}

#[test]
fn operator_semantics_follow_ieee_doubles() {
    assert_close(eval("0.1 + 0.2"), 0.1 + 0.2);
    assert_eq!(eval("10 - 4 - 3"), 3.0);
    assert_eq!(eval("2 * -3"), -6.0);
    assert_eq!(eval("--4"), 4.0);
    assert_eq!(eval("7 / 2"), 3.5);
    assert_eq!(eval("-(2 + 3) * 2"), -10.0);
}

#[test]
fn constants_and_functions_resolve_from_table() {
    assert_close(eval("pi"), std::f64::consts::PI);
    assert_close(eval("e"), std::f64::consts::E);
    assert_close(eval("2 * pi"), eval("tau"));
    assert_close(eval("sin(pi / 2)"), 1.0);
    assert_close(eval("cos(0)"), 1.0);
    assert_eq!(eval("abs(-7.5)"), 7.5);
    assert_eq!(eval("pow(2, 10)"), 1024.0);
    assert_eq!(eval("max(3, min(9, 4))"), 4.0);
    assert_close(eval("log10(1000)"), 3.0);
    assert_close(eval("log2(8)"), 3.0);
    assert_close(eval("ln(e)"), 1.0);
    assert_eq!(eval("floor(2.7) + ceil(2.1) + round(2.5) + trunc(-2.7)"), 6.0);
    assert_eq!(eval("sign(-3) + sign(0) + sign(8)"), 0.0);
    assert_close(eval("hypot(3, 4)"), 5.0);
    assert_eq!(eval("mod(7, 3)"), 1.0);
}

#[test]
fn unknown_identifiers_are_rejected() {
    assert_eq!(
        eval_err("eval(1)"),
        EvalError::UnknownIdentifier("eval".to_string())
    );
    assert_eq!(
        eval_err("x + 1"),
        EvalError::UnknownIdentifier("x".to_string())
    );
    assert_eq!(
        eval_err("PI"),
        EvalError::UnknownIdentifier("PI".to_string())
    );
}

#[test]
fn arity_mismatch_is_reported_with_counts() {
    assert_eq!(
        eval_err("sqrt(1, 2)"),
        EvalError::WrongArity {
            name: "sqrt".to_string(),
            expected: 1,
            got: 2,
        }
    );
    assert_eq!(
        eval_err("sin"),
        EvalError::WrongArity {
            name: "sin".to_string(),
            expected: 1,
            got: 0,
        }
    );
    assert_eq!(
        eval_err("pi(2)"),
        EvalError::WrongArity {
            name: "pi".to_string(),
            expected: 0,
            got: 1,
        }
    );
}

#[test]
fn domain_violations_are_typed_errors() {
    assert_eq!(eval_err("sqrt(-1)"), EvalError::DomainError("sqrt".to_string()));
    assert_eq!(eval_err("ln(0)"), EvalError::DomainError("ln".to_string()));
    assert_eq!(eval_err("log(-2)"), EvalError::DomainError("log".to_string()));
    assert_eq!(eval_err("asin(2)"), EvalError::DomainError("asin".to_string()));
    assert_eq!(eval_err("acos(-1.5)"), EvalError::DomainError("acos".to_string()));
    assert_eq!(
        eval_err("pow(-8, 0.5)"),
        EvalError::DomainError("pow".to_string())
    );
}

#[test]
fn non_finite_results_are_overflow() {
    assert_eq!(eval_err("exp(1000)"), EvalError::Overflow);
    assert_eq!(eval_err("pow(10, 200) * pow(10, 200)"), EvalError::Overflow);
    let huge = format!("1{}", "0".repeat(400));
    assert_eq!(eval_err(&huge), EvalError::Overflow);
}

#[test]
fn stacked_operator_chains_are_rejected_not_crashing() {
    let mut source = "1".to_string();
    for _ in 0..250 {
        source = format!("({source}){}", "+1".repeat(250));
    }
    let err = evaluate_str(&source).unwrap_err();
    assert!(
        matches!(
            err,
            ExprError::Parse(ParseError {
                kind: ParseErrorKind::NestingTooDeep,
                ..
            })
        ),
        "unexpected error: {err:?}"
    );
}

#[test]
fn deepest_accepted_chain_evaluates() {
    let source = vec!["1"; 500].join(" + ");
    assert_eq!(eval(&source), 500.0);
}

#[test]
fn lexer_rejects_code_injection_attempts() {
    for source in [
        "process.exit(1)",
        "require('fs')",
        "1; drop table",
        "a = 2",
        "2 ^ 3",
        "\"str\"",
    ] {
        let err = evaluate_str(source).unwrap_err();
        assert!(
            matches!(err, ExprError::Lex(_) | ExprError::Parse(_)),
            "`{source}` should fail before evaluation, got {err:?}"
        );
    }
}

#[test]
fn lex_error_carries_position_and_character() {
    match evaluate_str("12 % 5").unwrap_err() {
        ExprError::Lex(err) => {
            assert_eq!(err.position, 3);
            assert_eq!(err.unexpected, '%');
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn evaluation_is_deterministic_and_thread_safe() {
    let sources = ["2 + 3 * 4", "sin(1) * cos(2) / 3", "pow(1.5, 7) - sqrt(2)"];
    let expected: Vec<f64> = sources.iter().map(|source| eval(source)).collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    for (source, want) in sources.iter().zip(&expected) {
                        assert_eq!(evaluate_str(source).unwrap().to_bits(), want.to_bits());
                    }
                }
            });
        }
    });
}

#[test]
fn parsed_tree_can_be_evaluated_repeatedly() {
    let expr = parse(&tokenize("(1 + 2) * 3").unwrap()).unwrap();
    assert_eq!(evaluate(&expr), Ok(9.0));
    assert_eq!(evaluate(&expr), Ok(9.0));
}
