//! Error reporting across the pipeline
//!
//! Every failure is a single positioned error; nothing is partially evaluated
//! or recovered.

use sprig::{
    Error, ErrorSeverity, Evaluator, EvaluatorConfig, LexErrorKind, ParseErrorKind, Position,
    RuntimeErrorKind, Value,
};

fn run(source: &str) -> sprig::Result<Value> {
    let program = sprig::parse(source)?;
    Evaluator::with_output(Vec::new()).execute(&program)
}

fn runtime_kind(source: &str) -> RuntimeErrorKind {
    match run(source) {
        Err(Error::Runtime { kind, .. }) => kind,
        other => panic!("expected runtime error for {:?}, got {:?}", source, other),
    }
}

/// Runs `f` on a thread with a generous stack so deep evaluation stays
/// clear of the native stack limit
fn with_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

// =============================================================================
// LEX ERRORS
// =============================================================================

#[test]
fn test_unexpected_character() {
    let err = run("let x = 1 @ 2").unwrap_err();
    assert_eq!(
        err,
        Error::Lex {
            kind: LexErrorKind::UnexpectedCharacter('@'),
            position: Position::new(10, 1, 11),
        }
    );
    assert_eq!(
        err.to_string(),
        "Lex error at line 1, column 11: unexpected character '@'"
    );
}

#[test]
fn test_unterminated_string() {
    let err = run("print(\"oops)").unwrap_err();
    assert_eq!(
        err,
        Error::Lex {
            kind: LexErrorKind::UnterminatedString,
            position: Position::new(6, 1, 7),
        }
    );
}

#[test]
fn test_unterminated_comment() {
    let err = run("1 +\n/* never closed").unwrap_err();
    assert_eq!(
        err,
        Error::Lex {
            kind: LexErrorKind::UnterminatedComment,
            position: Position::new(4, 2, 1),
        }
    );
}

#[test]
fn test_lex_error_stops_before_evaluation() {
    let mut evaluator = Evaluator::with_output(Vec::new());
    let result = sprig::parse("print(1); #").and_then(|program| evaluator.execute(&program));
    assert!(matches!(result, Err(Error::Lex { .. })));
    assert!(evaluator.output().is_empty());
}

// =============================================================================
// PARSE ERRORS
// =============================================================================

#[test]
fn test_missing_operand_at_end_of_input() {
    let err = sprig::parse("(1 + ").unwrap_err();
    assert_eq!(
        err,
        Error::Parse {
            kind: ParseErrorKind::ExpectedExpression,
            position: Position::new(5, 1, 6),
        }
    );
}

#[test]
fn test_unclosed_paren() {
    let err = sprig::parse("(1 + 2").unwrap_err();
    assert_eq!(
        err,
        Error::Parse {
            kind: ParseErrorKind::UnclosedParen,
            position: Position::new(6, 1, 7),
        }
    );
}

#[test]
fn test_unclosed_brace() {
    let err = sprig::parse("fn f() {\n  1").unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            kind: ParseErrorKind::UnclosedBrace,
            ..
        }
    ));
    assert_eq!(err.position(), Some(Position::new(12, 2, 4)));
}

#[test]
fn test_invalid_assignment_target() {
    let err = sprig::parse("1 = 2").unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            kind: ParseErrorKind::InvalidAssignmentTarget,
            ..
        }
    ));
}

#[test]
fn test_invalid_arrow_parameters() {
    let err = sprig::parse("(1, x) => x").unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            kind: ParseErrorKind::InvalidParameter,
            ..
        }
    ));

    let err = sprig::parse("(a, a) => a").unwrap_err();
    assert_eq!(
        err,
        Error::Parse {
            kind: ParseErrorKind::DuplicateParameter("a".to_string()),
            position: Position::new(4, 1, 5),
        }
    );
}

#[test]
fn test_let_requires_identifier() {
    let err = sprig::parse("let 1 = 2").unwrap_err();
    assert_eq!(
        err,
        Error::Parse {
            kind: ParseErrorKind::ExpectedIdentifier,
            position: Position::new(4, 1, 5),
        }
    );
}

#[test]
fn test_parse_error_message() {
    let err = sprig::parse("let x 1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Parse error at line 1, column 7: expected '=' after binding name, found number 1"
    );
}

// =============================================================================
// RUNTIME ERRORS
// =============================================================================

#[test]
fn test_unbound_identifier_in_empty_environment() {
    assert_eq!(
        runtime_kind("x"),
        RuntimeErrorKind::UnboundIdentifier {
            name: "x".to_string()
        }
    );
}

#[test]
fn test_arity_mismatch_both_ways() {
    assert_eq!(
        runtime_kind("let f = (a) => a; f()"),
        RuntimeErrorKind::ArityMismatch {
            expected: 1,
            got: 0
        }
    );
    assert_eq!(
        runtime_kind("let f = (a) => a; f(1, 2)"),
        RuntimeErrorKind::ArityMismatch {
            expected: 1,
            got: 2
        }
    );
}

#[test]
fn test_runtime_error_positions() {
    let err = run("let f = (a) => a;\nf(1, 2)").unwrap_err();
    assert_eq!(err.position(), Some(Position::new(19, 2, 2)));

    let err = run("let s = \"a\";\n-s").unwrap_err();
    assert_eq!(err.position(), Some(Position::new(13, 2, 1)));
    assert_eq!(
        err.to_string(),
        "Runtime error at line 2, column 1: type mismatch: expected number, got string"
    );
}

#[test]
fn test_error_inside_function_points_into_body() {
    let source = "fn broken() {\n  missing\n}\nbroken()";
    let err = run(source).unwrap_err();
    assert_eq!(err.position(), Some(Position::new(16, 2, 3)));
}

#[test]
fn test_not_callable() {
    assert_eq!(
        runtime_kind("\"text\"()"),
        RuntimeErrorKind::NotCallable {
            type_name: "string".to_string()
        }
    );
}

#[test]
fn test_condition_must_be_boolean() {
    assert!(matches!(
        runtime_kind("if nil { 1 }"),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
    assert!(matches!(
        runtime_kind("while 1 { 1 }"),
        RuntimeErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn test_builtin_rejects_argument() {
    assert_eq!(
        runtime_kind("len(42)"),
        RuntimeErrorKind::InvalidArgument {
            builtin: "len".to_string(),
            reason: "expected string, got number".to_string(),
        }
    );
}

#[test]
fn test_error_severity() {
    assert_eq!(run("x").unwrap_err().classify(), ErrorSeverity::Recoverable);
    assert_eq!(
        sprig::parse("(").unwrap_err().classify(),
        ErrorSeverity::Recoverable
    );
}

// =============================================================================
// RECURSION LIMIT
// =============================================================================
//
// These run on the default test thread so the limits are checked against an
// ordinary stack.

fn assert_stack_overflow(err: Error, limit: usize) {
    match &err {
        Error::Runtime {
            kind: RuntimeErrorKind::StackOverflow { limit: found },
            position: Some(_),
        } => assert_eq!(*found, limit),
        other => panic!("expected stack overflow, got {:?}", other),
    }
    assert_eq!(err.classify(), ErrorSeverity::Fatal);
}

#[test]
fn test_unbounded_recursion_reports_stack_overflow() {
    let err = run("fn forever(n) { forever(n + 1) } forever(0)").unwrap_err();
    assert_stack_overflow(err, EvaluatorConfig::default().max_eval_depth);
}

#[test]
fn test_deeply_nested_body_reports_stack_overflow() {
    // Well under the call limit, but every call nests forty operators deep
    let mut body = String::from("f(n - 1)");
    for _ in 0..40 {
        body = format!("1 + ({})", body);
    }
    let source = format!(
        "fn f(n) {{ if n == 0 {{ 0 }} else {{ {} }} }} f(190)",
        body
    );

    let err = run(&source).unwrap_err();
    assert_stack_overflow(err, EvaluatorConfig::default().max_eval_depth);
}

#[test]
fn test_call_limit_trips_before_eval_limit() {
    let config = EvaluatorConfig::default().with_max_call_depth(30);
    let program = sprig::parse("fn forever(n) { forever(n + 1) } forever(0)").unwrap();
    let err = Evaluator::with_config(config, Vec::new())
        .execute(&program)
        .unwrap_err();
    assert_stack_overflow(err, 30);
}

#[test]
fn test_mutual_recursion_reports_stack_overflow() {
    let source = "
        let ping = (n) => pong(n + 1);
        let pong = (n) => ping(n + 1);
        ping(0)
    ";
    // `ping` was created before `pong` existed, so the lookup fails first
    assert!(matches!(
        runtime_kind(source),
        RuntimeErrorKind::UnboundIdentifier { .. }
    ));
}

#[test]
fn test_recursion_below_default_limits_succeeds() {
    let value = run("fn count(n) { if n == 0 { 0 } else { 1 + count(n - 1) } } count(40)").unwrap();
    assert_eq!(value, Value::Number(40.0));
}

#[test]
fn test_raised_limits_on_a_larger_stack() {
    let value = with_big_stack(|| {
        let config = EvaluatorConfig::default().with_max_eval_depth(2_000);
        let program =
            sprig::parse("fn count(n) { if n == 0 { 0 } else { 1 + count(n - 1) } } count(199)")
                .unwrap();
        Evaluator::with_config(config, Vec::new())
            .execute(&program)
            .unwrap()
    });
    assert_eq!(value, Value::Number(199.0));
}

#[test]
fn test_long_else_if_chain_reports_nesting_limit() {
    let mut source = String::from("if false { 0 }");
    for i in 0..50_000 {
        source.push_str(&format!(" else if false {{ {} }}", i));
    }

    let err = sprig::parse(&source).unwrap_err();
    assert!(matches!(
        err,
        Error::Parse {
            kind: ParseErrorKind::NestingTooDeep(128),
            ..
        }
    ));
}

#[test]
fn test_deeply_nested_blocks_report_nesting_limit() {
    let source = format!("{}nil{}", "{ ".repeat(5_000), " }".repeat(5_000));
    assert!(matches!(
        sprig::parse(&source),
        Err(Error::Parse {
            kind: ParseErrorKind::NestingTooDeep(128),
            ..
        })
    ));
}

#[test]
fn test_long_binding_chain_is_released() {
    let mut source = String::new();
    for i in 0..300_000 {
        source.push_str(&format!("let x{} = {};\n", i, i));
    }
    source.push_str("x0");

    let mut evaluator = Evaluator::with_output(Vec::new());
    let program = sprig::parse(&source).unwrap();
    assert_eq!(evaluator.execute(&program).unwrap(), Value::Number(0.0));
    drop(evaluator);
}
