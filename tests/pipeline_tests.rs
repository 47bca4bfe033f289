/// End-to-end integration tests
/// Demonstrates: Scanner → Parser → Evaluator working together
use sprig::{Evaluator, EvaluatorConfig, Parser, Scanner, Value};

fn run(source: &str) -> sprig::Result<Value> {
    let program = Parser::new(Scanner::new(source)).parse()?;
    let mut evaluator = Evaluator::with_output(Vec::new());
    evaluator.execute(&program)
}

fn run_with_output(source: &str) -> (sprig::Result<Value>, String) {
    let mut evaluator = Evaluator::with_output(Vec::new());
    let result = Parser::new(Scanner::new(source))
        .parse()
        .and_then(|program| evaluator.execute(&program));
    let output = String::from_utf8(evaluator.into_output()).unwrap();
    (result, output)
}

#[test]
fn test_e2e_simple_arithmetic() {
    let source = "1 + 2 * 3";

    // Lex
    let mut scanner = Scanner::new(source);
    let tokens = scanner.scan_tokens().unwrap();
    assert_eq!(tokens.len(), 6); // 1 + 2 * 3 EOF

    // Parse
    let mut parser = Parser::from_tokens(tokens);
    let program = parser.parse().unwrap();

    // Evaluate
    let mut evaluator = Evaluator::with_output(Vec::new());
    let result = evaluator.execute(&program).unwrap();

    assert_eq!(result, Value::Number(7.0));
}

#[test]
fn test_e2e_precedence_and_associativity() {
    assert_eq!(run("(1 + 2) * 3").unwrap(), Value::Number(9.0));
    assert_eq!(run("2 * 3 + 4 * 5").unwrap(), Value::Number(26.0));
    assert_eq!(run("100 / 10 / 5").unwrap(), Value::Number(2.0));
    assert_eq!(run("10 - 2 - 3").unwrap(), Value::Number(5.0));
    assert_eq!(run("-3 + 5").unwrap(), Value::Number(2.0));
    assert_eq!(run("1 + 2 < 4 && 2 * 2 == 4").unwrap(), Value::Bool(true));
}

#[test]
fn test_e2e_variables() {
    let source = r#"
        let x = 10;
        let y = 20;
        x + y
    "#;

    assert_eq!(run(source).unwrap(), Value::Number(30.0));
}

#[test]
fn test_e2e_mutation() {
    let source = r#"
        let counter = 0;
        counter = counter + 1;
        counter = counter + 1;
        counter
    "#;

    assert_eq!(run(source).unwrap(), Value::Number(2.0));
}

#[test]
fn test_e2e_factorial() {
    let source = r#"
        fn fact(n) {
            if n <= 1 { 1 } else { n * fact(n - 1) }
        }
        fact(5)
    "#;

    assert_eq!(run(source).unwrap(), Value::Number(120.0));
}

#[test]
fn test_e2e_arrow_recursion() {
    let source = r#"
        let sum_to = (n) => if n == 0 { 0 } else { n + sum_to(n - 1) };
        sum_to(10)
    "#;

    assert_eq!(run(source).unwrap(), Value::Number(55.0));
}

#[test]
fn test_e2e_while_loop() {
    let source = r#"
        let i = 1;
        let product = 1;
        while i <= 6 {
            product = product * i;
            i = i + 1;
        }
        product
    "#;

    assert_eq!(run(source).unwrap(), Value::Number(720.0));
}

#[test]
fn test_e2e_strings() {
    let source = r#"
        let greet = (name) => "hello, " + name + "!";
        greet("world")
    "#;
    assert_eq!(run(source).unwrap(), Value::string("hello, world!"));

    assert_eq!(run(r#"len("tab\there")"#).unwrap(), Value::Number(8.0));
    assert_eq!(run(r#"str(1 + 1) + "x""#).unwrap(), Value::string("2x"));
}

#[test]
fn test_e2e_print_output() {
    let source = r#"
        fn greet(name) { print("hello", name) }
        greet("sprig");
        print(1, true, nil);
        print()
    "#;

    let (result, output) = run_with_output(source);
    assert_eq!(result.unwrap(), Value::Nil);
    assert_eq!(output, "hello sprig\n1 true nil\n\n");
}

#[test]
fn test_e2e_comments_are_ignored() {
    let source = r#"
        // line comment
        let x = /* inline */ 2;
        /* block
           comment */
        x * 21 // trailing
    "#;

    assert_eq!(run(source).unwrap(), Value::Number(42.0));
}

#[test]
fn test_e2e_empty_program() {
    assert_eq!(run("").unwrap(), Value::Nil);
    assert_eq!(run("  // nothing\n").unwrap(), Value::Nil);
    assert_eq!(run(";;;").unwrap(), Value::Nil);
}

#[test]
fn test_e2e_type_builtin() {
    let source = r#"
        type(1) + " " + type("s") + " " + type(true) + " " + type(nil) + " " + type(len)
    "#;

    assert_eq!(
        run(source).unwrap(),
        Value::string("number string bool nil builtin")
    );
}

#[test]
fn test_repl_style_sessions() {
    let mut evaluator = Evaluator::with_output(Vec::new());

    for (source, expected) in [
        ("let base = 10", Some(Value::Number(10.0))),
        ("fn scale(n) { n * base }", None),
        ("scale(4)", Some(Value::Number(40.0))),
        ("base = 3", Some(Value::Number(3.0))),
        ("scale(4)", Some(Value::Number(12.0))),
    ] {
        let program = sprig::parse(source).unwrap();
        let value = evaluator.execute(&program).unwrap();
        match expected {
            Some(expected) => assert_eq!(value, expected, "while running {}", source),
            None => assert_eq!(value.type_name(), "function"),
        }
    }
}

#[test]
fn test_custom_call_depth() {
    let source = "fn down(n) { if n == 0 { 0 } else { down(n - 1) } } down(10)";
    let program = sprig::parse(source).unwrap();

    let config = EvaluatorConfig::default().with_max_call_depth(11);
    let mut evaluator = Evaluator::with_config(config, Vec::new());
    assert_eq!(evaluator.execute(&program).unwrap(), Value::Number(0.0));

    let config = EvaluatorConfig::default().with_max_call_depth(10);
    let mut evaluator = Evaluator::with_config(config, Vec::new());
    assert!(evaluator.execute(&program).is_err());
}

#[test]
fn test_run_convenience() {
    assert_eq!(sprig::run("let x = 2; x * x").unwrap(), Value::Number(4.0));
    assert!(sprig::run("x").is_err());
}
