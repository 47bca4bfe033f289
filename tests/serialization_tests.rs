//! Syntax trees and configuration are plain serde data

use sprig::{EvaluatorConfig, Expression, ParserConfig, Program, Statement};

#[test]
fn test_program_serializes_to_json() {
    let program = sprig::parse("let inc = (x) => x + 1; inc(41)").unwrap();

    let json = serde_json::to_value(&program).unwrap();
    let statements = json["statements"].as_array().unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[0]["Let"]["name"], "inc");
    assert_eq!(statements[0]["Let"]["position"]["column"], 1);

    let restored: Program = serde_json::from_value(json).unwrap();
    assert_eq!(restored, program);
}

#[test]
fn test_function_body_survives_serialization() {
    let program = sprig::parse("fn twice(f, x) { f(f(x)) }").unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let restored: Program = serde_json::from_str(&json).unwrap();

    match &restored.statements[0] {
        Statement::Let {
            value: Expression::Function { name, params, body, .. },
            ..
        } => {
            assert_eq!(name.as_deref(), Some("twice"));
            assert_eq!(params, &vec!["f".to_string(), "x".to_string()]);
            assert!(matches!(body.as_ref(), Expression::Block { .. }));
        }
        other => panic!("expected function binding, got {:?}", other),
    }
}

#[test]
fn test_configs_fill_missing_fields_with_defaults() {
    let config: EvaluatorConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, EvaluatorConfig::default());

    let config: EvaluatorConfig = serde_json::from_str(r#"{"max_call_depth": 50}"#).unwrap();
    assert_eq!(config.max_call_depth, 50);

    let config: ParserConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.max_nesting, 128);
}
