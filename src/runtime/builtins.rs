//! Built-in functions for Sprig
//!
//! Provides the native primitives installed in the global environment and
//! the registry used to install them.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::error::{Error, Result, RuntimeErrorKind};
use crate::runtime::{Environment, Value};

/// Builtin trait - every native function must implement this
pub trait Builtin: Send + Sync {
    /// Name the builtin is bound to
    fn name(&self) -> &str;

    /// Builtin description
    fn description(&self) -> &str;

    /// Execute the builtin, writing any output to `out`
    fn call(&self, args: &[Value], out: &mut dyn Write) -> Result<Value>;

    /// Exact number of arguments accepted
    fn arity(&self) -> Option<usize> {
        None // None means variadic
    }
}

impl fmt::Debug for dyn Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// Builtin registry
pub struct BuiltinRegistry {
    builtins: HashMap<String, Arc<dyn Builtin>>,
}

impl BuiltinRegistry {
    /// Create new registry with the standard builtins
    pub fn new() -> Self {
        let mut registry = BuiltinRegistry::empty();

        registry.register(PrintBuiltin);
        registry.register(StrBuiltin);
        registry.register(LenBuiltin);
        registry.register(TypeBuiltin);

        registry
    }

    /// Create empty registry
    pub fn empty() -> Self {
        BuiltinRegistry {
            builtins: HashMap::new(),
        }
    }

    /// Register a builtin, replacing any previous one with the same name
    pub fn register<B: Builtin + 'static>(&mut self, builtin: B) {
        let name = builtin.name().to_string();
        self.builtins.insert(name, Arc::new(builtin));
    }

    /// Get builtin by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Builtin>> {
        self.builtins.get(name).cloned()
    }

    /// Check if builtin exists
    pub fn has(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// List all builtin names
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.builtins.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get builtin count
    pub fn count(&self) -> usize {
        self.builtins.len()
    }

    /// Binds every registered builtin in `env`
    pub fn install(&self, env: &Environment) {
        for (name, builtin) in &self.builtins {
            env.define(name.clone(), Value::Builtin(Arc::clone(builtin)));
        }
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// print - write values separated by spaces, then a newline
pub struct PrintBuiltin;

impl Builtin for PrintBuiltin {
    fn name(&self) -> &str {
        "print"
    }

    fn description(&self) -> &str {
        "Write values separated by spaces, followed by a newline"
    }

    fn call(&self, args: &[Value], out: &mut dyn Write) -> Result<Value> {
        let mut line = String::new();
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&arg.to_string());
        }
        line.push('\n');

        out.write_all(line.as_bytes()).map_err(output_error)?;
        out.flush().map_err(output_error)?;

        Ok(Value::Nil)
    }
}

/// str - render a value as a string
pub struct StrBuiltin;

impl Builtin for StrBuiltin {
    fn name(&self) -> &str {
        "str"
    }

    fn description(&self) -> &str {
        "Render a value as a string"
    }

    fn call(&self, args: &[Value], _out: &mut dyn Write) -> Result<Value> {
        Ok(Value::String(single_arg(args)?.to_string()))
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }
}

/// len - number of characters in a string
pub struct LenBuiltin;

impl Builtin for LenBuiltin {
    fn name(&self) -> &str {
        "len"
    }

    fn description(&self) -> &str {
        "Number of characters in a string"
    }

    fn call(&self, args: &[Value], _out: &mut dyn Write) -> Result<Value> {
        match single_arg(args)? {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            other => Err(Error::runtime(RuntimeErrorKind::InvalidArgument {
                builtin: self.name().to_string(),
                reason: format!("expected string, got {}", other.type_name()),
            })),
        }
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }
}

/// type - name of a value's kind
pub struct TypeBuiltin;

impl Builtin for TypeBuiltin {
    fn name(&self) -> &str {
        "type"
    }

    fn description(&self) -> &str {
        "Name of a value's kind"
    }

    fn call(&self, args: &[Value], _out: &mut dyn Write) -> Result<Value> {
        Ok(Value::String(single_arg(args)?.type_name()))
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }
}

/// The sole argument of a one-argument builtin
fn single_arg<'a>(args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [arg] => Ok(arg),
        _ => Err(Error::runtime(RuntimeErrorKind::ArityMismatch {
            expected: 1,
            got: args.len(),
        })),
    }
}

fn output_error(err: std::io::Error) -> Error {
    Error::runtime(RuntimeErrorKind::Output {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct AnswerBuiltin;

    impl Builtin for AnswerBuiltin {
        fn name(&self) -> &str {
            "answer"
        }

        fn description(&self) -> &str {
            "A test builtin"
        }

        fn call(&self, _args: &[Value], _out: &mut dyn Write) -> Result<Value> {
            Ok(Value::Number(42.0))
        }

        fn arity(&self) -> Option<usize> {
            Some(0)
        }
    }

    #[test]
    fn test_standard_registry() {
        let registry = BuiltinRegistry::new();
        assert_eq!(registry.names(), vec!["len", "print", "str", "type"]);
        assert_eq!(registry.count(), 4);
        assert!(registry.get("print").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_builtin_registration() {
        let mut registry = BuiltinRegistry::empty();
        registry.register(AnswerBuiltin);

        assert!(registry.has("answer"));
        assert!(!registry.has("print"));
    }

    #[test]
    fn test_install_binds_globals() {
        let env = Environment::new_global();
        BuiltinRegistry::new().install(&env);

        let print = env.get("print").unwrap();
        assert_eq!(print.type_name(), "builtin");
        assert_eq!(print.to_string(), "<builtin print>");
    }

    #[test]
    fn test_print_writes_line() {
        let mut out = Vec::new();
        let result = PrintBuiltin
            .call(
                &[Value::string("total:"), Value::Number(3.0), Value::Bool(true)],
                &mut out,
            )
            .unwrap();

        assert_eq!(result, Value::Nil);
        assert_eq!(String::from_utf8(out).unwrap(), "total: 3 true\n");
    }

    #[test]
    fn test_print_without_arguments() {
        let mut out = Vec::new();
        PrintBuiltin.call(&[], &mut out).unwrap();
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_print_output_failure() {
        let err = PrintBuiltin
            .call(&[Value::Nil], &mut FailingWriter)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Runtime {
                kind: RuntimeErrorKind::Output { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_str_len_type() {
        let mut out = Vec::new();
        assert_eq!(
            StrBuiltin.call(&[Value::Number(1.5)], &mut out).unwrap(),
            Value::string("1.5")
        );
        assert_eq!(
            LenBuiltin.call(&[Value::string("héllo")], &mut out).unwrap(),
            Value::Number(5.0)
        );
        assert_eq!(
            TypeBuiltin.call(&[Value::Nil], &mut out).unwrap(),
            Value::string("nil")
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_len_rejects_non_strings() {
        let err = LenBuiltin
            .call(&[Value::Number(3.0)], &mut Vec::new())
            .unwrap_err();
        assert_eq!(
            err,
            Error::runtime(RuntimeErrorKind::InvalidArgument {
                builtin: "len".to_string(),
                reason: "expected string, got number".to_string(),
            })
        );
    }
}
