use std::io::{self, Write};
use std::sync::Arc;

use crate::error::{Error, Result, RuntimeErrorKind};
use crate::parser::{BinaryOp, Expression, LogicalOp, Program, Statement, UnaryOp};
use crate::runtime::value::type_mismatch;
use crate::runtime::{
    Builtin, BuiltinRegistry, Closure, Env, Environment, EvaluatorConfig, Value,
};

/// Tree-walking evaluator
///
/// Evaluates a parsed [`Program`] against a chain of environment frames:
/// - `let` opens a fresh frame for the rest of its sequence, so re-binding a
///   name shadows it instead of mutating it
/// - `name = value` mutates the nearest existing binding
/// - functions capture the frame they are created in
/// - built-ins live in the global frame and write to the evaluator's output
///
/// Top-level bindings survive between [`Evaluator::execute`] calls, so a host
/// can feed a program one unit at a time.
///
/// Nesting is bounded by [`EvaluatorConfig`]: running past either limit fails
/// with `StackOverflow` instead of exhausting the native stack.
///
/// A `let` initializer runs in the frame it binds into, so a function bound
/// with `let` (or `fn name`) holds a reference to its own frame. Such frames
/// are never freed, even after [`Evaluator::reset`]; hosts that define
/// functions inside long-running loops grow memory by one frame per
/// definition.
pub struct Evaluator<W: Write = io::Stdout> {
    /// Frame the next top-level statement runs in
    env: Env,
    /// Root frame holding the built-ins
    globals: Env,
    /// Output channel for `print`
    output: W,
    config: EvaluatorConfig,
    /// Number of user function calls currently active
    call_depth: usize,
    /// Number of expression evaluations currently active
    eval_depth: usize,
}

impl Evaluator {
    /// Creates an evaluator that prints to stdout
    pub fn new() -> Self {
        Evaluator::with_output(io::stdout())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Evaluator<W> {
    /// Creates an evaluator that prints to `output`
    pub fn with_output(output: W) -> Self {
        Self::with_config(EvaluatorConfig::default(), output)
    }

    /// Creates an evaluator with custom limits
    pub fn with_config(config: EvaluatorConfig, output: W) -> Self {
        Self::with_registry(&BuiltinRegistry::new(), config, output)
    }

    /// Creates an evaluator whose global frame holds the builtins of `registry`
    pub fn with_registry(registry: &BuiltinRegistry, config: EvaluatorConfig, output: W) -> Self {
        let globals = Environment::new_global();
        registry.install(&globals);

        Evaluator {
            env: Arc::clone(&globals),
            globals,
            output,
            config,
            call_depth: 0,
            eval_depth: 0,
        }
    }

    /// Binds a custom builtin in the global frame
    pub fn define_builtin<B: Builtin + 'static>(&mut self, builtin: B) {
        let name = builtin.name().to_string();
        self.globals.define(name, Value::Builtin(Arc::new(builtin)));
    }

    /// Frame the next top-level statement runs in
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Root frame holding the built-ins
    pub fn globals(&self) -> &Env {
        &self.globals
    }

    /// Evaluation limits
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Output channel
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consumes the evaluator, returning its output channel
    pub fn into_output(self) -> W {
        self.output
    }

    /// Drops every top-level binding made so far
    pub fn reset(&mut self) {
        self.env = Arc::clone(&self.globals);
    }

    /// Execute a program
    ///
    /// Returns the value of the last statement (`nil` for an empty program).
    /// Bindings are kept only when the whole program succeeds.
    pub fn execute(&mut self, program: &Program) -> Result<Value> {
        tracing::debug!(statements = program.statements.len(), "executing program");

        self.call_depth = 0;
        self.eval_depth = 0;
        let env = Arc::clone(&self.env);
        let (value, env) = self.eval_sequence(&program.statements, &env)?;
        self.env = env;

        Ok(value)
    }

    /// Evaluate an expression in `env`
    ///
    /// Errors raised without a position are tagged with the position of the
    /// innermost expression that produced them.
    pub fn evaluate(&mut self, expr: &Expression, env: &Env) -> Result<Value> {
        if self.eval_depth >= self.config.max_eval_depth {
            tracing::warn!(
                limit = self.config.max_eval_depth,
                "evaluation depth limit reached"
            );
            return Err(Error::runtime(RuntimeErrorKind::StackOverflow {
                limit: self.config.max_eval_depth,
            })
            .at(expr.position()));
        }

        self.eval_depth += 1;
        let result = self.eval_expression(expr, env);
        self.eval_depth -= 1;

        result.map_err(|e| e.at(expr.position()))
    }

    /// Calls a function or builtin value with already evaluated arguments
    pub fn call_value(&mut self, function: &Value, args: &[Value]) -> Result<Value> {
        match function {
            Value::Function(closure) => self.call_closure(closure, args),
            Value::Builtin(builtin) => {
                if let Some(arity) = builtin.arity() {
                    check_arity(arity, args.len())?;
                }
                builtin.call(args, &mut self.output)
            }
            other => Err(Error::runtime(RuntimeErrorKind::NotCallable {
                type_name: other.type_name(),
            })),
        }
    }

    // =========================================================================
    // STATEMENTS
    // =========================================================================

    /// Runs statements in order, returning the last value and the frame the
    /// sequence ended in
    fn eval_sequence(&mut self, statements: &[Statement], env: &Env) -> Result<(Value, Env)> {
        let mut env = Arc::clone(env);
        let mut last = Value::Nil;

        for statement in statements {
            last = match statement {
                Statement::Let { name, value, .. } => {
                    let frame = Environment::child(&env);
                    let val = self.evaluate(value, &frame)?;
                    frame.define(name.clone(), val.clone());
                    env = frame;
                    val
                }
                Statement::Expression(expr) => self.evaluate(expr, &env)?,
            };
        }

        Ok((last, env))
    }

    // =========================================================================
    // EXPRESSIONS
    // =========================================================================

    fn eval_expression(&mut self, expr: &Expression, env: &Env) -> Result<Value> {
        match expr {
            Expression::Literal { value, .. } => Ok(Value::from(value)),

            Expression::Identifier { name, .. } => env.get(name),

            Expression::Binary {
                op, left, right, ..
            } => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                apply_binary_op(*op, left, right)
            }

            Expression::Logical {
                op, left, right, ..
            } => self.eval_logical(*op, left, right, env),

            Expression::Unary { op, operand, .. } => {
                let operand = self.evaluate(operand, env)?;
                apply_unary_op(*op, operand)
            }

            Expression::Call { callee, args, .. } => self.eval_call(callee, args, env),

            Expression::Function {
                name, params, body, ..
            } => Ok(Value::Function(Arc::new(Closure {
                name: name.clone(),
                params: params.clone(),
                body: Arc::clone(body),
                env: Arc::clone(env),
            }))),

            Expression::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.eval_if(condition, then_branch, else_branch.as_deref(), env),

            Expression::While {
                condition, body, ..
            } => {
                while self.evaluate(condition, env)?.as_bool()? {
                    self.evaluate(body, env)?;
                }
                Ok(Value::Nil)
            }

            Expression::Assign { name, value, .. } => {
                let val = self.evaluate(value, env)?;
                env.assign(name, val.clone())?;
                Ok(val)
            }

            Expression::Block { statements, .. } => {
                let frame = Environment::child(env);
                let (value, _) = self.eval_sequence(statements, &frame)?;
                Ok(value)
            }
        }
    }

    fn eval_if(
        &mut self,
        condition: &Expression,
        then_branch: &Expression,
        else_branch: Option<&Expression>,
        env: &Env,
    ) -> Result<Value> {
        if self.evaluate(condition, env)?.as_bool()? {
            self.evaluate(then_branch, env)
        } else if let Some(else_branch) = else_branch {
            self.evaluate(else_branch, env)
        } else {
            Ok(Value::Nil)
        }
    }

    fn eval_logical(
        &mut self,
        op: LogicalOp,
        left: &Expression,
        right: &Expression,
        env: &Env,
    ) -> Result<Value> {
        let left = self.evaluate(left, env)?.as_bool()?;
        let short_circuit = match op {
            LogicalOp::And => !left,
            LogicalOp::Or => left,
        };
        if short_circuit {
            return Ok(Value::Bool(left));
        }

        let right = self.evaluate(right, env)?.as_bool()?;
        Ok(Value::Bool(right))
    }

    fn eval_call(&mut self, callee: &Expression, args: &[Expression], env: &Env) -> Result<Value> {
        let function = self.evaluate(callee, env)?;
        if !function.is_callable() {
            return Err(Error::runtime(RuntimeErrorKind::NotCallable {
                type_name: function.type_name(),
            }));
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, env)?);
        }

        self.call_value(&function, &values)
    }

    fn call_closure(&mut self, closure: &Closure, args: &[Value]) -> Result<Value> {
        check_arity(closure.params.len(), args.len())?;

        if self.call_depth >= self.config.max_call_depth {
            tracing::warn!(
                limit = self.config.max_call_depth,
                function = closure.name.as_deref().unwrap_or("<anonymous>"),
                "call depth limit reached"
            );
            return Err(Error::runtime(RuntimeErrorKind::StackOverflow {
                limit: self.config.max_call_depth,
            }));
        }

        tracing::debug!(
            function = closure.name.as_deref().unwrap_or("<anonymous>"),
            arity = args.len(),
            depth = self.call_depth + 1,
            "calling function"
        );

        let frame = Environment::child(&closure.env);
        for (param, arg) in closure.params.iter().zip(args) {
            frame.define(param.clone(), arg.clone());
        }

        self.call_depth += 1;
        let result = self.evaluate(&closure.body, &frame);
        self.call_depth -= 1;

        result
    }
}

fn check_arity(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(Error::runtime(RuntimeErrorKind::ArityMismatch { expected, got }))
    }
}

/// Applies a binary operator to two evaluated operands
pub(crate) fn apply_binary_op(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
            (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
            (Value::String(_), r) => Err(type_mismatch("string", &r)),
            (l, r) => Err(arithmetic_mismatch(&l, &r)),
        },

        BinaryOp::Sub => numeric(left, right, |l, r| Ok(Value::Number(l - r))),
        BinaryOp::Mul => numeric(left, right, |l, r| Ok(Value::Number(l * r))),

        BinaryOp::Div => numeric(left, right, |l, r| {
            if r == 0.0 {
                Err(Error::runtime(RuntimeErrorKind::DivisionByZero))
            } else {
                Ok(Value::Number(l / r))
            }
        }),

        BinaryOp::Mod => numeric(left, right, |l, r| {
            if r == 0.0 {
                Err(Error::runtime(RuntimeErrorKind::DivisionByZero))
            } else {
                Ok(Value::Number(l % r))
            }
        }),

        BinaryOp::Eq => Ok(Value::Bool(same_kind_eq(&left, &right)?)),
        BinaryOp::NotEq => Ok(Value::Bool(!same_kind_eq(&left, &right)?)),

        BinaryOp::Lt => numeric(left, right, |l, r| Ok(Value::Bool(l < r))),
        BinaryOp::Gt => numeric(left, right, |l, r| Ok(Value::Bool(l > r))),
        BinaryOp::LtEq => numeric(left, right, |l, r| Ok(Value::Bool(l <= r))),
        BinaryOp::GtEq => numeric(left, right, |l, r| Ok(Value::Bool(l >= r))),
    }
}

/// Applies a unary operator to an evaluated operand
pub(crate) fn apply_unary_op(op: UnaryOp, operand: Value) -> Result<Value> {
    match op {
        UnaryOp::Neg => Ok(Value::Number(-operand.as_number()?)),
        UnaryOp::Not => Ok(Value::Bool(!operand.as_bool()?)),
    }
}

fn numeric(
    left: Value,
    right: Value,
    apply: impl FnOnce(f64, f64) -> Result<Value>,
) -> Result<Value> {
    match (&left, &right) {
        (Value::Number(l), Value::Number(r)) => apply(*l, *r),
        _ => Err(arithmetic_mismatch(&left, &right)),
    }
}

/// Reports the first operand that is not a number
fn arithmetic_mismatch(left: &Value, right: &Value) -> Error {
    let offender = if matches!(left, Value::Number(_)) {
        right
    } else {
        left
    };
    type_mismatch("number", offender)
}

fn same_kind_eq(left: &Value, right: &Value) -> Result<bool> {
    if left.same_kind(right) {
        Ok(left == right)
    } else {
        Err(type_mismatch(&left.type_name(), right))
    }
}
