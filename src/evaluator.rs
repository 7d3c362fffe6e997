use crate::Error;
use crate::ast::{Cell, Value};
use crate::builtinops::{Arity, find_op};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Global evaluation state: the binding table, the sink `print`/`dump` write
/// to, and the flag the `exit` builtin raises for the surrounding shell.
pub struct Environment {
    bindings: HashMap<String, Value>,
    output: Box<dyn Write>,
    exit_requested: bool,
}

impl Environment {
    /// Empty binding table, output to stdout
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        Environment {
            bindings: HashMap::new(),
            output,
            exit_requested: false,
        }
    }

    /// Bind `name`, replacing any previous value.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(previous) = self.bindings.get(&name) {
            debug!(%name, %previous, %value, "rebinding");
        }
        self.bindings.insert(name, value);
    }

    /// Look a name up. Unbound names yield `Nil`.
    pub fn lookup(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Get all bindings as (name, value) pairs sorted by name
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut result: Vec<_> = self
            .bindings
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }

    /// Whether `exit` has been called in this environment
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub(crate) fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub(crate) fn write_line(&mut self, line: &str) -> Result<(), Error> {
        writeln!(self.output, "{line}")
            .and_then(|()| self.output.flush())
            .map_err(|e| Error::EvalError(format!("failed to write output: {e}")))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.bindings())
            .field("exit_requested", &self.exit_requested)
            .finish_non_exhaustive()
    }
}

/// Evaluate a piece of code against the environment (public API)
///
/// `code` is expected to be a call as produced by the parser (or by `quote`):
/// a list whose head names an operator. `Nil` evaluates to `Nil`; any other
/// bare atom is rejected.
pub fn eval(code: &Value, env: &mut Environment) -> Result<Value, Error> {
    match code {
        Value::Nil => Ok(Value::Nil),
        Value::List(_) => {
            let mut accumulated = Vec::new();
            eval_form(code, env, &mut accumulated, 0).map_err(|err| add_context(err, code))
        }
        atom => Err(Error::EvalError(format!(
            "unsupported: cannot evaluate bare {} {atom} as code",
            atom.kind_name()
        ))),
    }
}

/// Walk one link of a chain.
///
/// Arguments are evaluated in source order on the way down and pushed onto
/// `accumulated` on the way back up, so the accumulator ends up holding them
/// in reverse. `Nil` results are never pushed.
fn eval_form(
    code: &Value,
    env: &mut Environment,
    accumulated: &mut Vec<Value>,
    depth: usize,
) -> Result<Value, Error> {
    let cell = match code {
        Value::Nil => return Ok(Value::Nil),
        Value::List(cell) => cell,
        // improper tail built from data, e.g. (cons 1 2)
        atom => return Ok(atom.clone()),
    };
    trace!(depth, code = %code, "eval");

    let mut result = match cell.car() {
        Value::List(_) => {
            trace!(depth, head = %cell.car(), "nested call");
            let mut nested = Vec::new();
            eval_form(cell.car(), env, &mut nested, depth + 1)?
        }
        Value::Function(name) if name == "quote" => return eval_quote(cell),
        // placeholder until the call below is dispatched
        Value::Function(_) => Value::Nil,
        atom => atom.clone(),
    };

    if let Some(rest) = cell.rest() {
        let value = eval_form(rest, env, accumulated, depth + 1)?;
        if !value.is_nil() {
            trace!(depth, arg = %value, "push");
            accumulated.push(value);
        }
    }

    if let Value::Function(name) = cell.car() {
        result = apply(name, accumulated, env)?;
    }
    Ok(result)
}

/// `(quote x)` hands `x` back exactly as parsed.
fn eval_quote(cell: &Cell) -> Result<Value, Error> {
    let args: Vec<&Value> = match cell.rest() {
        None | Some(Value::Nil) => Vec::new(),
        Some(Value::List(rest)) => rest.iter().collect(),
        Some(atom) => vec![atom],
    };
    match args.as_slice() {
        [quoted] => Ok((*quoted).clone()),
        _ => Err(Error::arity_error("quote", Arity::Exact(1), args.len())),
    }
}

fn apply(name: &str, accumulated: &[Value], env: &mut Environment) -> Result<Value, Error> {
    let op = find_op(name).ok_or_else(|| Error::UnknownOperator(name.to_owned()))?;
    // Collected while unwinding, so reversed back into source order here
    let args: Vec<Value> = accumulated.iter().rev().map(|arg| resolve(arg, env)).collect();
    debug!(operator = name, args = ?args, "dispatch");
    op.call(&args, env)
}

/// Substitute a variable reference by its current binding.
fn resolve(arg: &Value, env: &Environment) -> Value {
    match arg {
        Value::Variable(name) => env.lookup(name),
        other => other.clone(),
    }
}

/// Helper function to add expression context to errors
fn add_context(error: Error, code: &Value) -> Error {
    let context = format!("while evaluating: {code}");
    match error {
        Error::EvalError(msg) => Error::EvalError(format!("{msg}\n  Context: {context}")),
        Error::TypeError(msg) => Error::TypeError(format!("{msg}\n  Context: {context}")),
        // arity and lookup errors already name their operator
        other => other,
    }
}
