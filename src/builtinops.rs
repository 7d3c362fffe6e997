//! Built-in operations registry.
//!
//! Every operator a program can call lives in one static table, built once on
//! first use and never modified afterwards. The evaluator looks operators up
//! here by name when it reaches a call.
//!
//! ## Functions vs environment functions
//!
//! - **Functions** only see their resolved arguments (`+`, `car`, `list`, ...)
//! - **Environment functions** also get the [`Environment`], either to touch
//!   the global binding table (`set`, `get`, `dump`), to write output
//!   (`print`), to signal the shell (`exit`) or to re-enter the evaluator
//!   (`eval`)
//!
//! `quote` is not in this registry: it needs its argument unevaluated, so the
//! evaluator handles it before any argument is collected.
//!
//! ## Arguments
//!
//! Builtins receive their arguments already evaluated, resolved and in source
//! order. Arguments that evaluated to `nil` never reach a builtin, which is
//! why `car`, `cdr` and `eval` accept zero arguments (their literal `nil`
//! argument was dropped) and `cons` accepts one.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** as `fn(&[Value]) -> Result<Value, Error>`, or
//!    `fn(&[Value], &mut Environment) -> Result<Value, Error>` if it needs state
//! 2. **Add it to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering edge cases and error conditions

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{NumberType, Value};
use crate::evaluator::{self, Environment};

/// Accepted argument counts for a builtin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments
    Exact(usize),
    /// At least n arguments
    AtLeast(usize),
    /// Between min and max arguments (inclusive)
    Range(usize, usize),
    /// Any number of arguments
    Any,
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::Any => true,
        }
    }

    pub(crate) fn validate(&self, operator: &str, count: usize) -> Result<(), Error> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(Error::arity_error(operator, *self, count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Builtin that only needs its arguments
pub type PureFn = fn(&[Value]) -> Result<Value, Error>;

/// Builtin that also needs the evaluation environment
pub type EnvFn = fn(&[Value], &mut Environment) -> Result<Value, Error>;

/// Represents the implementation of a built-in operation
#[derive(Clone, Copy)]
pub enum OpKind {
    Function(PureFn),
    EnvFunction(EnvFn),
}

impl fmt::Debug for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::EnvFunction(_) => write!(f, "EnvFunction(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The operator name as written in source
    pub id: &'static str,
    pub op_kind: OpKind,
    pub arity: Arity,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl BuiltinOp {
    /// Check the argument count, then run the operation.
    pub fn call(&self, args: &[Value], env: &mut Environment) -> Result<Value, Error> {
        self.arity.validate(self.id, args.len())?;
        match self.op_kind {
            OpKind::Function(f) => f(args),
            OpKind::EnvFunction(f) => f(args, env),
        }
    }

    pub fn needs_environment(&self) -> bool {
        matches!(self.op_kind, OpKind::EnvFunction(_))
    }
}

/// Borrowed iterator over numeric arguments. Every element is type checked up
/// front, so a type error is reported before any arithmetic happens.
#[derive(Debug, Clone)]
pub(crate) struct NumIter<'a> {
    values: std::slice::Iter<'a, Value>,
}

impl<'a> NumIter<'a> {
    pub(crate) fn new(operator: &str, values: &'a [Value]) -> Result<Self, Error> {
        if let Some(bad) = values.iter().find(|v| !matches!(v, Value::Number(_))) {
            return Err(Error::TypeError(format!(
                "{operator} expects numbers, got {} {bad}",
                bad.kind_name()
            )));
        }
        Ok(NumIter {
            values: values.iter(),
        })
    }
}

impl Iterator for NumIter<'_> {
    type Item = NumberType;

    fn next(&mut self) -> Option<Self::Item> {
        self.values.find_map(|v| match v {
            Value::Number(n) => Some(*n),
            _ => None,
        })
    }
}

//
// Builtin Function Implementations
//

/// Left fold for `-` and `/`: the first argument, combined with each following one.
macro_rules! left_fold_op {
    ($name:ident, $op_str:expr, $op:tt) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let mut nums = NumIter::new($op_str, args)?;
            let Some(first) = nums.next() else {
                return Err(Error::arity_error($op_str, Arity::AtLeast(1), 0));
            };
            Ok(Value::Number(nums.fold(first, |acc, n| acc $op n)))
        }
    };
}

left_fold_op!(builtin_sub, "-", -);
left_fold_op!(builtin_div, "/", /);

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let sum = NumIter::new("+", args)?.fold(0.0, |acc, n| acc + n);
    Ok(Value::Number(sum))
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    let product = NumIter::new("*", args)?.fold(1.0, |acc, n| acc * n);
    Ok(Value::Number(product))
}

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    match args {
        [head] => Ok(Value::cons(head.clone(), Value::Nil)),
        [head, tail] => Ok(Value::cons(head.clone(), tail.clone())),
        _ => Err(Error::arity_error("cons", Arity::Range(1, 2), args.len())),
    }
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] | [Value::Nil] => Ok(Value::Nil),
        [Value::List(cell)] => Ok(cell.car().clone()),
        [other] => Err(Error::TypeError(format!(
            "car expects a list or nil, got {} {other}",
            other.kind_name()
        ))),
        _ => Err(Error::arity_error("car", Arity::Range(0, 1), args.len())),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    match args {
        [] | [Value::Nil] => Ok(Value::Nil),
        [Value::List(cell)] => Ok(cell.cdr()),
        [other] => Err(Error::TypeError(format!(
            "cdr expects a list or nil, got {} {other}",
            other.kind_name()
        ))),
        _ => Err(Error::arity_error("cdr", Arity::Range(0, 1), args.len())),
    }
}

fn builtin_nth(args: &[Value]) -> Result<Value, Error> {
    let [index, list] = args else {
        return Err(Error::arity_error("nth", Arity::Exact(2), args.len()));
    };
    let Value::Number(n) = index else {
        return Err(Error::TypeError(format!(
            "nth index must be a number, got {} {index}",
            index.kind_name()
        )));
    };
    let index = n.trunc();
    if index.is_nan() || index < 0.0 {
        return Err(Error::TypeError(format!(
            "nth index must not be negative, got {n}"
        )));
    }
    let Value::List(cell) = list else {
        return Err(Error::TypeError(format!(
            "nth expects a list as second argument, got {} {list}",
            list.kind_name()
        )));
    };
    // saturating float-to-int cast; an oversized index simply runs off the end
    Ok(cell.nth(index as usize))
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::list(args.iter().cloned()))
}

fn builtin_set(args: &[Value], env: &mut Environment) -> Result<Value, Error> {
    let [name, value] = args else {
        return Err(Error::arity_error("set", Arity::Exact(2), args.len()));
    };
    let Value::Symbol(name) = name else {
        return Err(Error::TypeError(format!(
            "set expects a symbol as first argument, got {} {name}",
            name.kind_name()
        )));
    };
    match value {
        Value::Number(_) | Value::Symbol(_) | Value::List(_) | Value::Nil => {}
        Value::Variable(_) | Value::Function(_) => {
            return Err(Error::TypeError(format!(
                "set cannot bind a {} value",
                value.kind_name()
            )));
        }
    }
    // Lists are aliased: the binding shares the caller's chain
    env.bind(name.clone(), value.clone());
    Ok(value.clone())
}

fn builtin_get(args: &[Value], env: &mut Environment) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name)] => Ok(env.lookup(name)),
        [other] => Err(Error::TypeError(format!(
            "get expects a symbol, got {} {other}",
            other.kind_name()
        ))),
        _ => Err(Error::arity_error("get", Arity::Exact(1), args.len())),
    }
}

fn builtin_dump(_args: &[Value], env: &mut Environment) -> Result<Value, Error> {
    for (name, value) in env.bindings() {
        env.write_line(&format!("{name}\t{}", value.tagged()))?;
    }
    Ok(Value::Nil)
}

fn builtin_print(args: &[Value], env: &mut Environment) -> Result<Value, Error> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    env.write_line(&line)?;
    Ok(Value::Nil)
}

fn builtin_eval(args: &[Value], env: &mut Environment) -> Result<Value, Error> {
    match args {
        [] => Ok(Value::Nil),
        [code] => evaluator::eval(code, env),
        _ => Err(Error::arity_error("eval", Arity::Range(0, 1), args.len())),
    }
}

fn builtin_exit(_args: &[Value], env: &mut Environment) -> Result<Value, Error> {
    env.request_exit();
    Ok(Value::Nil)
}

/// Global registry of all built-in operations, built once on first use.
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        // Arithmetic operations
        BuiltinOp {
            id: "+",
            op_kind: OpKind::Function(builtin_add),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "-",
            op_kind: OpKind::Function(builtin_sub),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            id: "*",
            op_kind: OpKind::Function(builtin_mul),
            arity: Arity::Any,
        },
        BuiltinOp {
            id: "/",
            op_kind: OpKind::Function(builtin_div),
            arity: Arity::AtLeast(1),
        },
        // List operations
        BuiltinOp {
            id: "cons",
            op_kind: OpKind::Function(builtin_cons),
            arity: Arity::Range(1, 2),
        },
        BuiltinOp {
            id: "car",
            op_kind: OpKind::Function(builtin_car),
            arity: Arity::Range(0, 1),
        },
        BuiltinOp {
            id: "cdr",
            op_kind: OpKind::Function(builtin_cdr),
            arity: Arity::Range(0, 1),
        },
        BuiltinOp {
            id: "nth",
            op_kind: OpKind::Function(builtin_nth),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "list",
            op_kind: OpKind::Function(builtin_list),
            arity: Arity::Any,
        },
        // Global bindings
        BuiltinOp {
            id: "set",
            op_kind: OpKind::EnvFunction(builtin_set),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            id: "get",
            op_kind: OpKind::EnvFunction(builtin_get),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            id: "dump",
            op_kind: OpKind::EnvFunction(builtin_dump),
            arity: Arity::Exact(0),
        },
        // Output
        BuiltinOp {
            id: "print",
            op_kind: OpKind::EnvFunction(builtin_print),
            arity: Arity::Any,
        },
        // Evaluation and shell control
        BuiltinOp {
            id: "eval",
            op_kind: OpKind::EnvFunction(builtin_eval),
            arity: Arity::Range(0, 1),
        },
        BuiltinOp {
            id: "exit",
            op_kind: OpKind::EnvFunction(builtin_exit),
            arity: Arity::Exact(0),
        },
    ]
});

static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.id, op)).collect()
});

/// Get all builtin operations
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its operator name
pub fn find_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(id).copied()
}
