//! conslisp - a minimal homoiconic list-processing language
//!
//! Source text is read into a [`ast::Value`], a chain of reference-counted cons
//! cells, and that *same* value is then walked by the evaluator. Code and data
//! share one representation, which is what lets `quote` hand back a piece of
//! code as plain data and `eval` run it again later.
//!
//! ```text
//! (+ 5.90 (- 10 2.1) (* 2 2))        ; 17.8
//! (set 'z (list 1 (list 5 4 3 'a)))  ; bind z
//! (nth 3 (car (cdr z)))              ; 'a
//! (set 'q (quote (+ x 5)))           ; code as data
//! (set 'x 11)
//! (eval q)                           ; 16, x is looked up late
//! ```
//!
//! ## Grammar
//!
//! Whitespace-separated tokens grouped by `(` and `)`. The first token inside
//! each pair names the operator. A leading `'` marks a symbol, the bare word
//! `nil` is the empty value, a token made only of digits, `.` and `-` is a
//! number, and anything else is a variable reference.
//!
//! ## Modules
//!
//! - `ast`: the value model and the cons-cell store
//! - `parser`: the single-pass reader
//! - `builtinops`: the builtin operation registry
//! - `evaluator`: the global binding table and the tree-walking evaluator
//! - `session`: `parse_and_eval` as consumed by an interactive shell

use std::fmt;

use crate::builtinops::Arity;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Clone)]
pub enum ParseErrorKind {
    /// A token or form that cannot be read (malformed number, empty form)
    InvalidSyntax,
    /// Input ended while parentheses were still open
    Incomplete,
    /// A closing parenthesis without a matching opening one
    UnexpectedClose,
    /// Nothing to read at all
    EmptyInput,
}

/// A structured error providing detailed information about a parsing failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given char offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        Self::with_context_and_found(kind, message, input, error_offset, None)
    }

    pub fn with_context_and_found(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
        found: Option<String>,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        let context_start = error_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Syntax errors raised while reading source text
    ParseError(ParseError),
    /// Anything that goes wrong while evaluating that is not covered below
    EvalError(String),
    /// An argument of the wrong kind
    TypeError(String),
    /// A call to an operator name that is not in the builtin registry
    UnknownOperator(String),
    /// A builtin invoked with an unsupported argument count
    ArityError {
        operator: String,
        expected: Arity,
        got: usize,
    },
}

impl Error {
    pub fn arity_error(operator: impl Into<String>, expected: Arity, got: usize) -> Self {
        Error::ArityError {
            operator: operator.into(),
            expected,
            got,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(e) => {
                write!(f, "ParseError: {}", e.message)?;
                if let Some(found) = &e.found {
                    write!(f, "\nFound: {found}")?;
                }
                if let Some(context) = &e.context {
                    write!(f, "\nContext: {context}")?;
                }
                Ok(())
            }
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::UnknownOperator(name) => write!(f, "Unknown operator: {name}"),
            Error::ArityError {
                operator,
                expected,
                got,
            } => write!(
                f,
                "ArityError: {operator} expected {expected} arguments but got {got}"
            ),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::ParseError(e)
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod parser;
pub mod session;

pub use ast::{Cell, Value, print};
pub use evaluator::{Environment, eval};
pub use parser::{ParseConfig, parse, parse_with_config};
pub use session::{REPEAT_TOKEN, Session};
