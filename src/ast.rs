//! This module defines the value model shared by code and data. The main enum,
//! [`Value`], is both what the parser produces and what the evaluator returns:
//! a parsed call is a [`Value::List`] whose first element carries the
//! [`Value::Function`] tag, and `quote` simply hands that list back untouched.
//!
//! Lists are chains of reference-counted [`Cell`]s. Cells are shared, never
//! deep-copied: binding a list to a name or passing it as an argument clones the
//! `Rc`, not the chain. New cells are only ever created by prepending onto an
//! already finished chain ([`Value::cons`]), so no cycle can be built.
//!
//! Ergonomic helper functions such as [`val`], [`sym`], [`var`] and [`nil`] are
//! provided for building values in code and tests, together with `From`
//! conversions from Rust numbers, arrays and vectors.

use std::fmt;
use std::iter::FusedIterator;
use std::rc::Rc;

/// Type alias for number values in the interpreter
pub type NumberType = f64;

/// Core value type of the interpreter, used for both code and data.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// The empty value; also terminates a chain when it appears as the rest of a list
    Nil,
    /// Numbers (double precision only)
    Number(NumberType),
    /// Quoted atoms (`'a`), never re-evaluated
    Symbol(String),
    /// Bare identifiers, resolved against the binding table right before a call
    Variable(String),
    /// Operator name at the head of a parsed call
    Function(String),
    /// A non-empty chain of cells. The empty sequence is always `Nil`.
    List(Rc<Cell>),
}

/// One link of a chain.
///
/// A pair `(a . b)` is stored as a cell holding `a` whose tail is a single
/// terminal cell holding `b`. For a proper list `b` is the rest of the list
/// (itself a `List`), or `Nil` at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    head: Value,
    tail: Option<Rc<Cell>>,
}

impl Cell {
    /// First element of the chain.
    pub fn car(&self) -> &Value {
        &self.head
    }

    /// Remainder of the chain. A list remainder is returned aliased, an atom as
    /// itself, and `Nil` once the chain is exhausted.
    pub fn cdr(&self) -> Value {
        self.rest().cloned().unwrap_or(Value::Nil)
    }

    /// Borrowed remainder, `None` for the terminal cell.
    pub(crate) fn rest(&self) -> Option<&Value> {
        self.tail.as_deref().map(|tail| &tail.head)
    }

    /// Walks `index` steps down the chain. Returns `Nil` when the chain ends first.
    pub fn nth(&self, index: usize) -> Value {
        let mut current = self;
        let mut remaining = index;
        loop {
            if remaining == 0 {
                return current.head.clone();
            }
            match current.rest() {
                Some(Value::List(next)) => {
                    current = next.as_ref();
                    remaining -= 1;
                }
                // improper tail: the atom itself sits at the next index
                Some(atom) if remaining == 1 => return atom.clone(),
                _ => return Value::Nil,
            }
        }
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            next: Some(self),
            trailing: None,
        }
    }
}

/// Iterator over the elements of a chain, including a trailing non-list atom.
#[derive(Debug, Clone)]
pub struct ListIter<'a> {
    next: Option<&'a Cell>,
    trailing: Option<&'a Value>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(cell) = self.next else {
            return self.trailing.take();
        };
        self.next = None;
        match cell.rest() {
            Some(Value::List(next)) => self.next = Some(next.as_ref()),
            Some(Value::Nil) | None => {}
            Some(atom) => self.trailing = Some(atom),
        }
        Some(&cell.head)
    }
}

impl FusedIterator for ListIter<'_> {}

impl<'a> IntoIterator for &'a Cell {
    type Item = &'a Value;
    type IntoIter = ListIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Value {
    /// Prepend `head` onto `tail`, producing a new cell. `tail` is shared, not copied.
    pub fn cons(head: Value, tail: Value) -> Value {
        let terminal = Rc::new(Cell {
            head: tail,
            tail: None,
        });
        Value::List(Rc::new(Cell {
            head,
            tail: Some(terminal),
        }))
    }

    /// Build a chain from values in order by folding `cons` from the right.
    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Value::Nil, |rest, item| Value::cons(item, rest))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_cell(&self) -> Option<&Rc<Cell>> {
        match self {
            Value::List(cell) => Some(cell),
            _ => None,
        }
    }

    /// True when both values are lists backed by the very same chain.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Diagnostic type tag printed in tagged mode. `Nil` has none.
    pub fn type_tag(&self) -> Option<&'static str> {
        match self {
            Value::Nil => None,
            Value::Number(_) => Some("[n]"),
            Value::Variable(_) => Some("[v]"),
            Value::Symbol(_) => Some("[s]"),
            Value::Function(_) => Some("[f]"),
            Value::List(_) => Some("[c]"),
        }
    }

    /// Human-readable kind name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Number(_) => "number",
            Value::Symbol(_) => "symbol",
            Value::Variable(_) => "variable",
            Value::Function(_) => "function",
            Value::List(_) => "list",
        }
    }

    /// Display adapter that prefixes the type tag.
    pub fn tagged(&self) -> Tagged<'_> {
        Tagged(self)
    }
}

/// Render a value, optionally prefixed with its type tag (`[n] 5`, `[c] (1 2)`).
pub fn print(value: &Value, with_type_tag: bool) -> String {
    if with_type_tag {
        value.tagged().to_string()
    } else {
        value.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Symbol(s) => write!(f, "'{s}"),
            Value::Variable(s) | Value::Function(s) => write!(f, "{s}"),
            Value::List(cell) => {
                write!(f, "(")?;
                for (i, elem) in cell.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// See [`Value::tagged`].
#[derive(Debug, Clone, Copy)]
pub struct Tagged<'a>(&'a Value);

impl fmt::Display for Tagged<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.type_tag() {
            Some(tag) => write!(f, "{tag} {}", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Variable(s) => write!(f, "Variable({s})"),
            Value::Function(s) => write!(f, "Function({s})"),
            Value::List(cell) => {
                write!(f, "List(")?;
                for (i, v) in cell.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// From trait implementations for Value - enables .into() conversion

macro_rules! impl_from_number {
    ($num_type:ty) => {
        impl From<$num_type> for Value {
            fn from(n: $num_type) -> Self {
                Value::Number(n as NumberType)
            }
        }
    };
}

impl_from_number!(i8);
impl_from_number!(i16);
impl_from_number!(i32);
impl_from_number!(i64);
impl_from_number!(u8);
impl_from_number!(u16);
impl_from_number!(u32);
impl_from_number!(usize);
impl_from_number!(f32);
impl_from_number!(NumberType);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::list(arr.into_iter().map(Into::into))
    }
}

/// Helper for creating values - works great in mixed lists!
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper for creating quoted symbols (`'name`)
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper for creating bare variable references
pub fn var<S: AsRef<str>>(name: S) -> Value {
    Value::Variable(name.as_ref().to_owned())
}

/// Helper for creating operator tags
pub fn func<S: AsRef<str>>(name: S) -> Value {
    Value::Function(name.as_ref().to_owned())
}

/// Helper for the empty value
pub fn nil() -> Value {
    Value::Nil
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;

    fn elements(value: &Value) -> Vec<Value> {
        value
            .as_cell()
            .map(|cell| cell.iter().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (val(42), Value::Number(42.0)),
            (val(-17), Value::Number(-17.0)),
            (val(2.5), Value::Number(2.5)),
            (val(255u8), Value::Number(255.0)),
            (sym("a"), Value::Symbol("a".to_owned())),
            (var("x"), Value::Variable("x".to_owned())),
            (func("+"), Value::Function("+".to_owned())),
            (nil(), Value::Nil),
            (val(Vec::<Value>::new()), Value::Nil),
            (
                val([1, 2]),
                Value::cons(val(1), Value::cons(val(2), Value::Nil)),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_car_cdr_of_cons() {
        // atom tail comes back as the atom itself
        let pair = Value::cons(val(1), val(2));
        let cell = pair.as_cell().unwrap();
        assert_eq!(cell.car(), &val(1));
        assert_eq!(cell.cdr(), val(2));

        // list tail comes back as that same list, not wrapped again
        let tail = val([2, 3]);
        let list = Value::cons(val(1), tail.clone());
        let cell = list.as_cell().unwrap();
        assert_eq!(cell.car(), &val(1));
        assert!(cell.cdr().ptr_eq(&tail));
        assert_eq!(list, val([1, 2, 3]));
    }

    #[test]
    fn test_cdr_of_single_element_is_nil() {
        let single = val([7]);
        assert_eq!(single.as_cell().unwrap().cdr(), Value::Nil);
    }

    #[test]
    fn test_list_preserves_order() {
        let list = Value::list(vec![val(1), sym("a"), val([2, 3]), var("x")]);
        assert_eq!(
            elements(&list),
            vec![val(1), sym("a"), val([2, 3]), var("x")]
        );
        assert_eq!(Value::list(Vec::new()), Value::Nil);
    }

    #[test]
    fn test_nth_walks_chain() {
        let items: Vec<Value> = (0..6).map(|i| val(i * 10)).collect();
        let list = Value::list(items.clone());
        let cell = list.as_cell().unwrap();
        for (i, expected) in items.iter().enumerate() {
            assert_eq!(&cell.nth(i), expected, "index {i}");
        }
        assert_eq!(cell.nth(6), Value::Nil);
        assert_eq!(cell.nth(100), Value::Nil);

        let pair = Value::cons(val(1), val(2));
        let cell = pair.as_cell().unwrap();
        assert_eq!(cell.nth(1), val(2));
        assert_eq!(cell.nth(2), Value::Nil);
    }

    #[test]
    fn test_chains_are_shared_not_copied() {
        let shared = val([1, 2, 3]);
        let a = Value::cons(val(0), shared.clone());
        let b = Value::cons(val(9), shared.clone());
        let a_rest = a.as_cell().unwrap().cdr();
        let b_rest = b.as_cell().unwrap().cdr();
        assert!(a_rest.ptr_eq(&shared));
        assert!(a_rest.ptr_eq(&b_rest));
        assert!(!val([1, 2, 3]).ptr_eq(&shared));
    }

    #[test]
    fn test_display() {
        let test_cases = vec![
            (nil(), "nil"),
            (val(17.8), "17.8"),
            (val(2), "2"),
            (val(-0.5), "-0.5"),
            (sym("a"), "'a"),
            (var("x"), "x"),
            (func("+"), "+"),
            (val([1, 2, 3]), "(1 2 3)"),
            (
                Value::list(vec![func("+"), var("x"), val(5)]),
                "(+ x 5)",
            ),
            (
                Value::list(vec![val(1), val([5, 4]), sym("a")]),
                "(1 (5 4) 'a)",
            ),
            (Value::cons(val(1), val(2)), "(1 2)"),
        ];

        for (value, expected) in test_cases {
            assert_eq!(value.to_string(), expected, "display of {value:?}");
        }
    }

    #[test]
    fn test_tagged_print() {
        let test_cases = vec![
            (nil(), "nil"),
            (val(5), "[n] 5"),
            (var("x"), "[v] x"),
            (sym("a"), "[s] 'a"),
            (func("set"), "[f] set"),
            (val([1, 2]), "[c] (1 2)"),
        ];

        for (value, expected) in test_cases {
            assert_eq!(print(&value, true), expected);
            assert_eq!(print(&value, false), value.to_string());
        }
    }

    #[test]
    fn test_deeply_nested_iteration_counts() {
        let list = Value::list((0..50).map(val));
        assert_eq!(list.as_cell().unwrap().iter().count(), 50);
        let pair = Value::cons(val(1), sym("b"));
        assert_eq!(elements(&pair), vec![val(1), sym("b")]);
    }
}
