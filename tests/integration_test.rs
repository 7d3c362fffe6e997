//! End-to-end scenarios through the public API only.

#![expect(clippy::unwrap_used)] // test code OK

use conslisp::ast::{func, sym, val, var};
use conslisp::{Environment, Error, ParseErrorKind, REPEAT_TOKEN, Session, Value, eval, parse, print};

fn session() -> Session {
    Session::with_environment(Environment::with_output(Box::new(std::io::sink())))
}

/// Run lines in one session, checking each rendered (tagged) result.
fn run_script(lines: &[(&str, &str)]) {
    let mut session = session();
    for (i, (input, expected)) in lines.iter().enumerate() {
        match session.parse_and_eval(input) {
            Ok(value) => assert_eq!(
                print(&value, true),
                *expected,
                "line #{} '{input}'",
                i + 1
            ),
            Err(e) => panic!("line #{} '{input}' failed: {e}", i + 1),
        }
    }
}

#[test]
fn arithmetic_with_nested_calls() {
    run_script(&[
        ("(+ 5.90 (- 10 2.1) (* 2 2))", "[n] 17.8"),
        ("(/ 8 2 2)", "[n] 2"),
        ("(- 10 2 1)", "[n] 7"),
    ]);

    let mut session = session();
    let value = session
        .parse_and_eval("(+ (+ 3 (/ 8 3) (* (- 10 (+ 3 (* 2 (- 80 79))) 5) 8) (+ 7 (- 6 2))))")
        .unwrap();
    let Value::Number(n) = value else {
        panic!("expected a number, got {value:?}");
    };
    assert!((n - 16.666_666_666_666_664).abs() < 1e-9, "{n}");
}

#[test]
fn nested_lists_through_bindings() {
    run_script(&[
        ("(set 'z (list 1 (list 5 4 3 'a)))", "[c] (1 (5 4 3 'a))"),
        ("(nth 3 (car (cdr z)))", "[s] 'a"),
        ("(car z)", "[n] 1"),
        ("(cdr (list 9))", "nil"),
    ]);
}

#[test]
fn quoted_code_binds_late() {
    run_script(&[
        ("(set 'q (quote (+ x 5)))", "[c] (+ x 5)"),
        ("(set 'x 11)", "[n] 11"),
        ("(eval q)", "[n] 16"),
        ("(set 'x -5)", "[n] -5"),
        ("(eval q)", "[n] 0"),
        (REPEAT_TOKEN, "[n] 0"),
    ]);
}

#[test]
fn car_and_cdr_of_nil() {
    run_script(&[("(car nil)", "nil"), ("(cdr nil)", "nil")]);
}

#[test]
fn unbound_names_read_as_nil() {
    run_script(&[("(get 'ghost)", "nil"), ("(list ghost 1)", "[c] (nil 1)")]);
}

#[test]
fn quote_returns_code_untouched() {
    let mut env = Environment::with_output(Box::new(std::io::sink()));
    let code = parse("(quote (+ x (* 2 y)))").unwrap();
    let expected = Value::list(vec![
        func("+"),
        var("x"),
        Value::list(vec![func("*"), val(2), var("y")]),
    ]);
    assert_eq!(eval(&code, &mut env).unwrap(), expected);
}

#[test]
fn list_indexing_round_trip() {
    let mut session = session();
    session.parse_and_eval("(set 'l (list 'a 2 'c (list 4)))").unwrap();
    let expected = [sym("a"), val(2), sym("c"), val([4])];
    for (i, item) in expected.iter().enumerate() {
        let got = session.parse_and_eval(&format!("(nth {i} l)")).unwrap();
        assert_eq!(&got, item, "index {i}");
    }
    assert_eq!(session.parse_and_eval("(nth 4 l)").unwrap(), Value::Nil);
    assert_eq!(session.parse_and_eval("(nth 40 l)").unwrap(), Value::Nil);
}

#[test]
fn failures_leave_state_alone() {
    let mut session = session();
    session.parse_and_eval("(set 'a 1)").unwrap();

    let cases = vec![
        ("(set 'a (+ 1 2)", "ParseError: Unbalanced parentheses: 1 unclosed '('"),
        ("(nope 1)", "Unknown operator: nope"),
        ("(set 'a (car 'b))", "Type error: car expects a list"),
        ("(nth 1)", "ArityError: nth expected exactly 2 arguments but got 1"),
        (")", "ParseError: Unbalanced parentheses: unexpected ')'"),
    ];

    for (input, expected) in cases {
        match session.parse_and_eval(input) {
            Ok(value) => panic!("'{input}' should fail, got {value:?}"),
            Err(e) => {
                let msg = e.to_string();
                assert!(msg.starts_with(expected), "'{input}' gave unexpected error {msg}");
            }
        }
        assert_eq!(session.environment().lookup("a"), val(1), "after '{input}'");
    }
}

#[test]
fn parse_errors_are_classified() {
    let cases = [
        ("(+ 1 2", ParseErrorKind::Incomplete),
        ("()", ParseErrorKind::InvalidSyntax),
        ("(+ 1.2.3 4)", ParseErrorKind::InvalidSyntax),
        ("   ", ParseErrorKind::EmptyInput),
    ];
    for (input, kind) in cases {
        match parse(input) {
            Err(Error::ParseError(e)) => assert_eq!(e.kind, kind, "'{input}'"),
            other => panic!("'{input}' expected {kind:?}, got {other:?}"),
        }
    }
}

#[test]
fn only_the_first_form_is_read() {
    run_script(&[
        ("(set 'a 2) (set 'a 3)", "[n] 2"),
        ("(get 'a)", "[n] 2"),
        // the stray ')' after a complete form is never read
        ("(+ 1 2))", "[n] 3"),
    ]);
}

#[test]
fn exit_ends_the_session() {
    let mut session = session();
    assert!(!session.exit_requested());
    session.parse_and_eval("(exit)").unwrap();
    assert!(session.exit_requested());
}
