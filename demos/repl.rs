use conslisp::evaluator::Environment;
use conslisp::{ParseConfig, REPEAT_TOKEN, Session, print};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=conslisp=trace shows every evaluation step
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("conslisp - cons cells all the way down");
    println!("Enter expressions like: (+ 5.90 (- 10 2.1) (* 2 2))");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Could not initialize REPL: {err}");
            return;
        }
    };
    let mut session = Session::new().with_parse_config(ParseConfig {
        handle_comments: true,
    });

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                // Add the line to history
                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(session.environment());
                        continue;
                    }
                    ":quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match session.parse_and_eval(line) {
                    Ok(value) => println!("{}", print(&value, true)),
                    Err(e) => println!("Error: {e}"),
                }

                if session.exit_requested() {
                    println!("Goodbye!");
                    break;
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help      - Show this help message");
    println!("  :env       - Show current bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  {REPEAT_TOKEN:<10} - Repeat the last result");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Syntax:");
    println!("  Numbers: 42, -5, 2.1");
    println!("  Symbols: 'name");
    println!("  Variables: name (looked up when the call runs)");
    println!("  Empty value: nil");
    println!("  Comments: ; to end of line");
    println!();
    println!("Operations:");
    println!("  Arithmetic: +, -, *, /");
    println!("  Lists: cons, car, cdr, nth, list");
    println!("  Bindings: set, get, dump");
    println!("  Code as data: quote, eval");
    println!("  Other: print, exit");
    println!();
    println!("Examples:");
    println!("  (set 'z (list 1 (list 5 4 3 'a)))");
    println!("  (nth 3 (car (cdr z)))");
    println!("  (set 'q (quote (+ x 5)))");
    println!("  (set 'x 11)");
    println!("  (eval q)");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.bindings();

    if bindings.is_empty() {
        println!("No bindings.");
        return;
    }

    println!("Bindings ({} total):", bindings.len());
    for (name, value) in bindings {
        println!("  {name:<15} {}", print(&value, true));
    }
}
