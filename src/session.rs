//! Request/response surface for an interactive shell.
//!
//! A [`Session`] owns the [`Environment`] and remembers the last successful
//! result, which the shell can ask for again with [`REPEAT_TOKEN`].

use tracing::debug;

use crate::Error;
use crate::ast::Value;
use crate::evaluator::{Environment, eval};
use crate::parser::{ParseConfig, parse_with_config};

/// Input that re-yields the previous result instead of being parsed.
pub const REPEAT_TOKEN: &str = "!!";

#[derive(Debug)]
pub struct Session {
    env: Environment,
    last: Value,
    config: ParseConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_environment(Environment::new())
    }

    pub fn with_environment(env: Environment) -> Self {
        Session {
            env,
            last: Value::Nil,
            config: ParseConfig::default(),
        }
    }

    /// Reader options used for every request, e.g. to accept `;` comments.
    pub fn with_parse_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse one line of source and evaluate it.
    ///
    /// The repeat token returns the last successful result (`nil` if there is
    /// none yet). A failed parse or evaluation leaves the last result as it was.
    pub fn parse_and_eval(&mut self, text: &str) -> Result<Value, Error> {
        if text.trim() == REPEAT_TOKEN {
            debug!(last = %self.last, "repeat");
            return Ok(self.last.clone());
        }
        debug!(input = text, "parse_and_eval");
        let code = parse_with_config(text, self.config)?;
        let value = eval(&code, &mut self.env)?;
        self.last = value.clone();
        Ok(value)
    }

    pub fn last_result(&self) -> &Value {
        &self.last
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// True once the `exit` builtin has run.
    pub fn exit_requested(&self) -> bool {
        self.env.exit_requested()
    }
}
