//! Single-pass reader turning source text straight into a [`Value`].
//!
//! There is no token stream and no separate AST: characters are scanned one at
//! a time into a pending token, and a stack of open levels collects each
//! form's operator name and arguments until its `)` arrives. Only the first
//! complete top-level form is returned; anything after it is ignored.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, rest, value},
    error::ErrorKind,
    sequence::preceded,
};

use crate::ast::{NumberType, Value};
use crate::{Error, ParseError, ParseErrorKind};

/// Reader options.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParseConfig {
    /// Treat `;` as the start of a comment running to the end of the line
    pub handle_comments: bool,
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == '-'
}

/// `nil` and nothing else
fn parse_nil(input: &str) -> IResult<&str, Value> {
    value(Value::Nil, all_consuming(tag("nil"))).parse(input)
}

/// `'name`, the rest of the token taken verbatim
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    map(preceded(char('\''), rest), |name: &str| {
        Value::Symbol(name.to_owned())
    })
    .parse(input)
}

/// A token made only of digits, `.` and `-`
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (remaining, literal) = all_consuming(take_while1(is_number_char)).parse(input)?;

    match literal.parse::<NumberType>() {
        Ok(n) => Ok((remaining, Value::Number(n))),
        // Number-shaped but not a float: commit instead of falling back to a variable
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Float,
        ))),
    }
}

fn parse_variable(input: &str) -> IResult<&str, Value> {
    map(rest, |name: &str| Value::Variable(name.to_owned())).parse(input)
}

/// Classify one flushed token into a literal or variable value.
fn parse_token(token: &str, input: &str, offset: usize) -> Result<Value, Error> {
    if token.is_empty() {
        return Err(ParseError::with_context(
            ParseErrorKind::InvalidSyntax,
            "Cannot parse an empty token",
            input,
            offset,
        )
        .into());
    }

    match alt((parse_nil, parse_symbol, parse_number, parse_variable)).parse(token) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::Float => {
            Err(ParseError::with_context_and_found(
                ParseErrorKind::InvalidSyntax,
                format!("Invalid number literal at position {offset}"),
                input,
                offset,
                Some(token.to_owned()),
            )
            .into())
        }
        Err(_) => Err(ParseError::with_context_and_found(
            ParseErrorKind::InvalidSyntax,
            format!("Invalid token at position {offset}"),
            input,
            offset,
            Some(token.to_owned()),
        )
        .into()),
    }
}

/// One open `(`: its operator name once seen, and the arguments collected so far.
#[derive(Debug, Default)]
struct Level {
    operator: Option<String>,
    args: Vec<Value>,
}

struct Reader<'a> {
    input: &'a str,
    config: ParseConfig,
    levels: Vec<Level>,
    token: String,
    token_start: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str, config: ParseConfig) -> Self {
        Reader {
            input,
            config,
            levels: Vec::new(),
            token: String::new(),
            token_start: 0,
        }
    }

    fn read(mut self) -> Result<Value, Error> {
        let mut in_comment = false;
        let mut end = 0;

        for (offset, ch) in self.input.chars().enumerate() {
            end = offset + 1;
            if in_comment {
                in_comment = ch != '\n';
                continue;
            }

            let completed = match ch {
                ';' if self.config.handle_comments => {
                    in_comment = true;
                    self.flush()?
                }
                '(' => {
                    let completed = self.flush()?;
                    self.levels.push(Level::default());
                    completed
                }
                ')' => match self.flush()? {
                    Some(value) => Some(value),
                    None => self.close(offset)?,
                },
                c if c.is_whitespace() => self.flush()?,
                c => {
                    if self.token.is_empty() {
                        self.token_start = offset;
                    }
                    self.token.push(c);
                    None
                }
            };

            if let Some(value) = completed {
                return Ok(value);
            }
        }

        if let Some(value) = self.flush()? {
            return Ok(value);
        }

        if !self.levels.is_empty() {
            return Err(ParseError::with_context(
                ParseErrorKind::Incomplete,
                format!(
                    "Unbalanced parentheses: {} unclosed '('",
                    self.levels.len()
                ),
                self.input,
                end,
            )
            .into());
        }

        Err(ParseError::from_message(ParseErrorKind::EmptyInput, "Unexpected end of input").into())
    }

    /// Move the pending token into the current level. A token outside any
    /// parentheses is a complete top-level form by itself.
    fn flush(&mut self) -> Result<Option<Value>, Error> {
        if self.token.is_empty() {
            return Ok(None);
        }
        let token = std::mem::take(&mut self.token);
        let offset = self.token_start;

        match self.levels.last_mut() {
            None => parse_token(&token, self.input, offset).map(Some),
            Some(level) if level.operator.is_none() => {
                level.operator = Some(token);
                Ok(None)
            }
            Some(level) => {
                level.args.push(parse_token(&token, self.input, offset)?);
                Ok(None)
            }
        }
    }

    /// Build `(operator . args)` for the innermost level and hand it to the
    /// enclosing level, or return it when it was the outermost one.
    fn close(&mut self, offset: usize) -> Result<Option<Value>, Error> {
        let Some(level) = self.levels.pop() else {
            return Err(ParseError::with_context_and_found(
                ParseErrorKind::UnexpectedClose,
                format!("Unbalanced parentheses: unexpected ')' at position {offset}"),
                self.input,
                offset,
                Some(")".to_owned()),
            )
            .into());
        };

        let Some(operator) = level.operator else {
            return Err(ParseError::with_context(
                ParseErrorKind::InvalidSyntax,
                format!("Form closed at position {offset} has no operator"),
                self.input,
                offset,
            )
            .into());
        };

        let form = Value::cons(Value::Function(operator), Value::list(level.args));

        match self.levels.last_mut() {
            Some(parent) if parent.operator.is_none() => Err(ParseError::with_context(
                ParseErrorKind::InvalidSyntax,
                "A form must start with an operator name, not a nested form",
                self.input,
                offset,
            )
            .into()),
            Some(parent) => {
                parent.args.push(form);
                Ok(None)
            }
            None => Ok(Some(form)),
        }
    }
}

/// Parse the first complete form from input.
pub fn parse(input: &str) -> Result<Value, Error> {
    parse_with_config(input, ParseConfig::default())
}

/// Parse the first complete form from input with explicit reader options.
pub fn parse_with_config(input: &str, config: ParseConfig) -> Result<Value, Error> {
    Reader::new(input, config).read()
}
