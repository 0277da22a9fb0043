// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Expression evaluation for the `code` version source.
//!
//! A source file is read as a namespace of top-level `NAME = <expr>`
//! assignments, evaluated in order. Lines that do not parse are skipped.
//!
//! ```text
//! VERSION_INFO = (1, 4, "0rc1")
//! __version__ = ".".join(map(str, VERSION_INFO))
//!
//! expression "__version__"  →  "1.4.0rc1"
//! ```
//!
//! Grammar:
//!
//! ```text
//! expr    := unary ("+" unary)*
//! unary   := "-" unary | postfix
//! postfix := primary ("[" expr "]" | "(" args ")" | "." NAME)*
//! primary := STRING | INT | NAME | "(" items ")" | "[" items "]"
//! ```

use std::collections::BTreeMap;

use crate::error::VersionError;

/// Evaluated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Seq(Vec<Value>),
    Builtin(Builtin),
}

/// Callable values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Str,
    Map,
    /// `"sep".join`
    Join(String),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Int(_) => "int",
            Self::Seq(_) => "sequence",
            Self::Builtin(_) => "builtin",
        }
    }

    fn to_str(&self) -> Result<String, VersionError> {
        match self {
            Self::Str(s) => Ok(s.clone()),
            Self::Int(i) => Ok(i.to_string()),
            Self::Seq(items) => {
                let parts = items
                    .iter()
                    .map(|item| match item {
                        Self::Str(s) => Ok(format!("'{s}'")),
                        other => other.to_str(),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(", ")))
            }
            Self::Builtin(_) => Err(error("cannot convert a builtin to str")),
        }
    }
}

fn error(message: impl Into<String>) -> VersionError {
    VersionError::Source {
        source_name: "code",
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Str(String),
    Int(i64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Plus,
    Minus,
    Dot,
}

fn tokenize(input: &str) -> Result<Vec<Token>, VersionError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '#' => break,
            '(' | ')' | '[' | ']' | ',' | '+' | '-' | '.' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ',' => Token::Comma,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    _ => Token::Dot,
                });
            }
            '"' | '\'' => {
                chars.next();
                let mut value = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('n') => value.push('\n'),
                            Some('t') => value.push('\t'),
                            Some(other) => value.push(other),
                            None => break,
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => value.push(ch),
                    }
                }
                if !closed {
                    return Err(error("unterminated string literal"));
                }
                tokens.push(Token::Str(value));
            }
            c if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '_' {
                        if d != '_' {
                            digits.push(d);
                        }
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = digits
                    .parse()
                    .map_err(|_| error(format!("integer literal '{digits}' out of range")))?;
                tokens.push(Token::Int(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => return Err(error(format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    namespace: &'a BTreeMap<String, Value>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), VersionError> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            other => Err(error(format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn expr(&mut self) -> Result<Value, VersionError> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::Plus) {
            self.next();
            let right = self.unary()?;
            left = add(left, right)?;
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Value, VersionError> {
        if self.peek() == Some(&Token::Minus) {
            self.next();
            return match self.unary()? {
                Value::Int(i) => Ok(Value::Int(-i)),
                other => Err(error(format!("bad operand for unary -: {}", other.type_name()))),
            };
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Value, VersionError> {
        let mut value = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::LBracket) => {
                    self.next();
                    let index = self.expr()?;
                    self.expect(&Token::RBracket)?;
                    value = subscript(&value, &index)?;
                }
                Some(Token::LParen) => {
                    self.next();
                    let args = self.items(&Token::RParen)?;
                    value = call(&value, args)?;
                }
                Some(Token::Dot) => {
                    self.next();
                    let Some(Token::Name(attr)) = self.next() else {
                        return Err(error("expected attribute name"));
                    };
                    value = match (value, attr.as_str()) {
                        (Value::Str(sep), "join") => Value::Builtin(Builtin::Join(sep)),
                        (other, attr) => {
                            return Err(error(format!(
                                "'{}' has no supported attribute '{attr}'",
                                other.type_name()
                            )));
                        }
                    };
                }
                _ => return Ok(value),
            }
        }
    }

    fn primary(&mut self) -> Result<Value, VersionError> {
        match self.next() {
            Some(Token::Str(s)) => {
                let mut s = s;
                // Adjacent literals concatenate.
                while let Some(Token::Str(more)) = self.peek() {
                    s.push_str(more);
                    self.pos += 1;
                }
                Ok(Value::Str(s))
            }
            Some(Token::Int(i)) => Ok(Value::Int(i)),
            Some(Token::Name(name)) => match name.as_str() {
                "str" => Ok(Value::Builtin(Builtin::Str)),
                "map" => Ok(Value::Builtin(Builtin::Map)),
                _ => self
                    .namespace
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| error(format!("name '{name}' is not defined"))),
            },
            Some(Token::LParen) => {
                let trailing_comma_or_many = self.tuple_shape();
                let mut items = self.items(&Token::RParen)?;
                if items.len() == 1 && !trailing_comma_or_many {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::Seq(items))
                }
            }
            Some(Token::LBracket) => Ok(Value::Seq(self.items(&Token::RBracket)?)),
            other => Err(error(format!("unexpected token {other:?}"))),
        }
    }

    /// Whether the parenthesized group at the cursor contains a top-level comma.
    fn tuple_shape(&self) -> bool {
        let mut depth = 0usize;
        for token in &self.tokens[self.pos..] {
            match token {
                Token::LParen | Token::LBracket => depth += 1,
                Token::RParen | Token::RBracket if depth == 0 => return false,
                Token::RParen | Token::RBracket => depth -= 1,
                Token::Comma if depth == 0 => return true,
                _ => {}
            }
        }
        false
    }

    fn items(&mut self, close: &Token) -> Result<Vec<Value>, VersionError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(close) {
                self.next();
                return Ok(items);
            }
            items.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => {}
                Some(ref token) if token == close => return Ok(items),
                other => return Err(error(format!("expected ',' or {close:?}, found {other:?}"))),
            }
        }
    }
}

fn add(left: Value, right: Value) -> Result<Value, VersionError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| error("integer overflow")),
        (Value::Seq(mut a), Value::Seq(b)) => {
            a.extend(b);
            Ok(Value::Seq(a))
        }
        (a, b) => Err(error(format!(
            "unsupported operand types for +: '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn subscript(value: &Value, index: &Value) -> Result<Value, VersionError> {
    let Value::Int(i) = index else {
        return Err(error("indices must be integers"));
    };
    let resolve = |len: usize| -> Result<usize, VersionError> {
        let len_i = i64::try_from(len).map_err(|_| error("sequence too long"))?;
        let idx = if *i < 0 { len_i + i } else { *i };
        usize::try_from(idx)
            .ok()
            .filter(|&u| u < len)
            .ok_or_else(|| error("index out of range"))
    };
    match value {
        Value::Seq(items) => Ok(items[resolve(items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[resolve(chars.len())?].to_string()))
        }
        other => Err(error(format!("'{}' is not subscriptable", other.type_name()))),
    }
}

fn call(callee: &Value, mut args: Vec<Value>) -> Result<Value, VersionError> {
    let Value::Builtin(builtin) = callee else {
        return Err(error(format!("'{}' is not callable", callee.type_name())));
    };
    match (builtin, args.len()) {
        (Builtin::Str, 1) => Ok(Value::Str(args[0].to_str()?)),
        (Builtin::Map, 2) => {
            let seq = args.pop();
            let func = args.pop();
            match (func, seq) {
                (Some(Value::Builtin(Builtin::Str)), Some(Value::Seq(items))) => items
                    .iter()
                    .map(|item| item.to_str().map(Value::Str))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Seq),
                _ => Err(error("map() supports only map(str, sequence)")),
            }
        }
        (Builtin::Join(sep), 1) => match &args[0] {
            Value::Seq(items) => items
                .iter()
                .map(|item| match item {
                    Value::Str(s) => Ok(s.clone()),
                    other => Err(error(format!(
                        "join() expects str items, found {}",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|parts| Value::Str(parts.join(sep))),
            other => Err(error(format!("join() expects a sequence, found {}", other.type_name()))),
        },
        (builtin, n) => Err(error(format!("{builtin:?}() takes a different number of arguments than {n}"))),
    }
}

/// Evaluate one expression against a namespace.
///
/// # Errors
///
/// Returns `VersionError::Source` on syntax errors, undefined names, or
/// unsupported operations.
pub fn evaluate(expression: &str, namespace: &BTreeMap<String, Value>) -> Result<Value, VersionError> {
    let mut parser = Parser {
        tokens: tokenize(expression)?,
        pos: 0,
        namespace,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(error(format!(
            "unexpected trailing input in '{}'",
            expression.trim()
        )));
    }
    Ok(value)
}

/// Build a namespace from the top-level assignments of a source file.
#[must_use]
pub fn load_namespace(source: &str) -> BTreeMap<String, Value> {
    let mut namespace = BTreeMap::new();
    for line in source.lines() {
        if line.starts_with(char::is_whitespace) {
            continue;
        }
        let Some((target, rhs)) = split_assignment(line) else {
            continue;
        };
        if let Ok(value) = evaluate(rhs, &namespace) {
            namespace.insert(target.to_string(), value);
        }
    }
    namespace
}

/// Split `NAME = expr` or `NAME: type = expr`; comparisons are rejected.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let eq = line.find('=')?;
    if line[eq + 1..].starts_with('=') {
        return None;
    }
    let lhs = line[..eq].trim();
    let name = lhs.split(':').next()?.trim();
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    valid.then(|| (name, &line[eq + 1..]))
}

/// Evaluate `expression` against the namespace of `source`, requiring a string.
///
/// # Errors
///
/// Returns `VersionError::Source` if evaluation fails or the result is not a
/// string.
pub fn evaluate_version(source: &str, expression: &str) -> Result<String, VersionError> {
    let namespace = load_namespace(source);
    match evaluate(expression, &namespace)? {
        Value::Str(s) => Ok(s),
        other => Err(error(format!(
            "expression '{expression}' evaluated to {}, expected str",
            other.type_name()
        ))),
    }
}
