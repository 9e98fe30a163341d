//! Key/value attributes attached to log records.
//!
//! Attributes are rendered after the message as `key=value` pairs. Keys and
//! string values that would be ambiguous in that form (empty, or containing
//! whitespace, control characters, `=` or `"`) are quoted and escaped. A
//! message containing control characters is escaped the same way, so one
//! record always renders as one line.

use std::borrow::Cow;
use std::fmt;

/// A structured attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(Cow<'static, str>),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write_text(f, s, needs_quoting(s)),
            Value::I64(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
        }
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}

/// Write `s`, quoted and escaped when `quote` says so.
fn write_text(f: &mut fmt::Formatter<'_>, s: &str, quote: bool) -> fmt::Result {
    if quote {
        write!(f, "{:?}", s)
    } else {
        f.write_str(s)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(Cow::Owned(v.to_owned()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Cow::Owned(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I64(v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U64(v.into())
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::U64(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// A single `key=value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl Attr {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: Into<Value>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(f, &self.key, needs_quoting(&self.key))?;
        write!(f, "={}", self.value)
    }
}

/// A message followed by context attributes, then call attributes.
pub(crate) struct Record<'a> {
    pub message: &'a str,
    pub context: &'a [Attr],
    pub attrs: &'a [Attr],
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let escape = self.message.chars().any(char::is_control);
        write_text(f, self.message, escape)?;
        for attr in self.context.iter().chain(self.attrs) {
            write!(f, " {}", attr)?;
        }
        Ok(())
    }
}
