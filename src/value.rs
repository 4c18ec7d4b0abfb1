//! Runtime value types for SMIL

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

/// A dynamically typed SMIL object.
///
/// Cloning an `Object` shares the string buffer instead of copying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Integer(i64),
    String(Rc<str>),
}

impl Object {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Object::String(s.into())
    }

    /// Bind a program argument: integers stay integers, anything else is text
    pub fn from_input(arg: &str) -> Self {
        match arg.trim().parse::<i64>() {
            Ok(n) => Object::Integer(n),
            Err(_) => Object::string(arg),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "integer",
            Object::String(_) => "string",
        }
    }

    /// Strings always hold a live buffer, so only a zero integer is falsy
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Integer(n) => *n != 0,
            Object::String(_) => true,
        }
    }

    /// Decimal text for integers, the raw text for strings
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Object::Integer(n) => Cow::Owned(n.to_string()),
            Object::String(s) => Cow::Borrowed(s),
        }
    }

    /// Integer view used by loop conditions: strings are read as leading
    /// decimal digits, with 0 when there are none
    pub fn to_integer(&self) -> i64 {
        match self {
            Object::Integer(n) => *n,
            Object::String(s) => parse_leading_integer(s),
        }
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        match self {
            Object::Integer(n) => n.to_string().len(),
            Object::String(s) => s.chars().count(),
        }
    }
}

fn parse_leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for digit in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value
            .saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'));
    }

    if negative {
        -value
    } else {
        value
    }
}

impl Default for Object {
    fn default() -> Self {
        Object::Integer(0)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(n) => write!(f, "{}", n),
            Object::String(s) => write!(f, "{}", s),
        }
    }
}
