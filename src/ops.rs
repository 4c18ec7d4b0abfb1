//! Binary operator semantics.
//!
//! Two integers use plain integer arithmetic. As soon as one operand is a
//! string the operator switches to its text meaning, and only the
//! combinations listed in [`binary`] are valid.

use crate::ast::BinaryOp;
use crate::error::ErrorKind;
use crate::value::Object;

/// Largest string, in bytes, an operator may produce
pub const MAX_STRING_LEN: usize = 1 << 28;

/// Apply `op` to two objects.
///
/// With at least one string operand (`n` is the integer side, `s` the string):
///
/// | op  | operands          | result                                  |
/// |-----|-------------------|-----------------------------------------|
/// | `+` | any               | text of lhs followed by text of rhs     |
/// | `-` | string, string    | lhs with every occurrence of rhs removed |
/// | `-` | `s`, `n`          | first `len - n` characters of `s`       |
/// | `*` | `s`, `n`          | `s` repeated `n` times                  |
/// | `/` | `s`, `n`          | first `len / n` characters of `s`       |
/// | `%` | `s`, `n`          | `s` rotated left by `n mod len`         |
///
/// The string may sit on either side in the `s`, `n` rows. A text result
/// longer than [`MAX_STRING_LEN`] bytes is `StringTooLarge`.
pub fn binary(op: BinaryOp, lhs: &Object, rhs: &Object) -> Result<Object, ErrorKind> {
    match (lhs, rhs) {
        (Object::Integer(a), Object::Integer(b)) => integer_op(op, *a, *b).map(Object::Integer),
        _ => text_op(op, lhs, rhs),
    }
}

fn integer_op(op: BinaryOp, a: i64, b: i64) -> Result<i64, ErrorKind> {
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Subtract => a.wrapping_sub(b),
        BinaryOp::Multiply => a.wrapping_mul(b),
        BinaryOp::Divide => {
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            a.wrapping_div(b)
        }
        BinaryOp::Modulo => {
            if b == 0 {
                return Err(ErrorKind::DivisionByZero);
            }
            a.wrapping_rem(b)
        }
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
    };
    Ok(value)
}

fn text_op(op: BinaryOp, lhs: &Object, rhs: &Object) -> Result<Object, ErrorKind> {
    if op == BinaryOp::Add {
        let (left, right) = (lhs.text(), rhs.text());
        if left.len() + right.len() > MAX_STRING_LEN {
            return Err(ErrorKind::StringTooLarge);
        }
        return Ok(Object::string(format!("{}{}", left, right)));
    }

    let invalid = || ErrorKind::InvalidOperation(lhs.type_name(), op.to_string(), rhs.type_name());

    match (lhs, rhs) {
        (Object::String(left), Object::String(right)) if op == BinaryOp::Subtract => {
            Ok(Object::string(remove_all(left, right)))
        }
        (Object::String(s), Object::Integer(n)) | (Object::Integer(n), Object::String(s)) => {
            let text = match op {
                BinaryOp::Subtract => drop_tail(s, *n),
                BinaryOp::Multiply => repeat(s, *n)?,
                BinaryOp::Divide => divide(s, *n)?,
                BinaryOp::Modulo => rotate_left(s, *n)?,
                _ => return Err(invalid()),
            };
            Ok(Object::string(text))
        }
        _ => Err(invalid()),
    }
}

fn prefix(s: &str, count: i64, len: usize) -> String {
    let count = count.clamp(0, len as i64) as usize;
    s.chars().take(count).collect()
}

/// Remove every non-overlapping occurrence of `pattern`, scanning left to right
pub fn remove_all(s: &str, pattern: &str) -> String {
    if pattern.is_empty() {
        return s.to_string();
    }
    s.replace(pattern, "")
}

/// Keep the first `len - n` characters
pub fn drop_tail(s: &str, n: i64) -> String {
    let len = s.chars().count();
    prefix(s, (len as i64).saturating_sub(n), len)
}

/// Concatenate `n` copies; nothing for `n <= 0`
pub fn repeat(s: &str, n: i64) -> Result<String, ErrorKind> {
    if n <= 0 {
        return Ok(String::new());
    }
    let count = usize::try_from(n).map_err(|_| ErrorKind::StringTooLarge)?;
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(s.repeat(count)),
        _ => Err(ErrorKind::StringTooLarge),
    }
}

/// Keep the first `len / n` characters
pub fn divide(s: &str, n: i64) -> Result<String, ErrorKind> {
    if n == 0 {
        return Err(ErrorKind::DivisionByZero);
    }
    let len = s.chars().count();
    Ok(prefix(s, len as i64 / n, len))
}

/// Rotate left by `n` modulo the length; negative `n` rotates right
pub fn rotate_left(s: &str, n: i64) -> Result<String, ErrorKind> {
    let len = s.chars().count();
    if len == 0 {
        return Err(ErrorKind::DivisionByZero);
    }
    let offset = n.rem_euclid(len as i64) as usize;
    Ok(s.chars().skip(offset).chain(s.chars().take(offset)).collect())
}
