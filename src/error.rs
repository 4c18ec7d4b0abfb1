//! Error types for SMIL
//!
//! Every error is fatal. Parse errors carry the span of the offending token,
//! runtime errors the span of the expression whose instruction failed.

use std::fmt;

use thiserror::Error;

use crate::token::Span;

/// Error kinds in SMIL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Syntax errors
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("expected '{0}', got '{1}'")]
    ExpectedToken(String, String),
    #[error("expected a variable, input or length operand, got '{0}'")]
    ExpectedOperand(String),
    #[error("expected a value, got {0}")]
    ExpectedValue(String),
    #[error("unterminated {0}")]
    Unterminated(&'static str),

    // Assignability errors
    #[error("{0} is not assignable")]
    InvalidAssignmentTarget(String),
    #[error("nothing to assign to")]
    MissingAssignmentTarget,

    // Runtime errors
    #[error("invalid operation: {0} {1} {2}")]
    InvalidOperation(&'static str, String, &'static str),
    #[error("division by zero")]
    DivisionByZero,
    #[error("missing inputs: program needs {expected}, got {got}")]
    MissingInputs { expected: usize, got: usize },
    #[error("evaluation stack is empty")]
    StackUnderflow,
    #[error("string result is larger than {} bytes", crate::ops::MAX_STRING_LEN)]
    StringTooLarge,
    #[error("program too large: {0}")]
    ProgramTooLarge(&'static str),
    #[error("failed to write output: {0}")]
    Output(String),
    #[error("{0}")]
    RuntimeError(String),
}

/// Coarse classification of [`ErrorKind`]s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Syntax,
    Assignability,
    InvalidOperation,
    DivideByZero,
    MissingInput,
    Runtime,
}

impl ErrorKind {
    pub fn class(&self) -> ErrorClass {
        match self {
            ErrorKind::UnexpectedToken(_)
            | ErrorKind::ExpectedToken(..)
            | ErrorKind::ExpectedOperand(_)
            | ErrorKind::ExpectedValue(_)
            | ErrorKind::Unterminated(_) => ErrorClass::Syntax,
            ErrorKind::InvalidAssignmentTarget(_) | ErrorKind::MissingAssignmentTarget => {
                ErrorClass::Assignability
            }
            ErrorKind::InvalidOperation(..) => ErrorClass::InvalidOperation,
            ErrorKind::DivisionByZero => ErrorClass::DivideByZero,
            ErrorKind::MissingInputs { .. } => ErrorClass::MissingInput,
            ErrorKind::StackUnderflow
            | ErrorKind::StringTooLarge
            | ErrorKind::ProgramTooLarge(_)
            | ErrorKind::Output(_)
            | ErrorKind::RuntimeError(_) => ErrorClass::Runtime,
        }
    }
}

/// A SMIL error with location information
#[derive(Debug, Clone, PartialEq)]
pub struct SmilError {
    pub kind: ErrorKind,
    pub span: Option<Span>,
    pub source_line: Option<String>,
}

impl SmilError {
    pub fn new(kind: ErrorKind, span: Option<Span>) -> Self {
        Self {
            kind,
            span,
            source_line: None,
        }
    }

    pub fn at(kind: ErrorKind, span: Span) -> Self {
        Self::new(kind, Some(span))
    }

    pub fn class(&self) -> ErrorClass {
        self.kind.class()
    }

    /// Attach the offending source line so it can be shown under the message
    pub fn with_source(mut self, source: &str) -> Self {
        if let Some(span) = &self.span {
            if span.line > 0 {
                self.source_line = source.lines().nth(span.line - 1).map(str::to_string);
            }
        }
        self
    }
}

impl fmt::Display for SmilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => {
                write!(f, "({}:{}): {}", span.line, span.column, self.kind)?;
                if let Some(line) = &self.source_line {
                    write!(f, "\n  | {}", line)?;
                    write!(f, "\n  | {}^", " ".repeat(span.column.saturating_sub(1)))?;
                }
                Ok(())
            }
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for SmilError {}

impl From<ErrorKind> for SmilError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, None)
    }
}

/// Result type for SMIL operations
pub type Result<T> = std::result::Result<T, SmilError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_positioned_message() {
        let err = SmilError::at(ErrorKind::DivisionByZero, Span::new(4, 6, 2, 3));
        assert_eq!(err.to_string(), "(2:3): division by zero");
    }

    #[test]
    fn test_source_line_and_caret() {
        let err = SmilError::at(
            ErrorKind::UnexpectedToken("ab".to_string()),
            Span::new(5, 7, 2, 3),
        )
        .with_source(":X\n  ab\n");
        assert_eq!(
            err.to_string(),
            "(2:3): unexpected token 'ab'\n  |   ab\n  |   ^"
        );
    }

    #[test]
    fn test_unpositioned_message() {
        let err = SmilError::from(ErrorKind::MissingInputs { expected: 2, got: 1 });
        assert_eq!(err.to_string(), "missing inputs: program needs 2, got 1");
        assert_eq!(err.class(), ErrorClass::MissingInput);
    }
}
