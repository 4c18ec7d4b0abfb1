//! Abstract Syntax Tree definitions for SMIL
//!
//! Represents the structure of programs after parsing.

use std::fmt;

use crate::token::{Span, Token, TokenKind};

/// Expression nodes. SMIL has no separate statement type: a statement is
/// any expression that generates code on its own (see [`Expr::is_statement`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Comment: `:# text` up to the end of the line
    Comment { text: String, span: Span },

    /// Program input: `:$`, `:$:$`, ...
    Input { index: usize, span: Span },

    /// Variable reference: `:( name :)`, or `;( name :)` when inverted
    Var {
        name: String,
        inverted: bool,
        span: Span,
    },

    /// Variable whose name is computed at run time: `:( :( name :) :)`
    NamedVar { name: Box<Expr>, span: Span },

    /// Assignment: `lhs := rhs`
    Init {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },

    /// Binary operation: `a :+ b`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },

    /// Print: `:P a b :D`
    Print { args: Vec<Expr>, span: Span },

    HelloPrint { span: Span },

    Nop { span: Span },

    Exit { code: i32, span: Span },

    /// Push onto the evaluation stack: `:^ expr`
    Push { value: Box<Expr>, span: Span },

    /// Pop from the evaluation stack into a variable: `:v :( x :)`
    Pop { target: Box<Expr>, span: Span },

    /// Reset the evaluation stack: `:@`
    Clear { span: Span },

    /// Loop: `8) cond 8| then... 8( else... 8D`
    Loop {
        condition: Box<Expr>,
        then_branch: Vec<Expr>,
        else_branch: Vec<Expr>,
        span: Span,
    },

    /// Length of the operand's text: `:L expr`
    LengthOf { operand: Box<Expr>, span: Span },

    /// A token no production accepts
    Unknown { token: Token, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Comment { span, .. } => *span,
            Expr::Input { span, .. } => *span,
            Expr::Var { span, .. } => *span,
            Expr::NamedVar { span, .. } => *span,
            Expr::Init { span, .. } => *span,
            Expr::Binary { span, .. } => *span,
            Expr::Print { span, .. } => *span,
            Expr::HelloPrint { span } => *span,
            Expr::Nop { span } => *span,
            Expr::Exit { span, .. } => *span,
            Expr::Push { span, .. } => *span,
            Expr::Pop { span, .. } => *span,
            Expr::Clear { span } => *span,
            Expr::Loop { span, .. } => *span,
            Expr::LengthOf { span, .. } => *span,
            Expr::Unknown { span, .. } => *span,
        }
    }

    /// Only variables can be assigned to or popped into
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Var { .. } | Expr::NamedVar { .. })
    }

    /// Whether this expression generates code when it stands alone
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Expr::Init { .. }
                | Expr::Print { .. }
                | Expr::HelloPrint { .. }
                | Expr::Exit { .. }
                | Expr::Loop { .. }
                | Expr::Push { .. }
                | Expr::Pop { .. }
                | Expr::Clear { .. }
        )
    }

    /// Whether this expression evaluates to an object
    pub fn yields_value(&self) -> bool {
        matches!(
            self,
            Expr::Input { .. }
                | Expr::Var { .. }
                | Expr::NamedVar { .. }
                | Expr::Init { .. }
                | Expr::Binary { .. }
                | Expr::Pop { .. }
                | Expr::LengthOf { .. }
        )
    }

    pub fn is_inverted_var(&self) -> bool {
        matches!(self, Expr::Var { inverted: true, .. })
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for expr in exprs {
        write!(f, " {} |", expr)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Comment { text, .. } => write!(f, "comment \"{}\"", text.trim()),
            Expr::Input { index, .. } => write!(f, "input {}", index),
            Expr::Var { name, inverted: false, .. } => write!(f, "var \"{}\"", name),
            Expr::Var { name, inverted: true, .. } => write!(f, "inverted var \"{}\"", name),
            Expr::NamedVar { name, .. } => write!(f, "named var ({})", name),
            Expr::Init { lhs, rhs, .. } => write!(f, "init: {} = {}", lhs, rhs),
            Expr::Binary { left, op, right, .. } => {
                write!(f, "Binop({} {} {})", left, op, right)
            }
            Expr::Print { args, .. } => {
                write!(f, "print:")?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
            Expr::HelloPrint { .. } => write!(f, "hello print"),
            Expr::Nop { .. } => write!(f, "nop"),
            Expr::Exit { code, .. } => write!(f, "exit {}", code),
            Expr::Push { value, .. } => write!(f, "push: {}", value),
            Expr::Pop { target, .. } => write!(f, "pop into: {}", target),
            Expr::Clear { .. } => write!(f, "clear stack"),
            Expr::Loop {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                write!(f, "loop: | {} | then |", condition)?;
                write_list(f, then_branch)?;
                write!(f, " else |")?;
                write_list(f, else_branch)
            }
            Expr::LengthOf { operand, .. } => write!(f, "get length of: {}", operand),
            Expr::Unknown { token, .. } => write!(f, "unknown expression '{}'", token),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,
}

/// Binding strength of a binary operator. `&&` and `||` bind tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Low,
    Normal,
    High,
}

impl BinaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Modulo),
            TokenKind::And => Some(BinaryOp::And),
            TokenKind::Or => Some(BinaryOp::Or),
            _ => None,
        }
    }

    pub fn precedence(&self) -> Precedence {
        match self {
            BinaryOp::And | BinaryOp::Or => Precedence::High,
            BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => Precedence::Normal,
            BinaryOp::Add | BinaryOp::Subtract => Precedence::Low,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", s)
    }
}

/// A complete program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Expr>,
    /// Highest input index referenced anywhere, plus one
    pub input_count: usize,
}

impl Program {
    pub fn new(statements: Vec<Expr>, input_count: usize) -> Self {
        Self {
            statements,
            input_count,
        }
    }
}
