//! Token definitions for SMIL
//!
//! Every token is exactly two source characters, except the program end
//! marker which is three.

use std::fmt;

/// Location in source code for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }
}

/// Token types in SMIL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Program framing
    ProgramStart,    // <3
    ProgramEnd,      // </3
    Comment,         // :#

    // Variables
    VarStart,        // :(
    VarEnd,          // :)
    NegatedVarStart, // ;(
    Input,           // :$
    Assign,          // :=

    // Output and control
    PrintStart,      // :P
    PrintEnd,        // :D
    HelloPrint,      // o/
    Nop,             // :|
    Exit,            // :X

    // Evaluation stack
    StackPush,       // :^
    StackPop,        // :v
    StackClear,      // :@

    // Loops
    LoopStart,       // 8)
    LoopThen,        // 8|
    LoopElse,        // 8(
    LoopEnd,         // 8D

    LengthOf,        // :L

    // Binary operators
    Plus,            // :+
    Minus,           // :-
    Star,            // :*
    Slash,           // :/
    Percent,         // :%
    And,             // &&
    Or,              // ||

    /// Two characters that match no sigil
    Unknown,
    /// Fewer than two characters left
    Eof,
}

/// The three-character end marker. Checked before the two-character table.
pub const PROGRAM_END: &str = "</3";

/// Sigil naming the program inputs; input `i` is this sigil repeated `i + 1` times.
pub const INPUT_SIGIL: &str = ":$";

const SIGILS: &[(&str, TokenKind)] = &[
    ("<3", TokenKind::ProgramStart),
    (":#", TokenKind::Comment),
    (":(", TokenKind::VarStart),
    (":)", TokenKind::VarEnd),
    (";(", TokenKind::NegatedVarStart),
    (":$", TokenKind::Input),
    (":=", TokenKind::Assign),
    (":P", TokenKind::PrintStart),
    (":D", TokenKind::PrintEnd),
    ("o/", TokenKind::HelloPrint),
    (":|", TokenKind::Nop),
    (":X", TokenKind::Exit),
    (":^", TokenKind::StackPush),
    (":v", TokenKind::StackPop),
    (":@", TokenKind::StackClear),
    ("8)", TokenKind::LoopStart),
    ("8|", TokenKind::LoopThen),
    ("8(", TokenKind::LoopElse),
    ("8D", TokenKind::LoopEnd),
    (":L", TokenKind::LengthOf),
    (":+", TokenKind::Plus),
    (":-", TokenKind::Minus),
    (":*", TokenKind::Star),
    (":/", TokenKind::Slash),
    (":%", TokenKind::Percent),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
];

/// Look up the kind of a two-character lexeme
pub fn lookup_sigil(lexeme: &str) -> Option<TokenKind> {
    SIGILS
        .iter()
        .find(|(sigil, _)| *sigil == lexeme)
        .map(|(_, kind)| *kind)
}

/// Name of the variable bound to input `index`
pub fn input_name(index: usize) -> String {
    INPUT_SIGIL.repeat(index + 1)
}

impl TokenKind {
    /// The source text for this kind, if it has one
    pub fn sigil(&self) -> Option<&'static str> {
        if *self == TokenKind::ProgramEnd {
            return Some(PROGRAM_END);
        }
        SIGILS
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(sigil, _)| *sigil)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Unknown => write!(f, "<unknown>"),
            TokenKind::Eof => write!(f, "end of input"),
            kind => match kind.sigil() {
                Some(sigil) => write!(f, "{}", sigil),
                None => write!(f, "{:?}", kind),
            },
        }
    }
}

/// A token with its location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lexeme.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}", self.lexeme)
        }
    }
}
