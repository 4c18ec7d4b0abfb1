//! Lexer for SMIL
//!
//! SMIL tokens have a fixed width, so the lexer never fails: two characters
//! that match no sigil become an `Unknown` token and the parser rejects them.
//! Variable names and comments are read as raw characters by the parser,
//! which is why the lexer is driven on demand instead of tokenizing up front.

use crate::token::{lookup_sigil, Span, Token, TokenKind, PROGRAM_END};

/// The lexer state
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    current_pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from source code
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            current_pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Skip whitespace and consume the next token
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.scan_token()
    }

    /// Look at the next token without consuming it
    pub fn peek_token(&self, skip_whitespace: bool) -> Token {
        let mut probe = self.clone();
        if skip_whitespace {
            probe.skip_whitespace();
        }
        probe.scan_token()
    }

    /// Consume a single raw character
    pub fn next_char(&mut self) -> Option<char> {
        self.advance()
    }

    /// Consume the rest of the current line, including its newline
    pub fn read_line(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
            text.push(ch);
        }
        text
    }

    /// Location of the next unread character
    pub fn span_here(&self) -> Span {
        Span::new(self.current_pos, self.current_pos, self.line, self.column)
    }

    fn scan_token(&mut self) -> Token {
        let rest = &self.source[self.current_pos..];
        let start = self.span_here();

        let (kind, len) = if rest.starts_with(PROGRAM_END) {
            (TokenKind::ProgramEnd, PROGRAM_END.len())
        } else {
            let mut chars = rest.char_indices();
            match (chars.next(), chars.next()) {
                (Some(_), Some((second, ch))) => {
                    let len = second + ch.len_utf8();
                    let kind = lookup_sigil(&rest[..len]).unwrap_or(TokenKind::Unknown);
                    (kind, len)
                }
                _ => return Token::new(TokenKind::Eof, start, String::new()),
            }
        };

        let lexeme = &rest[..len];
        let end = self.current_pos + len;
        while self.current_pos < end {
            self.advance();
        }

        Token::new(
            kind,
            Span::new(start.start, end, start.line, start.column),
            lexeme,
        )
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.current_pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.current_pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }
}
