//! Parser for SMIL
//!
//! Recursive descent over the two-character token stream, with a
//! Shunting-Yard pass for binary operator chains. The first invalid
//! construct aborts the parse.

use tracing::debug;

use crate::ast::{BinaryOp, Expr, Program};
use crate::error::{ErrorKind, Result, SmilError};
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

/// Shunting-Yard output queue entry
enum Rpn {
    Operand(Expr),
    Operator(BinaryOp, Span),
}

/// The parser state
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Most recent expression that was not a statement; the target of a following `:=`
    pending: Option<Expr>,
    input_count: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            pending: None,
            input_count: 0,
        }
    }

    /// Parse the whole program
    pub fn parse(&mut self) -> Result<Program> {
        if self.lexer.peek_token(true).kind == TokenKind::ProgramStart {
            self.lexer.next_token();
        }

        let mut statements = Vec::new();
        while !matches!(
            self.lexer.peek_token(true).kind,
            TokenKind::Eof | TokenKind::ProgramEnd
        ) {
            let expr = self.parse_expr()?;
            self.collect(expr, &mut statements);
        }

        debug!(
            statements = statements.len(),
            inputs = self.input_count,
            "parsed program"
        );
        Ok(Program::new(statements, self.input_count))
    }

    /// Statements go into `body`; anything else becomes the pending expression
    fn collect(&mut self, expr: Expr, body: &mut Vec<Expr>) {
        if expr.is_statement() {
            body.push(expr);
        } else {
            self.pending = Some(expr);
        }
    }

    // ==================== Expressions ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        let token = self.lexer.next_token();
        let span = token.span;

        let expr = match token.kind {
            TokenKind::VarStart => self.parse_var(false, span)?,
            TokenKind::NegatedVarStart => self.parse_var(true, span)?,
            TokenKind::Input => self.parse_input(span),
            TokenKind::Assign => self.parse_init(span)?,
            TokenKind::Comment => Expr::Comment {
                text: self.lexer.read_line(),
                span,
            },
            TokenKind::PrintStart => self.parse_print(span)?,
            TokenKind::HelloPrint => Expr::HelloPrint { span },
            TokenKind::Nop => Expr::Nop { span },
            TokenKind::Exit => Expr::Exit { code: 0, span },
            TokenKind::StackPush => Expr::Push {
                value: Box::new(self.parse_value()?),
                span,
            },
            TokenKind::StackPop => self.parse_pop(span)?,
            TokenKind::StackClear => Expr::Clear { span },
            TokenKind::LoopStart => self.parse_loop(span)?,
            TokenKind::LengthOf => Expr::LengthOf {
                operand: Box::new(self.parse_value()?),
                span,
            },
            _ => Expr::Unknown { token, span },
        };

        if let Expr::Unknown { token, span } = &expr {
            return Err(SmilError::at(
                ErrorKind::UnexpectedToken(token.to_string()),
                *span,
            ));
        }

        match self.peek_operator() {
            Some(first) => {
                self.lexer.next_token();
                self.parse_binary(expr, first)
            }
            None => Ok(expr),
        }
    }

    /// Parse an expression that must evaluate to an object
    fn parse_value(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        self.expect_value(expr)
    }

    fn expect_value(&self, expr: Expr) -> Result<Expr> {
        if expr.yields_value() {
            Ok(expr)
        } else {
            Err(SmilError::at(
                ErrorKind::ExpectedValue(expr.to_string()),
                expr.span(),
            ))
        }
    }

    fn parse_var(&mut self, inverted: bool, span: Span) -> Result<Expr> {
        let mut name = String::new();

        loop {
            match self.lexer.peek_token(true).kind {
                TokenKind::VarEnd => {
                    self.lexer.next_token();
                    break;
                }
                TokenKind::VarStart if name.trim().is_empty() => {
                    let inner = self.parse_value()?;
                    self.expect(TokenKind::VarEnd)?;
                    return Ok(Expr::NamedVar {
                        name: Box::new(inner),
                        span,
                    });
                }
                TokenKind::Eof => {
                    return Err(SmilError::at(ErrorKind::Unterminated("variable"), span));
                }
                _ => match self.lexer.next_char() {
                    Some(ch) => name.push(ch),
                    None => {
                        return Err(SmilError::at(ErrorKind::Unterminated("variable"), span));
                    }
                },
            }
        }

        Ok(Expr::Var {
            name: name.trim().to_string(),
            inverted,
            span,
        })
    }

    /// `:$` is input 0, `:$:$` input 1, and so on
    fn parse_input(&mut self, span: Span) -> Expr {
        let mut index = 0;
        while self.lexer.peek_token(false).kind == TokenKind::Input {
            self.lexer.next_token();
            index += 1;
        }
        self.input_count = self.input_count.max(index + 1);
        Expr::Input { index, span }
    }

    fn parse_init(&mut self, span: Span) -> Result<Expr> {
        let lhs = self
            .pending
            .clone()
            .ok_or_else(|| SmilError::at(ErrorKind::MissingAssignmentTarget, span))?;
        if !lhs.is_assignable() {
            return Err(SmilError::at(
                ErrorKind::InvalidAssignmentTarget(lhs.to_string()),
                lhs.span(),
            ));
        }

        let rhs = self.parse_value()?;
        Ok(Expr::Init {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        })
    }

    fn parse_print(&mut self, span: Span) -> Result<Expr> {
        let mut args = Vec::new();
        loop {
            match self.lexer.peek_token(true).kind {
                TokenKind::PrintEnd => {
                    self.lexer.next_token();
                    return Ok(Expr::Print { args, span });
                }
                TokenKind::Eof | TokenKind::ProgramEnd => {
                    return Err(SmilError::at(ErrorKind::Unterminated("print"), span));
                }
                _ => args.push(self.parse_value()?),
            }
        }
    }

    fn parse_pop(&mut self, span: Span) -> Result<Expr> {
        let target = self.parse_expr()?;
        if !target.is_assignable() {
            return Err(SmilError::at(
                ErrorKind::InvalidAssignmentTarget(target.to_string()),
                target.span(),
            ));
        }
        Ok(Expr::Pop {
            target: Box::new(target),
            span,
        })
    }

    fn parse_loop(&mut self, span: Span) -> Result<Expr> {
        // Every condition but the last becomes pending, so `8) :(i:) := ... 8|` works.
        let mut condition = None;
        loop {
            match self.lexer.peek_token(true).kind {
                TokenKind::LoopThen => {
                    self.lexer.next_token();
                    break;
                }
                TokenKind::Eof | TokenKind::ProgramEnd => {
                    return Err(SmilError::at(ErrorKind::Unterminated("loop"), span));
                }
                _ => {
                    if let Some(previous) = condition.take() {
                        self.pending = Some(previous);
                    }
                    condition = Some(self.parse_expr()?);
                }
            }
        }

        let condition = match condition {
            Some(condition) => self.expect_value(condition)?,
            None => {
                return Err(SmilError::at(
                    ErrorKind::ExpectedValue("an empty loop condition".to_string()),
                    span,
                ));
            }
        };
        let then_branch = self.parse_loop_section(TokenKind::LoopElse, span)?;
        let else_branch = self.parse_loop_section(TokenKind::LoopEnd, span)?;

        Ok(Expr::Loop {
            condition: Box::new(condition),
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_loop_section(&mut self, end: TokenKind, span: Span) -> Result<Vec<Expr>> {
        let mut body = Vec::new();
        loop {
            let next = self.lexer.peek_token(true);
            match next.kind {
                kind if kind == end => {
                    self.lexer.next_token();
                    return Ok(body);
                }
                TokenKind::LoopThen | TokenKind::LoopElse | TokenKind::LoopEnd => {
                    return Err(SmilError::at(
                        ErrorKind::ExpectedToken(end.to_string(), next.to_string()),
                        next.span,
                    ));
                }
                TokenKind::Eof | TokenKind::ProgramEnd => {
                    return Err(SmilError::at(ErrorKind::Unterminated("loop"), span));
                }
                _ => {
                    let expr = self.parse_expr()?;
                    self.collect(expr, &mut body);
                }
            }
        }
    }

    // ==================== Binary operators ====================

    fn peek_operator(&self) -> Option<(BinaryOp, Span)> {
        let token = self.lexer.peek_token(true);
        BinaryOp::from_token(token.kind).map(|op| (op, token.span))
    }

    /// Shunting-Yard over `lhs op operand op operand ...`
    fn parse_binary(&mut self, lhs: Expr, first: (BinaryOp, Span)) -> Result<Expr> {
        let lhs = self.expect_value(lhs)?;
        let mut output = vec![Rpn::Operand(lhs)];
        let mut operators = vec![first];

        loop {
            output.push(Rpn::Operand(self.parse_operand()?));

            let Some((op, span)) = self.peek_operator() else {
                break;
            };
            self.lexer.next_token();

            while let Some(&(top, top_span)) = operators.last() {
                if top.precedence() < op.precedence() {
                    break;
                }
                operators.pop();
                output.push(Rpn::Operator(top, top_span));
            }
            operators.push((op, span));
        }

        while let Some((op, span)) = operators.pop() {
            output.push(Rpn::Operator(op, span));
        }

        let mut operands: Vec<Expr> = Vec::new();
        for item in output {
            match item {
                Rpn::Operand(expr) => operands.push(expr),
                Rpn::Operator(op, span) => {
                    let (Some(right), Some(left)) = (operands.pop(), operands.pop()) else {
                        return Err(SmilError::at(ErrorKind::ExpectedOperand(op.to_string()), span));
                    };
                    operands.push(Expr::Binary {
                        left: Box::new(left),
                        op,
                        right: Box::new(right),
                        span,
                    });
                }
            }
        }

        match (operands.pop(), operands.is_empty()) {
            (Some(expr), true) => Ok(expr),
            _ => Err(SmilError::at(
                ErrorKind::ExpectedOperand(first.0.to_string()),
                first.1,
            )),
        }
    }

    /// Operands inside an operator chain: variables, inputs and lengths
    fn parse_operand(&mut self) -> Result<Expr> {
        let token = self.lexer.next_token();
        let span = token.span;
        match token.kind {
            TokenKind::VarStart => self.parse_var(false, span),
            TokenKind::NegatedVarStart => self.parse_var(true, span),
            TokenKind::Input => Ok(self.parse_input(span)),
            TokenKind::LengthOf => Ok(Expr::LengthOf {
                operand: Box::new(self.parse_value()?),
                span,
            }),
            _ => Err(SmilError::at(
                ErrorKind::ExpectedOperand(token.to_string()),
                span,
            )),
        }
    }

    // ==================== Helpers ====================

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.lexer.next_token();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(SmilError::at(
                ErrorKind::ExpectedToken(kind.to_string(), token.to_string()),
                token.span,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse().unwrap()
    }

    fn parse_err(source: &str) -> SmilError {
        Parser::new(source).parse().unwrap_err()
    }

    /// Display form of the single argument of a single print statement
    fn printed(source: &str) -> String {
        let program = parse(source);
        match &program.statements[..] {
            [Expr::Print { args, .. }] if args.len() == 1 => args[0].to_string(),
            other => panic!("expected one print with one argument, got {:?}", other),
        }
    }

    #[test]
    fn test_variable_names_are_trimmed() {
        assert_eq!(printed(":P :(  my var  :) :D"), "var \"my var\"");
        assert_eq!(printed(":P ;(flag:) :D"), "inverted var \"flag\"");
    }

    #[test]
    fn test_named_variable() {
        assert_eq!(printed(":P :( :( key :) :) :D"), "named var (var \"key\")");
        assert_eq!(
            printed(":P :( :( a :) :+ :( b :) :) :D"),
            "named var (Binop(var \"a\" + var \"b\"))"
        );
    }

    #[test]
    fn test_inputs() {
        let program = parse(":P :$:$ :$ :D");
        assert_eq!(program.input_count, 2);
        match &program.statements[0] {
            Expr::Print { args, .. } => {
                assert_eq!(args[0], Expr::Input { index: 1, span: args[0].span() });
                assert_eq!(args[1], Expr::Input { index: 0, span: args[1].span() });
            }
            _ => panic!("expected print"),
        }
    }

    #[test]
    fn test_subtraction_is_left_associative() {
        assert_eq!(
            printed(":P :(a:) :- :(b:) :- :(c:) :D"),
            "Binop(Binop(var \"a\" - var \"b\") - var \"c\")"
        );
    }

    #[test]
    fn test_logical_operators_bind_tightest() {
        assert_eq!(
            printed(":P :(a:) && :(b:) :* :(c:) :D"),
            "Binop(Binop(var \"a\" && var \"b\") * var \"c\")"
        );
        assert_eq!(
            printed(":P :(a:) :* :(b:) || :(c:) :D"),
            "Binop(var \"a\" * Binop(var \"b\" || var \"c\"))"
        );
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        assert_eq!(
            printed(":P :(a:) :+ :(b:) :% :(c:) :- :(d:) :D"),
            "Binop(Binop(var \"a\" + Binop(var \"b\" % var \"c\")) - var \"d\")"
        );
    }

    #[test]
    fn test_init_uses_pending_expression() {
        let program = parse(":( x :) := :( y :) :+ :$");
        assert_eq!(program.statements.len(), 1);
        assert_eq!(
            program.statements[0].to_string(),
            "init: var \"x\" = Binop(var \"y\" + input 0)"
        );
    }

    #[test]
    fn test_init_without_target() {
        let err = parse_err(":= :( y :)");
        assert_eq!(err.kind, ErrorKind::MissingAssignmentTarget);
        assert_eq!(err.class(), ErrorClass::Assignability);
    }

    #[test]
    fn test_init_to_non_variable() {
        let err = parse_err(":$ := :( y :)");
        assert_eq!(err.class(), ErrorClass::Assignability);
    }

    #[test]
    fn test_pop_into_non_variable() {
        let err = parse_err(":v :$");
        assert_eq!(err.class(), ErrorClass::Assignability);
    }

    #[test]
    fn test_unknown_token() {
        let err = parse_err("o/\n  ab");
        assert_eq!(err.kind, ErrorKind::UnexpectedToken("ab".to_string()));
        let span = err.span.unwrap();
        assert_eq!((span.line, span.column), (2, 3));
    }

    #[test]
    fn test_operand_must_be_variable() {
        let err = parse_err(":P :(a:) :+ o/ :D");
        assert_eq!(err.kind, ErrorKind::ExpectedOperand("o/".to_string()));
    }

    #[test]
    fn test_print_argument_must_be_value() {
        let err = parse_err(":P o/ :D");
        assert_eq!(err.class(), ErrorClass::Syntax);
    }

    #[test]
    fn test_unterminated_constructs() {
        assert_eq!(parse_err(":P :(a:)").kind, ErrorKind::Unterminated("print"));
        assert_eq!(parse_err(":P :(abc").kind, ErrorKind::Unterminated("variable"));
        assert_eq!(parse_err("8) :(i:) 8| o/").kind, ErrorKind::Unterminated("loop"));
    }

    #[test]
    fn test_loop_sections() {
        let program = parse("8) :(i:) 8| :P :(i:) :D :(i:) := :(i:) :- :$ 8( o/ 8D");
        match &program.statements[0] {
            Expr::Loop {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(condition.to_string(), "var \"i\"");
                assert_eq!(then_branch.len(), 2);
                assert_eq!(else_branch.len(), 1);
            }
            _ => panic!("expected loop"),
        }
    }

    #[test]
    fn test_loop_condition_can_assign() {
        let program = parse("8) :(i:) := :(j:) 8| 8( 8D");
        match &program.statements[0] {
            Expr::Loop { condition, .. } => {
                assert_eq!(condition.to_string(), "init: var \"i\" = var \"j\"")
            }
            _ => panic!("expected loop"),
        }
    }

    #[test]
    fn test_loop_missing_else() {
        let err = parse_err("8) :(i:) 8| o/ 8D");
        assert_eq!(
            err.kind,
            ErrorKind::ExpectedToken("8(".to_string(), "8D".to_string())
        );
    }

    #[test]
    fn test_program_markers_and_comments() {
        let program = parse("<3\n:# greet someone\no/ :|\n</3 anything after the end");
        assert_eq!(program.statements.len(), 1);
        assert!(matches!(program.statements[0], Expr::HelloPrint { .. }));
    }

    #[test]
    fn test_stack_statements() {
        let program = parse(":^ :(a:) :v :(b:) :@ :X");
        let shapes: Vec<String> = program.statements.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            shapes,
            vec![
                "push: var \"a\"",
                "pop into: var \"b\"",
                "clear stack",
                "exit 0",
            ]
        );
    }
}
