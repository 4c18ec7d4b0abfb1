//! Compiler: AST → Bytecode
//!
//! Types are only known at run time, so every operator compiles to a single
//! opcode and the VM picks the integer or text meaning when it executes it.

use tracing::debug;

use crate::ast::{BinaryOp, Expr, Program};
use crate::bytecode::{AssignMode, Chunk, OpCode};
use crate::error::{ErrorKind, Result, SmilError};
use crate::token::{input_name, Span};

/// Compiles a parsed program into a single chunk
#[derive(Debug, Default)]
pub struct Compiler {
    chunk: Chunk,
    input_count: usize,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a program to bytecode
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn compile(&mut self, program: &Program) -> Result<Chunk> {
        self.input_count = program.input_count;

        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }

        let end = program
            .statements
            .last()
            .map(Expr::span)
            .unwrap_or_default();
        self.emit(OpCode::Return, end);

        Ok(std::mem::take(&mut self.chunk))
    }

    fn emit(&mut self, op: OpCode, span: Span) {
        self.chunk.write(op, span);
    }

    fn emit_byte(&mut self, byte: u8, span: Span) {
        self.chunk.write_byte(byte, span);
    }

    fn emit_u16(&mut self, value: u16, span: Span) {
        self.chunk.write_u16(value, span);
    }

    fn emit_jump(&mut self, op: OpCode, span: Span) -> usize {
        self.emit(op, span);
        self.emit_u16(0xFFFF, span); // Placeholder
        self.chunk.len() - 2
    }

    fn patch_jump(&mut self, offset: usize, span: Span) -> Result<()> {
        if self.chunk.patch_jump(offset) {
            Ok(())
        } else {
            Err(SmilError::at(ErrorKind::ProgramTooLarge("jump too long"), span))
        }
    }

    fn emit_loop(&mut self, loop_start: usize, span: Span) -> Result<()> {
        self.emit(OpCode::Loop, span);
        let offset = self.chunk.len() - loop_start + 2;
        let offset = u16::try_from(offset)
            .map_err(|_| SmilError::at(ErrorKind::ProgramTooLarge("loop body too long"), span))?;
        self.emit_u16(offset, span);
        Ok(())
    }

    fn name_index(&mut self, name: &str, span: Span) -> Result<u16> {
        self.chunk
            .add_name(name)
            .ok_or_else(|| SmilError::at(ErrorKind::ProgramTooLarge("too many variables"), span))
    }

    fn emit_variable(&mut self, name: &str, span: Span) -> Result<()> {
        let idx = self.name_index(name, span)?;
        self.emit(OpCode::Variable, span);
        self.emit_u16(idx, span);
        Ok(())
    }

    // ==================== Statements ====================

    fn compile_stmt(&mut self, stmt: &Expr) -> Result<()> {
        debug!("generating code for: {}", stmt);
        let span = stmt.span();

        match stmt {
            Expr::Init { .. } | Expr::Pop { .. } => {
                self.compile_expr(stmt)?;
                self.emit(OpCode::Pop, span);
            }

            Expr::Print { args, .. } => {
                for arg in args {
                    self.compile_expr(arg)?;
                }
                let count = u16::try_from(args.len()).map_err(|_| {
                    SmilError::at(ErrorKind::ProgramTooLarge("too many print arguments"), span)
                })?;
                self.emit(OpCode::Print, span);
                self.emit_u16(count, span);
            }

            Expr::HelloPrint { .. } => {
                if self.input_count > 0 {
                    self.emit_variable(&input_name(0), span)?;
                    self.emit(OpCode::Hello, span);
                } else {
                    self.emit(OpCode::HelloWorld, span);
                }
            }

            Expr::Exit { code, .. } => {
                self.emit(OpCode::Exit, span);
                self.emit_byte((*code & 0xFF) as u8, span);
            }

            Expr::Push { value, .. } => {
                self.compile_expr(value)?;
                self.emit(OpCode::StackPush, span);
            }

            Expr::Clear { .. } => self.emit(OpCode::StackClear, span),

            Expr::Loop {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.compile_loop(condition, then_branch, else_branch, span)?,

            // Bare values are only assignment context; these generate nothing
            Expr::Comment { .. }
            | Expr::Nop { .. }
            | Expr::Unknown { .. }
            | Expr::Input { .. }
            | Expr::Var { .. }
            | Expr::NamedVar { .. }
            | Expr::Binary { .. }
            | Expr::LengthOf { .. } => {}
        }

        Ok(())
    }

    /// ```text
    ///       cond
    ///       JumpIfNotPositive -> else
    /// then: then-statements
    ///       cond
    ///       JumpIfNotPositive -> end
    ///       Loop -> then
    /// else: else-statements
    /// end:
    /// ```
    fn compile_loop(
        &mut self,
        condition: &Expr,
        then_branch: &[Expr],
        else_branch: &[Expr],
        span: Span,
    ) -> Result<()> {
        self.compile_expr(condition)?;
        let else_jump = self.emit_jump(OpCode::JumpIfNotPositive, span);

        let then_start = self.chunk.len();
        for stmt in then_branch {
            self.compile_stmt(stmt)?;
        }
        self.compile_expr(condition)?;
        let exit_jump = self.emit_jump(OpCode::JumpIfNotPositive, span);
        self.emit_loop(then_start, span)?;

        self.patch_jump(else_jump, span)?;
        for stmt in else_branch {
            self.compile_stmt(stmt)?;
        }
        self.patch_jump(exit_jump, span)
    }

    // ==================== Expressions ====================

    /// Compile an expression that leaves exactly one handle on the stack
    fn compile_expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Input { index, span } => self.emit_variable(&input_name(*index), *span),

            Expr::Var { name, span, .. } => self.emit_variable(name, *span),

            Expr::NamedVar { name, span } => {
                self.compile_expr(name)?;
                self.emit(OpCode::NamedVariable, *span);
                Ok(())
            }

            Expr::Init { lhs, rhs, span } => {
                let mode = match (lhs.is_inverted_var(), rhs.is_inverted_var()) {
                    (false, false) => AssignMode::Copy,
                    (true, true) => AssignMode::Truthy,
                    _ => AssignMode::Not,
                };
                self.compile_expr(rhs)?;
                self.compile_expr(lhs)?;
                self.emit(OpCode::Assign, *span);
                self.emit_byte(mode as u8, *span);
                Ok(())
            }

            Expr::Binary {
                left,
                op,
                right,
                span,
            } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                self.emit(binary_opcode(*op), *span);
                Ok(())
            }

            Expr::Pop { target, span } => match target.as_ref() {
                Expr::Var { name, .. } => {
                    let idx = self.name_index(name, *span)?;
                    self.emit(OpCode::StackPop, *span);
                    self.emit_u16(idx, *span);
                    Ok(())
                }
                Expr::NamedVar { name, .. } => {
                    self.compile_expr(name)?;
                    self.emit(OpCode::StackPopNamed, *span);
                    Ok(())
                }
                other => Err(SmilError::at(
                    ErrorKind::InvalidAssignmentTarget(other.to_string()),
                    other.span(),
                )),
            },

            Expr::LengthOf { operand, span } => {
                self.compile_expr(operand)?;
                self.emit(OpCode::Length, *span);
                Ok(())
            }

            other => Err(SmilError::at(
                ErrorKind::ExpectedValue(other.to_string()),
                other.span(),
            )),
        }
    }
}

fn binary_opcode(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Add => OpCode::Add,
        BinaryOp::Subtract => OpCode::Subtract,
        BinaryOp::Multiply => OpCode::Multiply,
        BinaryOp::Divide => OpCode::Divide,
        BinaryOp::Modulo => OpCode::Modulo,
        BinaryOp::And => OpCode::And,
        BinaryOp::Or => OpCode::Or,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use pretty_assertions::assert_eq;

    fn compile(source: &str) -> Chunk {
        let program = Parser::new(source).parse().unwrap();
        Compiler::new().compile(&program).unwrap()
    }

    fn ops(chunk: &Chunk) -> Vec<String> {
        chunk
            .disassemble("test")
            .lines()
            .skip(1)
            .map(|line| line[10..].to_string())
            .collect()
    }

    #[test]
    fn test_assignment_evaluates_rhs_first() {
        let chunk = compile(":(x:) := ;(y:)");
        assert_eq!(
            ops(&chunk),
            vec![
                "Variable 0000 'y'",
                "Variable 0001 'x'",
                "Assign Not",
                "Pop",
                "Return",
            ]
        );
    }

    #[test]
    fn test_assign_modes() {
        assert!(ops(&compile(";(x:) := ;(y:)")).contains(&"Assign Truthy".to_string()));
        assert!(ops(&compile(";(x:) := :(y:)")).contains(&"Assign Not".to_string()));
        assert!(ops(&compile(";(x:) := :$")).contains(&"Assign Not".to_string()));
        assert!(ops(&compile(":(x:) := :(y:)")).contains(&"Assign Copy".to_string()));
    }

    #[test]
    fn test_inputs_compile_to_variables() {
        let chunk = compile(":P :$:$ :D");
        assert_eq!(chunk.names, vec![":$:$".to_string()]);
    }

    #[test]
    fn test_hello_uses_first_input_when_declared() {
        assert_eq!(ops(&compile("o/")), vec!["HelloWorld", "Return"]);
        assert_eq!(
            ops(&compile("o/ :P :$ :D")),
            vec![
                "Variable 0000 ':$'",
                "Hello",
                "Variable 0000 ':$'",
                "Print (1)",
                "Return",
            ]
        );
    }

    #[test]
    fn test_pop_targets() {
        assert_eq!(
            ops(&compile(":v :(x:)")),
            vec!["StackPop 0000 'x'", "Pop", "Return"]
        );
        assert_eq!(
            ops(&compile(":v :( :(k:) :)")),
            vec!["Variable 0000 'k'", "StackPopNamed", "Pop", "Return"]
        );
    }

    #[test]
    fn test_loop_layout() {
        let chunk = compile("8) :(i:) 8| :X 8( o/ 8D");
        assert_eq!(
            chunk.disassemble("loop"),
            "== loop ==\n\
             0000    1 Variable 0000 'i'\n\
             0003    1 JumpIfNotPositive -> 0017\n\
             0006    1 Exit (0)\n\
             0008    1 Variable 0000 'i'\n\
             0011    1 JumpIfNotPositive -> 0018\n\
             0014    1 Loop -> 0006\n\
             0017    1 HelloWorld\n\
             0018    1 Return\n"
        );
    }

    #[test]
    fn test_comments_and_bare_values_emit_nothing() {
        let chunk = compile(":# nothing here\n:(x:) :| :$");
        assert_eq!(ops(&chunk), vec!["Return"]);
    }
}
