//! Stack-based Virtual Machine for SMIL
//!
//! The operand stack holds [`Handle`]s into the run's [`Heap`]. Variables
//! live in the [`SymbolTable`] as handles too, so an assignment overwrites
//! the object the table points at instead of rebinding the name.

use std::io::Write;

use tracing::{debug, trace};

use crate::ast::BinaryOp;
use crate::bytecode::{AssignMode, Chunk, OpCode};
use crate::error::{ErrorKind, Result, SmilError};
use crate::heap::{Handle, Heap};
use crate::ops;
use crate::stack::Stack;
use crate::symbol_table::SymbolTable;
use crate::token::input_name;
use crate::value::Object;

type Step<T> = std::result::Result<T, ErrorKind>;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Fell off the end of the program
    Finished,
    /// Stopped by an exit statement
    Exit(i32),
}

/// Read position in the chunk being executed
struct Frame<'c> {
    chunk: &'c Chunk,
    ip: usize,
}

impl<'c> Frame<'c> {
    fn read_byte(&mut self) -> Step<u8> {
        let byte = self
            .chunk
            .code
            .get(self.ip)
            .copied()
            .ok_or_else(|| ErrorKind::RuntimeError("ran past the end of the bytecode".into()))?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Step<u16> {
        let high = self.read_byte()?;
        let low = self.read_byte()?;
        Ok(((high as u16) << 8) | low as u16)
    }

    fn read_name(&mut self) -> Step<&'c str> {
        let idx = self.read_u16()?;
        self.chunk
            .names
            .get(idx as usize)
            .map(String::as_str)
            .ok_or_else(|| ErrorKind::RuntimeError(format!("no variable name at index {}", idx)))
    }
}

/// The Virtual Machine
pub struct VM<W: Write> {
    /// Operand stack
    stack: Vec<Handle>,

    /// Every object created during the run
    heap: Heap,

    /// Variable name to object
    symbols: SymbolTable<Handle>,

    /// The program-visible stack behind push, pop and clear
    eval_stack: Stack<Handle>,

    out: W,
}

impl<W: Write> VM<W> {
    /// Create a VM that prints to `out`
    pub fn new(out: W) -> Self {
        Self {
            stack: Vec::new(),
            heap: Heap::new(),
            symbols: SymbolTable::new(),
            eval_stack: Stack::new(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Bind program arguments to `:$`, `:$:$`, ... in order
    pub fn bind_inputs<S: AsRef<str>>(&mut self, required: usize, inputs: &[S]) -> Result<()> {
        if inputs.len() < required {
            return Err(SmilError::from(ErrorKind::MissingInputs {
                expected: required,
                got: inputs.len(),
            }));
        }

        for (index, input) in inputs.iter().enumerate() {
            let name = input_name(index);
            let value = Object::from_input(input.as_ref());
            debug!(name = %name, value = %value, "bound input");
            let handle = self.variable(&name);
            self.heap.set(handle, value);
        }
        Ok(())
    }

    /// Handle of a variable, creating it as integer 0 on first use
    pub fn variable(&mut self, name: &str) -> Handle {
        let heap = &mut self.heap;
        *self
            .symbols
            .get_or_insert_with(name, || heap.alloc_integer(0))
    }

    /// Current value of a variable, if it exists
    pub fn value_of(&self, name: &str) -> Option<&Object> {
        self.symbols.lookup(name).map(|h| self.heap.get(*h))
    }

    /// Run a compiled chunk to completion
    pub fn run(&mut self, chunk: &Chunk) -> Result<Completion> {
        self.stack.clear();
        let result = self.execute(chunk);
        let flushed = self
            .out
            .flush()
            .map_err(|e| SmilError::from(ErrorKind::Output(e.to_string())));
        let completion = result?;
        flushed?;
        debug!(
            objects = self.heap.len(),
            variables = self.symbols.len(),
            stacked = self.eval_stack.len(),
            ?completion,
            "run finished"
        );
        Ok(completion)
    }

    fn execute(&mut self, chunk: &Chunk) -> Result<Completion> {
        let mut frame = Frame { chunk, ip: 0 };

        loop {
            let start = frame.ip;
            match self.step(&mut frame) {
                Ok(None) => {}
                Ok(Some(completion)) => return Ok(completion),
                Err(kind) => {
                    let span = chunk.spans.get(start).copied();
                    return Err(SmilError::new(kind, span));
                }
            }
        }
    }

    /// Execute one instruction
    fn step(&mut self, frame: &mut Frame<'_>) -> Step<Option<Completion>> {
        let byte = frame.read_byte()?;
        let op = OpCode::try_from(byte)
            .map_err(|b| ErrorKind::RuntimeError(format!("invalid opcode {}", b)))?;
        trace!(ip = frame.ip - 1, op = ?op, stack = self.stack.len(), "execute");

        match op {
            OpCode::Variable => {
                let name = frame.read_name()?;
                let handle = self.variable(name);
                self.push(handle);
            }

            OpCode::NamedVariable => {
                let name = self.pop_text()?;
                let handle = self.variable(&name);
                self.push(handle);
            }

            OpCode::Assign => {
                let mode = AssignMode::try_from(frame.read_byte()?)
                    .map_err(|b| ErrorKind::RuntimeError(format!("invalid assign mode {}", b)))?;
                let target = self.pop()?;
                let source = self.pop()?;
                let value = self.heap.get(source);
                let stored = match mode {
                    AssignMode::Copy => value.clone(),
                    AssignMode::Truthy => Object::Integer(i64::from(value.is_truthy())),
                    AssignMode::Not => Object::Integer(i64::from(!value.is_truthy())),
                };
                self.heap.set(target, stored);
                self.push(target);
            }

            OpCode::Add => self.binary_op(BinaryOp::Add)?,
            OpCode::Subtract => self.binary_op(BinaryOp::Subtract)?,
            OpCode::Multiply => self.binary_op(BinaryOp::Multiply)?,
            OpCode::Divide => self.binary_op(BinaryOp::Divide)?,
            OpCode::Modulo => self.binary_op(BinaryOp::Modulo)?,
            OpCode::And => self.binary_op(BinaryOp::And)?,
            OpCode::Or => self.binary_op(BinaryOp::Or)?,

            OpCode::Length => {
                let handle = self.pop()?;
                let len = self.heap.get(handle).char_len() as i64;
                let result = self.heap.alloc_integer(len);
                self.push(result);
            }

            OpCode::Print => {
                let count = frame.read_u16()? as usize;
                if count > self.stack.len() {
                    return Err(ErrorKind::RuntimeError("print is missing arguments".into()));
                }
                let args = self.stack.split_off(self.stack.len() - count);
                let line = args
                    .iter()
                    .map(|h| self.heap.get(*h).to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.write_line(&line)?;
            }

            OpCode::Hello => {
                let name = self.pop_text()?;
                self.write_line(&format!("Hello, {}!", name))?;
            }

            OpCode::HelloWorld => self.write_line("Hello, world!")?,

            OpCode::StackPush => {
                let handle = self.pop()?;
                self.eval_stack.push(handle);
            }

            OpCode::StackPop => {
                let name = frame.read_name()?;
                let popped = self.eval_stack.pop()?;
                self.pop_into(name, popped);
            }

            OpCode::StackPopNamed => {
                let name = self.pop_text()?;
                let popped = self.eval_stack.pop()?;
                self.pop_into(&name, popped);
            }

            OpCode::StackClear => self.eval_stack.clear(),

            OpCode::Pop => {
                self.pop()?;
            }

            OpCode::JumpIfNotPositive => {
                let offset = frame.read_u16()?;
                let condition = self.pop()?;
                if self.heap.get(condition).to_integer() <= 0 {
                    frame.ip += offset as usize;
                }
            }

            OpCode::Loop => {
                let offset = frame.read_u16()?;
                frame.ip = frame
                    .ip
                    .checked_sub(offset as usize)
                    .ok_or_else(|| ErrorKind::RuntimeError("loop jumps before start".into()))?;
            }

            OpCode::Exit => {
                let code = frame.read_byte()?;
                return Ok(Some(Completion::Exit(code as i32)));
            }

            OpCode::Return => return Ok(Some(Completion::Finished)),
        }

        Ok(None)
    }

    fn binary_op(&mut self, op: BinaryOp) -> Step<()> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = ops::binary(op, self.heap.get(a), self.heap.get(b))?;
        let handle = self.heap.alloc(result);
        self.push(handle);
        Ok(())
    }

    /// Rebind `name` to the popped object and leave it as the result
    fn pop_into(&mut self, name: &str, popped: Handle) {
        if self.symbols.update(name, popped).is_none() {
            self.symbols.get_or_insert_with(name, || popped);
        }
        self.push(popped);
    }

    // ==================== Helpers ====================

    fn push(&mut self, handle: Handle) {
        self.stack.push(handle);
    }

    fn pop(&mut self) -> Step<Handle> {
        self.stack
            .pop()
            .ok_or_else(|| ErrorKind::RuntimeError("operand stack underflow".into()))
    }

    fn pop_text(&mut self) -> Step<String> {
        let handle = self.pop()?;
        Ok(self.heap.get(handle).text().into_owned())
    }

    fn write_line(&mut self, line: &str) -> Step<()> {
        writeln!(self.out, "{}", line).map_err(|e| ErrorKind::Output(e.to_string()))
    }
}
