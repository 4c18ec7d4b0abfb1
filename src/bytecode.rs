//! Bytecode instructions for the SMIL VM
//!
//! The operand stack holds heap handles. Operands are one byte for counts
//! and modes and two bytes (big endian) for name indices and jump offsets.

use std::fmt;

use crate::token::Span;

/// Opcodes for the VM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // Variables
    Variable,      // Push the handle of a named variable (name index)
    NamedVariable, // Pop a handle, use its text as the variable name

    /// Pop target then value, assign (mode), push target
    Assign,

    // Arithmetic and text operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    And,
    Or,

    Length, // Pop, push its text length

    // Output
    Print,      // Print (arg count)
    Hello,      // Pop a handle, greet its text
    HelloWorld,

    // Evaluation stack
    StackPush,     // Pop a handle onto the evaluation stack
    StackPop,      // Pop the evaluation stack into a variable (name index)
    StackPopNamed, // Same, with the name popped from the operand stack
    StackClear,

    /// Drop the top of the operand stack
    Pop,

    // Control flow
    JumpIfNotPositive, // Pop, jump if its integer view is <= 0
    Loop,              // Jump backwards

    Exit,   // Stop with status (code)
    Return, // End of program
}

const OPCODES: [OpCode; 23] = [
    OpCode::Variable,
    OpCode::NamedVariable,
    OpCode::Assign,
    OpCode::Add,
    OpCode::Subtract,
    OpCode::Multiply,
    OpCode::Divide,
    OpCode::Modulo,
    OpCode::And,
    OpCode::Or,
    OpCode::Length,
    OpCode::Print,
    OpCode::Hello,
    OpCode::HelloWorld,
    OpCode::StackPush,
    OpCode::StackPop,
    OpCode::StackPopNamed,
    OpCode::StackClear,
    OpCode::Pop,
    OpCode::JumpIfNotPositive,
    OpCode::Loop,
    OpCode::Exit,
    OpCode::Return,
];

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OPCODES
            .get(byte as usize)
            .copied()
            .filter(|op| *op as u8 == byte)
            .ok_or(byte)
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

/// How `Assign` turns the value into the stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AssignMode {
    /// Copy the object (strings are shared)
    Copy,
    /// Store 1 if the value is truthy, else 0
    Truthy,
    /// Store 1 if the value is falsy, else 0
    Not,
}

impl TryFrom<u8> for AssignMode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(AssignMode::Copy),
            1 => Ok(AssignMode::Truthy),
            2 => Ok(AssignMode::Not),
            other => Err(other),
        }
    }
}

/// A chunk of bytecode with associated data
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    /// The bytecode instructions
    pub code: Vec<u8>,

    /// Source location of each byte (for error reporting)
    pub spans: Vec<Span>,

    /// Variable names referenced by index
    pub names: Vec<String>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write an opcode to the chunk
    pub fn write(&mut self, op: OpCode, span: Span) {
        self.write_byte(op.into(), span);
    }

    /// Write a raw byte (operand)
    pub fn write_byte(&mut self, byte: u8, span: Span) {
        self.code.push(byte);
        self.spans.push(span);
    }

    /// Write a 16-bit operand
    pub fn write_u16(&mut self, value: u16, span: Span) {
        self.write_byte((value >> 8) as u8, span);
        self.write_byte(value as u8, span);
    }

    /// Add a name and return its index, reusing an existing entry.
    /// `None` once the name table is full.
    pub fn add_name(&mut self, name: &str) -> Option<u16> {
        let idx = match self.names.iter().position(|n| n == name) {
            Some(idx) => idx,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            }
        };
        u16::try_from(idx).ok()
    }

    /// Read a 16-bit value at offset
    pub fn read_u16(&self, offset: usize) -> u16 {
        ((self.code[offset] as u16) << 8) | (self.code[offset + 1] as u16)
    }

    /// Get current code length (for jump patching)
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Point the jump operand at `offset` to the current end of the chunk.
    /// Returns false if the distance does not fit in 16 bits.
    pub fn patch_jump(&mut self, offset: usize) -> bool {
        let jump = self.code.len() - offset - 2;
        let Ok(jump) = u16::try_from(jump) else {
            return false;
        };
        self.code[offset] = (jump >> 8) as u8;
        self.code[offset + 1] = jump as u8;
        true
    }

    /// Disassemble for debugging
    pub fn disassemble(&self, name: &str) -> String {
        let mut result = format!("== {} ==\n", name);
        let mut offset = 0;

        while offset < self.code.len() {
            let (s, new_offset) = self.disassemble_instruction(offset);
            result.push_str(&s);
            result.push('\n');
            offset = new_offset;
        }

        result
    }

    pub fn disassemble_instruction(&self, offset: usize) -> (String, usize) {
        let line = self.spans.get(offset).map_or(0, |s| s.line);
        let Ok(op) = OpCode::try_from(self.code[offset]) else {
            return (
                format!("{:04} {:4} <bad opcode {}>", offset, line, self.code[offset]),
                offset + 1,
            );
        };

        let (instr, new_offset) = match op {
            OpCode::Variable | OpCode::StackPop => {
                let idx = self.read_u16(offset + 1);
                let name = self.names.get(idx as usize).map_or("?", String::as_str);
                (format!("{:?} {:04} '{}'", op, idx, name), offset + 3)
            }
            OpCode::JumpIfNotPositive => {
                let jump = self.read_u16(offset + 1);
                (format!("{:?} -> {:04}", op, offset + 3 + jump as usize), offset + 3)
            }
            OpCode::Loop => {
                let jump = self.read_u16(offset + 1);
                (format!("{:?} -> {:04}", op, offset + 3 - jump as usize), offset + 3)
            }
            OpCode::Print => {
                let count = self.read_u16(offset + 1);
                (format!("{:?} ({})", op, count), offset + 3)
            }
            OpCode::Assign => {
                let mode = self.code[offset + 1];
                let mode = AssignMode::try_from(mode)
                    .map_or_else(|b| b.to_string(), |m| format!("{:?}", m));
                (format!("{:?} {}", op, mode), offset + 2)
            }
            OpCode::Exit => {
                let code = self.code[offset + 1];
                (format!("{:?} ({})", op, code), offset + 2)
            }
            _ => (format!("{:?}", op), offset + 1),
        };

        (format!("{:04} {:4} {}", offset, line, instr), new_offset)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.disassemble("chunk"))
    }
}
