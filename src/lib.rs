//! SMIL - a scripting language written in two-character sigils
//!
//! Source is parsed into an AST, compiled to bytecode and run on a small
//! stack VM whose objects are dynamically typed integers and strings.

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod heap;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod stack;
pub mod symbol_table;
pub mod token;
pub mod value;
pub mod vm;

pub use ast::Program;
pub use bytecode::Chunk;
pub use error::{ErrorClass, ErrorKind, Result, SmilError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use value::Object;
pub use vm::{Completion, VM};

/// Output and outcome of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: String,
    pub completion: Completion,
}

/// Parse and compile SMIL source
pub fn compile(source: &str) -> Result<(Program, Chunk)> {
    let program = Parser::new(source).parse()?;
    let chunk = compiler::Compiler::new().compile(&program)?;
    Ok((program, chunk))
}

/// Convenience function to run SMIL code, capturing what it prints
pub fn run(source: &str, inputs: &[&str]) -> Result<Execution> {
    let (program, chunk) = compile(source)?;

    let mut vm = VM::new(Vec::new());
    vm.bind_inputs(program.input_count, inputs)?;
    let completion = vm.run(&chunk)?;

    let output = String::from_utf8_lossy(&vm.into_output()).into_owned();
    Ok(Execution { output, completion })
}

/// Version of the SMIL toolchain
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
