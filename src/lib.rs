//! Crate root: wires together the compilation pipeline.
//!
//! Each stage consumes the whole output of the previous one:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns a flat, evaluation-ordered node list.
//! - `codegen` lowers that list into 32-bit x86 assembly in one forward pass.
//! - `error` holds the error taxonomy shared by the other modules.
//!
//! All compilation state lives inside a single call, so independent sources
//! can be compiled concurrently.

pub mod ast;
pub mod config;
pub mod error;
pub mod parser;
pub mod tokenizer;

mod codegen;

pub use codegen::generate;
pub use error::{CompileError, CompileResult};

/// Compile a source string into assembly.
pub fn compile(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let nodes = parser::parse(tokens, source)?;
  generate(&nodes)
}
