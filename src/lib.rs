//! Crate root: wires together the compilation pipeline.
//!
//! The translator is single-pass: there is no AST and no separate
//! optimization or linking phase. The stages are:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `compiler` walks the grammar once, type-checking and emitting
//!   instruction records as it parses.
//! - `asm` models the emitted instructions and serializes them, together
//!   with the data and read-only-data sections, into AT&T x86-64 text.
//! - `symbols`, `ty`, and `error` hold the supporting pieces.

pub mod asm;
pub mod compiler;
pub mod error;
pub mod symbols;
pub mod tokenizer;
pub mod ty;

pub use error::{CompileError, CompileResult};

/// Compile a source string into AT&T assembly.
pub fn compile(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source);
  let emitter = compiler::Compiler::new(tokens, source).compile()?;
  Ok(emitter.to_assembly())
}
