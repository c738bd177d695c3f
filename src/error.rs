//! Shared error utilities used across the compilation pipeline.
//!
//! Every diagnostic carries the source line and the offending lexeme so the
//! CLI can print a single self-contained message. All errors are fatal: the
//! first one propagates up the grammar by `Result` and stops the descent,
//! but the library never terminates the process itself.

use snafu::Snafu;

use crate::ty::Type;

pub type CompileResult<T> = Result<T, CompileError>;

/// One variant per diagnostic cause. The syntax-shaped and type-shaped
/// variants have identical mechanics; only the wording differs.
#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("line {line}: expected a number, an identifier or '(' (got '{lexeme}')"))]
  ExpectedValue { line: usize, lexeme: String },

  #[snafu(display("line {line}: expected {expected} (got '{lexeme}')"))]
  UnexpectedToken {
    line: usize,
    expected: String,
    lexeme: String,
  },

  #[snafu(display("line {line}: trailing input after the final '.' (got '{lexeme}')"))]
  TrailingInput { line: usize, lexeme: String },

  #[snafu(display("line {line}: variable '{name}' has not been declared"))]
  UndeclaredVariable { line: usize, name: String },

  #[snafu(display("line {line}: variable '{name}' is already declared"))]
  AlreadyDeclared { line: usize, name: String },

  #[snafu(display("line {line}: unknown operator (got '{lexeme}')"))]
  UnknownOperator { line: usize, lexeme: String },

  #[snafu(display("line {line}: incompatible types {lhs} and {rhs} (near '{lexeme}')"))]
  IncompatibleTypes {
    line: usize,
    lhs: Type,
    rhs: Type,
    lexeme: String,
  },

  #[snafu(display("line {line}: condition must be BOOLEAN, found {found} (near '{lexeme}')"))]
  NonBooleanCondition {
    line: usize,
    found: Type,
    lexeme: String,
  },

  #[snafu(display("line {line}: FOR bound must be INTEGER, found {found} (near '{lexeme}')"))]
  NonIntegerBound {
    line: usize,
    found: Type,
    lexeme: String,
  },

  #[snafu(display("line {line}: DISPLAY does not support type {found} (near '{lexeme}')"))]
  UnsupportedDisplayType {
    line: usize,
    found: Type,
    lexeme: String,
  },

  #[snafu(display("line {line}: type {ty} cannot be used in a declaration"))]
  UnsupportedDeclarationType { line: usize, ty: Type },

  /// State inconsistency inside the compiler itself, e.g. an unsupported
  /// type reaching storage allocation. A defect, not a user error.
  #[snafu(display("internal compiler error: {message}"))]
  Internal { message: String },
}
