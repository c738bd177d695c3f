//! Symbol table: a single flat namespace mapping variable names to their
//! declared type. The language has no procedures or nested scopes, so there
//! is no deletion and no shadowing; entries live for the whole compilation.

use std::collections::HashMap;

use crate::ty::Type;

/// Marker returned when a name is declared twice. The caller attaches the
/// source position and turns it into a `CompileError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redeclaration;

#[derive(Debug, Default)]
pub struct SymbolTable {
  entries: HashMap<String, Type>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a fresh name. Redeclaration is an error even with an identical
  /// type.
  pub fn declare(&mut self, name: &str, ty: Type) -> Result<(), Redeclaration> {
    if self.entries.contains_key(name) {
      return Err(Redeclaration);
    }
    self.entries.insert(name.to_string(), ty);
    Ok(())
  }

  pub fn lookup(&self, name: &str) -> Option<Type> {
    self.entries.get(name).copied()
  }

  pub fn is_known(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }
}
