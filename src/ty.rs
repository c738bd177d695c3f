use std::fmt;

/// Static types known to the compiler.
///
/// Only `UnsignedInt` and `Boolean` have storage allocation and code
/// generation support; the remaining variants exist so declarations can be
/// rejected with a precise diagnostic instead of a default-case failure
/// deep inside codegen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
  UnsignedInt,
  Boolean,
  Char,
  Double,
  CharConst,
  DoubleConst,
}

impl Type {
  /// True for the types that can be stored in an 8-byte slot and flow
  /// through the stack-machine codegen.
  pub fn has_codegen_support(self) -> bool {
    matches!(self, Type::UnsignedInt | Type::Boolean)
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Type::UnsignedInt => "INTEGER",
      Type::Boolean => "BOOLEAN",
      Type::Char => "CHAR",
      Type::Double => "DOUBLE",
      Type::CharConst => "CHAR constant",
      Type::DoubleConst => "DOUBLE constant",
    };
    f.write_str(name)
  }
}
