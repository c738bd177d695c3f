//! Assembly backend: typed instruction records, label allocation, and the
//! emitter that serializes everything into AT&T x86-64 text.
//!
//! The compiler appends `Instr` values in source order and never reads them
//! back; tests can assert on the records instead of matching strings. The
//! target model is a pure stack machine: every expression leaves exactly
//! one value on the hardware stack and every consumer pops what it pushed.

use std::fmt;

/// The handful of registers the stack-machine codegen touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
  Rax,
  Rbx,
  Rdx,
  Rsi,
  Rdi,
}

impl fmt::Display for Reg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Reg::Rax => "%rax",
      Reg::Rbx => "%rbx",
      Reg::Rdx => "%rdx",
      Reg::Rsi => "%rsi",
      Reg::Rdi => "%rdi",
    };
    f.write_str(name)
  }
}

/// Branch conditions. Comparisons are unsigned, hence jb/ja forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
  Eq,
  Ne,
  Below,
  Above,
  BelowOrEq,
  AboveOrEq,
}

impl Cond {
  fn mnemonic(self) -> &'static str {
    match self {
      Cond::Eq => "je",
      Cond::Ne => "jne",
      Cond::Below => "jb",
      Cond::Above => "ja",
      Cond::BelowOrEq => "jbe",
      Cond::AboveOrEq => "jae",
    }
  }
}

/// A unique jump target: fixed prefix plus the allocator's numeric suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
  prefix: &'static str,
  id: u64,
}

impl Label {
  pub fn new(prefix: &'static str, id: u64) -> Self {
    Self { prefix, id }
  }
}

impl fmt::Display for Label {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}", self.prefix, self.id)
  }
}

/// Produces the numeric suffixes for jump labels. The counter is shared by
/// every control construct and boolean materialization in a compilation, so
/// no two constructs ever share a suffix, nested or not. State lives in the
/// compiler context and is rebuilt per run, keeping label sequences
/// deterministic for identical input.
#[derive(Debug)]
pub struct LabelAllocator {
  next: u64,
}

impl LabelAllocator {
  pub fn new() -> Self {
    Self { next: 1 }
  }

  /// Return a fresh suffix, strictly greater than all previous ones.
  pub fn next(&mut self) -> u64 {
    let id = self.next;
    self.next += 1;
    id
  }
}

impl Default for LabelAllocator {
  fn default() -> Self {
    Self::new()
  }
}

/// Push/pop operands: immediates, named 8-byte variable slots, registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
  Imm(i64),
  Var(String),
  Reg(Reg),
}

impl fmt::Display for Operand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Operand::Imm(value) => write!(f, "${value}"),
      Operand::Var(name) => f.write_str(name),
      Operand::Reg(reg) => write!(f, "{reg}"),
    }
  }
}

/// One emitted instruction. Each variant serializes to a single line of
/// AT&T assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
  Push(Operand),
  Pop(Operand),
  /// movq $imm, reg
  MovImm(i64, Reg),
  /// movabsq $imm, reg — for immediates wider than 32 bits
  MovAbs(u64, Reg),
  /// addq src, dst
  Add(Reg, Reg),
  /// subq src, dst
  Sub(Reg, Reg),
  /// mulq reg (result in %rdx:%rax)
  Mul(Reg),
  /// div reg (quotient in %rax, remainder in %rdx)
  Div(Reg),
  /// cmpq lhs, rhs — sets flags from rhs - lhs
  CmpRegs(Reg, Reg),
  /// cmpq $imm, reg
  CmpImm(i64, Reg),
  /// cmpq reg, var — sets flags from var - reg
  CmpVar(Reg, String),
  /// incq var
  IncVar(String),
  Jump(Label),
  JumpIf(Cond, Label),
  /// label definition
  Label(Label),
  /// leaq symbol(%rip), reg
  Lea(&'static str, Reg),
  /// xor reg, reg
  Zero(Reg),
  Call(&'static str),
}

impl fmt::Display for Instr {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Instr::Push(op) => write!(f, "\tpush {op}"),
      Instr::Pop(op) => write!(f, "\tpop {op}"),
      Instr::MovImm(value, reg) => write!(f, "\tmovq ${value}, {reg}"),
      Instr::MovAbs(value, reg) => write!(f, "\tmovabsq ${value}, {reg}"),
      Instr::Add(src, dst) => write!(f, "\taddq {src}, {dst}"),
      Instr::Sub(src, dst) => write!(f, "\tsubq {src}, {dst}"),
      Instr::Mul(reg) => write!(f, "\tmulq {reg}"),
      Instr::Div(reg) => write!(f, "\tdiv {reg}"),
      Instr::CmpRegs(lhs, rhs) => write!(f, "\tcmpq {lhs}, {rhs}"),
      Instr::CmpImm(value, reg) => write!(f, "\tcmpq ${value}, {reg}"),
      Instr::CmpVar(reg, name) => write!(f, "\tcmpq {reg}, {name}"),
      Instr::IncVar(name) => write!(f, "\tincq {name}"),
      Instr::Jump(label) => write!(f, "\tjmp {label}"),
      Instr::JumpIf(cond, label) => write!(f, "\t{} {label}", cond.mnemonic()),
      Instr::Label(label) => write!(f, "{label}:"),
      Instr::Lea(symbol, reg) => write!(f, "\tleaq {symbol}(%rip), {reg}"),
      Instr::Zero(reg) => write!(f, "\txor {reg}, {reg}"),
      Instr::Call(name) => write!(f, "\tcall {name}"),
    }
  }
}

/// Read-only-data symbols referenced by DISPLAY.
pub const FORMAT_UNSIGNED: &str = "FormatString1";
pub const STRING_TRUE: &str = "TrueString";
pub const STRING_FALSE: &str = "FalseString";

/// Ordered, append-only sink for the generated program. Declarations
/// reserve zero-initialized 8-byte data slots; statements append
/// instruction records; `to_assembly` lays out the final text with the
/// fixed prologue, epilogue, and read-only data.
#[derive(Debug, Default)]
pub struct Emitter {
  slots: Vec<String>,
  code: Vec<Instr>,
}

impl Emitter {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserve an 8-byte zero-initialized data slot for a variable.
  pub fn reserve_slot(&mut self, name: &str) {
    self.slots.push(name.to_string());
  }

  pub fn emit(&mut self, instr: Instr) {
    self.code.push(instr);
  }

  /// The instruction records emitted so far, in order.
  pub fn code(&self) -> &[Instr] {
    &self.code
  }

  /// Serialize the whole program: header, data section, entry point, the
  /// translated statements, epilogue, and read-only data.
  pub fn to_assembly(&self) -> String {
    let mut out = String::new();
    out.push_str("\t\t\t# generated by minipas\n");
    out.push_str("\t.extern printf\n");

    if !self.slots.is_empty() {
      out.push_str("\t.data\n");
      out.push_str("\t.align 8\n");
      for name in &self.slots {
        out.push_str(name);
        out.push_str(":\t.quad 0\n");
      }
    }

    out.push_str("\t.text\n");
    out.push_str("\t.globl main\n");
    out.push_str("main:\n");
    out.push_str("\tmovq %rsp, %rbp\n");

    for instr in &self.code {
      out.push_str(&instr.to_string());
      out.push('\n');
    }

    out.push_str("\tmovq %rbp, %rsp\n");
    out.push_str("\tret\n");

    out.push_str("\t.section .rodata\n");
    out.push_str(&format!("{FORMAT_UNSIGNED}:\t.string \"%llu\\n\"\n"));
    out.push_str(&format!("{STRING_TRUE}:\t.string \"TRUE\\n\"\n"));
    out.push_str(&format!("{STRING_FALSE}:\t.string \"FALSE\\n\"\n"));
    out.push_str("\t.section .note.GNU-stack,\"\",@progbits\n");
    out
  }
}
