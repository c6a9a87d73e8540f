/*!

  Intcode has no separate code segment. Every memory cell is a signed 64 bit `Word`, and a word
  becomes an instruction only when the program counter lands on it. The low two decimal digits
  of the instruction word select the operation, and each decimal digit above those selects the
  addressing mode of one operand, read right to left:

    ABCDE
     1002

    DE - two-digit opcode,      02 == MUL
     C - mode of 1st operand,    0 == position
     B - mode of 2nd operand,    1 == immediate
     A - mode of 3rd operand,    0 == position (a leading zero may be omitted)

  The operands themselves are the words that follow the instruction word. Because code and
  data share one address space, a program is free to rewrite its own instructions and
  operands, and the decoder only ever looks at the word currently under the program counter.

  Decimal opcodes are not dense, so `Opcode` carries explicit discriminants and is converted
  from the raw digits with `TryFrom`. The mnemonics used by the assembler and disassembler come
  from the `strum` derives.

*/

mod instruction;
pub mod assembly;

pub use instruction::{Instruction, decode, MAX_OPERANDS};
pub use assembly::{assemble, disassemble, AssemblyError, AssemblyLine};

use strum_macros::{Display as StrumDisplay, IntoStaticStr, EnumString};
use num_enum::{TryFromPrimitive, IntoPrimitive};

/// The machine's one cell type, used for code, data, addresses and I/O values alike.
pub type Word = i64;

/**
  Opcodes of the virtual machine.

  The discriminant of each variant is the decimal opcode found in the low two digits of an
  instruction word. Order-dependencies: none, but `Opcode::arity()` and `Opcode::write_operand()`
  must be kept in agreement with the table in `Machine::execute`.
*/
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[repr(u8)]
pub enum Opcode {
  #[strum(serialize = "add")]
  Add          =  1, // c = a + b
  #[strum(serialize = "mul")]
  Multiply     =  2, // c = a * b
  #[strum(serialize = "in")]
  Input        =  3, // a = <input>
  #[strum(serialize = "out")]
  Output       =  4, // <output> = a
  #[strum(serialize = "jnz")]
  JumpIfTrue   =  5, // if a != 0 { pc = b }
  #[strum(serialize = "jz")]
  JumpIfFalse  =  6, // if a == 0 { pc = b }
  #[strum(serialize = "lt")]
  LessThan     =  7, // c = a < b
  #[strum(serialize = "eq")]
  Equals       =  8, // c = a == b
  #[strum(serialize = "arb")]
  AdjustBase   =  9, // relative_base += a
  #[strum(serialize = "hlt")]
  Halt         = 99,
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// The number of operand words following the instruction word.
  pub fn arity(&self) -> usize {
    match self {
      | Opcode::Add
      | Opcode::Multiply
      | Opcode::LessThan
      | Opcode::Equals      => 3,

      | Opcode::JumpIfTrue
      | Opcode::JumpIfFalse => 2,

      | Opcode::Input
      | Opcode::Output
      | Opcode::AdjustBase  => 1,

      Opcode::Halt          => 0,
    }
  }

  /// The size in words of the whole instruction, including the instruction word.
  pub fn width(&self) -> usize {
    self.arity() + 1
  }

  /// The index of the operand that names a destination address, if the operation writes memory.
  pub fn write_operand(&self) -> Option<usize> {
    match self {
      | Opcode::Add
      | Opcode::Multiply
      | Opcode::LessThan
      | Opcode::Equals => Some(2),

      Opcode::Input    => Some(0),

      _                => None
    }
  }
}
