//! Parameter modes and the operand resolver. An `Operand` is a raw operand word paired with the
//! mode digit that governs it; resolving it against memory and the relative base yields either
//! the value it denotes or the address it names.

use std::fmt::{Display, Formatter};

use num_enum::{TryFromPrimitive, IntoPrimitive};

use crate::bytecode::Word;
use crate::error::AddressError;
use crate::memory::Memory;

#[derive(
  TryFromPrimitive, IntoPrimitive,
  Clone, Copy, Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum Mode {
  /// The operand is an address; the value is `memory[operand]`.
  Position  = 0,
  /// The operand is the value itself. Never valid for a write target.
  Immediate = 1,
  /// The operand is an offset from the relative base.
  Relative  = 2,
}

impl Default for Mode {
  fn default() -> Self {
    Mode::Position
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Operand {
  pub mode : Mode,
  pub raw  : Word
}

impl Operand {

  pub fn new(mode: Mode, raw: Word) -> Operand {
    Operand{ mode, raw }
  }

  /**
    The effective address named by the operand. Write targets are always resolved through this
    function and never dereferenced further.

    An immediate operand has no address. The decoder rejects immediate write targets before an
    instruction executes, so this only fails for hand-built operands.
  */
  pub fn address(&self, relative_base: Word) -> Result<Word, AddressError> {
    match self.mode {

      Mode::Position  => Ok(self.raw),

      Mode::Relative  => {
        relative_base
          .checked_add(self.raw)
          .ok_or(AddressError::Overflow{ base: relative_base, offset: self.raw })
      }

      Mode::Immediate => Err(AddressError::Immediate(self.raw)),

    }
  }

  /// The effective value of the operand. Reading through an address may grow `memory`.
  pub fn value(&self, memory: &mut Memory, relative_base: Word) -> Result<Word, AddressError> {
    match self.mode {
      Mode::Immediate => Ok(self.raw),
      _               => memory.read(self.address(relative_base)?),
    }
  }

}

/// Assembly syntax: `@12` position, `#12` immediate, `rb+12` relative.
impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self.mode {
      Mode::Position               => write!(f, "@{}", self.raw),
      Mode::Immediate              => write!(f, "#{}", self.raw),
      Mode::Relative if self.raw < 0 => write!(f, "rb{}", self.raw),
      Mode::Relative               => write!(f, "rb+{}", self.raw),
    }
  }
}
