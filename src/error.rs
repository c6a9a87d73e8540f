//! Fault conditions of the machine and of program loading.
//!
//! A `Fault` ends the life of a machine. Running out of input is not a fault: the run loop
//! reports it as `Status::Blocked`, and only the scripted helpers, which know that no more input
//! is coming, turn it into `Fault::InputExhausted`.

use thiserror::Error;

use crate::bytecode::{Opcode, Word};
use crate::trace::History;

#[derive(Clone, Copy, Eq, PartialEq, Debug, Error)]
pub enum AddressError {
  #[error("negative address {0}")]
  Negative(Word),
  #[error("address {0} is beyond the memory the machine can allocate")]
  Unaddressable(Word),
  #[error("relative address overflows: base {base} + offset {offset}")]
  Overflow { base: Word, offset: Word },
  #[error("immediate operand {0} used as an address")]
  Immediate(Word),
}

/// What was wrong with an instruction word. Operands are numbered from 1.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Error)]
pub enum DecodeErrorKind {
  #[error("unknown opcode")]
  UnknownOpcode,
  #[error("unknown parameter mode {digit} for operand {operand}")]
  UnknownMode { operand: usize, digit: Word },
  #[error("operand {operand} is a write target in immediate mode")]
  ImmediateWrite { operand: usize },
}

/// An instruction word that cannot be executed. Carries the full instruction history since the
/// last reset for postmortem diagnosis.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("malformed program at pc {pc}: {kind} in instruction word {word} (opcode {})", .word % 100)]
pub struct DecodeError {
  pub pc      : Word,
  pub word    : Word,
  pub kind    : DecodeErrorKind,
  pub history : History,
}

impl DecodeError {
  /// The opcode field of the offending word, `word mod 100`.
  pub fn opcode(&self) -> Word {
    self.word % 100
  }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum Fault {
  #[error(transparent)]
  Decode(Box<DecodeError>),

  #[error("bad memory access at pc {pc}: {source}")]
  Address {
    pc: Word,
    #[source]
    source: AddressError
  },

  #[error("arithmetic overflow in `{opcode}` at pc {pc}")]
  Overflow { pc: Word, opcode: Opcode },

  #[error("scripted input exhausted: the program is still waiting for input at pc {pc}")]
  InputExhausted { pc: Word },
}

impl Fault {
  /// True when the fault was caused by the program itself rather than by its input.
  pub fn is_malformed_program(&self) -> bool {
    !matches!(self, Fault::InputExhausted{ .. })
  }

  pub fn decode_error(&self) -> Option<&DecodeError> {
    match self {
      Fault::Decode(e) => Some(e),
      _                => None
    }
  }
}

impl From<DecodeError> for Fault {
  fn from(e: DecodeError) -> Self {
    Fault::Decode(Box::new(e))
  }
}

/// Errors in program source text.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ParseError {
  #[error("program source is empty")]
  Empty,
  #[error("expected a signed integer at line {line}, column {column}, found `{found}`")]
  Malformed { line: usize, column: usize, found: String },
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_error_names_the_opcode() {
    let e = DecodeError {
      pc      : 4,
      word    : 1042,
      kind    : DecodeErrorKind::UnknownOpcode,
      history : History::default(),
    };
    assert_eq!(e.opcode(), 42);
    assert_eq!(
      e.to_string(),
      "malformed program at pc 4: unknown opcode in instruction word 1042 (opcode 42)"
    );
  }

  #[test]
  fn exhaustion_is_distinguishable_from_corruption() {
    let exhausted = Fault::InputExhausted{ pc: 0 };
    let corrupt   = Fault::Address{ pc: 0, source: AddressError::Negative(-1) };
    assert!(!exhausted.is_malformed_program());
    assert!(corrupt.is_malformed_program());
    assert!(exhausted.to_string().contains("input exhausted"));
  }
}
