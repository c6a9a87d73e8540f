/*!
  Decoding and encoding of instruction words.
*/
use std::convert::TryFrom;

use super::{Opcode, Word};
use crate::address::{Mode, Operand};
use crate::error::DecodeErrorKind;

/// No instruction takes more than three operands.
pub const MAX_OPERANDS: usize = 3;

/// Holds the decoded components of an instruction word. Modes past the opcode's arity are
/// always `Mode::Position` and carry no meaning.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Instruction {
  pub opcode : Opcode,
  pub modes  : [Mode; MAX_OPERANDS],
}

/**
  Splits an instruction word into its opcode and the modes of the operands the opcode uses.

  Mode digits above the opcode's arity are ignored. A word is rejected if its opcode is not in
  the table, if a mode digit the opcode uses is not 0, 1 or 2, or if the opcode's write target
  is in immediate mode. Negative words have a negative opcode field and so never decode.
*/
pub fn decode(word: Word) -> Result<Instruction, DecodeErrorKind> {
  let opcode =
    u8::try_from(word % 100)
      .ok()
      .and_then(|code| Opcode::try_from(code).ok())
      .ok_or(DecodeErrorKind::UnknownOpcode)?;

  let mut modes  = [Mode::Position; MAX_OPERANDS];
  let mut digits = word / 100;
  for (k, mode) in modes.iter_mut().enumerate().take(opcode.arity()) {
    let digit = digits % 10;
    *mode     = Mode::try_from(digit as u8)
                  .map_err(|_| DecodeErrorKind::UnknownMode{ operand: k + 1, digit })?;
    digits   /= 10;
  }

  if let Some(k) = opcode.write_operand() {
    if modes[k] == Mode::Immediate {
      return Err(DecodeErrorKind::ImmediateWrite{ operand: k + 1 });
    }
  }

  Ok(Instruction{ opcode, modes })
}

impl Instruction {

  pub fn new(opcode: Opcode, modes: &[Mode]) -> Instruction {
    let mut all = [Mode::Position; MAX_OPERANDS];
    for (slot, mode) in all.iter_mut().zip(modes) {
      *slot = *mode;
    }
    Instruction{ opcode, modes: all }
  }

  /// Reassembles the instruction word. `decode(i.encode()) == Ok(i)` for every decodable `i`.
  pub fn encode(&self) -> Word {
    let mut word  = self.opcode.code() as Word;
    let mut scale = 100;
    for mode in self.modes.iter().take(self.opcode.arity()) {
      word  += Into::<u8>::into(*mode) as Word * scale;
      scale *= 10;
    }
    word
  }

  /// Pairs operand `k` (counting from 0) with its raw operand word.
  pub fn operand(&self, k: usize, raw: Word) -> Operand {
    Operand::new(self.modes[k], raw)
  }

}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn modes_are_read_right_to_left() {
    let instruction = decode(1002).unwrap();
    assert_eq!(instruction.opcode, Opcode::Multiply);
    assert_eq!(instruction.modes, [Mode::Position, Mode::Immediate, Mode::Position]);

    let instruction = decode(21101).unwrap();
    assert_eq!(instruction.opcode, Opcode::Add);
    assert_eq!(instruction.modes, [Mode::Immediate, Mode::Immediate, Mode::Relative]);
  }

  #[test]
  fn digits_above_the_arity_are_ignored() {
    let instruction = decode(11199).unwrap();
    assert_eq!(instruction.opcode, Opcode::Halt);
    assert_eq!(instruction.modes, [Mode::Position; MAX_OPERANDS]);
  }

  #[test]
  fn unknown_opcodes() {
    assert_eq!(decode(0),   Err(DecodeErrorKind::UnknownOpcode));
    assert_eq!(decode(42),  Err(DecodeErrorKind::UnknownOpcode));
    assert_eq!(decode(-99), Err(DecodeErrorKind::UnknownOpcode));
    assert_eq!(decode(-1),  Err(DecodeErrorKind::UnknownOpcode));
  }

  #[test]
  fn unknown_modes() {
    assert_eq!(decode(301), Err(DecodeErrorKind::UnknownMode{ operand: 1, digit: 3 }));
    // `out` has one operand, so the 9 is above its arity.
    assert!(decode(9004).is_ok());
    assert_eq!(decode(4005), Err(DecodeErrorKind::UnknownMode{ operand: 2, digit: 4 }));
  }

  #[test]
  fn immediate_write_targets_are_rejected() {
    assert_eq!(decode(10001), Err(DecodeErrorKind::ImmediateWrite{ operand: 3 }));
    assert_eq!(decode(103),   Err(DecodeErrorKind::ImmediateWrite{ operand: 1 }));
    assert!(decode(203).is_ok());
    assert!(decode(104).is_ok());
  }

  #[test]
  fn encode_inverts_decode() {
    for word in &[1, 2, 3, 4, 99, 1002, 1101, 21101, 22207, 203, 204, 109, 1105, 2106] {
      assert_eq!(decode(*word).unwrap().encode(), *word);
    }
    let instruction = Instruction::new(Opcode::Equals, &[Mode::Relative, Mode::Immediate]);
    assert_eq!(instruction.encode(), 1208);
  }
}
