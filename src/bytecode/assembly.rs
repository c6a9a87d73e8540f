/*!
  The human readable textual form of a program is called assembly. This module leverages the
  `strum` derives of `Opcode` to render a program image as assembly and to parse assembly back
  into an image.

  One statement per line:
  ```text
      0: arb #1            % optional `address:` label, ignored by the assembler
      2: out rb-1
      4: add @100, #1, @100
     16: data 7, -3
  ```
  Operands carry their mode as a prefix: `@` position, `#` immediate, `rb` relative (followed by
  a signed offset). `data` emits its bare words verbatim. `%` starts a comment.
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use nom::{
  branch::alt,
  bytes::complete::tag,
  character::complete::{
    alpha1,
    char as one_char,
    digit1,
    space0
  },
  combinator::{all_consuming, map, opt, rest},
  multi::separated_list,
  sequence::{
    delimited,
    pair,
    preceded,
    terminated,
    tuple
  },
  IResult
};
use thiserror::Error;

use super::{decode, Instruction, Opcode, Word};
use crate::address::{Mode, Operand};
use crate::parser::word;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum AssemblyError {
  #[error("Error on line {line}: cannot parse `{text}`.")]
  Syntax { line: usize, text: String },

  #[error("Error on line {line}: {name} is not an operation.")]
  NotAnOperation { line: usize, name: String },

  #[error("Error on line {line}: {operation} requires {expected} operands but was given {given}.")]
  WrongArity { line: usize, operation: Opcode, expected: usize, given: usize },

  #[error("Error on line {line}: operand {operand} of {operation} is a write target and cannot be immediate.")]
  ImmediateWrite { line: usize, operation: Opcode, operand: usize },

  #[error("Error on line {line}: operand {operand} needs a mode prefix (`@`, `#` or `rb`).")]
  MissingMode { line: usize, operand: usize },

  #[error("Error on line {line}: data words take no mode prefix.")]
  ModeOnData { line: usize },
}

/// One disassembled statement and the words it covers.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AssemblyLine {
  pub address : usize,
  pub words   : Vec<Word>,
  pub text    : String,
}

impl Display for AssemblyLine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:>6}: {}", self.address, self.text)
  }
}

/**
  Renders `image` as assembly by a linear sweep from address 0. Code and data are not
  distinguished in an image, so any word that does not decode, that would run past the end of the
  image, or that carries mode digits its opcode ignores is shown as `data`. Every line therefore
  assembles back to exactly the words it came from.
*/
pub fn disassemble(image: &[Word]) -> Vec<AssemblyLine> {
  let mut lines   = Vec::new();
  let mut address = 0;

  while address < image.len() {
    let word = image[address];

    let line = match decode(word) {

      Ok(instruction)
        if instruction.encode() == word
          && address + instruction.opcode.width() <= image.len() =>
      {
        let width    = instruction.opcode.width();
        let operands =
          image[address + 1..address + width]
            .iter()
            .enumerate()
            .map(|(k, raw)| instruction.operand(k, *raw).to_string())
            .collect::<Vec<String>>();

        let text = match operands.is_empty() {
          true  => instruction.opcode.to_string(),
          false => format!("{} {}", instruction.opcode, operands.join(", ")),
        };
        AssemblyLine{ address, words: image[address..address + width].to_vec(), text }
      }

      _ => AssemblyLine{ address, words: vec![word], text: format!("data {}", word) },

    };

    address += line.words.len();
    lines.push(line);
  }

  lines
}

/// An argument as written, before it is checked against its statement.
#[derive(Copy, Clone, Debug)]
enum Argument {
  Operand(Operand),
  Literal(Word),
}

fn argument(input: &str) -> IResult<&str, Argument> {
  alt((
    map(preceded(one_char('@'), word), |raw| Argument::Operand(Operand::new(Mode::Position, raw))),
    map(preceded(one_char('#'), word), |raw| Argument::Operand(Operand::new(Mode::Immediate, raw))),
    map(preceded(tag("rb"), word),     |raw| Argument::Operand(Operand::new(Mode::Relative, raw))),
    map(word, Argument::Literal),
  ))(input)
}

fn statement(input: &str) -> IResult<&str, (&str, Vec<Argument>)> {
  pair(
    alpha1,
    preceded(space0, separated_list(delimited(space0, one_char(','), space0), argument))
  )(input)
}

fn line(input: &str) -> IResult<&str, Option<(&str, Vec<Argument>)>> {
  let label   = terminated(digit1, preceded(space0, one_char(':')));
  let comment = preceded(one_char('%'), rest);
  map(
    tuple((space0, opt(label), space0, opt(statement), space0, opt(comment))),
    |(_, _, _, statement, _, _)| statement
  )(input)
}

/// Parses assembly text into a program image.
pub fn assemble(text: &str) -> Result<Vec<Word>, AssemblyError> {
  let mut words = Vec::new();

  for (i, source_line) in text.lines().enumerate() {
    let number = i + 1;
    match all_consuming(line)(source_line) {

      Ok((_, Some((name, arguments)))) => {
        assemble_statement(number, name, &arguments, &mut words)?;
      }

      Ok((_, None))                    => {}

      Err(_)                           => {
        return Err(AssemblyError::Syntax{ line: number, text: source_line.trim().to_string() });
      }

    }
  }

  Ok(words)
}

fn assemble_statement(
  line      : usize,
  name      : &str,
  arguments : &[Argument],
  words     : &mut Vec<Word>
) -> Result<(), AssemblyError>
{
  if name == "data" {
    for argument in arguments {
      match argument {
        Argument::Literal(word) => words.push(*word),
        Argument::Operand(_)    => return Err(AssemblyError::ModeOnData{ line }),
      }
    }
    return Ok(());
  }

  let operation =
    Opcode::from_str(name)
      .map_err(|_| AssemblyError::NotAnOperation{ line, name: name.to_string() })?;

  if arguments.len() != operation.arity() {
    return Err(
      AssemblyError::WrongArity{
        line,
        operation,
        expected : operation.arity(),
        given    : arguments.len()
      }
    );
  }

  let mut operands = Vec::with_capacity(arguments.len());
  for (k, argument) in arguments.iter().enumerate() {
    match argument {

      Argument::Operand(operand)
        if operand.mode == Mode::Immediate && operation.write_operand() == Some(k) =>
      {
        return Err(AssemblyError::ImmediateWrite{ line, operation, operand: k + 1 });
      }

      Argument::Operand(operand) => operands.push(*operand),

      Argument::Literal(_)       => return Err(AssemblyError::MissingMode{ line, operand: k + 1 }),

    }
  }

  let modes: Vec<Mode> = operands.iter().map(|operand| operand.mode).collect();
  words.push(Instruction::new(operation, &modes).encode());
  words.extend(operands.iter().map(|operand| operand.raw));
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;

  const QUINE: [Word; 16] = [109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99];

  #[test]
  fn disassembles_the_quine() {
    let text: Vec<String> = disassemble(&QUINE).iter().map(|l| l.text.clone()).collect();
    assert_eq!(
      text,
      vec![
        "arb #1",
        "out rb-1",
        "add @100, #1, @100",
        "eq @100, #16, @101",
        "jz @101, #0",
        "hlt",
      ]
    );
  }

  #[test]
  fn undecodable_words_become_data() {
    let lines = disassemble(&[42, 11199, 1101, 1]);
    let text: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(text, vec!["data 42", "data 11199", "data 1101", "data 1"]);
  }

  #[test]
  fn assembles_with_labels_and_comments() {
    let source = "
      % read a number and echo it doubled
      in @9
      mul @9, #2, @9   % in place
      4: out @9
      hlt
      data 0
    ";
    assert_eq!(assemble(source).unwrap(), vec![3, 9, 1002, 9, 2, 9, 4, 9, 99, 0]);
  }

  #[test]
  fn disassembly_assembles_back_to_the_image() {
    let image = [
      3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0, 0,
      21202, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 22201, 1000, 1, 20, 4, 20,
      1105, 1, 46, 98, 99, 7, -8
    ];
    let text = disassemble(&image)
      .iter()
      .map(AssemblyLine::to_string)
      .collect::<Vec<String>>()
      .join("\n");
    assert_eq!(assemble(&text).unwrap(), image.to_vec());
  }

  #[test]
  fn reports_errors_by_line() {
    assert_eq!(
      assemble("hlt\nnop"),
      Err(AssemblyError::NotAnOperation{ line: 2, name: "nop".to_string() })
    );
    assert_eq!(
      assemble("add @1, @2"),
      Err(AssemblyError::WrongArity{ line: 1, operation: Opcode::Add, expected: 3, given: 2 })
    );
    assert_eq!(
      assemble("\n\nin #4"),
      Err(AssemblyError::ImmediateWrite{ line: 3, operation: Opcode::Input, operand: 1 })
    );
    assert_eq!(
      assemble("out 4"),
      Err(AssemblyError::MissingMode{ line: 1, operand: 1 })
    );
    assert_eq!(assemble("data @4"), Err(AssemblyError::ModeOnData{ line: 1 }));
    assert!(matches!(assemble("out @4 junk"), Err(AssemblyError::Syntax{ line: 1, .. })));
  }
}
