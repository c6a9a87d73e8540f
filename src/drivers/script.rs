/*!
  Movement routines for the console's line protocol. A routine is a main sequence of calls to at
  most three movement functions named `A`, `B` and `C`. Each function is a sequence of moves: turn
  left, turn right, or go forward some number of steps.

  The program reads the routine as text, one comma-separated line at a time: the main sequence,
  then the bodies of `A`, `B` and `C`, then `y` or `n` for whether it should print a continuous
  video feed. No line may be longer than the line limit, not counting its newline.

  ```text
  A,B,C,B,A,C
  R,8,R,8
  R,4,R,4,R,8
  L,6,L,2
  n
  ```
*/

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use strum_macros::{Display as StrumDisplay, EnumString};
use thiserror::Error;

use crate::bytecode::Word;
use super::console::encode;

/// The longest line the movement program accepts.
pub const DEFAULT_LINE_LIMIT: usize = 20;

#[derive(StrumDisplay, EnumString, Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Function {
  A,
  B,
  C,
}

impl Function {
  pub const ALL: [Function; 3] = [Function::A, Function::B, Function::C];

  fn index(&self) -> usize {
    *self as usize
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Move {
  Left,
  Right,
  Forward(u32),
}

impl Display for Move {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Move::Left       => write!(f, "L"),
      Move::Right      => write!(f, "R"),
      Move::Forward(n) => write!(f, "{}", n),
    }
  }
}

impl FromStr for Move {
  type Err = ScriptError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    match text.trim() {
      "L"   => Ok(Move::Left),
      "R"   => Ok(Move::Right),
      steps =>
        steps
          .parse::<u32>()
          .ok()
          .filter(|n| *n > 0)
          .map(Move::Forward)
          .ok_or_else(|| ScriptError::BadMove(steps.to_string())),
    }
  }
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ScriptError {
  #[error("the main routine is empty")]
  EmptyMain,
  #[error("the main routine calls {0}, which has no moves")]
  UndefinedFunction(Function),
  #[error("the {name} line is {length} characters long, but the limit is {limit}")]
  LineTooLong { name: String, length: usize, limit: usize },
  #[error("{0} functions given, but there are only A, B and C")]
  TooManyFunctions(usize),
  #[error("`{0}` is not a move")]
  BadMove(String),
  #[error("`{0}` is not a function name")]
  BadCall(String),
}

/// Parses a comma-separated list of moves such as `R,8,L,10`.
pub fn parse_moves(text: &str) -> Result<Vec<Move>, ScriptError> {
  match text.trim().is_empty() {
    true  => Ok(Vec::new()),
    false => text.split(',').map(Move::from_str).collect(),
  }
}

fn render<T: Display>(items: &[T]) -> String {
  items
    .iter()
    .map(T::to_string)
    .collect::<Vec<String>>()
    .join(",")
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Routine {
  main       : Vec<Function>,
  functions  : [Vec<Move>; 3],
  video      : bool,
  line_limit : usize,
}

impl Routine {

  pub fn new(main: Vec<Function>) -> Routine {
    Routine {
      main,
      functions  : [Vec::new(), Vec::new(), Vec::new()],
      video      : false,
      line_limit : DEFAULT_LINE_LIMIT,
    }
  }

  pub fn define(mut self, function: Function, moves: Vec<Move>) -> Routine {
    self.functions[function.index()] = moves;
    self
  }

  pub fn with_video(mut self, video: bool) -> Routine {
    self.video = video;
    self
  }

  pub fn with_line_limit(mut self, line_limit: usize) -> Routine {
    self.line_limit = line_limit;
    self
  }

  /// Builds a routine from its textual lines: `main` such as `A,B,A` and up to three function
  /// bodies, in order `A`, `B`, `C`.
  pub fn parse(main: &str, functions: &[&str]) -> Result<Routine, ScriptError> {
    if functions.len() > Function::ALL.len() {
      return Err(ScriptError::TooManyFunctions(functions.len()));
    }

    let calls =
      main
        .split(',')
        .map(|call| {
          Function::from_str(call.trim()).map_err(|_| ScriptError::BadCall(call.trim().to_string()))
        })
        .collect::<Result<Vec<Function>, ScriptError>>()?;

    let mut routine = Routine::new(calls);
    for (function, body) in Function::ALL.iter().zip(functions) {
      routine = routine.define(*function, parse_moves(body)?);
    }
    Ok(routine)
  }

  pub fn main(&self) -> &[Function] {
    &self.main
  }

  pub fn function(&self, function: Function) -> &[Move] {
    &self.functions[function.index()]
  }

  /// The full path the routine walks: the main sequence with every call replaced by its body.
  pub fn expand(&self) -> Vec<Move> {
    self.main
        .iter()
        .flat_map(|function| self.function(*function).iter().copied())
        .collect()
  }

  /// The text lines sent to the program, without newlines. A function the main routine never calls
  /// may be left undefined and is sent as an empty line.
  pub fn lines(&self) -> Result<Vec<String>, ScriptError> {
    if self.main.is_empty() {
      return Err(ScriptError::EmptyMain);
    }
    if let Some(function) = self.main.iter().find(|f| self.function(**f).is_empty()) {
      return Err(ScriptError::UndefinedFunction(*function));
    }

    let mut lines = vec![("main".to_string(), render(&self.main))];
    for function in &Function::ALL {
      lines.push((function.to_string(), render(self.function(*function))));
    }

    for (name, line) in &lines {
      if line.len() > self.line_limit {
        return Err(
          ScriptError::LineTooLong{ name: name.clone(), length: line.len(), limit: self.line_limit }
        );
      }
    }

    let mut lines: Vec<String> = lines.into_iter().map(|(_, line)| line).collect();
    lines.push(if self.video { "y" } else { "n" }.to_string());
    Ok(lines)
  }

  /// The routine as input words for the movement program.
  pub fn compile(&self) -> Result<Vec<Word>, ScriptError> {
    Ok(self.lines()?.iter().flat_map(|line| encode(line)).collect())
  }

}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compiles_the_line_protocol() {
    let routine =
      Routine::new(vec![Function::A, Function::B, Function::A])
        .define(Function::A, vec![Move::Left, Move::Forward(4)])
        .define(Function::B, vec![Move::Right, Move::Forward(12)]);

    assert_eq!(
      routine.lines().unwrap(),
      vec!["A,B,A", "L,4", "R,12", "", "n"]
    );

    let words = routine.with_video(true).compile().unwrap();
    let text: String = words.iter().map(|w| *w as u8 as char).collect();
    assert_eq!(text, "A,B,A\nL,4\nR,12\n\ny\n");
  }

  #[test]
  fn parses_textual_routines() {
    let routine = Routine::parse("A,B,C,B,A,C", &["R,8,R,8", "R,4,R,4,R,8", "L,6,L,2"]).unwrap();
    assert_eq!(routine.function(Function::C), &[Move::Left, Move::Forward(6), Move::Left, Move::Forward(2)]);
    assert_eq!(routine.expand().len(), 28);

    assert_eq!(
      Routine::parse("A", &["L", "R", "L", "R"]),
      Err(ScriptError::TooManyFunctions(4))
    );
    assert_eq!(Routine::parse("A,D", &["L"]), Err(ScriptError::BadCall("D".to_string())));
    assert_eq!(parse_moves("L,x"), Err(ScriptError::BadMove("x".to_string())));
    assert_eq!(parse_moves("L,0"), Err(ScriptError::BadMove("0".to_string())));
  }

  #[test]
  fn rejects_bad_routines() {
    assert_eq!(Routine::new(vec![]).lines(), Err(ScriptError::EmptyMain));
    assert_eq!(
      Routine::new(vec![Function::B]).define(Function::A, vec![Move::Left]).lines(),
      Err(ScriptError::UndefinedFunction(Function::B))
    );

    let long = vec![Move::Forward(10); 7]; // "10,10,10,10,10,10,10" is 20 characters
    let ok   = Routine::new(vec![Function::A]).define(Function::A, long);
    assert!(ok.lines().is_ok());

    let too_long = ok.define(Function::A, vec![Move::Forward(100); 7]);
    assert_eq!(
      too_long.lines(),
      Err(ScriptError::LineTooLong{ name: "A".to_string(), length: 27, limit: 20 })
    );
  }
}
