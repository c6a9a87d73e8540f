//! The character console. Programs that talk in text read one character code per `in` and write
//! one per `out`. Anything a program outputs outside the 7 bit range is not a character but an
//! out-of-band signal, typically a final numeric answer.

use std::fmt::{Display, Formatter};

use log::debug;

use crate::bytecode::Word;
use crate::error::Fault;
use crate::machine::{Machine, Status};

/// Highest value decoded as a character.
const MAX_CHARACTER: Word = 127;

/// Encodes `command` as character codes followed by a newline.
pub fn encode(command: &str) -> Vec<Word> {
  command
    .chars()
    .chain(std::iter::once('\n'))
    .map(|c| c as Word)
    .collect()
}

/// What a program said between two reads.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Transcript {
  pub status  : Status,
  pub text    : String,
  /// Output values that are not characters, in the order they were output.
  pub signals : Vec<Word>,
}

impl Transcript {
  pub fn decode(status: Status, output: &[Word]) -> Transcript {
    let mut text    = String::new();
    let mut signals = Vec::new();

    for value in output {
      match *value {
        v if (0..=MAX_CHARACTER).contains(&v) => text.push(v as u8 as char),
        v                                     => signals.push(v),
      }
    }

    Transcript{ status, text, signals }
  }

  /// The last out-of-band value, if any.
  pub fn signal(&self) -> Option<Word> {
    self.signals.last().copied()
  }

  /// The text without trailing blank lines.
  pub fn lines(&self) -> Vec<&str> {
    self.text.trim_end().lines().collect()
  }
}

impl Display for Transcript {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.text)?;
    for signal in &self.signals {
      writeln!(f, "[{}]", signal)?;
    }
    Ok(())
  }
}

/// A machine driven one command at a time.
pub struct Console {
  machine: Machine,
}

impl Console {

  pub fn new(machine: Machine) -> Console {
    Console{ machine }
  }

  /// Runs the machine without sending anything, typically to collect its opening prompt.
  pub fn read(&mut self) -> Result<Transcript, Fault> {
    let status = self.machine.run()?;
    Ok(Transcript::decode(status, &self.machine.drain_output()))
  }

  /// Sends one command line and collects everything the program says before it next blocks or
  /// halts.
  pub fn send(&mut self, command: &str) -> Result<Transcript, Fault> {
    debug!("console <- {:?}", command);
    let status = self.machine.run_with(encode(command))?;
    Ok(Transcript::decode(status, &self.machine.drain_output()))
  }

  /// Sends `command` to `machine` once, without keeping a console around.
  pub fn execute(machine: &mut Machine, command: &str) -> Result<Transcript, Fault> {
    let status = machine.run_with(encode(command))?;
    Ok(Transcript::decode(status, &machine.drain_output()))
  }

  /// Sends each command in turn and returns the final transcript. The script must leave the
  /// program halted: blocking afterwards means the program wanted more than it was given.
  pub fn run_script<'a, I>(&mut self, commands: I) -> Result<Transcript, Fault>
    where I: IntoIterator<Item = &'a str>
  {
    let mut input = Vec::new();
    for command in commands {
      input.extend(encode(command));
    }
    let output = self.machine.run_to_completion(input)?;
    Ok(Transcript::decode(Status::Halted, &output))
  }

  pub fn machine(&self) -> &Machine {
    &self.machine
  }

  pub fn machine_mut(&mut self) -> &mut Machine {
    &mut self.machine
  }

  pub fn into_inner(self) -> Machine {
    self.machine
  }

}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::assemble;

  /// Echoes each line back in upper case until it reads a line starting with `.`, then outputs
  /// 1000 and halts.
  fn shouter() -> Vec<Word> {
    assemble("
       0: in @100
       2: eq @100, #46, @101       % '.'
       6: jnz @101, #25
       9: lt @100, #97, @101       % 'a'
      13: jnz @101, #20
      16: add @100, #-32, @100
      20: out @100
      22: jz #0, #0
      25: out #1000
      27: hlt
    ").unwrap()
  }

  #[test]
  fn encodes_with_a_trailing_newline() {
    assert_eq!(encode("NOT A J"), vec![78, 79, 84, 32, 65, 32, 74, 10]);
    assert_eq!(encode(""), vec![10]);
  }

  #[test]
  fn separates_text_from_signals() {
    let transcript = Transcript::decode(Status::Halted, &[72, 105, 10, 19358688, -1]);
    assert_eq!(transcript.text, "Hi\n");
    assert_eq!(transcript.signals, vec![19358688, -1]);
    assert_eq!(transcript.signal(), Some(-1));
    assert_eq!(transcript.lines(), vec!["Hi"]);
  }

  #[test]
  fn conversation() {
    let mut console = Console::new(Machine::new(shouter(), vec![]));

    let prompt = console.read().unwrap();
    assert_eq!(prompt.status, Status::Blocked);
    assert!(prompt.text.is_empty());

    let reply = console.send("hey").unwrap();
    assert_eq!(reply.status, Status::Blocked);
    assert_eq!(reply.text, "HEY\n");

    let last = Console::execute(console.machine_mut(), ".").unwrap();
    assert_eq!(last.status, Status::Halted);
    assert_eq!(last.signals, vec![1000]);
  }

  #[test]
  fn scripts_must_finish_the_program() {
    let mut console = Console::new(Machine::new(shouter(), vec![]));
    let transcript  = console.run_script(vec!["ab", "."]).unwrap();
    assert_eq!(transcript.text, "AB\n");
    assert_eq!(transcript.signal(), Some(1000));

    let mut console = Console::new(Machine::new(shouter(), vec![]));
    assert!(matches!(
      console.run_script(vec!["ab"]),
      Err(Fault::InputExhausted{ .. })
    ));
  }
}
