//! Machine configuration, chosen once at construction and kept across resets.

/// What an `in` instruction does when the input queue is empty.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InputPolicy {
  /// Suspend before consuming anything or moving `pc`. The run loop returns `Status::Blocked` and
  /// the same instruction is retried when the machine is next run.
  Block,
  /// Treat the read as the program's final signal: halt at once and latch the most recent output
  /// value as the machine's result (`Machine::recovered`).
  Latch,
}

impl Default for InputPolicy {
  fn default() -> Self {
    InputPolicy::Block
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Config {
  pub policy         : InputPolicy,
  /// Whether to keep the instruction history. Turning it off keeps long-running programs from
  /// accumulating one entry per executed instruction, at the cost of empty histories in faults.
  pub record_history : bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      policy         : InputPolicy::Block,
      record_history : true,
    }
  }
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn latching() -> Self {
    Config{ policy: InputPolicy::Latch, ..Config::default() }
  }
}
