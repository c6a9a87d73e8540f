//! Structures and functions for the Intcode machine: the dispatcher, the run loop and its
//! suspension protocol.

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use log::{debug, trace, warn};
use prettytable::Table;
use strum_macros::Display as StrumDisplay;

use crate::address::Operand;
use crate::bytecode::{decode, Instruction, Opcode, Word};
use crate::config::{Config, InputPolicy};
use crate::error::{DecodeError, Fault, ParseError};
use crate::memory::Memory;
use crate::parser::parse_program;
use crate::port::Port;
use crate::trace::{History, TABLE_DISPLAY_FORMAT};

/// Number of memory cells on either side of `pc` shown in the state table.
const MEMORY_WINDOW: usize = 8;

/**
  Why the run loop returned. A fault is the third way out of the loop, and it is returned as
  `Err(Fault)` rather than as a status, because a faulted machine cannot be resumed.
*/
#[derive(StrumDisplay, Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Status {
  /// The program executed `hlt`, or latched its result under `InputPolicy::Latch`.
  Halted,
  /// The program is waiting on an `in` instruction with an empty input queue.
  Blocked,
}

/// The outcome of executing a single instruction.
enum Step {
  Continue,
  Halt,
  Starved,
}

pub struct Machine {
  config        : Config,

  // Memory Stores
  image         : Rc<Vec<Word>>, // The pristine program, for `reset`
  memory        : Memory,        // Code and data

  // Registers //
  pc            : Word,
  relative_base : Word,

  // I/O Ports
  input         : Port,
  output        : Port,

  // Diagnostics
  history       : History,
  steps         : u64,
  output_count  : u64,
  last_output   : Option<Word>,

  // Terminal states. `recovered` is only ever set under `InputPolicy::Latch`.
  halted        : bool,
  fault         : Option<Fault>,
  recovered     : Option<Word>,
}

impl Machine {

  // region Construction

  pub fn new(program: Vec<Word>, input: Vec<Word>) -> Machine {
    Machine::with_config(program, input, Config::default())
  }

  pub fn with_config(program: Vec<Word>, input: Vec<Word>, config: Config) -> Machine {
    let memory = Memory::new(&program);
    Machine {
      config,
      image         : Rc::new(program),
      memory,
      pc            : 0,
      relative_base : 0,
      input         : Port::with_contents(input),
      output        : Port::new(),
      history       : History::new(),
      steps         : 0,
      output_count  : 0,
      last_output   : None,
      halted        : false,
      fault         : None,
      recovered     : None,
    }
  }

  /// Parses comma-separated program source and builds a machine from it.
  pub fn from_source(source: &str, input: Vec<Word>) -> Result<Machine, ParseError> {
    Ok(Machine::new(parse_program(source)?, input))
  }

  /**
    Restores memory to the program image, zeroes `pc` and the relative base, empties both queues
    and the history, and forgets any halt or fault. The configuration is kept.

    Ports are emptied in place, so a peer machine wired to one of them sees it empty too.
  */
  pub fn reset(&mut self) {
    debug!("reset: reloading {} words", self.image.len());
    self.memory.load(&self.image);
    self.pc            = 0;
    self.relative_base = 0;
    self.input.clear();
    self.output.clear();
    self.history.clear();
    self.steps         = 0;
    self.output_count  = 0;
    self.last_output   = None;
    self.halted        = false;
    self.fault         = None;
    self.recovered     = None;
  }

  // endregion

  // region Run loop

  /**
    Steps the machine until it halts, blocks on input, or faults.

    Calling `run` on a halted machine does nothing and returns `Status::Halted` again. Calling it
    on a faulted machine returns the original fault again.
  */
  pub fn run(&mut self) -> Result<Status, Fault> {
    loop {
      if let Some(status) = self.step()? {
        debug!("{} at pc {} after {} steps", status, self.pc, self.steps);
        return Ok(status);
      }
    }
  }

  /// Appends `input` to the input queue, then runs. Input given to a halted or faulted machine
  /// is dropped.
  pub fn run_with<I>(&mut self, input: I) -> Result<Status, Fault>
    where I: IntoIterator<Item = Word>
  {
    if !self.is_terminated() {
      self.input.extend(input);
    }
    self.run()
  }

  /**
    Runs a machine whose input is a finite script. All of `input` is delivered up front; if the
    program then blocks, the script was too short, which is reported as `Fault::InputExhausted`
    so that it cannot be mistaken for a stuck program. On success, returns the drained output.

    Exhaustion does not kill the machine. More input can still be supplied and the machine run
    again.
  */
  pub fn run_to_completion<I>(&mut self, input: I) -> Result<Vec<Word>, Fault>
    where I: IntoIterator<Item = Word>
  {
    match self.run_with(input)? {

      Status::Halted  => Ok(self.drain_output()),

      Status::Blocked => {
        warn!("scripted input exhausted at pc {}", self.pc);
        Err(Fault::InputExhausted{ pc: self.pc })
      }

    }
  }

  /// Runs `program` to completion on `input` and returns everything it output.
  pub fn evaluate(program: Vec<Word>, input: Vec<Word>) -> Result<Vec<Word>, Fault> {
    Machine::new(program, vec![]).run_to_completion(input)
  }

  /**
    Runs `program` under `InputPolicy::Latch`: `input` is consumed normally, and the first read
    past its end halts the program and yields the most recent output value. Returns `None` if the
    program halts without reading past its input, or reads before producing any output.
  */
  pub fn recover(program: Vec<Word>, input: Vec<Word>) -> Result<Option<Word>, Fault> {
    let mut machine = Machine::with_config(program, input, Config::latching());
    machine.run()?;
    Ok(machine.recovered())
  }

  /**
    Executes exactly one instruction. Returns `Ok(None)` if the machine can keep going, or the
    status the run loop would return. The terminal-state rules of `run` apply.
  */
  pub fn step(&mut self) -> Result<Option<Status>, Fault> {
    if let Some(fault) = &self.fault {
      return Err(fault.clone());
    }
    if self.halted {
      return Ok(Some(Status::Halted));
    }

    let result = self.execute();

    #[cfg(feature = "trace_computation")] println!("{}", self);

    match result {
      Ok(Step::Continue) => Ok(None),
      Ok(Step::Halt)     => Ok(Some(Status::Halted)),
      Ok(Step::Starved)  => Ok(Some(Status::Blocked)),
      Err(fault)         => {
        warn!("machine faulted: {}", fault);
        self.fault = Some(fault.clone());
        Err(fault)
      }
    }
  }

  // endregion

  // region Dispatcher

  /// Decodes the instruction at `pc` and executes it.
  fn execute(&mut self) -> Result<Step, Fault> {
    let pc   = self.pc;
    let word = self.memory.read(pc).map_err(|source| Fault::Address{ pc, source })?;

    let instruction = match decode(word) {
      Ok(instruction) => instruction,
      Err(kind)       => {
        self.record(pc, word);
        return Err(
          DecodeError{ pc, word, kind, history: self.history.clone() }.into()
        );
      }
    };

    // A starved read is not executed and leaves no trace; it will be retried verbatim.
    if instruction.opcode == Opcode::Input
        && self.input.is_empty()
        && self.config.policy == InputPolicy::Block {
      trace!("{:>6}: {} starved", pc, instruction.opcode);
      return Ok(Step::Starved);
    }

    self.record(pc, word);
    trace!("{:>6}: {:<5} {:?}", pc, word, instruction.opcode);

    match instruction.opcode {

      Opcode::Add => {
        let a = self.load(&instruction, 0)?;
        let b = self.load(&instruction, 1)?;
        let c = a.checked_add(b).ok_or(Fault::Overflow{ pc, opcode: Opcode::Add })?;
        self.store(&instruction, 2, c)?;
        self.advance(&instruction);
      }

      Opcode::Multiply => {
        let a = self.load(&instruction, 0)?;
        let b = self.load(&instruction, 1)?;
        let c = a.checked_mul(b).ok_or(Fault::Overflow{ pc, opcode: Opcode::Multiply })?;
        self.store(&instruction, 2, c)?;
        self.advance(&instruction);
      }

      Opcode::Input => {
        let address = self.address(&instruction, 0)?;
        match self.input.pop() {

          Some(value) => {
            self.memory.write(address, value).map_err(|source| Fault::Address{ pc, source })?;
            self.advance(&instruction);
          }

          None        => {
            // Only reachable under `InputPolicy::Latch`: the read is the signal to stop.
            debug!("signal read at pc {}, latching {:?}", pc, self.last_output);
            self.recovered = self.last_output;
            self.halted    = true;
            return Ok(Step::Halt);
          }

        }
      }

      Opcode::Output => {
        let a = self.load(&instruction, 0)?;
        self.output.push(a);
        self.output_count += 1;
        self.last_output   = Some(a);
        self.advance(&instruction);
      }

      Opcode::JumpIfTrue => {
        match self.load(&instruction, 0)? != 0 {
          true  => self.pc = self.load(&instruction, 1)?,
          false => self.advance(&instruction),
        }
      }

      Opcode::JumpIfFalse => {
        match self.load(&instruction, 0)? == 0 {
          true  => self.pc = self.load(&instruction, 1)?,
          false => self.advance(&instruction),
        }
      }

      Opcode::LessThan => {
        let a = self.load(&instruction, 0)?;
        let b = self.load(&instruction, 1)?;
        self.store(&instruction, 2, (a < b) as Word)?;
        self.advance(&instruction);
      }

      Opcode::Equals => {
        let a = self.load(&instruction, 0)?;
        let b = self.load(&instruction, 1)?;
        self.store(&instruction, 2, (a == b) as Word)?;
        self.advance(&instruction);
      }

      Opcode::AdjustBase => {
        let a = self.load(&instruction, 0)?;
        self.relative_base =
          self.relative_base
              .checked_add(a)
              .ok_or(Fault::Overflow{ pc, opcode: Opcode::AdjustBase })?;
        self.advance(&instruction);
      }

      Opcode::Halt => {
        self.halted = true;
        return Ok(Step::Halt);
      }

    } // end match on opcode

    Ok(Step::Continue)
  }

  fn record(&mut self, pc: Word, word: Word) {
    self.steps += 1;
    if self.config.record_history {
      self.history.record(pc, word);
    }
  }

  fn advance(&mut self, instruction: &Instruction) {
    self.pc += instruction.opcode.width() as Word;
  }

  /// Operand `k` (counting from 0) of the instruction at `pc`.
  fn operand(&mut self, instruction: &Instruction, k: usize) -> Result<Operand, Fault> {
    let pc  = self.pc;
    let raw = self.memory.read(pc + 1 + k as Word).map_err(|source| Fault::Address{ pc, source })?;
    Ok(instruction.operand(k, raw))
  }

  /// The effective value of operand `k`.
  fn load(&mut self, instruction: &Instruction, k: usize) -> Result<Word, Fault> {
    let pc      = self.pc;
    let operand = self.operand(instruction, k)?;
    operand
      .value(&mut self.memory, self.relative_base)
      .map_err(|source| Fault::Address{ pc, source })
  }

  /// The effective address named by operand `k`.
  fn address(&mut self, instruction: &Instruction, k: usize) -> Result<Word, Fault> {
    let pc      = self.pc;
    let operand = self.operand(instruction, k)?;
    operand
      .address(self.relative_base)
      .map_err(|source| Fault::Address{ pc, source })
  }

  /// Writes `value` to the address named by operand `k`.
  fn store(&mut self, instruction: &Instruction, k: usize, value: Word) -> Result<(), Fault> {
    let pc      = self.pc;
    let address = self.address(instruction, k)?;
    self.memory
        .write(address, value)
        .map_err(|source| Fault::Address{ pc, source })
  }

  // endregion

  // region I/O

  pub fn push_input(&mut self, value: Word) {
    self.input.push(value);
  }

  pub fn extend_input<I>(&mut self, values: I)
    where I: IntoIterator<Item = Word>
  {
    self.input.extend(values);
  }

  /// Number of input values waiting to be read.
  pub fn pending_input(&self) -> usize {
    self.input.len()
  }

  /// Removes and returns everything in the output queue.
  pub fn drain_output(&mut self) -> Vec<Word> {
    self.output.drain()
  }

  /// Takes the oldest unread output value.
  pub fn pop_output(&mut self) -> Option<Word> {
    self.output.pop()
  }

  pub fn input_port(&self) -> &Port {
    &self.input
  }

  pub fn output_port(&self) -> &Port {
    &self.output
  }

  /**
    Replaces the input queue with `port`, typically another machine's output port. Input that
    was waiting in the old queue is moved to the front of the new one, so values seeded at
    construction are still read first.
  */
  pub fn attach_input(&mut self, port: Port) {
    if port.is_shared_with(&self.input) {
      return;
    }
    port.prepend(self.input.drain());
    self.input = port;
  }

  // endregion

  // region Inspection

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn image(&self) -> &[Word] {
    &self.image
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  /// Direct access to memory, for drivers that patch a program before running it.
  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  pub fn pc(&self) -> Word {
    self.pc
  }

  pub fn relative_base(&self) -> Word {
    self.relative_base
  }

  pub fn history(&self) -> &History {
    &self.history
  }

  /// Number of instructions executed since the last reset, counted even when history is off.
  pub fn steps(&self) -> u64 {
    self.steps
  }

  /// Number of values the program has output since the last reset.
  pub fn output_count(&self) -> u64 {
    self.output_count
  }

  pub fn last_output(&self) -> Option<Word> {
    self.last_output
  }

  /// The value latched by a signal read under `InputPolicy::Latch`.
  pub fn recovered(&self) -> Option<Word> {
    self.recovered
  }

  pub fn is_halted(&self) -> bool {
    self.halted
  }

  pub fn fault(&self) -> Option<&Fault> {
    self.fault.as_ref()
  }

  /// True once the machine has halted or faulted. Only `reset` brings it back.
  pub fn is_terminated(&self) -> bool {
    self.halted || self.fault.is_some()
  }

  // endregion

  // region Display methods

  fn make_register_table<T> (
      name      : &str,
      registers : &[T],
      highlight : Option<usize>,
      start     : usize
    ) -> Table
    where T: Display
  {

    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Address", ubl->"Contents"]);

    for (i, cell) in registers.iter().enumerate() {
      match Some(i) == highlight {

        true  => {
          table.add_row(
            row![r->format!("* --> {}[{}] =", name, i + start), format!("{}", cell)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("{}[{}] =", name, i + start), format!("{}", cell)]
          );
        }

      } // end match on highlight
    } // end for
    table
  }

  fn make_state_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Value"]);

    let status = match (&self.fault, self.halted) {
      (Some(_), _)  => "Faulted",
      (None, true)  => "Halted",
      (None, false) => "Ready",
    };
    let show = |words: Vec<Word>| {
      words.iter().map(Word::to_string).collect::<Vec<String>>().join(", ")
    };

    table.add_row(row![r->"PC", self.pc]);
    table.add_row(row![r->"RB", self.relative_base]);
    table.add_row(row![r->"Steps", self.steps]);
    table.add_row(row![r->"Status", status]);
    table.add_row(row![r->"Input", show(self.input.snapshot())]);
    table.add_row(row![r->"Output", show(self.output.snapshot())]);
    table
  }

  // endregion

}

impl Display for Machine {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let pc    = if self.pc < 0 { 0 } else { self.pc as usize };
    let start = pc.saturating_sub(MEMORY_WINDOW).min(self.memory.len());
    let end   = (pc + MEMORY_WINDOW + 1).min(self.memory.len());

    let state_table  = self.make_state_table();
    let memory_table = Machine::make_register_table(
      "M",
      &self.memory.as_slice()[start..end],
      pc.checked_sub(start),
      start
    );

    let mut combined_table = table!([state_table, memory_table]);

    combined_table.set_titles(row![ub->"Machine", ub->"Memory"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    write!(f, "{}", combined_table)
  }
}
