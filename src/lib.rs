/*!
  An Intcode machine: a stored-program interpreter over a flat array of signed integers that
  double as code and data. The machine has three addressing modes, memory that grows on demand,
  and an input instruction that suspends the machine instead of failing when there is nothing to
  read, so that a driver can feed it more input and resume it, or wire several machines together.

  ```
  use intcode::{Machine, Status};

  let mut machine = Machine::new(vec![3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], vec![]);
  assert_eq!(machine.run().unwrap(), Status::Blocked);
  assert_eq!(machine.run_with(vec![8]).unwrap(), Status::Halted);
  assert_eq!(machine.drain_output(), vec![1]);
  ```
*/

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

pub mod address;
pub mod bytecode;
pub mod config;
pub mod drivers;
pub mod error;
pub mod machine;
pub mod memory;
pub mod network;
pub mod parser;
pub mod port;
pub mod trace;

pub use address::{Mode, Operand};
pub use bytecode::{Instruction, Opcode, Word};
pub use config::{Config, InputPolicy};
pub use error::{AddressError, DecodeError, DecodeErrorKind, Fault, ParseError};
pub use machine::{Machine, Status};
pub use memory::Memory;
pub use network::{Network, NetworkError, NetworkStatus};
pub use parser::parse_program;
pub use port::Port;
pub use trace::{History, TraceEntry};
