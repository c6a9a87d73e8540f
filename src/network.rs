/*!
  A round-robin scheduler for machines wired together through shared ports.

  A `Network` owns its machines and runs them one at a time, each until it halts or blocks, in
  index order. That is one round. Machines never run concurrently, and each queue has a single
  producer and a single consumer, so FIFO order is the only discipline the queues need.

  A round in which no queue saw any traffic, neither a word pushed nor a word taken, cannot
  have changed what any blocked machine is waiting for. If every machine that has not halted
  is blocked at the end of such a round, no later round can make progress either, and the
  network reports a deadlock instead of polling forever.
*/

use log::{debug, warn};
use thiserror::Error;

use crate::bytecode::Word;
use crate::error::Fault;
use crate::machine::{Machine, Status};

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum NetworkStatus {
  /// Every machine halted.
  Halted,
  /// No machine can make progress. Holds the indices of the blocked machines.
  Deadlocked { blocked: Vec<usize> },
}

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum NetworkError {
  #[error("machine {index} faulted: {fault}")]
  Fault { index: usize, fault: Fault },
  #[error("no machine with index {0}")]
  NoSuchMachine(usize),
}

#[derive(Default)]
pub struct Network {
  machines : Vec<Machine>,
  rounds   : u64,
}

impl Network {

  pub fn new() -> Network {
    Network::default()
  }

  /// Adds `machine` to the network and returns its index.
  pub fn add(&mut self, machine: Machine) -> usize {
    self.machines.push(machine);
    self.machines.len() - 1
  }

  /**
    Wires the output of machine `from` into the input of machine `to`. Afterwards they share one
    queue. Input that was already waiting for `to` stays ahead of anything `from` produces.
  */
  pub fn connect(&mut self, from: usize, to: usize) -> Result<(), NetworkError> {
    self.check(from)?;
    self.check(to)?;
    let port = self.machines[from].output_port().clone();
    self.machines[to].attach_input(port);
    Ok(())
  }

  /// Builds a two-party pipe: each machine's output is the other's input.
  pub fn pipe(a: Machine, b: Machine) -> Network {
    let mut network = Network::new();
    let a           = network.add(a);
    let b           = network.add(b);
    let (from_a, from_b) = (
      network.machines[a].output_port().clone(),
      network.machines[b].output_port().clone()
    );
    network.machines[b].attach_input(from_a);
    network.machines[a].attach_input(from_b);
    network
  }

  /// Delivers external input to machine `index`.
  pub fn feed<I>(&mut self, index: usize, values: I) -> Result<(), NetworkError>
    where I: IntoIterator<Item = Word>
  {
    self.check(index)?;
    self.machines[index].extend_input(values);
    Ok(())
  }

  pub fn machine(&self, index: usize) -> Option<&Machine> {
    self.machines.get(index)
  }

  pub fn machine_mut(&mut self, index: usize) -> Option<&mut Machine> {
    self.machines.get_mut(index)
  }

  pub fn len(&self) -> usize {
    self.machines.len()
  }

  pub fn is_empty(&self) -> bool {
    self.machines.is_empty()
  }

  /// Number of rounds run so far.
  pub fn rounds(&self) -> u64 {
    self.rounds
  }

  /**
    Runs rounds until every machine has halted or the network deadlocks. A fault in any machine
    stops the network at once.

    Like a single machine, a network whose machines loop forever without halting or reading an
    empty queue never returns.
  */
  pub fn run(&mut self) -> Result<NetworkStatus, NetworkError> {
    loop {
      if let Some(status) = self.round()? {
        return Ok(status);
      }
    }
  }

  /// Runs every machine once, in index order. Returns a status if the network can go no further.
  pub fn round(&mut self) -> Result<Option<NetworkStatus>, NetworkError> {
    let traffic_before = self.traffic();
    let mut blocked    = Vec::new();

    for (index, machine) in self.machines.iter_mut().enumerate() {
      match machine.run() {
        Ok(Status::Halted)  => {}
        Ok(Status::Blocked) => blocked.push(index),
        Err(fault)          => return Err(NetworkError::Fault{ index, fault }),
      }
    }
    self.rounds += 1;

    let traffic_after = self.traffic();
    debug!(
      "round {}: {} blocked, traffic {} -> {}",
      self.rounds, blocked.len(), traffic_before, traffic_after
    );

    if blocked.is_empty() {
      return Ok(Some(NetworkStatus::Halted));
    }
    if traffic_after == traffic_before {
      warn!("deadlock after {} rounds: machines {:?} are blocked", self.rounds, blocked);
      return Ok(Some(NetworkStatus::Deadlocked{ blocked }));
    }
    Ok(None)
  }

  /// Total pushes and pops over every port. Shared ports are counted more than once, which does
  /// not matter because only changes in the total are compared.
  fn traffic(&self) -> u64 {
    self.machines
        .iter()
        .map(|machine| {
          let (input, output) = (machine.input_port(), machine.output_port());
          input.pushed() + input.popped() + output.pushed() + output.popped()
        })
        .sum()
  }

  fn check(&self, index: usize) -> Result<(), NetworkError> {
    match index < self.machines.len() {
      true  => Ok(()),
      false => Err(NetworkError::NoSuchMachine(index)),
    }
  }

}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::assemble;

  /// Reads a number, adds one, passes it on; stops after passing on 10 or more.
  fn incrementer() -> Vec<Word> {
    assemble("
      in @20
      add @20, #1, @20
      out @20
      lt @20, #10, @21
      jnz @21, #0
      hlt
    ").unwrap()
  }

  #[test]
  fn two_machines_count_to_ten() {
    let mut network = Network::pipe(
      Machine::new(incrementer(), vec![0]),
      Machine::new(incrementer(), vec![])
    );
    assert_eq!(network.run().unwrap(), NetworkStatus::Halted);
    // The second machine halts after passing on 10; the first reads it and passes on 11.
    assert_eq!(network.machine(0).unwrap().last_output(), Some(11));
    assert_eq!(network.machine(1).unwrap().last_output(), Some(10));
    assert_eq!(network.machine(0).unwrap().output_count(), 6);
  }

  #[test]
  fn a_chain_forwards_in_order() {
    // in @9; out @9; jz #0, #0
    let echo        = vec![3, 9, 4, 9, 1106, 0, 0, 99, 0, 0];
    let mut network = Network::new();
    let first       = network.add(Machine::new(echo.clone(), vec![]));
    let second      = network.add(Machine::new(echo, vec![]));
    network.connect(first, second).unwrap();
    network.feed(first, vec![1, 2, 3]).unwrap();

    assert_eq!(
      network.run().unwrap(),
      NetworkStatus::Deadlocked{ blocked: vec![first, second] }
    );
    assert_eq!(network.machine_mut(second).unwrap().drain_output(), vec![1, 2, 3]);
  }

  #[test]
  fn feeding_a_deadlocked_network_revives_it() {
    let echo        = vec![3, 9, 4, 9, 1106, 0, 0, 99, 0, 0];
    let mut network = Network::new();
    network.add(Machine::new(echo, vec![]));

    assert_eq!(network.run().unwrap(), NetworkStatus::Deadlocked{ blocked: vec![0] });
    network.feed(0, vec![5]).unwrap();
    assert_eq!(network.round().unwrap(), None);
    assert_eq!(network.machine_mut(0).unwrap().drain_output(), vec![5]);
    assert_eq!(network.round().unwrap(), Some(NetworkStatus::Deadlocked{ blocked: vec![0] }));
  }

  #[test]
  fn faults_name_the_machine() {
    let mut network = Network::new();
    network.add(Machine::new(vec![104, 1, 99], vec![]));
    network.add(Machine::new(vec![42], vec![]));
    assert!(matches!(network.run(), Err(NetworkError::Fault{ index: 1, .. })));
  }

  #[test]
  fn bad_indices_are_rejected() {
    let mut network = Network::new();
    network.add(Machine::new(vec![99], vec![]));
    assert_eq!(network.connect(0, 3), Err(NetworkError::NoSuchMachine(3)));
    assert_eq!(network.feed(1, vec![1]), Err(NetworkError::NoSuchMachine(1)));
  }
}
