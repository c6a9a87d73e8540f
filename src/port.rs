/*!
  I/O ports. A `Port` is a handle to a FIFO queue of words. Cloning a handle does not copy the
  queue: both handles see the same queue. This is how machines are composed. Wiring one
  machine's output port in as another machine's input port makes the first the producer and the
  second the consumer of a single queue.

  Machines are single threaded and cooperative, and each queue has exactly one producer and one
  consumer, so the queue needs no locking; `Rc<RefCell<_>>` is enough.

  Each queue counts the words that have ever been pushed into it and popped out of it. A
  scheduler compares these counts before and after a round of runs to tell whether any machine
  made observable progress.
*/

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bytecode::Word;

#[derive(Debug, Default)]
struct Queue {
  words    : VecDeque<Word>,
  pushed   : u64,
  popped   : u64,
}

#[derive(Clone, Debug, Default)]
pub struct Port {
  queue: Rc<RefCell<Queue>>
}

impl Port {

  pub fn new() -> Port {
    Port::default()
  }

  pub fn with_contents<I>(words: I) -> Port
    where I: IntoIterator<Item = Word>
  {
    let port = Port::new();
    port.extend(words);
    port
  }

  pub fn push(&self, word: Word) {
    let mut queue = self.queue.borrow_mut();
    queue.words.push_back(word);
    queue.pushed += 1;
  }

  pub fn extend<I>(&self, words: I)
    where I: IntoIterator<Item = Word>
  {
    for word in words {
      self.push(word);
    }
  }

  /// Puts `words` at the front of the queue, ahead of anything already waiting, keeping their
  /// order.
  pub fn prepend<I>(&self, words: I)
    where I: IntoIterator<Item = Word>, I::IntoIter: DoubleEndedIterator
  {
    let mut queue = self.queue.borrow_mut();
    for word in words.into_iter().rev() {
      queue.words.push_front(word);
      queue.pushed += 1;
    }
  }

  pub fn pop(&self) -> Option<Word> {
    let mut queue = self.queue.borrow_mut();
    let word      = queue.words.pop_front();
    if word.is_some() {
      queue.popped += 1;
    }
    word
  }

  /// Removes and returns everything waiting in the queue.
  pub fn drain(&self) -> Vec<Word> {
    let mut queue = self.queue.borrow_mut();
    let words: Vec<Word> = queue.words.drain(..).collect();
    queue.popped += words.len() as u64;
    words
  }

  /// Copies the waiting words without consuming them.
  pub fn snapshot(&self) -> Vec<Word> {
    self.queue.borrow().words.iter().copied().collect()
  }

  pub fn front(&self) -> Option<Word> {
    self.queue.borrow().words.front().copied()
  }

  pub fn len(&self) -> usize {
    self.queue.borrow().words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.borrow().words.is_empty()
  }

  /// Empties the queue. Unlike `drain`, the words are discarded and not counted as consumed.
  pub fn clear(&self) {
    self.queue.borrow_mut().words.clear();
  }

  /// Total number of words ever pushed into the queue.
  pub fn pushed(&self) -> u64 {
    self.queue.borrow().pushed
  }

  /// Total number of words ever taken out of the queue.
  pub fn popped(&self) -> u64 {
    self.queue.borrow().popped
  }

  /// True if both handles refer to the same queue.
  pub fn is_shared_with(&self, other: &Port) -> bool {
    Rc::ptr_eq(&self.queue, &other.queue)
  }

}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fifo_order() {
    let port = Port::with_contents(vec![1, 2]);
    port.push(3);
    assert_eq!(port.pop(), Some(1));
    assert_eq!(port.drain(), vec![2, 3]);
    assert_eq!(port.pop(), None);
    assert_eq!(port.pushed(), 3);
    assert_eq!(port.popped(), 3);
  }

  #[test]
  fn clones_share_one_queue() {
    let producer = Port::new();
    let consumer = producer.clone();
    producer.push(7);
    assert!(producer.is_shared_with(&consumer));
    assert_eq!(consumer.pop(), Some(7));
    assert!(producer.is_empty());
    assert!(!producer.is_shared_with(&Port::new()));
  }

  #[test]
  fn prepend_goes_ahead_of_waiting_words() {
    let port = Port::with_contents(vec![3, 4]);
    port.prepend(vec![1, 2]);
    assert_eq!(port.snapshot(), vec![1, 2, 3, 4]);
    assert_eq!(port.front(), Some(1));
  }
}
