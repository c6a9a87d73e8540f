//! The machine's single memory store. Addresses are non-negative words. The store grows on
//! demand: touching a cell past the end, whether by reading or by
//! writing, zero-extends the store so that the cell exists. The store never shrinks.

use std::convert::TryFrom;
use std::ops::Index;

use crate::bytecode::Word;
use crate::error::AddressError;

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Memory {
  cells: Vec<Word>
}

impl Memory {

  pub fn new(image: &[Word]) -> Memory {
    Memory{ cells: image.to_vec() }
  }

  /// Discards the current contents and loads `image` in their place. This is the one operation
  /// that may shorten the store, and it exists only to support `Machine::reset`.
  pub fn load(&mut self, image: &[Word]) {
    self.cells.clear();
    self.cells.extend_from_slice(image);
  }

  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  pub fn as_slice(&self) -> &[Word] {
    &self.cells
  }

  /// The cell at `address`, zero-extending the store first if the address is past the end.
  pub fn read(&mut self, address: Word) -> Result<Word, AddressError> {
    let idx = self.reserve(address)?;
    Ok(self.cells[idx])
  }

  /// Reads without growing the store. Cells past the end read as zero.
  pub fn peek(&self, address: Word) -> Result<Word, AddressError> {
    let idx = Memory::idx(address)?;
    Ok(self.cells.get(idx).copied().unwrap_or(0))
  }

  /**
    Sets the cell at `address`, dynamically growing the store if the address is larger than the
    max index of the store. The gap between the old end and `address` is zero-filled.
  */
  pub fn write(&mut self, address: Word, value: Word) -> Result<(), AddressError> {
    let idx = self.reserve(address)?;
    self.cells[idx] = value;
    Ok(())
  }

  /// Ensures the store covers `address` and returns it as an index.
  fn reserve(&mut self, address: Word) -> Result<usize, AddressError> {
    let idx = Memory::idx(address)?;
    if idx >= self.cells.len() {
      let additional = idx - self.cells.len() + 1;
      self.cells
          .try_reserve(additional)
          .map_err(|_| AddressError::Unaddressable(address))?;
      self.cells.resize(idx + 1, 0);
    }
    Ok(idx)
  }

  fn idx(address: Word) -> Result<usize, AddressError> {
    if address < 0 {
      return Err(AddressError::Negative(address));
    }
    usize::try_from(address).map_err(|_| AddressError::Unaddressable(address))
  }

}

impl Index<usize> for Memory {
  type Output = Word;

  fn index(&self, idx: usize) -> &Word {
    &self.cells[idx]
  }
}
