//! The instruction history: an append-only record of every instruction the machine has decoded
//! since it was created or last reset, kept for postmortem diagnosis of faults.

use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::bytecode::{Opcode, Word};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TraceEntry {
  /// The program counter the instruction was decoded at.
  pub pc   : Word,
  /// The instruction word as it was when decoded. Self-modifying programs may have changed it
  /// since.
  pub word : Word,
}

impl TraceEntry {
  /// The mnemonic for the entry's opcode, or `None` if the word did not decode.
  pub fn mnemonic(&self) -> Option<&'static str> {
    u8::try_from(self.word % 100)
      .ok()
      .and_then(|code| Opcode::try_from(code).ok())
      .map(|opcode| opcode.into())
  }
}

impl Display for TraceEntry {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:>6}: {} ({})", self.pc, self.word, self.mnemonic().unwrap_or("???"))
  }
}

#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct History {
  entries: Vec<TraceEntry>
}

impl History {

  pub fn new() -> History {
    History::default()
  }

  pub(crate) fn record(&mut self, pc: Word, word: Word) {
    self.entries.push(TraceEntry{ pc, word });
  }

  pub(crate) fn clear(&mut self) {
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn entries(&self) -> &[TraceEntry] {
    &self.entries
  }

  pub fn last(&self) -> Option<&TraceEntry> {
    self.entries.last()
  }

  /// A table of the most recent `count` entries, oldest first.
  pub fn tail_table(&self, count: usize) -> Table {
    let start = self.entries.len().saturating_sub(count);
    History::make_table(&self.entries[start..], start)
  }

  fn make_table(entries: &[TraceEntry], start: usize) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Step", ubr->"PC", ubr->"Word", ubl->"Op"]);

    for (i, entry) in entries.iter().enumerate() {
      table.add_row(
        row![
          r->(i + start),
          r->entry.pc,
          r->entry.word,
          entry.mnemonic().unwrap_or("???")
        ]
      );
    }
    table
  }

}

impl Display for History {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", History::make_table(&self.entries, 0))
  }
}


lazy_static! {
  pub(crate) static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entries_are_appended_in_order() {
    let mut history = History::new();
    history.record(0, 1002);
    history.record(4, 99);
    assert_eq!(history.len(), 2);
    assert_eq!(history.entries()[0], TraceEntry{ pc: 0, word: 1002 });
    assert_eq!(history.last(), Some(&TraceEntry{ pc: 4, word: 99 }));
  }

  #[test]
  fn mnemonics_of_undecodable_words() {
    assert_eq!(TraceEntry{ pc: 0, word: 1002 }.mnemonic(), Some("mul"));
    assert_eq!(TraceEntry{ pc: 0, word: 42 }.mnemonic(), None);
    assert_eq!(TraceEntry{ pc: 0, word: -1 }.mnemonic(), None);
  }

  #[test]
  fn tables_render_every_entry() {
    let mut history = History::new();
    history.record(0, 1101);
    history.record(4, 99);
    history.record(5, 77);
    let text = history.to_string();
    assert!(text.contains("add"));
    assert!(text.contains("hlt"));
    assert!(text.contains("???"));
    assert_eq!(history.tail_table(1).len(), 1);
  }
}
