/*!
  A tile display and a joystick. The program draws by outputting `(x, y, tile)` triples; the
  triple `(-1, 0, n)` is not a tile but sets the score to `n`. Between frames the program reads the
  joystick position from its input queue.
*/

use std::collections::HashMap;
use std::convert::TryFrom;

use log::{debug, trace};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::bytecode::Word;
use crate::error::Fault;
use crate::machine::{Machine, Status};

#[derive(
  TryFromPrimitive, IntoPrimitive,
  Copy, Clone, Eq, PartialEq, Debug, Hash
)]
#[repr(u8)]
pub enum Tile {
  Empty  = 0,
  Wall   = 1,
  Block  = 2,
  Paddle = 3,
  Ball   = 4,
}

#[derive(
  TryFromPrimitive, IntoPrimitive,
  Copy, Clone, Eq, PartialEq, Debug, Hash
)]
#[repr(i8)]
pub enum Joystick {
  Left    = -1,
  Neutral =  0,
  Right   =  1,
}

impl Joystick {
  /// The position that moves something at `from` toward `to` along one axis.
  pub fn toward(from: Word, to: Word) -> Joystick {
    match to.cmp(&from) {
      std::cmp::Ordering::Less    => Joystick::Left,
      std::cmp::Ordering::Equal   => Joystick::Neutral,
      std::cmp::Ordering::Greater => Joystick::Right,
    }
  }

  pub fn value(&self) -> Word {
    Into::<i8>::into(*self) as Word
  }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug, Error)]
pub enum ScreenError {
  #[error("unknown tile id {id} at ({x}, {y})")]
  UnknownTile { x: Word, y: Word, id: Word },
}

/// The display. Output that does not yet make up a whole triple is held until the rest arrives.
#[derive(Clone, Default, Debug)]
pub struct Screen {
  tiles   : HashMap<(Word, Word), Tile>,
  score   : Option<Word>,
  pending : Vec<Word>,
}

impl Screen {

  pub fn new() -> Screen {
    Screen::default()
  }

  /// Consumes output values and applies every completed triple.
  pub fn draw<I>(&mut self, output: I) -> Result<(), ScreenError>
    where I: IntoIterator<Item = Word>
  {
    for value in output {
      self.pending.push(value);
      if self.pending.len() < 3 {
        continue;
      }

      let (x, y, id) = (self.pending[0], self.pending[1], self.pending[2]);
      self.pending.clear();

      if (x, y) == (-1, 0) {
        trace!("score {}", id);
        self.score = Some(id);
        continue;
      }

      let tile =
        u8::try_from(id)
          .ok()
          .and_then(|id| Tile::try_from(id).ok())
          .ok_or(ScreenError::UnknownTile{ x, y, id })?;
      self.tiles.insert((x, y), tile);
    }
    Ok(())
  }

  pub fn tile(&self, x: Word, y: Word) -> Tile {
    self.tiles.get(&(x, y)).copied().unwrap_or(Tile::Empty)
  }

  pub fn score(&self) -> Option<Word> {
    self.score
  }

  pub fn count(&self, tile: Tile) -> usize {
    self.tiles.values().filter(|t| **t == tile).count()
  }

  /// Position of some tile of the given kind. Meant for tiles that appear once.
  pub fn find(&self, tile: Tile) -> Option<(Word, Word)> {
    self.tiles
        .iter()
        .find(|(_, t)| **t == tile)
        .map(|(position, _)| *position)
  }

  /// Output values received since the last completed triple.
  pub fn pending(&self) -> &[Word] {
    &self.pending
  }

}

#[derive(Debug, Error)]
pub enum ArcadeError {
  #[error(transparent)]
  Fault(#[from] Fault),
  #[error(transparent)]
  Screen(#[from] ScreenError),
}

/// A machine wired to a screen and a joystick.
pub struct Arcade {
  machine : Machine,
  screen  : Screen,
}

impl Arcade {

  pub fn new(machine: Machine) -> Arcade {
    Arcade{ machine, screen: Screen::new() }
  }

  /// Runs until the program next reads the joystick or halts, drawing everything it output.
  pub fn frame(&mut self) -> Result<Status, ArcadeError> {
    let status = self.machine.run()?;
    self.screen.draw(self.machine.drain_output())?;
    Ok(status)
  }

  /// Sets the joystick for the next frame.
  pub fn steer(&mut self, joystick: Joystick) {
    debug!("joystick {:?}", joystick);
    self.machine.push_input(joystick.value());
  }

  pub fn screen(&self) -> &Screen {
    &self.screen
  }

  pub fn machine_mut(&mut self) -> &mut Machine {
    &mut self.machine
  }

}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::bytecode::assemble;

  #[test]
  fn triples_draw_tiles_and_set_the_score() {
    let mut screen = Screen::new();
    screen.draw(vec![1, 2, 3, 6, 5, 4, -1, 0, 12345]).unwrap();
    assert_eq!(screen.tile(1, 2), Tile::Paddle);
    assert_eq!(screen.tile(6, 5), Tile::Ball);
    assert_eq!(screen.tile(0, 0), Tile::Empty);
    assert_eq!(screen.score(), Some(12345));
    assert_eq!(screen.find(Tile::Ball), Some((6, 5)));

    screen.draw(vec![6, 5, 0]).unwrap();
    assert_eq!(screen.count(Tile::Ball), 0);
  }

  #[test]
  fn partial_triples_wait_for_the_rest() {
    let mut screen = Screen::new();
    screen.draw(vec![0, 0]).unwrap();
    assert_eq!(screen.pending(), &[0, 0]);
    screen.draw(vec![2, 1]).unwrap();
    assert_eq!(screen.tile(0, 0), Tile::Block);
    assert_eq!(screen.pending(), &[1]);
  }

  #[test]
  fn unknown_tiles_are_rejected() {
    assert_eq!(
      Screen::new().draw(vec![3, 4, 9]),
      Err(ScreenError::UnknownTile{ x: 3, y: 4, id: 9 })
    );
  }

  #[test]
  fn joystick_follows_the_ball() {
    assert_eq!(Joystick::toward(5, 2), Joystick::Left);
    assert_eq!(Joystick::toward(5, 5), Joystick::Neutral);
    assert_eq!(Joystick::toward(5, 9), Joystick::Right);
    assert_eq!(Joystick::Left.value(), -1);
  }

  #[test]
  fn frames_alternate_with_the_joystick() {
    // Draws the paddle at x = 1 and the ball at x = 3, reads the joystick and reports it as the
    // score.
    let program = assemble("
      out #1
      out #0
      out #3
      out #3
      out #0
      out #4
      in @50
      out #-1
      out #0
      out @50
      hlt
    ").unwrap();

    let mut arcade = Arcade::new(Machine::new(program, vec![]));
    assert_eq!(arcade.frame().unwrap(), Status::Blocked);
    assert_eq!(arcade.screen().count(Tile::Paddle), 1);
    assert_eq!(arcade.screen().score(), None);

    let (paddle, ball) = (arcade.screen().find(Tile::Paddle), arcade.screen().find(Tile::Ball));
    assert_eq!((paddle, ball), (Some((1, 0)), Some((3, 0))));
    arcade.steer(Joystick::toward(1, 3));

    assert_eq!(arcade.frame().unwrap(), Status::Halted);
    assert_eq!(arcade.screen().score(), Some(1));
  }
}
