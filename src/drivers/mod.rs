/*!
  Drivers sit between a machine and the outside world. None of them touch the machine's
  internals: they put words on its input queue, run it, and interpret what comes out.

  * `console` speaks the character protocol: commands go in as character codes, text comes out.
  * `arcade` keeps a tile map from `(x, y, tile)` output triples and steers with a joystick.
  * `script` compiles movement routines into the console's line protocol.
*/

pub mod arcade;
pub mod console;
pub mod script;

pub use arcade::{Arcade, ArcadeError, Joystick, Screen, ScreenError, Tile};
pub use console::{encode, Console, Transcript};
pub use script::{Function, Move, Routine, ScriptError};
